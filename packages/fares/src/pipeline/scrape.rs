//! Per-query scrape pipeline: navigate, settle, scrape both views,
//! reconcile, diff against the prior snapshot, rank, persist, alert.
//!
//! Failure policy: only an unreachable page or a failed snapshot write
//! aborts the query. Consent, readiness waits, the cheapest toggle, and
//! individual containers all degrade gracefully.

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use url::Url;

use crate::assembly::{output_key, rank_by_min_price};
use crate::dates::convert_date_with_smart_year;
use crate::diff::{apply_price_changes, dispatch_alerts};
use crate::error::{EngineError, Result};
use crate::extractor::{apply_validation_gate, extract_record, extraction_budget, ExtractionContext};
use crate::locator::locate_containers;
use crate::reconcile::merge_views;
use crate::traits::browser::{Browser, Query};
use crate::traits::notifier::Notifier;
use crate::traits::store::SnapshotStore;
use crate::types::config::EngineConfig;
use crate::types::record::FlightRecord;
use crate::types::report::QueryOutcome;

/// Cookie-consent button, localized variants share the "Accept all" span.
const CONSENT_XPATH: &str =
    "//button[.//span[contains(text(), 'Accept all')] or contains(text(),'Accept all')]";

/// Page-stability marker that renders once prices are in.
const PRICE_REGION_CSS: &str = r#"div[role="region"][aria-label="Find the best price"]"#;

/// First flight items, either structural variant.
const FLIGHT_ITEMS_CSS: &str = r#"li[role='listitem'], div[data-testid="offer-listing"]"#;

/// The cheapest-sort toggle.
const CHEAPEST_TOGGLE_XPATH: &str = "//div[contains(text(), 'Cheapest')]";

/// Run the full pipeline for one search URL.
///
/// `snapshot_lock` guards the read-diff-write sequence so two workers on
/// the same route cannot race to persist conflicting snapshots.
pub async fn run_query(
    browser: &dyn Browser,
    store: &dyn SnapshotStore,
    notifier: &dyn Notifier,
    url: &str,
    config: &EngineConfig,
    snapshot_lock: &Mutex<()>,
) -> Result<QueryOutcome> {
    ensure_provider_url(url, &config.provider_domain)?;

    browser.navigate(url).await?;
    info!(%url, "Navigated to search page");

    dismiss_cookie_consent(browser, config).await;
    wait_for_results(browser, config).await;

    let today = Utc::now().date_naive();
    let departure_date = read_date_input(browser, "Departure")
        .await
        .map(|raw| convert_date_with_smart_year(&raw, today))
        .unwrap_or_else(|| today.format("%Y-%m-%d").to_string());
    let return_date = read_date_input(browser, "Return")
        .await
        .map(|raw| convert_date_with_smart_year(&raw, today))
        .unwrap_or_default();
    debug!(%departure_date, %return_date, "Recovered travel dates");

    let context = ExtractionContext {
        departure_date,
        return_date,
        scrape_time: Utc::now().format("%Y-%m-%d %H:%M:%S").to_string(),
    };

    let default_view = scrape_view(browser, config, &context, "default").await;

    let cheapest_view = if switch_to_cheapest(browser, config).await {
        scrape_view(browser, config, &context, "cheapest").await
    } else {
        Vec::new()
    };

    let mut merged = merge_views(default_view, cheapest_view);
    if merged.is_empty() {
        info!(%url, "No validated flights; nothing to persist");
        return Ok(QueryOutcome {
            url: url.to_string(),
            output_key: None,
            flights_saved: 0,
            alerts_sent: 0,
        });
    }

    let key = output_key(&merged, Utc::now());

    let alerts = {
        let _guard = snapshot_lock.lock().await;

        let previous = load_snapshot(store, &key).await;
        let alerts = apply_price_changes(&mut merged, &previous, config.alert_threshold);
        rank_by_min_price(&mut merged);

        let bytes = serde_json::to_vec_pretty(&merged)?;
        store
            .put(&key, &bytes)
            .await
            .map_err(|source| EngineError::Persistence {
                key: key.clone(),
                source,
            })?;
        info!(key = %key, flights = merged.len(), "Persisted snapshot");

        alerts
    };

    let alerts_sent = dispatch_alerts(notifier, &alerts).await;

    Ok(QueryOutcome {
        url: url.to_string(),
        output_key: Some(key),
        flights_saved: merged.len(),
        alerts_sent,
    })
}

/// Best-effort snapshot read: absence, a backend failure, or a corrupt
/// blob all mean "no prior data" — a poisoned snapshot must not wedge the
/// route forever (it is superseded by this run's write anyway).
async fn load_snapshot(store: &dyn SnapshotStore, key: &str) -> Vec<FlightRecord> {
    match store.get(key).await {
        Ok(Some(bytes)) => match serde_json::from_slice::<Vec<FlightRecord>>(&bytes) {
            Ok(records) => {
                debug!(key = %key, records = records.len(), "Loaded prior snapshot");
                records
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Prior snapshot unreadable; treating as absent");
                Vec::new()
            }
        },
        Ok(None) => {
            debug!(key = %key, "No prior snapshot");
            Vec::new()
        }
        Err(e) => {
            warn!(key = %key, error = %e, "Snapshot read failed; treating as absent");
            Vec::new()
        }
    }
}

/// Reject anything not on the expected provider before touching the network.
pub(crate) fn ensure_provider_url(url: &str, provider_domain: &str) -> Result<()> {
    let parsed = Url::parse(url).map_err(|_| EngineError::UnsupportedUrl {
        url: url.to_string(),
    })?;
    let host_ok = parsed
        .host_str()
        .map(|host| host == provider_domain || host.ends_with(&format!(".{provider_domain}")))
        .unwrap_or(false);
    if !host_ok {
        return Err(EngineError::UnsupportedUrl {
            url: url.to_string(),
        });
    }
    Ok(())
}

/// Scrape one view: scroll, locate, extract the bounded top slice, gate.
///
/// A locate failure skips the view (empty set), never the run.
async fn scrape_view(
    browser: &dyn Browser,
    config: &EngineConfig,
    context: &ExtractionContext,
    view_name: &str,
) -> Vec<FlightRecord> {
    scroll_to_load(browser, config).await;

    let containers = match locate_containers(browser, config).await {
        Ok(containers) => containers,
        Err(e) => {
            warn!(view = view_name, error = %e, "Skipping view");
            return Vec::new();
        }
    };

    let budget = extraction_budget(containers.len(), config.extraction_cap);
    info!(
        view = view_name,
        located = containers.len(),
        extracting = budget,
        "Extracting top slice of containers"
    );

    let mut candidates = Vec::with_capacity(budget);
    for (index, container) in containers.iter().take(budget).enumerate() {
        match extract_record(container.as_ref(), context).await {
            Ok(record) => candidates.push(record),
            Err(e) => warn!(view = view_name, index, error = %e, "Container extraction failed"),
        }
    }

    let accepted = apply_validation_gate(candidates);
    info!(view = view_name, accepted = accepted.len(), "View scraped");
    accepted
}

/// Click through the consent dialog when present; absence is normal.
async fn dismiss_cookie_consent(browser: &dyn Browser, config: &EngineConfig) {
    let query = Query::xpath(CONSENT_XPATH);
    match browser.wait_for(&query, config.consent_timeout).await {
        Ok(true) => {
            if let Ok(button) = browser.find_one(&query).await {
                match button.click().await {
                    Ok(()) => info!("Dismissed cookie consent"),
                    Err(e) => debug!(error = %e, "Consent click failed"),
                }
            }
        }
        Ok(false) => debug!("No cookie consent dialog"),
        Err(e) => debug!(error = %e, "Consent wait failed"),
    }
}

/// Wait for the price region and the first items; timeouts are non-fatal
/// and the pipeline proceeds with whatever has rendered.
async fn wait_for_results(browser: &dyn Browser, config: &EngineConfig) {
    match browser
        .wait_for(&Query::css(PRICE_REGION_CSS), config.price_region_timeout)
        .await
    {
        Ok(true) => debug!("Price region present"),
        _ => warn!("Timeout waiting for price region"),
    }
    match browser
        .wait_for(&Query::css(FLIGHT_ITEMS_CSS), config.flight_items_timeout)
        .await
    {
        Ok(true) => debug!("Flight items present"),
        _ => warn!("Timeout waiting for flight items"),
    }
}

/// Scroll until the page stops growing or the bound is hit.
async fn scroll_to_load(browser: &dyn Browser, config: &EngineConfig) {
    let mut last_height = body_height(browser).await;
    for scroll in 0..config.max_scrolls {
        if browser
            .execute_script("window.scrollTo(0, document.body.scrollHeight);")
            .await
            .is_err()
        {
            return;
        }
        tokio::time::sleep(config.scroll_pause).await;
        let new_height = body_height(browser).await;
        if new_height == last_height {
            debug!(scrolls = scroll + 1, "No more content while scrolling");
            return;
        }
        last_height = new_height;
    }
}

async fn body_height(browser: &dyn Browser) -> Option<i64> {
    browser
        .execute_script("return document.body.scrollHeight")
        .await
        .ok()
        .and_then(|value| value.as_i64())
}

/// Read a date input's value (placeholder as fallback).
async fn read_date_input(browser: &dyn Browser, label: &str) -> Option<String> {
    let query = Query::css(format!(r#"input[aria-label="{label}"]"#));
    let input = browser.find_one(&query).await.ok()?;
    let value = input.attribute("value").await.ok().flatten();
    let raw = match value.filter(|v| !v.trim().is_empty()) {
        Some(v) => v,
        None => input.attribute("placeholder").await.ok().flatten()?,
    };
    let raw = raw.trim().to_string();
    (!raw.is_empty()).then_some(raw)
}

/// Re-sort by price. Returns false (and logs) when the affordance is
/// missing or times out; the caller proceeds with an empty cheapest view.
async fn switch_to_cheapest(browser: &dyn Browser, config: &EngineConfig) -> bool {
    let query = Query::xpath(CHEAPEST_TOGGLE_XPATH);
    match browser.wait_for(&query, config.cheapest_toggle_timeout).await {
        Ok(true) => {}
        _ => {
            warn!("No cheapest toggle found; skipping cheapest view");
            return false;
        }
    }
    let toggle = match browser.find_one(&query).await {
        Ok(toggle) => toggle,
        Err(e) => {
            warn!(error = %e, "Cheapest toggle lookup failed");
            return false;
        }
    };
    if let Err(e) = toggle.click().await {
        warn!(error = %e, "Cheapest toggle click failed");
        return false;
    }
    tokio::time::sleep(config.view_switch_pause).await;
    let _ = browser
        .wait_for(&Query::css(FLIGHT_ITEMS_CSS), config.flight_items_timeout)
        .await;
    info!("Switched to cheapest sort");
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_url_guard() {
        assert!(ensure_provider_url("https://www.google.com/travel/flights?q=x", "google.com").is_ok());
        assert!(ensure_provider_url("https://google.com/travel", "google.com").is_ok());

        assert!(matches!(
            ensure_provider_url("https://example.com/flights", "google.com"),
            Err(EngineError::UnsupportedUrl { .. })
        ));
        assert!(matches!(
            ensure_provider_url("https://evilgoogle.com/", "google.com"),
            Err(EngineError::UnsupportedUrl { .. })
        ));
        assert!(matches!(
            ensure_provider_url("not a url", "google.com"),
            Err(EngineError::UnsupportedUrl { .. })
        ));
    }
}
