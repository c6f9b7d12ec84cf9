//! End-to-end pipeline tests over scripted collaborators: two runs against
//! one store, the second with a qualifying price drop.

use std::sync::Arc;
use std::time::Duration;

use fares::testing::{MockBrowser, MockElement, RecordingNotifier};
use fares::{
    run_batch, run_query, EngineConfig, FlightRecord, MemoryStore, Query, SnapshotStore,
    NOT_AVAILABLE,
};

const SEARCH_URL: &str = "https://www.google.com/travel/flights?hl=en";

/// Timeouts collapsed so absent waits resolve immediately.
fn test_config() -> EngineConfig {
    EngineConfig {
        consent_timeout: Duration::ZERO,
        price_region_timeout: Duration::ZERO,
        flight_items_timeout: Duration::ZERO,
        cheapest_toggle_timeout: Duration::ZERO,
        view_switch_pause: Duration::ZERO,
        scroll_pause: Duration::ZERO,
        ..EngineConfig::default()
    }
}

/// A container that extracts and validates cleanly.
fn offer(dep: &str, arr: &str, price: &str) -> MockElement {
    MockElement::flight_offer(
        format!(
            "Nonstop flight with Acme Air. Leaves LHR at {dep} and arrives JFK at {arr}. \
             Total duration 8 hr 15 min. Carbon emissions estimate: 120kg CO2e."
        ),
        format!("{dep} – {arr}\n{price}\n120kg CO2e"),
    )
}

/// Scripted search page: default view, a cheapest toggle, cheapest view.
fn scripted_page(default_offers: Vec<MockElement>, cheapest_offers: Vec<MockElement>) -> MockBrowser {
    MockBrowser::single_view(|view| {
        let mut containers = default_offers;
        // An ad banner shares the container selector and must be filtered
        // by the validation gate, not by position.
        containers.push(MockElement::new().with_text("Sponsored – compare prices"));
        view.on(Query::css("li[role='listitem']"), containers);
        view.on(
            Query::css(r#"input[aria-label="Departure"]"#),
            vec![MockElement::new().with_attribute("value", "Aug 20")],
        );
        view.on(
            Query::xpath("//div[contains(text(), 'Cheapest')]"),
            vec![MockElement::new().with_text("Cheapest").advances_view()],
        );
    })
    .with_view(|view| {
        view.on(Query::css("li[role='listitem']"), cheapest_offers);
    })
}

fn first_run_page() -> MockBrowser {
    scripted_page(
        vec![
            offer("8:30 AM", "11:45 AM", "£245"),
            offer("10:00 AM", "1:10 PM", "£300"),
        ],
        vec![
            offer("8:30 AM", "11:45 AM", "£199"),
            offer("6:00 AM", "9:15 AM", "£150"), // only surfaces under price sort
        ],
    )
}

fn second_run_page() -> MockBrowser {
    scripted_page(
        vec![
            offer("8:30 AM", "11:45 AM", "£200"), // dropped from £245
            offer("10:00 AM", "1:10 PM", "£300"),
        ],
        vec![
            offer("8:30 AM", "11:45 AM", "£199"),
            offer("6:00 AM", "9:15 AM", "£150"),
        ],
    )
}

async fn stored_records(store: &MemoryStore, key: &str) -> Vec<FlightRecord> {
    let bytes = store
        .get(key)
        .await
        .unwrap()
        .expect("snapshot should exist");
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_first_run_persists_merged_ranked_set_without_alerts() {
    let store = MemoryStore::new();
    let notifier = RecordingNotifier::new();
    let lock = tokio::sync::Mutex::new(());

    let outcome = run_query(
        &first_run_page(),
        &store,
        &notifier,
        SEARCH_URL,
        &test_config(),
        &lock,
    )
    .await
    .unwrap();

    assert_eq!(outcome.flights_saved, 3);
    assert_eq!(outcome.alerts_sent, 0);
    assert!(notifier.sent().is_empty());

    let key = outcome.output_key.expect("snapshot key");
    assert!(key.contains("_LHR_JFK_1w_"));

    let records = stored_records(&store, &key).await;
    assert_eq!(records.len(), 3);

    // Ranked by minimum known price: £150, min(£245, £199), £300.
    assert_eq!(records[0].cheapest_price, "£150");
    assert_eq!(records[0].price, NOT_AVAILABLE); // cheapest-only flight
    assert_eq!(records[1].price, "£245");
    assert_eq!(records[1].cheapest_price, "£199");
    assert_eq!(records[2].price, "£300");
    assert_eq!(records[2].cheapest_price, NOT_AVAILABLE);

    // First run: no prior snapshot, no change claims.
    assert!(records.iter().all(|r| r.price_change.is_empty()));
}

#[tokio::test]
async fn test_second_run_flags_drop_and_alerts() {
    let store = MemoryStore::new();
    let notifier = RecordingNotifier::new();
    let lock = tokio::sync::Mutex::new(());
    let config = test_config();

    run_query(
        &first_run_page(),
        &store,
        &notifier,
        SEARCH_URL,
        &config,
        &lock,
    )
    .await
    .unwrap();

    let outcome = run_query(
        &second_run_page(),
        &store,
        &notifier,
        SEARCH_URL,
        &config,
        &lock,
    )
    .await
    .unwrap();

    // £245 → £200 is an 18% drop, well past the 1% threshold.
    assert_eq!(outcome.alerts_sent, 1);
    let sent = notifier.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].contains("LHR"));
    assert!(sent[0].contains("JFK"));

    let records = stored_records(&store, &outcome.output_key.unwrap()).await;
    let dropped = records
        .iter()
        .find(|r| r.departure_time == "8:30 AM")
        .unwrap();
    assert_eq!(dropped.price_change, "-45");

    // The unchanged flight makes no claim; the cheapest-only flight has
    // no parseable default price on either side, so none there either.
    let unchanged = records
        .iter()
        .find(|r| r.departure_time == "10:00 AM")
        .unwrap();
    assert_eq!(unchanged.price_change, "");
    let cheapest_only = records
        .iter()
        .find(|r| r.departure_time == "6:00 AM")
        .unwrap();
    assert_eq!(cheapest_only.price_change, "");
}

#[tokio::test]
async fn test_missing_cheapest_toggle_degrades_to_default_view() {
    let store = MemoryStore::new();
    let notifier = RecordingNotifier::new();
    let lock = tokio::sync::Mutex::new(());

    // No toggle scripted: the cheapest view is unreachable.
    let browser = MockBrowser::single_view(|view| {
        view.on(
            Query::css("li[role='listitem']"),
            vec![offer("8:30 AM", "11:45 AM", "£245")],
        );
    });

    let outcome = run_query(&browser, &store, &notifier, SEARCH_URL, &test_config(), &lock)
        .await
        .unwrap();

    assert_eq!(outcome.flights_saved, 1);
    let records = stored_records(&store, &outcome.output_key.unwrap()).await;
    assert_eq!(records[0].price, "£245");
    assert_eq!(records[0].cheapest_price, NOT_AVAILABLE);
}

#[tokio::test]
async fn test_batch_counts_rejected_urls_as_failures() {
    let store = Arc::new(MemoryStore::new());
    let notifier = Arc::new(RecordingNotifier::new());

    let totals = run_batch(
        vec![
            SEARCH_URL.to_string(),
            "https://example.com/not-a-flight-search".to_string(),
        ],
        2,
        |_worker| async { Ok(first_run_page()) },
        store.clone(),
        notifier,
        test_config(),
    )
    .await;

    assert_eq!(totals.urls_processed, 2);
    assert_eq!(totals.queries_failed, 1);
    assert_eq!(totals.flights_saved, 3);
    assert!(!totals.is_success());
    assert_eq!(store.len(), 1);
}
