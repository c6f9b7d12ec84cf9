//! Snapshot diffing and alert decisions.
//!
//! Records arrive in arbitrary order and match the prior snapshot by
//! identity key only. A delta is claimed solely when both sides parse as
//! currency amounts; everything else stays an empty string rather than a
//! false "no change" zero.

use tracing::{debug, error, info};

use crate::currency::parse_amount;
use crate::traits::notifier::Notifier;
use crate::types::record::{FlightRecord, IdentityKey};

/// One alert-worthy price drop.
#[derive(Debug, Clone)]
pub struct PriceAlert {
    pub key: IdentityKey,
    pub route: String,
    pub previous: f64,
    pub current: f64,
    pub delta: f64,
    pub message: String,
}

/// Annotate every record with `price_change` against the prior snapshot
/// and collect drops that cross the alert threshold.
///
/// `previous` is the prior snapshot's record set (empty on first run, in
/// which case every `price_change` stays empty and nothing alerts). The
/// threshold is a fraction of the previous price: a £1 swing on a £20
/// fare matters, the same swing on a £900 fare does not.
pub fn apply_price_changes(
    records: &mut [FlightRecord],
    previous: &[FlightRecord],
    threshold: f64,
) -> Vec<PriceAlert> {
    let previous_prices: std::collections::HashMap<IdentityKey, String> = previous
        .iter()
        .map(|record| (record.identity(), record.price.clone()))
        .collect();

    let mut alerts = Vec::new();
    let mut changed = 0usize;

    for record in records.iter_mut() {
        record.price_change = String::new();

        let Some(previous_price) = previous_prices.get(&record.identity()) else {
            continue;
        };
        let (Some(prev), Some(curr)) =
            (parse_amount(previous_price), parse_amount(&record.price))
        else {
            continue;
        };

        let delta = curr - prev;
        if delta > 0.0 {
            record.price_change = format!("+{delta:.0}");
            changed += 1;
        } else if delta < 0.0 {
            record.price_change = format!("{delta:.0}");
            changed += 1;
            if delta.abs() / prev > threshold {
                alerts.push(PriceAlert {
                    key: record.identity(),
                    route: format!("{} → {}", record.departure_airport, record.arrival_airport),
                    previous: prev,
                    current: curr,
                    delta,
                    message: format_alert(record, prev, curr, delta),
                });
            }
        }
        // Zero delta keeps the empty string: no visible change.
    }

    info!(
        matched = records.len(),
        changed,
        alerts = alerts.len(),
        "Price diff against prior snapshot complete"
    );
    alerts
}

/// Dispatch alerts one at a time; failures are logged and never block
/// the remaining records. Returns how many were delivered.
pub async fn dispatch_alerts(notifier: &dyn Notifier, alerts: &[PriceAlert]) -> usize {
    let mut sent = 0usize;
    for alert in alerts {
        match notifier.send(&alert.message).await {
            Ok(()) => {
                debug!(key = %alert.key, "Alert dispatched");
                sent += 1;
            }
            Err(e) => {
                error!(key = %alert.key, error = %e, "Alert dispatch failed");
            }
        }
    }
    sent
}

fn format_alert(record: &FlightRecord, prev: f64, curr: f64, delta: f64) -> String {
    let percent = delta.abs() / prev * 100.0;
    format!(
        "✈️ Price drop: {} → {} on {}\n{} – {} ({})\nWas {prev:.0}, now {curr:.0} ({percent:.1}% down)",
        record.departure_airport,
        record.arrival_airport,
        record.departure_date,
        record.departure_time,
        record.arrival_time,
        record.airline,
    )
}
