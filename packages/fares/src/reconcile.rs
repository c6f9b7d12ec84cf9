//! Dual-view reconciliation.
//!
//! The default-sorted and cheapest-sorted views are independently truncated
//! top slices of a larger, unstable result list; neither is a superset of
//! the other. The merge must keep every distinct identity exactly once,
//! with the default-order price in `price` and the cheapest-order price in
//! `cheapest_price`.

use indexmap::IndexMap;
use tracing::{debug, info};

use crate::types::record::{FlightRecord, IdentityKey, NOT_AVAILABLE};

/// Merge the default view `A` and the cheapest view `B` into one set.
///
/// - Records in both views keep A's price and gain B's as `cheapest_price`.
/// - Records only in A get `cheapest_price = "N/A"`.
/// - Records only in B surface with `price = "N/A"` and their own price
///   moved into `cheapest_price`: offers that only appear under price sort.
///
/// An empty `B` (cheapest view unreachable) degrades to `A` with every
/// `cheapest_price` set to the sentinel; that is not an error.
pub fn merge_views(
    default_view: Vec<FlightRecord>,
    cheapest_view: Vec<FlightRecord>,
) -> Vec<FlightRecord> {
    let default_view = collapse_by_identity(default_view);
    let cheapest_view = collapse_by_identity(cheapest_view);

    let cheapest_prices: IndexMap<IdentityKey, String> = cheapest_view
        .iter()
        .map(|record| (record.identity(), record.price.clone()))
        .collect();

    let mut merged: IndexMap<IdentityKey, FlightRecord> =
        IndexMap::with_capacity(default_view.len() + cheapest_view.len());

    for mut record in default_view {
        let key = record.identity();
        record.cheapest_price = cheapest_prices
            .get(&key)
            .cloned()
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());
        merged.insert(key, record);
    }

    let mut cheapest_only = 0usize;
    for mut record in cheapest_view {
        let key = record.identity();
        if merged.contains_key(&key) {
            continue;
        }
        // Surfaced only under price sort: its scraped price is the
        // cheapest-order price, and no default-order price is known.
        record.cheapest_price = record.price.clone();
        record.price = NOT_AVAILABLE.to_string();
        cheapest_only += 1;
        merged.insert(key, record);
    }

    if cheapest_only > 0 {
        debug!(cheapest_only, "Flights seen only in the cheapest view");
    }
    info!(merged = merged.len(), "Reconciled default and cheapest views");

    merged.into_values().collect()
}

/// Collapse duplicate identities inside one view: last seen wins,
/// first-seen position is kept.
fn collapse_by_identity(view: Vec<FlightRecord>) -> Vec<FlightRecord> {
    let mut unique: IndexMap<IdentityKey, FlightRecord> = IndexMap::with_capacity(view.len());
    for record in view {
        unique.insert(record.identity(), record);
    }
    unique.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn record(dep_time: &str, price: &str) -> FlightRecord {
        FlightRecord {
            departure_time: dep_time.to_string(),
            arrival_time: "11:45".to_string(),
            departure_airport: "LHR".to_string(),
            arrival_airport: "JFK".to_string(),
            co2_emissions: "120kg CO2e".to_string(),
            price: price.to_string(),
            ..FlightRecord::default()
        }
    }

    #[test]
    fn test_record_in_both_views_gets_both_prices() {
        let merged = merge_views(
            vec![record("08:30", "£245")],
            vec![record("08:30", "£199")],
        );

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].price, "£245");
        assert_eq!(merged[0].cheapest_price, "£199");
    }

    #[test]
    fn test_default_only_record_has_no_cheapest_price() {
        let merged = merge_views(vec![record("08:30", "£245")], vec![]);

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].price, "£245");
        assert_eq!(merged[0].cheapest_price, NOT_AVAILABLE);
    }

    #[test]
    fn test_cheapest_only_record_moves_price() {
        let merged = merge_views(
            vec![record("08:30", "£245")],
            vec![record("08:30", "£199"), record("14:05", "£150")],
        );

        assert_eq!(merged.len(), 2);
        let late = merged
            .iter()
            .find(|r| r.departure_time == "14:05")
            .unwrap();
        assert_eq!(late.price, NOT_AVAILABLE);
        assert_eq!(late.cheapest_price, "£150");
    }

    #[test]
    fn test_duplicate_identity_within_view_collapses_last_seen() {
        let merged = merge_views(
            vec![record("08:30", "£245"), record("08:30", "£250")],
            vec![],
        );

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].price, "£250");
    }

    #[test]
    fn test_merge_preserves_default_view_order_first() {
        let merged = merge_views(
            vec![record("08:30", "£245"), record("10:00", "£300")],
            vec![record("06:00", "£120"), record("10:00", "£280")],
        );

        let times: Vec<&str> = merged.iter().map(|r| r.departure_time.as_str()).collect();
        assert_eq!(times, vec!["08:30", "10:00", "06:00"]);
    }

    proptest! {
        /// Every identity in A ∪ B appears exactly once in the merge.
        #[test]
        fn prop_reconciliation_completeness(
            a_times in proptest::collection::vec("[0-2][0-9]:[0-5][0-9]", 0..12),
            b_times in proptest::collection::vec("[0-2][0-9]:[0-5][0-9]", 0..12),
        ) {
            let a: Vec<FlightRecord> = a_times.iter().map(|t| record(t, "£100")).collect();
            let b: Vec<FlightRecord> = b_times.iter().map(|t| record(t, "£90")).collect();

            let expected: HashSet<IdentityKey> = a
                .iter()
                .chain(b.iter())
                .map(FlightRecord::identity)
                .collect();

            let merged = merge_views(a, b);
            let merged_keys: HashSet<IdentityKey> =
                merged.iter().map(FlightRecord::identity).collect();

            prop_assert_eq!(merged.len(), expected.len());
            prop_assert_eq!(merged_keys, expected);
        }

        /// Price fields land on the semantically correct side.
        #[test]
        fn prop_price_field_correctness(
            shared in proptest::collection::hash_set("[0-1][0-9]:[0-5][0-9]", 1..6),
        ) {
            let a: Vec<FlightRecord> = shared.iter().map(|t| record(t, "£200")).collect();
            let b: Vec<FlightRecord> = shared.iter().map(|t| record(t, "£150")).collect();

            for merged in merge_views(a, b) {
                prop_assert_eq!(&merged.price, "£200");
                prop_assert_eq!(&merged.cheapest_price, "£150");
            }
        }
    }
}
