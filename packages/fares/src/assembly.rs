//! Final ranking and output assembly.

use chrono::{DateTime, Months, Utc};
use tracing::debug;

use crate::currency::min_known_price;
use crate::types::record::{FlightRecord, NOT_AVAILABLE};

/// Order records by ascending minimum known price.
///
/// The sort is stable, so ties and all-unparseable records (which compare
/// as +infinity and sink to the end) keep their merge order.
pub fn rank_by_min_price(records: &mut [FlightRecord]) {
    records.sort_by(|a, b| min_known_price(a).total_cmp(&min_known_price(b)));
}

/// Derive the deterministic snapshot key for one query's output.
///
/// Encodes the month window (current and next), route, trip type, and the
/// travel dates: `{YYYY-MM},{YYYY-MM}_{DEP}_{ARR}_{type}_{dep}_{rtn}.json`.
/// Round trip is inferred from any record carrying a distinct, non-sentinel
/// return date.
pub fn output_key(records: &[FlightRecord], now: DateTime<Utc>) -> String {
    let first = records.first();
    let dep_airport = first.map_or(NOT_AVAILABLE, |r| r.departure_airport.as_str());
    let arr_airport = first.map_or(NOT_AVAILABLE, |r| r.arrival_airport.as_str());
    let dep_date = first.map_or(NOT_AVAILABLE, |r| r.departure_date.as_str());

    let return_date = records
        .iter()
        .map(|r| r.return_date.as_str())
        .find(|rtn| !rtn.is_empty() && *rtn != NOT_AVAILABLE && *rtn != "Return")
        .filter(|rtn| first.map_or(true, |r| *rtn != r.departure_date))
        .unwrap_or("");

    let trip_type = if return_date.is_empty() { "1w" } else { "rtn" };

    let current_month = now.format("%Y-%m").to_string();
    let next_month = (now + Months::new(1)).format("%Y-%m").to_string();

    let key = format!(
        "{current_month},{next_month}_{dep_airport}_{arr_airport}_{trip_type}_{dep_date}_{return_date}.json"
    );
    debug!(%key, "Derived output key");
    key
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(price: &str, cheapest: &str) -> FlightRecord {
        FlightRecord {
            departure_date: "2026-08-20".to_string(),
            departure_airport: "LHR".to_string(),
            arrival_airport: "JFK".to_string(),
            price: price.to_string(),
            cheapest_price: cheapest.to_string(),
            ..FlightRecord::default()
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 7, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_ranking_by_minimum_known_price() {
        let mut records = vec![
            record("£300", "N/A"),
            record("£250", "£150"),
            record("N/A", "£200"),
        ];
        rank_by_min_price(&mut records);

        let mins: Vec<&str> = records.iter().map(|r| r.price.as_str()).collect();
        assert_eq!(mins, vec!["£250", "N/A", "£300"]);
    }

    #[test]
    fn test_unparseable_records_sort_last_in_merge_order() {
        let mut records = vec![
            record("N/A", "N/A"),
            record("£300", "N/A"),
            record("N/A", ""),
            record("£100", "N/A"),
        ];
        let first_unparseable = records[0].clone();
        let second_unparseable = records[2].clone();
        rank_by_min_price(&mut records);

        assert_eq!(records[0].price, "£100");
        assert_eq!(records[1].price, "£300");
        // Stable: the two unparseable records keep their relative order.
        assert_eq!(records[2], first_unparseable);
        assert_eq!(records[3], second_unparseable);
    }

    #[test]
    fn test_output_key_one_way() {
        let records = vec![record("£245", "N/A")];
        assert_eq!(
            output_key(&records, now()),
            "2026-08,2026-09_LHR_JFK_1w_2026-08-20_.json"
        );
    }

    #[test]
    fn test_output_key_round_trip() {
        let mut rtn = record("£245", "N/A");
        rtn.return_date = "2026-08-27".to_string();
        assert_eq!(
            output_key(&[rtn], now()),
            "2026-08,2026-09_LHR_JFK_rtn_2026-08-20_2026-08-27.json"
        );
    }

    #[test]
    fn test_output_key_ignores_placeholder_return_dates() {
        let mut placeholder = record("£245", "N/A");
        placeholder.return_date = "Return".to_string();
        let key = output_key(&[placeholder], now());
        assert!(key.contains("_1w_"));
    }

    #[test]
    fn test_month_window_rolls_over_year() {
        let december = Utc.with_ymd_and_hms(2026, 12, 15, 0, 0, 0).unwrap();
        let records = vec![record("£245", "N/A")];
        let key = output_key(&records, december);
        assert!(key.starts_with("2026-12,2027-01_"));
    }
}
