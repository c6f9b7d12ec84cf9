//! Record extraction and the validation gate.
//!
//! A container's accessible label and visible text are the only reliable
//! field sources; structural sub-selectors churn with every deployment.
//! Extraction is therefore pattern scanning: no field is structurally
//! required, every miss falls back to the "N/A" sentinel, and the two
//! validated fields decide whether the record is genuine. Ads, summary
//! banners, and loading placeholders share selectors with real offers and
//! are filtered by content shape, not by position.

use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, warn};

use crate::error::SessionResult;
use crate::traits::browser::Element;
use crate::types::record::{FlightRecord, NOT_AVAILABLE};

/// Clock times like "8:30", "08:30", "11:45 PM".
static TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b\d{1,2}:\d{2}(?:\s?[AP]M)?\b").unwrap());

/// Durations like "7 hr 15 min" or "2hrs".
static DURATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b\d+\s?hr(?:s)?(?:\s?\d+\s?min)?\b").unwrap());

/// Stop counts like "1 stop", "2 stops".
static STOPS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\b(\d+)\s?stops?\b").unwrap());

/// Nonstop marker, with or without hyphen.
static NONSTOP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bnon-?stop\b").unwrap());

/// Three-letter uppercase airport codes in accessible-label text.
static AIRPORT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b[A-Z]{3}\b").unwrap());

/// Flight numbers like "BA 117" or "U24567".
static FLIGHT_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Z]{2}\s?\d{1,4}\b").unwrap());

/// Carrier name as labels phrase it: "... flight with British Airways."
static AIRLINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bwith\s+([^.,\n]+)").unwrap());

/// Emissions text like "120kg CO2e" (validation is stricter; this finds).
static CO2: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b\d+\s?kg\s?(?:co2e?|co₂e?)\b").unwrap());

/// Price text like "£245", "$1,200".
static PRICE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[£$€]\s?\d[\d,]*").unwrap());

/// Travel-date context threaded into every record of one page scrape.
#[derive(Debug, Clone)]
pub struct ExtractionContext {
    pub departure_date: String,
    pub return_date: String,
    pub scrape_time: String,
}

/// How many of `located` containers to extract.
///
/// Offers are presented best-first, so only a representative top slice is
/// needed: `min(ceil(n/2) + 1, cap)`, never more than `located` itself.
pub fn extraction_budget(located: usize, cap: usize) -> usize {
    if located == 0 {
        return 0;
    }
    (located / 2 + located % 2 + 1).min(cap).min(located)
}

/// Pull a flight record out of one container element.
///
/// Never rejects: every field that cannot be recovered is the sentinel.
/// The caller applies the validation gate afterwards.
pub async fn extract_record(
    container: &dyn Element,
    context: &ExtractionContext,
) -> SessionResult<FlightRecord> {
    let text = container.text().await?;
    let aria = container.aria_label().await.ok().flatten().unwrap_or_default();

    // The label is the richer source; visible text backfills it.
    let haystack = format!("{aria}\n{text}");

    let mut times = TIME.find_iter(&haystack).map(|m| m.as_str().to_string());
    let departure_time = times.next().unwrap_or_else(not_available);
    let arrival_time = times.next().unwrap_or_else(not_available);

    let duration = DURATION
        .find(&haystack)
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(not_available);

    let (stop_count, stop_detail) = extract_stops(&haystack);

    let airport_source = if aria.is_empty() { &haystack } else { &aria };
    let mut airports = AIRPORT.find_iter(airport_source).map(|m| m.as_str().to_string());
    let departure_airport = airports.next().unwrap_or_else(not_available);
    let arrival_airport = airports.next().unwrap_or_else(not_available);

    let flight_numbers = {
        let found: Vec<&str> = FLIGHT_NUMBER
            .find_iter(&haystack)
            .map(|m| m.as_str())
            .collect();
        if found.is_empty() {
            not_available()
        } else {
            found.join(", ")
        }
    };

    let airline = AIRLINE
        .captures(&aria)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_else(not_available);

    let co2_emissions = CO2
        .find(&haystack)
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(not_available);

    let price = PRICE
        .find(&haystack)
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(not_available);

    let raw_info = if aria.is_empty() {
        text.trim().to_string()
    } else {
        aria.trim().to_string()
    };

    Ok(FlightRecord {
        departure_date: context.departure_date.clone(),
        return_date: context.return_date.clone(),
        departure_time,
        arrival_time,
        duration,
        stop_count,
        stop_detail,
        departure_airport,
        arrival_airport,
        flight_numbers,
        airline,
        co2_emissions,
        price,
        cheapest_price: NOT_AVAILABLE.to_string(),
        price_change: String::new(),
        scrape_time: context.scrape_time.clone(),
        raw_info,
    })
}

/// Drop candidates that fail the validation gate, logging each rejection.
pub fn apply_validation_gate(candidates: Vec<FlightRecord>) -> Vec<FlightRecord> {
    let total = candidates.len();
    let accepted: Vec<FlightRecord> = candidates
        .into_iter()
        .filter(|record| match record.validate() {
            Ok(()) => true,
            Err(reason) => {
                warn!(key = %record.identity(), %reason, "Rejected container at validation gate");
                false
            }
        })
        .collect();
    debug!(accepted = accepted.len(), total, "Validation gate applied");
    accepted
}

fn extract_stops(haystack: &str) -> (String, String) {
    if NONSTOP.is_match(haystack) {
        return ("0".to_string(), "Nonstop".to_string());
    }
    let Some(captures) = STOPS.captures(haystack) else {
        return (not_available(), not_available());
    };
    let count = captures[1].to_string();
    // The line mentioning the stop usually names the layover airport too.
    let detail = haystack
        .lines()
        .find(|line| STOPS.is_match(line))
        .map(|line| line.trim().to_string())
        .unwrap_or_else(not_available);
    (count, detail)
}

fn not_available() -> String {
    NOT_AVAILABLE.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockElement;

    fn context() -> ExtractionContext {
        ExtractionContext {
            departure_date: "2026-08-20".to_string(),
            return_date: String::new(),
            scrape_time: "2026-08-07 09:00:00".to_string(),
        }
    }

    #[test]
    fn test_extraction_budget_boundaries() {
        assert_eq!(extraction_budget(10, 15), 6); // ceil(10/2)+1
        assert_eq!(extraction_budget(9, 15), 6); // ceil(9/2)+1
        assert_eq!(extraction_budget(30, 15), 15); // cap applies
        assert_eq!(extraction_budget(1, 15), 1); // never more than located
        assert_eq!(extraction_budget(0, 15), 0);
    }

    #[tokio::test]
    async fn test_extracts_fields_from_accessible_label() {
        let label = "From 245 British pounds round trip total. Nonstop flight with \
                     British Airways. Leaves London Heathrow Airport LHR at 8:30 AM and \
                     arrives at John F. Kennedy International Airport JFK at 11:45 AM. \
                     Total duration 8 hr 15 min. Carbon emissions estimate: 120kg CO2e.";
        let element = MockElement::new()
            .with_text("8:30 AM – 11:45 AM\nBA 117\n£245")
            .with_attribute("aria-label", label);

        let record = extract_record(&element.into_handle(), &context())
            .await
            .unwrap();

        assert_eq!(record.departure_time, "8:30 AM");
        assert_eq!(record.arrival_time, "11:45 AM");
        assert_eq!(record.departure_airport, "LHR");
        assert_eq!(record.arrival_airport, "JFK");
        assert_eq!(record.duration, "8 hr 15 min");
        assert_eq!(record.stop_count, "0");
        assert_eq!(record.stop_detail, "Nonstop");
        assert_eq!(record.airline, "British Airways");
        assert_eq!(record.flight_numbers, "BA 117");
        assert_eq!(record.co2_emissions, "120kg CO2e");
        assert_eq!(record.price, "£245");
        assert_eq!(record.departure_date, "2026-08-20");
        assert!(record.validate().is_ok());
    }

    #[tokio::test]
    async fn test_missing_fields_become_sentinels() {
        let element = MockElement::new().with_text("Sponsored result – book now");

        let record = extract_record(&element.into_handle(), &context())
            .await
            .unwrap();

        assert_eq!(record.departure_time, NOT_AVAILABLE);
        assert_eq!(record.price, NOT_AVAILABLE);
        assert_eq!(record.co2_emissions, NOT_AVAILABLE);
        assert!(record.validate().is_err());
    }

    #[tokio::test]
    async fn test_stop_detail_keeps_layover_line() {
        let element = MockElement::new()
            .with_text("6:10 PM – 9:40 AM\n1 stop via LIS 2 hr 5 min\n£189\n95kg CO2e");

        let record = extract_record(&element.into_handle(), &context())
            .await
            .unwrap();

        assert_eq!(record.stop_count, "1");
        assert!(record.stop_detail.contains("LIS"));
    }

    #[test]
    fn test_validation_gate_drops_malformed_records() {
        let good = FlightRecord {
            co2_emissions: "120kg CO2e".to_string(),
            price: "£245".to_string(),
            ..FlightRecord::default()
        };
        let bad_price = FlightRecord {
            co2_emissions: "120kg CO2e".to_string(),
            price: "245".to_string(),
            ..FlightRecord::default()
        };
        let bad_co2 = FlightRecord {
            co2_emissions: "Avg emissions".to_string(),
            price: "£99".to_string(),
            ..FlightRecord::default()
        };

        let kept = apply_validation_gate(vec![good.clone(), bad_price, bad_co2]);
        assert_eq!(kept, vec![good]);
    }
}
