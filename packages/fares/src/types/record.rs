//! Flight records, identity keys, and the validation gate.
//!
//! Records serialize with the persisted column names of the output schema
//! so a stored snapshot reads like the spreadsheet it sits next to.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Sentinel for any field the extractor could not recover.
pub const NOT_AVAILABLE: &str = "N/A";

/// Emissions must look like "120kg CO2e" (co2/co2e/co₂/co₂e, any case).
static VALID_CO2: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\d+\s?kg\s?(co2e?|co₂e?)$").unwrap());

/// Prices must open with a currency symbol and digits, e.g. "£245".
static VALID_PRICE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[£$€]\s?\d+").unwrap());

/// One scraped flight offer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightRecord {
    #[serde(rename = "Dep Date")]
    pub departure_date: String,

    /// Not part of the output schema, but assembly needs it to infer
    /// one-way vs round-trip.
    #[serde(rename = "Rtn Date", default)]
    pub return_date: String,

    #[serde(rename = "Dep Time")]
    pub departure_time: String,

    #[serde(rename = "Arrival Time")]
    pub arrival_time: String,

    #[serde(rename = "Duration")]
    pub duration: String,

    #[serde(rename = "No of Stops")]
    pub stop_count: String,

    #[serde(rename = "Stops")]
    pub stop_detail: String,

    #[serde(rename = "Dep Airport")]
    pub departure_airport: String,

    #[serde(rename = "Arr Airport")]
    pub arrival_airport: String,

    #[serde(rename = "Flight Number(s)")]
    pub flight_numbers: String,

    #[serde(rename = "Airline")]
    pub airline: String,

    #[serde(rename = "CO2 Emissions")]
    pub co2_emissions: String,

    #[serde(rename = "Price")]
    pub price: String,

    #[serde(rename = "Cheapest Price", default)]
    pub cheapest_price: String,

    #[serde(rename = "Price Change", default)]
    pub price_change: String,

    #[serde(rename = "Scrape Time")]
    pub scrape_time: String,

    #[serde(rename = "Flight Info", default)]
    pub raw_info: String,
}

impl Default for FlightRecord {
    fn default() -> Self {
        Self {
            departure_date: NOT_AVAILABLE.to_string(),
            return_date: String::new(),
            departure_time: NOT_AVAILABLE.to_string(),
            arrival_time: NOT_AVAILABLE.to_string(),
            duration: NOT_AVAILABLE.to_string(),
            stop_count: NOT_AVAILABLE.to_string(),
            stop_detail: NOT_AVAILABLE.to_string(),
            departure_airport: NOT_AVAILABLE.to_string(),
            arrival_airport: NOT_AVAILABLE.to_string(),
            flight_numbers: NOT_AVAILABLE.to_string(),
            airline: NOT_AVAILABLE.to_string(),
            co2_emissions: NOT_AVAILABLE.to_string(),
            price: NOT_AVAILABLE.to_string(),
            cheapest_price: NOT_AVAILABLE.to_string(),
            price_change: String::new(),
            scrape_time: NOT_AVAILABLE.to_string(),
            raw_info: NOT_AVAILABLE.to_string(),
        }
    }
}

impl FlightRecord {
    /// Identity key for reconciliation and snapshot matching.
    pub fn identity(&self) -> IdentityKey {
        IdentityKey::new(
            &self.departure_time,
            &self.arrival_time,
            &self.departure_airport,
            &self.arrival_airport,
        )
    }

    /// Run the validation gate on this record.
    ///
    /// Pure function of the emissions and price strings, so re-validating
    /// an accepted or rejected record always repeats the verdict.
    pub fn validate(&self) -> std::result::Result<(), RejectReason> {
        if !is_valid_emissions(&self.co2_emissions) {
            return Err(RejectReason::Emissions(self.co2_emissions.clone()));
        }
        if !is_valid_price(&self.price) {
            return Err(RejectReason::Price(self.price.clone()));
        }
        Ok(())
    }
}

/// Why a record was dropped at the validation gate.
///
/// Logged, tallied, and forgotten; deliberately not an error type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    Emissions(String),
    Price(String),
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::Emissions(v) => write!(f, "malformed emissions text: {v:?}"),
            RejectReason::Price(v) => write!(f, "malformed price text: {v:?}"),
        }
    }
}

/// Check the emissions string against the CO2 pattern.
pub fn is_valid_emissions(text: &str) -> bool {
    VALID_CO2.is_match(text.trim())
}

/// Check the price string against the currency pattern.
pub fn is_valid_price(text: &str) -> bool {
    VALID_PRICE.is_match(text.trim())
}

/// The four-field tuple that identifies one flight offer across views
/// and across runs. Fields are whitespace- and case-normalized, so
/// "08:30 " and "08:30" key the same offer.
///
/// Not unique in theory (codeshares), treated as unique by design.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityKey {
    pub departure_time: String,
    pub arrival_time: String,
    pub departure_airport: String,
    pub arrival_airport: String,
}

impl IdentityKey {
    pub fn new(
        departure_time: &str,
        arrival_time: &str,
        departure_airport: &str,
        arrival_airport: &str,
    ) -> Self {
        Self {
            departure_time: normalize_key_field(departure_time),
            arrival_time: normalize_key_field(arrival_time),
            departure_airport: normalize_key_field(departure_airport),
            arrival_airport: normalize_key_field(arrival_airport),
        }
    }
}

impl std::fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {}->{} {}",
            self.departure_time, self.departure_airport, self.arrival_airport, self.arrival_time
        )
    }
}

/// Trim, collapse internal whitespace, and case-fold one key field.
fn normalize_key_field(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_record() -> FlightRecord {
        FlightRecord {
            departure_time: "08:30".to_string(),
            arrival_time: "11:45".to_string(),
            departure_airport: "LHR".to_string(),
            arrival_airport: "JFK".to_string(),
            co2_emissions: "120kg CO2e".to_string(),
            price: "£245".to_string(),
            ..FlightRecord::default()
        }
    }

    #[test]
    fn test_emissions_pattern_variants() {
        assert!(is_valid_emissions("120kg CO2e"));
        assert!(is_valid_emissions("85 kg co2"));
        assert!(is_valid_emissions("85kg CO₂e"));
        assert!(is_valid_emissions("1000kg co₂"));

        assert!(!is_valid_emissions("120kg"));
        assert!(!is_valid_emissions("kg CO2e"));
        assert!(!is_valid_emissions("120kg CO2e per passenger"));
        assert!(!is_valid_emissions("N/A"));
    }

    #[test]
    fn test_price_pattern_variants() {
        assert!(is_valid_price("£245"));
        assert!(is_valid_price("$ 1200"));
        assert!(is_valid_price("€99 return"));

        assert!(!is_valid_price("245"));
        assert!(!is_valid_price("from £245"));
        assert!(!is_valid_price("N/A"));
    }

    #[test]
    fn test_validation_is_idempotent() {
        let accepted = valid_record();
        assert!(accepted.validate().is_ok());
        assert!(accepted.validate().is_ok());

        let rejected = FlightRecord {
            co2_emissions: "unknown".to_string(),
            ..valid_record()
        };
        let first = rejected.validate();
        let second = rejected.validate();
        assert!(first.is_err());
        assert_eq!(first, second);
    }

    #[test]
    fn test_identity_normalization() {
        let a = IdentityKey::new("08:30", "11:45", "LHR", "JFK");
        let b = IdentityKey::new("  08:30 ", "11:45", "lhr", " jfk  ");
        assert_eq!(a, b);

        let c = IdentityKey::new("09:30", "11:45", "LHR", "JFK");
        assert_ne!(a, c);
    }

    #[test]
    fn test_serde_uses_persisted_column_names() {
        let json = serde_json::to_value(valid_record()).unwrap();
        assert_eq!(json["Dep Airport"], "LHR");
        assert_eq!(json["CO2 Emissions"], "120kg CO2e");
        assert_eq!(json["Price"], "£245");
        assert!(json.get("departure_airport").is_none());
    }
}
