//! Shared currency-amount normalization.
//!
//! Validation, diffing, and ranking all compare prices numerically; they
//! must share one parser so a price never rounds differently in two
//! components.

use crate::types::record::FlightRecord;

/// Parse a currency string ("£245", "$ 1,200.50") into a numeric amount.
///
/// Strips every character except digits and the decimal point before
/// parsing. Returns `None` for strings with no usable digits, including
/// the "N/A" sentinel.
pub fn parse_amount(text: &str) -> Option<f64> {
    let digits: String = text.chars().filter(|c| c.is_ascii_digit() || *c == '.').collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse::<f64>().ok()
}

/// Minimum known price across the default and cheapest fields.
///
/// Unparseable on both sides yields +infinity so the record ranks last.
pub fn min_known_price(record: &FlightRecord) -> f64 {
    let candidates = [
        parse_amount(&record.price),
        parse_amount(&record.cheapest_price),
    ];
    candidates
        .into_iter()
        .flatten()
        .fold(f64::INFINITY, f64::min)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::record::NOT_AVAILABLE;

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("£245"), Some(245.0));
        assert_eq!(parse_amount("$ 1,200.50"), Some(1200.50));
        assert_eq!(parse_amount("€99"), Some(99.0));
        assert_eq!(parse_amount(NOT_AVAILABLE), None);
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("free"), None);
    }

    #[test]
    fn test_min_known_price() {
        let mut record = FlightRecord {
            price: "£245".to_string(),
            cheapest_price: "£199".to_string(),
            ..FlightRecord::default()
        };
        assert_eq!(min_known_price(&record), 199.0);

        record.cheapest_price = NOT_AVAILABLE.to_string();
        assert_eq!(min_known_price(&record), 245.0);

        record.price = NOT_AVAILABLE.to_string();
        assert_eq!(min_known_price(&record), f64::INFINITY);
    }
}
