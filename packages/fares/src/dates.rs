//! Travel-date recovery from scraped input text.
//!
//! Search inputs surface dates in whatever short format the provider
//! localizes to ("Thu, Aug 20", "20/08", ...), usually without a year.
//! Conversion assumes the current year and rolls forward when the result
//! would already be in the past, since searches are always for future
//! travel.

use chrono::{Datelike, NaiveDate};

const FORMATS_WITH_YEAR: [&str; 7] = [
    "%b %d, %Y",
    "%B %d, %Y",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%Y-%m-%d",
    "%d %b %Y",
    "%d %B %Y",
];

const FORMATS_WITHOUT_YEAR: [&str; 7] = [
    "%a, %b %d",
    "%b %d",
    "%B %d",
    "%m/%d",
    "%d/%m",
    "%d %b",
    "%d %B",
];

/// Convert a scraped date string to `YYYY-MM-DD`.
///
/// Pure function of `(raw, today)`. Unrecognized input is returned
/// unchanged, matching the persisted layout's best-effort columns.
pub fn convert_date_with_smart_year(raw: &str, today: NaiveDate) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return String::new();
    }

    for fmt in FORMATS_WITH_YEAR {
        if let Ok(date) = NaiveDate::parse_from_str(raw, fmt) {
            return date.format("%Y-%m-%d").to_string();
        }
    }

    for fmt in FORMATS_WITHOUT_YEAR {
        let fmt_with_year = format!("{fmt} %Y");
        // Weekday-bearing formats only parse under the year that makes the
        // weekday line up, so try this year then next.
        for year in [today.year(), today.year() + 1] {
            let candidate = format!("{raw} {year}");
            let Ok(date) = NaiveDate::parse_from_str(&candidate, &fmt_with_year) else {
                continue;
            };
            if year == today.year() && date < today {
                match date.with_year(year + 1) {
                    Some(rolled) => return rolled.format("%Y-%m-%d").to_string(),
                    None => continue, // Feb 29 in a non-leap follow-up year
                }
            }
            return date.format("%Y-%m-%d").to_string();
        }
    }

    raw.to_string()
}
