//! Trailing time window used to decide which listing posts are crawled
//!
//! Board listings render dates in several shapes depending on the age of the
//! post (`13:45` for today, `02.20` or `01/20` for this year, `25/01/20` or a
//! full `2025-01-20 13:45:12` timestamp otherwise). Everything is normalized
//! into `YYYY-MM-DD[ HH:MM[:SS]]` before it is parsed and compared with the
//! window cutoff.

use chrono::{Datelike, Months, NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use std::sync::LazyLock;

use crate::utils::error::DateParseError;

/// Placeholder used when a listing row carries no date at all
pub const NO_DATE: &str = "날짜 없음";

static FULL_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4})[-./](\d{1,2})[-./](\d{1,2})(?:[ T]+(\d{1,2}):(\d{2})(?::(\d{2}))?)?$")
        .unwrap()
});

static SHORT_YEAR_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{2})[./](\d{1,2})[./](\d{1,2})$").unwrap());

static MONTH_DAY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2})[./](\d{1,2})$").unwrap());

static TIME_ONLY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2}):(\d{2})$").unwrap());

/// Reference instant plus lookback, with the derived cutoff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlWindow {
    reference: NaiveDateTime,
    months_back: u32,
    cutoff: NaiveDateTime,
}

impl CrawlWindow {
    pub fn new(reference: NaiveDateTime, months_back: u32) -> Self {
        Self {
            reference,
            months_back,
            cutoff: compute_cutoff(reference, months_back),
        }
    }

    /// Window anchored at midnight of `date`
    pub fn starting_on(date: NaiveDate, months_back: u32) -> Self {
        Self::new(date.and_time(NaiveTime::MIN), months_back)
    }

    pub fn reference(&self) -> NaiveDateTime {
        self.reference
    }

    pub fn months_back(&self) -> u32 {
        self.months_back
    }

    pub fn cutoff(&self) -> NaiveDateTime {
        self.cutoff
    }

    pub fn contains(&self, candidate: Option<NaiveDateTime>) -> bool {
        is_in_window(candidate, self.cutoff)
    }

    /// Normalize and parse a listing date relative to this window's reference
    pub fn resolve(&self, raw: &str) -> (String, Result<NaiveDateTime, DateParseError>) {
        let normalized = normalize_listing_date(raw, self.reference);
        let parsed = parse_normalized_date(&normalized);
        (normalized, parsed)
    }
}

/// Shift `reference` back by `months_back` calendar months
///
/// Day-of-month overflow is clamped to the last day of the target month.
/// Lookbacks that leave chrono's representable range saturate at the minimum.
pub fn compute_cutoff(reference: NaiveDateTime, months_back: u32) -> NaiveDateTime {
    reference
        .checked_sub_months(Months::new(months_back))
        .unwrap_or(NaiveDateTime::MIN)
}

/// `false` for unparsed dates, otherwise `candidate >= cutoff`
pub fn is_in_window(candidate: Option<NaiveDateTime>, cutoff: NaiveDateTime) -> bool {
    candidate.is_some_and(|date| date >= cutoff)
}

/// Bring a listing date into `YYYY-MM-DD[ HH:MM[:SS]]` form
///
/// Unrecognized input is returned trimmed and unchanged so that parsing
/// rejects it later.
pub fn normalize_listing_date(raw: &str, reference: NaiveDateTime) -> String {
    let raw = raw.trim();

    if let Some(caps) = FULL_DATE.captures(raw) {
        let date = format!("{}-{:0>2}-{:0>2}", &caps[1], &caps[2], &caps[3]);
        return match (caps.get(4), caps.get(5), caps.get(6)) {
            (Some(h), Some(m), Some(s)) => {
                format!("{date} {:0>2}:{}:{}", h.as_str(), m.as_str(), s.as_str())
            }
            (Some(h), Some(m), None) => format!("{date} {:0>2}:{}", h.as_str(), m.as_str()),
            _ => date,
        };
    }

    if let Some(caps) = SHORT_YEAR_DATE.captures(raw) {
        let century = reference.year() / 100 * 100;
        let year = century + caps[1].parse::<i32>().unwrap_or_default();
        return format!("{year:04}-{:0>2}-{:0>2}", &caps[2], &caps[3]);
    }

    if let Some(caps) = MONTH_DAY.captures(raw) {
        return format!("{:04}-{:0>2}-{:0>2}", reference.year(), &caps[1], &caps[2]);
    }

    if let Some(caps) = TIME_ONLY.captures(raw) {
        return format!("{} {:0>2}:{}", reference.format("%Y-%m-%d"), &caps[1], &caps[2]);
    }

    raw.to_string()
}

/// Parse a normalized listing date; date-only values resolve to midnight
pub fn parse_normalized_date(text: &str) -> Result<NaiveDateTime, DateParseError> {
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(parsed);
        }
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .map(|date| date.and_time(NaiveTime::MIN))
        .map_err(|_| DateParseError::new(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_time(NaiveTime::MIN)
    }

    #[test]
    fn test_cutoff_one_month() {
        assert_eq!(compute_cutoff(at(2025, 2, 24), 1), at(2025, 1, 24));
    }

    #[test]
    fn test_cutoff_clamps_day_of_month() {
        assert_eq!(compute_cutoff(at(2025, 3, 31), 1), at(2025, 2, 28));
        assert_eq!(compute_cutoff(at(2024, 3, 31), 1), at(2024, 2, 29));
        assert_eq!(compute_cutoff(at(2025, 5, 31), 3), at(2025, 2, 28));
    }

    #[test]
    fn test_cutoff_zero_months_is_reference() {
        assert_eq!(compute_cutoff(at(2025, 2, 24), 0), at(2025, 2, 24));
    }

    #[test]
    fn test_cutoff_crosses_year() {
        assert_eq!(compute_cutoff(at(2025, 2, 24), 14), at(2023, 12, 24));
    }

    #[test]
    fn test_is_in_window_boundary() {
        let cutoff = at(2025, 1, 24);
        assert!(is_in_window(Some(at(2025, 1, 24)), cutoff));
        assert!(is_in_window(Some(at(2025, 2, 1)), cutoff));
        assert!(!is_in_window(Some(at(2025, 1, 23)), cutoff));
        assert!(!is_in_window(None, cutoff));
        assert!(!is_in_window(None, NaiveDateTime::MIN));
    }

    #[test]
    fn test_normalize_full_forms() {
        let reference = at(2025, 2, 24);
        assert_eq!(normalize_listing_date("2025-02-01", reference), "2025-02-01");
        assert_eq!(
            normalize_listing_date("2025-02-20 13:45:12", reference),
            "2025-02-20 13:45:12"
        );
        assert_eq!(
            normalize_listing_date("2025.2.3 9:05", reference),
            "2025-02-03 09:05"
        );
        assert_eq!(
            normalize_listing_date("  2024/12/31  ", reference),
            "2024-12-31"
        );
    }

    #[test]
    fn test_normalize_short_forms() {
        let reference = at(2025, 2, 24);
        assert_eq!(normalize_listing_date("01/20", reference), "2025-01-20");
        assert_eq!(normalize_listing_date("02.03", reference), "2025-02-03");
        assert_eq!(normalize_listing_date("24/12/31", reference), "2024-12-31");
        assert_eq!(normalize_listing_date("24.12.31", reference), "2024-12-31");
        assert_eq!(normalize_listing_date("9:05", reference), "2025-02-24 09:05");
    }

    #[test]
    fn test_normalize_leaves_unknown_text() {
        let reference = at(2025, 2, 24);
        assert_eq!(normalize_listing_date(NO_DATE, reference), NO_DATE);
        assert_eq!(normalize_listing_date("어제", reference), "어제");
    }

    #[test]
    fn test_parse_normalized_date() {
        assert_eq!(parse_normalized_date("2025-02-01").unwrap(), at(2025, 2, 1));
        assert_eq!(
            parse_normalized_date("2025-02-20 13:45").unwrap(),
            at(2025, 2, 20).date().and_hms_opt(13, 45, 0).unwrap()
        );
        assert_eq!(
            parse_normalized_date("2025-02-20 13:45:12").unwrap(),
            at(2025, 2, 20).date().and_hms_opt(13, 45, 12).unwrap()
        );
        assert!(parse_normalized_date("2025-02-30").is_err());
        assert!(parse_normalized_date(NO_DATE).is_err());
    }

    #[test]
    fn test_window_scenario() {
        let window = CrawlWindow::starting_on(NaiveDate::from_ymd_opt(2025, 2, 24).unwrap(), 1);
        assert_eq!(window.cutoff(), at(2025, 1, 24));

        let (normalized, parsed) = window.resolve("01/20");
        assert_eq!(normalized, "2025-01-20");
        assert!(!window.contains(parsed.ok()));

        let (normalized, parsed) = window.resolve("2025-02-01");
        assert_eq!(normalized, "2025-02-01");
        assert!(window.contains(parsed.ok()));

        let (_, parsed) = window.resolve(NO_DATE);
        assert!(parsed.is_err());
        assert!(!window.contains(parsed.ok()));
    }
}
