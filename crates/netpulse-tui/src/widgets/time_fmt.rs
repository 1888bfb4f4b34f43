//! Eastern-time formatting for the header clock, chart labels and alert
//! table.
//!
//! Every function is total: a missing timestamp renders as `N/A`, an
//! unreadable one as `Invalid`.

use chrono::{DateTime, Utc};
use chrono_tz::America::New_York;

use netpulse_core::convert::parse_timestamp;

const LONG_FORMAT: &str = "%m/%d/%y, %I:%M:%S %p";
const SHORT_FORMAT: &str = "%I:%M:%S %p";

const MISSING: &str = "N/A";
const INVALID: &str = "Invalid";

/// `MM/DD/YY, hh:mm:ss AM` in America/New_York.
pub fn long(ts: Option<DateTime<Utc>>) -> String {
    render(ts, LONG_FORMAT)
}

/// `hh:mm:ss AM` in America/New_York.
pub fn short(ts: Option<DateTime<Utc>>) -> String {
    render(ts, SHORT_FORMAT)
}

/// [`long`] over a raw backend timestamp.
pub fn long_raw(raw: Option<&str>) -> String {
    render_raw(raw, LONG_FORMAT)
}

/// [`short`] over a raw backend timestamp.
pub fn short_raw(raw: Option<&str>) -> String {
    render_raw(raw, SHORT_FORMAT)
}

fn render(ts: Option<DateTime<Utc>>, fmt: &str) -> String {
    ts.map_or_else(
        || MISSING.to_owned(),
        |ts| ts.with_timezone(&New_York).format(fmt).to_string(),
    )
}

fn render_raw(raw: Option<&str>, fmt: &str) -> String {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => MISSING.to_owned(),
        Some(s) => parse_timestamp(s)
            .map_or_else(|_| INVALID.to_owned(), |ts| render(Some(ts), fmt)),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[test]
    fn summer_time_is_utc_minus_four() {
        let ts = Utc.with_ymd_and_hms(2024, 7, 4, 16, 5, 9).unwrap();
        assert_eq!(long(Some(ts)), "07/04/24, 12:05:09 PM");
        assert_eq!(short(Some(ts)), "12:05:09 PM");
    }

    #[test]
    fn winter_time_is_utc_minus_five() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 15, 5, 30, 0).unwrap();
        assert_eq!(long(Some(ts)), "01/15/24, 12:30:00 AM");
        assert_eq!(short(Some(ts)), "12:30:00 AM");
    }

    #[test]
    fn single_digit_hours_are_zero_padded() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 14, 7, 3).unwrap();
        assert_eq!(short(Some(ts)), "09:07:03 AM");
    }

    #[test]
    fn missing_timestamp() {
        assert_eq!(long(None), "N/A");
        assert_eq!(short(None), "N/A");
        assert_eq!(long_raw(None), "N/A");
        assert_eq!(short_raw(Some("")), "N/A");
    }

    #[test]
    fn raw_timestamps() {
        assert_eq!(long_raw(Some("2024-07-04T16:05:09Z")), "07/04/24, 12:05:09 PM");
        // Naive backend timestamps are UTC.
        assert_eq!(short_raw(Some("2024-07-04T16:05:09.123456")), "12:05:09 PM");
        assert_eq!(long_raw(Some("yesterday")), "Invalid");
        assert_eq!(short_raw(Some("2024-13-45T99:00:00")), "Invalid");
    }
}
