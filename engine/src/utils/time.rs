//! Time utility functions

use chrono::{DateTime, NaiveDate, NaiveDateTime};

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d.%m.%Y", "%Y/%m/%d"];

/// Parse a date or timestamp in any of the accepted request formats
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM[:SS]`, `YYYY-MM-DDTHH:MM:SS`,
/// `YYYY-MM-DD`, `YYYY/MM/DD` and `DD.MM.YYYY`. Dates are returned at
/// midnight.
pub fn parse_date_like(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_plain_date() {
        let dt = parse_date_like("2024-01-15").unwrap();
        assert_eq!(dt.year(), 2024);
        assert_eq!(dt.month(), 1);
        assert_eq!(dt.day(), 15);
        assert_eq!(dt.hour(), 0);
    }

    #[test]
    fn test_parse_dotted_date() {
        let dt = parse_date_like("15.01.2024").unwrap();
        assert_eq!(dt.day(), 15);
        assert_eq!(dt.month(), 1);
    }

    #[test]
    fn test_parse_timestamp_variants() {
        assert_eq!(
            parse_date_like("2024-01-15 10:30:00").unwrap().minute(),
            30
        );
        assert_eq!(parse_date_like("2024-01-15T10:30:00").unwrap().hour(), 10);
        // Offset timestamps are normalised to UTC
        assert_eq!(
            parse_date_like("2024-01-15T10:30:00+05:00").unwrap().hour(),
            5
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_date_like("abc").is_none());
        assert!(parse_date_like("").is_none());
        assert!(parse_date_like("2024-13-40").is_none());
        assert!(parse_date_like("42").is_none());
    }
}
