//! ISO-8601 text form of order timestamps.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use shopledger_core::{DomainError, DomainResult};

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Storage form: `2023-01-01T10:30:00`, fractional seconds only when present.
pub fn format_order_date(date: &NaiveDateTime) -> String {
    date.format("%Y-%m-%dT%H:%M:%S%.f").to_string()
}

/// Parse an order timestamp.
///
/// Accepts naive timestamps (`T` or space separated), timestamps with a UTC
/// offset (the wall-clock time is kept) and bare dates (midnight).
pub fn parse_order_date(raw: &str) -> DomainResult<NaiveDateTime> {
    let raw = raw.trim();

    for format in NAIVE_FORMATS {
        if let Ok(date) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(date);
        }
    }

    if let Ok(date) = DateTime::parse_from_rfc3339(raw) {
        return Ok(date.naive_local());
    }

    if let Ok(day) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(day.and_time(chrono::NaiveTime::MIN));
    }

    Err(DomainError::validation(
        "order date",
        format!("{raw:?} is not ISO-8601 (YYYY-MM-DD[THH:MM[:SS]])"),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn formats_without_trailing_fraction() {
        let date = NaiveDate::from_ymd_opt(2023, 1, 2)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap();
        assert_eq!(format_order_date(&date), "2023-01-02T10:30:00");
    }

    #[test]
    fn parses_what_it_formats() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29)
            .unwrap()
            .and_hms_micro_opt(23, 59, 58, 123_456)
            .unwrap();
        assert_eq!(parse_order_date(&format_order_date(&date)).unwrap(), date);
    }

    #[test]
    fn accepts_common_iso_variants() {
        let expected = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();

        let bare = parse_order_date("2023-01-01").unwrap();
        assert_eq!(bare.date(), expected);
        assert_eq!(bare.hour(), 0);

        let spaced = parse_order_date("2023-01-01 12:15:00").unwrap();
        assert_eq!(spaced.hour(), 12);

        let short = parse_order_date("2023-01-01T08:05").unwrap();
        assert_eq!(short.minute(), 5);

        let offset = parse_order_date("2023-01-01T09:00:00+03:00").unwrap();
        assert_eq!(offset.date(), expected);
        assert_eq!(offset.hour(), 9);
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_order_date("yesterday").is_err());
        assert!(parse_order_date("2023-13-01").is_err());
        assert!(parse_order_date("").is_err());
    }
}
