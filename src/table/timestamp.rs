//! Timestamp parsing and display.
//!
//! Uploaded files and request payloads carry timestamps in a handful of
//! spellings; everything is normalized to a naive UTC `NaiveDateTime`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{de, Deserialize, Deserializer};

/// Epoch for synthesized timestamp columns.
pub fn synthetic_epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2021, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Parse a timestamp cell or payload value. Returns `None` when no known
/// format matches.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
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
        .map(|d| d.and_time(NaiveTime::MIN))
}

/// Display form used in upload metadata and simulation events:
/// `YYYY-MM-DD HH:MM:SS`, plus microseconds only when present.
pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    if ts.nanosecond() == 0 {
        ts.format("%Y-%m-%d %H:%M:%S").to_string()
    } else {
        ts.format("%Y-%m-%d %H:%M:%S%.6f").to_string()
    }
}

/// Serde adapter for ISO-8601 request fields.
pub fn deserialize_iso<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| de::Error::custom(format!("invalid ISO-8601 datetime: {raw:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn test_parses_common_spellings() {
        let expected = at(2023, 4, 5, 6, 7, 8);
        assert_eq!(parse_timestamp("2023-04-05T06:07:08"), Some(expected));
        assert_eq!(parse_timestamp("2023-04-05 06:07:08"), Some(expected));
        assert_eq!(parse_timestamp("2023-04-05T06:07:08Z"), Some(expected));
        assert_eq!(parse_timestamp("2023-04-05T08:07:08+02:00"), Some(expected));
        assert_eq!(parse_timestamp(" 04/05/2023 06:07:08 "), Some(expected));
    }

    #[test]
    fn test_date_only_is_midnight() {
        assert_eq!(parse_timestamp("2023-04-05"), Some(at(2023, 4, 5, 0, 0, 0)));
        assert_eq!(parse_timestamp("2023/04/05"), Some(at(2023, 4, 5, 0, 0, 0)));
    }

    #[test]
    fn test_rejects_garbage() {
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("yesterday"), None);
        assert_eq!(parse_timestamp("12.5"), None);
    }

    #[test]
    fn test_display_format() {
        assert_eq!(format_timestamp(&synthetic_epoch()), "2021-01-01 00:00:00");
        let frac = parse_timestamp("2021-01-01T00:00:00.25").unwrap();
        assert_eq!(format_timestamp(&frac), "2021-01-01 00:00:00.250000");
    }
}
