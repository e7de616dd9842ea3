use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Naive layouts accepted for trip timestamps, tried in order.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

/// Parse a trip timestamp.
///
/// Accepts RFC 3339 strings with an offset (normalised to UTC), the naive
/// ISO-8601 variants with `T` or a space separator, US-style
/// `month/day/year` forms and bare dates (midnight). Returns `None` for empty
/// or unrecognised input.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    let normalised = match s.strip_suffix('Z') {
        Some(stripped) => format!("{stripped}+00:00"),
        None => s.to_string(),
    };
    if let Ok(dt) = DateTime::parse_from_rfc3339(&normalised) {
        return Some(dt.with_timezone(&Utc).naive_utc());
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive);
        }
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Elapsed minutes between two timestamps (negative if `end` precedes `start`).
pub fn duration_minutes(start: NaiveDateTime, end: NaiveDateTime) -> f64 {
    (end - start).num_milliseconds() as f64 / 60_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    #[test]
    fn test_parse_iso_t_separator() {
        assert_eq!(
            parse_timestamp("2024-01-01T10:00:00"),
            Some(dt(2024, 1, 1, 10, 0, 0))
        );
    }

    #[test]
    fn test_parse_space_separator_and_fraction() {
        let parsed = parse_timestamp("2024-01-01 10:45:00.500").unwrap();
        assert_eq!(parsed.date(), NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(parsed.and_utc().timestamp_subsec_millis(), 500);
    }

    #[test]
    fn test_parse_rfc3339_normalises_to_utc() {
        assert_eq!(
            parse_timestamp("2024-01-01T12:00:00+02:00"),
            Some(dt(2024, 1, 1, 10, 0, 0))
        );
        assert_eq!(
            parse_timestamp("2024-01-01T10:00:00Z"),
            Some(dt(2024, 1, 1, 10, 0, 0))
        );
    }

    #[test]
    fn test_parse_us_and_date_only() {
        assert_eq!(
            parse_timestamp("01/31/2024 08:15"),
            Some(dt(2024, 1, 31, 8, 15, 0))
        );
        assert_eq!(parse_timestamp("2024-02-29"), Some(dt(2024, 2, 29, 0, 0, 0)));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("   "), None);
        assert_eq!(parse_timestamp("yesterday"), None);
        assert_eq!(parse_timestamp("2024-13-01 10:00:00"), None);
    }

    #[test]
    fn test_duration_minutes() {
        let start = dt(2024, 1, 1, 10, 0, 0);
        let end = dt(2024, 1, 1, 10, 45, 0);
        assert!((duration_minutes(start, end) - 45.0).abs() < 1e-9);
        assert!((duration_minutes(end, start) + 45.0).abs() < 1e-9);
        assert!((duration_minutes(start, dt(2024, 1, 1, 10, 0, 30)) - 0.5).abs() < 1e-9);
    }
}
