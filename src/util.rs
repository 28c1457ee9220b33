// Utility helpers for parsing and basic arithmetic.
//
// This module centralizes the "dirty" cell handling so the rest of the code
// can assume clean, typed values.
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};
use num_format::{Locale, ToFormattedString};

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Date-time layouts seen in ticketing exports, tried in order.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

/// Trim a cell and turn blanks into `None`.
pub fn non_empty(s: Option<&str>) -> Option<&str> {
    let s = s?.trim();
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// Parse a date-time cell. Date-only values map to midnight, RFC 3339 values
/// with an offset keep their local wall-clock time.
pub fn parse_datetime_safe(s: Option<&str>) -> Option<NaiveDateTime> {
    let s = non_empty(s)?;
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.naive_local())
}

/// Fractional days in a duration (negative durations stay negative).
pub fn duration_days(d: Duration) -> f64 {
    d.num_milliseconds() as f64 / MILLIS_PER_DAY
}

/// Mean of a set of durations in whole days, rounding any partial day up.
/// Returns `None` for an empty slice.
pub fn mean_days_ceil(durations: &[Duration]) -> Option<i64> {
    if durations.is_empty() {
        return None;
    }
    let total: i64 = durations.iter().map(|d| d.num_milliseconds()).sum();
    let mean_days = total as f64 / durations.len() as f64 / MILLIS_PER_DAY;
    Some(mean_days.ceil() as i64)
}

pub fn round_one_decimal(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    // Thin wrapper around `num-format` so counts print as `9,855`.
    n.to_formatted_string(&Locale::en)
}

/// Signed percentage with one decimal, e.g. `+25.0%` or `-3.4%`.
pub fn format_pct(v: f64) -> String {
    if v > 0.0 {
        format!("+{:.1}%", v)
    } else {
        format!("{:.1}%", v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(Some("  x ")), Some("x"));
        assert_eq!(non_empty(Some("   ")), None);
        assert_eq!(non_empty(None), None);
    }

    #[test]
    fn test_parse_datetime_iso() {
        let dt = parse_datetime_safe(Some("2024-03-05 14:30:00")).unwrap();
        assert_eq!(dt.format("%Y-%m-%dT%H:%M").to_string(), "2024-03-05T14:30");
        assert!(parse_datetime_safe(Some("2024-03-05T14:30:00")).is_some());
        assert!(parse_datetime_safe(Some("2024-03-05 14:30")).is_some());
    }

    #[test]
    fn test_parse_datetime_us_and_date_only() {
        let dt = parse_datetime_safe(Some("03/05/2024 2:30 PM")).unwrap();
        assert_eq!(dt.hour(), 14);
        let d = parse_datetime_safe(Some("2024-03-05")).unwrap();
        assert_eq!(d.hour(), 0);
        assert!(parse_datetime_safe(Some("03/05/2024")).is_some());
    }

    #[test]
    fn test_parse_datetime_rfc3339() {
        let dt = parse_datetime_safe(Some("2024-03-05T14:30:00+03:00")).unwrap();
        assert_eq!(dt.hour(), 14);
    }

    #[test]
    fn test_parse_datetime_rejects_garbage() {
        assert!(parse_datetime_safe(Some("not a date")).is_none());
        assert!(parse_datetime_safe(Some("")).is_none());
        assert!(parse_datetime_safe(None).is_none());
    }

    #[test]
    fn test_mean_days_ceil() {
        // 2.01 days -> 3, exactly 2 days -> 2
        assert_eq!(mean_days_ceil(&[Duration::seconds(173_664)]), Some(3));
        assert_eq!(mean_days_ceil(&[Duration::days(2)]), Some(2));
        assert_eq!(mean_days_ceil(&[Duration::days(1), Duration::days(2)]), Some(2));
        assert_eq!(mean_days_ceil(&[]), None);
    }

    #[test]
    fn test_mean_days_ceil_counts_sub_second_remainder() {
        let half_second = Duration::days(2) + Duration::milliseconds(500);
        assert_eq!(mean_days_ceil(&[half_second]), Some(3));

        let requested = parse_datetime_safe(Some("2024-01-01 00:00:00")).unwrap();
        let updated = parse_datetime_safe(Some("2024-01-03 00:00:00.500")).unwrap();
        assert_eq!(mean_days_ceil(&[updated - requested]), Some(3));
        assert!(duration_days(updated - requested) > 2.0);
    }

    #[test]
    fn test_mean_days_ceil_negative() {
        // -0.5 days ceils towards zero
        assert_eq!(mean_days_ceil(&[Duration::hours(-12)]), Some(0));
    }

    #[test]
    fn test_round_one_decimal() {
        assert_eq!(round_one_decimal(25.0), 25.0);
        assert_eq!(round_one_decimal(33.333), 33.3);
        assert_eq!(round_one_decimal(-12.56), -12.6);
    }

    #[test]
    fn test_format_helpers() {
        assert_eq!(format_int(9855), "9,855");
        assert_eq!(format_pct(25.0), "+25.0%");
        assert_eq!(format_pct(-3.44), "-3.4%");
        assert_eq!(format_pct(0.0), "0.0%");
    }
}
