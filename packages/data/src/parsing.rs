//! Cell-level parsing helpers for the collision CSV.
//!
//! Unparseable values become `None` rather than errors, mirroring how the
//! cleaned dataset is consumed: a bad timestamp only removes that row from
//! temporal charts.

use chrono::{NaiveDate, NaiveDateTime};

const DATETIME_FORMATS: [&str; 5] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
];

/// Parses a collision timestamp.
///
/// Accepts ISO 8601 with or without a `T` separator, optional seconds and
/// fractional seconds, and bare dates (taken as midnight).
#[must_use]
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt);
        }
    }
    parse_date(s).and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Parses a calendar date (`YYYY-MM-DD`).
#[must_use]
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}

/// Parses an integer cell, tolerating a trailing `.0` written by
/// dataframe exports.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn parse_int<T: TryFrom<i64>>(s: &str) -> Option<T> {
    let s = s.trim();
    let value = s.parse::<i64>().ok().or_else(|| {
        let f = parse_float(s)?;
        (f.fract() == 0.0).then_some(f as i64)
    })?;
    T::try_from(value).ok()
}

/// Parses a float cell. Returns `None` for blanks, `nan` and non-finite
/// values.
#[must_use]
pub fn parse_float(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|f| f.is_finite())
}

/// Returns the trimmed cell, or `None` if it is blank.
#[must_use]
pub fn non_blank(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_timestamp_with_space_separator() {
        let dt = parse_timestamp("2021-09-14 19:45:00").unwrap();
        assert_eq!(dt.to_string(), "2021-09-14 19:45:00");
    }

    #[test]
    fn parses_timestamp_with_t_and_fraction() {
        let dt = parse_timestamp("2021-09-14T19:45:00.250").unwrap();
        assert_eq!(dt.format("%H:%M").to_string(), "19:45");
    }

    #[test]
    fn parses_timestamp_without_seconds() {
        let dt = parse_timestamp("2021-09-14 06:05").unwrap();
        assert_eq!(dt.to_string(), "2021-09-14 06:05:00");
    }

    #[test]
    fn bare_date_is_midnight() {
        let dt = parse_timestamp("2021-09-14").unwrap();
        assert_eq!(dt.to_string(), "2021-09-14 00:00:00");
    }

    #[test]
    fn rejects_invalid_timestamp() {
        assert!(parse_timestamp("not-a-date").is_none());
        assert!(parse_timestamp("").is_none());
    }

    #[test]
    fn parses_float_exported_integers() {
        assert_eq!(parse_int::<u32>("9.0"), Some(9));
        assert_eq!(parse_int::<u32>(" 19 "), Some(19));
        assert_eq!(parse_int::<u32>("9.5"), None);
        assert_eq!(parse_int::<u32>("-1"), None);
    }

    #[test]
    fn rejects_nan_floats() {
        assert!(parse_float("nan").is_none());
        assert!(parse_float("").is_none());
        assert!((parse_float("59.87").unwrap() - 59.87).abs() < f64::EPSILON);
    }
}
