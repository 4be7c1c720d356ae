#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Collision record types, canonical column names and risk levels.
//!
//! This crate defines the shared vocabulary of the wildlife-risk system:
//! the shape of one reported wildlife-vehicle collision, the column names
//! used by the cleaned dataset and by the trained model, and the five-level
//! ordinal risk scale shown to users.

use chrono::{NaiveDate, NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Canonical column names of the cleaned collision dataset.
///
/// The same names are used for the raw feature row handed to the model, so
/// a one-hot encoded column is always `<name>_<value>`.
pub mod columns {
    /// Administrative county (län).
    pub const COUNTY: &str = "County";
    /// Municipality (kommun) within a county.
    pub const MUNICIPALITY: &str = "Municipality";
    /// Animal species involved.
    pub const SPECIES: &str = "Species";
    /// Raw incident timestamp.
    pub const TIME: &str = "Time";
    /// Calendar year derived from [`TIME`].
    pub const YEAR: &str = "Year";
    /// Calendar month (1-12) derived from [`TIME`].
    pub const MONTH: &str = "Month";
    /// Hour of day (0-23) derived from [`TIME`].
    pub const HOUR: &str = "Hour";
    /// Ordinal day of the year (1-366) derived from [`TIME`].
    pub const DAY_OF_YEAR: &str = "Day_of_Year";
    /// Calendar date derived from [`TIME`].
    pub const DATE: &str = "Date";
    /// English weekday name derived from [`TIME`].
    pub const WEEKDAY: &str = "Weekday";
    /// WGS84 latitude.
    pub const LATITUDE: &str = "Lat_WGS84";
    /// WGS84 longitude.
    pub const LONGITUDE: &str = "Long_WGS84";

    /// Text columns that are whitespace-trimmed on load.
    pub const TRIMMED_TEXT: [&str; 3] = [COUNTY, MUNICIPALITY, SPECIES];

    /// Columns every collision dataset must provide.
    pub const REQUIRED: [&str; 3] = [COUNTY, MUNICIPALITY, SPECIES];
}

/// Dropdown sentinel meaning "do not filter by species".
pub const ALL_SPECIES: &str = "All species";

/// Municipality used when a query does not name one.
pub const UNKNOWN_MUNICIPALITY: &str = "Unknown";

/// One reported wildlife-vehicle collision.
///
/// Calendar fields are either read from the dataset or derived from
/// [`Self::time`] at load time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollisionRecord {
    /// Species involved (e.g. `"Moose"`).
    pub species: String,
    /// County the collision was reported in.
    pub county: String,
    /// Municipality the collision was reported in.
    pub municipality: String,
    /// When the collision happened, if the timestamp could be parsed.
    pub time: Option<NaiveDateTime>,
    /// Calendar year.
    pub year: Option<i32>,
    /// Calendar month (1-12).
    pub month: Option<u32>,
    /// Hour of day (0-23).
    pub hour: Option<u32>,
    /// Ordinal day of the year (1-366).
    pub day_of_year: Option<u32>,
    /// Calendar date.
    pub date: Option<NaiveDate>,
    /// English weekday name (e.g. `"Monday"`).
    pub weekday: Option<String>,
    /// WGS84 latitude.
    pub latitude: Option<f64>,
    /// WGS84 longitude.
    pub longitude: Option<f64>,
}

impl CollisionRecord {
    /// Returns the coordinates when both are present.
    #[must_use]
    pub const fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }
}

/// Returns the full English name of a weekday (`"Monday"`, ...).
#[must_use]
pub const fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Ordinal collision risk shown to users, from 1 (very low) to 5 (very high).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum RiskLevel {
    /// Level 1
    #[serde(rename = "Very Low")]
    #[strum(serialize = "Very Low")]
    VeryLow = 1,
    /// Level 2
    #[serde(rename = "Low")]
    #[strum(serialize = "Low")]
    Low = 2,
    /// Level 3
    #[serde(rename = "Moderate")]
    #[strum(serialize = "Moderate")]
    Moderate = 3,
    /// Level 4
    #[serde(rename = "High")]
    #[strum(serialize = "High")]
    High = 4,
    /// Level 5
    #[serde(rename = "Very High")]
    #[strum(serialize = "Very High")]
    VeryHigh = 5,
}

impl RiskLevel {
    /// Returns the numeric value of this risk level.
    #[must_use]
    pub const fn value(self) -> u8 {
        self as u8
    }

    /// Creates a risk level from a numeric value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not in the range 1-5.
    pub const fn from_value(value: u8) -> Result<Self, InvalidRiskLevelError> {
        match value {
            1 => Ok(Self::VeryLow),
            2 => Ok(Self::Low),
            3 => Ok(Self::Moderate),
            4 => Ok(Self::High),
            5 => Ok(Self::VeryHigh),
            _ => Err(InvalidRiskLevelError { value }),
        }
    }

    /// Returns all variants from lowest to highest.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::VeryLow,
            Self::Low,
            Self::Moderate,
            Self::High,
            Self::VeryHigh,
        ]
    }

    /// Driving advice shown next to the prediction.
    #[must_use]
    pub const fn advice(self) -> &'static str {
        match self {
            Self::VeryHigh => "Very high risk. Avoid travel or proceed with extreme caution.",
            Self::High => "High risk. Reduce speed and stay extremely alert.",
            Self::Moderate => "Moderate risk. Watch for wildlife near the road.",
            Self::Low => "Low risk. Stay alert and follow signage.",
            Self::VeryLow => "Very low risk. Drive with normal caution.",
        }
    }
}

/// Error returned when attempting to create a [`RiskLevel`] from an invalid
/// numeric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidRiskLevelError {
    /// The invalid value that was provided.
    pub value: u8,
}

impl std::fmt::Display for InvalidRiskLevelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid risk level {}: expected 1-5", self.value)
    }
}

impl std::error::Error for InvalidRiskLevelError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn risk_level_display_matches_labels() {
        assert_eq!(RiskLevel::VeryLow.to_string(), "Very Low");
        assert_eq!(RiskLevel::VeryHigh.to_string(), "Very High");
        assert_eq!("Moderate".parse::<RiskLevel>().unwrap(), RiskLevel::Moderate);
    }

    #[test]
    fn risk_level_from_value_roundtrip() {
        for level in RiskLevel::all() {
            assert_eq!(RiskLevel::from_value(level.value()).unwrap(), *level);
        }
        assert!(RiskLevel::from_value(0).is_err());
        assert!(RiskLevel::from_value(6).is_err());
    }

    #[test]
    fn risk_levels_are_ordered() {
        let all = RiskLevel::all();
        assert!(all.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn weekday_names_are_english() {
        assert_eq!(weekday_name(Weekday::Mon), "Monday");
        assert_eq!(weekday_name(Weekday::Sun), "Sunday");
    }
}
