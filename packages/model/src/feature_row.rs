//! Feature row construction from user selections.

use chrono::{Datelike as _, NaiveDate};
use serde::{Deserialize, Serialize};
use wildlife_risk_collision_models::{UNKNOWN_MUNICIPALITY, columns, weekday_name};

/// Fallback latitude near the centroid of Sweden.
pub const DEFAULT_LATITUDE: f64 = 60.0;

/// Fallback longitude near the centroid of Sweden.
pub const DEFAULT_LONGITUDE: f64 = 15.0;

/// Errors from [`build_feature_row`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    /// Month outside 1-12.
    #[error("invalid month {0}: expected 1-12")]
    InvalidMonth(u32),

    /// Hour outside 0-23.
    #[error("invalid hour {0}: expected 0-23")]
    InvalidHour(u32),

    /// Day of year outside 1-366.
    #[error("invalid day of year {0}: expected 1-366")]
    InvalidDayOfYear(u32),

    /// The year cannot be represented as a calendar date.
    #[error("invalid year {0}")]
    InvalidYear(i32),
}

/// The user-supplied values a prediction is made for.
///
/// Optional fields are defaulted by [`build_feature_row`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureQuery {
    /// Calendar year.
    pub year: i32,
    /// Calendar month (1-12).
    pub month: u32,
    /// Hour of day (0-23).
    pub hour: u32,
    /// County.
    pub county: String,
    /// Species.
    pub species: String,
    /// Municipality within the county.
    pub municipality: Option<String>,
    /// WGS84 latitude.
    pub latitude: Option<f64>,
    /// WGS84 longitude.
    pub longitude: Option<f64>,
    /// Ordinal day of the year.
    pub day_of_year: Option<u32>,
    /// English weekday name.
    pub weekday: Option<String>,
}

impl FeatureQuery {
    /// Creates a query with every optional field unset.
    #[must_use]
    pub fn new(year: i32, month: u32, hour: u32, county: &str, species: &str) -> Self {
        Self {
            year,
            month,
            hour,
            county: county.to_owned(),
            species: species.to_owned(),
            municipality: None,
            latitude: None,
            longitude: None,
            day_of_year: None,
            weekday: None,
        }
    }

    /// Sets the municipality.
    #[must_use]
    pub fn with_municipality(mut self, municipality: &str) -> Self {
        self.municipality = Some(municipality.to_owned());
        self
    }

    /// Sets the coordinates.
    #[must_use]
    pub const fn with_coordinates(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }

    /// Sets the day of year.
    #[must_use]
    pub const fn with_day_of_year(mut self, day_of_year: u32) -> Self {
        self.day_of_year = Some(day_of_year);
        self
    }

    /// Sets the weekday name.
    #[must_use]
    pub fn with_weekday(mut self, weekday: &str) -> Self {
        self.weekday = Some(weekday.to_owned());
        self
    }
}

/// A raw feature value before one-hot encoding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FeatureValue<'a> {
    /// Passed through to the model unchanged.
    Numeric(f64),
    /// Expanded into a `<column>_<value>` indicator.
    Categorical(&'a str),
}

/// A single hypothetical collision to score.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureRow {
    pub year: i32,
    pub month: u32,
    pub hour: u32,
    pub county: String,
    pub municipality: String,
    pub species: String,
    pub latitude: f64,
    pub longitude: f64,
    pub day_of_year: u32,
    pub weekday: String,
}

impl FeatureRow {
    /// The raw columns in their fixed order.
    #[must_use]
    pub fn raw_columns(&self) -> [(&'static str, FeatureValue<'_>); 10] {
        [
            (columns::YEAR, FeatureValue::Numeric(f64::from(self.year))),
            (columns::MONTH, FeatureValue::Numeric(f64::from(self.month))),
            (columns::HOUR, FeatureValue::Numeric(f64::from(self.hour))),
            (columns::COUNTY, FeatureValue::Categorical(&self.county)),
            (columns::MUNICIPALITY, FeatureValue::Categorical(&self.municipality)),
            (columns::SPECIES, FeatureValue::Categorical(&self.species)),
            (columns::LATITUDE, FeatureValue::Numeric(self.latitude)),
            (columns::LONGITUDE, FeatureValue::Numeric(self.longitude)),
            (columns::DAY_OF_YEAR, FeatureValue::Numeric(f64::from(self.day_of_year))),
            (columns::WEEKDAY, FeatureValue::Categorical(&self.weekday)),
        ]
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Builds the feature row for one query.
///
/// Defaults: municipality `"Unknown"`, coordinates
/// ([`DEFAULT_LATITUDE`], [`DEFAULT_LONGITUDE`]), and day of year and
/// weekday of the first day of the queried month. Nothing depends on the
/// wall clock.
///
/// # Errors
///
/// Returns [`BuildError`] if the month, hour or day of year is out of range
/// or the year is not a representable date.
pub fn build_feature_row(query: &FeatureQuery) -> Result<FeatureRow, BuildError> {
    if !(1..=12).contains(&query.month) {
        return Err(BuildError::InvalidMonth(query.month));
    }
    if query.hour > 23 {
        return Err(BuildError::InvalidHour(query.hour));
    }
    if let Some(day) = query.day_of_year
        && !(1..=366).contains(&day)
    {
        return Err(BuildError::InvalidDayOfYear(day));
    }

    let first_of_month = NaiveDate::from_ymd_opt(query.year, query.month, 1)
        .ok_or(BuildError::InvalidYear(query.year))?;

    Ok(FeatureRow {
        year: query.year,
        month: query.month,
        hour: query.hour,
        county: query.county.trim().to_owned(),
        municipality: non_blank(query.municipality.as_deref())
            .unwrap_or(UNKNOWN_MUNICIPALITY)
            .to_owned(),
        species: query.species.trim().to_owned(),
        latitude: query.latitude.unwrap_or(DEFAULT_LATITUDE),
        longitude: query.longitude.unwrap_or(DEFAULT_LONGITUDE),
        day_of_year: query.day_of_year.unwrap_or_else(|| first_of_month.ordinal()),
        weekday: non_blank(query.weekday.as_deref())
            .unwrap_or_else(|| weekday_name(first_of_month.weekday()))
            .to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_filled_from_year_and_month() {
        let row = build_feature_row(&FeatureQuery::new(2025, 8, 14, "Värmlands län", "Moose"))
            .unwrap();
        assert_eq!(row.municipality, "Unknown");
        assert!((row.latitude - 60.0).abs() < f64::EPSILON);
        assert!((row.longitude - 15.0).abs() < f64::EPSILON);
        // 2025-08-01 is day 213 and a Friday.
        assert_eq!(row.day_of_year, 213);
        assert_eq!(row.weekday, "Friday");
    }

    #[test]
    fn explicit_values_win_and_text_is_trimmed() {
        let query = FeatureQuery::new(2025, 8, 14, " Värmlands län ", " Moose ")
            .with_municipality(" Sunne ")
            .with_coordinates(59.83, 13.14)
            .with_day_of_year(223)
            .with_weekday("Monday");
        let row = build_feature_row(&query).unwrap();
        assert_eq!(row.county, "Värmlands län");
        assert_eq!(row.species, "Moose");
        assert_eq!(row.municipality, "Sunne");
        assert_eq!(row.day_of_year, 223);
        assert_eq!(row.weekday, "Monday");
        assert!((row.latitude - 59.83).abs() < f64::EPSILON);
    }

    #[test]
    fn blank_municipality_is_unknown() {
        let query = FeatureQuery::new(2025, 1, 0, "Skåne län", "Moose").with_municipality("  ");
        assert_eq!(build_feature_row(&query).unwrap().municipality, "Unknown");
    }

    #[test]
    fn identical_inputs_give_identical_rows() {
        let query = FeatureQuery::new(2024, 2, 7, "Skåne län", "Roe deer").with_municipality("Lund");
        assert_eq!(
            build_feature_row(&query).unwrap(),
            build_feature_row(&query).unwrap()
        );
    }

    #[test]
    fn rejects_out_of_range_values() {
        assert_eq!(
            build_feature_row(&FeatureQuery::new(2025, 13, 0, "a", "b")),
            Err(BuildError::InvalidMonth(13))
        );
        assert_eq!(
            build_feature_row(&FeatureQuery::new(2025, 1, 24, "a", "b")),
            Err(BuildError::InvalidHour(24))
        );
        assert_eq!(
            build_feature_row(&FeatureQuery::new(2025, 1, 1, "a", "b").with_day_of_year(0)),
            Err(BuildError::InvalidDayOfYear(0))
        );
    }

    #[test]
    fn raw_columns_follow_fixed_order() {
        let row = build_feature_row(&FeatureQuery::new(2025, 8, 14, "Skåne län", "Moose")).unwrap();
        let names: Vec<&str> = row.raw_columns().iter().map(|(name, _)| *name).collect();
        assert_eq!(
            names,
            [
                "Year",
                "Month",
                "Hour",
                "County",
                "Municipality",
                "Species",
                "Lat_WGS84",
                "Long_WGS84",
                "Day_of_Year",
                "Weekday",
            ]
        );
    }
}
