//! Exploratory aggregates behind the dashboard charts and map.
//!
//! Every aggregate takes an optional species filter. `None`, a blank string
//! and the [`ALL_SPECIES`] sentinel all mean "every species".

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use wildlife_risk_collision_models::{ALL_SPECIES, CollisionRecord};

use crate::CollisionTable;

/// Maximum number of points returned for the collision map.
pub const MAP_POINT_LIMIT: usize = 10_000;

/// One collision plotted on the map.
#[derive(Debug, Clone, PartialEq)]
pub struct MapPoint {
    /// WGS84 latitude.
    pub latitude: f64,
    /// WGS84 longitude.
    pub longitude: f64,
    /// Species involved.
    pub species: String,
    /// County.
    pub county: String,
    /// Municipality.
    pub municipality: String,
    /// Calendar date, if known.
    pub date: Option<NaiveDate>,
}

/// Normalizes a dropdown species selection into an optional filter.
#[must_use]
pub fn species_filter(species: Option<&str>) -> Option<&str> {
    species
        .map(str::trim)
        .filter(|s| !s.is_empty() && *s != ALL_SPECIES)
}

fn matching<'a>(
    table: &'a CollisionTable,
    species: Option<&'a str>,
) -> impl Iterator<Item = &'a CollisionRecord> + 'a {
    let filter = species_filter(species);
    table
        .records()
        .iter()
        .filter(move |r| filter.is_none_or(|s| r.species == s))
}

fn count_by<K: Ord>(items: impl Iterator<Item = K>) -> BTreeMap<K, u64> {
    let mut counts = BTreeMap::new();
    for key in items {
        *counts.entry(key).or_insert(0) += 1;
    }
    counts
}

/// Collisions per calendar month, ascending by month. Months without
/// collisions are omitted.
#[must_use]
pub fn monthly_counts(table: &CollisionTable, species: Option<&str>) -> Vec<(u32, u64)> {
    count_by(matching(table, species).filter_map(|r| r.month))
        .into_iter()
        .collect()
}

/// Collisions per hour of day, ascending by hour. Hours without collisions
/// are omitted.
#[must_use]
pub fn hourly_counts(table: &CollisionTable, species: Option<&str>) -> Vec<(u32, u64)> {
    count_by(matching(table, species).filter_map(|r| r.hour))
        .into_iter()
        .collect()
}

/// Collisions per county, most collisions first (ties by county name).
#[must_use]
pub fn county_counts(table: &CollisionTable, species: Option<&str>) -> Vec<(String, u64)> {
    let mut counts: Vec<(String, u64)> = count_by(
        matching(table, species)
            .filter(|r| !r.county.is_empty())
            .map(|r| r.county.as_str()),
    )
    .into_iter()
    .map(|(county, count)| (county.to_owned(), count))
    .collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    counts
}

/// Sorted distinct years present in the table.
#[must_use]
pub fn years(table: &CollisionTable) -> Vec<i32> {
    table
        .records()
        .iter()
        .filter_map(|r| r.year)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Collisions with coordinates for one year, optionally one species.
///
/// When more than `limit` rows match, an evenly strided subset of exactly
/// `limit` rows is returned so the result is stable across calls.
#[must_use]
pub fn map_points(
    table: &CollisionTable,
    year: i32,
    species: Option<&str>,
    limit: usize,
) -> Vec<MapPoint> {
    let rows: Vec<&CollisionRecord> = matching(table, species)
        .filter(|r| r.year == Some(year) && r.coordinates().is_some())
        .collect();

    let selected: Vec<&CollisionRecord> = if rows.len() > limit {
        log::debug!("Sampling {limit} of {} map points for {year}", rows.len());
        (0..limit).map(|i| rows[i * rows.len() / limit]).collect()
    } else {
        rows
    };

    selected
        .into_iter()
        .filter_map(|r| {
            let (latitude, longitude) = r.coordinates()?;
            Some(MapPoint {
                latitude,
                longitude,
                species: r.species.clone(),
                county: r.county.clone(),
                municipality: r.municipality.clone(),
                date: r.date,
            })
        })
        .collect()
}

/// Mean coordinates of the collisions reported in one municipality, or
/// `None` when none of them carry coordinates.
#[must_use]
pub fn municipality_centroid(
    table: &CollisionTable,
    county: &str,
    municipality: &str,
) -> Option<(f64, f64)> {
    let (lat, lon, n) = table
        .records()
        .iter()
        .filter(|r| r.county == county && r.municipality == municipality)
        .filter_map(CollisionRecord::coordinates)
        .fold((0.0, 0.0, 0_u32), |(lat, lon, n), (y, x)| (lat + y, lon + x, n + 1));
    (n > 0).then(|| (lat / f64::from(n), lon / f64::from(n)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::parse_collisions;

    const SAMPLE: &str = "\
County,Municipality,Species,Time,Lat_WGS84,Long_WGS84
Värmlands län,Sunne,Moose,2021-09-14 19:45:00,59.83,13.14
Värmlands län,Sunne,Moose,2021-10-01 18:10:00,59.84,13.15
Värmlands län,Arvika,Roe deer,2021-10-02 06:10:00,59.65,12.59
Skåne län,Lund,Wild boar,2022-01-05 22:30:00,55.70,13.19
Skåne län,Lund,Moose,2022-09-20 19:00:00,,
";

    fn table() -> CollisionTable {
        parse_collisions(SAMPLE, "sample.csv").unwrap()
    }

    #[test]
    fn all_species_sentinel_means_no_filter() {
        assert_eq!(species_filter(Some(ALL_SPECIES)), None);
        assert_eq!(species_filter(Some("  ")), None);
        assert_eq!(species_filter(None), None);
        assert_eq!(species_filter(Some("Moose")), Some("Moose"));
    }

    #[test]
    fn monthly_counts_are_sorted_by_month() {
        assert_eq!(
            monthly_counts(&table(), None),
            vec![(1, 1), (9, 2), (10, 2)]
        );
        assert_eq!(
            monthly_counts(&table(), Some("Moose")),
            vec![(9, 2), (10, 1)]
        );
    }

    #[test]
    fn hourly_counts_filter_by_species() {
        assert_eq!(
            hourly_counts(&table(), Some("Moose")),
            vec![(18, 1), (19, 2)]
        );
    }

    #[test]
    fn county_counts_are_descending() {
        assert_eq!(
            county_counts(&table(), Some(ALL_SPECIES)),
            vec![
                ("Värmlands län".to_owned(), 3),
                ("Skåne län".to_owned(), 2),
            ]
        );
    }

    #[test]
    fn years_are_distinct_and_sorted() {
        assert_eq!(years(&table()), vec![2021, 2022]);
    }

    #[test]
    fn map_points_skip_rows_without_coordinates() {
        let points = map_points(&table(), 2022, Some("Moose"), MAP_POINT_LIMIT);
        assert!(points.is_empty());

        let points = map_points(&table(), 2021, None, MAP_POINT_LIMIT);
        assert_eq!(points.len(), 3);
        assert_eq!(points[0].municipality, "Sunne");
    }

    #[test]
    fn map_points_are_capped_deterministically() {
        let first = map_points(&table(), 2021, None, 2);
        let second = map_points(&table(), 2021, None, 2);
        assert_eq!(first.len(), 2);
        assert_eq!(first, second);
    }

    #[test]
    fn municipality_centroid_averages_coordinates() {
        let (lat, lon) = municipality_centroid(&table(), "Värmlands län", "Sunne").unwrap();
        assert!((lat - 59.835).abs() < 1e-9);
        assert!((lon - 13.145).abs() < 1e-9);
        let (lat, _) = municipality_centroid(&table(), "Skåne län", "Lund").unwrap();
        assert!((lat - 55.70).abs() < 1e-9);
        assert!(municipality_centroid(&table(), "Skåne län", "Malmö").is_none());
    }
}
