//! Dropdown domains derived from the collision table.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::CollisionTable;

/// Sorted distinct counties, species and per-county municipalities.
///
/// Built once from a [`CollisionTable`] and read-only afterwards. Blank
/// values are excluded from every domain, and a county is only listed
/// when at least one of its rows names a municipality.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UniqueValueIndex {
    counties: Vec<String>,
    species: Vec<String>,
    county_to_municipalities: BTreeMap<String, Vec<String>>,
}

impl UniqueValueIndex {
    /// Scans the table once and builds all three domains.
    #[must_use]
    pub fn build(table: &CollisionTable) -> Self {
        let mut species = BTreeSet::new();
        let mut munis: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();

        for record in table.records() {
            if !record.species.is_empty() {
                species.insert(record.species.as_str());
            }
            if record.county.is_empty() || record.municipality.is_empty() {
                continue;
            }
            munis
                .entry(record.county.as_str())
                .or_default()
                .insert(record.municipality.as_str());
        }

        let index = Self {
            counties: munis.keys().copied().map(str::to_owned).collect(),
            species: species.into_iter().map(str::to_owned).collect(),
            county_to_municipalities: munis
                .into_iter()
                .map(|(county, set)| {
                    (
                        county.to_owned(),
                        set.into_iter().map(str::to_owned).collect(),
                    )
                })
                .collect(),
        };

        log::debug!(
            "Built unique-value index: {} counties, {} species",
            index.counties.len(),
            index.species.len()
        );

        index
    }

    /// Sorted distinct counties.
    #[must_use]
    pub fn counties(&self) -> &[String] {
        &self.counties
    }

    /// Sorted distinct species.
    #[must_use]
    pub fn species(&self) -> &[String] {
        &self.species
    }

    /// Sorted distinct municipalities of `county`.
    ///
    /// Returns an empty slice for a county that is not in the dataset.
    #[must_use]
    pub fn municipalities(&self, county: &str) -> &[String] {
        self.county_to_municipalities
            .get(county)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::parse_collisions;

    const SAMPLE: &str = "\
County,Municipality,Species
Värmlands län,Sunne,Moose
Värmlands län,Arvika,Roe deer
Värmlands län,Sunne,Moose
Skåne län,Lund,Wild boar
Skåne län,,Moose
,Orphan,
Gotlands län,Gotland,
Blekinge län,,Roe deer
Blekinge län, ,Moose
";

    fn index() -> UniqueValueIndex {
        UniqueValueIndex::build(&parse_collisions(SAMPLE, "sample.csv").unwrap())
    }

    #[test]
    fn counties_are_sorted_and_non_blank() {
        assert_eq!(
            index().counties(),
            ["Gotlands län", "Skåne län", "Värmlands län"]
        );
    }

    #[test]
    fn species_are_sorted_distinct_and_non_blank() {
        assert_eq!(index().species(), ["Moose", "Roe deer", "Wild boar"]);
    }

    #[test]
    fn known_counties_have_sorted_unique_municipalities() {
        let index = index();
        for county in index.counties() {
            let munis = index.municipalities(county);
            assert!(!munis.is_empty(), "{county} has no municipalities");
            assert!(munis.windows(2).all(|w| w[0] < w[1]), "{county}: {munis:?}");
        }
        assert_eq!(index.municipalities("Värmlands län"), ["Arvika", "Sunne"]);
        assert_eq!(index.municipalities("Skåne län"), ["Lund"]);
    }

    #[test]
    fn county_without_municipalities_is_not_listed() {
        let index = index();
        assert!(!index.counties().iter().any(|c| c == "Blekinge län"));
        assert!(index.municipalities("Blekinge län").is_empty());
        assert_eq!(index.species(), ["Moose", "Roe deer", "Wild boar"]);
    }

    #[test]
    fn unknown_county_returns_empty_list() {
        assert!(index().municipalities("Atlantis län").is_empty());
    }
}
