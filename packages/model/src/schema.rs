//! Model schema and one-hot alignment.
//!
//! A trained model expects a fixed, ordered set of input columns: numeric
//! fields under their own names and one `<column>_<value>` indicator per
//! category value seen during training. [`ModelSchema::align`] re-expresses
//! a [`FeatureRow`] in exactly that column set.

use std::collections::BTreeMap;

use crate::feature_row::{FeatureRow, FeatureValue};

/// Errors that make a model schema unusable.
///
/// These are configuration errors: they are raised when the predictor is
/// assembled, never per request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    /// The column list could not be obtained.
    #[error("model schema unavailable at {location}: {reason}")]
    Unavailable {
        /// Where the column list was expected.
        location: String,
        /// Why it could not be read.
        reason: String,
    },

    /// The column list is empty.
    #[error("model schema has no columns")]
    Empty,

    /// A column name appears more than once.
    #[error("model schema lists column '{0}' more than once")]
    DuplicateColumn(String),

    /// The model's input width differs from the schema.
    #[error("model expects {model} features but the schema has {schema} columns")]
    WidthMismatch {
        /// Number of schema columns.
        schema: usize,
        /// Number of model inputs.
        model: usize,
    },
}

/// Expands a feature row into `(column, value)` pairs, one-hot encoding
/// categorical fields.
///
/// Numeric fields come first in raw column order, followed by one indicator
/// per categorical field.
#[must_use]
pub fn one_hot(row: &FeatureRow) -> Vec<(String, f64)> {
    let raw = row.raw_columns();
    let numeric = raw.iter().filter_map(|(name, value)| match value {
        FeatureValue::Numeric(v) => Some(((*name).to_owned(), *v)),
        FeatureValue::Categorical(_) => None,
    });
    let indicators = raw.iter().filter_map(|(name, value)| match value {
        FeatureValue::Categorical(v) => Some((format!("{name}_{v}"), 1.0)),
        FeatureValue::Numeric(_) => None,
    });
    numeric.chain(indicators).collect()
}

/// The ordered input columns of a trained model.
#[derive(Debug, Clone)]
pub struct ModelSchema {
    columns: Vec<String>,
    positions: BTreeMap<String, usize>,
}

impl ModelSchema {
    /// Validates and wraps a column list.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Empty`] for an empty list and
    /// [`SchemaError::DuplicateColumn`] if any name repeats.
    pub fn new(columns: Vec<String>) -> Result<Self, SchemaError> {
        if columns.is_empty() {
            return Err(SchemaError::Empty);
        }
        let mut positions = BTreeMap::new();
        for (i, name) in columns.iter().enumerate() {
            if positions.insert(name.clone(), i).is_some() {
                return Err(SchemaError::DuplicateColumn(name.clone()));
            }
        }
        Ok(Self { columns, positions })
    }

    /// Column names in model order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Always `false`; an empty schema cannot be constructed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Aligns a feature row to this schema.
    ///
    /// Schema columns absent from the expansion are zero, expansion columns
    /// absent from the schema are dropped, and values are ordered exactly
    /// like [`Self::columns`].
    #[must_use]
    pub fn align(&self, row: &FeatureRow) -> AlignedRow<'_> {
        let mut values = vec![0.0; self.columns.len()];
        let mut dropped = Vec::new();

        for (name, value) in one_hot(row) {
            match self.positions.get(&name) {
                Some(&i) => values[i] = value,
                None => dropped.push(name),
            }
        }

        if !dropped.is_empty() {
            log::debug!("Columns not in model schema, dropped: {dropped:?}");
        }

        AlignedRow {
            schema: self,
            values,
            dropped,
        }
    }
}

/// A feature row expressed in a model's exact column set.
#[derive(Debug, Clone)]
pub struct AlignedRow<'a> {
    schema: &'a ModelSchema,
    values: Vec<f64>,
    dropped: Vec<String>,
}

impl AlignedRow<'_> {
    /// Column names; always equal to the schema's columns.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        self.schema.columns()
    }

    /// Values in column order.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Expanded columns that were not part of the schema.
    #[must_use]
    pub fn dropped(&self) -> &[String] {
        &self.dropped
    }

    /// Non-zero encoded features, largest magnitude first (ties by name).
    #[must_use]
    pub fn nonzero(&self) -> Vec<(String, f64)> {
        let mut features: Vec<(String, f64)> = self
            .columns()
            .iter()
            .zip(&self.values)
            .filter(|(_, v)| **v != 0.0)
            .map(|(name, v)| (name.clone(), *v))
            .collect();
        features.sort_by(|a, b| b.1.abs().total_cmp(&a.1.abs()).then_with(|| a.0.cmp(&b.0)));
        features
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature_row::{FeatureQuery, build_feature_row};

    fn schema() -> ModelSchema {
        ModelSchema::new(
            [
                "Species_Roe deer",
                "Hour",
                "Month",
                "Species_Moose",
                "County_Värmlands län",
                "County_Skåne län",
                "Weekday_Monday",
                "Year",
            ]
            .iter()
            .map(|s| (*s).to_owned())
            .collect(),
        )
        .unwrap()
    }

    fn row(county: &str, species: &str) -> FeatureRow {
        build_feature_row(
            &FeatureQuery::new(2025, 9, 19, county, species).with_municipality("Sunne"),
        )
        .unwrap()
    }

    #[test]
    fn one_hot_expands_categoricals() {
        let encoded = one_hot(&row("Värmlands län", "Moose"));
        assert!(encoded.contains(&("Species_Moose".to_owned(), 1.0)));
        assert!(encoded.contains(&("County_Värmlands län".to_owned(), 1.0)));
        assert!(encoded.contains(&("Municipality_Sunne".to_owned(), 1.0)));
        assert!(encoded.contains(&("Hour".to_owned(), 19.0)));
        assert!(!encoded.iter().any(|(name, _)| name == "Species"));
    }

    #[test]
    fn aligned_columns_equal_schema_for_any_category() {
        let schema = schema();
        for (county, species) in [
            ("Värmlands län", "Moose"),
            ("Skåne län", "Roe deer"),
            ("Atlantis län", "Dragon"),
        ] {
            let aligned = schema.align(&row(county, species));
            assert_eq!(aligned.columns(), schema.columns());
            assert_eq!(aligned.values().len(), schema.len());
        }
    }

    #[test]
    fn fills_missing_and_drops_unknown_columns() {
        // 2025-09-01 is a Monday, so the defaulted weekday hits the schema.
        let schema = schema();
        let aligned = schema.align(&row("Värmlands län", "Moose"));
        assert_eq!(
            aligned.values(),
            [0.0, 19.0, 9.0, 1.0, 1.0, 0.0, 1.0, 2025.0]
        );
        assert!(aligned.dropped().contains(&"Municipality_Sunne".to_owned()));
        assert!(aligned.dropped().contains(&"Lat_WGS84".to_owned()));
    }

    #[test]
    fn unseen_category_is_all_zero_indicators() {
        let schema = schema();
        let aligned = schema.align(&row("Atlantis län", "Dragon"));
        assert_eq!(aligned.values()[0], 0.0);
        assert_eq!(aligned.values()[3], 0.0);
        assert_eq!(aligned.values()[4], 0.0);
        assert!(aligned.dropped().contains(&"Species_Dragon".to_owned()));
    }

    #[test]
    fn nonzero_features_are_ranked_by_magnitude() {
        let schema = schema();
        let aligned = schema.align(&row("Värmlands län", "Moose"));
        let names: Vec<String> = aligned.nonzero().into_iter().map(|(n, _)| n).collect();
        assert_eq!(
            names,
            [
                "Year",
                "Hour",
                "Month",
                "County_Värmlands län",
                "Species_Moose",
                "Weekday_Monday",
            ]
        );
    }

    #[test]
    fn rejects_empty_and_duplicate_schemas() {
        assert_eq!(ModelSchema::new(Vec::new()).unwrap_err(), SchemaError::Empty);
        assert_eq!(
            ModelSchema::new(vec!["Hour".to_owned(), "Hour".to_owned()]).unwrap_err(),
            SchemaError::DuplicateColumn("Hour".to_owned())
        );
    }
}
