//! The dashboard service shared by every request.
//!
//! A [`Dashboard`] owns the collision table, its unique-value index and the
//! predictor. It is built once at startup and read-only afterwards.

use wildlife_risk_collision_models::{ALL_SPECIES, RiskLevel, UNKNOWN_MUNICIPALITY};
use wildlife_risk_data::eda::{self, MAP_POINT_LIMIT};
use wildlife_risk_data::{CollisionTable, DataConfig, LoadError, UniqueValueIndex, load_collisions};
use wildlife_risk_model::{
    BuildError, FeatureQuery, FeatureRow, ModelConfig, ModelError, Predictor, RiskPolicy, Score,
    ScoreError, build_feature_row, load_predictor,
};
use wildlife_risk_server_models::{
    ApiClassProbability, ApiCountyCount, ApiFeatureWeight, ApiHourCount, ApiMap, ApiMapPoint,
    ApiMarker, ApiModelInsights, ApiMonthCount, ApiOptions, ApiPrediction, PredictRequest,
};

/// Number of features listed by [`Dashboard::insights`].
pub const INSIGHT_FEATURES: usize = 10;

/// Why a prediction could not be made.
#[derive(Debug, thiserror::Error)]
pub enum PredictError {
    /// The model failed to load at startup.
    #[error("prediction model unavailable: {0}")]
    ModelUnavailable(String),

    /// The request is out of range.
    #[error(transparent)]
    Build(#[from] BuildError),

    /// The encoded row could not be scored.
    #[error(transparent)]
    Score(#[from] ScoreError),
}

/// Loaded data, index and model.
#[derive(Debug)]
pub struct Dashboard {
    table: CollisionTable,
    index: UniqueValueIndex,
    predictor: Result<Predictor, ModelError>,
}

impl Dashboard {
    /// Builds the index over `table`.
    ///
    /// A failed `predictor` only disables prediction and model insights;
    /// the data endpoints keep working.
    #[must_use]
    pub fn new(table: CollisionTable, predictor: Result<Predictor, ModelError>) -> Self {
        if let Err(e) = &predictor {
            log::warn!("Prediction disabled: {e}");
        }
        let index = UniqueValueIndex::build(&table);
        Self {
            table,
            index,
            predictor,
        }
    }

    /// Loads the dataset and the model concurrently.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] if the dataset cannot be loaded. Model failures
    /// are kept in the dashboard instead.
    pub async fn load(
        data: &DataConfig,
        model: &ModelConfig,
        policy: RiskPolicy,
    ) -> Result<Self, LoadError> {
        let (table, predictor) =
            tokio::join!(load_collisions(data), load_predictor(model, policy));
        Ok(Self::new(table?, predictor))
    }

    /// The collision table.
    #[must_use]
    pub const fn table(&self) -> &CollisionTable {
        &self.table
    }

    /// The unique-value index.
    #[must_use]
    pub const fn index(&self) -> &UniqueValueIndex {
        &self.index
    }

    /// The predictor, or the error that prevented loading it.
    ///
    /// # Errors
    ///
    /// Returns the load error if no model is available.
    pub fn predictor(&self) -> Result<&Predictor, &ModelError> {
        self.predictor.as_ref()
    }

    fn require_predictor(&self) -> Result<&Predictor, PredictError> {
        self.predictor
            .as_ref()
            .map_err(|e| PredictError::ModelUnavailable(e.to_string()))
    }

    /// Counties and species for the dropdowns, `"All species"` first.
    #[must_use]
    pub fn options(&self) -> ApiOptions {
        let species = std::iter::once(ALL_SPECIES)
            .chain(
                self.index
                    .species()
                    .iter()
                    .map(String::as_str)
                    .filter(|s| *s != ALL_SPECIES),
            )
            .map(str::to_owned)
            .collect();

        ApiOptions {
            counties: self.index.counties().to_vec(),
            species,
        }
    }

    /// Municipalities of `county`; empty for an unknown county.
    #[must_use]
    pub fn municipalities(&self, county: &str) -> Vec<String> {
        self.index.municipalities(county.trim()).to_vec()
    }

    /// Scores one request.
    ///
    /// `default_year` is used when the request names no year.
    ///
    /// # Errors
    ///
    /// Returns [`PredictError`] if no model is loaded, the request is out of
    /// range, or the row cannot be scored.
    pub fn predict(
        &self,
        request: &PredictRequest,
        default_year: i32,
    ) -> Result<ApiPrediction, PredictError> {
        let predictor = self.require_predictor()?;

        let query = FeatureQuery {
            year: request.year.unwrap_or(default_year),
            month: request.month,
            hour: request.hour,
            county: request.county.clone(),
            species: request.species.clone(),
            municipality: request.municipality.clone(),
            latitude: request.latitude,
            longitude: request.longitude,
            day_of_year: request.day_of_year,
            weekday: request.weekday.clone(),
        };
        let row = build_feature_row(&query)?;
        let assessment = predictor.assess(&row)?;

        log::debug!(
            "{} / {} / {} at {:02}:00 in month {}: {:?}",
            row.county,
            row.municipality,
            row.species,
            row.hour,
            row.month,
            assessment.risk_level
        );

        let (predicted_class, probabilities) = match &assessment.score {
            Score::Probability {
                predicted_class,
                distribution,
                ..
            } => (
                predicted_class.clone(),
                distribution
                    .iter()
                    .map(|c| ApiClassProbability {
                        class: c.class.clone(),
                        probability: c.probability,
                    })
                    .collect(),
            ),
            Score::Label(label) => (label.clone(), Vec::new()),
        };

        Ok(ApiPrediction {
            risk_level: assessment.risk_level,
            risk_value: assessment.risk_level.map(RiskLevel::value),
            advice: assessment.risk_level.map(|l| l.advice().to_owned()),
            raw_score: assessment.score.probability(),
            adjusted_score: assessment.adjusted_score,
            predicted_class,
            probabilities,
            marker: self.marker(&row, request),
            features: assessment
                .features
                .into_iter()
                .map(|(feature, value)| ApiFeatureWeight { feature, value })
                .collect(),
        })
    }

    /// Explicit coordinates, else the municipality's mean collision
    /// position, else the row's fallback coordinates.
    fn marker(&self, row: &FeatureRow, request: &PredictRequest) -> ApiMarker {
        let (latitude, longitude) = match (request.latitude, request.longitude) {
            (Some(lat), Some(lon)) => (lat, lon),
            _ => eda::municipality_centroid(&self.table, &row.county, &row.municipality)
                .unwrap_or((row.latitude, row.longitude)),
        };
        let label = if row.municipality == UNKNOWN_MUNICIPALITY {
            row.county.clone()
        } else {
            format!("{}, {}", row.municipality, row.county)
        };
        ApiMarker {
            latitude,
            longitude,
            label,
        }
    }

    /// Collisions per month.
    #[must_use]
    pub fn monthly_counts(&self, species: Option<&str>) -> Vec<ApiMonthCount> {
        eda::monthly_counts(&self.table, species)
            .into_iter()
            .map(|(month, count)| ApiMonthCount { month, count })
            .collect()
    }

    /// Collisions per hour of day.
    #[must_use]
    pub fn hourly_counts(&self, species: Option<&str>) -> Vec<ApiHourCount> {
        eda::hourly_counts(&self.table, species)
            .into_iter()
            .map(|(hour, count)| ApiHourCount { hour, count })
            .collect()
    }

    /// Collisions per county, most first.
    #[must_use]
    pub fn county_counts(&self, species: Option<&str>) -> Vec<ApiCountyCount> {
        eda::county_counts(&self.table, species)
            .into_iter()
            .map(|(county, count)| ApiCountyCount { county, count })
            .collect()
    }

    /// Distinct years in the dataset.
    #[must_use]
    pub fn years(&self) -> Vec<i32> {
        eda::years(&self.table)
    }

    /// Map points for `year` (default: the latest year in the dataset).
    #[must_use]
    pub fn map(&self, year: Option<i32>, species: Option<&str>) -> ApiMap {
        let year = year.or_else(|| self.years().last().copied());
        let points = year
            .map(|y| {
                eda::map_points(&self.table, y, species, MAP_POINT_LIMIT)
                    .into_iter()
                    .map(|p| ApiMapPoint {
                        latitude: p.latitude,
                        longitude: p.longitude,
                        species: p.species,
                        county: p.county,
                        municipality: p.municipality,
                        date: p.date,
                    })
                    .collect()
            })
            .unwrap_or_default();
        ApiMap { year, points }
    }

    /// Description of the loaded model.
    ///
    /// # Errors
    ///
    /// Returns [`PredictError::ModelUnavailable`] if no model is loaded.
    pub fn insights(&self) -> Result<ApiModelInsights, PredictError> {
        let predictor = self.require_predictor()?;
        Ok(ApiModelInsights {
            model_kind: predictor.model_kind().to_owned(),
            feature_count: predictor.schema().len(),
            classes: predictor.classes().to_vec(),
            top_features: predictor.top_features(INSIGHT_FEATURES).map(|features| {
                features
                    .into_iter()
                    .map(|(feature, value)| ApiFeatureWeight { feature, value })
                    .collect()
            }),
        })
    }
}
