//! Scoring a feature row against a trained model.

use serde::Serialize;
use wildlife_risk_collision_models::RiskLevel;

use crate::classifier::Classifier;
use crate::feature_row::FeatureRow;
use crate::risk::RiskPolicy;
use crate::schema::{ModelSchema, SchemaError};

/// Per-request scoring failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScoreError {
    /// An aligned feature is NaN or infinite.
    #[error("feature '{0}' is not a finite number")]
    NonFinite(String),
}

/// Probability of one class.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassProbability {
    /// Class label.
    pub class: String,
    /// Probability in `[0, 1]`.
    pub probability: f64,
}

/// What the model returned for one row.
#[derive(Debug, Clone, PartialEq)]
pub enum Score {
    /// A probabilistic model.
    ///
    /// For two classes `probability` is that of the second (positive)
    /// class; otherwise it is the probability of `predicted_class`.
    Probability {
        /// Score used for the risk level.
        probability: f64,
        /// Most likely class.
        predicted_class: String,
        /// Every class with its probability, in model order.
        distribution: Vec<ClassProbability>,
    },
    /// A model that only produces hard labels.
    Label(String),
}

impl Score {
    /// The raw probability, if the model produced one.
    #[must_use]
    pub const fn probability(&self) -> Option<f64> {
        match self {
            Self::Probability { probability, .. } => Some(*probability),
            Self::Label(_) => None,
        }
    }

    /// The predicted class label.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Probability {
                predicted_class, ..
            } => predicted_class.as_str(),
            Self::Label(label) => label.as_str(),
        }
    }
}

/// A scored row with its risk level and explanation.
#[derive(Debug, Clone, PartialEq)]
pub struct Assessment {
    /// Raw model output.
    pub score: Score,
    /// Score after the risk policy's transform.
    pub adjusted_score: Option<f64>,
    /// Risk level; `None` for hard-label models.
    pub risk_level: Option<RiskLevel>,
    /// Non-zero encoded features, largest magnitude first.
    pub features: Vec<(String, f64)>,
}

/// A model schema, a classifier and a risk policy that fit together.
#[derive(Debug)]
pub struct Predictor {
    schema: ModelSchema,
    classifier: Box<dyn Classifier>,
    policy: RiskPolicy,
}

impl Predictor {
    /// Combines the parts, checking that the model's input width matches
    /// the schema.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::WidthMismatch`] if they disagree.
    pub fn new(
        schema: ModelSchema,
        classifier: Box<dyn Classifier>,
        policy: RiskPolicy,
    ) -> Result<Self, SchemaError> {
        if classifier.n_features() != schema.len() {
            return Err(SchemaError::WidthMismatch {
                schema: schema.len(),
                model: classifier.n_features(),
            });
        }
        log::info!(
            "Predictor ready: {} model, {} features, classes {:?}",
            classifier.kind(),
            schema.len(),
            classifier.classes()
        );
        Ok(Self {
            schema,
            classifier,
            policy,
        })
    }

    /// The model schema.
    #[must_use]
    pub const fn schema(&self) -> &ModelSchema {
        &self.schema
    }

    /// The risk policy.
    #[must_use]
    pub const fn policy(&self) -> &RiskPolicy {
        &self.policy
    }

    /// Model family name.
    #[must_use]
    pub fn model_kind(&self) -> &'static str {
        self.classifier.kind()
    }

    /// Class labels in model order.
    #[must_use]
    pub fn classes(&self) -> &[String] {
        self.classifier.classes()
    }

    /// Aligns and scores one row.
    ///
    /// # Errors
    ///
    /// Returns [`ScoreError::NonFinite`] if an aligned value is NaN or
    /// infinite.
    pub fn score(&self, row: &FeatureRow) -> Result<Score, ScoreError> {
        self.score_aligned(self.schema.align(row).values())
    }

    fn score_aligned(&self, values: &[f64]) -> Result<Score, ScoreError> {
        if let Some(i) = values.iter().position(|v| !v.is_finite()) {
            return Err(ScoreError::NonFinite(self.schema.columns()[i].clone()));
        }

        let Some(proba) = self.classifier.predict_proba(values) else {
            return Ok(Score::Label(self.classifier.predict(values)));
        };

        let classes = self.classifier.classes();
        let best = proba
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map_or(0, |(i, _)| i);
        let probability = if proba.len() == 2 { proba[1] } else { proba[best] };

        Ok(Score::Probability {
            probability,
            predicted_class: classes[best].clone(),
            distribution: classes
                .iter()
                .zip(&proba)
                .map(|(class, p)| ClassProbability {
                    class: class.clone(),
                    probability: *p,
                })
                .collect(),
        })
    }

    /// Scores one row and applies the risk policy.
    ///
    /// # Errors
    ///
    /// Returns [`ScoreError`] if the row cannot be scored.
    pub fn assess(&self, row: &FeatureRow) -> Result<Assessment, ScoreError> {
        let aligned = self.schema.align(row);
        let score = self.score_aligned(aligned.values())?;
        let (adjusted_score, risk_level) = score
            .probability()
            .map(|raw| self.policy.assess(raw))
            .unzip();

        Ok(Assessment {
            score,
            adjusted_score,
            risk_level,
            features: aligned.nonzero(),
        })
    }

    /// The `n` features with the largest absolute coefficients, or `None`
    /// for models without linear coefficients.
    #[must_use]
    pub fn top_features(&self, n: usize) -> Option<Vec<(String, f64)>> {
        let coefficients = self.classifier.coefficients()?;
        let mut ranked: Vec<(String, f64)> = self
            .schema
            .columns()
            .iter()
            .cloned()
            .zip(coefficients.iter().copied())
            .collect();
        ranked.sort_by(|a, b| b.1.abs().total_cmp(&a.1.abs()).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(n);
        Some(ranked)
    }
}
