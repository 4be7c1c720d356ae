#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Collision risk model.
//!
//! Turns a user's selections into a [`FeatureRow`], aligns it to the
//! column set a trained model expects, scores it, and maps the score to a
//! [`RiskLevel`](wildlife_risk_collision_models::RiskLevel).

pub mod artifact;
pub mod classifier;
pub mod feature_row;
pub mod predictor;
pub mod risk;
pub mod schema;

pub use artifact::{ArtifactError, ModelConfig, load_predictor};
pub use classifier::{Classifier, ModelArtifact};
pub use feature_row::{BuildError, FeatureQuery, FeatureRow, build_feature_row};
pub use predictor::{Assessment, ClassProbability, Predictor, Score, ScoreError};
pub use risk::RiskPolicy;
pub use schema::{ModelSchema, SchemaError};

/// Errors assembling a [`Predictor`].
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// The model file is unusable.
    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    /// The column list is unusable or disagrees with the model.
    #[error(transparent)]
    Schema(#[from] SchemaError),
}
