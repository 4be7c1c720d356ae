//! Model artifact configuration and loading.
//!
//! A deployed model is two files: a JSON [`ModelArtifact`] and a JSON array
//! of column names forming the [`ModelSchema`]. Either may be gzip
//! compressed (`.gz`). When a file is missing locally and a URL is
//! configured, it is downloaded once and cached at the local path.

use std::path::{Path, PathBuf};
use std::time::Duration;

use wildlife_risk_fetch::DownloadError;

use crate::ModelError;
use crate::classifier::{Classifier, InvalidModelError, ModelArtifact};
use crate::predictor::Predictor;
use crate::risk::RiskPolicy;
use crate::schema::{ModelSchema, SchemaError};

/// Local model path used when nothing else is configured.
pub const DEFAULT_MODEL_PATH: &str = "model/model.json";

/// Local column list path used when nothing else is configured.
pub const DEFAULT_COLUMNS_PATH: &str = "model/model_columns.json";

/// Environment variable overriding the local model path.
pub const MODEL_PATH_VAR: &str = "MODEL_PATH";

/// Environment variable overriding the local column list path.
pub const MODEL_COLUMNS_PATH_VAR: &str = "MODEL_COLUMNS_PATH";

/// Environment variable naming the remote model URL.
pub const MODEL_URL_VAR: &str = "MODEL_URL";

/// Environment variable naming the remote column list URL.
pub const MODEL_COLUMNS_URL_VAR: &str = "MODEL_COLUMNS_URL";

/// Errors reading the model file.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    /// The file is absent and no URL is configured.
    #[error("model not found at {path} and no {MODEL_URL_VAR} configured")]
    Missing {
        /// Expected local path.
        path: String,
    },

    /// The download failed.
    #[error("failed to fetch model from {url}: {source}")]
    Fetch {
        /// Remote URL.
        url: String,
        /// Underlying download error.
        source: DownloadError,
    },

    /// The file could not be read or decompressed.
    #[error("failed to read model at {path}: {source}")]
    Io {
        /// Local path.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The file is not a valid model definition.
    #[error("failed to parse model at {path}: {source}")]
    Json {
        /// Local path.
        path: String,
        /// Underlying JSON error.
        source: serde_json::Error,
    },

    /// The definition parsed but its parameters are inconsistent.
    #[error(transparent)]
    Invalid(#[from] InvalidModelError),
}

/// Where to find the model and its column list.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Local model file.
    pub model_path: PathBuf,
    /// Local column list file.
    pub columns_path: PathBuf,
    /// Remote model fetched when the local file is absent.
    pub model_url: Option<String>,
    /// Remote column list fetched when the local file is absent.
    pub columns_url: Option<String>,
    /// Timeout for each remote fetch.
    pub timeout: Duration,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            columns_path: PathBuf::from(DEFAULT_COLUMNS_PATH),
            model_url: None,
            columns_url: None,
            timeout: wildlife_risk_fetch::DEFAULT_TIMEOUT,
        }
    }
}

impl ModelConfig {
    /// Creates a config for local files with default settings.
    #[must_use]
    pub fn local(model_path: impl AsRef<Path>, columns_path: impl AsRef<Path>) -> Self {
        Self {
            model_path: model_path.as_ref().to_path_buf(),
            columns_path: columns_path.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    /// Reads the config from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Reads the config through an arbitrary variable lookup. Blank values
    /// are treated as unset.
    #[must_use]
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());

        let mut config = Self::default();
        if let Some(path) = get(MODEL_PATH_VAR) {
            config.model_path = PathBuf::from(path);
        }
        if let Some(path) = get(MODEL_COLUMNS_PATH_VAR) {
            config.columns_path = PathBuf::from(path);
        }
        config.model_url = get(MODEL_URL_VAR);
        config.columns_url = get(MODEL_COLUMNS_URL_VAR);
        config
    }
}

enum FetchFailure {
    Missing,
    Fetch(String, DownloadError),
    Io(std::io::Error),
}

async fn read_cached(
    path: &Path,
    url: Option<&str>,
    timeout: Duration,
) -> Result<Vec<u8>, FetchFailure> {
    match url {
        Some(url) => {
            wildlife_risk_fetch::ensure_cached(url, path, timeout)
                .await
                .map_err(|e| FetchFailure::Fetch(url.to_owned(), e))?;
        }
        None => {
            if !tokio::fs::try_exists(path).await.unwrap_or(false) {
                return Err(FetchFailure::Missing);
            }
        }
    }

    let raw = tokio::fs::read(path).await.map_err(FetchFailure::Io)?;
    wildlife_risk_fetch::decompress_if_gz(path, raw).map_err(FetchFailure::Io)
}

/// Loads and validates the model described by `config`.
///
/// # Errors
///
/// Returns [`ArtifactError`] if the model cannot be obtained, parsed or
/// validated.
pub async fn load_classifier(config: &ModelConfig) -> Result<Box<dyn Classifier>, ArtifactError> {
    let path = config.model_path.display().to_string();
    let bytes = read_cached(&config.model_path, config.model_url.as_deref(), config.timeout)
        .await
        .map_err(|failure| match failure {
            FetchFailure::Missing => ArtifactError::Missing { path: path.clone() },
            FetchFailure::Fetch(url, source) => ArtifactError::Fetch { url, source },
            FetchFailure::Io(source) => ArtifactError::Io {
                path: path.clone(),
                source,
            },
        })?;

    let artifact: ModelArtifact =
        serde_json::from_slice(&bytes).map_err(|source| ArtifactError::Json {
            path: path.clone(),
            source,
        })?;
    let classifier = artifact.into_classifier()?;
    log::info!("Loaded {} model from {path}", classifier.kind());
    Ok(classifier)
}

/// Loads and validates the column list described by `config`.
///
/// # Errors
///
/// Returns [`SchemaError::Unavailable`] if the list cannot be obtained or
/// parsed, and the other [`SchemaError`] variants if it is malformed.
pub async fn load_schema(config: &ModelConfig) -> Result<ModelSchema, SchemaError> {
    let location = config
        .columns_url
        .clone()
        .unwrap_or_else(|| config.columns_path.display().to_string());
    let unavailable = |reason: String| SchemaError::Unavailable {
        location: location.clone(),
        reason,
    };

    let bytes = read_cached(
        &config.columns_path,
        config.columns_url.as_deref(),
        config.timeout,
    )
    .await
    .map_err(|failure| {
        unavailable(match failure {
            FetchFailure::Missing => format!("file not found and no {MODEL_COLUMNS_URL_VAR} configured"),
            FetchFailure::Fetch(_, e) => e.to_string(),
            FetchFailure::Io(e) => e.to_string(),
        })
    })?;

    let columns: Vec<String> =
        serde_json::from_slice(&bytes).map_err(|e| unavailable(e.to_string()))?;
    let schema = ModelSchema::new(columns)?;
    log::info!("Loaded model schema with {} columns from {location}", schema.len());
    Ok(schema)
}

/// Loads the model and its schema and assembles a [`Predictor`].
///
/// # Errors
///
/// Returns [`ModelError`] if either artifact is unusable or they disagree
/// on the number of features.
pub async fn load_predictor(
    config: &ModelConfig,
    policy: RiskPolicy,
) -> Result<Predictor, ModelError> {
    let schema = load_schema(config).await?;
    let classifier = load_classifier(config).await?;
    Ok(Predictor::new(schema, classifier, policy)?)
}
