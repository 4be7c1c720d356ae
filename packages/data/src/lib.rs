#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Collision dataset loading, unique-value index and exploratory aggregates.
//!
//! [`loader::load_collisions`] turns the cleaned CSV (local or remote) into a
//! [`CollisionTable`]. [`index::UniqueValueIndex`] is built once from that
//! table to serve dropdown domains, and [`eda`] computes the counts behind
//! the dashboard charts and map.

pub mod config;
pub mod eda;
pub mod index;
pub mod loader;
pub mod parsing;

use wildlife_risk_collision_models::CollisionRecord;

pub use config::{DataConfig, Encoding};
pub use index::UniqueValueIndex;
pub use loader::{ensure_local, load_collisions};

/// Failure to load the collision dataset.
///
/// Every variant carries the source location that was attempted.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The local file is missing and no remote URL is configured.
    #[error("{location} does not exist and CLEAN_DATA_URL is not set")]
    Missing {
        /// Attempted location.
        location: String,
    },

    /// Fetching the remote source failed.
    #[error("Failed to fetch {location}: {source}")]
    Fetch {
        /// Attempted location.
        location: String,
        /// Underlying download error.
        source: wildlife_risk_fetch::DownloadError,
    },

    /// Reading the local file failed.
    #[error("I/O error reading {location}: {source}")]
    Io {
        /// Attempted location.
        location: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The bytes are not valid in the requested encoding.
    #[error("{location} is not valid {encoding}")]
    Encoding {
        /// Attempted location.
        location: String,
        /// Requested encoding.
        encoding: Encoding,
    },

    /// The CSV could not be parsed.
    #[error("Failed to parse CSV at {location}: {source}")]
    Parse {
        /// Attempted location.
        location: String,
        /// Underlying CSV error.
        source: csv::Error,
    },

    /// A required column is absent from the header row.
    #[error("{location} is missing required column '{column}'")]
    MissingColumn {
        /// Attempted location.
        location: String,
        /// Name of the missing column.
        column: String,
    },

    /// The CSV parsed but holds no rows.
    #[error("{location} loaded but is empty")]
    Empty {
        /// Attempted location.
        location: String,
    },
}

impl LoadError {
    /// Returns the source location this error refers to.
    #[must_use]
    pub fn location(&self) -> &str {
        match self {
            Self::Missing { location }
            | Self::Fetch { location, .. }
            | Self::Io { location, .. }
            | Self::Encoding { location, .. }
            | Self::Parse { location, .. }
            | Self::MissingColumn { location, .. }
            | Self::Empty { location } => location,
        }
    }
}

/// The loaded collision dataset.
///
/// `columns` lists the trimmed header names in file order followed by any
/// calendar columns derived during loading. The table is never empty.
#[derive(Debug, Clone)]
pub struct CollisionTable {
    columns: Vec<String>,
    records: Vec<CollisionRecord>,
}

impl CollisionTable {
    /// Creates a table from already-normalized parts.
    #[must_use]
    pub const fn new(columns: Vec<String>, records: Vec<CollisionRecord>) -> Self {
        Self { columns, records }
    }

    /// Column names, in order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Whether a column with this exact name exists.
    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// All records, in file order.
    #[must_use]
    pub fn records(&self) -> &[CollisionRecord] {
        &self.records
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
