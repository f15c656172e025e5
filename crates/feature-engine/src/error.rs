//! Extraction Error Types

use feature_funcs::FuncError;
use thiserror::Error;

/// Errors during feature extraction
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// Sampling frequency is not a positive finite number
    #[error("Sampling frequency must be positive, got {0}")]
    InvalidSamplingRate(f64),

    /// No feature function selected
    #[error("No feature function selected")]
    EmptyFeatureSpec,

    /// Alias not present in the registry
    #[error("Unknown feature function alias '{0}'")]
    UnknownAlias(String),

    /// Alias selected twice, or registered twice
    #[error("Feature function alias '{0}' given more than once")]
    DuplicateAlias(String),

    /// Override that cannot be applied
    #[error("Invalid parameter '{key}': {reason}")]
    InvalidParameter { key: String, reason: String },

    /// Band edges unusable
    #[error("Invalid frequency bands: {0}")]
    InvalidFrequencyBands(String),

    /// Signal tensor unusable
    #[error("Invalid data shape {shape:?}: {reason}")]
    InvalidShape { shape: Vec<usize>, reason: String },

    /// Worker count of zero
    #[error("n_jobs must be non-zero")]
    InvalidJobCount,

    /// Channel name count differs from the data
    #[error("Got {names} channel names for {channels} channels")]
    ChannelNameMismatch { names: usize, channels: usize },

    /// A feature function failed while running
    #[error("Feature '{alias}' failed on epoch {epoch}, channel {channel}: {source}")]
    FeatureFailed {
        alias: String,
        epoch: usize,
        channel: usize,
        #[source]
        source: FuncError,
    },

    /// A feature function emitted a different number of values than declared
    #[error("Feature '{alias}' produced {actual} values, declared {expected}")]
    ArityMismatch {
        alias: String,
        expected: usize,
        actual: usize,
    },

    /// Worker pool could not be created
    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Table (de)serialization failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Output could not be written
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExtractionError {
    /// Input validation failure, raised before any computation
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ExtractionError::InvalidSamplingRate(_)
                | ExtractionError::EmptyFeatureSpec
                | ExtractionError::UnknownAlias(_)
                | ExtractionError::DuplicateAlias(_)
                | ExtractionError::InvalidParameter { .. }
                | ExtractionError::InvalidFrequencyBands(_)
                | ExtractionError::InvalidShape { .. }
                | ExtractionError::InvalidJobCount
                | ExtractionError::ChannelNameMismatch { .. }
        )
    }

    pub(crate) fn invalid_param(key: impl Into<String>, reason: impl Into<String>) -> Self {
        ExtractionError::InvalidParameter {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

impl From<postcard::Error> for ExtractionError {
    fn from(err: postcard::Error) -> Self {
        ExtractionError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for ExtractionError {
    fn from(err: serde_json::Error) -> Self {
        ExtractionError::Serialization(err.to_string())
    }
}

/// Result alias for extraction operations
pub type Result<T> = std::result::Result<T, ExtractionError>;
