//! Feature Extraction Engine
//!
//! Computes univariate features on every channel of epoched biosignals and
//! lays them out as an `(n_epochs, n_channels × width)` matrix.
//!
//! ```no_run
//! use feature_engine::{extract_features, FuncParams};
//! use ndarray::Array3;
//!
//! let data = Array3::<f64>::zeros((10, 20, 256));
//! let params = FuncParams::new().with("spect_edge_freq", "edge", vec![0.5, 0.95]);
//! let features = extract_features(
//!     data.view(),
//!     256.0,
//!     &[0.1, 4.0, 8.0, 12.0, 30.0, 70.0],
//!     &["mean", "pow_freq_bands", "spect_edge_freq"],
//!     Some(&params),
//!     -1,
//! )?;
//! assert_eq!(features.dim(), (10, 20 * 8));
//! # Ok::<(), feature_engine::ExtractionError>(())
//! ```

mod builtins;
mod config;
mod error;
mod executor;
mod extractor;
mod params;
mod registry;
mod resolver;
mod table;
mod validate;

pub use self::config::{ExtractionConfig, ENV_PREFIX};
pub use error::{ExtractionError, Result};
pub use executor::{ChannelExecutor, Location};
pub use extractor::{extract_features, extract_features_table, resolve_n_jobs, FeatureExtractor};
pub use params::{split_flat_key, FuncParams, ParamValue, Params, PARAM_SEPARATOR};
pub use registry::{Arity, FeatureContext, FeatureDef, FeatureFn, FeatureRegistry, FeatureValue, ParamCheck, RegistryBuilder};
pub use resolver::{ParameterResolver, ResolvedFeature, ResolvedPlan};
pub use table::{channel_labels, FeatureTable};

pub use feature_funcs::{FuncError, PsdMethod};

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Install a global `tracing` subscriber at `level` (`"info"` if unparsable).
///
/// Returns `false` if a subscriber was already installed.
pub fn init_logging(level: &str) -> bool {
    let level = level.parse::<Level>().unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber).is_ok()
}

/// Like [`init_logging`], emitting one JSON object per event
pub fn init_json_logging(level: &str) -> bool {
    let level = level.parse::<Level>().unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber).is_ok()
}
