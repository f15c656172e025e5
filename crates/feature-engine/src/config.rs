//! Extraction configuration
//!
//! Loaded from TOML and layered with `FEATURES_*` environment variables,
//! e.g. `FEATURES_N_JOBS=-1`.

use crate::error::Result;
use crate::extractor::FeatureExtractor;
use crate::params::FuncParams;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Prefix of environment overrides
pub const ENV_PREFIX: &str = "FEATURES";

/// Everything needed to run an extraction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Sampling frequency (Hz)
    pub sfreq: f64,
    /// Band edges (Hz)
    pub freq_bands: Vec<f64>,
    /// Feature function aliases, in output order
    pub selected_funcs: Vec<String>,
    /// alias -> parameter -> value
    pub funcs_params: FuncParams,
    pub n_jobs: i32,
    pub ch_names: Option<Vec<String>>,
    pub log_level: String,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            sfreq: 256.0,
            freq_bands: vec![0.5, 4.0, 8.0, 13.0, 30.0, 100.0],
            selected_funcs: Vec::new(),
            funcs_params: FuncParams::new(),
            n_jobs: 1,
            ch_names: None,
            log_level: "info".to_string(),
        }
    }
}

impl ExtractionConfig {
    /// Load from a TOML file, then apply environment overrides
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(Self::environment())
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Parse TOML text, then apply environment overrides
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .add_source(Self::environment())
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    fn environment() -> config::Environment {
        config::Environment::with_prefix(ENV_PREFIX).try_parsing(true)
    }

    /// Build the extractor described by this configuration
    pub fn into_extractor(self) -> FeatureExtractor {
        let extractor = FeatureExtractor::new(self.sfreq, self.freq_bands)
            .with_funcs(self.selected_funcs)
            .with_params(self.funcs_params)
            .with_n_jobs(self.n_jobs);

        match self.ch_names {
            Some(names) => extractor.with_channel_names(names),
            None => extractor,
        }
    }
}
