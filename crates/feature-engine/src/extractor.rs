//! Feature Extraction
//!
//! Applies a resolved plan to every (epoch, channel) lane of a
//! `(n_epochs, n_channels, n_times)` tensor and assembles the
//! `(n_epochs, n_channels × width)` feature matrix. Epochs are dispatched to
//! a rayon pool; channels within an epoch run sequentially.

use crate::error::{ExtractionError, Result};
use crate::executor::{ChannelExecutor, Location};
use crate::params::{FuncParams, ParamValue};
use crate::registry::{FeatureContext, FeatureRegistry};
use crate::resolver::{ParameterResolver, ResolvedPlan};
use crate::table::{channel_labels, FeatureTable};
use crate::validate::{validate_channel_names, validate_data};
use ndarray::{s, Array2, ArrayView1, ArrayView3};
use rayon::prelude::*;
use std::borrow::Cow;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Number of workers for an `n_jobs` request
///
/// `1` is sequential, `-1` uses every core and `n < -1` leaves `-n - 1`
/// cores unused. Zero is rejected.
pub fn resolve_n_jobs(n_jobs: i32) -> Result<usize> {
    let cores = std::thread::available_parallelism().map_or(1, |n| n.get());
    match n_jobs {
        0 => Err(ExtractionError::InvalidJobCount),
        n if n > 0 => Ok(n as usize),
        n => Ok((cores as i64 + 1 + n as i64).max(1) as usize),
    }
}

/// Threads worth spawning: epochs are the unit of parallel work
fn pool_size(workers: usize, n_epochs: usize) -> usize {
    workers.min(n_epochs).max(1)
}

/// Feature extractor over epoched multichannel signals
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    registry: Arc<FeatureRegistry>,
    sfreq: f64,
    freq_bands: Vec<f64>,
    selected_funcs: Vec<String>,
    funcs_params: FuncParams,
    n_jobs: i32,
    ch_names: Option<Vec<String>>,
}

impl FeatureExtractor {
    /// Create an extractor using the built-in feature functions
    pub fn new(sfreq: f64, freq_bands: impl Into<Vec<f64>>) -> Self {
        Self {
            registry: FeatureRegistry::builtin(),
            sfreq,
            freq_bands: freq_bands.into(),
            selected_funcs: Vec::new(),
            funcs_params: FuncParams::new(),
            n_jobs: 1,
            ch_names: None,
        }
    }

    /// Select feature functions, in output order
    pub fn with_funcs<I, S>(mut self, funcs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selected_funcs = funcs.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_params(mut self, params: FuncParams) -> Self {
        self.funcs_params = params;
        self
    }

    /// Override a single parameter
    pub fn with_param(mut self, alias: &str, param: &str, value: impl Into<ParamValue>) -> Self {
        self.funcs_params.set(alias, param, value);
        self
    }

    pub fn with_n_jobs(mut self, n_jobs: i32) -> Self {
        self.n_jobs = n_jobs;
        self
    }

    /// Channel labels for [`extract_table`](Self::extract_table)
    pub fn with_channel_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ch_names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Resolve aliases against a custom registry
    pub fn with_registry(mut self, registry: Arc<FeatureRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn sfreq(&self) -> f64 {
        self.sfreq
    }

    pub fn freq_bands(&self) -> &[f64] {
        &self.freq_bands
    }

    pub fn selected_funcs(&self) -> &[String] {
        &self.selected_funcs
    }

    pub fn n_jobs(&self) -> i32 {
        self.n_jobs
    }

    fn context(&self) -> FeatureContext<'_> {
        FeatureContext {
            sfreq: self.sfreq,
            freq_bands: &self.freq_bands,
        }
    }

    /// Validate the configuration and resolve every selected function
    pub fn plan(&self) -> Result<ResolvedPlan> {
        let overrides = (!self.funcs_params.is_empty()).then_some(&self.funcs_params);
        ParameterResolver::new(&self.registry).resolve(self.selected_funcs.as_slice(), overrides, &self.context())
    }

    /// Values produced per channel
    pub fn output_width(&self) -> Result<usize> {
        Ok(self.plan()?.width())
    }

    /// Compute the `(n_epochs, n_channels × width)` feature matrix
    pub fn extract(&self, data: ArrayView3<'_, f64>) -> Result<Array2<f64>> {
        let plan = self.plan()?;
        self.run(&plan, data)
    }

    /// Compute the feature matrix with `"{channel}_{feature}"` column labels
    pub fn extract_table(&self, data: ArrayView3<'_, f64>) -> Result<FeatureTable> {
        let plan = self.plan()?;
        let n_channels = data.dim().1;
        let channels = match &self.ch_names {
            Some(names) => {
                validate_channel_names(names, n_channels)?;
                names.clone()
            }
            None => channel_labels(n_channels),
        };

        let values = self.run(&plan, data)?;
        FeatureTable::from_matrix(values, &channels, &plan)
    }

    fn run(&self, plan: &ResolvedPlan, data: ArrayView3<'_, f64>) -> Result<Array2<f64>> {
        validate_data(&data)?;
        let (n_epochs, n_channels, n_times) = data.dim();
        let workers = pool_size(resolve_n_jobs(self.n_jobs)?, n_epochs);
        let width = plan.width();
        let row_width = n_channels * width;

        if data.iter().any(|v| !v.is_finite()) {
            warn!("Input contains non-finite samples; affected features will be NaN or inf");
        }
        info!(
            "Extracting {} feature function(s) from {} epochs x {} channels x {} samples on {} worker(s)",
            plan.len(),
            n_epochs,
            n_channels,
            n_times,
            workers
        );
        let start = Instant::now();

        let executor = ChannelExecutor::new(plan, self.context());
        let compute_epoch = |epoch: usize| -> Result<Vec<f64>> {
            let mut row = vec![0.0; row_width];
            for (channel, out) in row.chunks_mut(width).enumerate() {
                let lane = data.slice(s![epoch, channel, ..]);
                let samples = match lane.as_slice() {
                    Some(samples) => Cow::Borrowed(samples),
                    None => Cow::Owned(lane.to_vec()),
                };
                executor.execute(Location { epoch, channel }, &samples, out)?;
            }
            Ok(row)
        };

        let rows: Vec<Vec<f64>> = if workers == 1 {
            (0..n_epochs).map(&compute_epoch).collect::<Result<_>>()?
        } else {
            let pool = rayon::ThreadPoolBuilder::new().num_threads(workers).build()?;
            pool.install(|| {
                (0..n_epochs)
                    .into_par_iter()
                    .map(&compute_epoch)
                    .collect::<Result<_>>()
            })?
        };

        let mut features = Array2::zeros((n_epochs, row_width));
        for (mut dst, row) in features.rows_mut().into_iter().zip(&rows) {
            dst.assign(&ArrayView1::from(row.as_slice()));
        }

        debug!(
            "Extracted {:?} feature matrix in {:.2?}",
            features.dim(),
            start.elapsed()
        );
        Ok(features)
    }
}

/// Extract features from `(n_epochs, n_channels, n_times)` data
///
/// Returns a `(n_epochs, n_channels × width)` matrix with columns ordered
/// channel-major, then by selected function, then by sub-value.
pub fn extract_features<S: AsRef<str>>(
    data: ArrayView3<'_, f64>,
    sfreq: f64,
    freq_bands: &[f64],
    selected_funcs: &[S],
    funcs_params: Option<&FuncParams>,
    n_jobs: i32,
) -> Result<Array2<f64>> {
    builder(sfreq, freq_bands, selected_funcs, funcs_params, n_jobs).extract(data)
}

/// Like [`extract_features`], with labeled columns
///
/// Channels are labeled `ch0, ch1, ...` unless `ch_names` is given.
pub fn extract_features_table<S: AsRef<str>>(
    data: ArrayView3<'_, f64>,
    sfreq: f64,
    freq_bands: &[f64],
    selected_funcs: &[S],
    funcs_params: Option<&FuncParams>,
    n_jobs: i32,
    ch_names: Option<&[String]>,
) -> Result<FeatureTable> {
    let mut extractor = builder(sfreq, freq_bands, selected_funcs, funcs_params, n_jobs);
    if let Some(names) = ch_names {
        extractor = extractor.with_channel_names(names.iter().cloned());
    }
    extractor.extract_table(data)
}

fn builder<S: AsRef<str>>(
    sfreq: f64,
    freq_bands: &[f64],
    selected_funcs: &[S],
    funcs_params: Option<&FuncParams>,
    n_jobs: i32,
) -> FeatureExtractor {
    FeatureExtractor::new(sfreq, freq_bands)
        .with_funcs(selected_funcs.iter().map(|f| f.as_ref().to_string()))
        .with_params(funcs_params.cloned().unwrap_or_default())
        .with_n_jobs(n_jobs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array3, Axis};

    const BANDS: [f64; 6] = [0.1, 4.0, 8.0, 12.0, 30.0, 70.0];

    fn ramp(shape: (usize, usize, usize)) -> Array3<f64> {
        Array3::from_shape_fn(shape, |(e, c, t)| ((e * 7 + c * 3 + t) % 11) as f64 - 5.0)
    }

    #[test]
    fn test_n_jobs_resolution() {
        let cores = std::thread::available_parallelism().map_or(1, |n| n.get());
        assert_eq!(resolve_n_jobs(1).unwrap(), 1);
        assert_eq!(resolve_n_jobs(4).unwrap(), 4);
        assert_eq!(resolve_n_jobs(-1).unwrap(), cores);
        assert_eq!(resolve_n_jobs(-1000).unwrap(), 1);
        assert!(matches!(resolve_n_jobs(0), Err(ExtractionError::InvalidJobCount)));
    }

    #[test]
    fn test_matrix_layout() {
        let data = ramp((3, 2, 64));
        let features = FeatureExtractor::new(256.0, BANDS)
            .with_funcs(["mean", "ptp_amp"])
            .extract(data.view())
            .unwrap();

        assert_eq!(features.dim(), (3, 4));
        for (e, epoch) in data.axis_iter(Axis(0)).enumerate() {
            for (c, lane) in epoch.axis_iter(Axis(0)).enumerate() {
                let samples = lane.to_vec();
                assert_eq!(features[[e, 2 * c]], feature_funcs::statistics::mean(&samples));
                assert_eq!(features[[e, 2 * c + 1]], feature_funcs::statistics::ptp_amp(&samples));
            }
        }
    }

    #[test]
    fn test_non_contiguous_lanes() {
        // Permuted axes give strided lanes
        let data = ramp((64, 2, 3));
        let view = data.view().permuted_axes([2, 1, 0]);
        let strided = FeatureExtractor::new(256.0, BANDS)
            .with_funcs(["variance"])
            .extract(view)
            .unwrap();
        let owned = FeatureExtractor::new(256.0, BANDS)
            .with_funcs(["variance"])
            .extract(view.as_standard_layout().view())
            .unwrap();
        assert_eq!(strided, owned);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let data = ramp((6, 3, 128));
        let extractor = FeatureExtractor::new(256.0, BANDS).with_funcs(["pow_freq_bands", "katz_fd"]);
        let sequential = extractor.extract(data.view()).unwrap();
        let parallel = extractor.clone().with_n_jobs(3).extract(data.view()).unwrap();
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_pool_never_exceeds_epochs() {
        assert_eq!(pool_size(100_000, 6), 6);
        assert_eq!(pool_size(2, 6), 2);
        assert_eq!(pool_size(8, 0), 1);

        let data = ramp((2, 2, 64));
        let extractor = FeatureExtractor::new(256.0, BANDS).with_funcs(["mean"]);
        let oversized = extractor.clone().with_n_jobs(i32::MAX).extract(data.view()).unwrap();
        assert_eq!(oversized, extractor.extract(data.view()).unwrap());
    }

    #[test]
    fn test_validation_precedes_computation() {
        let data = ramp((2, 2, 32));
        let extractor = FeatureExtractor::new(256.0, BANDS).with_funcs(["mean"]);
        assert!(matches!(
            extractor.clone().with_n_jobs(0).extract(data.view()),
            Err(ExtractionError::InvalidJobCount)
        ));
        assert!(matches!(
            extractor.clone().with_channel_names(["Fz"]).extract_table(data.view()),
            Err(ExtractionError::ChannelNameMismatch { names: 1, channels: 2 })
        ));
        assert!(matches!(
            extractor.extract(Array3::<f64>::zeros((2, 2, 0)).view()),
            Err(ExtractionError::InvalidShape { .. })
        ));
    }

    #[test]
    fn test_empty_epoch_axis() {
        let data = Array3::<f64>::zeros((0, 4, 32));
        let features = extract_features(data.view(), 256.0, &BANDS, &["mean", "std"], None, 1).unwrap();
        assert_eq!(features.dim(), (0, 8));
    }

    #[test]
    fn test_runtime_failure_aborts() {
        let data = ramp((2, 1, 8));
        let err = extract_features(data.view(), 256.0, &BANDS, &["higuchi_fd"], None, 2).unwrap_err();
        assert!(matches!(err, ExtractionError::FeatureFailed { .. }));
    }

    #[test]
    fn test_table_labels() {
        let data = ramp((2, 2, 64));
        let names = vec!["Fz".to_string(), "Cz".to_string()];
        let table = extract_features_table(
            data.view(),
            256.0,
            &BANDS,
            &["mean", "spect_slope"],
            None,
            1,
            Some(&names),
        )
        .unwrap();
        assert_eq!(table.shape(), (2, 10));
        assert_eq!(table.columns()[0], "Fz_mean");
        assert_eq!(table.columns()[4], "Fz_spect_slope_3");
        assert_eq!(table.columns()[5], "Cz_mean");
    }
}
