//! Built-in feature functions
//!
//! Adapts the kernels of `feature-funcs` to the uniform plug-in signature:
//! parameters are read from the resolved [`Params`], shared inputs from the
//! [`FeatureContext`].

use crate::params::{ParamValue, Params};
use crate::registry::{Arity, FeatureContext, FeatureDef};
use feature_funcs::{complexity, power_spectrum, spectral, statistics, BandRatios, FuncError, PowerSpectrum, PsdMethod};

fn usize_param(params: &Params, name: &'static str, func: &'static str) -> Result<usize, FuncError> {
    params.get_usize(name).ok_or_else(|| FuncError::InvalidArgument {
        func,
        reason: format!("'{}' must be a non-negative integer", name),
    })
}

fn f64_param(params: &Params, name: &'static str, func: &'static str) -> Result<f64, FuncError> {
    params.get_f64(name).ok_or_else(|| FuncError::InvalidArgument {
        func,
        reason: format!("'{}' must be a number", name),
    })
}

fn list_param(params: &Params, name: &'static str, func: &'static str) -> Result<Vec<f64>, FuncError> {
    params.get_list(name).ok_or_else(|| FuncError::InvalidArgument {
        func,
        reason: format!("'{}' must be a list of numbers", name),
    })
}

fn bool_param(params: &Params, name: &'static str, func: &'static str) -> Result<bool, FuncError> {
    params.get_bool(name).ok_or_else(|| FuncError::InvalidArgument {
        func,
        reason: format!("'{}' must be a boolean", name),
    })
}

/// Null means "derive from the data"
fn optional_f64(params: &Params, name: &'static str, func: &'static str) -> Result<Option<f64>, FuncError> {
    match params.get(name) {
        None | Some(ParamValue::Null) => Ok(None),
        Some(_) => f64_param(params, name, func).map(Some),
    }
}

fn psd_method(params: &Params) -> Result<PsdMethod, FuncError> {
    params.get_str("psd_method").unwrap_or("welch").parse()
}

fn band_ratios(params: &Params) -> Result<BandRatios, FuncError> {
    params.get_str("ratios").unwrap_or("none").parse()
}

fn spectrum(samples: &[f64], params: &Params, ctx: &FeatureContext<'_>) -> Result<PowerSpectrum, FuncError> {
    power_spectrum(samples, ctx.sfreq, psd_method(params)?)
}

fn check_positive(params: &Params, name: &'static str, func: &'static str) -> Result<(), FuncError> {
    match usize_param(params, name, func)? {
        0 => Err(FuncError::InvalidArgument {
            func,
            reason: format!("'{}' must be positive", name),
        }),
        _ => Ok(()),
    }
}

fn check_unit_interval(values: &[f64], name: &'static str, func: &'static str) -> Result<(), FuncError> {
    match values.iter().find(|v| !(0.0..=1.0).contains(*v)) {
        Some(v) => Err(FuncError::InvalidArgument {
            func,
            reason: format!("'{}' values must lie in [0, 1], got {}", name, v),
        }),
        None => Ok(()),
    }
}

fn check_tolerance(params: &Params, func: &'static str) -> Result<(), FuncError> {
    check_positive(params, "emb", func)?;
    match optional_f64(params, "r", func)? {
        Some(r) if r <= 0.0 => Err(FuncError::InvalidArgument {
            func,
            reason: "'r' must be positive".to_string(),
        }),
        _ => Ok(()),
    }
}

fn check_embedding(params: &Params, func: &'static str) -> Result<(), FuncError> {
    check_positive(params, "tau", func)?;
    check_positive(params, "emb", func)
}

fn check_slope_range(params: &Params, ctx: &FeatureContext<'_>) -> Result<(), FuncError> {
    psd_method(params)?;
    let fmin = f64_param(params, "fmin", "spect_slope")?;
    let fmax = optional_f64(params, "fmax", "spect_slope")?.unwrap_or(ctx.sfreq / 2.0);
    if fmin < 0.0 || fmin >= fmax {
        return Err(FuncError::InvalidArgument {
            func: "spect_slope",
            reason: format!("need 0 <= fmin < fmax, got fmin={} fmax={}", fmin, fmax),
        });
    }
    Ok(())
}

fn pow_freq_bands_width(params: &Params, ctx: &FeatureContext<'_>) -> usize {
    band_ratios(params).unwrap_or_default().output_len(ctx.n_bands())
}

/// Every built-in feature function
pub(crate) fn builtin_defs() -> Vec<FeatureDef> {
    vec![
        // Statistics
        FeatureDef::new("mean", Arity::Scalar, |x, _, _| Ok(statistics::mean(x).into())),
        FeatureDef::new("variance", Arity::Scalar, |x, _, _| Ok(statistics::variance(x).into())),
        FeatureDef::new("std", Arity::Scalar, |x, _, _| Ok(statistics::std(x).into())),
        FeatureDef::new("ptp_amp", Arity::Scalar, |x, _, _| Ok(statistics::ptp_amp(x).into())),
        FeatureDef::new("skewness", Arity::Scalar, |x, _, _| Ok(statistics::skewness(x).into())),
        FeatureDef::new("kurtosis", Arity::Scalar, |x, _, _| Ok(statistics::kurtosis(x).into())),
        FeatureDef::new("rms", Arity::Scalar, |x, _, _| Ok(statistics::rms(x).into())),
        FeatureDef::new("quantile", Arity::PerListParam("q"), |x, p, _| {
            let q = list_param(p, "q", "quantile")?;
            Ok(statistics::quantile(x, &q)?.into())
        })
        .with_default("q", vec![0.75])
        .with_check(|p, _| check_unit_interval(&list_param(p, "q", "quantile")?, "q", "quantile")),
        FeatureDef::new("zero_crossings", Arity::Scalar, |x, p, _| {
            let threshold = f64_param(p, "threshold", "zero_crossings")?;
            Ok(statistics::zero_crossings(x, threshold).into())
        })
        .with_default("threshold", f64::EPSILON),
        FeatureDef::new("line_length", Arity::Scalar, |x, _, _| Ok(statistics::line_length(x).into())),
        // Complexity
        FeatureDef::new("hurst_exp", Arity::Scalar, |x, _, _| Ok(complexity::hurst_exp(x)?.into())),
        FeatureDef::new("decorr_time", Arity::Scalar, |x, _, ctx| {
            Ok(complexity::decorr_time(x, ctx.sfreq).into())
        }),
        FeatureDef::new("hjorth_mobility", Arity::Scalar, |x, _, _| {
            Ok(complexity::hjorth_mobility(x).into())
        }),
        FeatureDef::new("hjorth_complexity", Arity::Scalar, |x, _, _| {
            Ok(complexity::hjorth_complexity(x).into())
        }),
        FeatureDef::new("higuchi_fd", Arity::Scalar, |x, p, _| {
            let kmax = usize_param(p, "kmax", "higuchi_fd")?;
            Ok(complexity::higuchi_fd(x, kmax)?.into())
        })
        .with_default("kmax", 10)
        .with_check(|p, _| match usize_param(p, "kmax", "higuchi_fd")? {
            k if k < 2 => Err(FuncError::InvalidArgument {
                func: "higuchi_fd",
                reason: "'kmax' must be at least 2".to_string(),
            }),
            _ => Ok(()),
        }),
        FeatureDef::new("katz_fd", Arity::Scalar, |x, _, _| Ok(complexity::katz_fd(x)?.into())),
        FeatureDef::new("app_entropy", Arity::Scalar, |x, p, _| {
            let emb = usize_param(p, "emb", "app_entropy")?;
            let r = optional_f64(p, "r", "app_entropy")?;
            Ok(complexity::app_entropy(x, emb, r)?.into())
        })
        .with_default("emb", 2)
        .with_default("r", ParamValue::Null)
        .with_check(|p, _| check_tolerance(p, "app_entropy")),
        FeatureDef::new("samp_entropy", Arity::Scalar, |x, p, _| {
            let emb = usize_param(p, "emb", "samp_entropy")?;
            let r = optional_f64(p, "r", "samp_entropy")?;
            Ok(complexity::samp_entropy(x, emb, r)?.into())
        })
        .with_default("emb", 2)
        .with_default("r", ParamValue::Null)
        .with_check(|p, _| check_tolerance(p, "samp_entropy")),
        FeatureDef::new("svd_entropy", Arity::Scalar, |x, p, _| {
            let tau = usize_param(p, "tau", "svd_entropy")?;
            let emb = usize_param(p, "emb", "svd_entropy")?;
            Ok(complexity::svd_entropy(x, tau, emb)?.into())
        })
        .with_default("tau", 2)
        .with_default("emb", 10)
        .with_check(|p, _| check_embedding(p, "svd_entropy")),
        FeatureDef::new("svd_fisher_info", Arity::Scalar, |x, p, _| {
            let tau = usize_param(p, "tau", "svd_fisher_info")?;
            let emb = usize_param(p, "emb", "svd_fisher_info")?;
            Ok(complexity::svd_fisher_info(x, tau, emb)?.into())
        })
        .with_default("tau", 2)
        .with_default("emb", 10)
        .with_check(|p, _| check_embedding(p, "svd_fisher_info")),
        // Spectral
        FeatureDef::new("pow_freq_bands", Arity::Custom(pow_freq_bands_width), |x, p, ctx| {
            let spectrum = spectrum(x, p, ctx)?;
            Ok(spectral::pow_freq_bands(
                &spectrum,
                ctx.freq_bands,
                bool_param(p, "normalize", "pow_freq_bands")?,
                band_ratios(p)?,
                bool_param(p, "log", "pow_freq_bands")?,
            )?
            .into())
        })
        .with_default("normalize", true)
        .with_default("ratios", "none")
        .with_default("log", false)
        .with_default("psd_method", "welch")
        .with_freq_bands()
        .with_check(|p, _| {
            band_ratios(p)?;
            psd_method(p).map(|_| ())
        }),
        FeatureDef::new("spect_entropy", Arity::Scalar, |x, p, ctx| {
            Ok(spectral::spect_entropy(&spectrum(x, p, ctx)?).into())
        })
        .with_default("psd_method", "welch")
        .with_check(|p, _| psd_method(p).map(|_| ())),
        FeatureDef::new("spect_edge_freq", Arity::PerListParam("edge"), |x, p, ctx| {
            let ref_freq = optional_f64(p, "ref_freq", "spect_edge_freq")?.unwrap_or(ctx.sfreq / 2.0);
            let edge = list_param(p, "edge", "spect_edge_freq")?;
            Ok(spectral::spect_edge_freq(&spectrum(x, p, ctx)?, ref_freq, &edge)?.into())
        })
        .with_default("ref_freq", ParamValue::Null)
        .with_default("edge", vec![0.5])
        .with_default("psd_method", "welch")
        .with_check(|p, _| {
            psd_method(p)?;
            check_unit_interval(&list_param(p, "edge", "spect_edge_freq")?, "edge", "spect_edge_freq")
        }),
        FeatureDef::new("spect_slope", Arity::Fixed(4), |x, p, ctx| {
            let fmin = f64_param(p, "fmin", "spect_slope")?;
            let fmax = optional_f64(p, "fmax", "spect_slope")?.unwrap_or(ctx.sfreq / 2.0);
            Ok(spectral::spect_slope(&spectrum(x, p, ctx)?, fmin, fmax)?.into())
        })
        .with_default("fmin", 0.1)
        .with_default("fmax", ParamValue::Null)
        .with_default("psd_method", "welch")
        .with_check(check_slope_range),
    ]
}
