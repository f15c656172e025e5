//! Statistical Features Computation

use crate::error::FuncError;

/// Central moments of a signal, computed in a single pass
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Moments {
    /// Mean value
    pub mean: f64,
    /// Population variance (ddof = 0)
    pub variance: f64,
    /// Standard deviation
    pub std_dev: f64,
    /// Skewness (asymmetry, biased estimator)
    pub skewness: f64,
    /// Excess kurtosis (tailedness, biased estimator)
    pub kurtosis: f64,
}

impl Moments {
    /// Compute moments from a slice of values
    pub fn compute(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }

        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;

        let mut m2 = 0.0;
        let mut m3 = 0.0;
        let mut m4 = 0.0;

        for &v in values {
            let d = v - mean;
            let d2 = d * d;
            m2 += d2;
            m3 += d2 * d;
            m4 += d2 * d2;
        }

        let variance = m2 / n;
        let std_dev = variance.sqrt();

        // Skewness: E[(X-μ)³] / σ³
        let skewness = if std_dev > 0.0 {
            (m3 / n) / (variance * std_dev)
        } else {
            0.0
        };

        // Kurtosis: E[(X-μ)⁴] / σ⁴ - 3 (excess kurtosis)
        let kurtosis = if std_dev > 0.0 {
            (m4 / n) / (variance * variance) - 3.0
        } else {
            0.0
        };

        Self {
            mean,
            variance,
            std_dev,
            skewness,
            kurtosis,
        }
    }
}

/// Arithmetic mean
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population variance
pub fn variance(values: &[f64]) -> f64 {
    Moments::compute(values).variance
}

/// Population standard deviation
pub fn std(values: &[f64]) -> f64 {
    Moments::compute(values).std_dev
}

/// Sample standard deviation (ddof = 1)
pub fn sample_std(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    (ss / (n - 1) as f64).sqrt()
}

/// Peak-to-peak amplitude
pub fn ptp_amp(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    max - min
}

/// Skewness
pub fn skewness(values: &[f64]) -> f64 {
    Moments::compute(values).skewness
}

/// Excess kurtosis
pub fn kurtosis(values: &[f64]) -> f64 {
    Moments::compute(values).kurtosis
}

/// Root mean square
pub fn rms(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    (values.iter().map(|v| v * v).sum::<f64>() / values.len() as f64).sqrt()
}

/// Quantiles with linear interpolation between closest ranks
pub fn quantile(values: &[f64], qs: &[f64]) -> Result<Vec<f64>, FuncError> {
    if values.is_empty() {
        return Err(FuncError::too_short("quantile", 1, 0));
    }
    if let Some(q) = qs.iter().find(|q| !(0.0..=1.0).contains(*q)) {
        return Err(FuncError::invalid(
            "quantile",
            format!("q must lie in [0, 1], got {}", q),
        ));
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let last = (sorted.len() - 1) as f64;

    Ok(qs
        .iter()
        .map(|&q| {
            let pos = q * last;
            let lo = pos.floor() as usize;
            let hi = pos.ceil() as usize;
            let frac = pos - lo as f64;
            sorted[lo] + (sorted[hi] - sorted[lo]) * frac
        })
        .collect())
}

/// Number of sign changes; samples with magnitude below `threshold` count as zero
pub fn zero_crossings(values: &[f64], threshold: f64) -> f64 {
    let sign = |v: f64| {
        if v.abs() < threshold {
            0i8
        } else if v > 0.0 {
            1
        } else {
            -1
        }
    };

    let mut changes = 0usize;
    let mut into_zero = 0usize;
    for w in values.windows(2) {
        let (a, b) = (sign(w[0]), sign(w[1]));
        if a != b {
            changes += 1;
            if b == 0 {
                into_zero += 1;
            }
        }
    }
    // A pass through zero (+ → 0 → -) counts once
    (changes - into_zero) as f64
}

/// Mean absolute first difference
pub fn line_length(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let total: f64 = values.windows(2).map(|w| (w[1] - w[0]).abs()).sum();
    total / (values.len() - 1) as f64
}

/// First difference of a signal
pub(crate) fn diff(values: &[f64]) -> Vec<f64> {
    values.windows(2).map(|w| w[1] - w[0]).collect()
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn quantiles_are_ordered_and_bounded(values in prop::collection::vec(-1e6f64..1e6, 1..200)) {
            let q = quantile(&values, &[0.0, 0.25, 0.5, 0.75, 1.0]).unwrap();
            prop_assert!(q.windows(2).all(|w| w[0] <= w[1]));
            prop_assert_eq!(q[0], values.iter().cloned().fold(f64::INFINITY, f64::min));
            prop_assert_eq!(q[4], values.iter().cloned().fold(f64::NEG_INFINITY, f64::max));
        }

        #[test]
        fn variance_is_shift_invariant(values in prop::collection::vec(-1e3f64..1e3, 2..100), shift in -1e3f64..1e3) {
            let shifted: Vec<f64> = values.iter().map(|v| v + shift).collect();
            let (a, b) = (variance(&values), variance(&shifted));
            prop_assert!((a - b).abs() <= 1e-6 * a.max(1.0));
            prop_assert!(rms(&values) >= std(&values) * (1.0 - 1e-9));
        }
    }
}
