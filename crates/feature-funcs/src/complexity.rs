//! Fractal, entropy and embedding-based complexity measures

use crate::error::FuncError;
use crate::linalg::{linear_fit, singular_values};
use crate::statistics::{diff, sample_std, variance};

/// Hjorth mobility: sqrt(var(x') / var(x))
pub fn hjorth_mobility(values: &[f64]) -> f64 {
    let var = variance(values);
    if var <= 0.0 || values.len() < 2 {
        return 0.0;
    }
    (variance(&diff(values)) / var).sqrt()
}

/// Hjorth complexity: mobility(x') / mobility(x)
pub fn hjorth_complexity(values: &[f64]) -> f64 {
    let mobility = hjorth_mobility(values);
    if mobility <= 0.0 {
        return 0.0;
    }
    hjorth_mobility(&diff(values)) / mobility
}

/// Higuchi fractal dimension with curve lengths up to `kmax`
pub fn higuchi_fd(values: &[f64], kmax: usize) -> Result<f64, FuncError> {
    if kmax < 2 {
        return Err(FuncError::invalid("higuchi_fd", "kmax must be at least 2"));
    }
    let n = values.len();
    if n < 2 * kmax {
        return Err(FuncError::too_short("higuchi_fd", 2 * kmax, n));
    }

    let mut log_inv_k = Vec::with_capacity(kmax);
    let mut log_lk = Vec::with_capacity(kmax);

    for k in 1..=kmax {
        let mut lk = 0.0;
        for m in 0..k {
            let n_max = (n - m - 1) / k;
            let mut ll = 0.0;
            for j in 1..n_max {
                ll += (values[m + j * k] - values[m + (j - 1) * k]).abs();
            }
            ll /= k as f64;
            ll *= (n - 1) as f64 / (k * n_max) as f64;
            lk += ll;
        }
        lk /= k as f64;
        log_inv_k.push((1.0 / k as f64).ln());
        log_lk.push(lk.ln());
    }

    Ok(linear_fit(&log_inv_k, &log_lk).1)
}

/// Katz fractal dimension
pub fn katz_fd(values: &[f64]) -> Result<f64, FuncError> {
    if values.len() < 2 {
        return Err(FuncError::too_short("katz_fd", 2, values.len()));
    }
    let steps: Vec<f64> = diff(values).iter().map(|d| d.abs()).collect();
    let length: f64 = steps.iter().sum();
    let mean_step = length / steps.len() as f64;
    let extent = values[1..]
        .iter()
        .map(|v| (v - values[0]).abs())
        .fold(0.0, f64::max);

    let ln = (length / mean_step).log10();
    Ok(ln / (ln + (extent / length).log10()))
}

/// Time-delay embedding: rows are `[x[i], x[i + tau], ..., x[i + (emb - 1) * tau]]`
pub fn embed(values: &[f64], emb: usize, tau: usize) -> Result<Vec<Vec<f64>>, FuncError> {
    if emb == 0 || tau == 0 {
        return Err(FuncError::invalid("embed", "emb and tau must be positive"));
    }
    let span = (emb - 1) * tau;
    if values.len() <= span {
        return Err(FuncError::too_short("embed", span + 1, values.len()));
    }
    Ok((0..values.len() - span)
        .map(|i| (0..emb).map(|j| values[i + j * tau]).collect())
        .collect())
}

fn has_non_finite(values: &[f64]) -> bool {
    values.iter().any(|v| !v.is_finite())
}

/// Normalized singular values of the delay-embedding matrix, descending
fn normalized_singular_values(values: &[f64], tau: usize, emb: usize) -> Result<Vec<f64>, FuncError> {
    let rows = embed(values, emb, tau)?;
    if has_non_finite(values) {
        return Ok(vec![f64::NAN; emb]);
    }
    let flat: Vec<f64> = rows.iter().flatten().copied().collect();
    let sv = singular_values(&flat, rows.len(), emb);
    let total: f64 = sv.iter().sum();
    if total <= 0.0 {
        return Ok(vec![0.0; sv.len()]);
    }
    Ok(sv.into_iter().map(|s| s / total).collect())
}

/// SVD entropy of the delay embedding
pub fn svd_entropy(values: &[f64], tau: usize, emb: usize) -> Result<f64, FuncError> {
    let sv = normalized_singular_values(values, tau, emb)?;
    if sv.iter().any(|s| s.is_nan()) {
        return Ok(f64::NAN);
    }
    Ok(-sv.iter().filter(|&&s| s > 0.0).map(|s| s * s.log2()).sum::<f64>())
}

/// SVD Fisher information of the delay embedding
pub fn svd_fisher_info(values: &[f64], tau: usize, emb: usize) -> Result<f64, FuncError> {
    let sv = normalized_singular_values(values, tau, emb)?;
    if sv.iter().any(|s| s.is_nan()) {
        return Ok(f64::NAN);
    }
    Ok(sv
        .windows(2)
        .filter(|w| w[0] > 0.0)
        .map(|w| (w[1] - w[0]).powi(2) / w[0])
        .sum())
}

/// Per-template match counts (Chebyshev distance ≤ r, self-match included)
fn template_match_counts(values: &[f64], m: usize, r: f64) -> Vec<usize> {
    let n_vectors = values.len() + 1 - m;
    (0..n_vectors)
        .map(|i| {
            (0..n_vectors)
                .filter(|&j| (0..m).all(|k| (values[i + k] - values[j + k]).abs() <= r))
                .count()
        })
        .collect()
}

fn tolerance(values: &[f64], r: Option<f64>, func: &'static str) -> Result<f64, FuncError> {
    match r {
        Some(r) if r <= 0.0 => Err(FuncError::invalid(func, "tolerance r must be positive")),
        Some(r) => Ok(r),
        None => Ok(0.2 * sample_std(values)),
    }
}

/// Approximate entropy; `r` defaults to 0.2 × sample standard deviation
pub fn app_entropy(values: &[f64], emb: usize, r: Option<f64>) -> Result<f64, FuncError> {
    if emb == 0 {
        return Err(FuncError::invalid("app_entropy", "emb must be positive"));
    }
    if values.len() < emb + 2 {
        return Err(FuncError::too_short("app_entropy", emb + 2, values.len()));
    }
    let r = tolerance(values, r, "app_entropy")?;
    if !r.is_finite() || has_non_finite(values) {
        return Ok(f64::NAN);
    }

    let phi = |m: usize| {
        let counts = template_match_counts(values, m, r);
        let n_vectors = counts.len() as f64;
        counts
            .iter()
            .map(|&c| (c as f64 / n_vectors).ln())
            .sum::<f64>()
            / n_vectors
    };

    Ok(phi(emb) - phi(emb + 1))
}

/// Sample entropy; `r` defaults to 0.2 × sample standard deviation
pub fn samp_entropy(values: &[f64], emb: usize, r: Option<f64>) -> Result<f64, FuncError> {
    if emb == 0 {
        return Err(FuncError::invalid("samp_entropy", "emb must be positive"));
    }
    if values.len() < emb + 3 {
        return Err(FuncError::too_short("samp_entropy", emb + 3, values.len()));
    }
    let r = tolerance(values, r, "samp_entropy")?;
    if !r.is_finite() || has_non_finite(values) {
        return Ok(f64::NAN);
    }

    let phi = |m: usize| {
        let counts = template_match_counts(values, m, r);
        let n_vectors = counts.len() as f64;
        counts
            .iter()
            .map(|&c| c.saturating_sub(1) as f64 / (n_vectors - 1.0))
            .sum::<f64>()
            / n_vectors
    };

    Ok(-(phi(emb + 1) / phi(emb)).ln())
}

/// Hurst exponent from the rescaled range over dyadic window sizes
pub fn hurst_exp(values: &[f64]) -> Result<f64, FuncError> {
    const MIN_WINDOW: usize = 8;
    let n = values.len();
    if n < 2 * MIN_WINDOW {
        return Err(FuncError::too_short("hurst_exp", 2 * MIN_WINDOW, n));
    }

    let mut log_size = Vec::new();
    let mut log_rs = Vec::new();
    let mut size = n;
    while size >= MIN_WINDOW {
        let mut rs_sum = 0.0;
        let mut used = 0usize;
        for chunk in values.chunks_exact(size) {
            let m = chunk.iter().sum::<f64>() / size as f64;
            let mut cum = 0.0;
            let mut lo = 0.0f64;
            let mut hi = 0.0f64;
            let mut ss = 0.0;
            for &v in chunk {
                cum += v - m;
                lo = lo.min(cum);
                hi = hi.max(cum);
                ss += (v - m) * (v - m);
            }
            let s = (ss / size as f64).sqrt();
            if s > 0.0 {
                rs_sum += (hi - lo) / s;
                used += 1;
            }
        }
        if used > 0 {
            log_size.push((size as f64).ln());
            log_rs.push((rs_sum / used as f64).ln());
        }
        size /= 2;
    }

    if log_size.len() < 2 {
        return Ok(f64::NAN);
    }
    Ok(linear_fit(&log_size, &log_rs).1)
}

/// Decorrelation time: lag (in seconds) of the first non-positive autocorrelation
pub fn decorr_time(values: &[f64], sfreq: f64) -> f64 {
    let n = values.len();
    let m = values.iter().sum::<f64>() / n.max(1) as f64;
    let centered: Vec<f64> = values.iter().map(|v| v - m).collect();

    let lag = (1..n)
        .find(|&k| {
            let ac: f64 = centered[..n - k]
                .iter()
                .zip(&centered[k..])
                .map(|(a, b)| a * b)
                .sum();
            ac <= 0.0
        })
        .unwrap_or(n);
    lag as f64 / sfreq
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn sine(n: usize, freq: f64, sfreq: f64) -> Vec<f64> {
        (0..n)
            .map(|i| (2.0 * std::f64::consts::PI * freq * i as f64 / sfreq).sin())
            .collect()
    }

    /// Deterministic pseudo-noise (xorshift), centered on zero
    fn noise(n: usize, seed: u64) -> Vec<f64> {
        let mut state = seed.max(1);
        (0..n)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 7;
                state ^= state << 17;
                (state >> 11) as f64 / (1u64 << 53) as f64 - 0.5
            })
            .collect()
    }

    #[test]
    fn test_hjorth_of_sine() {
        // Mobility of a sampled sine approaches 2·sin(πf/fs)
        let x = sine(1024, 4.0, 256.0);
        let expected = 2.0 * (std::f64::consts::PI * 4.0 / 256.0).sin();
        assert_abs_diff_eq!(hjorth_mobility(&x), expected, epsilon = 1e-2);
        assert_abs_diff_eq!(hjorth_complexity(&x), 1.0, epsilon = 1e-2);
    }

    #[test]
    fn test_higuchi_line_is_one() {
        let x: Vec<f64> = (0..200).map(|i| i as f64).collect();
        let fd = higuchi_fd(&x, 8).unwrap();
        assert_abs_diff_eq!(fd, 1.0, epsilon = 0.05);
    }

    #[test]
    fn test_higuchi_noise_near_two() {
        let fd = higuchi_fd(&noise(1024, 7), 10).unwrap();
        assert!(fd > 1.7 && fd < 2.2, "fd = {}", fd);
    }

    #[test]
    fn test_higuchi_rejects_short_signal() {
        assert!(matches!(
            higuchi_fd(&[1.0; 10], 10),
            Err(FuncError::SignalTooShort { .. })
        ));
    }

    #[test]
    fn test_katz_of_line_is_one() {
        let x: Vec<f64> = (0..50).map(|i| i as f64).collect();
        assert_abs_diff_eq!(katz_fd(&x).unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_embed_shape() {
        let x: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let rows = embed(&x, 3, 2).unwrap();
        assert_eq!(rows.len(), 6);
        assert_eq!(rows[0], vec![0.0, 2.0, 4.0]);
        assert!(embed(&x, 6, 2).is_err());
    }

    #[test]
    fn test_svd_measures_are_finite() {
        let x = noise(256, 3);
        let h = svd_entropy(&x, 2, 10).unwrap();
        let f = svd_fisher_info(&x, 5, 10).unwrap();
        assert!(h.is_finite() && h > 0.0);
        assert!(f.is_finite() && f >= 0.0);
    }

    #[test]
    fn test_regular_signal_has_lower_entropy_than_noise() {
        let regular = sine(256, 8.0, 256.0);
        let irregular = noise(256, 11);
        assert!(samp_entropy(&regular, 2, None).unwrap() < samp_entropy(&irregular, 2, None).unwrap());
        assert!(app_entropy(&regular, 2, None).unwrap() < app_entropy(&irregular, 2, None).unwrap());
    }

    #[test]
    fn test_entropies_of_non_finite_signal_are_nan() {
        let mut x = noise(128, 13);
        x[5] = f64::NAN;
        assert!(samp_entropy(&x, 2, None).unwrap().is_nan());
        assert!(app_entropy(&x, 2, None).unwrap().is_nan());
        assert!(samp_entropy(&x, 2, Some(0.1)).unwrap().is_nan());

        x[5] = f64::INFINITY;
        assert!(samp_entropy(&x, 2, Some(0.1)).unwrap().is_nan());
        assert!(app_entropy(&x, 2, Some(0.1)).unwrap().is_nan());
        assert!(svd_entropy(&x, 2, 10).unwrap().is_nan());
        assert!(svd_fisher_info(&x, 2, 10).unwrap().is_nan());
    }

    #[test]
    fn test_hurst_of_noise_near_half() {
        let h = hurst_exp(&noise(2048, 5)).unwrap();
        assert!(h > 0.3 && h < 0.8, "hurst = {}", h);
    }

    #[test]
    fn test_decorr_time_of_sine() {
        // Autocorrelation of a 4 Hz sine first crosses zero near a quarter period
        let t = decorr_time(&sine(512, 4.0, 256.0), 256.0);
        assert_abs_diff_eq!(t, 0.0625, epsilon = 0.01);
    }
}
