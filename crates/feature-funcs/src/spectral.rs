//! Frequency-domain descriptors computed from a [`PowerSpectrum`]

use crate::error::FuncError;
use crate::linalg::linear_fit;
use crate::psd::PowerSpectrum;
use std::str::FromStr;

/// Which band-power ratios accompany the band powers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BandRatios {
    /// Band powers only
    #[default]
    None,
    /// Ratios only
    Only,
    /// Band powers followed by ratios
    All,
}

impl BandRatios {
    /// Number of values emitted for `n_bands` bands
    pub fn output_len(self, n_bands: usize) -> usize {
        let n_ratios = n_bands * n_bands.saturating_sub(1);
        match self {
            BandRatios::None => n_bands,
            BandRatios::Only => n_ratios,
            BandRatios::All => n_bands + n_ratios,
        }
    }
}

impl FromStr for BandRatios {
    type Err = FuncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(BandRatios::None),
            "only" => Ok(BandRatios::Only),
            "all" => Ok(BandRatios::All),
            other => Err(FuncError::UnknownOption {
                kind: "ratios",
                value: other.to_string(),
            }),
        }
    }
}

/// Summed density in `[fmin, fmax)`
fn band_power(spectrum: &PowerSpectrum, fmin: f64, fmax: f64) -> f64 {
    spectrum
        .bins()
        .filter(|&(f, _)| f >= fmin && f < fmax)
        .map(|(_, p)| p)
        .sum()
}

/// Power in each band defined by consecutive edges of `freq_bands`
///
/// With `normalize`, each band power is divided by the total power of the
/// spectrum. Ratios are `power[i] / power[j]` for every ordered pair `i != j`,
/// `i` outer. With `log`, every emitted value is converted to `10·log10`.
pub fn pow_freq_bands(
    spectrum: &PowerSpectrum,
    freq_bands: &[f64],
    normalize: bool,
    ratios: BandRatios,
    log: bool,
) -> Result<Vec<f64>, FuncError> {
    if freq_bands.len() < 2 {
        return Err(FuncError::invalid("pow_freq_bands", "need at least two band edges"));
    }

    let mut powers: Vec<f64> = freq_bands
        .windows(2)
        .map(|edges| band_power(spectrum, edges[0], edges[1]))
        .collect();

    if normalize {
        let total: f64 = spectrum.psd.iter().sum();
        if total > 0.0 {
            powers.iter_mut().for_each(|p| *p /= total);
        }
    }

    let mut out = Vec::with_capacity(ratios.output_len(powers.len()));
    if ratios != BandRatios::Only {
        out.extend_from_slice(&powers);
    }
    if ratios != BandRatios::None {
        for (i, &num) in powers.iter().enumerate() {
            for (j, &den) in powers.iter().enumerate() {
                if i != j {
                    out.push(num / den);
                }
            }
        }
    }

    if log {
        out.iter_mut().for_each(|v| *v = 10.0 * v.log10());
    }
    Ok(out)
}

/// Shannon entropy (bits) of the normalized spectrum
pub fn spect_entropy(spectrum: &PowerSpectrum) -> f64 {
    let total: f64 = spectrum.psd.iter().sum();
    if total <= 0.0 {
        return 0.0;
    }
    -spectrum
        .psd
        .iter()
        .map(|p| p / total)
        .filter(|&p| p > 0.0)
        .map(|p| p * p.log2())
        .sum::<f64>()
}

/// Frequencies below which each fraction in `edges` of the power up to `ref_freq` lies
pub fn spect_edge_freq(spectrum: &PowerSpectrum, ref_freq: f64, edges: &[f64]) -> Result<Vec<f64>, FuncError> {
    if let Some(e) = edges.iter().find(|e| !(0.0..=1.0).contains(*e)) {
        return Err(FuncError::invalid(
            "spect_edge_freq",
            format!("edge must lie in [0, 1], got {}", e),
        ));
    }

    let mut freqs = Vec::new();
    let mut cumulative = Vec::new();
    let mut acc = 0.0;
    for (f, p) in spectrum.bins().filter(|&(f, _)| f <= ref_freq) {
        acc += p;
        freqs.push(f);
        cumulative.push(acc);
    }
    if freqs.is_empty() || acc <= 0.0 {
        return Ok(vec![0.0; edges.len()]);
    }

    Ok(edges
        .iter()
        .map(|&edge| {
            let idx = cumulative
                .iter()
                .position(|&c| c / acc >= edge)
                .unwrap_or(freqs.len() - 1);
            freqs[idx]
        })
        .collect())
}

/// Log-log linear fit of the spectrum in `[fmin, fmax]`: intercept, slope, MSE, R²
pub fn spect_slope(spectrum: &PowerSpectrum, fmin: f64, fmax: f64) -> Result<[f64; 4], FuncError> {
    let (x, y): (Vec<f64>, Vec<f64>) = spectrum
        .bins()
        .filter(|&(f, p)| f > 0.0 && f >= fmin && f <= fmax && p > 0.0)
        .map(|(f, p)| (f.log10(), p.log10()))
        .unzip();
    if x.len() < 2 {
        return Err(FuncError::invalid(
            "spect_slope",
            format!("fewer than two spectral bins in [{}, {}] Hz", fmin, fmax),
        ));
    }

    let (intercept, slope) = linear_fit(&x, &y);
    let n = y.len() as f64;
    let my = y.iter().sum::<f64>() / n;
    let mut ss_res = 0.0;
    let mut ss_tot = 0.0;
    for (&xi, &yi) in x.iter().zip(&y) {
        let r = yi - (intercept + slope * xi);
        ss_res += r * r;
        ss_tot += (yi - my) * (yi - my);
    }
    let r2 = if ss_tot > 0.0 { 1.0 - ss_res / ss_tot } else { 1.0 };

    Ok([intercept, slope, ss_res / n, r2])
}
