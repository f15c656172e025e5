//! FFT-based Power Spectral Density

use crate::error::FuncError;
use rustfft::{num_complex::Complex, FftPlanner};
use std::cell::RefCell;
use std::str::FromStr;
use tracing::trace;

/// Longest Welch segment (samples)
pub const WELCH_SEGMENT: usize = 256;

thread_local! {
    // One planner per worker thread so plans are reused across channels
    static PLANNER: RefCell<FftPlanner<f64>> = RefCell::new(FftPlanner::new());
}

/// PSD estimation method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PsdMethod {
    /// Averaged, Hann-windowed, half-overlapping segments
    #[default]
    Welch,
    /// Single periodogram over the whole signal
    Fft,
}

impl FromStr for PsdMethod {
    type Err = FuncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "welch" => Ok(PsdMethod::Welch),
            "fft" => Ok(PsdMethod::Fft),
            other => Err(FuncError::UnknownOption {
                kind: "psd_method",
                value: other.to_string(),
            }),
        }
    }
}

/// One-sided power spectral density
#[derive(Debug, Clone, Default)]
pub struct PowerSpectrum {
    /// Frequency of each bin (Hz)
    pub freqs: Vec<f64>,
    /// Density at each bin (unit²/Hz)
    pub psd: Vec<f64>,
}

impl PowerSpectrum {
    /// Iterate over (frequency, density) pairs
    pub fn bins(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.freqs.iter().copied().zip(self.psd.iter().copied())
    }

    /// Frequency resolution (Hz)
    pub fn resolution(&self) -> f64 {
        if self.freqs.len() < 2 {
            return 0.0;
        }
        self.freqs[1] - self.freqs[0]
    }
}

/// Periodic Hann window
fn hann(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| 0.5 - 0.5 * (2.0 * std::f64::consts::PI * i as f64 / n as f64).cos())
        .collect()
}

/// Estimate the PSD of a signal sampled at `sfreq`
pub fn power_spectrum(signal: &[f64], sfreq: f64, method: PsdMethod) -> Result<PowerSpectrum, FuncError> {
    if signal.len() < 2 {
        return Err(FuncError::too_short("power_spectrum", 2, signal.len()));
    }
    if !sfreq.is_finite() || sfreq <= 0.0 {
        return Err(FuncError::invalid("power_spectrum", "sfreq must be positive"));
    }

    let (segment, window) = match method {
        PsdMethod::Welch => {
            let segment = signal.len().min(WELCH_SEGMENT);
            (segment, hann(segment))
        }
        PsdMethod::Fft => (signal.len(), vec![1.0; signal.len()]),
    };
    let step = (segment - segment / 2).max(1);
    trace!(
        "PSD {:?}: {} samples, segment {}, step {}",
        method,
        signal.len(),
        segment,
        step
    );

    Ok(averaged_periodogram(signal, sfreq, segment, step, &window))
}

fn averaged_periodogram(signal: &[f64], sfreq: f64, segment: usize, step: usize, window: &[f64]) -> PowerSpectrum {
    let n_freqs = segment / 2 + 1;
    let scale = 1.0 / (sfreq * window.iter().map(|w| w * w).sum::<f64>());
    let fft = PLANNER.with(|planner| planner.borrow_mut().plan_fft_forward(segment));

    let mut psd = vec![0.0; n_freqs];
    let mut n_segments = 0usize;
    let mut buffer: Vec<Complex<f64>> = Vec::with_capacity(segment);

    let mut start = 0;
    while start + segment <= signal.len() {
        let chunk = &signal[start..start + segment];
        // Constant detrend before windowing
        let m = chunk.iter().sum::<f64>() / segment as f64;

        buffer.clear();
        buffer.extend(
            chunk
                .iter()
                .zip(window)
                .map(|(&v, &w)| Complex::new((v - m) * w, 0.0)),
        );
        fft.process(&mut buffer);

        for (acc, c) in psd.iter_mut().zip(&buffer) {
            *acc += c.norm_sqr();
        }
        n_segments += 1;
        start += step;
    }

    // Fold negative frequencies into the one-sided estimate
    let last = if segment % 2 == 0 { n_freqs - 1 } else { n_freqs };
    for (i, p) in psd.iter_mut().enumerate() {
        *p *= scale / n_segments as f64;
        if i > 0 && i < last {
            *p *= 2.0;
        }
    }

    let resolution = sfreq / segment as f64;
    PowerSpectrum {
        freqs: (0..n_freqs).map(|i| i as f64 * resolution).collect(),
        psd,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sine(n: usize, freq: f64, sfreq: f64) -> Vec<f64> {
        (0..n)
            .map(|i| (2.0 * std::f64::consts::PI * freq * i as f64 / sfreq).sin())
            .collect()
    }

    #[test]
    fn test_fft_sine_peak() {
        let spectrum = power_spectrum(&sine(256, 10.0, 100.0), 100.0, PsdMethod::Welch).unwrap();
        let (peak_freq, _) = spectrum
            .bins()
            .fold((0.0, f64::MIN), |best, (f, p)| if p > best.1 { (f, p) } else { best });
        assert!((peak_freq - 10.0).abs() < 1.0);
    }

    #[test]
    fn test_periodogram_parseval() {
        // Integrated one-sided density equals the signal variance
        let x = sine(512, 8.0, 128.0);
        let spectrum = power_spectrum(&x, 128.0, PsdMethod::Fft).unwrap();
        let total: f64 = spectrum.psd.iter().sum::<f64>() * spectrum.resolution();
        assert_relative_eq!(total, 0.5, max_relative = 1e-6);
    }

    #[test]
    fn test_welch_bins() {
        let spectrum = power_spectrum(&vec![0.5; 1000], 250.0, PsdMethod::Welch).unwrap();
        assert_eq!(spectrum.freqs.len(), WELCH_SEGMENT / 2 + 1);
        assert_eq!(spectrum.freqs.last().copied(), Some(125.0));
        // Constant input is removed by detrending
        assert!(spectrum.psd.iter().all(|p| p.abs() < 1e-20));
    }

    #[test]
    fn test_method_parsing() {
        assert_eq!("fft".parse::<PsdMethod>().unwrap(), PsdMethod::Fft);
        assert!("multitaper".parse::<PsdMethod>().is_err());
    }

    #[test]
    fn test_short_signal() {
        assert!(power_spectrum(&[1.0], 100.0, PsdMethod::Fft).is_err());
    }
}
