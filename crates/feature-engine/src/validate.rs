//! Input validation run before any feature is computed

use crate::error::{ExtractionError, Result};
use ndarray::ArrayView3;

/// Sampling frequency must be a positive finite number
pub fn validate_sfreq(sfreq: f64) -> Result<()> {
    if !sfreq.is_finite() || sfreq <= 0.0 {
        return Err(ExtractionError::InvalidSamplingRate(sfreq));
    }
    Ok(())
}

/// Band edges: at least two, finite, non-negative, strictly increasing.
///
/// With `check_nyquist`, the last edge may not exceed `sfreq / 2`.
pub fn validate_freq_bands(freq_bands: &[f64], sfreq: f64, check_nyquist: bool) -> Result<()> {
    if freq_bands.len() < 2 {
        return Err(ExtractionError::InvalidFrequencyBands(format!(
            "need at least 2 edges, got {}",
            freq_bands.len()
        )));
    }
    if let Some(f) = freq_bands.iter().find(|f| !f.is_finite() || **f < 0.0) {
        return Err(ExtractionError::InvalidFrequencyBands(format!(
            "edges must be finite and non-negative, got {}",
            f
        )));
    }
    if let Some(w) = freq_bands.windows(2).find(|w| w[1] <= w[0]) {
        return Err(ExtractionError::InvalidFrequencyBands(format!(
            "edges must be strictly increasing, got {} followed by {}",
            w[0], w[1]
        )));
    }

    let nyquist = sfreq / 2.0;
    if check_nyquist {
        if let Some(&last) = freq_bands.last().filter(|&&f| f > nyquist) {
            return Err(ExtractionError::InvalidFrequencyBands(format!(
                "edge {} Hz exceeds the Nyquist frequency {} Hz",
                last, nyquist
            )));
        }
    }
    Ok(())
}

/// Signal tensor must hold at least one sample per channel
pub fn validate_data(data: &ArrayView3<'_, f64>) -> Result<()> {
    if data.dim().2 == 0 {
        return Err(ExtractionError::InvalidShape {
            shape: data.shape().to_vec(),
            reason: "epochs contain no samples".to_string(),
        });
    }
    Ok(())
}

/// Channel names must match the channel count
pub fn validate_channel_names(names: &[String], n_channels: usize) -> Result<()> {
    if names.len() != n_channels {
        return Err(ExtractionError::ChannelNameMismatch {
            names: names.len(),
            channels: n_channels,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    #[test]
    fn test_sfreq() {
        assert!(validate_sfreq(256.0).is_ok());
        assert!(validate_sfreq(0.0).is_err());
        assert!(validate_sfreq(-0.1).is_err());
        assert!(validate_sfreq(f64::NAN).is_err());
    }

    #[test]
    fn test_freq_bands() {
        let bands = [0.1, 4.0, 8.0, 12.0, 30.0, 70.0];
        assert!(validate_freq_bands(&bands, 256.0, true).is_ok());
        assert!(validate_freq_bands(&[4.0], 256.0, false).is_err());
        assert!(validate_freq_bands(&[4.0, 4.0], 256.0, false).is_err());
        assert!(validate_freq_bands(&[8.0, 4.0], 256.0, false).is_err());
        assert!(validate_freq_bands(&[-1.0, 4.0], 256.0, false).is_err());
    }

    #[test]
    fn test_nyquist_only_when_requested() {
        let bands = [1.0, 100.0];
        assert!(validate_freq_bands(&bands, 128.0, false).is_ok());
        assert!(matches!(
            validate_freq_bands(&bands, 128.0, true),
            Err(ExtractionError::InvalidFrequencyBands(_))
        ));
    }

    #[test]
    fn test_data_without_samples() {
        let data = Array3::<f64>::zeros((2, 3, 0));
        assert!(validate_data(&data.view()).is_err());
        let data = Array3::<f64>::zeros((0, 3, 8));
        assert!(validate_data(&data.view()).is_ok());
    }

    #[test]
    fn test_channel_names() {
        let names = vec!["Fz".to_string(), "Cz".to_string()];
        assert!(validate_channel_names(&names, 2).is_ok());
        assert!(matches!(
            validate_channel_names(&names, 3),
            Err(ExtractionError::ChannelNameMismatch { names: 2, channels: 3 })
        ));
    }
}
