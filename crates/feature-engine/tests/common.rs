/// Shared helpers for synthetic signal generation.
use ndarray::Array3;

pub const SFREQ: f64 = 256.0;
pub const FREQ_BANDS: [f64; 6] = [0.1, 4.0, 8.0, 12.0, 30.0, 70.0];

/// Deterministic xorshift64* generator
pub struct Rng(u64);

impl Rng {
    pub fn new(seed: u64) -> Self {
        Self(seed.max(1))
    }

    /// Uniform in (0, 1]
    pub fn uniform(&mut self) -> f64 {
        self.0 ^= self.0 >> 12;
        self.0 ^= self.0 << 25;
        self.0 ^= self.0 >> 27;
        let bits = self.0.wrapping_mul(0x2545_F491_4F6C_DD1D) >> 11;
        (bits as f64 + 1.0) / (1u64 << 53) as f64
    }

    /// Standard normal via Box-Muller
    pub fn normal(&mut self) -> f64 {
        let u1 = self.uniform();
        let u2 = self.uniform();
        (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
    }
}

#[allow(unused)]
/// `(n_epochs, n_channels, n_times)` tensor of standard-normal samples
pub fn random_data(shape: (usize, usize, usize), seed: u64) -> Array3<f64> {
    let mut rng = Rng::new(seed);
    Array3::from_shape_simple_fn(shape, || rng.normal())
}

#[allow(unused)]
/// Every channel carries a sine at `freq` Hz with a channel-dependent phase
pub fn sine_data(shape: (usize, usize, usize), freq: f64) -> Array3<f64> {
    Array3::from_shape_fn(shape, |(_, c, t)| {
        (2.0 * std::f64::consts::PI * freq * t as f64 / SFREQ + c as f64).sin()
    })
}
