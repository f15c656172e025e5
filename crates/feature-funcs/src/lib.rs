//! Feature Kernels
//!
//! Univariate statistical, complexity and spectral descriptors computed on a
//! single channel of a biosignal epoch. Every kernel takes a plain sample
//! slice plus typed arguments; parameter plumbing lives in `feature-engine`.

mod error;
mod linalg;

pub mod complexity;
pub mod psd;
pub mod spectral;
pub mod statistics;

pub use error::FuncError;
pub use psd::{power_spectrum, PowerSpectrum, PsdMethod};
pub use spectral::BandRatios;
pub use statistics::Moments;
