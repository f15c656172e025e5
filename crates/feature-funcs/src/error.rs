//! Kernel Error Types

use thiserror::Error;

/// Errors raised by a feature kernel
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FuncError {
    /// Not enough samples for the requested computation
    #[error("{func} needs at least {required} samples, got {actual}")]
    SignalTooShort {
        func: &'static str,
        required: usize,
        actual: usize,
    },

    /// Argument outside the kernel's domain
    #[error("invalid argument for {func}: {reason}")]
    InvalidArgument { func: &'static str, reason: String },

    /// Unrecognised option string
    #[error("unknown {kind} '{value}'")]
    UnknownOption { kind: &'static str, value: String },
}

impl FuncError {
    pub(crate) fn too_short(func: &'static str, required: usize, actual: usize) -> Self {
        FuncError::SignalTooShort {
            func,
            required,
            actual,
        }
    }

    pub(crate) fn invalid(func: &'static str, reason: impl Into<String>) -> Self {
        FuncError::InvalidArgument {
            func,
            reason: reason.into(),
        }
    }
}
