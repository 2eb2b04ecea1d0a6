//! Error types for animated_number

use thiserror::Error;

/// Errors that can occur when configuring an animated number widget
///
/// The widget has no I/O of its own, so configuration validation is the only
/// fallible surface. Timer cancellation against an already-fired timer is a
/// no-op, not an error.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnimatedNumberError {
    /// `steps` must be greater than zero, otherwise the per-leg step size is
    /// infinite or the animation direction flips
    #[error("invalid steps: {0} (must be greater than zero)")]
    InvalidSteps(u32),

    /// `time` is the per-tick delay in milliseconds and must be finite and
    /// greater than zero
    #[error("invalid time: {0} ms (must be finite and greater than zero)")]
    InvalidTime(f64),
}

/// Result type for animated_number operations
pub type Result<T> = std::result::Result<T, AnimatedNumberError>;
