//! Error types for the IR crate.

use thiserror::Error;

/// Errors that can occur while building model values.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IrError {
    /// Evolution duration is negative, infinite or NaN.
    #[error("Invalid duration {duration} for gate '{gate_name}'")]
    InvalidDuration {
        /// Name of the evolved gate.
        gate_name: String,
        /// The rejected duration.
        duration: f64,
    },

    /// Gate name is empty.
    #[error("Gate name must not be empty")]
    EmptyGateName,
}

/// Result type for IR operations.
pub type IrResult<T> = Result<T, IrError>;
