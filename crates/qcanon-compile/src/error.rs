//! Error types for the compile crate.

use qcanon_parse::ParseError;
use thiserror::Error;

/// Errors raised while evaluating math expressions.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum EvaluationError {
    /// A variable has no binding.
    #[error("Variable '{0}' is unbound")]
    UnboundVariable(String),

    /// A division by an exact zero.
    #[error("Division by zero in '{0}'")]
    DivisionByZero(String),

    /// Raw text could not be parsed.
    #[error("Malformed expression: {0}")]
    Malformed(#[from] ParseError),
}

/// Errors that can occur during compilation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CompileError {
    /// Operands of a sum or product span different subsystems.
    #[error("Hilbert space dimension mismatch: {left} vs {right}")]
    DimensionMismatch {
        /// Signature of the left operand.
        left: String,
        /// Signature of the right operand.
        right: String,
    },

    /// A conversion rule met a node kind it cannot handle.
    #[error("Rule '{rule}' does not support node {node}")]
    UnsupportedNode {
        /// Name of the rule.
        rule: String,
        /// The rejected node.
        node: String,
    },

    /// A postcondition check failed after its rewrite stage.
    #[error("Verification '{pass}' failed: {detail}")]
    VerificationFailed {
        /// Name of the verification rule.
        pass: String,
        /// What was violated.
        detail: String,
    },

    /// Two gates of one circuit address different subsystem counts.
    #[error(
        "Gate '{gate}' spans {found_qreg} qubit(s) and {found_qmode} mode(s), circuit has {n_qreg} and {n_qmode}"
    )]
    InconsistentCircuitDim {
        /// Name of the offending gate.
        gate: String,
        /// Qubit count assigned to the circuit.
        n_qreg: usize,
        /// Mode count assigned to the circuit.
        n_qmode: usize,
        /// Qubit count of the offending term.
        found_qreg: usize,
        /// Mode count of the offending term.
        found_qmode: usize,
    },

    /// An auxiliary operator does not match the circuit.
    #[error(
        "Observable '{name}' spans {found_qreg} qubit(s) and {found_qmode} mode(s), circuit has {n_qreg} and {n_qmode}"
    )]
    ObservableDimMismatch {
        /// Name of the observable.
        name: String,
        /// Qubit count assigned to the circuit.
        n_qreg: usize,
        /// Mode count assigned to the circuit.
        n_qmode: usize,
        /// Qubit count of the observable.
        found_qreg: usize,
        /// Mode count of the observable.
        found_qmode: usize,
    },

    /// Dimensions were required before dimension assignment ran.
    #[error("Circuit '{0}' has no assigned dimensions")]
    UnassignedDimensions(String),

    /// Math evaluation failed.
    #[error("Evaluation error: {0}")]
    Evaluation(#[from] EvaluationError),
}

impl CompileError {
    /// Check whether the error is caused by the input rather than by a rule.
    pub fn is_malformed_input(&self) -> bool {
        matches!(
            self,
            CompileError::DimensionMismatch { .. }
                | CompileError::UnsupportedNode { .. }
                | CompileError::InconsistentCircuitDim { .. }
                | CompileError::ObservableDimMismatch { .. }
                | CompileError::UnassignedDimensions(_)
        )
    }

    /// Check whether the error reports a broken rewrite rule.
    pub fn is_internal(&self) -> bool {
        matches!(self, CompileError::VerificationFailed { .. })
    }

    pub(crate) fn verification(pass: &str, detail: impl Into<String>) -> Self {
        CompileError::VerificationFailed {
            pass: pass.to_string(),
            detail: detail.into(),
        }
    }
}

impl From<ParseError> for CompileError {
    fn from(err: ParseError) -> Self {
        CompileError::Evaluation(EvaluationError::Malformed(err))
    }
}

/// Result type for compilation operations.
pub type CompileResult<T> = Result<T, CompileError>;
