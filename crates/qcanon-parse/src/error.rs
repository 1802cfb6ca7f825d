//! Error types for the expression parser.

use thiserror::Error;

/// Errors that can occur during parsing.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// Lexer error (invalid token).
    #[error("Lexer error at position {position}: {message}")]
    LexerError { position: usize, message: String },

    /// Unexpected token.
    #[error("Unexpected token at position {position}: expected {expected}, found {found}")]
    UnexpectedToken {
        position: usize,
        expected: String,
        found: String,
    },

    /// Unexpected end of input.
    #[error("Unexpected end of input: {0}")]
    UnexpectedEof(String),

    /// Call of a function that does not exist.
    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    /// Input left over after a complete expression.
    #[error("Trailing input at position {position}: {found}")]
    TrailingInput { position: usize, found: String },
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;
