//! Math-expression text front-end for qcanon
//!
//! Coefficients of operator terms may be written as text (for example a
//! time-dependent drive amplitude `"omega * cos(2 * pi * t)"`). This crate
//! turns such text into [`qcanon_ir::MathExpr`] trees.
//!
//! # Grammar
//!
//! | Construct | Example |
//! |-----------|---------|
//! | Literals | `3`, `0.25`, `1e-3`, `.5` |
//! | Constants | `pi`, `i` (imaginary unit) |
//! | Variables | `t`, `omega_1` |
//! | Arithmetic | `+ - * /`, unary `-` |
//! | Powers | `x**2`, `x^2` (right associative) |
//! | Functions | `sin cos tan exp log sqrt sinh cosh tanh asin acos atan abs conj` |
//!
//! # Example
//!
//! ```rust
//! use qcanon_ir::MathExpr;
//! use qcanon_parse::parse_math;
//!
//! let expr = parse_math("2*3 + 5*i").unwrap();
//! assert_eq!(
//!     expr,
//!     MathExpr::real(2.0) * MathExpr::real(3.0) + MathExpr::real(5.0) * MathExpr::imag()
//! );
//! ```

pub mod error;
pub mod lexer;
mod parser;

pub use error::{ParseError, ParseResult};
pub use parser::parse_math;
