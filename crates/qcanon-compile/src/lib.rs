//! qcanon Compilation Framework
//!
//! This crate rewrites operator expressions into a unique canonical form: a
//! left-nested sum of scaled, ordered tensor chains. It is built from small
//! pieces that compose the same way compiler passes do.
//!
//! # Overview
//!
//! 1. **Traversal**: [`traversal::Post`], [`traversal::Pre`],
//!    [`traversal::In`] and [`traversal::Level`] walk any [`Walk`] value
//!    (operators, math expressions, gates, circuits, vectors, maps, JSON)
//! 2. **Rules**: a [`RewriteRule`] maps nodes to nodes; a [`ConversionRule`]
//!    folds a tree into a foreign type
//! 3. **Passes**: [`WalkPass`], [`Chain`] and [`FixedPoint`] build inspectable
//!    pass trees
//! 4. **Math**: [`math`] normalizes and evaluates coefficient expressions
//! 5. **Canonicalization**: [`canonicalize`] is the operator pipeline
//! 6. **Dimensions**: [`dimension`] assigns and checks `(n_qreg, n_qmode)`
//!
//! # Architecture
//!
//! ```text
//! Operator / AnalogCircuit / observables
//!       |
//!       v
//! canonicalization_pass  (Chain of FixedPoint stages + verification)
//!       |
//!       +-- math normalization of every coefficient
//!       v
//! assign_analog_circuit_dim / verify_observables_dim
//!       |
//!       v
//! evolve_terms / compile_observables  (HamiltonianTerm lists)
//! ```
//!
//! # Example: Canonicalization
//!
//! ```rust
//! use num_complex::Complex64;
//! use qcanon_compile::analog_operator_canonicalization;
//! use qcanon_ir::Operator;
//!
//! let canonical = analog_operator_canonicalization(Operator::PauliX * Operator::PauliY).unwrap();
//! assert_eq!(canonical, Operator::PauliZ.scale(Complex64::i()));
//! ```
//!
//! # Example: Circuits
//!
//! ```rust
//! use qcanon_compile::{CanonicalizationConfig, compile_circuit, evolve_terms};
//! use qcanon_ir::{AnalogCircuit, AnalogGate, MathExpr, Operator};
//!
//! let h = Operator::PauliZ.kron(Operator::Creation * Operator::Annihilation)
//!     .scale(MathExpr::var("chi"));
//! let mut circuit = AnalogCircuit::new("dispersive");
//! circuit.evolve(AnalogGate::new("chi", h).unwrap(), 2.0).unwrap();
//!
//! let compiled = compile_circuit(circuit, &CanonicalizationConfig::default()).unwrap();
//! assert_eq!(compiled.dims(), Some((1, 1)));
//! assert_eq!(evolve_terms(&compiled).unwrap()[0].len(), 1);
//! ```
//!
//! # Custom Rules
//!
//! Implement [`RewriteRule`] for the node kinds you care about and wrap it in a
//! pass:
//!
//! ```rust
//! use qcanon_compile::{CompileResult, FixedPoint, Pass, RewriteRule, WalkPass};
//! use qcanon_ir::Operator;
//!
//! #[derive(Clone)]
//! struct DropMinus;
//!
//! impl RewriteRule for DropMinus {
//!     fn map_operator(&mut self, op: &Operator) -> CompileResult<Option<Operator>> {
//!         Ok(match op {
//!             Operator::PauliMinus => Some(Operator::PauliI),
//!             _ => None,
//!         })
//!     }
//! }
//!
//! let pass: FixedPoint<Operator> = FixedPoint::new(WalkPass::post(DropMinus));
//! let out = pass.run(Operator::PauliMinus.kron(Operator::PauliX)).unwrap();
//! assert_eq!(out, Operator::PauliI.kron(Operator::PauliX));
//! ```

pub mod canonicalize;
pub mod config;
pub mod dimension;
pub mod error;
pub mod hamiltonian;
pub mod math;
pub mod pass;
pub mod rule;
pub mod traversal;

pub use canonicalize::{analog_operator_canonicalization, canonicalization_pass, canonicalize_with};
pub use config::{CanonicalizationConfig, EvaluatorConfig};
pub use dimension::{assign_analog_circuit_dim, verify_observables_dim};
pub use error::{CompileError, CompileResult, EvaluationError};
pub use hamiltonian::{
    HamiltonianTerm, compile_circuit, compile_observables, evolve_terms, hamiltonian_terms,
};
pub use math::{evaluate, evaluate_str, normalize_math, textual_form};
pub use pass::{Chain, Convergence, FixedPoint, Pass, PassKind, Strategy, WalkPass, describe_pass};
pub use rule::{ConversionRule, RewriteRule};
pub use traversal::{Walk, convert};
