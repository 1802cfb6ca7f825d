//! qcanon Intermediate Representation
//!
//! This crate provides the data model shared by the qcanon compiler passes:
//! operator expression trees, scalar math expressions used as coefficients,
//! and analog gates/circuits that carry Hamiltonians.
//!
//! # Core Components
//!
//! - **Operators**: [`Operator`] terminals (Pauli, ladder) and combinators
//!   (sum, difference, product, tensor product, scalar multiple)
//! - **Math expressions**: [`MathExpr`] complex literals, variables,
//!   arithmetic, [`MathFunc`] functions and raw text
//! - **Circuits**: [`AnalogGate`], [`Statement`], [`AnalogCircuit`]
//!
//! # Example: Building a Hamiltonian
//!
//! ```rust
//! use qcanon_ir::{AnalogCircuit, AnalogGate, MathExpr, Operator};
//!
//! // H = ω/2 · Z⊗Id + g · (X⊗C + X⊗A)
//! let omega = MathExpr::var("omega") / MathExpr::real(2.0);
//! let g = MathExpr::var("g");
//! let hamiltonian = Operator::PauliZ.kron(Operator::Identity).scale(omega)
//!     + (Operator::PauliX.kron(Operator::Creation)
//!         + Operator::PauliX.kron(Operator::Annihilation))
//!         .scale(g);
//!
//! let mut circuit = AnalogCircuit::new("jaynes_cummings");
//! circuit.initialize();
//! circuit
//!     .evolve(AnalogGate::new("jc", hamiltonian).unwrap(), 1.0)
//!     .unwrap();
//! circuit.measure();
//!
//! assert_eq!(circuit.gates().count(), 1);
//! assert!(circuit.n_qreg.is_none());
//! ```

pub mod circuit;
pub mod error;
pub mod math;
pub mod operator;

pub use circuit::{AnalogCircuit, AnalogGate, Statement};
pub use error::{IrError, IrResult};
pub use math::{MathExpr, MathFunc};
pub use operator::{Ladder, Operator, Pauli, Subsystem};
