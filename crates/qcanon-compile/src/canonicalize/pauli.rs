//! Pauli algebra and ordering of tensor factors.

use num_complex::Complex64;
use qcanon_ir::{Operator, Pauli, Subsystem};

use crate::canonicalize::signature::{factor_subsystem, kron_factors, subsystem_signature};
use crate::error::CompileResult;
use crate::rule::RewriteRule;

/// Product of two Pauli matrices as `(phase, pauli)`.
pub fn pauli_product(a: Pauli, b: Pauli) -> (Complex64, Pauli) {
    let one = Complex64::new(1.0, 0.0);
    let i = Complex64::i();
    match (a, b) {
        (Pauli::I, p) | (p, Pauli::I) => (one, p),
        (p, q) if p == q => (one, Pauli::I),
        (Pauli::X, Pauli::Y) => (i, Pauli::Z),
        (Pauli::Y, Pauli::X) => (-i, Pauli::Z),
        (Pauli::Y, Pauli::Z) => (i, Pauli::X),
        (Pauli::Z, Pauli::Y) => (-i, Pauli::X),
        (Pauli::Z, Pauli::X) => (i, Pauli::Y),
        (Pauli::X, Pauli::Z) => (-i, Pauli::Y),
        _ => (one, Pauli::I),
    }
}

/// Splits products of tensor chains position by position and collapses
/// products of Pauli terminals.
#[derive(Debug, Clone, Copy, Default)]
pub struct PauliAlgebra;

impl PauliAlgebra {
    /// `(a1 ⊗ … ⊗ an)(b1 ⊗ … ⊗ bn) → (a1 b1) ⊗ … ⊗ (an bn)` when every position
    /// spans the same subsystems.
    fn mul_over_kron(a: &Operator, b: &Operator) -> Option<Operator> {
        let left = kron_factors(a);
        let right = kron_factors(b);
        if left.len() != right.len() || left.len() < 2 {
            return None;
        }
        let aligned = left.iter().zip(&right).all(|(x, y)| {
            matches!(
                (subsystem_signature(x), subsystem_signature(y)),
                (Ok(sx), Ok(sy)) if sx == sy
            )
        });
        if !aligned {
            return None;
        }
        Operator::kron_chain(
            left.into_iter()
                .zip(right)
                .map(|(x, y)| x.clone() * y.clone()),
        )
    }
}

impl RewriteRule for PauliAlgebra {
    fn map_operator(&mut self, op: &Operator) -> CompileResult<Option<Operator>> {
        let Operator::Mul(a, b) = op else {
            return Ok(None);
        };
        if let (Some(p), Some(q)) = (a.pauli(), b.pauli()) {
            let (phase, pauli) = pauli_product(p, q);
            let product = Operator::from(pauli);
            return Ok(Some(if phase == Complex64::new(1.0, 0.0) {
                product
            } else {
                product.scale(phase)
            }));
        }
        Ok(Self::mul_over_kron(a, b))
    }
}

/// Re-associates tensor chains to the left and moves qubit factors before
/// mode factors.
#[derive(Debug, Clone, Copy, Default)]
pub struct GatherPauli;

impl RewriteRule for GatherPauli {
    fn map_operator(&mut self, op: &Operator) -> CompileResult<Option<Operator>> {
        let Operator::Kron(a, b) = op else {
            return Ok(None);
        };
        if let Operator::Kron(x, y) = b.as_ref() {
            return Ok(Some(
                a.as_ref().clone().kron(x.as_ref().clone()).kron(y.as_ref().clone()),
            ));
        }
        if factor_subsystem(b) != Some(Subsystem::Qubit) {
            return Ok(None);
        }
        Ok(match a.as_ref() {
            Operator::Kron(x, m) if factor_subsystem(m) == Some(Subsystem::Mode) => Some(
                x.as_ref()
                    .clone()
                    .kron(b.as_ref().clone())
                    .kron(m.as_ref().clone()),
            ),
            m if factor_subsystem(m) == Some(Subsystem::Mode) => {
                Some(b.as_ref().clone().kron(m.clone()))
            }
            _ => None,
        })
    }
}
