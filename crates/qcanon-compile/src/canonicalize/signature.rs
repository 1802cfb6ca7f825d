//! Subsystem signatures, term keys and tree flattening helpers.

use qcanon_ir::{Ladder, Operator, Pauli, Subsystem};
use serde::{Deserialize, Serialize};

use crate::error::{CompileError, CompileResult};

/// Ordered subsystem kinds spanned by `op`.
///
/// Sums, differences and products require both operands to span the same
/// signature.
pub fn subsystem_signature(op: &Operator) -> CompileResult<Vec<Subsystem>> {
    match op {
        Operator::Kron(a, b) => {
            let mut signature = subsystem_signature(a)?;
            signature.extend(subsystem_signature(b)?);
            Ok(signature)
        }
        Operator::Add(a, b) | Operator::Sub(a, b) | Operator::Mul(a, b) => {
            let left = subsystem_signature(a)?;
            let right = subsystem_signature(b)?;
            if left != right {
                return Err(CompileError::DimensionMismatch {
                    left: format_signature(&left),
                    right: format_signature(&right),
                });
            }
            Ok(left)
        }
        Operator::Scale(_, op) => subsystem_signature(op),
        terminal => Ok(terminal.subsystem().into_iter().collect()),
    }
}

/// Render a signature as `[qubit, mode]`.
pub fn format_signature(signature: &[Subsystem]) -> String {
    let kinds: Vec<&str> = signature
        .iter()
        .map(|s| match s {
            Subsystem::Qubit => "qubit",
            Subsystem::Mode => "mode",
        })
        .collect();
    format!("[{}]", kinds.join(", "))
}

/// Count `(qubits, modes)` in a signature.
pub fn signature_dims(signature: &[Subsystem]) -> (usize, usize) {
    let qubits = signature.iter().filter(|s| **s == Subsystem::Qubit).count();
    (qubits, signature.len() - qubits)
}

/// Key of one tensor factor of a canonical term.
///
/// Pauli factors order before ladder words; ladder words compare
/// lexicographically in normal order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FactorKey {
    /// A single Pauli terminal.
    Pauli(Pauli),
    /// A product of ladder terminals.
    Ladder(Vec<Ladder>),
}

/// Key of a canonical term: one entry per subsystem position.
pub type TermKey = Vec<FactorKey>;

/// Key of a term, ignoring its coefficient.
///
/// Returns `None` when a factor is neither a Pauli terminal nor a product of
/// ladder terminals.
pub fn term_key(op: &Operator) -> Option<TermKey> {
    let chain = match op {
        Operator::Scale(_, inner) => inner.as_ref(),
        other => other,
    };
    kron_factors(chain)
        .into_iter()
        .map(|factor| match factor.pauli() {
            Some(p) => Some(FactorKey::Pauli(p)),
            None => mul_factors(factor)
                .into_iter()
                .map(Operator::ladder)
                .collect::<Option<Vec<_>>>()
                .map(FactorKey::Ladder),
        })
        .collect()
}

fn flatten<'a>(
    op: &'a Operator,
    split: fn(&Operator) -> Option<(&Operator, &Operator)>,
    out: &mut Vec<&'a Operator>,
) {
    match split(op) {
        Some((a, b)) => {
            flatten(a, split, out);
            flatten(b, split, out);
        }
        None => out.push(op),
    }
}

fn split_add(op: &Operator) -> Option<(&Operator, &Operator)> {
    match op {
        Operator::Add(a, b) => Some((&**a, &**b)),
        _ => None,
    }
}

fn split_mul(op: &Operator) -> Option<(&Operator, &Operator)> {
    match op {
        Operator::Mul(a, b) => Some((&**a, &**b)),
        _ => None,
    }
}

fn split_kron(op: &Operator) -> Option<(&Operator, &Operator)> {
    match op {
        Operator::Kron(a, b) => Some((&**a, &**b)),
        _ => None,
    }
}

/// Additive terms, left to right.
pub fn add_terms(op: &Operator) -> Vec<&Operator> {
    let mut out = Vec::new();
    flatten(op, split_add, &mut out);
    out
}

/// Operands of a product chain, left to right.
pub fn mul_factors(op: &Operator) -> Vec<&Operator> {
    let mut out = Vec::new();
    flatten(op, split_mul, &mut out);
    out
}

/// Factors of a tensor product chain, left to right.
pub fn kron_factors(op: &Operator) -> Vec<&Operator> {
    let mut out = Vec::new();
    flatten(op, split_kron, &mut out);
    out
}

/// Subsystem of a tensor factor that is not itself a tensor product.
pub(crate) fn factor_subsystem(op: &Operator) -> Option<Subsystem> {
    match op {
        Operator::Mul(a, _) => factor_subsystem(a),
        Operator::Scale(_, inner) => factor_subsystem(inner),
        Operator::Kron(..) | Operator::Add(..) | Operator::Sub(..) => None,
        terminal => terminal.subsystem(),
    }
}
