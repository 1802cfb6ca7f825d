//! Operator expression trees.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::math::MathExpr;

/// Kind of subsystem an operator acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Subsystem {
    /// A two-level system addressed by Pauli operators.
    Qubit,
    /// A harmonic-oscillator mode addressed by ladder operators.
    Mode,
}

/// Pauli terminal kinds, in canonical sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Pauli {
    I,
    X,
    Y,
    Z,
}

/// Ladder terminal kinds, in normal order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Ladder {
    Creation,
    Identity,
    Annihilation,
}

/// A quantum operator expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operator {
    /// Pauli identity.
    PauliI,
    /// Pauli-X.
    PauliX,
    /// Pauli-Y.
    PauliY,
    /// Pauli-Z.
    PauliZ,
    /// Raising operator σ+.
    PauliPlus,
    /// Lowering operator σ-.
    PauliMinus,
    /// Bosonic creation operator.
    Creation,
    /// Bosonic annihilation operator.
    Annihilation,
    /// Identity on a ladder (mode) subsystem.
    Identity,
    /// Sum.
    Add(Box<Operator>, Box<Operator>),
    /// Difference.
    Sub(Box<Operator>, Box<Operator>),
    /// Composition on the same subsystems.
    Mul(Box<Operator>, Box<Operator>),
    /// Tensor product.
    Kron(Box<Operator>, Box<Operator>),
    /// Scalar multiple.
    Scale(MathExpr, Box<Operator>),
}

impl Operator {
    /// Tensor product `self ⊗ rhs`.
    #[must_use]
    pub fn kron(self, rhs: Operator) -> Self {
        Operator::Kron(Box::new(self), Box::new(rhs))
    }

    /// Scale by a coefficient.
    #[must_use]
    pub fn scale(self, coefficient: impl Into<MathExpr>) -> Self {
        Operator::Scale(coefficient.into(), Box::new(self))
    }

    /// Left-nested tensor product of `factors`.
    ///
    /// Returns `None` for an empty iterator.
    pub fn kron_chain(factors: impl IntoIterator<Item = Operator>) -> Option<Self> {
        factors.into_iter().reduce(Operator::kron)
    }

    /// Left-nested sum of `terms`.
    pub fn sum(terms: impl IntoIterator<Item = Operator>) -> Option<Self> {
        terms
            .into_iter()
            .reduce(|a, b| Operator::Add(Box::new(a), Box::new(b)))
    }

    /// Check whether this node has no children.
    pub fn is_terminal(&self) -> bool {
        self.subsystem().is_some()
    }

    /// Subsystem kind of a terminal; `None` for combinators.
    pub fn subsystem(&self) -> Option<Subsystem> {
        match self {
            Operator::PauliI
            | Operator::PauliX
            | Operator::PauliY
            | Operator::PauliZ
            | Operator::PauliPlus
            | Operator::PauliMinus => Some(Subsystem::Qubit),
            Operator::Creation | Operator::Annihilation | Operator::Identity => {
                Some(Subsystem::Mode)
            }
            _ => None,
        }
    }

    /// The Pauli kind of a hermitian Pauli terminal.
    pub fn pauli(&self) -> Option<Pauli> {
        match self {
            Operator::PauliI => Some(Pauli::I),
            Operator::PauliX => Some(Pauli::X),
            Operator::PauliY => Some(Pauli::Y),
            Operator::PauliZ => Some(Pauli::Z),
            _ => None,
        }
    }

    /// The ladder kind of a mode terminal.
    pub fn ladder(&self) -> Option<Ladder> {
        match self {
            Operator::Creation => Some(Ladder::Creation),
            Operator::Identity => Some(Ladder::Identity),
            Operator::Annihilation => Some(Ladder::Annihilation),
            _ => None,
        }
    }

    /// Count of operator nodes in the tree.
    pub fn size(&self) -> usize {
        match self {
            Operator::Add(a, b)
            | Operator::Sub(a, b)
            | Operator::Mul(a, b)
            | Operator::Kron(a, b) => 1 + a.size() + b.size(),
            Operator::Scale(_, op) => 1 + op.size(),
            _ => 1,
        }
    }
}

impl From<Pauli> for Operator {
    fn from(pauli: Pauli) -> Self {
        match pauli {
            Pauli::I => Operator::PauliI,
            Pauli::X => Operator::PauliX,
            Pauli::Y => Operator::PauliY,
            Pauli::Z => Operator::PauliZ,
        }
    }
}

impl From<Ladder> for Operator {
    fn from(ladder: Ladder) -> Self {
        match ladder {
            Ladder::Creation => Operator::Creation,
            Ladder::Identity => Operator::Identity,
            Ladder::Annihilation => Operator::Annihilation,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operator::PauliI => write!(f, "I"),
            Operator::PauliX => write!(f, "X"),
            Operator::PauliY => write!(f, "Y"),
            Operator::PauliZ => write!(f, "Z"),
            Operator::PauliPlus => write!(f, "S+"),
            Operator::PauliMinus => write!(f, "S-"),
            Operator::Creation => write!(f, "C"),
            Operator::Annihilation => write!(f, "A"),
            Operator::Identity => write!(f, "Id"),
            Operator::Add(a, b) => write!(f, "({a} + {b})"),
            Operator::Sub(a, b) => write!(f, "({a} - {b})"),
            Operator::Mul(a, b) => write!(f, "({a} * {b})"),
            Operator::Kron(a, b) => write!(f, "({a} @ {b})"),
            Operator::Scale(c, op) => write!(f, "[{c}] {op}"),
        }
    }
}

impl std::ops::Add for Operator {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Operator::Add(Box::new(self), Box::new(rhs))
    }
}

impl std::ops::Sub for Operator {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Operator::Sub(Box::new(self), Box::new(rhs))
    }
}

impl std::ops::Mul for Operator {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        Operator::Mul(Box::new(self), Box::new(rhs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kron_chain_is_left_nested() {
        let chain = Operator::kron_chain([Operator::PauliX, Operator::PauliY, Operator::Creation])
            .unwrap();
        assert_eq!(
            chain,
            Operator::PauliX
                .kron(Operator::PauliY)
                .kron(Operator::Creation)
        );
        assert!(Operator::kron_chain(Vec::new()).is_none());
    }

    #[test]
    fn test_terminal_kinds() {
        assert_eq!(Operator::PauliPlus.subsystem(), Some(Subsystem::Qubit));
        assert_eq!(Operator::Identity.subsystem(), Some(Subsystem::Mode));
        assert_eq!((Operator::PauliX + Operator::PauliY).subsystem(), None);
        assert_eq!(Operator::PauliPlus.pauli(), None);
        assert_eq!(Operator::Annihilation.ladder(), Some(Ladder::Annihilation));
    }

    #[test]
    fn test_ladder_order() {
        assert!(Ladder::Creation < Ladder::Identity);
        assert!(Ladder::Identity < Ladder::Annihilation);
        assert!(Pauli::I < Pauli::X && Pauli::Y < Pauli::Z);
    }

    #[test]
    fn test_display() {
        let op = (Operator::PauliX.kron(Operator::Creation)).scale(2.0) - Operator::PauliZ.kron(Operator::Identity);
        assert_eq!(op.to_string(), "([2] (X @ C) - (Z @ Id))");
        assert_eq!(op.size(), 8);
    }

    #[test]
    fn test_serde_roundtrip() {
        let op = Operator::PauliX.kron(Operator::Annihilation).scale(MathExpr::var("g"));
        let json = serde_json::to_string(&op).unwrap();
        let back: Operator = serde_json::from_str(&json).unwrap();
        assert_eq!(op, back);
    }
}
