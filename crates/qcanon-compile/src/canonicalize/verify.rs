//! Postcondition checks of the canonicalization stages.
//!
//! Each rule inspects nodes and fails with
//! [`CompileError::VerificationFailed`] when its stage left something behind.
//! None of them rewrites anything.

use qcanon_ir::{MathExpr, Operator, Subsystem};

use crate::canonicalize::signature::{add_terms, factor_subsystem, subsystem_signature, term_key};
use crate::error::{CompileError, CompileResult};
use crate::math::rules::{add_terms as math_terms, mul_factors as math_factors};
use crate::rule::RewriteRule;

fn fail<T>(rule: &str, detail: String) -> CompileResult<T> {
    Err(CompileError::verification(rule, detail))
}

fn product_operands(op: &Operator) -> Option<(&Operator, &Operator)> {
    match op {
        Operator::Mul(a, b) | Operator::Kron(a, b) => Some((a, b)),
        _ => None,
    }
}

/// No differences, no `σ±`, no sum below a product or a scaling.
#[derive(Debug, Clone, Copy, Default)]
pub struct VerifyDistributed;

impl RewriteRule for VerifyDistributed {
    fn map_operator(&mut self, op: &Operator) -> CompileResult<Option<Operator>> {
        let distributed = match op {
            Operator::Sub(..) | Operator::PauliPlus | Operator::PauliMinus => false,
            Operator::Mul(a, b) | Operator::Kron(a, b) => {
                !matches!(**a, Operator::Add(..)) && !matches!(**b, Operator::Add(..))
            }
            Operator::Scale(_, inner) => !matches!(**inner, Operator::Add(..)),
            _ => true,
        };
        if distributed {
            Ok(None)
        } else {
            fail(self.name(), format!("{op} is not distributed"))
        }
    }
}

/// No scaling below a product or directly below another scaling.
#[derive(Debug, Clone, Copy, Default)]
pub struct VerifyGathered;

impl RewriteRule for VerifyGathered {
    fn map_operator(&mut self, op: &Operator) -> CompileResult<Option<Operator>> {
        let nested = match op {
            Operator::Scale(_, inner) => matches!(**inner, Operator::Scale(..)),
            _ => product_operands(op).is_some_and(|(a, b)| {
                matches!(a, Operator::Scale(..)) || matches!(b, Operator::Scale(..))
            }),
        };
        if nested {
            fail(self.name(), format!("coefficient not gathered in {op}"))
        } else {
            Ok(None)
        }
    }
}

/// Every sum and product spans one subsystem signature.
///
/// Raises [`CompileError::DimensionMismatch`], which reports malformed input
/// rather than a broken stage. The last signature checked stays available.
#[derive(Debug, Clone, Default)]
pub struct VerifyHilbertSpaceDim {
    signature: Option<Vec<Subsystem>>,
}

impl VerifyHilbertSpaceDim {
    /// Signature of the last combinator visited.
    pub fn signature(&self) -> Option<&[Subsystem]> {
        self.signature.as_deref()
    }
}

impl RewriteRule for VerifyHilbertSpaceDim {
    fn map_operator(&mut self, op: &Operator) -> CompileResult<Option<Operator>> {
        if matches!(
            op,
            Operator::Add(..) | Operator::Sub(..) | Operator::Mul(..) | Operator::Kron(..)
        ) {
            self.signature = Some(subsystem_signature(op)?);
        }
        Ok(None)
    }
}

/// No product of tensor chains or of Pauli terminals, no `σ±`.
#[derive(Debug, Clone, Copy, Default)]
pub struct VerifyPauliAlgebra;

impl RewriteRule for VerifyPauliAlgebra {
    fn map_operator(&mut self, op: &Operator) -> CompileResult<Option<Operator>> {
        let reduced = match op {
            Operator::PauliPlus | Operator::PauliMinus => false,
            Operator::Mul(a, b) => [a, b].iter().all(|x| {
                !matches!(***x, Operator::Kron(..)) && x.subsystem() != Some(Subsystem::Qubit)
            }),
            _ => true,
        };
        if reduced {
            Ok(None)
        } else {
            fail(self.name(), format!("{op} is not reduced"))
        }
    }
}

/// Tensor chains are left-nested with qubit factors before mode factors.
#[derive(Debug, Clone, Copy, Default)]
pub struct VerifyGatherPauli;

impl RewriteRule for VerifyGatherPauli {
    fn map_operator(&mut self, op: &Operator) -> CompileResult<Option<Operator>> {
        let Operator::Kron(a, b) = op else {
            return Ok(None);
        };
        if matches!(**b, Operator::Kron(..)) {
            return fail(self.name(), format!("{op} is not left-nested"));
        }
        let last = match a.as_ref() {
            Operator::Kron(_, last) => last,
            _ => a,
        };
        if factor_subsystem(last) == Some(Subsystem::Mode)
            && factor_subsystem(b) == Some(Subsystem::Qubit)
        {
            return fail(self.name(), format!("qubit factor after mode factor in {op}"));
        }
        Ok(None)
    }
}

/// Ladder products are left-nested and in normal order.
#[derive(Debug, Clone, Copy, Default)]
pub struct VerifyNormalOrder;

impl RewriteRule for VerifyNormalOrder {
    fn map_operator(&mut self, op: &Operator) -> CompileResult<Option<Operator>> {
        let Operator::Mul(a, b) = op else {
            return Ok(None);
        };
        if matches!(**b, Operator::Mul(..)) {
            return fail(self.name(), format!("{op} is not left-nested"));
        }
        let last = match a.as_ref() {
            Operator::Mul(_, last) => last,
            _ => a,
        };
        match (last.ladder(), b.ladder()) {
            (Some(x), Some(y)) if x > y => fail(self.name(), format!("{op} is not normal-ordered")),
            _ => Ok(None),
        }
    }
}

/// No ladder identity inside a product.
#[derive(Debug, Clone, Copy, Default)]
pub struct VerifyPrunedIdentity;

impl RewriteRule for VerifyPrunedIdentity {
    fn map_operator(&mut self, op: &Operator) -> CompileResult<Option<Operator>> {
        match op {
            Operator::Mul(a, b) if **a == Operator::Identity || **b == Operator::Identity => {
                fail(self.name(), format!("identity left in {op}"))
            }
            _ => Ok(None),
        }
    }
}

/// Every additive term is scaled. Pre-order; descends through sums only.
#[derive(Debug, Clone, Copy, Default)]
pub struct VerifyScaledTerms;

impl RewriteRule for VerifyScaledTerms {
    fn map_operator(&mut self, op: &Operator) -> CompileResult<Option<Operator>> {
        match op {
            Operator::Add(..) | Operator::Scale(..) => Ok(None),
            term => fail(self.name(), format!("unscaled term {term}")),
        }
    }

    fn descend_operator(&self, op: &Operator) -> bool {
        matches!(op, Operator::Add(..))
    }
}

/// Sums hold scaled terms with strictly increasing keys. Pre-order.
#[derive(Debug, Clone, Copy, Default)]
pub struct VerifySortedOrder;

impl RewriteRule for VerifySortedOrder {
    fn map_operator(&mut self, op: &Operator) -> CompileResult<Option<Operator>> {
        if !matches!(op, Operator::Add(..)) {
            return Ok(None);
        }
        let mut previous = None;
        for term in add_terms(op) {
            if !matches!(term, Operator::Scale(..)) {
                return fail(self.name(), format!("unscaled term {term}"));
            }
            let Some(key) = term_key(term) else {
                return fail(self.name(), format!("term {term} has no key"));
            };
            if previous.as_ref().is_some_and(|p| *p >= key) {
                return fail(self.name(), format!("term {term} is out of order"));
            }
            previous = Some(key);
        }
        Ok(None)
    }

    fn descend_operator(&self, op: &Operator) -> bool {
        !matches!(op, Operator::Add(..))
    }
}

/// Associative operators are left-nested and math operands are sorted.
#[derive(Debug, Clone, Copy, Default)]
pub struct VerifyProperOrder;

impl RewriteRule for VerifyProperOrder {
    fn map_operator(&mut self, op: &Operator) -> CompileResult<Option<Operator>> {
        let right_nested = match op {
            Operator::Add(_, b) => matches!(**b, Operator::Add(..)),
            Operator::Mul(_, b) => matches!(**b, Operator::Mul(..)),
            Operator::Kron(_, b) => matches!(**b, Operator::Kron(..)),
            _ => false,
        };
        if right_nested {
            fail(self.name(), format!("{op} is not left-nested"))
        } else {
            Ok(None)
        }
    }

    fn map_math(&mut self, expr: &MathExpr) -> CompileResult<Option<MathExpr>> {
        let operands = match expr {
            MathExpr::Add(_, b) if matches!(**b, MathExpr::Add(..)) => None,
            MathExpr::Mul(_, b) if matches!(**b, MathExpr::Mul(..)) => None,
            MathExpr::Add(..) => Some(math_terms(expr)),
            MathExpr::Mul(..) => Some(math_factors(expr)),
            _ => return Ok(None),
        };
        let Some(operands) = operands else {
            return fail(self.name(), format!("{expr} is not left-nested"));
        };
        if operands
            .windows(2)
            .any(|pair| pair[0].order_key() > pair[1].order_key())
        {
            return fail(self.name(), format!("operands of {expr} are not sorted"));
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traversal::{In, Post, Pre};

    fn check<R: RewriteRule>(rule: R, op: Operator) -> CompileResult<Operator> {
        Post::new(rule).run(op)
    }

    fn is_verification_failure(result: CompileResult<Operator>) -> bool {
        matches!(result, Err(ref e) if e.is_internal())
    }

    #[test]
    fn test_verify_distributed() {
        assert!(check(VerifyDistributed, Operator::PauliX + Operator::PauliZ.scale(-1.0)).is_ok());
        assert!(is_verification_failure(check(
            VerifyDistributed,
            Operator::PauliX - Operator::PauliZ
        )));
        assert!(is_verification_failure(check(
            VerifyDistributed,
            (Operator::PauliX + Operator::PauliY).kron(Operator::PauliZ)
        )));
    }

    #[test]
    fn test_verify_gathered() {
        assert!(is_verification_failure(check(
            VerifyGathered,
            Operator::PauliX.kron(Operator::PauliY.scale(2.0))
        )));
        assert!(check(VerifyGathered, Operator::PauliX.kron(Operator::PauliY).scale(2.0)).is_ok());
    }

    #[test]
    fn test_verify_dimension_records_signature() {
        let mut walk = In::new(VerifyHilbertSpaceDim::default(), true);
        walk.run(Operator::PauliX.kron(Operator::Creation)).unwrap();
        assert_eq!(
            walk.rule().signature(),
            Some(&[Subsystem::Qubit, Subsystem::Mode][..])
        );

        let mut walk = In::new(VerifyHilbertSpaceDim::default(), true);
        let err = walk
            .run(Operator::PauliX.kron(Operator::PauliZ) + Operator::PauliY)
            .unwrap_err();
        assert!(err.is_malformed_input());
    }

    #[test]
    fn test_verify_gather_pauli() {
        let ok = Operator::kron_chain([Operator::PauliX, Operator::PauliY, Operator::Creation]).unwrap();
        assert!(check(VerifyGatherPauli, ok).is_ok());
        let bad = Operator::Creation.kron(Operator::PauliX);
        assert!(is_verification_failure(check(VerifyGatherPauli, bad)));
    }

    #[test]
    fn test_verify_normal_order() {
        let ok = Operator::Creation * Operator::Identity * Operator::Annihilation;
        assert!(check(VerifyNormalOrder, ok).is_ok());
        let bad = Operator::Annihilation * Operator::Creation;
        assert!(is_verification_failure(check(VerifyNormalOrder, bad)));
    }

    #[test]
    fn test_verify_scaled_terms() {
        let ok = Operator::PauliX.scale(1.0) + Operator::PauliY.scale(2.0);
        assert!(Pre::new(VerifyScaledTerms).run(ok).is_ok());
        let bad = Operator::PauliX.scale(1.0) + Operator::PauliY;
        assert!(Pre::new(VerifyScaledTerms).run(bad).is_err());
    }

    #[test]
    fn test_verify_sorted_order() {
        let ok = Operator::PauliX.scale(1.0) + Operator::PauliY.scale(2.0);
        assert!(Pre::new(VerifySortedOrder).run(ok).is_ok());
        let duplicate = Operator::PauliX.scale(1.0) + Operator::PauliX.scale(2.0);
        assert!(Pre::new(VerifySortedOrder).run(duplicate).is_err());
    }

    #[test]
    fn test_verify_proper_order_in_coefficients() {
        let sorted = Operator::PauliX.scale(MathExpr::real(2.0) * MathExpr::var("g"));
        assert!(check(VerifyProperOrder, sorted).is_ok());
        let unsorted = Operator::PauliX.scale(MathExpr::var("g") * MathExpr::real(2.0));
        assert!(is_verification_failure(check(VerifyProperOrder, unsorted)));
    }
}
