//! Term scaling, sorting and merging, and coefficient normalization.

use std::sync::Arc;

use qcanon_ir::{MathExpr, Operator};

use crate::canonicalize::signature::{TermKey, add_terms, term_key};
use crate::config::CanonicalizationConfig;
use crate::error::CompileResult;
use crate::math::math_normalization_pass;
use crate::pass::Pass;
use crate::rule::RewriteRule;

/// Wraps every unscaled additive term in `Scale(1, ·)`.
///
/// Meant for a pre-order walk: descent stops below anything but a sum.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScaleTerms;

impl RewriteRule for ScaleTerms {
    fn map_operator(&mut self, op: &Operator) -> CompileResult<Option<Operator>> {
        Ok(match op {
            Operator::Add(..) | Operator::Scale(..) => None,
            term => Some(term.clone().scale(1.0)),
        })
    }

    fn descend_operator(&self, op: &Operator) -> bool {
        matches!(op, Operator::Add(..))
    }
}

/// Normalizes math expressions with a shared normalization pass.
#[derive(Clone)]
pub struct CoefficientNormalizer {
    pass: Arc<dyn Pass<MathExpr>>,
}

impl CoefficientNormalizer {
    /// Build the normalizer for `config`.
    pub fn new(config: &CanonicalizationConfig) -> Self {
        Self {
            pass: Arc::new(math_normalization_pass(config)),
        }
    }

    /// Normalize one expression.
    pub fn normalize(&self, expr: MathExpr) -> CompileResult<MathExpr> {
        self.pass.run(expr)
    }
}

/// Sorts additive terms by key and merges terms with equal keys.
///
/// Meant for a pre-order walk: the outermost sum of a chain is flattened as a
/// whole and descent stops there.
#[derive(Clone)]
pub struct SortedOrder {
    normalizer: CoefficientNormalizer,
    tolerance: f64,
}

impl SortedOrder {
    /// Create the rule for `config`.
    pub fn new(config: &CanonicalizationConfig) -> Self {
        Self {
            normalizer: CoefficientNormalizer::new(config),
            tolerance: config.tolerance,
        }
    }

    fn is_zero(&self, coefficient: &MathExpr) -> bool {
        coefficient
            .as_num()
            .is_some_and(|z| z.norm() <= self.tolerance)
    }
}

impl RewriteRule for SortedOrder {
    fn map_operator(&mut self, op: &Operator) -> CompileResult<Option<Operator>> {
        if !matches!(op, Operator::Add(..)) {
            return Ok(None);
        }

        let mut keyed: Vec<(TermKey, MathExpr, Operator)> = Vec::new();
        for term in add_terms(op) {
            // Unkeyed terms are left for verification to report.
            let Some(key) = term_key(term) else {
                return Ok(None);
            };
            let (coefficient, chain) = match term {
                Operator::Scale(c, chain) => (c.clone(), chain.as_ref().clone()),
                other => (MathExpr::real(1.0), other.clone()),
            };
            keyed.push((key, coefficient, chain));
        }
        keyed.sort_by(|a, b| a.0.cmp(&b.0));

        let mut merged: Vec<(TermKey, MathExpr, Operator)> = Vec::with_capacity(keyed.len());
        for (key, coefficient, chain) in keyed {
            match merged.last_mut() {
                Some(last) if last.0 == key => {
                    last.1 = last.1.clone() + coefficient;
                }
                _ => merged.push((key, coefficient, chain)),
            }
        }

        let mut terms = Vec::with_capacity(merged.len());
        let mut first_zero = None;
        for (_, coefficient, chain) in merged {
            let coefficient = self.normalizer.normalize(coefficient)?;
            if self.is_zero(&coefficient) {
                first_zero.get_or_insert_with(|| chain.scale(MathExpr::real(0.0)));
            } else {
                terms.push(chain.scale(coefficient));
            }
        }

        let sorted = Operator::sum(terms).or(first_zero);
        Ok(sorted.filter(|s| s != op))
    }

    fn descend_operator(&self, op: &Operator) -> bool {
        !matches!(op, Operator::Add(..))
    }
}

/// Normalizes the coefficient of every scaled operator.
#[derive(Clone)]
pub struct NormalizeCoefficients {
    normalizer: CoefficientNormalizer,
}

impl NormalizeCoefficients {
    /// Create the rule for `config`.
    pub fn new(config: &CanonicalizationConfig) -> Self {
        Self {
            normalizer: CoefficientNormalizer::new(config),
        }
    }
}

impl RewriteRule for NormalizeCoefficients {
    fn map_operator(&mut self, op: &Operator) -> CompileResult<Option<Operator>> {
        let Operator::Scale(coefficient, inner) = op else {
            return Ok(None);
        };
        let normalized = self.normalizer.normalize(coefficient.clone())?;
        Ok((normalized != *coefficient).then(|| Operator::Scale(normalized, inner.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traversal::{Post, Pre};

    fn sorted(op: Operator) -> Operator {
        Pre::new(SortedOrder::new(&CanonicalizationConfig::default()))
            .run(op)
            .unwrap()
    }

    #[test]
    fn test_scale_terms_wraps_top_level_terms_only() {
        let op = Operator::PauliX.kron(Operator::PauliY) + Operator::PauliZ.kron(Operator::PauliZ).scale(2.0);
        let out = Pre::new(ScaleTerms).run(op).unwrap();
        assert_eq!(
            out,
            Operator::PauliX.kron(Operator::PauliY).scale(1.0)
                + Operator::PauliZ.kron(Operator::PauliZ).scale(2.0)
        );
        let out = Pre::new(ScaleTerms).run(Operator::PauliX).unwrap();
        assert_eq!(out, Operator::PauliX.scale(1.0));
    }

    #[test]
    fn test_sorted_order_sorts_and_merges() {
        let op = Operator::PauliZ.scale(1.0) + Operator::PauliX.scale(3.0) + Operator::PauliX.scale(5.0);
        assert_eq!(
            sorted(op),
            Operator::PauliX.scale(8.0) + Operator::PauliZ.scale(1.0)
        );
    }

    #[test]
    fn test_sorted_order_drops_cancelled_terms() {
        let op = Operator::PauliX.scale(1.0) + Operator::PauliY.scale(2.0) + Operator::PauliX.scale(-1.0);
        assert_eq!(sorted(op), Operator::PauliY.scale(2.0));
    }

    #[test]
    fn test_fully_cancelled_sum_keeps_first_term() {
        let op = Operator::PauliY.scale(1.0)
            + Operator::PauliX.scale(1.0)
            + Operator::PauliY.scale(-1.0)
            + Operator::PauliX.scale(-1.0);
        assert_eq!(sorted(op), Operator::PauliX.scale(0.0));
    }

    #[test]
    fn test_normalize_coefficients() {
        let op = Operator::PauliZ.scale(MathExpr::var("g") + MathExpr::var("g"));
        let out = Post::new(NormalizeCoefficients::new(&CanonicalizationConfig::default()))
            .run(op)
            .unwrap();
        assert_eq!(
            out,
            Operator::PauliZ.scale(MathExpr::real(2.0) * MathExpr::var("g"))
        );
    }
}
