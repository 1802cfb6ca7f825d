//! Distribution of products over sums and gathering of coefficients.

use num_complex::Complex64;
use qcanon_ir::{MathExpr, Operator};

use crate::error::CompileResult;
use crate::rule::RewriteRule;

fn boxed(a: Operator, b: Operator, node: fn(Box<Operator>, Box<Operator>) -> Operator) -> Operator {
    node(Box::new(a), Box::new(b))
}

/// Expands `σ±`, removes differences and pushes `*`, `⊗` and scaling over
/// sums.
#[derive(Debug, Clone, Copy, Default)]
pub struct OperatorDistribute;

impl OperatorDistribute {
    fn ladder_pauli(sign: f64) -> Operator {
        Operator::PauliX.scale(0.5) + Operator::PauliY.scale(Complex64::new(0.0, 0.5 * sign))
    }

    fn over_sum(
        a: &Operator,
        b: &Operator,
        node: fn(Box<Operator>, Box<Operator>) -> Operator,
    ) -> Option<Operator> {
        match (a, b) {
            (Operator::Add(x, y), _) => Some(
                boxed(x.as_ref().clone(), b.clone(), node)
                    + boxed(y.as_ref().clone(), b.clone(), node),
            ),
            (_, Operator::Add(x, y)) => Some(
                boxed(a.clone(), x.as_ref().clone(), node)
                    + boxed(a.clone(), y.as_ref().clone(), node),
            ),
            _ => None,
        }
    }
}

impl RewriteRule for OperatorDistribute {
    fn map_operator(&mut self, op: &Operator) -> CompileResult<Option<Operator>> {
        Ok(match op {
            Operator::PauliPlus => Some(Self::ladder_pauli(1.0)),
            Operator::PauliMinus => Some(Self::ladder_pauli(-1.0)),
            Operator::Sub(a, b) => Some(a.as_ref().clone() + b.as_ref().clone().scale(-1.0)),
            Operator::Mul(a, b) => Self::over_sum(a, b, Operator::Mul),
            Operator::Kron(a, b) => Self::over_sum(a, b, Operator::Kron),
            Operator::Scale(c, inner) => match inner.as_ref() {
                Operator::Add(x, y) => Some(
                    x.as_ref().clone().scale(c.clone()) + y.as_ref().clone().scale(c.clone()),
                ),
                _ => None,
            },
            _ => None,
        })
    }
}

/// Lifts coefficients out of products and merges nested scaling.
#[derive(Debug, Clone, Copy, Default)]
pub struct GatherCoefficients;

impl GatherCoefficients {
    fn lift(
        a: &Operator,
        b: &Operator,
        node: fn(Box<Operator>, Box<Operator>) -> Operator,
    ) -> Option<Operator> {
        match (a, b) {
            (Operator::Scale(c, x), _) => {
                Some(boxed(x.as_ref().clone(), b.clone(), node).scale(c.clone()))
            }
            (_, Operator::Scale(c, y)) => {
                Some(boxed(a.clone(), y.as_ref().clone(), node).scale(c.clone()))
            }
            _ => None,
        }
    }
}

impl RewriteRule for GatherCoefficients {
    fn map_operator(&mut self, op: &Operator) -> CompileResult<Option<Operator>> {
        Ok(match op {
            Operator::Scale(outer, inner) => match inner.as_ref() {
                Operator::Scale(c, x) => Some(Operator::Scale(
                    merge_coefficients(outer, c),
                    x.clone(),
                )),
                _ => None,
            },
            Operator::Mul(a, b) => Self::lift(a, b, Operator::Mul),
            Operator::Kron(a, b) => Self::lift(a, b, Operator::Kron),
            _ => None,
        })
    }
}

/// Product of two coefficients, folded when both are literals.
fn merge_coefficients(a: &MathExpr, b: &MathExpr) -> MathExpr {
    match (a.as_num(), b.as_num()) {
        (Some(x), Some(y)) => MathExpr::Num(x * y),
        _ => a.clone() * b.clone(),
    }
}
