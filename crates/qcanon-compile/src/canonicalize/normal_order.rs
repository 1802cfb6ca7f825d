//! Normal ordering of ladder products and identity pruning.

use qcanon_ir::Operator;

use crate::error::CompileResult;
use crate::rule::RewriteRule;

/// Left-associates products and swaps adjacent ladder terminals into
/// creation, identity, annihilation order.
///
/// Swaps are plain reorderings: no commutator terms are added.
#[derive(Debug, Clone, Copy, Default)]
pub struct NormalOrder;

impl RewriteRule for NormalOrder {
    fn map_operator(&mut self, op: &Operator) -> CompileResult<Option<Operator>> {
        let Operator::Mul(a, b) = op else {
            return Ok(None);
        };
        if let Operator::Mul(x, y) = b.as_ref() {
            let left = a.as_ref().clone() * x.as_ref().clone();
            return Ok(Some(left * y.as_ref().clone()));
        }
        let Some(right) = b.ladder() else {
            return Ok(None);
        };
        Ok(match a.as_ref() {
            Operator::Mul(p, r) => match r.ladder() {
                Some(last) if last > right => {
                    let front = p.as_ref().clone() * b.as_ref().clone();
                    Some(front * r.as_ref().clone())
                }
                _ => None,
            },
            left => match left.ladder() {
                Some(last) if last > right => Some(b.as_ref().clone() * left.clone()),
                _ => None,
            },
        })
    }
}

/// Removes ladder identities from products.
#[derive(Debug, Clone, Copy, Default)]
pub struct PruneIdentity;

impl RewriteRule for PruneIdentity {
    fn map_operator(&mut self, op: &Operator) -> CompileResult<Option<Operator>> {
        Ok(match op {
            Operator::Mul(a, b) if **a == Operator::Identity => Some(b.as_ref().clone()),
            Operator::Mul(a, b) if **b == Operator::Identity => Some(a.as_ref().clone()),
            _ => None,
        })
    }
}
