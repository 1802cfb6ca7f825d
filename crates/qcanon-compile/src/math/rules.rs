//! Rewrite rules of the math normalizer.

use num_complex::Complex64;
use qcanon_ir::MathExpr;
use qcanon_parse::parse_math;
use rustc_hash::FxHashMap;

use crate::error::CompileResult;
use crate::rule::RewriteRule;

/// Parses raw text nodes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseRaw;

impl RewriteRule for ParseRaw {
    fn map_math(&mut self, expr: &MathExpr) -> CompileResult<Option<MathExpr>> {
        match expr {
            MathExpr::Raw(text) => Ok(Some(parse_math(text)?)),
            _ => Ok(None),
        }
    }
}

/// Distributes products over sums and folds constants.
#[derive(Debug, Clone, Copy, Default)]
pub struct Distribute;

impl RewriteRule for Distribute {
    fn map_math(&mut self, expr: &MathExpr) -> CompileResult<Option<MathExpr>> {
        let minus_one = || Box::new(MathExpr::real(-1.0));
        Ok(match expr {
            MathExpr::Neg(a) => match a.as_ref() {
                MathExpr::Num(z) => Some(MathExpr::Num(-z)),
                _ => Some(MathExpr::Mul(minus_one(), a.clone())),
            },
            MathExpr::Sub(a, b) => Some(MathExpr::Add(
                a.clone(),
                Box::new(MathExpr::Mul(minus_one(), b.clone())),
            )),
            MathExpr::Add(a, b) => match (a.as_num(), b.as_num()) {
                (Some(x), Some(y)) => Some(MathExpr::Num(x + y)),
                _ => None,
            },
            MathExpr::Mul(a, b) => match (a.as_ref(), b.as_ref()) {
                (MathExpr::Num(x), MathExpr::Num(y)) => Some(MathExpr::Num(x * y)),
                (MathExpr::Add(x, y), _) => Some(MathExpr::Add(
                    Box::new(MathExpr::Mul(x.clone(), b.clone())),
                    Box::new(MathExpr::Mul(y.clone(), b.clone())),
                )),
                (_, MathExpr::Add(x, y)) => Some(MathExpr::Add(
                    Box::new(MathExpr::Mul(a.clone(), x.clone())),
                    Box::new(MathExpr::Mul(a.clone(), y.clone())),
                )),
                _ => None,
            },
            MathExpr::Div(a, b) => match (a.as_ref(), b.as_num()) {
                (_, Some(n)) if n.norm() == 0.0 => None,
                (MathExpr::Num(x), Some(n)) => Some(MathExpr::Num(x / n)),
                (MathExpr::Add(x, y), _) => Some(MathExpr::Add(
                    Box::new(MathExpr::Div(x.clone(), b.clone())),
                    Box::new(MathExpr::Div(y.clone(), b.clone())),
                )),
                (_, Some(n)) => Some(MathExpr::Mul(
                    a.clone(),
                    Box::new(MathExpr::Num(Complex64::new(1.0, 0.0) / n)),
                )),
                // a / b == a * b**-1, so quotients share the product form.
                (_, None) => Some(MathExpr::Mul(
                    a.clone(),
                    Box::new(MathExpr::Pow(b.clone(), minus_one())),
                )),
            },
            MathExpr::Pow(a, b) => {
                if b.is_num(1.0) {
                    Some(a.as_ref().clone())
                } else if b.is_num(0.0) {
                    Some(MathExpr::real(1.0))
                } else {
                    match (a.as_ref(), b.as_num()) {
                        (MathExpr::Num(x), Some(y)) if x.norm() == 0.0 && y.re < 0.0 => None,
                        (MathExpr::Num(x), Some(y)) => Some(MathExpr::Num(super::power(*x, y))),
                        (MathExpr::Pow(base, inner), Some(y)) if is_integer(y) => inner
                            .as_num()
                            .map(|m| MathExpr::Pow(base.clone(), Box::new(MathExpr::Num(m * y)))),
                        _ => None,
                    }
                }
            }
            MathExpr::Func(func, a) => a.as_num().map(|z| MathExpr::Num(func.apply(z))),
            _ => None,
        })
    }
}

/// Sorts the operands of `+` and `*` chains.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProperOrder;

impl RewriteRule for ProperOrder {
    fn map_math(&mut self, expr: &MathExpr) -> CompileResult<Option<MathExpr>> {
        let is_sum = match expr {
            MathExpr::Add(..) => true,
            MathExpr::Mul(..) => false,
            _ => return Ok(None),
        };
        let mut operands = if is_sum {
            add_terms(expr)
        } else {
            mul_factors(expr)
        };
        operands.sort_by_key(MathExpr::order_key);
        let sorted = operands
            .into_iter()
            .reduce(|a, b| if is_sum { a + b } else { a * b });
        Ok(sorted.filter(|s| s != expr))
    }
}

/// Collects numeric factors into one coefficient and merges like terms.
#[derive(Debug, Clone, Copy)]
pub struct Partition {
    tolerance: f64,
}

impl Partition {
    /// Terms whose coefficient magnitude is at most `tolerance` are dropped.
    pub fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }

    fn is_zero(&self, z: Complex64) -> bool {
        z.norm() <= self.tolerance
    }

    fn partition_product(&self, expr: &MathExpr) -> MathExpr {
        let (coefficient, rest) = split_coefficient(expr);
        if self.is_zero(coefficient) {
            return MathExpr::real(0.0);
        }
        with_coefficient(coefficient, rest)
    }

    fn partition_sum(&self, expr: &MathExpr) -> MathExpr {
        let mut groups: Vec<(Complex64, Vec<MathExpr>)> = Vec::new();
        let mut index: FxHashMap<u64, Vec<usize>> = FxHashMap::default();

        for term in add_terms(expr) {
            let (coefficient, rest) = split_coefficient(&term);
            let hash = rest
                .iter()
                .fold(0u64, |h, f| h.rotate_left(7) ^ f.structural_hash());
            let candidates = index.entry(hash).or_default();
            match candidates.iter().find(|&&i| groups[i].1 == rest) {
                Some(&i) => groups[i].0 += coefficient,
                None => {
                    candidates.push(groups.len());
                    groups.push((coefficient, rest));
                }
            }
        }

        groups
            .into_iter()
            .filter(|(c, _)| !self.is_zero(*c))
            .map(|(c, rest)| with_coefficient(c, rest))
            .reduce(|a, b| a + b)
            .unwrap_or_else(|| MathExpr::real(0.0))
    }
}

impl RewriteRule for Partition {
    fn map_math(&mut self, expr: &MathExpr) -> CompileResult<Option<MathExpr>> {
        let partitioned = match expr {
            MathExpr::Mul(..) => self.partition_product(expr),
            MathExpr::Add(..) => self.partition_sum(expr),
            _ => return Ok(None),
        };
        Ok(Some(partitioned).filter(|p| p != expr))
    }
}

fn is_integer(z: Complex64) -> bool {
    z.im == 0.0 && z.re.fract() == 0.0
}

/// Operands of a `+` chain, left to right.
pub(crate) fn add_terms(expr: &MathExpr) -> Vec<MathExpr> {
    let mut out = Vec::new();
    flatten(expr, true, &mut out);
    out
}

/// Operands of a `*` chain, left to right.
pub(crate) fn mul_factors(expr: &MathExpr) -> Vec<MathExpr> {
    let mut out = Vec::new();
    flatten(expr, false, &mut out);
    out
}

fn flatten(expr: &MathExpr, sum: bool, out: &mut Vec<MathExpr>) {
    match (expr, sum) {
        (MathExpr::Add(a, b), true) | (MathExpr::Mul(a, b), false) => {
            flatten(a, sum, out);
            flatten(b, sum, out);
        }
        _ => out.push(expr.clone()),
    }
}

/// Split a product into its numeric coefficient and symbolic factors.
fn split_coefficient(expr: &MathExpr) -> (Complex64, Vec<MathExpr>) {
    let mut coefficient = Complex64::new(1.0, 0.0);
    let mut rest = Vec::new();
    for factor in mul_factors(expr) {
        match factor {
            MathExpr::Num(z) => coefficient *= z,
            other => rest.push(other),
        }
    }
    (coefficient, rest)
}

fn with_coefficient(coefficient: Complex64, rest: Vec<MathExpr>) -> MathExpr {
    let leading = if coefficient == Complex64::new(1.0, 0.0) && !rest.is_empty() {
        None
    } else {
        Some(MathExpr::Num(coefficient))
    };
    leading
        .into_iter()
        .chain(rest)
        .reduce(|a, b| a * b)
        .unwrap_or_else(|| MathExpr::real(1.0))
}
