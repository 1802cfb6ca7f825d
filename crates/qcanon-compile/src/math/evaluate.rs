//! Numeric and textual evaluation of math expressions.

use std::collections::BTreeSet;

use num_complex::Complex64;
use qcanon_ir::MathExpr;
use qcanon_parse::parse_math;
use rustc_hash::FxHashMap;
use tracing::trace;

use crate::config::{CanonicalizationConfig, EvaluatorConfig};
use crate::error::{CompileResult, EvaluationError};
use crate::math::normalize_math;
use crate::math::rules::ParseRaw;
use crate::rule::{ConversionRule, RewriteRule};
use crate::traversal::{Post, convert};

/// Variable values used during evaluation.
pub type Bindings = FxHashMap<String, Complex64>;

/// Folds an expression into a complex number.
#[derive(Debug, Clone, Copy)]
pub struct Evaluator<'a> {
    bindings: &'a Bindings,
}

impl<'a> Evaluator<'a> {
    /// Create an evaluator over `bindings`.
    pub fn new(bindings: &'a Bindings) -> Self {
        Self { bindings }
    }
}

impl ConversionRule<MathExpr> for Evaluator<'_> {
    type Output = Complex64;

    fn convert(&mut self, node: &MathExpr, operands: Vec<Complex64>) -> CompileResult<Complex64> {
        match (node, operands.as_slice()) {
            (MathExpr::Num(z), []) => Ok(*z),
            (MathExpr::Var(name), []) => self
                .bindings
                .get(name)
                .copied()
                .ok_or_else(|| EvaluationError::UnboundVariable(name.clone()).into()),
            (MathExpr::Raw(text), []) => {
                let parsed = parse_math(text)?;
                convert(self, &parsed)
            }
            (MathExpr::Neg(_), [a]) => Ok(-*a),
            (MathExpr::Func(func, _), [a]) => Ok(func.apply(*a)),
            (MathExpr::Add(..), [a, b]) => Ok(*a + *b),
            (MathExpr::Sub(..), [a, b]) => Ok(*a - *b),
            (MathExpr::Mul(..), [a, b]) => Ok(*a * *b),
            (MathExpr::Div(..), [a, b]) => {
                if b.norm() == 0.0 {
                    Err(EvaluationError::DivisionByZero(node.to_string()).into())
                } else {
                    Ok(*a / *b)
                }
            }
            (MathExpr::Pow(..), [a, b]) => {
                if a.norm() == 0.0 && b.re < 0.0 {
                    Err(EvaluationError::DivisionByZero(node.to_string()).into())
                } else {
                    Ok(super::power(*a, *b))
                }
            }
            _ => Err(self.unsupported(node)),
        }
    }
}

/// Evaluate `expr` with variable `bindings`.
pub fn evaluate(expr: &MathExpr, bindings: &Bindings) -> CompileResult<Complex64> {
    convert(&mut Evaluator::new(bindings), expr)
}

/// Parse and evaluate a closed expression.
///
/// ```
/// use num_complex::Complex64;
/// use qcanon_compile::math::evaluate_str;
///
/// assert_eq!(evaluate_str("2*3 + 5*i").unwrap(), Complex64::new(6.0, 5.0));
/// ```
pub fn evaluate_str(text: &str) -> CompileResult<Complex64> {
    evaluate(&parse_math(text)?, &Bindings::default())
}

/// Substitutes bound variables by their values.
struct Substitute<'a> {
    bindings: &'a Bindings,
}

impl RewriteRule for Substitute<'_> {
    fn map_math(&mut self, expr: &MathExpr) -> CompileResult<Option<MathExpr>> {
        Ok(match expr {
            MathExpr::Var(name) => self.bindings.get(name).map(|z| MathExpr::Num(*z)),
            _ => None,
        })
    }
}

/// Collects the names of free variables.
#[derive(Default)]
struct FreeVariables {
    names: BTreeSet<String>,
}

impl RewriteRule for FreeVariables {
    fn map_math(&mut self, expr: &MathExpr) -> CompileResult<Option<MathExpr>> {
        if let MathExpr::Var(name) = expr {
            self.names.insert(name.clone());
        }
        Ok(None)
    }
}

/// Render `expr` as normalized text in which only the time symbol is free.
///
/// Every other variable must be bound; its value is substituted before
/// normalization.
pub fn textual_form(
    expr: &MathExpr,
    bindings: &Bindings,
    config: &EvaluatorConfig,
) -> CompileResult<String> {
    let expr = Post::new(ParseRaw).run(expr.clone())?;
    let expr = Post::new(Substitute { bindings }).run(expr)?;

    let mut free = Post::new(FreeVariables::default());
    let expr = free.run(expr)?;
    if let Some(name) = free
        .into_rule()
        .names
        .into_iter()
        .find(|name| *name != config.time_symbol)
    {
        return Err(EvaluationError::UnboundVariable(name).into());
    }

    let normalize = CanonicalizationConfig::new().with_tolerance(config.tolerance);
    let text = normalize_math(expr, &normalize)?.to_string();
    trace!("Textual form: {}", text);
    Ok(text)
}
