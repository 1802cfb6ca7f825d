//! Math expression normalizer and evaluator.
//!
//! Normalization is a fixed point over four stages:
//!
//! 1. parse raw text nodes,
//! 2. distribute products over sums, turn quotients into inverse powers and
//!    fold constants,
//! 3. sort the operands of `+` and `*` chains by `(kind tag, structural hash)`,
//! 4. partition products into a numeric coefficient and a symbolic remainder,
//!    merging terms with equal remainders.
//!
//! The result is a unique form for expressions that only differ by
//! reordering, regrouping or constant arithmetic.

pub mod evaluate;
pub mod rules;

use num_complex::Complex64;
use qcanon_ir::MathExpr;

use crate::config::CanonicalizationConfig;
use crate::error::CompileResult;
use crate::pass::{Chain, FixedPoint, Pass, WalkPass};

pub use evaluate::{Bindings, Evaluator, evaluate, evaluate_str, textual_form};
pub use rules::{Distribute, ParseRaw, Partition, ProperOrder};

/// Build the math normalization pass.
pub fn math_normalization_pass(config: &CanonicalizationConfig) -> FixedPoint<MathExpr> {
    let stages = Chain::<MathExpr>::new("math normalization")
        .with(WalkPass::post(ParseRaw))
        .with(FixedPoint::<MathExpr>::new(WalkPass::post(Distribute)).with_max_iter(config.max_iter))
        .with(FixedPoint::<MathExpr>::new(WalkPass::post(ProperOrder)).with_max_iter(config.max_iter))
        .with(
            FixedPoint::<MathExpr>::new(WalkPass::post(Partition::new(config.tolerance)))
                .with_max_iter(config.max_iter),
        );
    FixedPoint::new(stages).with_max_iter(config.max_iter)
}

/// Normalize a single expression.
pub fn normalize_math(expr: MathExpr, config: &CanonicalizationConfig) -> CompileResult<MathExpr> {
    math_normalization_pass(config).run(expr)
}

/// `base ** exponent`, exact for integer exponents.
pub(crate) fn power(base: Complex64, exponent: Complex64) -> Complex64 {
    if exponent.im == 0.0 {
        let e = exponent.re;
        if e.fract() == 0.0 && e.abs() <= f64::from(i32::MAX) {
            #[allow(clippy::cast_possible_truncation)]
            let e = e as i32;
            return base.powi(e);
        }
        if base.im == 0.0 && base.re >= 0.0 {
            return Complex64::new(base.re.powf(e), 0.0);
        }
    }
    base.powc(exponent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use qcanon_ir::MathFunc;
    use qcanon_parse::parse_math;

    fn normalize(text: &str) -> MathExpr {
        normalize_math(parse_math(text).unwrap(), &CanonicalizationConfig::default()).unwrap()
    }

    #[test]
    fn test_power() {
        assert_eq!(power(Complex64::new(2.0, 0.0), Complex64::new(10.0, 0.0)).re, 1024.0);
        assert_eq!(power(Complex64::new(4.0, 0.0), Complex64::new(0.5, 0.0)).re, 2.0);
        let z = power(Complex64::new(-1.0, 0.0), Complex64::new(0.5, 0.0));
        assert!((z - Complex64::i()).norm() < 1e-12);
    }

    #[test]
    fn test_normalizes_constants() {
        assert_eq!(normalize("3 + 5"), MathExpr::real(8.0));
        assert_eq!(normalize("2 * (3 - 1) / 4"), MathExpr::real(1.0));
    }

    #[test]
    fn test_collects_like_terms() {
        let expected = MathExpr::real(2.0) * MathExpr::var("x");
        assert_eq!(normalize("x + x"), expected);
        assert_eq!(normalize("3*x - x"), expected);
        assert_eq!(normalize("x - x"), MathExpr::real(0.0));
    }

    #[test]
    fn test_reordering_gives_same_form() {
        assert_eq!(normalize("a*b + 2*c"), normalize("c*2 + b*a"));
        assert_eq!(normalize("(a + b)*(a - b)"), normalize("a*a - b*b + 0*a"));
    }

    #[test]
    fn test_quotients_share_product_form() {
        let y_inv = MathExpr::var("y").pow(MathExpr::real(-1.0));
        assert_eq!(normalize("2*(x/y)"), normalize("(2*x)/y"));
        assert_eq!(
            normalize("2*x/y + x/y"),
            MathExpr::real(3.0) * MathExpr::var("x") * y_inv
        );
        assert_eq!(normalize("x/y - x*y**-1"), MathExpr::real(0.0));
        assert_eq!(normalize("1/(1/y)"), MathExpr::var("y"));
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let config = CanonicalizationConfig::default();
        for text in [
            "omega*cos(2*t) + 3*g/2",
            "-(x + 1)*(y - i)",
            "sin(0.5)*t**2",
            "g/(h + 1) - 2*g/(1 + h)",
        ] {
            let once = normalize(text);
            assert_eq!(normalize_math(once.clone(), &config).unwrap(), once, "{text}");
        }
    }

    #[test]
    fn test_folds_functions() {
        let out = normalize("2*sin(0)");
        assert_eq!(out, MathExpr::real(0.0));
        let out = normalize("cos(t)");
        assert_eq!(out, MathExpr::func(MathFunc::Cos, MathExpr::var("t")));
    }

    #[test]
    fn test_raw_nodes_are_parsed() {
        let config = CanonicalizationConfig::default();
        let out = normalize_math(MathExpr::raw("t + t"), &config).unwrap();
        assert_eq!(out, MathExpr::real(2.0) * MathExpr::var("t"));
    }
}
