//! Analog operator canonicalization.
//!
//! The pipeline brings every operator tree to a unique sum of scaled tensor
//! chains. Each rewrite stage runs to a fixed point and is followed by the
//! checks for its postcondition:
//!
//! | stage | rewrites | afterwards |
//! |-------|----------|------------|
//! | distribute | `σ±`, `-`, products over sums, coefficient gathering | no sum below a product |
//! | dimensions | none | operands of `+` and `*` span the same subsystems |
//! | Pauli algebra | `P·Q` table, products of tensor chains | no Pauli product left |
//! | gather Pauli | left-nested tensor chains, qubits before modes | |
//! | normal order | ladder words in creation, identity, annihilation order | |
//! | prune identity | ladder identities inside products | |
//! | scale terms | every term becomes `Scale(c, chain)` | |
//! | sorted order | terms sorted by key, equal keys merged, zeros dropped | |
//! | coefficients | math normalization of every coefficient | |
//!
//! A final chain re-runs every check on the result.

pub mod distribute;
pub mod normal_order;
pub mod pauli;
pub mod signature;
pub mod sort;
pub mod verify;

use std::any::type_name;

use tracing::{info, instrument};

use crate::config::CanonicalizationConfig;
use crate::error::CompileResult;
use crate::pass::{Chain, FixedPoint, Pass, WalkPass};
use crate::traversal::Walk;

pub use distribute::{GatherCoefficients, OperatorDistribute};
pub use normal_order::{NormalOrder, PruneIdentity};
pub use pauli::{GatherPauli, PauliAlgebra, pauli_product};
pub use signature::{
    FactorKey, TermKey, add_terms, format_signature, kron_factors, mul_factors, signature_dims,
    subsystem_signature, term_key,
};
pub use sort::{CoefficientNormalizer, NormalizeCoefficients, ScaleTerms, SortedOrder};
pub use verify::{
    VerifyDistributed, VerifyGatherPauli, VerifyGathered, VerifyHilbertSpaceDim,
    VerifyNormalOrder, VerifyPauliAlgebra, VerifyProperOrder, VerifyPrunedIdentity,
    VerifyScaledTerms, VerifySortedOrder,
};

fn fixed<T>(pass: impl Pass<T> + 'static, config: &CanonicalizationConfig) -> FixedPoint<T>
where
    T: Clone + PartialEq + 'static,
{
    FixedPoint::new(pass).with_max_iter(config.max_iter)
}

/// Every postcondition of the pipeline, checked on its final output.
pub fn canonical_form_verification<T>() -> Chain<T>
where
    T: Walk + Clone + PartialEq + 'static,
{
    Chain::new("verify canonical form")
        .with(WalkPass::post(VerifyDistributed).verification())
        .with(WalkPass::post(VerifyGathered).verification())
        .with(WalkPass::in_order(VerifyHilbertSpaceDim::default(), true).verification())
        .with(WalkPass::post(VerifyPauliAlgebra).verification())
        .with(WalkPass::post(VerifyGatherPauli).verification())
        .with(WalkPass::post(VerifyNormalOrder).verification())
        .with(WalkPass::post(VerifyPrunedIdentity).verification())
        .with(WalkPass::pre(VerifyScaledTerms).verification())
        .with(WalkPass::pre(VerifySortedOrder).verification())
        .with(WalkPass::post(VerifyProperOrder).verification())
}

/// Build the canonicalization pipeline for values of type `T`.
///
/// `T` can be a single operator, a gate, a circuit or any collection of
/// those; the passes rewrite every operator the value contains.
pub fn canonicalization_pass<T>(config: &CanonicalizationConfig) -> Chain<T>
where
    T: Walk + Clone + PartialEq + 'static,
{
    let distribute = Chain::<T>::new("distribute")
        .with(WalkPass::post(OperatorDistribute))
        .with(WalkPass::post(GatherCoefficients));
    let pauli = Chain::<T>::new("pauli algebra")
        .with(WalkPass::post(PauliAlgebra))
        .with(WalkPass::post(GatherCoefficients));
    let normal_order = Chain::<T>::new("normal order")
        .with(WalkPass::post(NormalOrder))
        .with(WalkPass::post(OperatorDistribute))
        .with(WalkPass::post(GatherCoefficients));
    let scale_terms = Chain::<T>::new("scale terms")
        .with(WalkPass::pre(ScaleTerms))
        .with(WalkPass::post(GatherCoefficients));

    Chain::new("analog operator canonicalization")
        .with(fixed(distribute, config))
        .with(WalkPass::post(VerifyDistributed).verification())
        .with(WalkPass::post(VerifyGathered).verification())
        .with(WalkPass::in_order(VerifyHilbertSpaceDim::default(), true).verification())
        .with(fixed(pauli, config))
        .with(WalkPass::post(VerifyPauliAlgebra).verification())
        .with(fixed(WalkPass::post(GatherPauli), config))
        .with(WalkPass::post(VerifyGatherPauli).verification())
        .with(fixed(normal_order, config))
        .with(WalkPass::post(VerifyNormalOrder).verification())
        .with(fixed(WalkPass::post(PruneIdentity), config))
        .with(WalkPass::post(VerifyPrunedIdentity).verification())
        .with(fixed(scale_terms, config))
        .with(WalkPass::pre(VerifyScaledTerms).verification())
        .with(WalkPass::post(VerifyGathered).verification())
        .with(fixed(WalkPass::pre(SortedOrder::new(config)), config))
        .with(WalkPass::pre(VerifySortedOrder).verification())
        .with(WalkPass::post(NormalizeCoefficients::new(config)))
        .with(canonical_form_verification())
}

/// Canonicalize every operator in `value` with the default configuration.
pub fn analog_operator_canonicalization<T>(value: T) -> CompileResult<T>
where
    T: Walk + Clone + PartialEq + 'static,
{
    canonicalize_with(value, &CanonicalizationConfig::default())
}

/// Canonicalize every operator in `value`.
#[instrument(skip_all)]
pub fn canonicalize_with<T>(value: T, config: &CanonicalizationConfig) -> CompileResult<T>
where
    T: Walk + Clone + PartialEq + 'static,
{
    info!(
        "Canonicalizing {} (max_iter {}, tolerance {:e})",
        type_name::<T>(),
        config.max_iter,
        config.tolerance
    );
    let pipeline = canonicalization_pass::<T>(config);
    let value = pipeline.run(value)?;
    info!("Canonicalization complete");
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CompileError;
    use num_complex::Complex64;
    use qcanon_ir::{MathExpr, Operator};

    fn canonical(op: Operator) -> Operator {
        analog_operator_canonicalization(op).unwrap()
    }

    #[test]
    fn test_xy_is_iz() {
        let out = canonical(Operator::PauliX * Operator::PauliY);
        assert_eq!(out, Operator::PauliZ.scale(Complex64::i()));
    }

    #[test]
    fn test_kron_square_is_identity() {
        let xx = Operator::PauliX.kron(Operator::PauliX);
        let out = canonical(xx.clone() * xx);
        assert_eq!(out, Operator::PauliI.kron(Operator::PauliI).scale(1.0));
    }

    #[test]
    fn test_like_terms_merge() {
        let op = Operator::PauliX.scale(3.0) + Operator::PauliX.scale(MathExpr::real(5.0) * MathExpr::real(1.0));
        assert_eq!(canonical(op), Operator::PauliX.scale(8.0));
    }

    #[test]
    fn test_dimension_mismatch() {
        let op = Operator::kron_chain([Operator::PauliX, Operator::PauliZ, Operator::PauliZ]).unwrap()
            + Operator::PauliY.kron(Operator::PauliI);
        let err = analog_operator_canonicalization(op).unwrap_err();
        assert!(matches!(err, CompileError::DimensionMismatch { .. }));
        assert!(err.is_malformed_input());
    }

    #[test]
    fn test_raising_operator_expansion() {
        let out = canonical(Operator::PauliPlus);
        assert_eq!(
            out,
            Operator::PauliX.scale(0.5) + Operator::PauliY.scale(Complex64::new(0.0, 0.5))
        );
    }

    #[test]
    fn test_ladder_word_is_normal_ordered() {
        let op = Operator::Annihilation * Operator::Identity * Operator::Creation;
        assert_eq!(
            canonical(op),
            (Operator::Creation * Operator::Annihilation).scale(1.0)
        );
    }

    #[test]
    fn test_symbolic_coefficients_merge() {
        let g = MathExpr::var("g");
        let op = Operator::PauliZ.scale(g.clone()) + Operator::PauliZ.scale(g.clone());
        assert_eq!(
            canonical(op),
            Operator::PauliZ.scale(MathExpr::real(2.0) * g)
        );
    }

    #[test]
    fn test_full_cancellation_keeps_zero_term() {
        let op = Operator::PauliX - Operator::PauliX;
        assert_eq!(canonical(op), Operator::PauliX.scale(0.0));
    }

    #[test]
    fn test_idempotent() {
        let op = (Operator::PauliX + Operator::PauliY).kron(Operator::Creation * Operator::Annihilation)
            * Operator::PauliZ.kron(Operator::Identity).scale(MathExpr::var("w"));
        let once = canonical(op);
        assert_eq!(canonical(once.clone()), once);
    }

    #[test]
    fn test_pipeline_description_lists_stages() {
        let pass: Chain<Operator> = canonicalization_pass(&CanonicalizationConfig::default());
        let text = crate::pass::describe_pass(&pass);
        assert!(text.starts_with("analog operator canonicalization [Chain]\n"));
        assert!(text.contains("FixedPoint(distribute) [FixedPoint]"));
        assert!(text.contains("VerifySortedOrder [Analysis]"));
    }
}
