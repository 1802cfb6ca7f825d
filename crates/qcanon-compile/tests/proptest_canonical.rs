//! Property-based tests for the canonical form.
//!
//! Random sums and products of tensor chains over a fixed `[qubit, qubit,
//! mode]` signature are canonicalized and checked for idempotence, for
//! independence from term order, for distributivity and for cancellation.
//! Coefficients are small integers, halves and imaginary multiples, so every
//! sum of coefficients is exact.

use proptest::prelude::*;
use qcanon_compile::{analog_operator_canonicalization, hamiltonian_terms};
use qcanon_ir::{Ladder, MathExpr, Operator};

fn arb_pauli() -> impl Strategy<Value = Operator> {
    prop::sample::select(vec![
        Operator::PauliI,
        Operator::PauliX,
        Operator::PauliY,
        Operator::PauliZ,
        Operator::PauliPlus,
        Operator::PauliMinus,
    ])
}

/// A product of one to three ladder terminals, in any order.
fn arb_ladder_word() -> impl Strategy<Value = Operator> {
    prop::collection::vec(
        prop::sample::select(vec![Ladder::Creation, Ladder::Identity, Ladder::Annihilation]),
        1..=3,
    )
    .prop_map(|word| {
        word.into_iter()
            .map(Operator::from)
            .reduce(|a, b| a * b)
            .unwrap()
    })
}

fn arb_coefficient() -> impl Strategy<Value = MathExpr> {
    let k = || (1_u32..5).prop_map(|k| f64::from(k));
    prop_oneof![
        k().prop_map(MathExpr::real),
        k().prop_map(|k| MathExpr::real(-k)),
        k().prop_map(|k| MathExpr::complex(0.0, k)),
        k().prop_map(|k| MathExpr::real(k) * MathExpr::var("g")),
        k().prop_map(|k| MathExpr::real(-k) * MathExpr::var("g") / MathExpr::var("h")),
        k().prop_map(|k| MathExpr::raw(format!("{k}*g/h - g"))),
    ]
}

fn arb_term() -> impl Strategy<Value = Operator> {
    (arb_pauli(), arb_pauli(), arb_ladder_word(), arb_coefficient())
        .prop_map(|(p, q, word, c)| p.kron(q).kron(word).scale(c))
}

fn arb_terms() -> impl Strategy<Value = Vec<Operator>> {
    prop::collection::vec(arb_term(), 1..6)
}

fn canon(op: Operator) -> Operator {
    analog_operator_canonicalization(op).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn canonicalization_is_idempotent(terms in arb_terms()) {
        let once = canon(Operator::sum(terms).unwrap());
        let twice = canon(once.clone());
        prop_assert_eq!(twice, once);
    }

    #[test]
    fn term_order_does_not_matter(terms in arb_terms()) {
        let forward = Operator::sum(terms.clone()).unwrap();
        let backward = Operator::sum(terms.into_iter().rev()).unwrap();
        prop_assert_eq!(canon(forward), canon(backward));
    }

    #[test]
    fn term_minus_itself_cancels(term in arb_term()) {
        let op = term.clone() + term.scale(-1.0);
        let terms = hamiltonian_terms(&canon(op)).unwrap();
        // A fully cancelled sum keeps one term with coefficient zero.
        prop_assert_eq!(terms.len(), 1);
        prop_assert!(terms[0].coefficient.is_num(0.0), "{}", terms[0].coefficient);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn product_of_sums_is_idempotent(
        (a, b, c, d) in (arb_term(), arb_term(), arb_term(), arb_term())
    ) {
        let once = canon((a + b) * (c - d));
        let twice = canon(once.clone());
        prop_assert_eq!(twice, once);
    }

    #[test]
    fn product_distributes_over_sums(
        (a, b, c, d) in (arb_term(), arb_term(), arb_term(), arb_term())
    ) {
        let factored = (a.clone() + b.clone()) * (c.clone() - d.clone());
        let expanded = (b.clone() * c.clone() - b * d.clone()) + (a.clone() * c - a * d);
        prop_assert_eq!(canon(factored), canon(expanded));
    }
}
