//! Extraction of canonical terms for simulation backends.

use std::collections::BTreeMap;

use qcanon_ir::{AnalogCircuit, MathExpr, Operator};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::canonicalize::canonicalize_with;
use crate::canonicalize::signature::{TermKey, term_key};
use crate::config::CanonicalizationConfig;
use crate::dimension::{assign_analog_circuit_dim, verify_observables_dim};
use crate::error::CompileResult;
use crate::rule::ConversionRule;
use crate::traversal::convert;

/// One term of a canonical operator: `coefficient · operator`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HamiltonianTerm {
    /// Key of the tensor chain.
    pub key: TermKey,
    /// The tensor chain without its coefficient.
    pub operator: Operator,
    /// The coefficient.
    pub coefficient: MathExpr,
}

/// Flattens a canonical sum into its terms.
#[derive(Debug, Clone, Copy, Default)]
struct CollectTerms;

impl ConversionRule<Operator> for CollectTerms {
    type Output = Vec<HamiltonianTerm>;

    fn convert(&mut self, node: &Operator, operands: Vec<Self::Output>) -> CompileResult<Self::Output> {
        match node {
            Operator::Add(..) => Ok(operands.into_iter().flatten().collect()),
            Operator::Scale(c, _) => Ok(operands
                .into_iter()
                .flatten()
                .map(|mut term| {
                    term.coefficient = if term.coefficient.is_num(1.0) {
                        c.clone()
                    } else {
                        c.clone() * term.coefficient
                    };
                    term
                })
                .collect()),
            Operator::Sub(..) => Err(self.unsupported(node)),
            chain => match term_key(chain) {
                Some(key) => Ok(vec![HamiltonianTerm {
                    key,
                    operator: chain.clone(),
                    coefficient: MathExpr::real(1.0),
                }]),
                None => Err(self.unsupported(node)),
            },
        }
    }
}

/// Terms of a canonical operator, in sum order.
pub fn hamiltonian_terms(op: &Operator) -> CompileResult<Vec<HamiltonianTerm>> {
    convert(&mut CollectTerms, op)
}

/// Terms of every gate Hamiltonian, one list per `Evolve` statement.
pub fn evolve_terms(circuit: &AnalogCircuit) -> CompileResult<Vec<Vec<HamiltonianTerm>>> {
    circuit
        .gates()
        .map(|gate| hamiltonian_terms(&gate.hamiltonian))
        .collect()
}

/// Canonicalize a circuit and assign its dimensions.
#[instrument(skip_all, fields(circuit = %circuit.name))]
pub fn compile_circuit(
    circuit: AnalogCircuit,
    config: &CanonicalizationConfig,
) -> CompileResult<AnalogCircuit> {
    let canonical = canonicalize_with(circuit, config)?;
    let circuit = assign_analog_circuit_dim(canonical)?;
    info!(
        "Compiled circuit with {} gate(s) on {:?} (qubits, modes)",
        circuit.gates().count(),
        circuit.dims()
    );
    Ok(circuit)
}

/// Canonicalize observables, check them against `circuit` and extract their
/// terms.
///
/// `circuit` must have gone through [`compile_circuit`] first.
#[instrument(skip_all, fields(circuit = %circuit.name))]
pub fn compile_observables(
    circuit: &AnalogCircuit,
    observables: BTreeMap<String, Operator>,
    config: &CanonicalizationConfig,
) -> CompileResult<BTreeMap<String, Vec<HamiltonianTerm>>> {
    let canonical = canonicalize_with(observables, config)?;
    verify_observables_dim(circuit, &canonical)?;
    canonical
        .iter()
        .map(|(name, op)| -> CompileResult<(String, Vec<HamiltonianTerm>)> {
            let terms = hamiltonian_terms(op)?;
            debug!("Observable '{}' has {} term(s)", name, terms.len());
            Ok((name.clone(), terms))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonicalize::signature::FactorKey;
    use crate::error::CompileError;
    use qcanon_ir::{AnalogGate, Ladder, Pauli};

    #[test]
    fn test_terms_of_canonical_sum() {
        let op = Operator::PauliX.kron(Operator::Creation).scale(2.0)
            + Operator::PauliZ.kron(Operator::Identity).scale(MathExpr::var("w"));
        let terms = hamiltonian_terms(&op).unwrap();
        assert_eq!(terms.len(), 2);
        assert_eq!(
            terms[0].key,
            vec![FactorKey::Pauli(Pauli::X), FactorKey::Ladder(vec![Ladder::Creation])]
        );
        assert_eq!(terms[0].coefficient, MathExpr::real(2.0));
        assert_eq!(terms[1].operator, Operator::PauliZ.kron(Operator::Identity));
        assert_eq!(terms[1].coefficient, MathExpr::var("w"));
    }

    #[test]
    fn test_nested_scales_multiply() {
        let op = Operator::PauliY.scale(MathExpr::var("b")).scale(MathExpr::var("a"));
        let terms = hamiltonian_terms(&op).unwrap();
        assert_eq!(terms[0].coefficient, MathExpr::var("a") * MathExpr::var("b"));
    }

    #[test]
    fn test_rejects_non_canonical_input() {
        let err = hamiltonian_terms(&(Operator::PauliX - Operator::PauliY)).unwrap_err();
        assert!(matches!(err, CompileError::UnsupportedNode { .. }));
        let err = hamiltonian_terms(&Operator::PauliPlus).unwrap_err();
        assert!(err.is_malformed_input());
    }

    #[test]
    fn test_compile_circuit_and_observables() {
        let h = (Operator::PauliX - Operator::PauliY).kron(Operator::Creation + Operator::Annihilation);
        let mut circuit = AnalogCircuit::new("drive");
        circuit.initialize();
        circuit
            .evolve(AnalogGate::new("g", h).unwrap(), 1.0)
            .unwrap();
        circuit.measure();

        let config = CanonicalizationConfig::default();
        let compiled = compile_circuit(circuit, &config).unwrap();
        assert_eq!(compiled.dims(), Some((1, 1)));

        let terms = evolve_terms(&compiled).unwrap();
        assert_eq!(terms.len(), 1);
        assert_eq!(terms[0].len(), 4);

        let mut observables = BTreeMap::new();
        observables.insert("n".to_string(), Operator::PauliI.kron(Operator::Creation * Operator::Annihilation));
        let out = compile_observables(&compiled, observables, &config).unwrap();
        assert_eq!(out["n"].len(), 1);
        assert_eq!(out["n"][0].coefficient, MathExpr::real(1.0));

        let mut wrong = BTreeMap::new();
        wrong.insert("z".to_string(), Operator::PauliZ);
        assert!(compile_observables(&compiled, wrong, &config).is_err());
    }
}
