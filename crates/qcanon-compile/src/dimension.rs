//! Dimension assignment and verification for analog circuits.
//!
//! A circuit spans `n_qreg` qubits and `n_qmode` oscillator modes. Both are
//! read off the leading term of the first gate Hamiltonian, then every other
//! term of every gate, and every observable compiled against the circuit, has
//! to agree.

use std::collections::BTreeMap;

use qcanon_ir::{AnalogCircuit, AnalogGate, Operator};
use tracing::debug;

use crate::canonicalize::signature::{add_terms, signature_dims, subsystem_signature};
use crate::error::{CompileError, CompileResult};
use crate::pass::{Chain, Pass, WalkPass};
use crate::rule::RewriteRule;
use crate::traversal::Pre;

/// `(qubits, modes)` of every additive term of `op`.
fn term_dims(op: &Operator) -> impl Iterator<Item = CompileResult<(usize, usize)>> + '_ {
    add_terms(op)
        .into_iter()
        .map(|term| Ok(signature_dims(&subsystem_signature(term)?)))
}

/// Sets `n_qreg` and `n_qmode` from the first gate of the circuit.
///
/// Post-order: gates are visited before the circuit that owns them. A circuit
/// without gates gets `(0, 0)`.
#[derive(Debug, Clone, Default)]
pub struct AssignAnalogCircuitDim {
    dims: Option<(usize, usize)>,
}

impl RewriteRule for AssignAnalogCircuitDim {
    fn map_gate(&mut self, gate: &AnalogGate) -> CompileResult<Option<AnalogGate>> {
        if self.dims.is_none() {
            if let Some(dims) = term_dims(&gate.hamiltonian).next() {
                self.dims = Some(dims?);
            }
        }
        Ok(None)
    }

    fn map_circuit(&mut self, circuit: &AnalogCircuit) -> CompileResult<Option<AnalogCircuit>> {
        let (n_qreg, n_qmode) = self.dims.take().unwrap_or((0, 0));
        debug!(
            "Circuit '{}' spans {} qubit(s) and {} mode(s)",
            circuit.name, n_qreg, n_qmode
        );
        if circuit.dims() == Some((n_qreg, n_qmode)) {
            return Ok(None);
        }
        Ok(Some(AnalogCircuit {
            n_qreg: Some(n_qreg),
            n_qmode: Some(n_qmode),
            ..circuit.clone()
        }))
    }
}

/// Checks every Hamiltonian term against the dimensions of its circuit.
///
/// Pre-order: the circuit is visited before its gates. Circuits without
/// assigned dimensions are skipped.
#[derive(Debug, Clone, Default)]
pub struct VerifyAnalogCircuitDim {
    dims: Option<(usize, usize)>,
}

impl RewriteRule for VerifyAnalogCircuitDim {
    fn map_circuit(&mut self, circuit: &AnalogCircuit) -> CompileResult<Option<AnalogCircuit>> {
        self.dims = circuit.dims();
        Ok(None)
    }

    fn map_gate(&mut self, gate: &AnalogGate) -> CompileResult<Option<AnalogGate>> {
        let Some((n_qreg, n_qmode)) = self.dims else {
            return Ok(None);
        };
        for dims in term_dims(&gate.hamiltonian) {
            let (found_qreg, found_qmode) = dims?;
            if (found_qreg, found_qmode) != (n_qreg, n_qmode) {
                return Err(CompileError::InconsistentCircuitDim {
                    gate: gate.name.clone(),
                    n_qreg,
                    n_qmode,
                    found_qreg,
                    found_qmode,
                });
            }
        }
        Ok(None)
    }

    fn descend_operator(&self, _op: &Operator) -> bool {
        false
    }
}

/// Checks an auxiliary operator against fixed circuit dimensions.
#[derive(Debug, Clone)]
pub struct VerifyAnalogArgsDim {
    name: String,
    dims: (usize, usize),
}

impl VerifyAnalogArgsDim {
    /// Check the operator called `name` against `(n_qreg, n_qmode)`.
    pub fn new(name: impl Into<String>, dims: (usize, usize)) -> Self {
        Self {
            name: name.into(),
            dims,
        }
    }
}

impl RewriteRule for VerifyAnalogArgsDim {
    fn map_operator(&mut self, op: &Operator) -> CompileResult<Option<Operator>> {
        let (n_qreg, n_qmode) = self.dims;
        for dims in term_dims(op) {
            let (found_qreg, found_qmode) = dims?;
            if (found_qreg, found_qmode) != self.dims {
                return Err(CompileError::ObservableDimMismatch {
                    name: self.name.clone(),
                    n_qreg,
                    n_qmode,
                    found_qreg,
                    found_qmode,
                });
            }
        }
        Ok(None)
    }

    fn descend_operator(&self, _op: &Operator) -> bool {
        false
    }
}

/// Assignment followed by its verification.
pub fn analog_circuit_dim_pass() -> Chain<AnalogCircuit> {
    Chain::new("analog circuit dimensions")
        .with(WalkPass::post(AssignAnalogCircuitDim::default()))
        .with(WalkPass::pre(VerifyAnalogCircuitDim::default()).verification())
}

/// Assign `n_qreg`/`n_qmode` to a canonical circuit and check its gates.
pub fn assign_analog_circuit_dim(circuit: AnalogCircuit) -> CompileResult<AnalogCircuit> {
    analog_circuit_dim_pass().run(circuit)
}

/// Check named observables against the dimensions of `circuit`.
pub fn verify_observables_dim(
    circuit: &AnalogCircuit,
    observables: &BTreeMap<String, Operator>,
) -> CompileResult<()> {
    let dims = circuit
        .dims()
        .ok_or_else(|| CompileError::UnassignedDimensions(circuit.name.clone()))?;
    for (name, op) in observables {
        Pre::new(VerifyAnalogArgsDim::new(name.as_str(), dims)).run(op.clone())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn circuit(hamiltonians: Vec<Operator>) -> AnalogCircuit {
        let mut circuit = AnalogCircuit::new("test");
        circuit.initialize();
        for (i, h) in hamiltonians.into_iter().enumerate() {
            let gate = AnalogGate::new(format!("g{i}"), h).unwrap();
            circuit.evolve(gate, 1.0).unwrap();
        }
        circuit.measure();
        circuit
    }

    fn xix() -> Operator {
        Operator::kron_chain([Operator::PauliX, Operator::PauliI, Operator::PauliX]).unwrap()
    }

    #[test]
    fn test_assign_from_first_gate() {
        let out = assign_analog_circuit_dim(circuit(vec![xix().scale(1.0)])).unwrap();
        assert_eq!(out.n_qreg, Some(3));
        assert_eq!(out.n_qmode, Some(0));
    }

    #[test]
    fn test_assign_counts_modes() {
        let h = Operator::PauliZ.kron(Operator::Creation * Operator::Annihilation).scale(2.0);
        let out = assign_analog_circuit_dim(circuit(vec![h])).unwrap();
        assert_eq!(out.dims(), Some((1, 1)));
    }

    #[test]
    fn test_empty_circuit_has_no_subsystems() {
        let out = assign_analog_circuit_dim(AnalogCircuit::new("empty")).unwrap();
        assert_eq!(out.dims(), Some((0, 0)));
    }

    #[test]
    fn test_inconsistent_gates() {
        let narrow = Operator::PauliX.kron(Operator::PauliZ).scale(1.0);
        let err = assign_analog_circuit_dim(circuit(vec![xix().scale(1.0), narrow])).unwrap_err();
        match err {
            CompileError::InconsistentCircuitDim {
                gate,
                n_qreg,
                found_qreg,
                ..
            } => {
                assert_eq!(gate, "g1");
                assert_eq!(n_qreg, 3);
                assert_eq!(found_qreg, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_jump_operators_are_not_checked() {
        let gate = AnalogGate::new("decay", Operator::PauliZ.scale(1.0))
            .unwrap()
            .with_jump(Operator::PauliX.kron(Operator::PauliX));
        let mut c = AnalogCircuit::new("open");
        c.evolve(gate, 0.5).unwrap();
        let out = assign_analog_circuit_dim(c).unwrap();
        assert_eq!(out.dims(), Some((1, 0)));
    }

    #[test]
    fn test_observables() {
        let assigned = assign_analog_circuit_dim(circuit(vec![xix().scale(1.0)])).unwrap();

        let mut observables = BTreeMap::new();
        observables.insert("parity".to_string(), xix().scale(1.0));
        assert!(verify_observables_dim(&assigned, &observables).is_ok());

        observables.insert("z".to_string(), Operator::PauliZ.scale(1.0));
        let err = verify_observables_dim(&assigned, &observables).unwrap_err();
        assert!(matches!(err, CompileError::ObservableDimMismatch { ref name, .. } if name == "z"));
        assert!(err.is_malformed_input());
    }

    #[test]
    fn test_observables_need_assigned_dims() {
        let err = verify_observables_dim(&circuit(vec![]), &BTreeMap::new()).unwrap_err();
        assert!(matches!(err, CompileError::UnassignedDimensions(_)));
    }
}
