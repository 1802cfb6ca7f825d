//! Analog gates and circuits.

use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};
use crate::operator::Operator;

/// A gate defined by its Hamiltonian and its dissipation channels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalogGate {
    /// Name of the gate.
    pub name: String,
    /// The Hamiltonian, a sum of operator terms.
    pub hamiltonian: Operator,
    /// Jump operators; carried unchanged by compilation passes.
    pub dissipation: Vec<Operator>,
}

impl AnalogGate {
    /// Create a gate without dissipation.
    pub fn new(name: impl Into<String>, hamiltonian: Operator) -> IrResult<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(IrError::EmptyGateName);
        }
        Ok(Self {
            name,
            hamiltonian,
            dissipation: vec![],
        })
    }

    /// Attach a jump operator.
    #[must_use]
    pub fn with_jump(mut self, jump: Operator) -> Self {
        self.dissipation.push(jump);
        self
    }
}

/// A statement of an analog circuit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    /// Prepare the initial state.
    Initialize,
    /// Evolve under `gate` for `duration`.
    Evolve {
        /// The gate to evolve under.
        gate: AnalogGate,
        /// Evolution time.
        duration: f64,
    },
    /// Measure all subsystems.
    Measure,
}

/// An analog circuit: an ordered list of statements.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnalogCircuit {
    /// Name of the circuit.
    pub name: String,
    /// Statements in program order.
    pub statements: Vec<Statement>,
    /// Number of qubit registers, set by dimension assignment.
    pub n_qreg: Option<usize>,
    /// Number of oscillator modes, set by dimension assignment.
    pub n_qmode: Option<usize>,
}

impl AnalogCircuit {
    /// Create an empty circuit.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Append an initialization.
    pub fn initialize(&mut self) -> &mut Self {
        self.statements.push(Statement::Initialize);
        self
    }

    /// Append an evolution.
    pub fn evolve(&mut self, gate: AnalogGate, duration: f64) -> IrResult<&mut Self> {
        if !duration.is_finite() || duration < 0.0 {
            return Err(IrError::InvalidDuration {
                gate_name: gate.name,
                duration,
            });
        }
        self.statements.push(Statement::Evolve { gate, duration });
        Ok(self)
    }

    /// Append a measurement.
    pub fn measure(&mut self) -> &mut Self {
        self.statements.push(Statement::Measure);
        self
    }

    /// Iterate over the gates of all evolve statements.
    pub fn gates(&self) -> impl Iterator<Item = &AnalogGate> {
        self.statements.iter().filter_map(|s| match s {
            Statement::Evolve { gate, .. } => Some(gate),
            _ => None,
        })
    }

    /// Dimensions as `(n_qreg, n_qmode)` once assigned.
    pub fn dims(&self) -> Option<(usize, usize)> {
        Some((self.n_qreg?, self.n_qmode?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate() -> AnalogGate {
        AnalogGate::new("drive", Operator::PauliX.kron(Operator::PauliZ)).unwrap()
    }

    #[test]
    fn test_build_circuit() {
        let mut circuit = AnalogCircuit::new("rabi");
        circuit.initialize();
        circuit.evolve(gate(), 1.5).unwrap();
        circuit.measure();

        assert_eq!(circuit.statements.len(), 3);
        assert_eq!(circuit.gates().count(), 1);
        assert_eq!(circuit.dims(), None);
    }

    #[test]
    fn test_rejects_negative_duration() {
        let mut circuit = AnalogCircuit::new("bad");
        let result = circuit.evolve(gate(), -1.0);
        assert!(matches!(result, Err(IrError::InvalidDuration { .. })));
        assert!(circuit.evolve(gate(), f64::NAN).is_err());
    }

    #[test]
    fn test_rejects_empty_gate_name() {
        assert!(matches!(
            AnalogGate::new("", Operator::PauliX),
            Err(IrError::EmptyGateName)
        ));
    }

    #[test]
    fn test_jump_operators() {
        let g = gate().with_jump(Operator::Annihilation);
        assert_eq!(g.dissipation, vec![Operator::Annihilation]);
    }
}
