//! Rule traits applied by the traversal engine.
//!
//! A [`RewriteRule`] has one handler per node kind. Each handler receives the
//! node and returns `Ok(None)` for "no change" or `Ok(Some(node))` with the
//! replacement. Handlers default to "no change", so a rule only implements the
//! kinds it cares about and matches on their variants with a fallback arm.
//!
//! A [`ConversionRule`] maps a node, whose operands were already converted,
//! into a foreign result type.

use qcanon_ir::{AnalogCircuit, AnalogGate, MathExpr, Operator, Statement};
use serde_json::Value;

use crate::error::{CompileError, CompileResult};

/// A rule that rewrites nodes into nodes of the same kind.
pub trait RewriteRule {
    /// Name used in logs and errors.
    fn name(&self) -> &str {
        short_type_name(std::any::type_name::<Self>())
    }

    /// Rewrite an operator node.
    fn map_operator(&mut self, _op: &Operator) -> CompileResult<Option<Operator>> {
        Ok(None)
    }

    /// Rewrite a math expression node.
    fn map_math(&mut self, _expr: &MathExpr) -> CompileResult<Option<MathExpr>> {
        Ok(None)
    }

    /// Rewrite a gate.
    fn map_gate(&mut self, _gate: &AnalogGate) -> CompileResult<Option<AnalogGate>> {
        Ok(None)
    }

    /// Rewrite a statement.
    fn map_statement(&mut self, _statement: &Statement) -> CompileResult<Option<Statement>> {
        Ok(None)
    }

    /// Rewrite a circuit.
    fn map_circuit(&mut self, _circuit: &AnalogCircuit) -> CompileResult<Option<AnalogCircuit>> {
        Ok(None)
    }

    /// Rewrite a generic JSON value.
    fn map_value(&mut self, _value: &Value) -> CompileResult<Option<Value>> {
        Ok(None)
    }

    /// Whether a pre-order walk descends below `op` after the rule ran.
    fn descend_operator(&self, _op: &Operator) -> bool {
        true
    }
}

/// A rule that folds converted operands into a foreign result type.
///
/// `T` is the node kind the rule understands.
pub trait ConversionRule<T> {
    /// Type produced for every node.
    type Output;

    /// Name used in logs and errors.
    fn name(&self) -> &str {
        short_type_name(std::any::type_name::<Self>())
    }

    /// Convert `node` given its converted operands, in operand order.
    fn convert(&mut self, node: &T, operands: Vec<Self::Output>) -> CompileResult<Self::Output>;

    /// Error for node kinds the rule does not handle.
    fn unsupported(&self, node: &T) -> CompileError
    where
        T: std::fmt::Display,
    {
        CompileError::UnsupportedNode {
            rule: self.name().to_string(),
            node: node.to_string(),
        }
    }
}

fn short_type_name(full: &str) -> &str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Noop;

    impl RewriteRule for Noop {}

    #[test]
    fn test_default_handlers_do_nothing() {
        let mut rule = Noop;
        assert_eq!(rule.map_operator(&Operator::PauliX).unwrap(), None);
        assert_eq!(rule.map_math(&MathExpr::real(1.0)).unwrap(), None);
        assert!(rule.descend_operator(&Operator::PauliX));
        assert_eq!(rule.name(), "Noop");
    }

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name("a::b::Post<c::D>"), "Post");
        assert_eq!(short_type_name("Plain"), "Plain");
    }
}
