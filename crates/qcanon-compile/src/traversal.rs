//! Tree traversal engine.
//!
//! Every walkable node kind implements [`Walk`], which knows how to hand the
//! node to the matching [`RewriteRule`] handler and how to rebuild the node
//! after its children went through a [`Walker`]. The four strategies differ
//! only in when the rule runs relative to the children:
//!
//! - [`Post`]: children first, then the rebuilt node.
//! - [`Pre`]: the node first, then the children of its replacement. The rule
//!   may decline descent below a node.
//! - [`In`]: left operand, node, right operand for binary nodes (reversed on
//!   request); pre-order for everything else.
//! - [`Level`]: breadth-first; every node at depth `d` is visited before any
//!   node at depth `d + 1`.
//!
//! Containers (`Vec`, `BTreeMap`) have no handler of their own but still pass
//! their elements through the walker.

use std::collections::BTreeMap;

use qcanon_ir::{AnalogCircuit, AnalogGate, MathExpr, Operator, Statement};
use serde_json::Value;

use crate::error::CompileResult;
use crate::rule::{ConversionRule, RewriteRule};

/// A binary node split into its operands.
pub struct Binary<T> {
    /// Left operand.
    pub left: T,
    /// Right operand.
    pub right: T,
    /// Rebuilds the node from (possibly rewritten) operands.
    pub rebuild: fn(T, T) -> T,
}

/// A node kind the traversal engine can walk.
pub trait Walk: Sized {
    /// Run the rule's handler for this node kind.
    fn apply<R: RewriteRule>(self, rule: &mut R) -> CompileResult<Self>;

    /// Rebuild the node with every child passed through `walker`.
    fn walk_children<W: Walker>(self, walker: &mut W) -> CompileResult<Self>;

    /// Split a binary node into its operands.
    fn into_binary(self) -> Result<Binary<Self>, Self> {
        Err(self)
    }

    /// Whether a pre-order walk descends below this node.
    fn descend<R: RewriteRule>(&self, _rule: &R) -> bool {
        true
    }
}

/// Drives a walk over one child.
pub trait Walker {
    /// Walk `node` and return its replacement.
    fn walk<T: Walk>(&mut self, node: T) -> CompileResult<T>;
}

fn binary<T>(left: T, right: T, rebuild: fn(T, T) -> T) -> Result<Binary<T>, T> {
    Ok(Binary {
        left,
        right,
        rebuild,
    })
}

impl Walk for Operator {
    fn apply<R: RewriteRule>(self, rule: &mut R) -> CompileResult<Self> {
        Ok(rule.map_operator(&self)?.unwrap_or(self))
    }

    fn walk_children<W: Walker>(self, walker: &mut W) -> CompileResult<Self> {
        Ok(match self {
            Operator::Add(a, b) => {
                Operator::Add(Box::new(walker.walk(*a)?), Box::new(walker.walk(*b)?))
            }
            Operator::Sub(a, b) => {
                Operator::Sub(Box::new(walker.walk(*a)?), Box::new(walker.walk(*b)?))
            }
            Operator::Mul(a, b) => {
                Operator::Mul(Box::new(walker.walk(*a)?), Box::new(walker.walk(*b)?))
            }
            Operator::Kron(a, b) => {
                Operator::Kron(Box::new(walker.walk(*a)?), Box::new(walker.walk(*b)?))
            }
            Operator::Scale(coefficient, op) => {
                let coefficient = walker.walk(coefficient)?;
                Operator::Scale(coefficient, Box::new(walker.walk(*op)?))
            }
            terminal => terminal,
        })
    }

    fn into_binary(self) -> Result<Binary<Self>, Self> {
        match self {
            Operator::Add(a, b) => binary(*a, *b, |a, b| Operator::Add(Box::new(a), Box::new(b))),
            Operator::Sub(a, b) => binary(*a, *b, |a, b| Operator::Sub(Box::new(a), Box::new(b))),
            Operator::Mul(a, b) => binary(*a, *b, |a, b| Operator::Mul(Box::new(a), Box::new(b))),
            Operator::Kron(a, b) => binary(*a, *b, |a, b| Operator::Kron(Box::new(a), Box::new(b))),
            other => Err(other),
        }
    }

    fn descend<R: RewriteRule>(&self, rule: &R) -> bool {
        rule.descend_operator(self)
    }
}

impl Walk for MathExpr {
    fn apply<R: RewriteRule>(self, rule: &mut R) -> CompileResult<Self> {
        Ok(rule.map_math(&self)?.unwrap_or(self))
    }

    fn walk_children<W: Walker>(self, walker: &mut W) -> CompileResult<Self> {
        Ok(match self {
            MathExpr::Neg(e) => MathExpr::Neg(Box::new(walker.walk(*e)?)),
            MathExpr::Func(func, e) => MathExpr::Func(func, Box::new(walker.walk(*e)?)),
            MathExpr::Add(a, b) => {
                MathExpr::Add(Box::new(walker.walk(*a)?), Box::new(walker.walk(*b)?))
            }
            MathExpr::Sub(a, b) => {
                MathExpr::Sub(Box::new(walker.walk(*a)?), Box::new(walker.walk(*b)?))
            }
            MathExpr::Mul(a, b) => {
                MathExpr::Mul(Box::new(walker.walk(*a)?), Box::new(walker.walk(*b)?))
            }
            MathExpr::Div(a, b) => {
                MathExpr::Div(Box::new(walker.walk(*a)?), Box::new(walker.walk(*b)?))
            }
            MathExpr::Pow(a, b) => {
                MathExpr::Pow(Box::new(walker.walk(*a)?), Box::new(walker.walk(*b)?))
            }
            leaf => leaf,
        })
    }

    fn into_binary(self) -> Result<Binary<Self>, Self> {
        match self {
            MathExpr::Add(a, b) => binary(*a, *b, |a, b| MathExpr::Add(Box::new(a), Box::new(b))),
            MathExpr::Sub(a, b) => binary(*a, *b, |a, b| MathExpr::Sub(Box::new(a), Box::new(b))),
            MathExpr::Mul(a, b) => binary(*a, *b, |a, b| MathExpr::Mul(Box::new(a), Box::new(b))),
            MathExpr::Div(a, b) => binary(*a, *b, |a, b| MathExpr::Div(Box::new(a), Box::new(b))),
            MathExpr::Pow(a, b) => binary(*a, *b, |a, b| MathExpr::Pow(Box::new(a), Box::new(b))),
            other => Err(other),
        }
    }
}

impl Walk for AnalogGate {
    fn apply<R: RewriteRule>(self, rule: &mut R) -> CompileResult<Self> {
        Ok(rule.map_gate(&self)?.unwrap_or(self))
    }

    // Jump operators are carried as-is.
    fn walk_children<W: Walker>(mut self, walker: &mut W) -> CompileResult<Self> {
        self.hamiltonian = walker.walk(self.hamiltonian)?;
        Ok(self)
    }
}

impl Walk for Statement {
    fn apply<R: RewriteRule>(self, rule: &mut R) -> CompileResult<Self> {
        Ok(rule.map_statement(&self)?.unwrap_or(self))
    }

    fn walk_children<W: Walker>(self, walker: &mut W) -> CompileResult<Self> {
        Ok(match self {
            Statement::Evolve { gate, duration } => Statement::Evolve {
                gate: walker.walk(gate)?,
                duration,
            },
            other => other,
        })
    }
}

impl Walk for AnalogCircuit {
    fn apply<R: RewriteRule>(self, rule: &mut R) -> CompileResult<Self> {
        Ok(rule.map_circuit(&self)?.unwrap_or(self))
    }

    fn walk_children<W: Walker>(mut self, walker: &mut W) -> CompileResult<Self> {
        self.statements = walker.walk(self.statements)?;
        Ok(self)
    }
}

impl<T: Walk> Walk for Vec<T> {
    fn apply<R: RewriteRule>(self, _rule: &mut R) -> CompileResult<Self> {
        Ok(self)
    }

    fn walk_children<W: Walker>(self, walker: &mut W) -> CompileResult<Self> {
        self.into_iter().map(|item| walker.walk(item)).collect()
    }
}

impl<T: Walk> Walk for BTreeMap<String, T> {
    fn apply<R: RewriteRule>(self, _rule: &mut R) -> CompileResult<Self> {
        Ok(self)
    }

    fn walk_children<W: Walker>(self, walker: &mut W) -> CompileResult<Self> {
        self.into_iter()
            .map(|(key, value)| -> CompileResult<(String, T)> { Ok((key, walker.walk(value)?)) })
            .collect()
    }
}

impl Walk for Value {
    fn apply<R: RewriteRule>(self, rule: &mut R) -> CompileResult<Self> {
        Ok(rule.map_value(&self)?.unwrap_or(self))
    }

    fn walk_children<W: Walker>(self, walker: &mut W) -> CompileResult<Self> {
        Ok(match self {
            Value::Array(items) => Value::Array(
                items
                    .into_iter()
                    .map(|item| walker.walk(item))
                    .collect::<CompileResult<_>>()?,
            ),
            Value::Object(map) => Value::Object(
                map.into_iter()
                    .map(|(key, value)| -> CompileResult<(String, Value)> {
                        Ok((key, walker.walk(value)?))
                    })
                    .collect::<CompileResult<_>>()?,
            ),
            scalar => scalar,
        })
    }
}

/// Post-order walk.
#[derive(Debug, Clone)]
pub struct Post<R> {
    rule: R,
}

impl<R: RewriteRule> Post<R> {
    /// Create a walk that owns `rule`.
    pub fn new(rule: R) -> Self {
        Self { rule }
    }

    /// Walk `node`.
    pub fn run<T: Walk>(&mut self, node: T) -> CompileResult<T> {
        self.walk(node)
    }

    /// The rule, with whatever state it accumulated.
    pub fn rule(&self) -> &R {
        &self.rule
    }

    /// Take the rule back.
    pub fn into_rule(self) -> R {
        self.rule
    }
}

impl<R: RewriteRule> Walker for Post<R> {
    fn walk<T: Walk>(&mut self, node: T) -> CompileResult<T> {
        node.walk_children(self)?.apply(&mut self.rule)
    }
}

/// Pre-order walk.
#[derive(Debug, Clone)]
pub struct Pre<R> {
    rule: R,
}

impl<R: RewriteRule> Pre<R> {
    /// Create a walk that owns `rule`.
    pub fn new(rule: R) -> Self {
        Self { rule }
    }

    /// Walk `node`.
    pub fn run<T: Walk>(&mut self, node: T) -> CompileResult<T> {
        self.walk(node)
    }

    /// The rule, with whatever state it accumulated.
    pub fn rule(&self) -> &R {
        &self.rule
    }

    /// Take the rule back.
    pub fn into_rule(self) -> R {
        self.rule
    }
}

impl<R: RewriteRule> Walker for Pre<R> {
    fn walk<T: Walk>(&mut self, node: T) -> CompileResult<T> {
        let node = node.apply(&mut self.rule)?;
        if node.descend(&self.rule) {
            node.walk_children(self)
        } else {
            Ok(node)
        }
    }
}

/// In-order walk over binary nodes.
///
/// A binary node visits its left operand, then itself, then its right
/// operand; `reverse` swaps the operand order. When the rule turns the node
/// into something that is no longer binary, the remaining operand is not
/// visited.
#[derive(Debug, Clone)]
pub struct In<R> {
    rule: R,
    reverse: bool,
}

impl<R: RewriteRule> In<R> {
    /// Create a walk that owns `rule`.
    pub fn new(rule: R, reverse: bool) -> Self {
        Self { rule, reverse }
    }

    /// Walk `node`.
    pub fn run<T: Walk>(&mut self, node: T) -> CompileResult<T> {
        self.walk(node)
    }

    /// The rule, with whatever state it accumulated.
    pub fn rule(&self) -> &R {
        &self.rule
    }

    /// Take the rule back.
    pub fn into_rule(self) -> R {
        self.rule
    }
}

impl<R: RewriteRule> Walker for In<R> {
    fn walk<T: Walk>(&mut self, node: T) -> CompileResult<T> {
        let Binary {
            left,
            right,
            rebuild,
        } = match node.into_binary() {
            Ok(parts) => parts,
            Err(node) => {
                let node = node.apply(&mut self.rule)?;
                return if node.descend(&self.rule) {
                    node.walk_children(self)
                } else {
                    Ok(node)
                };
            }
        };

        if self.reverse {
            let right = self.walk(right)?;
            let node = rebuild(left, right).apply(&mut self.rule)?;
            match node.into_binary() {
                Ok(parts) => {
                    let left = self.walk(parts.left)?;
                    Ok((parts.rebuild)(left, parts.right))
                }
                Err(node) => Ok(node),
            }
        } else {
            let left = self.walk(left)?;
            let node = rebuild(left, right).apply(&mut self.rule)?;
            match node.into_binary() {
                Ok(parts) => {
                    let right = self.walk(parts.right)?;
                    Ok((parts.rebuild)(parts.left, right))
                }
                Err(node) => Ok(node),
            }
        }
    }
}

/// Level-order (breadth-first) walk.
///
/// Each sweep re-walks the tree down to one target depth and applies the rule
/// only there; sweeping stops once no node sits at the target depth.
#[derive(Debug, Clone)]
pub struct Level<R> {
    rule: R,
    target: usize,
    depth: usize,
    reached: bool,
}

impl<R: RewriteRule> Level<R> {
    /// Create a walk that owns `rule`.
    pub fn new(rule: R) -> Self {
        Self {
            rule,
            target: 0,
            depth: 0,
            reached: false,
        }
    }

    /// Walk `node`.
    pub fn run<T: Walk>(&mut self, node: T) -> CompileResult<T> {
        let mut node = node;
        self.target = 0;
        loop {
            self.depth = 0;
            self.reached = false;
            node = self.walk(node)?;
            if !self.reached {
                return Ok(node);
            }
            self.target += 1;
        }
    }

    /// The rule, with whatever state it accumulated.
    pub fn rule(&self) -> &R {
        &self.rule
    }

    /// Take the rule back.
    pub fn into_rule(self) -> R {
        self.rule
    }
}

impl<R: RewriteRule> Walker for Level<R> {
    fn walk<T: Walk>(&mut self, node: T) -> CompileResult<T> {
        if self.depth == self.target {
            self.reached = true;
            return node.apply(&mut self.rule);
        }
        self.depth += 1;
        let result = node.walk_children(self);
        self.depth -= 1;
        result
    }
}

/// A node kind that can be folded by a [`ConversionRule`].
pub trait Convert: Sized {
    /// Convert the operands, then the node itself.
    fn convert_with<C: ConversionRule<Self>>(&self, rule: &mut C) -> CompileResult<C::Output>;
}

impl Convert for MathExpr {
    fn convert_with<C: ConversionRule<Self>>(&self, rule: &mut C) -> CompileResult<C::Output> {
        let operands = match self {
            MathExpr::Neg(e) | MathExpr::Func(_, e) => vec![e.convert_with(rule)?],
            MathExpr::Add(a, b)
            | MathExpr::Sub(a, b)
            | MathExpr::Mul(a, b)
            | MathExpr::Div(a, b)
            | MathExpr::Pow(a, b) => vec![a.convert_with(rule)?, b.convert_with(rule)?],
            MathExpr::Num(_) | MathExpr::Var(_) | MathExpr::Raw(_) => Vec::new(),
        };
        rule.convert(self, operands)
    }
}

// The coefficient of a `Scale` is not an operand; rules read it from the node.
impl Convert for Operator {
    fn convert_with<C: ConversionRule<Self>>(&self, rule: &mut C) -> CompileResult<C::Output> {
        let operands = match self {
            Operator::Add(a, b) | Operator::Sub(a, b) | Operator::Mul(a, b) | Operator::Kron(a, b) => {
                vec![a.convert_with(rule)?, b.convert_with(rule)?]
            }
            Operator::Scale(_, op) => vec![op.convert_with(rule)?],
            _ => Vec::new(),
        };
        rule.convert(self, operands)
    }
}

/// Fold `node` bottom-up with `rule`.
pub fn convert<T: Convert, C: ConversionRule<T>>(rule: &mut C, node: &T) -> CompileResult<C::Output> {
    node.convert_with(rule)
}
