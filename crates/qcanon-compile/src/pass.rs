//! Pass trait and pass combinators.

use tracing::{debug, trace, warn};

use crate::config::DEFAULT_MAX_ITER;
use crate::error::CompileResult;
use crate::rule::RewriteRule;
use crate::traversal::{In, Level, Post, Pre, Walk};

/// The kind of compilation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassKind {
    /// Checks the tree and returns it unchanged, or fails.
    Analysis,
    /// Rewrites the tree.
    Transformation,
    /// Runs sub-passes in order.
    Chain,
    /// Repeats a sub-pass until the tree stops changing.
    FixedPoint,
}

/// A compilation pass over values of type `T`.
///
/// A pass takes ownership of its input and returns the transformed value.
/// Passes are stateless between runs so that one pass tree can be shared.
pub trait Pass<T>: Send + Sync {
    /// Get the name of this pass.
    fn name(&self) -> &str;

    /// Get the kind of this pass.
    fn kind(&self) -> PassKind;

    /// Run the pass.
    fn run(&self, input: T) -> CompileResult<T>;

    /// Passes this pass is composed of.
    fn sub_passes(&self) -> Vec<&dyn Pass<T>> {
        Vec::new()
    }
}

/// Order in which a [`WalkPass`] visits nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Children before parents.
    Post,
    /// Parents before children.
    Pre,
    /// Left operand, node, right operand.
    In {
        /// Visit the right operand first.
        reverse: bool,
    },
    /// Breadth-first.
    Level,
}

/// A pass that walks the tree with a rewrite rule.
///
/// The rule stored here is a prototype: every run walks with a fresh clone,
/// so state a rule accumulates never leaks into the next run.
#[derive(Debug, Clone)]
pub struct WalkPass<R> {
    name: String,
    rule: R,
    strategy: Strategy,
    kind: PassKind,
}

impl<R: RewriteRule + Clone + Send + Sync> WalkPass<R> {
    /// Create a pass walking with `strategy`.
    pub fn new(rule: R, strategy: Strategy) -> Self {
        Self {
            name: rule.name().to_string(),
            rule,
            strategy,
            kind: PassKind::Transformation,
        }
    }

    /// Post-order pass.
    pub fn post(rule: R) -> Self {
        Self::new(rule, Strategy::Post)
    }

    /// Pre-order pass.
    pub fn pre(rule: R) -> Self {
        Self::new(rule, Strategy::Pre)
    }

    /// In-order pass.
    pub fn in_order(rule: R, reverse: bool) -> Self {
        Self::new(rule, Strategy::In { reverse })
    }

    /// Level-order pass.
    pub fn level(rule: R) -> Self {
        Self::new(rule, Strategy::Level)
    }

    /// Mark the pass as a check that never rewrites.
    #[must_use]
    pub fn verification(mut self) -> Self {
        self.kind = PassKind::Analysis;
        self
    }

    /// The walk order.
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }
}

impl<T: Walk, R: RewriteRule + Clone + Send + Sync> Pass<T> for WalkPass<R> {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> PassKind {
        self.kind
    }

    fn run(&self, input: T) -> CompileResult<T> {
        trace!("Walking {:?} with {}", self.strategy, self.name);
        let rule = self.rule.clone();
        match self.strategy {
            Strategy::Post => Post::new(rule).run(input),
            Strategy::Pre => Pre::new(rule).run(input),
            Strategy::In { reverse } => In::new(rule, reverse).run(input),
            Strategy::Level => Level::new(rule).run(input),
        }
    }
}

/// Runs passes in order.
pub struct Chain<T> {
    name: String,
    passes: Vec<Box<dyn Pass<T>>>,
}

impl<T> Chain<T> {
    /// Create an empty chain.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passes: vec![],
        }
    }

    /// Append a pass.
    #[must_use]
    pub fn with(mut self, pass: impl Pass<T> + 'static) -> Self {
        self.passes.push(Box::new(pass));
        self
    }

    /// Get the number of passes.
    pub fn len(&self) -> usize {
        self.passes.len()
    }

    /// Check if the chain has no passes.
    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }
}

impl<T> Pass<T> for Chain<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> PassKind {
        PassKind::Chain
    }

    fn run(&self, input: T) -> CompileResult<T> {
        let mut value = input;
        for pass in &self.passes {
            debug!("Running pass: {}", pass.name());
            value = pass.run(value)?;
        }
        Ok(value)
    }

    fn sub_passes(&self) -> Vec<&dyn Pass<T>> {
        self.passes.iter().map(|p| p.as_ref()).collect()
    }
}

/// Outcome of a fixed-point run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Convergence {
    /// Whether the last iteration left the value unchanged.
    pub converged: bool,
    /// Number of iterations run.
    pub iterations: usize,
}

/// Repeats a pass until its output equals its input.
///
/// Hitting the iteration cap is not an error: the last value is returned and
/// a warning is logged. Use [`FixedPoint::run_with_report`] to observe it.
pub struct FixedPoint<T> {
    name: String,
    pass: Box<dyn Pass<T>>,
    max_iter: usize,
}

impl<T: Clone + PartialEq> FixedPoint<T> {
    /// Wrap `pass` with the default iteration cap.
    pub fn new(pass: impl Pass<T> + 'static) -> Self {
        Self {
            name: format!("FixedPoint({})", pass.name()),
            pass: Box::new(pass),
            max_iter: DEFAULT_MAX_ITER,
        }
    }

    /// Set the iteration cap.
    #[must_use]
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter.max(1);
        self
    }

    /// Run to convergence and report how it went.
    pub fn run_with_report(&self, input: T) -> CompileResult<(T, Convergence)> {
        let mut current = input;
        for iteration in 1..=self.max_iter {
            let next = self.pass.run(current.clone())?;
            if next == current {
                return Ok((
                    next,
                    Convergence {
                        converged: true,
                        iterations: iteration,
                    },
                ));
            }
            current = next;
        }
        Ok((
            current,
            Convergence {
                converged: false,
                iterations: self.max_iter,
            },
        ))
    }
}

impl<T: Clone + PartialEq> Pass<T> for FixedPoint<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> PassKind {
        PassKind::FixedPoint
    }

    fn run(&self, input: T) -> CompileResult<T> {
        let (value, convergence) = self.run_with_report(input)?;
        if convergence.converged {
            debug!(
                "{} converged after {} iteration(s)",
                self.name, convergence.iterations
            );
        } else {
            warn!(
                "{} did not converge within {} iterations",
                self.name, self.max_iter
            );
        }
        Ok(value)
    }

    fn sub_passes(&self) -> Vec<&dyn Pass<T>> {
        vec![self.pass.as_ref()]
    }
}

/// Render a pass tree as indented text, one pass per line.
pub fn describe_pass<T>(pass: &dyn Pass<T>) -> String {
    let mut out = String::new();
    describe_into(pass, 0, &mut out);
    out
}

fn describe_into<T>(pass: &dyn Pass<T>, depth: usize, out: &mut String) {
    out.push_str(&"  ".repeat(depth));
    out.push_str(pass.name());
    out.push_str(&format!(" [{:?}]\n", pass.kind()));
    for sub in pass.sub_passes() {
        describe_into(sub, depth + 1, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qcanon_ir::Operator;
    use serde_json::{Value, json};

    /// Decrements positive integers by one per walk.
    #[derive(Clone)]
    struct Countdown;

    impl RewriteRule for Countdown {
        fn map_value(&mut self, value: &Value) -> CompileResult<Option<Value>> {
            Ok(value.as_i64().filter(|n| *n > 0).map(|n| json!(n - 1)))
        }
    }

    #[derive(Clone)]
    struct SwapXY;

    impl RewriteRule for SwapXY {
        fn map_operator(&mut self, op: &Operator) -> CompileResult<Option<Operator>> {
            Ok(match op {
                Operator::PauliX => Some(Operator::PauliY),
                Operator::PauliY => Some(Operator::PauliX),
                _ => None,
            })
        }
    }

    #[test]
    fn test_walk_pass_name_and_kind() {
        let pass = WalkPass::post(Countdown);
        assert_eq!(Pass::<Value>::name(&pass), "Countdown");
        assert_eq!(Pass::<Value>::kind(&pass), PassKind::Transformation);
        assert_eq!(
            Pass::<Value>::kind(&pass.verification()),
            PassKind::Analysis
        );
    }

    #[test]
    fn test_chain_runs_in_order() {
        let chain: Chain<Value> = Chain::new("twice")
            .with(WalkPass::post(Countdown))
            .with(WalkPass::pre(Countdown));
        assert_eq!(chain.len(), 2);
        assert_eq!(chain.run(json!([5, 1])).unwrap(), json!([3, 0]));
    }

    #[test]
    fn test_fixed_point_converges() {
        let pass: FixedPoint<Value> = FixedPoint::new(WalkPass::post(Countdown));
        let (value, report) = pass.run_with_report(json!([3, [1]])).unwrap();
        assert_eq!(value, json!([0, [0]]));
        assert!(report.converged);
        // Three productive iterations plus the one that confirms the fixed point.
        assert_eq!(report.iterations, 4);
    }

    #[test]
    fn test_fixed_point_cap() {
        let pass: FixedPoint<Operator> = FixedPoint::new(WalkPass::post(SwapXY)).with_max_iter(5);
        let (value, report) = pass.run_with_report(Operator::PauliX).unwrap();
        assert!(!report.converged);
        assert_eq!(report.iterations, 5);
        assert_eq!(value, Operator::PauliY);
        assert_eq!(pass.run(Operator::PauliX).unwrap(), Operator::PauliY);
    }

    #[test]
    fn test_describe_pass() {
        let chain: Chain<Operator> = Chain::new("outer")
            .with(FixedPoint::new(WalkPass::post(SwapXY)))
            .with(WalkPass::pre(SwapXY).verification());
        let text = describe_pass(&chain);
        assert_eq!(
            text,
            "outer [Chain]\n  FixedPoint(SwapXY) [FixedPoint]\n    SwapXY [Transformation]\n  SwapXY [Analysis]\n"
        );
    }
}
