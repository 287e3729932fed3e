//! Per-sample evaluation of parsed clause logic.
//!
//! Evaluation returns a full [`NodeOutcome`] tree rather than a bare
//! boolean: the clause statistics tree consumes one outcome per AST node,
//! so `and`/`or` never short-circuit. Faults (unknown paths, non-numeric
//! reads, unsupported operators) evaluate to a failing leaf, never an error.

use crate::context::EvaluationContext;

use super::ast::{CompareOp, Literal, LogicNode};

/// What a comparison leaf observed this sample.
///
/// Every field is optional: `threshold` is absent for non-numeric
/// comparisons, `var_path` when the node is not a simple variable-vs-literal
/// comparison, and `observed` when the variable did not resolve to a number.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LeafObservation {
    /// Canonical variable path, for simple variable-vs-literal comparisons.
    pub var_path: Option<String>,
    /// Comparison operator, for comparison leaves.
    pub operator: Option<CompareOp>,
    /// Numeric threshold, when the literal operand was a number.
    pub threshold: Option<f64>,
    /// The value the variable resolved to this sample.
    pub observed: Option<f64>,
}

/// Evaluation outcome for one AST node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeOutcome {
    /// Whether this node held for the sample.
    pub passed: bool,
    /// Leaf detail; `None` for `and`/`or`/`not` interior nodes.
    pub leaf: Option<LeafObservation>,
    /// Outcomes of child nodes, mirroring the AST shape.
    pub children: Vec<NodeOutcome>,
}

impl NodeOutcome {
    fn leaf(passed: bool, observation: LeafObservation) -> Self {
        Self {
            passed,
            leaf: Some(observation),
            children: Vec::new(),
        }
    }

    /// Number of failing leaves in this subtree.
    #[must_use]
    pub fn failed_leaf_count(&self) -> usize {
        if self.children.is_empty() {
            return usize::from(!self.passed && self.leaf.is_some());
        }
        self.children.iter().map(Self::failed_leaf_count).sum()
    }
}

/// A resolved operand value.
enum Resolved {
    Number(f64),
    Bool(bool),
    Str(String),
    Missing,
}

impl Resolved {
    fn truthy(&self) -> bool {
        match self {
            Self::Number(n) => *n != 0.0,
            Self::Bool(b) => *b,
            Self::Str(s) => !s.is_empty(),
            Self::Missing => false,
        }
    }
}

impl LogicNode {
    /// Evaluates this node against a sample's context.
    #[must_use]
    pub fn evaluate(&self, ctx: &EvaluationContext) -> NodeOutcome {
        match self {
            Self::Var { path } => {
                let observed = ctx.value(path);
                NodeOutcome::leaf(
                    observed.is_some_and(|v| v != 0.0),
                    LeafObservation {
                        var_path: Some(path.clone()),
                        observed,
                        ..LeafObservation::default()
                    },
                )
            }

            Self::Literal { value } => NodeOutcome::leaf(
                literal_resolved(value).truthy(),
                LeafObservation::default(),
            ),

            Self::Compare {
                op,
                lhs,
                rhs,
                var_path,
                threshold,
            } => {
                let passed = compare(*op, &resolve(lhs, ctx), &resolve(rhs, ctx));
                // Observed is absent only when the variable itself does not
                // resolve to a number, regardless of the literal's type.
                let observed = var_path.as_deref().and_then(|path| ctx.value(path));
                NodeOutcome::leaf(
                    passed,
                    LeafObservation {
                        var_path: var_path.clone(),
                        operator: Some(*op),
                        threshold: *threshold,
                        observed,
                    },
                )
            }

            Self::And { children } => {
                let outcomes: Vec<NodeOutcome> =
                    children.iter().map(|c| c.evaluate(ctx)).collect();
                // Empty conjunction is vacuously true.
                let passed = outcomes.iter().all(|o| o.passed);
                NodeOutcome {
                    passed,
                    leaf: None,
                    children: outcomes,
                }
            }

            Self::Or { children } => {
                let outcomes: Vec<NodeOutcome> =
                    children.iter().map(|c| c.evaluate(ctx)).collect();
                let passed = outcomes.iter().any(|o| o.passed);
                NodeOutcome {
                    passed,
                    leaf: None,
                    children: outcomes,
                }
            }

            Self::Not { child } => {
                let outcome = child.evaluate(ctx);
                NodeOutcome {
                    passed: !outcome.passed,
                    leaf: None,
                    children: vec![outcome],
                }
            }

            Self::Unsupported { .. } => NodeOutcome::leaf(false, LeafObservation::default()),
        }
    }
}

fn literal_resolved(value: &Literal) -> Resolved {
    match value {
        Literal::Number(n) => Resolved::Number(*n),
        Literal::Bool(b) => Resolved::Bool(*b),
        Literal::Str(s) => Resolved::Str(s.clone()),
    }
}

/// Resolves an operand to a runtime value. Interior logic used as an
/// operand resolves to its boolean outcome.
fn resolve(node: &LogicNode, ctx: &EvaluationContext) -> Resolved {
    match node {
        LogicNode::Var { path } => ctx.value(path).map_or(Resolved::Missing, Resolved::Number),
        LogicNode::Literal { value } => literal_resolved(value),
        LogicNode::Unsupported { .. } => Resolved::Missing,
        other => Resolved::Bool(other.evaluate(ctx).passed),
    }
}

fn compare(op: CompareOp, lhs: &Resolved, rhs: &Resolved) -> bool {
    match (lhs, rhs) {
        (Resolved::Number(a), Resolved::Number(b)) => op.compare(*a, *b),
        (Resolved::Bool(a), Resolved::Bool(b)) if op == CompareOp::Eq => a == b,
        (Resolved::Str(a), Resolved::Str(b)) if op == CompareOp::Eq => a == b,
        // Missing operands and type mismatches fail the leaf.
        _ => false,
    }
}

/// Collects `"<clause> (observed <v>)"` descriptions for every failing leaf,
/// walking the AST and its outcome in lockstep.
pub fn collect_failed_leaves(node: &LogicNode, outcome: &NodeOutcome, out: &mut Vec<String>) {
    if outcome.children.is_empty() {
        if !outcome.passed && outcome.leaf.is_some() {
            let observed = outcome
                .leaf
                .as_ref()
                .and_then(|l| l.observed)
                .map_or(String::new(), |v| format!(" (observed {v:.4})"));
            out.push(format!("{}{observed}", node.describe()));
        }
        return;
    }

    let children: &[LogicNode] = match node {
        LogicNode::And { children } | LogicNode::Or { children } => children,
        LogicNode::Not { child } => std::slice::from_ref(child),
        _ => &[],
    };
    for (child, child_outcome) in children.iter().zip(&outcome.children) {
        collect_failed_leaves(child, child_outcome, out);
    }
}
