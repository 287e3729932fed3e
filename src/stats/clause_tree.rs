//! Per-clause running statistics.
//!
//! One [`ClauseStatsNode`] mirrors each node of a clause's logic tree and
//! accumulates counters over the run: pass/fail, near-miss, in-regime
//! pass/fail, gate cross-tabs for gated derived values, and observation
//! extremes. The tree is built once per run, owned exclusively by that run,
//! and finalized into an immutable [`ClauseReport`].
//!
//! Terminology: *in-regime* restricts to samples where every sibling
//! top-level clause already passed; a *last-mile* failure is a clause
//! failing on a sample where it was the sole remaining blocker.

use serde::{Deserialize, Serialize};

use crate::context::{ContextBuilder, EvaluationContext};
use crate::logic::{CompareOp, LogicNode, NodeOutcome};
use crate::namespace::{Namespace, PathRef};

use super::quantile::ReservoirQuantile;

/// Per-namespace near-miss epsilon table.
///
/// A comparison leaf counts as a near miss when the observed value lands
/// within epsilon of the threshold. The `[0, 1]`-scaled namespaces use a
/// tight default; the wider raw scales use proportionally larger ones.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NearMissEpsilons {
    /// Band for `emotions.*` / `previousEmotions.*`.
    pub emotions: f64,
    /// Band for `sexualStates.*` / `previousSexualStates.*`.
    pub sexual_states: f64,
    /// Band for the `sexualArousal` scalar.
    pub sexual_arousal: f64,
    /// Band for `moodAxes.*` / `previousMoodAxes.*`.
    pub mood_axes: f64,
    /// Band for `affectTraits.*`.
    pub affect_traits: f64,
}

impl Default for NearMissEpsilons {
    fn default() -> Self {
        Self {
            emotions: 0.05,
            sexual_states: 0.05,
            sexual_arousal: 0.05,
            mood_axes: 10.0,
            affect_traits: 5.0,
        }
    }
}

impl NearMissEpsilons {
    /// Epsilon for a variable path, by its namespace.
    #[must_use]
    pub fn for_path(&self, path: &str) -> Option<f64> {
        let path_ref = PathRef::resolve(path)?;
        Some(match path_ref.namespace {
            Namespace::Emotions => self.emotions,
            Namespace::SexualStates => self.sexual_states,
            Namespace::SexualArousal => self.sexual_arousal,
            Namespace::MoodAxes => self.mood_axes,
            Namespace::AffectTraits => self.affect_traits,
        })
    }
}

/// Threshold tuning hints, derived purely from the comparison operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TuningDirection {
    /// Change that makes the clause fire more often.
    pub loosen: String,
    /// Change that makes the clause fire less often.
    pub tighten: String,
}

impl TuningDirection {
    fn for_operator(op: CompareOp) -> Option<Self> {
        let (loosen, tighten) = match op {
            CompareOp::Ge | CompareOp::Gt => ("threshold_down", "threshold_up"),
            CompareOp::Le | CompareOp::Lt => ("threshold_up", "threshold_down"),
            CompareOp::Eq => return None,
        };
        Some(Self {
            loosen: loosen.to_string(),
            tighten: tighten.to_string(),
        })
    }
}

/// An observed min/max pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    /// Smallest observed value.
    pub min: f64,
    /// Largest observed value.
    pub max: f64,
}

/// Gate cross-tabulation counters, tracked in-regime for gated leaves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct GateCounters {
    pass: u64,
    fail: u64,
    pass_and_clause_pass: u64,
    pass_and_clause_fail: u64,
}

/// Running statistics for one logic node.
#[derive(Debug, Clone)]
pub struct ClauseStatsNode {
    description: String,
    var_path: Option<String>,
    operator: Option<CompareOp>,
    threshold: Option<f64>,
    epsilon: Option<f64>,
    gated: bool,

    pass_count: u64,
    fail_count: u64,
    near_miss_count: u64,
    in_regime_pass_count: u64,
    in_regime_fail_count: u64,
    gate: Option<GateCounters>,

    observed: ReservoirQuantile,
    in_regime_min: Option<f64>,
    in_regime_max: Option<f64>,

    children: Vec<ClauseStatsNode>,
}

impl ClauseStatsNode {
    /// Builds a statistics tree mirroring the clause's logic shape.
    #[must_use]
    pub fn build(
        node: &LogicNode,
        context_builder: &ContextBuilder,
        epsilons: &NearMissEpsilons,
    ) -> Self {
        let (var_path, operator, threshold) = match node {
            LogicNode::Compare {
                op,
                var_path,
                threshold,
                ..
            } => (var_path.clone(), Some(*op), *threshold),
            LogicNode::Var { path } => (Some(path.clone()), None, None),
            _ => (None, None, None),
        };

        let gated = var_path
            .as_deref()
            .is_some_and(|p| context_builder.is_gated(p));
        let epsilon = var_path.as_deref().and_then(|p| epsilons.for_path(p));

        let children = match node {
            LogicNode::And { children } | LogicNode::Or { children } => children
                .iter()
                .map(|c| Self::build(c, context_builder, epsilons))
                .collect(),
            LogicNode::Not { child } => vec![Self::build(child, context_builder, epsilons)],
            _ => Vec::new(),
        };

        Self {
            description: node.describe(),
            var_path,
            operator,
            threshold,
            epsilon,
            gated,
            pass_count: 0,
            fail_count: 0,
            near_miss_count: 0,
            in_regime_pass_count: 0,
            in_regime_fail_count: 0,
            gate: gated.then(GateCounters::default),
            observed: ReservoirQuantile::default(),
            in_regime_min: None,
            in_regime_max: None,
            children,
        }
    }

    /// Accumulates one sample's outcome.
    ///
    /// `in_regime` is true when every sibling top-level clause passed this
    /// sample; the flag applies to every node of this clause's tree.
    pub fn record(&mut self, outcome: &NodeOutcome, in_regime: bool, ctx: &EvaluationContext) {
        if outcome.passed {
            self.pass_count += 1;
        } else {
            self.fail_count += 1;
        }
        if in_regime {
            if outcome.passed {
                self.in_regime_pass_count += 1;
            } else {
                self.in_regime_fail_count += 1;
            }
        }

        let observed = outcome.leaf.as_ref().and_then(|l| l.observed);
        if let Some(value) = observed {
            self.observed.observe(value);
            if in_regime {
                self.in_regime_min = Some(self.in_regime_min.map_or(value, |m| m.min(value)));
                self.in_regime_max = Some(self.in_regime_max.map_or(value, |m| m.max(value)));
            }
            if let (Some(threshold), Some(epsilon)) = (self.threshold, self.epsilon) {
                if (value - threshold).abs() <= epsilon {
                    self.near_miss_count += 1;
                }
            }
        }

        if in_regime {
            if let (Some(gate), Some(path)) = (self.gate.as_mut(), self.var_path.as_deref()) {
                if let Some(gate_passed) = ctx.gate_passed(path) {
                    if gate_passed {
                        gate.pass += 1;
                        if outcome.passed {
                            gate.pass_and_clause_pass += 1;
                        } else {
                            gate.pass_and_clause_fail += 1;
                        }
                    } else {
                        gate.fail += 1;
                    }
                }
            }
        }

        for (child, child_outcome) in self.children.iter_mut().zip(&outcome.children) {
            child.record(child_outcome, in_regime, ctx);
        }
    }

    /// Finalizes into an immutable report.
    ///
    /// `others_passed_count`/`last_mile_fail_count` are clause-level inputs
    /// owned by the orchestrator; they only apply to the root node of each
    /// clause and are zero on interior reports.
    #[must_use]
    pub fn finalize(
        &self,
        others_passed_count: u64,
        last_mile_fail_count: u64,
        is_single_clause: bool,
    ) -> ClauseReport {
        let sample_count = self.pass_count + self.fail_count;
        #[allow(clippy::cast_precision_loss)]
        let failure_rate = if sample_count == 0 {
            0.0
        } else {
            self.fail_count as f64 / sample_count as f64
        };
        #[allow(clippy::cast_precision_loss)]
        let near_miss_rate = if sample_count == 0 {
            0.0
        } else {
            self.near_miss_count as f64 / sample_count as f64
        };

        let achievable_range = match (self.observed.min(), self.observed.max()) {
            (Some(min), Some(max)) => Some(ValueRange { min, max }),
            _ => None,
        };
        let in_regime_achievable_range = match (self.in_regime_min, self.in_regime_max) {
            (Some(min), Some(max)) => Some(ValueRange { min, max }),
            _ => None,
        };

        let gate_report = self.gate.map(|gate| {
            #[allow(clippy::cast_precision_loss)]
            let gate_pass_rate = if gate.pass + gate.fail == 0 {
                None
            } else {
                Some(gate.pass as f64 / (gate.pass + gate.fail) as f64)
            };
            #[allow(clippy::cast_precision_loss)]
            let pass_rate_given_gate = if gate.pass == 0 {
                None
            } else {
                Some(gate.pass_and_clause_pass as f64 / gate.pass as f64)
            };
            GateReport {
                gate_pass_in_regime_count: gate.pass,
                gate_fail_in_regime_count: gate.fail,
                gate_pass_and_clause_pass_in_regime_count: gate.pass_and_clause_pass,
                gate_pass_and_clause_fail_in_regime_count: gate.pass_and_clause_fail,
                gate_pass_rate_in_regime: gate_pass_rate,
                gate_clamp_rate_in_regime: gate_pass_rate.map(|r| 1.0 - r),
                pass_rate_given_gate_in_regime: pass_rate_given_gate,
            }
        });

        #[allow(clippy::cast_precision_loss)]
        let last_mile_fail_rate = if others_passed_count == 0 {
            None
        } else {
            Some(last_mile_fail_count as f64 / others_passed_count as f64)
        };

        let redundant_in_regime = self.redundant_in_regime(in_regime_achievable_range);

        let ceiling_gap = match (self.operator, self.threshold, self.observed.max()) {
            (Some(op), Some(threshold), Some(max)) if op.is_upward() => {
                Some((threshold - max).max(0.0))
            }
            _ => None,
        };

        ClauseReport {
            description: self.description.clone(),
            variable_path: self.var_path.clone(),
            comparison_operator: self.operator,
            threshold_value: self.threshold,
            sample_count,
            pass_count: self.pass_count,
            failure_count: self.fail_count,
            failure_rate,
            near_miss_count: self.near_miss_count,
            near_miss_rate,
            in_regime_pass_count: self.in_regime_pass_count,
            in_regime_fail_count: self.in_regime_fail_count,
            max_observed_value: self.observed.max(),
            observed_p99: self.observed.estimate(0.99),
            achievable_range,
            in_regime_achievable_range,
            gate: gate_report,
            others_passed_count,
            last_mile_fail_count,
            last_mile_fail_rate,
            redundant_in_regime,
            tuning_direction: self.operator.and_then(TuningDirection::for_operator),
            ceiling_gap,
            is_single_clause,
            children: self
                .children
                .iter()
                .map(|c| c.finalize(0, 0, is_single_clause))
                .collect(),
        }
    }

    /// Whether the in-regime achievable range cannot change the threshold
    /// outcome: every achievable value lands on the same side.
    fn redundant_in_regime(&self, range: Option<ValueRange>) -> bool {
        let (Some(op), Some(threshold), Some(range)) = (self.operator, self.threshold, range)
        else {
            return false;
        };
        match op {
            CompareOp::Ge | CompareOp::Gt | CompareOp::Le | CompareOp::Lt => {
                // Monotone outcome: same result at both extremes means the
                // whole range agrees.
                op.compare(range.min, threshold) == op.compare(range.max, threshold)
            }
            CompareOp::Eq => threshold < range.min || threshold > range.max,
        }
    }
}

/// Gate statistics for a gated leaf; absent entirely for non-gated leaves.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GateReport {
    /// In-regime samples where the gates held.
    pub gate_pass_in_regime_count: u64,
    /// In-regime samples where the value was gate-clamped.
    pub gate_fail_in_regime_count: u64,
    /// Gates held and the clause passed.
    pub gate_pass_and_clause_pass_in_regime_count: u64,
    /// Gates held but the clause still failed.
    pub gate_pass_and_clause_fail_in_regime_count: u64,
    /// Fraction of in-regime samples where the gates held.
    pub gate_pass_rate_in_regime: Option<f64>,
    /// Complement of the gate pass rate.
    pub gate_clamp_rate_in_regime: Option<f64>,
    /// Clause pass rate conditioned on the gates holding.
    pub pass_rate_given_gate_in_regime: Option<f64>,
}

/// Immutable per-node report, produced once at finalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClauseReport {
    /// Human-readable rendering of the node.
    pub description: String,
    /// Canonical variable path for comparison/var leaves.
    pub variable_path: Option<String>,
    /// Comparison operator for comparison leaves.
    pub comparison_operator: Option<CompareOp>,
    /// Numeric threshold for comparison leaves.
    pub threshold_value: Option<f64>,

    /// Samples this node was evaluated against.
    pub sample_count: u64,
    /// Samples where the node held.
    pub pass_count: u64,
    /// Samples where the node failed.
    pub failure_count: u64,
    /// `failure_count / sample_count`, 0 for an empty run.
    pub failure_rate: f64,
    /// Samples where the observed value landed within epsilon of the threshold.
    pub near_miss_count: u64,
    /// `near_miss_count / sample_count`, 0 for an empty run.
    pub near_miss_rate: f64,
    /// In-regime samples where the node held.
    pub in_regime_pass_count: u64,
    /// In-regime samples where the node failed.
    pub in_regime_fail_count: u64,

    /// Largest value observed at this leaf.
    pub max_observed_value: Option<f64>,
    /// Estimated 99th percentile, never above `max_observed_value`.
    pub observed_p99: Option<f64>,
    /// Observed min/max over all samples.
    pub achievable_range: Option<ValueRange>,
    /// Observed min/max restricted to in-regime samples.
    pub in_regime_achievable_range: Option<ValueRange>,

    /// `None` for leaves that do not reference a gated derived value.
    pub gate: Option<GateReport>,

    /// Samples where every sibling top-level clause passed.
    pub others_passed_count: u64,
    /// Samples where this clause was the sole remaining blocker.
    pub last_mile_fail_count: u64,
    /// `last_mile_fail_count / others_passed_count`, `None` when the
    /// denominator is zero.
    pub last_mile_fail_rate: Option<f64>,

    /// The in-regime achievable range cannot change the threshold outcome.
    pub redundant_in_regime: bool,
    /// Which threshold change loosens/tightens the clause.
    pub tuning_direction: Option<TuningDirection>,
    /// `max(threshold - max_observed, 0)` for upward comparisons.
    pub ceiling_gap: Option<f64>,
    /// Whether the owning expression has exactly one prerequisite.
    pub is_single_clause: bool,

    /// Reports for child nodes, mirroring the logic tree.
    pub children: Vec<ClauseReport>,
}
