//! Simulation orchestrator.
//!
//! [`Simulator::run`] drives the full diagnostic pass: validate variable
//! paths, build the per-clause statistics trees, loop the sampler in fixed
//! chunks, and finalize into an immutable [`SimulationResult`]. Each run
//! owns its statistics and counters outright, so concurrent independent
//! runs are safe by construction. The chunk boundary is the cooperative
//! checkpoint: the progress callback fires there, and a caller that wants
//! cancellation simply stops consuming the result (no cleanup obligation,
//! nothing external is acquired).

mod result;

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, info};

use crate::context::ContextBuilder;
use crate::error::{SimResult, ValidationError};
use crate::expression::Expression;
use crate::logic::evaluator::collect_failed_leaves;
use crate::logic::{CompareOp, LogicNode};
use crate::namespace::{Namespace, PathRef};
use crate::registry::LookupRegistry;
use crate::state::{Distribution, StateSampler};
use crate::stats::{wilson_interval, ClauseStatsNode, CoverageConfig, NearMissEpsilons};
use crate::stats::coverage::CoverageTracker;
use crate::validate::validate_paths;

pub use result::{
    GateCompatibility, NearMissCandidate, SimulationResult, Witness, WitnessAnalysis,
};

/// Samples processed between cooperative checkpoints.
pub const DEFAULT_CHUNK_SIZE: u64 = 1000;

/// Simulation run configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    /// Monte Carlo draws per run.
    pub sample_count: u64,
    /// Raw state distribution.
    pub distribution: Distribution,
    /// Confidence level for the trigger-rate interval, e.g. 0.95.
    pub confidence_level: f64,
    /// Whether to build and update the per-clause statistics trees.
    pub track_clauses: bool,
    /// Maximum satisfying snapshots to capture.
    pub max_witnesses: usize,
    /// Whether to validate referenced variable paths before sampling.
    pub validate_var_paths: bool,
    /// Reject the run (before sampling) when any path warning exists.
    pub fail_on_unseeded_vars: bool,
    /// Per-namespace near-miss epsilon table.
    pub near_miss_epsilons: NearMissEpsilons,
    /// Per-variable sampling histograms, when set.
    pub coverage: Option<CoverageConfig>,
    /// Samples per chunk between progress checkpoints.
    pub chunk_size: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            sample_count: 10_000,
            distribution: Distribution::Uniform,
            confidence_level: 0.95,
            track_clauses: true,
            max_witnesses: 5,
            validate_var_paths: true,
            fail_on_unseeded_vars: false,
            near_miss_epsilons: NearMissEpsilons::default(),
            coverage: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl SimulationConfig {
    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.sample_count == 0 {
            return Err(ValidationError::ZeroSampleCount);
        }
        if !(self.confidence_level > 0.0 && self.confidence_level < 1.0) {
            return Err(ValidationError::ConfidenceLevelOutOfRange {
                value: self.confidence_level,
            });
        }
        if self.chunk_size == 0 {
            return Err(ValidationError::ZeroChunkSize);
        }
        if let Some(coverage) = &self.coverage {
            if coverage.bin_count == 0 {
                return Err(ValidationError::ZeroBinCount);
            }
        }
        Ok(())
    }
}

/// Drives diagnostic runs against a prototype registry.
pub struct Simulator<'cb> {
    registry: Arc<dyn LookupRegistry>,
    config: SimulationConfig,
    seed: Option<u64>,
    on_progress: Option<Box<dyn FnMut(u64, u64) + 'cb>>,
}

impl<'cb> Simulator<'cb> {
    /// Creates a simulator with the default configuration.
    #[must_use]
    pub fn new(registry: Arc<dyn LookupRegistry>) -> Self {
        Self {
            registry,
            config: SimulationConfig::default(),
            seed: None,
            on_progress: None,
        }
    }

    /// Replaces the configuration.
    #[must_use]
    pub fn with_config(mut self, config: SimulationConfig) -> Self {
        self.config = config;
        self
    }

    /// Seeds the sampler for a reproducible run.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Installs a progress callback, invoked as `(completed, total)` after
    /// every chunk. The final call is guaranteed to report
    /// `completed == sample_count`, including at exact chunk multiples.
    #[must_use]
    pub fn on_progress(mut self, callback: impl FnMut(u64, u64) + 'cb) -> Self {
        self.on_progress = Some(Box::new(callback));
        self
    }

    /// Runs the full diagnostic pass.
    ///
    /// # Errors
    ///
    /// Rejects before sampling on invalid configuration, or on unseeded
    /// variable paths when `fail_on_unseeded_vars` is set. Everything else
    /// degrades locally: bad clauses and missing data fail their leaves
    /// instead of aborting the run.
    pub fn run(mut self, expression: &Expression) -> SimResult<SimulationResult> {
        self.config.validate()?;
        if expression.id.trim().is_empty() {
            return Err(ValidationError::EmptyExpressionId.into());
        }

        let clauses: Vec<LogicNode> = expression
            .prerequisites
            .iter()
            .map(|c| LogicNode::parse(&c.logic))
            .collect();

        let referenced_paths = collect_paths(&clauses);
        let context_builder = ContextBuilder::new(self.registry.as_ref());

        let warnings = if self.config.validate_var_paths {
            validate_paths(&referenced_paths, &context_builder)
        } else {
            Vec::new()
        };
        if self.config.fail_on_unseeded_vars && !warnings.is_empty() {
            return Err(ValidationError::UnseededVariables {
                paths: warnings.iter().map(|w| w.path.clone()).collect(),
            }
            .into());
        }

        let mut stats: Vec<ClauseStatsNode> = if self.config.track_clauses {
            clauses
                .iter()
                .map(|c| ClauseStatsNode::build(c, &context_builder, &self.config.near_miss_epsilons))
                .collect()
        } else {
            Vec::new()
        };
        let mut others_passed_counts = vec![0_u64; clauses.len()];
        let mut last_mile_fail_counts = vec![0_u64; clauses.len()];

        let coverage_variables: Vec<(String, (f64, f64))> = referenced_paths
            .iter()
            .filter_map(|path| {
                let path_ref = PathRef::resolve(path)?;
                if path_ref.namespace.is_scalar() != path_ref.key.is_none() {
                    return None;
                }
                Some((path.clone(), path_ref.namespace.value_range()))
            })
            .collect();
        let mut coverage = self
            .config
            .coverage
            .map(|config| CoverageTracker::new(config, &coverage_variables));

        let mut sampler = match self.seed {
            Some(seed) => StateSampler::with_seed(self.config.distribution, seed),
            None => StateSampler::new(self.config.distribution),
        };

        debug!(
            expression = %expression.id,
            samples = self.config.sample_count,
            clauses = clauses.len(),
            "starting simulation run"
        );

        let total = self.config.sample_count;
        let mut trigger_count = 0_u64;
        let mut witnesses: Vec<Witness> = Vec::new();
        let mut nearest_miss: Option<NearMissCandidate> = None;

        let mut completed = 0_u64;
        while completed < total {
            let chunk = self.config.chunk_size.min(total - completed);
            for _ in 0..chunk {
                let state = sampler.generate();
                let ctx = context_builder.build(&state);

                if let Some(tracker) = coverage.as_mut() {
                    for (path, _) in &coverage_variables {
                        if let Some(value) = ctx.value(path) {
                            tracker.record(path, value);
                        }
                    }
                }

                let outcomes: Vec<_> = clauses.iter().map(|c| c.evaluate(&ctx)).collect();
                let passed: Vec<bool> = outcomes.iter().map(|o| o.passed).collect();
                let fired = passed.iter().all(|p| *p);

                for index in 0..clauses.len() {
                    let others_passed = passed
                        .iter()
                        .enumerate()
                        .all(|(j, p)| j == index || *p);
                    if others_passed {
                        others_passed_counts[index] += 1;
                        if !passed[index] {
                            last_mile_fail_counts[index] += 1;
                        }
                    }
                    if let Some(node) = stats.get_mut(index) {
                        node.record(&outcomes[index], others_passed, &ctx);
                    }
                }

                if fired {
                    trigger_count += 1;
                    if witnesses.len() < self.config.max_witnesses {
                        witnesses.push(state.clone());
                    }
                } else if witnesses.is_empty() {
                    let failed_leaf_count: usize =
                        outcomes.iter().map(crate::logic::NodeOutcome::failed_leaf_count).sum();
                    let closer = nearest_miss
                        .as_ref()
                        .map_or(true, |best| failed_leaf_count < best.failed_leaf_count);
                    if closer {
                        let mut failed_leaves = Vec::new();
                        for (clause, outcome) in clauses.iter().zip(&outcomes) {
                            collect_failed_leaves(clause, outcome, &mut failed_leaves);
                        }
                        nearest_miss = Some(NearMissCandidate {
                            state,
                            failed_leaf_count,
                            failed_leaves,
                        });
                    }
                }
            }

            completed += chunk;
            // Cooperative checkpoint between chunks.
            if let Some(callback) = self.on_progress.as_mut() {
                callback(completed, total);
            }
        }

        #[allow(clippy::cast_precision_loss)]
        let trigger_rate = trigger_count as f64 / total as f64;
        let confidence_interval =
            wilson_interval(trigger_count, total, self.config.confidence_level);

        let is_single_clause = clauses.len() == 1;
        let mut clause_failures: Vec<_> = stats
            .iter()
            .enumerate()
            .map(|(index, node)| {
                node.finalize(
                    others_passed_counts[index],
                    last_mile_fail_counts[index],
                    is_single_clause,
                )
            })
            .collect();
        clause_failures.sort_by(|a, b| {
            b.failure_rate
                .partial_cmp(&a.failure_rate)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let gate_compatibility = check_gate_compatibility(&clauses, &referenced_paths, &context_builder);

        let best_witness = witnesses.first().cloned();
        if best_witness.is_some() {
            nearest_miss = None;
        }

        info!(
            expression = %expression.id,
            trigger_rate,
            trigger_count,
            samples = total,
            "simulation run complete"
        );

        Ok(SimulationResult {
            expression_id: expression.id.clone(),
            trigger_count,
            sample_count: total,
            trigger_rate,
            confidence_interval,
            distribution: self.config.distribution,
            clause_failures,
            sampling_coverage: coverage.map(CoverageTracker::finalize),
            witness_analysis: WitnessAnalysis {
                witnesses,
                best_witness,
                nearest_miss,
            },
            gate_compatibility,
            unseeded_var_warnings: warnings,
        })
    }
}

/// Every variable path referenced by the clauses, deduplicated in
/// first-reference order.
fn collect_paths(clauses: &[LogicNode]) -> Vec<String> {
    let mut raw = Vec::new();
    for clause in clauses {
        clause.collect_var_paths(&mut raw);
    }
    let mut seen = BTreeSet::new();
    raw.into_iter().filter(|p| seen.insert(p.clone())).collect()
}

/// One axis constraint extracted from the expression's own clauses.
struct AxisConstraint {
    axis: String,
    op: CompareOp,
    threshold: f64,
    description: String,
}

/// Structural check: does any referenced gated value carry a gate that the
/// expression's own raw-axis constraints make unsatisfiable?
fn check_gate_compatibility(
    clauses: &[LogicNode],
    referenced_paths: &[String],
    builder: &ContextBuilder,
) -> Vec<GateCompatibility> {
    let mut constraints = Vec::new();
    for clause in clauses {
        collect_axis_constraints(clause, &mut constraints);
    }

    referenced_paths
        .iter()
        .filter(|path| builder.is_gated(path.as_str()))
        .map(|path| {
            for gate in builder.gates_for(path) {
                for constraint in constraints.iter().filter(|c| c.axis == gate.axis) {
                    if !ranges_intersect(
                        (gate.op, gate.threshold),
                        (constraint.op, constraint.threshold),
                    ) {
                        return GateCompatibility {
                            gated_value: path.clone(),
                            compatible: false,
                            reason: Some(format!(
                                "gate '{} {} {}' on {} cannot hold while the expression requires '{}'",
                                gate.axis, gate.op, gate.threshold, path, constraint.description,
                            )),
                        };
                    }
                }
            }
            GateCompatibility {
                gated_value: path.clone(),
                compatible: true,
                reason: None,
            }
        })
        .collect()
}

/// Collects `moodAxes.*`/`affectTraits.*` comparison leaves as raw-axis
/// constraints (the scales gate inequalities are written against). Only
/// conjunctively required leaves count: a constraint inside an `or` is an
/// alternative, not a requirement.
fn collect_axis_constraints(node: &LogicNode, out: &mut Vec<AxisConstraint>) {
    match node {
        LogicNode::Compare {
            op,
            var_path: Some(path),
            threshold: Some(threshold),
            ..
        } => {
            let Some(path_ref) = PathRef::resolve(path) else {
                return;
            };
            if path_ref.previous {
                return;
            }
            if !matches!(
                path_ref.namespace,
                Namespace::MoodAxes | Namespace::AffectTraits
            ) {
                return;
            }
            if let Some(axis) = path_ref.key {
                out.push(AxisConstraint {
                    axis,
                    op: *op,
                    threshold: *threshold,
                    description: node.describe(),
                });
            }
        }
        LogicNode::And { children } => {
            for child in children {
                collect_axis_constraints(child, out);
            }
        }
        // `or` branches are alternatives and negation inverts; neither is
        // a binding requirement, so skip rather than misreport.
        LogicNode::Or { .. } | LogicNode::Not { .. } => {}
        _ => {}
    }
}

/// Whether the solution sets of two inequality constraints on the same
/// axis can intersect. `>`/`<` are treated as strict bounds.
fn ranges_intersect(a: (CompareOp, f64), b: (CompareOp, f64)) -> bool {
    let bounds = |(op, t): (CompareOp, f64)| -> (f64, f64, bool, bool) {
        match op {
            CompareOp::Ge => (t, f64::INFINITY, false, false),
            CompareOp::Gt => (t, f64::INFINITY, true, false),
            CompareOp::Le => (f64::NEG_INFINITY, t, false, false),
            CompareOp::Lt => (f64::NEG_INFINITY, t, false, true),
            CompareOp::Eq => (t, t, false, false),
        }
    };

    let (a_low, a_high, a_strict_low, a_strict_high) = bounds(a);
    let (b_low, b_high, b_strict_low, b_strict_high) = bounds(b);

    let low = a_low.max(b_low);
    let high = a_high.min(b_high);
    if low > high {
        return false;
    }
    if low == high {
        return !(a_strict_low || a_strict_high || b_strict_low || b_strict_high);
    }
    true
}
