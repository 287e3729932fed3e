//! Simulation result types.
//!
//! Produced once at finalization and never mutated after return.

use serde::{Deserialize, Serialize};

use crate::state::{Distribution, SampledState};
use crate::stats::{ClauseReport, ConfidenceInterval, SamplingCoverage};
use crate::validate::PathWarning;

/// A captured raw-state snapshot that satisfied the full expression.
pub type Witness = SampledState;

/// The sample that came closest to firing, when nothing fired.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearMissCandidate {
    /// The raw state of the closest sample.
    pub state: SampledState,
    /// How many leaves still failed.
    pub failed_leaf_count: usize,
    /// Human-readable descriptions of the failing leaves.
    pub failed_leaves: Vec<String>,
}

/// Witness capture summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WitnessAnalysis {
    /// Up to `max_witnesses` satisfying snapshots, in generation order.
    pub witnesses: Vec<Witness>,
    /// First witness, or `None` when nothing fired.
    pub best_witness: Option<Witness>,
    /// Populated only when no sample fired.
    pub nearest_miss: Option<NearMissCandidate>,
}

/// Structural compatibility of one gated value's gates against axis
/// constraints elsewhere in the same expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateCompatibility {
    /// The referenced gated value, e.g. `emotions.joy`.
    pub gated_value: String,
    /// False when a gate and a clause constraint exclude each other.
    pub compatible: bool,
    /// Human-readable explanation when incompatible.
    pub reason: Option<String>,
}

/// The complete outcome of one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    /// Expression id, echoed from the input.
    pub expression_id: String,
    /// Samples that fired the full expression.
    pub trigger_count: u64,
    /// Total samples drawn.
    pub sample_count: u64,
    /// `trigger_count / sample_count`.
    pub trigger_rate: f64,
    /// Wilson score interval at the configured confidence level.
    pub confidence_interval: ConfidenceInterval,
    /// Distribution the raw state was sampled from.
    pub distribution: Distribution,
    /// Per-clause reports, sorted by failure rate descending. Empty when
    /// clause tracking is disabled.
    pub clause_failures: Vec<ClauseReport>,
    /// Per-variable sampling histograms, when coverage was enabled.
    pub sampling_coverage: Option<SamplingCoverage>,
    /// Witness capture and nearest-miss attribution.
    pub witness_analysis: WitnessAnalysis,
    /// Per gated value, structural gate-vs-constraint compatibility.
    pub gate_compatibility: Vec<GateCompatibility>,
    /// Path validation warnings (empty when validation was skipped).
    pub unseeded_var_warnings: Vec<PathWarning>,
}
