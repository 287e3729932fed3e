//! Streaming statistics: confidence intervals, quantile estimation,
//! sampling coverage, and the per-clause statistics tree.

pub mod clause_tree;
pub mod coverage;
pub mod quantile;
pub mod wilson;

pub use clause_tree::{ClauseReport, ClauseStatsNode, NearMissEpsilons, TuningDirection};
pub use coverage::{CoverageConfig, SamplingCoverage, VariableCoverage};
pub use quantile::ReservoirQuantile;
pub use wilson::{wilson_interval, ConfidenceInterval};
