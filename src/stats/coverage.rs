//! Sampling coverage: per-variable histograms over documented ranges.
//!
//! Answers "did the sampler actually exercise the region this clause cares
//! about?". Each in-scope numeric variable gets a fixed-range histogram;
//! coverage is the fraction of bins that received at least one sample.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Coverage tracking configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageConfig {
    /// Number of equal-width bins per variable.
    pub bin_count: usize,
}

impl Default for CoverageConfig {
    fn default() -> Self {
        Self { bin_count: 10 }
    }
}

/// Histogram for one variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableCoverage {
    /// Lower end of the documented range the bins span.
    pub range_min: f64,
    /// Upper end of the documented range the bins span.
    pub range_max: f64,
    /// Per-bin sample counts.
    pub bins: Vec<u64>,
    /// Fraction of bins with at least one sample.
    pub coverage: f64,
}

/// Accumulates histograms for a set of variables.
#[derive(Debug, Clone)]
pub struct CoverageTracker {
    bin_count: usize,
    variables: BTreeMap<String, Histogram>,
}

#[derive(Debug, Clone)]
struct Histogram {
    min: f64,
    max: f64,
    bins: Vec<u64>,
}

impl CoverageTracker {
    /// Creates a tracker for the given variables and their documented ranges.
    #[must_use]
    pub fn new(config: CoverageConfig, variables: &[(String, (f64, f64))]) -> Self {
        let bin_count = config.bin_count.max(1);
        Self {
            bin_count,
            variables: variables
                .iter()
                .map(|(path, (min, max))| {
                    (
                        path.clone(),
                        Histogram {
                            min: *min,
                            max: *max,
                            bins: vec![0; bin_count],
                        },
                    )
                })
                .collect(),
        }
    }

    /// Records one observation for a tracked variable. Unknown variables and
    /// out-of-range values are ignored.
    pub fn record(&mut self, path: &str, value: f64) {
        let Some(hist) = self.variables.get_mut(path) else {
            return;
        };
        if hist.max <= hist.min || value < hist.min || value > hist.max {
            return;
        }
        let fraction = (value - hist.min) / (hist.max - hist.min);
        #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let bin = ((fraction * self.bin_count as f64) as usize).min(self.bin_count - 1);
        hist.bins[bin] += 1;
    }

    /// Tracked variable paths.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.variables.keys().map(String::as_str)
    }

    /// Finalizes into the immutable report shape.
    #[must_use]
    pub fn finalize(self) -> SamplingCoverage {
        #[allow(clippy::cast_precision_loss)]
        let variables = self
            .variables
            .into_iter()
            .map(|(path, hist)| {
                let hit = hist.bins.iter().filter(|&&count| count > 0).count();
                (
                    path,
                    VariableCoverage {
                        range_min: hist.min,
                        range_max: hist.max,
                        coverage: hit as f64 / hist.bins.len() as f64,
                        bins: hist.bins,
                    },
                )
            })
            .collect();
        SamplingCoverage { variables }
    }
}

/// Per-variable sampling coverage report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingCoverage {
    /// Variable path to histogram.
    pub variables: BTreeMap<String, VariableCoverage>,
}
