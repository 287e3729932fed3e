//! Streaming quantile estimation.
//!
//! A bounded uniform reservoir (algorithm R) keeps memory constant over
//! arbitrarily long runs. Estimates are additionally capped by the running
//! maximum, so the reported p99 can never exceed the observed maximum.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const DEFAULT_CAPACITY: usize = 1024;

/// Reservoir-backed quantile estimator with a running max.
#[derive(Debug, Clone)]
pub struct ReservoirQuantile {
    values: Vec<f64>,
    capacity: usize,
    seen: u64,
    max: Option<f64>,
    min: Option<f64>,
    rng: ChaCha8Rng,
}

impl Default for ReservoirQuantile {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl ReservoirQuantile {
    /// Creates an estimator with the given reservoir capacity.
    ///
    /// The replacement RNG is seeded from the capacity, so two estimators
    /// fed the same stream produce the same estimate.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: Vec::with_capacity(capacity.min(DEFAULT_CAPACITY)),
            capacity: capacity.max(1),
            seen: 0,
            max: None,
            min: None,
            rng: ChaCha8Rng::seed_from_u64(capacity as u64),
        }
    }

    /// Feeds one observation.
    pub fn observe(&mut self, value: f64) {
        self.seen += 1;
        self.max = Some(self.max.map_or(value, |m| m.max(value)));
        self.min = Some(self.min.map_or(value, |m| m.min(value)));

        if self.values.len() < self.capacity {
            self.values.push(value);
        } else {
            let slot = self.rng.gen_range(0..self.seen);
            if let Ok(slot) = usize::try_from(slot) {
                if slot < self.capacity {
                    self.values[slot] = value;
                }
            }
        }
    }

    /// Number of observations fed so far.
    #[must_use]
    pub const fn count(&self) -> u64 {
        self.seen
    }

    /// Running maximum.
    #[must_use]
    pub const fn max(&self) -> Option<f64> {
        self.max
    }

    /// Running minimum.
    #[must_use]
    pub const fn min(&self) -> Option<f64> {
        self.min
    }

    /// Estimates the `q`-quantile (`0 < q <= 1`), capped by the running max.
    #[must_use]
    pub fn estimate(&self, q: f64) -> Option<f64> {
        if self.values.is_empty() || !(q > 0.0 && q <= 1.0) {
            return None;
        }
        let mut sorted = self.values.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let index = ((q * sorted.len() as f64).ceil() as usize).clamp(1, sorted.len()) - 1;
        let estimate = sorted[index];
        Some(self.max.map_or(estimate, |m| estimate.min(m)))
    }
}
