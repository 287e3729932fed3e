//! Raw state sampler.
//!
//! Produces one independent [`SampledState`] per draw. Each axis is sampled
//! independently from the configured distribution within its documented
//! range. The sampler holds no state beyond its RNG, so draws are
//! independent and a seeded sampler replays exactly.

use std::collections::BTreeMap;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::{axis_range, AxisState, SampledState, AFFECT_TRAITS, MOOD_AXES, SEXUAL_AXES};

/// Sampling distribution over each axis's documented range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Distribution {
    /// Uniform over the full range.
    #[default]
    Uniform,
    /// Gaussian centered on the range midpoint with sigma = range/6,
    /// clamped to the range.
    Gaussian,
}

/// Samples raw character state.
#[derive(Debug, Clone)]
pub struct StateSampler {
    distribution: Distribution,
    rng: ChaCha8Rng,
}

impl StateSampler {
    /// Creates a sampler seeded from system entropy.
    #[must_use]
    pub fn new(distribution: Distribution) -> Self {
        Self {
            distribution,
            rng: ChaCha8Rng::from_entropy(),
        }
    }

    /// Creates a deterministic sampler for reproducible runs.
    #[must_use]
    pub fn with_seed(distribution: Distribution, seed: u64) -> Self {
        Self {
            distribution,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Draws one independent raw-state sample.
    pub fn generate(&mut self) -> SampledState {
        SampledState {
            current: self.axis_state(),
            previous: self.axis_state(),
            affect_traits: self.draw_axes(AFFECT_TRAITS),
        }
    }

    fn axis_state(&mut self) -> AxisState {
        AxisState {
            mood: self.draw_axes(MOOD_AXES),
            sexual: self.draw_axes(SEXUAL_AXES),
        }
    }

    fn draw_axes(&mut self, names: &[&str]) -> BTreeMap<String, f64> {
        names
            .iter()
            .map(|name| {
                let (min, max) = axis_range(name);
                ((*name).to_string(), self.draw(min, max))
            })
            .collect()
    }

    fn draw(&mut self, min: f64, max: f64) -> f64 {
        match self.distribution {
            Distribution::Uniform => self.rng.gen_range(min..=max),
            Distribution::Gaussian => {
                let mean = (min + max) / 2.0;
                let sigma = (max - min) / 6.0;
                (mean + sigma * self.standard_normal()).clamp(min, max)
            }
        }
    }

    /// Box-Muller transform; one standard normal per call.
    fn standard_normal(&mut self) -> f64 {
        let u1: f64 = self.rng.gen_range(f64::EPSILON..1.0);
        let u2: f64 = self.rng.gen_range(0.0..1.0);
        (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
    }
}
