//! Raw character state: documented axes and the per-draw sample.
//!
//! A [`SampledState`] is one ephemeral Monte Carlo draw over the documented
//! raw scales: mood axes on `[-100, 100]`, sexual excitation/inhibition on
//! `[0, 100]`, baseline libido on `[-50, 50]`, affect traits on `[0, 100]`.

pub mod sampler;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use sampler::{Distribution, StateSampler};

/// Mood axis names, sampled on `[-100, 100]`.
pub const MOOD_AXES: &[&str] = &[
    "valence",
    "arousal",
    "agency",
    "threat",
    "engagement",
    "stability",
];

/// Sexual axis names. Excitation and inhibition live on `[0, 100]`,
/// `baseline_libido` on `[-50, 50]`.
pub const SEXUAL_AXES: &[&str] = &["excitation", "inhibition", "baseline_libido"];

/// Affect trait names, sampled on `[0, 100]`.
pub const AFFECT_TRAITS: &[&str] = &["affection", "sensitivity", "novelty_seeking", "restraint"];

/// Inclusive sampling range of a raw axis or trait.
#[must_use]
pub fn axis_range(axis: &str) -> (f64, f64) {
    match axis {
        "baseline_libido" => (-50.0, 50.0),
        "excitation" | "inhibition" => (0.0, 100.0),
        axis if AFFECT_TRAITS.contains(&axis) => (0.0, 100.0),
        _ => (-100.0, 100.0),
    }
}

/// Raw mood and sexual axis values for one moment.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AxisState {
    /// Mood axis name to value.
    pub mood: BTreeMap<String, f64>,
    /// Sexual axis name to value.
    pub sexual: BTreeMap<String, f64>,
}

/// One independent Monte Carlo draw of raw character state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampledState {
    /// The current moment.
    pub current: AxisState,
    /// The preceding moment, sampled independently.
    pub previous: AxisState,
    /// Affect trait name to value.
    pub affect_traits: BTreeMap<String, f64>,
}
