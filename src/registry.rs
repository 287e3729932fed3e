//! Prototype lookup registry (consumed collaborator contract).
//!
//! Named emotion and sexual-state values are derived from *prototypes*: a
//! weighted sum over raw axes/traits guarded by gate inequalities. The
//! prototype data itself is owned by the surrounding product's data
//! registry; this module only defines the lookup contract plus an in-memory
//! implementation with a small built-in set so the crate is exercisable
//! stand-alone.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::logic::CompareOp;

/// Registry category under which prototype tables live.
pub const LOOKUPS_CATEGORY: &str = "lookups";

/// Lookup key for emotion prototypes.
pub const EMOTION_PROTOTYPES_KEY: &str = "core:emotion_prototypes";

/// Lookup key for sexual-state prototypes.
pub const SEXUAL_PROTOTYPES_KEY: &str = "core:sexual_prototypes";

/// One named-value prototype: axis/trait weights plus gate inequalities.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Prototype {
    /// Axis or trait name to weight. The derived value is the clamped
    /// weighted sum over the referenced raw values.
    pub weights: BTreeMap<String, f64>,

    /// Gate inequality strings, `"<axis> <op> <threshold>"`. All gates must
    /// hold on the raw axes/traits or the derived value clamps to 0.
    #[serde(default)]
    pub gates: Vec<String>,
}

/// A table of prototypes keyed by value name.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LookupTable {
    /// Value name to prototype.
    pub entries: BTreeMap<String, Prototype>,
}

/// Data registry lookup contract.
pub trait LookupRegistry: Send + Sync {
    /// Fetches a lookup table, or `None` when the entry is missing.
    fn get(&self, category: &str, key: &str) -> Option<LookupTable>;
}

/// A parsed gate inequality.
#[derive(Debug, Clone, PartialEq)]
pub struct Gate {
    /// Raw axis or trait the gate reads.
    pub axis: String,
    /// Comparison operator.
    pub op: CompareOp,
    /// Threshold on the raw scale.
    pub threshold: f64,
}

static GATE_RE: OnceLock<regex::Regex> = OnceLock::new();

fn gate_regex() -> &'static regex::Regex {
    GATE_RE.get_or_init(|| {
        regex::Regex::new(r"^\s*([A-Za-z_][A-Za-z0-9_]*)\s*(>=|<=|==|>|<)\s*(-?\d+(?:\.\d+)?)\s*$")
            .expect("gate regex is valid")
    })
}

impl Gate {
    /// Parses a gate inequality string.
    ///
    /// Malformed gates return `None`; the caller logs and treats the gate as
    /// failing so a corrupted registry entry degrades locally.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let caps = gate_regex().captures(raw)?;
        let op = CompareOp::parse(caps.get(2)?.as_str())?;
        let threshold: f64 = caps.get(3)?.as_str().parse().ok()?;
        Some(Self {
            axis: caps.get(1)?.as_str().to_string(),
            op,
            threshold,
        })
    }

    /// Whether the gate holds on the given raw value.
    #[must_use]
    pub fn holds(&self, raw_value: f64) -> bool {
        self.op.compare(raw_value, self.threshold)
    }
}

/// In-memory registry backed by nested maps.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRegistry {
    tables: BTreeMap<(String, String), LookupTable>,
}

impl InMemoryRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry pre-seeded with the built-in prototype set.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.insert(
            LOOKUPS_CATEGORY,
            EMOTION_PROTOTYPES_KEY,
            default_emotion_prototypes(),
        );
        registry.insert(
            LOOKUPS_CATEGORY,
            SEXUAL_PROTOTYPES_KEY,
            default_sexual_prototypes(),
        );
        registry
    }

    /// Inserts or replaces a lookup table.
    pub fn insert(&mut self, category: &str, key: &str, table: LookupTable) {
        self.tables
            .insert((category.to_string(), key.to_string()), table);
    }
}

impl LookupRegistry for InMemoryRegistry {
    fn get(&self, category: &str, key: &str) -> Option<LookupTable> {
        self.tables
            .get(&(category.to_string(), key.to_string()))
            .cloned()
    }
}

fn prototype(weights: &[(&str, f64)], gates: &[&str]) -> Prototype {
    Prototype {
        weights: weights
            .iter()
            .map(|(axis, w)| ((*axis).to_string(), *w))
            .collect(),
        gates: gates.iter().map(|g| (*g).to_string()).collect(),
    }
}

/// Built-in emotion prototypes over the mood axes and affect traits.
///
/// Weights are scaled so typical axis magnitudes land the derived value
/// inside `[0, 1]` before clamping.
#[must_use]
pub fn default_emotion_prototypes() -> LookupTable {
    let mut entries = BTreeMap::new();
    entries.insert(
        "joy".to_string(),
        prototype(
            &[("valence", 0.006), ("engagement", 0.003), ("arousal", 0.001)],
            &["valence >= 0"],
        ),
    );
    entries.insert(
        "fear".to_string(),
        prototype(
            &[("threat", 0.007), ("arousal", 0.003)],
            &["threat >= 0", "stability <= 50"],
        ),
    );
    entries.insert(
        "calm".to_string(),
        prototype(
            &[("stability", 0.006), ("valence", 0.002)],
            &["arousal <= 25", "threat <= 0"],
        ),
    );
    entries.insert(
        "anger".to_string(),
        prototype(
            &[("arousal", 0.004), ("agency", 0.004), ("threat", 0.002)],
            &["valence <= 0"],
        ),
    );
    entries.insert(
        "affection".to_string(),
        prototype(
            &[("valence", 0.004), ("affection", 0.006)],
            &["valence >= -10"],
        ),
    );
    LookupTable { entries }
}

/// Built-in sexual-state prototypes over the sexual axes.
#[must_use]
pub fn default_sexual_prototypes() -> LookupTable {
    let mut entries = BTreeMap::new();
    entries.insert(
        "desire".to_string(),
        prototype(
            &[("excitation", 0.008), ("baseline_libido", 0.004)],
            &["inhibition <= 75"],
        ),
    );
    entries.insert(
        "restraint".to_string(),
        prototype(&[("inhibition", 0.01)], &["excitation <= 80"]),
    );
    LookupTable { entries }
}
