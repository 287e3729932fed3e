//! Evaluation context: the derived per-sample view of a raw state draw.
//!
//! The builder is constructed once per run (prototype tables are fetched and
//! gate strings parsed exactly once); [`ContextBuilder::build`] then derives
//! one [`EvaluationContext`] per sample. Derived values follow the prototype
//! contract: `clamp(weighted sum, 0, 1)` if every gate inequality holds on
//! the raw axes/traits, otherwise clamped to 0 ("gate-clamped").

use std::collections::BTreeMap;

use tracing::warn;

use crate::namespace::{Namespace, PathRef};
use crate::registry::{
    Gate, LookupRegistry, LookupTable, EMOTION_PROTOTYPES_KEY, LOOKUPS_CATEGORY,
    SEXUAL_PROTOTYPES_KEY,
};
use crate::state::{AxisState, SampledState};

/// A prototype with its gate strings parsed.
#[derive(Debug, Clone)]
struct CompiledPrototype {
    name: String,
    weights: BTreeMap<String, f64>,
    gates: Vec<Gate>,
    /// A prototype with an unparseable gate can never pass its gates.
    has_malformed_gate: bool,
}

impl CompiledPrototype {
    fn is_gated(&self) -> bool {
        self.has_malformed_gate || !self.gates.is_empty()
    }
}

/// Builds per-sample evaluation contexts from prototype data.
#[derive(Debug, Clone)]
pub struct ContextBuilder {
    emotions: Vec<CompiledPrototype>,
    sexual: Vec<CompiledPrototype>,
}

impl ContextBuilder {
    /// Fetches and compiles prototype tables from the registry.
    ///
    /// Missing tables and malformed gate strings are logged and degrade
    /// locally (empty namespace / permanently gate-clamped value); they are
    /// never a hard error.
    #[must_use]
    pub fn new(registry: &dyn LookupRegistry) -> Self {
        Self {
            emotions: compile_table(
                registry.get(LOOKUPS_CATEGORY, EMOTION_PROTOTYPES_KEY),
                EMOTION_PROTOTYPES_KEY,
            ),
            sexual: compile_table(
                registry.get(LOOKUPS_CATEGORY, SEXUAL_PROTOTYPES_KEY),
                SEXUAL_PROTOTYPES_KEY,
            ),
        }
    }

    /// Registered emotion names.
    pub fn known_emotions(&self) -> impl Iterator<Item = &str> {
        self.emotions.iter().map(|p| p.name.as_str())
    }

    /// Registered sexual-state names.
    pub fn known_sexual_states(&self) -> impl Iterator<Item = &str> {
        self.sexual.iter().map(|p| p.name.as_str())
    }

    /// Whether the named value carries gates (and thus gate statistics).
    #[must_use]
    pub fn is_gated(&self, path: &str) -> bool {
        let Some(path_ref) = PathRef::resolve(path) else {
            return false;
        };
        let Some(key) = path_ref.key.as_deref() else {
            return false;
        };
        let table = match path_ref.namespace {
            Namespace::Emotions => &self.emotions,
            Namespace::SexualStates => &self.sexual,
            _ => return false,
        };
        table.iter().any(|p| p.name == key && p.is_gated())
    }

    /// Parsed gates of the named derived value, empty for ungated or
    /// unknown paths.
    #[must_use]
    pub fn gates_for(&self, path: &str) -> &[Gate] {
        let Some(path_ref) = PathRef::resolve(path) else {
            return &[];
        };
        let Some(key) = path_ref.key.as_deref() else {
            return &[];
        };
        let table = match path_ref.namespace {
            Namespace::Emotions => &self.emotions,
            Namespace::SexualStates => &self.sexual,
            _ => return &[],
        };
        table
            .iter()
            .find(|p| p.name == key)
            .map_or(&[], |p| p.gates.as_slice())
    }

    /// Derives emotion intensities from raw mood axes and affect traits.
    ///
    /// `filter`, when given, restricts the output to the named prototypes.
    #[must_use]
    pub fn emotions_filtered(
        &self,
        mood_axes: &BTreeMap<String, f64>,
        affect_traits: Option<&BTreeMap<String, f64>>,
        filter: Option<&[&str]>,
    ) -> BTreeMap<String, f64> {
        derive_values(&self.emotions, filter, |axis| {
            mood_axes
                .get(axis)
                .or_else(|| affect_traits.and_then(|t| t.get(axis)))
                .copied()
        })
        .into_iter()
        .map(|(name, derived)| (name, derived.value))
        .collect()
    }

    /// Scalar sexual arousal in `[0, 1]`, a deterministic function of the
    /// raw sexual axes.
    #[must_use]
    pub fn sexual_arousal(sexual_axes: &BTreeMap<String, f64>) -> f64 {
        let excitation = sexual_axes.get("excitation").copied().unwrap_or(0.0);
        let inhibition = sexual_axes.get("inhibition").copied().unwrap_or(0.0);
        let libido = sexual_axes.get("baseline_libido").copied().unwrap_or(0.0);
        ((excitation - inhibition * 0.8 + libido * 0.4) / 100.0).clamp(0.0, 1.0)
    }

    /// Derives sexual-state intensities from the raw sexual axes.
    #[must_use]
    pub fn sexual_states(&self, sexual_axes: &BTreeMap<String, f64>) -> BTreeMap<String, f64> {
        derive_values(&self.sexual, None, |axis| sexual_axes.get(axis).copied())
            .into_iter()
            .map(|(name, derived)| (name, derived.value))
            .collect()
    }

    /// Builds the full per-sample view.
    #[must_use]
    pub fn build(&self, state: &SampledState) -> EvaluationContext {
        let mut gate_pass = BTreeMap::new();

        let emotions = self.derive_moment(&state.current, Some(&state.affect_traits), false, &mut gate_pass);
        let previous_emotions =
            self.derive_moment(&state.previous, Some(&state.affect_traits), true, &mut gate_pass);

        EvaluationContext {
            emotions: emotions.0,
            sexual_states: emotions.1,
            previous_emotions: previous_emotions.0,
            previous_sexual_states: previous_emotions.1,
            mood: state.current.mood.clone(),
            previous_mood: state.previous.mood.clone(),
            affect_traits: state.affect_traits.clone(),
            sexual_arousal: Self::sexual_arousal(&state.current.sexual),
            gate_pass,
        }
    }

    /// Derives emotions and sexual states for one moment, recording gate
    /// outcomes under the moment's path prefix.
    fn derive_moment(
        &self,
        moment: &AxisState,
        affect_traits: Option<&BTreeMap<String, f64>>,
        previous: bool,
        gate_pass: &mut BTreeMap<String, bool>,
    ) -> (BTreeMap<String, f64>, BTreeMap<String, f64>) {
        let emotion_root = if previous { "previousEmotions" } else { "emotions" };
        let sexual_root = if previous {
            "previousSexualStates"
        } else {
            "sexualStates"
        };

        let mut emotions = BTreeMap::new();
        for (name, derived) in derive_values(&self.emotions, None, |axis| {
            moment
                .mood
                .get(axis)
                .or_else(|| affect_traits.and_then(|t| t.get(axis)))
                .copied()
        }) {
            if let Some(passed) = derived.gate_passed {
                gate_pass.insert(format!("{emotion_root}.{name}"), passed);
            }
            emotions.insert(name, derived.value);
        }

        let mut sexual_states = BTreeMap::new();
        for (name, derived) in derive_values(&self.sexual, None, |axis| moment.sexual.get(axis).copied()) {
            if let Some(passed) = derived.gate_passed {
                gate_pass.insert(format!("{sexual_root}.{name}"), passed);
            }
            sexual_states.insert(name, derived.value);
        }

        (emotions, sexual_states)
    }
}

/// One derived value plus its gate outcome (`None` when ungated).
struct DerivedValue {
    value: f64,
    gate_passed: Option<bool>,
}

fn derive_values(
    prototypes: &[CompiledPrototype],
    filter: Option<&[&str]>,
    lookup: impl Fn(&str) -> Option<f64>,
) -> Vec<(String, DerivedValue)> {
    prototypes
        .iter()
        .filter(|p| filter.map_or(true, |names| names.contains(&p.name.as_str())))
        .map(|proto| {
            let gate_passed = if proto.is_gated() {
                Some(
                    !proto.has_malformed_gate
                        && proto
                            .gates
                            .iter()
                            .all(|gate| lookup(&gate.axis).is_some_and(|v| gate.holds(v))),
                )
            } else {
                None
            };

            let value = if gate_passed == Some(false) {
                0.0
            } else {
                proto
                    .weights
                    .iter()
                    .map(|(axis, weight)| weight * lookup(axis).unwrap_or(0.0))
                    .sum::<f64>()
                    .clamp(0.0, 1.0)
            };

            (proto.name.clone(), DerivedValue { value, gate_passed })
        })
        .collect()
}

fn compile_table(table: Option<LookupTable>, key: &str) -> Vec<CompiledPrototype> {
    let Some(table) = table else {
        warn!(lookup = key, "prototype table missing; namespace will be empty");
        return Vec::new();
    };

    table
        .entries
        .into_iter()
        .map(|(name, proto)| {
            let mut gates = Vec::new();
            let mut has_malformed_gate = false;
            for raw in &proto.gates {
                match Gate::parse(raw) {
                    Some(gate) => gates.push(gate),
                    None => {
                        warn!(lookup = key, value = %name, gate = %raw, "malformed gate; value will clamp to 0");
                        has_malformed_gate = true;
                    }
                }
            }
            CompiledPrototype {
                name,
                weights: proto.weights,
                gates,
                has_malformed_gate,
            }
        })
        .collect()
}

/// Per-sample derived view consumed by the evaluator.
#[derive(Debug, Clone)]
pub struct EvaluationContext {
    emotions: BTreeMap<String, f64>,
    previous_emotions: BTreeMap<String, f64>,
    sexual_states: BTreeMap<String, f64>,
    previous_sexual_states: BTreeMap<String, f64>,
    mood: BTreeMap<String, f64>,
    previous_mood: BTreeMap<String, f64>,
    affect_traits: BTreeMap<String, f64>,
    sexual_arousal: f64,
    gate_pass: BTreeMap<String, bool>,
}

impl EvaluationContext {
    /// Numeric value at a dotted path, or `None` when the path does not
    /// resolve in this sample.
    #[must_use]
    pub fn value(&self, path: &str) -> Option<f64> {
        let path_ref = PathRef::resolve(path)?;

        if path_ref.namespace.is_scalar() {
            return path_ref.key.is_none().then_some(self.sexual_arousal);
        }

        let key = path_ref.key.as_deref()?;
        let map = match (path_ref.namespace, path_ref.previous) {
            (Namespace::Emotions, false) => &self.emotions,
            (Namespace::Emotions, true) => &self.previous_emotions,
            (Namespace::SexualStates, false) => &self.sexual_states,
            (Namespace::SexualStates, true) => &self.previous_sexual_states,
            (Namespace::MoodAxes, false) => &self.mood,
            (Namespace::MoodAxes, true) => &self.previous_mood,
            (Namespace::AffectTraits, _) => &self.affect_traits,
            (Namespace::SexualArousal, _) => return None,
        };
        map.get(key).copied()
    }

    /// Gate outcome for a gated derived value this sample; `None` for
    /// ungated or unresolved paths.
    #[must_use]
    pub fn gate_passed(&self, path: &str) -> Option<bool> {
        // `mood.*` never gates; only derived-value paths appear here.
        self.gate_pass.get(path).copied()
    }
}
