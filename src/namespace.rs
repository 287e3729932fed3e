//! Variable path namespaces.
//!
//! Every variable reference in clause logic is a dotted path whose root
//! selects a namespace of the evaluation context: `emotions.*`,
//! `sexualStates.*`, `moodAxes.*` (alias `mood.*`), `affectTraits.*`, the
//! scalar `sexualArousal`, and the `previous*` counterparts of the
//! state-derived namespaces. This module is the single source of truth for
//! root resolution, value ranges, and scalar-vs-nested shape; the validator,
//! the near-miss epsilon table, and sampling coverage all key off it.

use serde::{Deserialize, Serialize};

/// A value namespace of the evaluation context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Namespace {
    /// Derived emotion prototype values in `[0, 1]`.
    Emotions,
    /// Derived sexual state prototype values in `[0, 1]`.
    SexualStates,
    /// Raw mood axes in `[-100, 100]`.
    MoodAxes,
    /// Raw affect traits in `[0, 100]`.
    AffectTraits,
    /// The derived arousal scalar in `[0, 1]`.
    SexualArousal,
}

impl Namespace {
    /// Inclusive value range of variables in this namespace.
    #[must_use]
    pub const fn value_range(self) -> (f64, f64) {
        match self {
            Self::Emotions | Self::SexualStates | Self::SexualArousal => (0.0, 1.0),
            Self::MoodAxes => (-100.0, 100.0),
            Self::AffectTraits => (0.0, 100.0),
        }
    }

    /// True for namespaces that hold a single scalar, not nested keys.
    #[must_use]
    pub const fn is_scalar(self) -> bool {
        matches!(self, Self::SexualArousal)
    }

    /// Canonical root token (non-previous form).
    #[must_use]
    pub const fn root(self) -> &'static str {
        match self {
            Self::Emotions => "emotions",
            Self::SexualStates => "sexualStates",
            Self::MoodAxes => "moodAxes",
            Self::AffectTraits => "affectTraits",
            Self::SexualArousal => "sexualArousal",
        }
    }
}

/// All root tokens the validator recognizes.
pub const KNOWN_ROOTS: &[&str] = &[
    "emotions",
    "previousEmotions",
    "sexualStates",
    "previousSexualStates",
    "moodAxes",
    "previousMoodAxes",
    "mood",
    "affectTraits",
    "sexualArousal",
];

/// A resolved variable path: namespace, previous-sample flag, nested key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathRef {
    /// The namespace the root token selected.
    pub namespace: Namespace,
    /// Whether the root was a `previous*` variant.
    pub previous: bool,
    /// The nested key, when the path had one.
    pub key: Option<String>,
}

impl PathRef {
    /// Resolves a dotted path against the known roots.
    ///
    /// Returns `None` when the root is not a known namespace. A known root
    /// with a malformed shape (nested key under a scalar, or a missing key
    /// under a nested namespace) still resolves; shape errors are the
    /// validator's concern.
    #[must_use]
    pub fn resolve(path: &str) -> Option<Self> {
        let (root, key) = match path.split_once('.') {
            Some((root, rest)) => (root, Some(rest.to_string())),
            None => (path, None),
        };

        let (namespace, previous) = match root {
            "emotions" => (Namespace::Emotions, false),
            "previousEmotions" => (Namespace::Emotions, true),
            "sexualStates" => (Namespace::SexualStates, false),
            "previousSexualStates" => (Namespace::SexualStates, true),
            "moodAxes" | "mood" => (Namespace::MoodAxes, false),
            "previousMoodAxes" => (Namespace::MoodAxes, true),
            "affectTraits" => (Namespace::AffectTraits, false),
            "sexualArousal" => (Namespace::SexualArousal, false),
            _ => return None,
        };

        Some(Self {
            namespace,
            previous,
            key,
        })
    }
}
