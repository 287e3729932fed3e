//! Variable path validation.
//!
//! Flags unknown or misused variable references before any sampling runs,
//! so a typo'd path surfaces as a warning (or a hard rejection with
//! `fail_on_unseeded_vars`) instead of thousands of silently failing leaves.
//! Warnings are deduplicated by path and logged once each.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::context::ContextBuilder;
use crate::namespace::{Namespace, PathRef, KNOWN_ROOTS};
use crate::state::{AFFECT_TRAITS, MOOD_AXES};

/// Why a variable path failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningReason {
    /// The path root is not a known namespace.
    UnknownRoot,
    /// The namespace is known but the nested key is not registered.
    UnknownNestedKey,
    /// A nested key under a scalar-only namespace (e.g. `sexualArousal.x`).
    InvalidNesting,
}

/// One validation warning for an unseeded variable path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathWarning {
    /// The offending path, exactly as referenced.
    pub path: String,
    /// Failure mode.
    pub reason: WarningReason,
    /// A close known path, when one exists.
    pub suggestion: Option<String>,
}

/// Validates every referenced path against the known namespaces.
///
/// Returns deduplicated warnings in first-reference order and logs each one
/// once. Callers that skip validation must not call this function at all
/// (skipping produces zero warnings and zero log calls).
#[must_use]
pub fn validate_paths(paths: &[String], builder: &ContextBuilder) -> Vec<PathWarning> {
    let mut seen = BTreeSet::new();
    let mut warnings = Vec::new();

    for path in paths {
        if !seen.insert(path.clone()) {
            continue;
        }
        if let Some(warning) = check_path(path, builder) {
            warn!(
                path = %warning.path,
                reason = ?warning.reason,
                suggestion = warning.suggestion.as_deref().unwrap_or(""),
                "unseeded variable path"
            );
            warnings.push(warning);
        }
    }

    warnings
}

fn check_path(path: &str, builder: &ContextBuilder) -> Option<PathWarning> {
    let Some(path_ref) = PathRef::resolve(path) else {
        let root = path.split('.').next().unwrap_or(path);
        return Some(PathWarning {
            path: path.to_string(),
            reason: WarningReason::UnknownRoot,
            suggestion: closest(root, KNOWN_ROOTS.iter().copied()),
        });
    };

    if path_ref.namespace.is_scalar() {
        return path_ref.key.map(|_| PathWarning {
            path: path.to_string(),
            reason: WarningReason::InvalidNesting,
            suggestion: Some(path_ref.namespace.root().to_string()),
        });
    }

    let Some(key) = path_ref.key.as_deref() else {
        // Bare namespace reference (`emotions` without a key): the nested
        // key is missing, not unknown; treat as an unregistered key.
        return Some(PathWarning {
            path: path.to_string(),
            reason: WarningReason::UnknownNestedKey,
            suggestion: None,
        });
    };

    let known: Vec<String> = match path_ref.namespace {
        Namespace::Emotions => builder.known_emotions().map(str::to_string).collect(),
        Namespace::SexualStates => builder.known_sexual_states().map(str::to_string).collect(),
        Namespace::MoodAxes => MOOD_AXES.iter().map(|s| (*s).to_string()).collect(),
        Namespace::AffectTraits => AFFECT_TRAITS.iter().map(|s| (*s).to_string()).collect(),
        Namespace::SexualArousal => Vec::new(),
    };

    if known.iter().any(|k| k == key) {
        return None;
    }

    let root = path.split('.').next().unwrap_or(path);
    Some(PathWarning {
        path: path.to_string(),
        reason: WarningReason::UnknownNestedKey,
        suggestion: closest(key, known.iter().map(String::as_str))
            .map(|k| format!("{root}.{k}")),
    })
}

/// Closest candidate by edit distance, when close enough to be a plausible
/// typo.
fn closest<'a>(target: &str, candidates: impl Iterator<Item = &'a str>) -> Option<String> {
    let budget = (target.len() / 3).max(2);
    candidates
        .map(|c| (levenshtein(target, c), c))
        .filter(|(d, _)| *d <= budget)
        .min_by_key(|(d, _)| *d)
        .map(|(_, c)| c.to_string())
}

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();

    for (i, ca) in a.iter().enumerate() {
        let mut current = vec![i + 1];
        for (j, cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != cb);
            current.push(substitution.min(prev[j + 1] + 1).min(current[j] + 1));
        }
        prev = current;
    }

    prev[b.len()]
}
