//! Trigger expression input model.
//!
//! An [`Expression`] is a named boolean trigger built from prerequisite
//! clauses that combine by implicit AND. The raw clause logic is
//! JSON-logic-shaped data supplied by the caller; it is parsed once per
//! clause into the canonical AST (see [`crate::logic`]).

use serde::{Deserialize, Serialize};

/// One prerequisite: a raw nested logic tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clause {
    /// Raw JSON-logic payload, e.g. `{">=": [{"var": "emotions.joy"}, 0.5]}`.
    pub logic: serde_json::Value,
}

impl Clause {
    /// Creates a clause from a raw logic value.
    #[must_use]
    pub const fn new(logic: serde_json::Value) -> Self {
        Self { logic }
    }
}

/// A named trigger expression.
///
/// Prerequisites combine by implicit AND; an expression with zero
/// prerequisites always fires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expression {
    /// Caller-supplied identifier, surfaced unchanged in results and logs.
    pub id: String,

    /// Prerequisite clauses. Missing in the input means "no prerequisites".
    #[serde(default)]
    pub prerequisites: Vec<Clause>,
}

impl Expression {
    /// Creates an expression with the given id and prerequisites.
    #[must_use]
    pub fn new(id: impl Into<String>, prerequisites: Vec<Clause>) -> Self {
        Self {
            id: id.into(),
            prerequisites,
        }
    }

    /// Creates an expression with no prerequisites (always fires).
    #[must_use]
    pub fn unconditional(id: impl Into<String>) -> Self {
        Self::new(id, Vec::new())
    }

    /// Returns true when the expression has exactly one prerequisite.
    #[must_use]
    pub fn is_single_clause(&self) -> bool {
        self.prerequisites.len() == 1
    }
}
