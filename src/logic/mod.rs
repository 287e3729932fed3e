//! Logic AST and per-sample evaluation.
//!
//! Raw JSON-logic clauses are parsed once into a canonical [`LogicNode`]
//! tree ([`ast`]) and evaluated against an evaluation context each sample
//! ([`evaluator`]). Parsing never fails: unrecognized operators become
//! always-failing leaves so one malformed clause cannot abort a run.

pub mod ast;
pub mod evaluator;

pub use ast::{CompareOp, Literal, LogicNode};
pub use evaluator::{LeafObservation, NodeOutcome};
