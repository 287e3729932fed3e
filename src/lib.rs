//! # affectsim - Monte Carlo trigger-expression diagnostics
//!
//! affectsim estimates, for a boolean trigger expression evaluated over a
//! randomized character-state model, how often the expression would fire —
//! and *why* it does or does not. It combines an embedded logic-tree
//! interpreter, streaming statistics (Wilson confidence intervals,
//! percentiles, near-miss and last-mile attribution, gate-clamp analysis),
//! and a validation layer for dynamically-shaped variable namespaces.
//!
//! ## Core Concepts
//!
//! - **Expression**: a named trigger built from AND-combined prerequisite clauses
//! - **Clause**: one prerequisite logic tree, parsed once into a canonical AST
//! - **Gate**: an inequality guard on a derived-value prototype; failing it clamps the value to 0
//! - **Witness**: a sampled state that satisfied (or most nearly satisfied) the expression
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use serde_json::json;
//! use affectsim::{Clause, Expression, InMemoryRegistry, Simulator};
//!
//! let expression = Expression::new(
//!     "joy_spike",
//!     vec![Clause::new(json!({">=": [{"var": "emotions.joy"}, 0.4]}))],
//! );
//!
//! let result = Simulator::new(Arc::new(InMemoryRegistry::with_defaults()))
//!     .with_seed(7)
//!     .run(&expression)
//!     .unwrap();
//!
//! assert!(result.trigger_rate >= 0.0 && result.trigger_rate <= 1.0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

// Core types
pub mod error;
pub mod expression;
pub mod namespace;
pub mod registry;
pub mod state;

// Logic, context derivation, and validation
pub mod context;
pub mod logic;
pub mod validate;

// Statistics and orchestration
pub mod simulator;
pub mod stats;

// Re-export primary types at crate root for convenience
pub use context::{ContextBuilder, EvaluationContext};
pub use error::{AffectSimError, SimResult, ValidationError};
pub use expression::{Clause, Expression};
pub use logic::{CompareOp, Literal, LogicNode, NodeOutcome};
pub use namespace::{Namespace, PathRef};
pub use registry::{Gate, InMemoryRegistry, LookupRegistry, LookupTable, Prototype};
pub use simulator::{
    GateCompatibility, NearMissCandidate, SimulationConfig, SimulationResult, Simulator, Witness,
    WitnessAnalysis,
};
pub use state::{Distribution, SampledState, StateSampler};
pub use stats::{
    ClauseReport, ConfidenceInterval, CoverageConfig, NearMissEpsilons, SamplingCoverage,
};
pub use validate::{PathWarning, WarningReason};
