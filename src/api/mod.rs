//! Public API for the policy engine.
//!
//! This module provides the main interface for interacting with the policy engine,
//! including the `PolicyEngine` struct and evaluation context types.

mod context;
mod decision;
mod engine;

pub use context::{EvaluationContext, EvaluationContextBuilder};
pub use decision::PolicyDecision;
pub use engine::{PolicyEngine, PolicyEngineBuilder};
