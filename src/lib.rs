//! # Policy Author
//!
//! Declarative policy evaluation. A document lists policies in order; each
//! policy guards an output value with a tree of conditions evaluated against
//! a runtime context (a string-keyed, possibly nested map). The engine
//! returns the output of the first policy whose conditions hold.
//!
//! ## Features
//!
//! - **Pluggable conditions**: condition types are looked up by name in a
//!   [`ConditionRegistry`]; the built-ins cover equality, substrings, CIDR
//!   ranges, regular expressions, time windows, numeric ranges and key
//!   presence
//! - **Derived values**: a regex condition with a `return` template can
//!   produce the output itself, and the value travels through AND/OR/NOT
//! - **Dot paths**: keys like `header.X-Forwarded-For` reach into nested maps
//!
//! ## Quick Start
//!
//! ```rust
//! use policy_author::{ConditionRegistry, EvaluationContext, PolicyEngine};
//!
//! let yaml = r#"
//! policies:
//! - value: internal
//!   conditions:
//!   - type: cidr
//!     spec:
//!       key: header.X-Forwarded-For
//!       value: 10.0.0.0/8
//! "#;
//!
//! let engine = PolicyEngine::from_yaml(yaml, &ConditionRegistry::with_builtins())?;
//! let context = EvaluationContext::builder()
//!     .with_path("header.X-Forwarded-For", "10.1.2.3")
//!     .build();
//!
//! let decision = engine.evaluate(&context)?;
//! assert!(decision.hit);
//! assert_eq!(decision.value_str(), Some("internal"));
//! # Ok::<(), policy_author::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod api;
pub mod conditions;
pub mod config;
pub mod core;
pub mod error;
pub mod policy;
pub mod telemetry;

// Re-export main types for convenience
pub use api::{
    EvaluationContext, EvaluationContextBuilder, PolicyDecision, PolicyEngine, PolicyEngineBuilder,
};
pub use crate::config::Config;
pub use crate::core::{
    register_condition, register_conditions, Condition, ConditionDefinition, ConditionRegistry,
    ConditionSpec, Derived, Outcome, Semantics, SpecFactory,
};
pub use error::{Error, Result};
pub use policy::{Policy, PolicyDefinition, PolicyDocument, PolicyOutput};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
