//! Evaluation core: condition nodes, the `ConditionSpec` contract, the type registry
//! and key path resolution.

mod condition;
pub mod keypath;
mod registry;
mod spec;

pub use condition::{Condition, ConditionDefinition};
pub use registry::{
    factory_of, global_registry, register_condition, register_conditions, ConditionRegistry,
    SpecFactory,
};
pub use spec::{ConditionSpec, Derived, Outcome, Semantics};
