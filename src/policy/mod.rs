//! Policies: an output guarded by conditions.
//!
//! A policy's conditions are alternatives. The first one that hits decides
//! the output, which is either the policy's own value (static or read from
//! the context) or a value derived by the condition itself.

mod document;

pub use document::{PolicyDefinition, PolicyDocument};

use crate::api::EvaluationContext;
use crate::core::{Condition, ConditionRegistry, Derived};
use crate::error::ErrorContext;
use crate::{Error, Result};

use serde_json::Value;
use std::fmt;

/// Where a policy's output comes from when a condition hits without
/// deriving its own value.
#[derive(Debug, Clone, PartialEq)]
pub enum PolicyOutput {
    /// A fixed value from the document
    Static(Value),
    /// A key path resolved against the evaluation context
    FromContext(String),
}

impl PolicyOutput {
    fn resolve(&self, context: &EvaluationContext) -> Result<Value> {
        match self {
            PolicyOutput::Static(value) => Ok(value.clone()),
            PolicyOutput::FromContext(key) => context.require(key).cloned(),
        }
    }
}

/// A decoded policy.
#[derive(Debug)]
pub struct Policy {
    name: Option<String>,
    output: PolicyOutput,
    conditions: Vec<Condition>,
}

impl Policy {
    /// Create a policy from already-decoded conditions.
    pub fn new(output: PolicyOutput, conditions: Vec<Condition>) -> Result<Self> {
        if conditions.is_empty() {
            return Err(Error::validation_field(
                "policy must have at least one condition",
                "conditions",
            ));
        }
        Ok(Self {
            name: None,
            output,
            conditions,
        })
    }

    /// Set a display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Decode a policy definition, resolving condition types through
    /// `registry`.
    pub fn decode(definition: PolicyDefinition, registry: &ConditionRegistry) -> Result<Self> {
        let value_from = definition.value_from.filter(|key| !key.is_empty());
        let output = match (definition.value, value_from) {
            (Some(_), Some(_)) => {
                return Err(Error::validation("cannot have both value and valueFrom"))
            }
            (None, None) => {
                return Err(Error::validation_field(
                    "policy must set value or valueFrom",
                    "value",
                ))
            }
            (Some(value), None) => PolicyOutput::Static(value),
            (None, Some(key)) => PolicyOutput::FromContext(key),
        };

        let conditions = definition
            .conditions
            .into_iter()
            .enumerate()
            .map(|(i, condition)| {
                Condition::decode(condition, registry).with_field(format!("conditions[{}]", i))
            })
            .collect::<Result<Vec<_>>>()?;

        let policy = Self::new(output, conditions)?;
        Ok(match definition.name {
            Some(name) => policy.with_name(name),
            None => policy,
        })
    }

    /// The display name, if the document gave one.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The policy's own output.
    pub fn output(&self) -> &PolicyOutput {
        &self.output
    }

    /// The alternative conditions, in document order.
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// Evaluate the policy.
    ///
    /// Conditions are tried in order; an error from any of them ends the
    /// evaluation.
    ///
    /// # Arguments
    /// * `context` - The runtime context the conditions read from
    ///
    /// # Returns
    /// * `Ok(Some(value))` - The derived value or the policy output on a hit
    /// * `Ok(None)` - If no condition matched
    /// * `Err(Error)` - If the context is empty, a key is missing or has the
    ///   wrong type, or `valueFrom` names a key the context lacks
    pub fn evaluate(&self, context: &EvaluationContext) -> Result<Option<Value>> {
        if context.is_empty() {
            return Err(Error::EmptyContext);
        }

        for condition in &self.conditions {
            let outcome = condition.outcome(context)?;
            if outcome.hit {
                return match outcome.derived {
                    Derived::Value(value) => Ok(Some(value)),
                    Derived::Deferred => self.output.resolve(context).map(Some),
                };
            }
        }
        Ok(None)
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, condition) in self.conditions.iter().enumerate() {
            if i > 0 {
                f.write_str(" OR ")?;
            }
            write!(f, "({})", condition)?;
        }
        Ok(())
    }
}
