//! Self-describing condition nodes.

use super::registry::ConditionRegistry;
use super::spec::{ConditionSpec, Outcome};
use crate::api::EvaluationContext;
use crate::{Error, Result};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use tracing::trace;

/// A condition node as written in a policy document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionDefinition {
    /// Discriminator selecting the registered condition type
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Type-specific payload
    #[serde(default)]
    pub spec: Value,
}

impl ConditionDefinition {
    /// Create a definition from a discriminator and payload.
    pub fn new(kind: impl Into<String>, spec: Value) -> Self {
        Self {
            kind: kind.into(),
            spec,
        }
    }
}

/// A decoded condition: a discriminator paired with the spec it selected.
#[derive(Debug)]
pub struct Condition {
    kind: String,
    spec: Box<dyn ConditionSpec>,
}

impl Condition {
    /// Wrap an already-populated spec.
    pub fn new(kind: impl Into<String>, spec: impl ConditionSpec + 'static) -> Self {
        Self {
            kind: kind.into(),
            spec: Box::new(spec),
        }
    }

    /// Decode a definition, resolving its type through `registry`.
    pub fn decode(definition: ConditionDefinition, registry: &ConditionRegistry) -> Result<Self> {
        if registry.is_empty() {
            return Err(Error::NoConditionsRegistered);
        }
        if definition.kind.is_empty() {
            return Err(Error::EmptyConditionType);
        }

        let factory = registry
            .lookup(&definition.kind)
            .ok_or_else(|| Error::unknown_condition(&definition.kind))?;

        let mut spec = factory();
        spec.decode(definition.spec, registry)?;

        Ok(Self {
            kind: definition.kind,
            spec,
        })
    }

    /// Decode a raw document node (`{type: ..., spec: ...}`).
    pub fn from_value(node: Value, registry: &ConditionRegistry) -> Result<Self> {
        let definition: ConditionDefinition = serde_json::from_value(node)
            .map_err(|e| Error::validation(format!("malformed condition: {}", e)))?;
        Self::decode(definition, registry)
    }

    /// The discriminator this condition was built from.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// The underlying spec.
    pub fn spec(&self) -> &dyn ConditionSpec {
        self.spec.as_ref()
    }

    /// Evaluate the boolean predicate.
    pub fn evaluate(&self, context: &EvaluationContext) -> Result<bool> {
        let hit = self.spec.evaluate(context)?;
        trace!(kind = %self.kind, hit, "condition evaluated");
        Ok(hit)
    }

    /// Whether the spec produces derived values.
    pub fn value_return_enabled(&self) -> bool {
        self.spec.value_return_enabled()
    }

    /// Whether the condition type supports derived values at all.
    pub fn value_return_capable(&self) -> bool {
        self.spec.value_return_capable()
    }

    /// Evaluate through the value-returning path unconditionally.
    pub fn evaluate_with_value(&self, context: &EvaluationContext) -> Result<Outcome> {
        self.spec.evaluate_with_value(context)
    }

    /// Evaluate through the value-returning path when the spec enables it,
    /// otherwise through the boolean path.
    pub fn outcome(&self, context: &EvaluationContext) -> Result<Outcome> {
        if self.value_return_enabled() {
            let outcome = self.spec.evaluate_with_value(context)?;
            trace!(kind = %self.kind, hit = outcome.hit, "value condition evaluated");
            Ok(outcome)
        } else {
            Ok(Outcome::deferred(self.evaluate(context)?))
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.spec, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_requires_registered_types() {
        let node = json!({"type": "equal", "spec": {"key": "a", "value": "b"}});
        let err = Condition::from_value(node, &ConditionRegistry::new()).unwrap_err();
        assert!(matches!(err, Error::NoConditionsRegistered));
    }

    #[test]
    fn test_decode_unknown_type() {
        let registry = ConditionRegistry::with_builtins();
        let node = json!({"type": "glob", "spec": {"key": "a"}});
        match Condition::from_value(node, &registry) {
            Err(Error::UnknownCondition { kind }) => assert_eq!(kind, "glob"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_decode_empty_type() {
        let registry = ConditionRegistry::with_builtins();
        let node = json!({"spec": {"key": "a"}});
        let err = Condition::from_value(node, &registry).unwrap_err();
        assert!(matches!(err, Error::EmptyConditionType));
    }

    #[test]
    fn test_decode_malformed_payload() {
        let registry = ConditionRegistry::with_builtins();
        let node = json!({"type": "equal", "spec": ["not", "a", "map"]});
        let err = Condition::from_value(node, &registry).unwrap_err();
        assert!(matches!(err, Error::InvalidSpec { ref kind, .. } if kind == "equal"));

        let node = json!({"type": "exists"});
        assert!(Condition::from_value(node, &registry).is_err());
    }

    #[test]
    fn test_decode_and_render() {
        let registry = ConditionRegistry::with_builtins();
        let node = json!({"type": "equal", "spec": {"key": "remote_addr", "value": "foo"}});
        let condition = Condition::from_value(node, &registry).unwrap();
        assert_eq!(condition.kind(), "equal");
        assert_eq!(condition.to_string(), "[remote_addr] EQUALS \"foo\"");
    }

    #[test]
    fn test_outcome_dispatch() {
        let registry = ConditionRegistry::with_builtins();
        let ctx = EvaluationContext::builder()
            .with("host", "baz.example.com")
            .build();

        let plain = Condition::from_value(
            json!({"type": "regex", "spec": {"key": "host", "pattern": "example"}}),
            &registry,
        )
        .unwrap();
        assert!(!plain.value_return_enabled());
        assert_eq!(plain.outcome(&ctx).unwrap(), Outcome::deferred(true));

        let capturing = Condition::from_value(
            json!({"type": "regex", "spec": {"key": "host", "pattern": "(.*)\\.example\\.com", "return": "\\1"}}),
            &registry,
        )
        .unwrap();
        assert!(capturing.value_return_enabled());
        assert_eq!(capturing.outcome(&ctx).unwrap(), Outcome::value("baz"));
    }
}
