//! Structural equality against a configured value.

use super::{decode_payload, require_key};
use crate::api::EvaluationContext;
use crate::core::{ConditionRegistry, ConditionSpec};
use crate::Result;

use serde::Deserialize;
use serde_json::Value;
use std::fmt;

/// Hits when the value at `key` equals `value`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EqualSpec {
    /// Key path to read
    pub key: String,
    /// Expected value
    #[serde(default)]
    pub value: Value,
}

impl EqualSpec {
    /// Create an equality condition.
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for EqualSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] EQUALS {}", self.key, self.value)
    }
}

impl ConditionSpec for EqualSpec {
    fn decode(&mut self, payload: Value, _registry: &ConditionRegistry) -> Result<()> {
        *self = decode_payload("equal", payload)?;
        require_key("equal", &self.key)
    }

    fn evaluate(&self, context: &EvaluationContext) -> Result<bool> {
        let actual = context.require(&self.key)?;
        Ok(values_equal(actual, &self.value))
    }
}

/// Deep equality where numbers compare by value (`1` equals `1.0`).
fn values_equal(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Number(a), Value::Number(e)) => {
            if let (Some(a), Some(e)) = (a.as_i64(), e.as_i64()) {
                return a == e;
            }
            if let (Some(a), Some(e)) = (a.as_u64(), e.as_u64()) {
                return a == e;
            }
            // a u64 past i64::MAX never equals a negative integer
            if !a.is_f64() && !e.is_f64() {
                return false;
            }
            match (a.as_f64(), e.as_f64()) {
                (Some(a), Some(e)) => a == e,
                _ => a == e,
            }
        }
        (Value::Array(a), Value::Array(e)) => {
            a.len() == e.len() && a.iter().zip(e).all(|(a, e)| values_equal(a, e))
        }
        (Value::Object(a), Value::Object(e)) => {
            a.len() == e.len()
                && a
                    .iter()
                    .all(|(k, v)| e.get(k).is_some_and(|ev| values_equal(v, ev)))
        }
        _ => actual == expected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decoded(payload: Value) -> Result<EqualSpec> {
        let mut spec = EqualSpec::default();
        spec.decode(payload, &ConditionRegistry::new())?;
        Ok(spec)
    }

    #[test]
    fn test_equal_strings() {
        let spec = decoded(json!({"key": "remote_addr", "value": "foo"})).unwrap();
        let ctx = EvaluationContext::builder().with("remote_addr", "foo").build();
        assert!(spec.evaluate(&ctx).unwrap());

        let ctx = EvaluationContext::builder().with("remote_addr", "bar").build();
        assert!(!spec.evaluate(&ctx).unwrap());
    }

    #[test]
    fn test_equal_nested_key() {
        let spec = EqualSpec::new("user.role", "admin");
        let ctx = EvaluationContext::builder()
            .with_path("user.role", "admin")
            .build();
        assert!(spec.evaluate(&ctx).unwrap());
    }

    #[test]
    fn test_equal_numbers_and_structures() {
        let ctx = EvaluationContext::builder()
            .with("port", 443)
            .with("ratio", 1.0)
            .with("tags", json!(["a", {"b": 2}]))
            .build();

        assert!(EqualSpec::new("port", 443).evaluate(&ctx).unwrap());
        assert!(EqualSpec::new("ratio", 1).evaluate(&ctx).unwrap());
        assert!(!EqualSpec::new("port", "443").evaluate(&ctx).unwrap());
        assert!(EqualSpec::new("tags", json!(["a", {"b": 2.0}]))
            .evaluate(&ctx)
            .unwrap());
    }

    #[test]
    fn test_equal_large_unsigned_integers_are_exact() {
        let ctx = EvaluationContext::builder()
            .with("n", u64::MAX - 1)
            .with("neg", -1)
            .with("half", 1.5)
            .build();

        assert!(!EqualSpec::new("n", u64::MAX).evaluate(&ctx).unwrap());
        assert!(EqualSpec::new("n", u64::MAX - 1).evaluate(&ctx).unwrap());
        assert!(!EqualSpec::new("neg", u64::MAX).evaluate(&ctx).unwrap());
        assert!(EqualSpec::new("half", 1.5).evaluate(&ctx).unwrap());
    }

    #[test]
    fn test_equal_missing_key() {
        let ctx = EvaluationContext::builder().with("other", 1).build();
        let err = EqualSpec::new("remote_addr", "foo").evaluate(&ctx).unwrap_err();
        assert!(err.is_key_not_found());
        assert_eq!(err.key(), Some("remote_addr"));
    }

    #[test]
    fn test_equal_requires_key() {
        assert!(decoded(json!({"value": "foo"})).is_err());
        assert!(decoded(json!("foo")).is_err());
    }
}
