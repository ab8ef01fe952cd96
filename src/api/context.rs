//! Evaluation context definitions.
//!
//! A context is a string-keyed map whose values may themselves be maps.
//! Conditions address values with dot-separated key paths.

use crate::core::keypath;
use crate::{Error, Result};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Context provided for policy evaluation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EvaluationContext {
    values: Map<String, Value>,
}

impl EvaluationContext {
    /// Create an empty evaluation context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context builder.
    pub fn builder() -> EvaluationContextBuilder {
        EvaluationContextBuilder::new()
    }

    /// Parse a context from a JSON object.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::try_from(value)
    }

    /// Get a value by key path (e.g. `header.X-Forwarded-For`).
    pub fn get(&self, path: &str) -> Option<&Value> {
        keypath::resolve(path, &self.values)
    }

    /// Get a value by key path, failing with [`Error::KeyNotFound`].
    pub fn require(&self, path: &str) -> Result<&Value> {
        self.get(path).ok_or_else(|| Error::key_not_found(path))
    }

    /// Get a string by key path, failing on absence or on a non-string value.
    pub fn require_str(&self, path: &str) -> Result<&str> {
        match self.require(path)? {
            Value::String(s) => Ok(s),
            other => Err(Error::type_mismatch(path, "a string", other)),
        }
    }

    /// Whether the context holds no top-level keys.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of top-level keys.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// The underlying map.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.values
    }
}

impl From<Map<String, Value>> for EvaluationContext {
    fn from(values: Map<String, Value>) -> Self {
        Self { values }
    }
}

impl TryFrom<Value> for EvaluationContext {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Object(values) => Ok(Self { values }),
            other => Err(Error::type_mismatch("<context>", "a map", &other)),
        }
    }
}

/// Builder for creating evaluation contexts.
#[derive(Debug, Default)]
pub struct EvaluationContextBuilder {
    values: Map<String, Value>,
}

impl EvaluationContextBuilder {
    /// Create a new context builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a top-level key.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Set a value at a dot-separated path, creating intermediate maps.
    ///
    /// An intermediate segment already holding a non-map value is replaced.
    pub fn with_path(mut self, path: &str, value: impl Into<Value>) -> Self {
        let mut segments: Vec<&str> = path.split('.').collect();
        let last = segments.pop().unwrap_or_default();

        let mut current = &mut self.values;
        for segment in segments {
            let entry = current
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            current = match entry {
                Value::Object(map) => map,
                _ => unreachable!("entry was just made an object"),
            };
        }
        current.insert(last.to_string(), value.into());
        self
    }

    /// Build the evaluation context.
    pub fn build(self) -> EvaluationContext {
        EvaluationContext {
            values: self.values,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_context_builder() {
        let ctx = EvaluationContext::builder()
            .with("remote_addr", "10.0.0.1")
            .with_path("header.X-Forwarded-For", "10.1.0.1")
            .with_path("header.Host", "baz.example.com")
            .build();

        assert_eq!(ctx.len(), 2);
        assert_eq!(ctx.get("remote_addr"), Some(&json!("10.0.0.1")));
        assert_eq!(ctx.get("header.X-Forwarded-For"), Some(&json!("10.1.0.1")));
        assert_eq!(ctx.get("header.Host"), Some(&json!("baz.example.com")));
    }

    #[test]
    fn test_with_path_replaces_scalar_parent() {
        let ctx = EvaluationContext::builder()
            .with("a", "scalar")
            .with_path("a.b", 1)
            .build();
        assert_eq!(ctx.get("a.b"), Some(&json!(1)));
    }

    #[test]
    fn test_require() {
        let ctx = EvaluationContext::builder()
            .with("host", "example.com")
            .with("port", 443)
            .build();

        assert_eq!(ctx.require_str("host").unwrap(), "example.com");
        assert!(ctx.require("missing").unwrap_err().is_key_not_found());
        assert!(matches!(
            ctx.require_str("port").unwrap_err(),
            Error::TypeMismatch { .. }
        ));
    }

    #[test]
    fn test_context_from_json() {
        let ctx = EvaluationContext::from_json(r#"{"header": {"Host": "a"}}"#).unwrap();
        assert_eq!(ctx.get("header.Host"), Some(&json!("a")));

        assert!(EvaluationContext::from_json("[1, 2]").is_err());
        assert!(EvaluationContext::from_json("{}").unwrap().is_empty());
    }

    #[test]
    fn test_context_serialization() {
        let ctx = EvaluationContext::builder().with("k", "v").build();
        let json = serde_json::to_string(&ctx).unwrap();
        assert_eq!(json, r#"{"k":"v"}"#);
        let parsed: EvaluationContext = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, ctx);
    }
}
