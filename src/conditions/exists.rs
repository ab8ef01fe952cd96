//! Key presence.

use super::{decode_payload, require_key};
use crate::api::EvaluationContext;
use crate::core::{ConditionRegistry, ConditionSpec};
use crate::Result;

use serde::Deserialize;
use serde_json::Value;
use std::fmt;

/// Hits when `key` resolves in the context, whatever its value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExistsSpec {
    /// Key path to look up
    pub key: String,
}

impl ExistsSpec {
    /// Create an existence condition.
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

impl fmt::Display for ExistsSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] EXISTS", self.key)
    }
}

impl ConditionSpec for ExistsSpec {
    fn decode(&mut self, payload: Value, _registry: &ConditionRegistry) -> Result<()> {
        *self = decode_payload("exists", payload)?;
        require_key("exists", &self.key)
    }

    fn evaluate(&self, context: &EvaluationContext) -> Result<bool> {
        Ok(context.get(&self.key).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_exists() {
        let ctx = EvaluationContext::builder()
            .with_path("header.Authorization", "Bearer x")
            .with("flag", Value::Null)
            .build();

        assert!(ExistsSpec::new("header.Authorization").evaluate(&ctx).unwrap());
        assert!(ExistsSpec::new("flag").evaluate(&ctx).unwrap());
        assert!(ExistsSpec::new("header").evaluate(&ctx).unwrap());
        assert!(!ExistsSpec::new("header.Cookie").evaluate(&ctx).unwrap());
        assert!(!ExistsSpec::new("flag.inner").evaluate(&ctx).unwrap());
    }

    #[test]
    fn test_decode() {
        let mut spec = ExistsSpec::default();
        spec.decode(json!({"key": "user.id"}), &ConditionRegistry::new())
            .unwrap();
        assert_eq!(spec.to_string(), "[user.id] EXISTS");
        assert!(spec.decode(json!({}), &ConditionRegistry::new()).is_err());
    }
}
