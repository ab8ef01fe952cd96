//! Policy decision types.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// The result of evaluating a policy engine against a context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyDecision {
    /// Whether any policy matched
    pub hit: bool,
    /// Output of the matching policy (static, context-sourced or derived)
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present_value"
    )]
    pub value: Option<Value>,
    /// Position of the matching policy in document order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_index: Option<usize>,
    /// Name of the matching policy, if it declared one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_name: Option<String>,
}

/// A present `value` field is kept as is, so an explicit `null` stays
/// `Some(Value::Null)`; only an absent field becomes `None`.
fn present_value<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl PolicyDecision {
    /// No policy matched.
    pub fn miss() -> Self {
        Self {
            hit: false,
            value: None,
            policy_index: None,
            policy_name: None,
        }
    }

    /// A policy matched and produced `value`.
    pub fn hit(value: Value, policy_index: usize) -> Self {
        Self {
            hit: true,
            value: Some(value),
            policy_index: Some(policy_index),
            policy_name: None,
        }
    }

    /// Set the matching policy's name.
    pub fn with_policy_name(mut self, name: Option<String>) -> Self {
        self.policy_name = name;
        self
    }

    /// The output value, when it is a string.
    pub fn value_str(&self) -> Option<&str> {
        self.value.as_ref().and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_miss() {
        let d = PolicyDecision::miss();
        assert!(!d.hit);
        assert!(d.value.is_none());
        assert_eq!(serde_json::to_value(&d).unwrap(), json!({"hit": false}));
    }

    #[test]
    fn test_hit_serialization() {
        let d = PolicyDecision::hit(json!("latexmk"), 0).with_policy_name(Some("build".into()));
        assert_eq!(d.value_str(), Some("latexmk"));
        assert_eq!(
            serde_json::to_value(&d).unwrap(),
            json!({"hit": true, "value": "latexmk", "policy_index": 0, "policy_name": "build"})
        );
    }

    #[test]
    fn test_null_value_survives_json() {
        let d = PolicyDecision::hit(Value::Null, 2);
        let json = serde_json::to_string(&d).unwrap();
        assert_eq!(json, r#"{"hit":true,"value":null,"policy_index":2}"#);

        let back: PolicyDecision = serde_json::from_str(&json).unwrap();
        assert_eq!(back, d);
        assert_eq!(back.value, Some(Value::Null));

        let miss: PolicyDecision = serde_json::from_str(r#"{"hit":false}"#).unwrap();
        assert_eq!(miss, PolicyDecision::miss());
    }
}
