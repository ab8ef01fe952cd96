//! Substring containment.

use super::{decode_payload, require_key};
use crate::api::EvaluationContext;
use crate::core::{ConditionRegistry, ConditionSpec};
use crate::Result;

use serde::Deserialize;
use serde_json::Value;
use std::fmt;

/// Hits when the string at `key` contains `value`.
///
/// Registered as both `contains` and `substring`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubstringSpec {
    /// Key path to read
    pub key: String,
    /// Substring to look for
    pub value: String,
}

impl SubstringSpec {
    /// Create a substring condition.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for SubstringSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] CONTAINS {}", self.key, self.value)
    }
}

impl ConditionSpec for SubstringSpec {
    fn decode(&mut self, payload: Value, _registry: &ConditionRegistry) -> Result<()> {
        *self = decode_payload("contains", payload)?;
        require_key("contains", &self.key)
    }

    fn evaluate(&self, context: &EvaluationContext) -> Result<bool> {
        Ok(context.require_str(&self.key)?.contains(self.value.as_str()))
    }
}
