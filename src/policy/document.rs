//! Policy document parsing.

use crate::core::ConditionDefinition;
use crate::{Error, Result};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

/// A policy as written in a document, before its conditions are decoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyDefinition {
    /// Optional display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Static output
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    /// Key path to read the output from instead
    #[serde(
        rename = "valueFrom",
        alias = "value_from",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub value_from: Option<String>,
    /// Alternative conditions
    #[serde(default)]
    pub conditions: Vec<ConditionDefinition>,
}

impl PolicyDefinition {
    /// Create a definition with a static output.
    pub fn with_value(value: impl Into<Value>, conditions: Vec<ConditionDefinition>) -> Self {
        Self {
            name: None,
            value: Some(value.into()),
            value_from: None,
            conditions,
        }
    }

    /// Create a definition whose output is read from the context.
    pub fn with_value_from(key: impl Into<String>, conditions: Vec<ConditionDefinition>) -> Self {
        Self {
            name: None,
            value: None,
            value_from: Some(key.into()),
            conditions,
        }
    }
}

/// An ordered list of policy definitions.
///
/// Accepts either a bare list or a mapping with a `policies` key:
///
/// ```yaml
/// policies:
///   - value: latexmk
///     conditions:
///       - type: equal
///         spec: { key: remote_addr, value: foo }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyDocument {
    /// Policies in evaluation order
    #[serde(default)]
    pub policies: Vec<PolicyDefinition>,
}

impl PolicyDocument {
    /// Create a document from definitions.
    pub fn new(policies: Vec<PolicyDefinition>) -> Self {
        Self { policies }
    }

    /// Parse a policy document from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let value: Value = serde_yaml::from_str(yaml)?;
        Self::from_value(value)
    }

    /// Parse a policy document from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Load a policy document from a file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        match extension.to_lowercase().as_str() {
            "json" => Self::from_json(&content),
            // YAML is a superset of JSON
            _ => Self::from_yaml(&content),
        }
    }

    /// Interpret an already-parsed document tree.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(Self::default()),
            Value::Array(_) => Ok(Self {
                policies: serde_json::from_value(value)?,
            }),
            Value::Object(_) => Ok(serde_json::from_value(value)?),
            _ => Err(Error::validation(
                "policy document must be a list of policies or a map with a policies key",
            )),
        }
    }

    /// Convert the document to YAML.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(Error::from)
    }

    /// Convert the document to JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(Error::from)
    }

    /// Whether the document holds no policies.
    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    /// Number of policies.
    pub fn len(&self) -> usize {
        self.policies.len()
    }
}
