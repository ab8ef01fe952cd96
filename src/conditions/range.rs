//! Numeric range checks.

use super::{decode_payload, require_key};
use crate::api::EvaluationContext;
use crate::core::{ConditionRegistry, ConditionSpec};
use crate::{Error, Result};

use serde::Deserialize;
use serde_json::Value;
use std::fmt;

/// Hits when the number at `key` lies within `[lower, upper]`.
///
/// Either bound may be omitted, but not both.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RangeSpec {
    /// Key path to read
    pub key: String,
    /// Inclusive lower bound
    #[serde(default)]
    pub lower: Option<f64>,
    /// Inclusive upper bound
    #[serde(default)]
    pub upper: Option<f64>,
}

impl RangeSpec {
    /// Create a range condition.
    pub fn new(key: impl Into<String>, lower: Option<f64>, upper: Option<f64>) -> Result<Self> {
        let spec = Self {
            key: key.into(),
            lower,
            upper,
        };
        spec.validate()?;
        Ok(spec)
    }

    fn validate(&self) -> Result<()> {
        require_key("range", &self.key)?;
        match (self.lower, self.upper) {
            (None, None) => Err(Error::invalid_spec(
                "range",
                "at least one of lower or upper must be set",
            )),
            (Some(lower), Some(upper)) if lower > upper => Err(Error::invalid_spec(
                "range",
                format!("lower bound {} exceeds upper bound {}", lower, upper),
            )),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for RangeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.lower, self.upper) {
            (Some(lower), Some(upper)) => {
                write!(f, "[{}] BETWEEN {} AND {}", self.key, lower, upper)
            }
            (Some(lower), None) => write!(f, "[{}] >= {}", self.key, lower),
            (None, Some(upper)) => write!(f, "[{}] <= {}", self.key, upper),
            (None, None) => write!(f, "[{}] ANY NUMBER", self.key),
        }
    }
}

impl ConditionSpec for RangeSpec {
    fn decode(&mut self, payload: Value, _registry: &ConditionRegistry) -> Result<()> {
        *self = decode_payload("range", payload)?;
        self.validate()
    }

    fn evaluate(&self, context: &EvaluationContext) -> Result<bool> {
        let value = context.require(&self.key)?;
        let x = value
            .as_f64()
            .ok_or_else(|| Error::type_mismatch(&self.key, "a number", value))?;
        Ok(self.lower.map_or(true, |l| x >= l) && self.upper.map_or(true, |u| x <= u))
    }
}
