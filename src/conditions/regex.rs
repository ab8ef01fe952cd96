//! Regular expression matching with optional capture extraction.

use super::{decode_payload, not_decoded, require_key};
use crate::api::EvaluationContext;
use crate::core::{ConditionRegistry, ConditionSpec, Outcome};
use crate::{Error, Result};

use regex::{Captures, Regex};
use serde::Deserialize;
use serde_json::Value;
use std::fmt;

/// Hits when the string at `key` matches `pattern` anywhere.
///
/// With a `return` template such as `\1` or `user-\2`, a match also derives
/// an output value: each `\N` (N in 1..=9) is replaced by capture group N,
/// or by nothing when the group did not participate in the match.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegexSpec {
    /// Key path to read
    pub key: String,
    /// Regular expression, unanchored
    pub pattern: String,
    /// Output template; empty disables value extraction
    #[serde(rename = "return", default)]
    pub template: String,
    #[serde(skip)]
    regex: Option<Regex>,
}

impl RegexSpec {
    /// Create a regex condition, compiling the pattern.
    pub fn new(
        key: impl Into<String>,
        pattern: impl Into<String>,
        template: impl Into<String>,
    ) -> Result<Self> {
        let mut spec = Self {
            key: key.into(),
            pattern: pattern.into(),
            template: template.into(),
            regex: None,
        };
        spec.compile()?;
        Ok(spec)
    }

    fn compile(&mut self) -> Result<()> {
        require_key("regex", &self.key)?;
        let regex = Regex::new(&self.pattern).map_err(|e| Error::invalid_spec("regex", e))?;
        self.regex = Some(regex);
        Ok(())
    }

    fn regex(&self) -> Result<&Regex> {
        self.regex.as_ref().ok_or_else(|| not_decoded("regex"))
    }
}

impl fmt::Display for RegexSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] MATCHES REGEX {}", self.key, self.pattern)
    }
}

impl ConditionSpec for RegexSpec {
    fn decode(&mut self, payload: Value, _registry: &ConditionRegistry) -> Result<()> {
        *self = decode_payload("regex", payload)?;
        self.compile()
    }

    fn evaluate(&self, context: &EvaluationContext) -> Result<bool> {
        let regex = self.regex()?;
        Ok(regex.is_match(context.require_str(&self.key)?))
    }

    fn value_return_enabled(&self) -> bool {
        !self.template.is_empty()
    }

    fn value_return_capable(&self) -> bool {
        true
    }

    fn evaluate_with_value(&self, context: &EvaluationContext) -> Result<Outcome> {
        let regex = self.regex()?;
        let target = context.require_str(&self.key)?;
        Ok(match regex.captures(target) {
            Some(captures) => Outcome::value(expand_template(&captures, &self.template)),
            None => Outcome::miss(),
        })
    }
}

/// Substitute `\1`..`\9` in `template` with capture groups.
///
/// An empty overall match expands to the empty string.
fn expand_template(captures: &Captures<'_>, template: &str) -> String {
    if captures.get(0).map_or(true, |m| m.as_str().is_empty()) {
        return String::new();
    }

    let bytes = template.as_bytes();
    let mut out = String::with_capacity(template.len());
    let mut last = 0;
    let mut i = 0;
    while i + 1 < bytes.len() {
        if bytes[i] == b'\\' && (b'1'..=b'9').contains(&bytes[i + 1]) {
            out.push_str(&template[last..i]);
            let group = usize::from(bytes[i + 1] - b'0');
            if let Some(m) = captures.get(group) {
                out.push_str(m.as_str());
            }
            i += 2;
            last = i;
        } else {
            i += 1;
        }
    }
    out.push_str(&template[last..]);
    out
}
