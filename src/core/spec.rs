//! The condition spec contract and the value-return protocol.
//!
//! Every condition type, leaf or combinator, implements [`ConditionSpec`].
//! A spec may additionally produce a *derived* output value when it matches
//! (a regex capture, for instance). Such specs override
//! [`ConditionSpec::value_return_enabled`] and
//! [`ConditionSpec::evaluate_with_value`]; everyone else inherits defaults
//! that report "not enabled" and wrap the boolean result in an [`Outcome`]
//! carrying [`Derived::Deferred`].

use super::registry::ConditionRegistry;
use crate::api::EvaluationContext;
use crate::Result;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A predicate node implementation selected by a condition's `type`.
///
/// Instances start empty (as produced by a registry factory) and are filled
/// in by [`ConditionSpec::decode`]. After decoding they are never mutated,
/// so evaluation may run concurrently from any number of threads.
pub trait ConditionSpec: fmt::Display + fmt::Debug + Send + Sync {
    /// Populate this spec from the `spec` payload of a condition node.
    ///
    /// Combinators decode their children through `registry`.
    fn decode(&mut self, payload: Value, registry: &ConditionRegistry) -> Result<()>;

    /// Evaluate the predicate against `context`.
    fn evaluate(&self, context: &EvaluationContext) -> Result<bool>;

    /// Whether this spec was configured to produce derived values.
    fn value_return_enabled(&self) -> bool {
        false
    }

    /// Whether this condition type can produce derived values at all, even
    /// if this instance was configured not to.
    fn value_return_capable(&self) -> bool {
        self.value_return_enabled()
    }

    /// Evaluate the predicate and, on a hit, produce the derived value.
    fn evaluate_with_value(&self, context: &EvaluationContext) -> Result<Outcome> {
        Ok(Outcome::deferred(self.evaluate(context)?))
    }
}

/// The value side channel of an evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum Derived {
    /// Matched without producing a value: use the policy's own output.
    Deferred,
    /// A value computed by the condition, `null` included.
    Value(Value),
}

impl Derived {
    /// Whether this is the "no derived value" marker.
    pub fn is_deferred(&self) -> bool {
        matches!(self, Derived::Deferred)
    }
}

/// Result of a value-returning evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    /// Whether the predicate matched
    pub hit: bool,
    /// The derived value. On a miss it is `null`, or the marker when a
    /// conjunction failed on a capable condition with value return disabled;
    /// only [`Semantics::Compat`] negation reads it.
    pub derived: Derived,
}

impl Outcome {
    /// A miss.
    pub fn miss() -> Self {
        Self {
            hit: false,
            derived: Derived::Value(Value::Null),
        }
    }

    /// A boolean result with no derived value.
    pub fn deferred(hit: bool) -> Self {
        Self {
            hit,
            derived: Derived::Deferred,
        }
    }

    /// A hit carrying a derived value.
    pub fn value(value: impl Into<Value>) -> Self {
        Self {
            hit: true,
            derived: Derived::Value(value.into()),
        }
    }
}

/// How combinators treat the value side channel.
///
/// The two modes differ only when value-returning conditions sit under AND
/// or NOT:
///
/// * `Strict` keeps AND a true conjunction (every conjunct is checked even
///   after one of them produced a value) and lets a NOT that matches because
///   its value-returning child missed fall back to the policy's output.
/// * `Compat` reproduces the historical behavior: AND reports success as soon
///   as one conjunct produced a value, skipping the rest, and NOT flips the
///   child's hit while passing its derived value through unchanged (usually
///   an explicit `null` when the child missed).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Semantics {
    /// Conservative boolean semantics
    #[default]
    Strict,
    /// Historical short-circuit semantics
    Compat,
}

impl Semantics {
    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Semantics::Strict => "strict",
            Semantics::Compat => "compat",
        }
    }
}

impl fmt::Display for Semantics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Semantics {
    type Err = crate::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "strict" => Ok(Semantics::Strict),
            "compat" | "compatibility" => Ok(Semantics::Compat),
            _ => Err(crate::Error::config_key(
                format!("Unknown evaluation semantics: {}", s),
                "engine.semantics",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug)]
    struct Always(bool);

    impl fmt::Display for Always {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}", self.0)
        }
    }

    impl ConditionSpec for Always {
        fn decode(&mut self, _payload: Value, _registry: &ConditionRegistry) -> Result<()> {
            Ok(())
        }

        fn evaluate(&self, _context: &EvaluationContext) -> Result<bool> {
            Ok(self.0)
        }
    }

    #[test]
    fn test_default_value_path_defers() {
        let ctx = EvaluationContext::builder().with("k", "v").build();
        let spec = Always(true);
        assert!(!spec.value_return_enabled());
        assert_eq!(spec.evaluate_with_value(&ctx).unwrap(), Outcome::deferred(true));
        assert_eq!(
            Always(false).evaluate_with_value(&ctx).unwrap(),
            Outcome::deferred(false)
        );
        assert!(!spec.value_return_capable());
        assert_eq!(Outcome::miss().derived, Derived::Value(Value::Null));
    }

    #[test]
    fn test_null_is_a_value_not_the_marker() {
        let outcome = Outcome::value(Value::Null);
        assert!(outcome.hit);
        assert!(!outcome.derived.is_deferred());
        assert_eq!(Outcome::value("baz").derived, Derived::Value(json!("baz")));
    }

    #[test]
    fn test_semantics_parse() {
        assert_eq!("strict".parse::<Semantics>().unwrap(), Semantics::Strict);
        assert_eq!("COMPAT".parse::<Semantics>().unwrap(), Semantics::Compat);
        assert!("lenient".parse::<Semantics>().is_err());
        assert_eq!(Semantics::default(), Semantics::Strict);
    }
}
