//! Logical combinators: AND, OR and NOT over child conditions.
//!
//! Besides plain boolean evaluation, each combinator forwards the value side
//! channel of its children. A combinator is value-returning as soon as one
//! of its children is, and its [`Outcome`] carries whichever derived value
//! the children produced, or [`Derived::Deferred`] when none did.

use super::{decode_payload, not_decoded};
use crate::api::EvaluationContext;
use crate::core::{
    Condition, ConditionDefinition, ConditionRegistry, ConditionSpec, Derived, Outcome, Semantics,
};
use crate::{Error, Result};

use serde::Deserialize;
use serde_json::Value;
use std::fmt;

#[derive(Deserialize)]
struct ConditionsPayload {
    conditions: Vec<ConditionDefinition>,
}

#[derive(Deserialize)]
struct ConditionPayload {
    condition: ConditionDefinition,
}

fn decode_children(
    kind: &str,
    payload: Value,
    registry: &ConditionRegistry,
) -> Result<Vec<Condition>> {
    let payload: ConditionsPayload = decode_payload(kind, payload)?;
    if payload.conditions.is_empty() {
        return Err(Error::invalid_spec(kind, "at least one condition is required"));
    }
    payload
        .conditions
        .into_iter()
        .map(|definition| Condition::decode(definition, registry))
        .collect()
}

fn write_joined(f: &mut fmt::Formatter<'_>, conditions: &[Condition], op: &str) -> fmt::Result {
    for (i, condition) in conditions.iter().enumerate() {
        if i > 0 {
            f.write_str(op)?;
        }
        write!(f, "({})", condition)?;
    }
    Ok(())
}

/// Conjunction of child conditions.
#[derive(Debug, Default)]
pub struct AndSpec {
    conditions: Vec<Condition>,
    semantics: Semantics,
}

impl AndSpec {
    /// Create a conjunction over already-decoded conditions.
    pub fn new(conditions: Vec<Condition>, semantics: Semantics) -> Self {
        Self {
            conditions,
            semantics,
        }
    }

    /// The child conditions.
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }
}

impl fmt::Display for AndSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_joined(f, &self.conditions, " AND ")
    }
}

impl ConditionSpec for AndSpec {
    fn decode(&mut self, payload: Value, registry: &ConditionRegistry) -> Result<()> {
        self.conditions = decode_children("and", payload, registry)?;
        self.semantics = registry.semantics();
        Ok(())
    }

    fn evaluate(&self, context: &EvaluationContext) -> Result<bool> {
        for condition in &self.conditions {
            if !condition.evaluate(context)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn value_return_enabled(&self) -> bool {
        self.conditions.iter().any(Condition::value_return_enabled)
    }

    fn value_return_capable(&self) -> bool {
        true
    }

    /// Children run left to right and the first miss ends the evaluation.
    /// The first value-returning child supplies the derived value; later
    /// children only contribute their boolean result. Under
    /// [`Semantics::Compat`] the remaining children are skipped entirely once
    /// a value has been captured, and a miss on a capable child with value
    /// return disabled carries the marker instead of `null`.
    fn evaluate_with_value(&self, context: &EvaluationContext) -> Result<Outcome> {
        let mut derived = Derived::Deferred;
        let mut captured = false;

        for condition in &self.conditions {
            if !captured && condition.value_return_enabled() {
                let outcome = condition.evaluate_with_value(context)?;
                if !outcome.hit {
                    return Ok(Outcome::miss());
                }
                derived = outcome.derived;
                captured = true;
                if self.semantics == Semantics::Compat {
                    break;
                }
            } else if !condition.evaluate(context)? {
                if !captured
                    && self.semantics == Semantics::Compat
                    && condition.value_return_capable()
                {
                    return Ok(Outcome::deferred(false));
                }
                return Ok(Outcome::miss());
            }
        }

        Ok(Outcome { hit: true, derived })
    }
}

/// Disjunction of child conditions.
#[derive(Debug, Default)]
pub struct OrSpec {
    conditions: Vec<Condition>,
}

impl OrSpec {
    /// Create a disjunction over already-decoded conditions.
    pub fn new(conditions: Vec<Condition>) -> Self {
        Self { conditions }
    }

    /// The child conditions.
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }
}

impl fmt::Display for OrSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_joined(f, &self.conditions, " OR ")
    }
}

impl ConditionSpec for OrSpec {
    fn decode(&mut self, payload: Value, registry: &ConditionRegistry) -> Result<()> {
        self.conditions = decode_children("or", payload, registry)?;
        Ok(())
    }

    fn evaluate(&self, context: &EvaluationContext) -> Result<bool> {
        for condition in &self.conditions {
            if condition.evaluate(context)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn value_return_enabled(&self) -> bool {
        self.conditions.iter().any(Condition::value_return_enabled)
    }

    fn value_return_capable(&self) -> bool {
        true
    }

    /// The first child that hits decides, derived value included.
    fn evaluate_with_value(&self, context: &EvaluationContext) -> Result<Outcome> {
        for condition in &self.conditions {
            let outcome = condition.outcome(context)?;
            if outcome.hit {
                return Ok(outcome);
            }
        }
        Ok(Outcome::miss())
    }
}

/// Negation of a single child condition.
#[derive(Debug, Default)]
pub struct NotSpec {
    condition: Option<Box<Condition>>,
    semantics: Semantics,
}

impl NotSpec {
    /// Negate an already-decoded condition.
    pub fn new(condition: Condition, semantics: Semantics) -> Self {
        Self {
            condition: Some(Box::new(condition)),
            semantics,
        }
    }

    fn child(&self) -> Result<&Condition> {
        self.condition.as_deref().ok_or_else(|| not_decoded("not"))
    }
}

impl fmt::Display for NotSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.condition {
            Some(condition) => write!(f, "NOT ({})", condition),
            None => f.write_str("NOT ()"),
        }
    }
}

impl ConditionSpec for NotSpec {
    fn decode(&mut self, payload: Value, registry: &ConditionRegistry) -> Result<()> {
        let payload: ConditionPayload = decode_payload("not", payload)?;
        self.condition = Some(Box::new(Condition::decode(payload.condition, registry)?));
        self.semantics = registry.semantics();
        Ok(())
    }

    fn evaluate(&self, context: &EvaluationContext) -> Result<bool> {
        Ok(!self.child()?.evaluate(context)?)
    }

    fn value_return_enabled(&self) -> bool {
        self.condition
            .as_deref()
            .is_some_and(Condition::value_return_enabled)
    }

    fn value_return_capable(&self) -> bool {
        true
    }

    /// NOT only hits when its child missed, so under [`Semantics::Strict`]
    /// the hit defers to the policy's output. Under [`Semantics::Compat`] the
    /// child's derived value passes through unchanged: an explicit `null`
    /// for most misses, the marker when the child was a conjunction that
    /// failed on a capable condition with value return disabled.
    fn evaluate_with_value(&self, context: &EvaluationContext) -> Result<Outcome> {
        let child = self.child()?;
        if !child.value_return_enabled() {
            return Ok(Outcome::deferred(!child.evaluate(context)?));
        }

        let outcome = child.evaluate_with_value(context)?;
        Ok(match self.semantics {
            Semantics::Strict if outcome.hit => Outcome::miss(),
            Semantics::Strict => Outcome::deferred(true),
            Semantics::Compat => Outcome {
                hit: !outcome.hit,
                derived: outcome.derived,
            },
        })
    }
}
