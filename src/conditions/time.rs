//! Time window checks.

use super::{decode_payload, require_key};
use crate::api::EvaluationContext;
use crate::core::{ConditionRegistry, ConditionSpec};
use crate::{Error, Result};

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::fmt;

/// Hits when the timestamp at `key` falls strictly inside the configured
/// window.
///
/// `layout` uses chrono's strftime syntax and applies to the bounds and the
/// context value alike. Without a layout, RFC 3339 is expected. Layouts that
/// carry no offset are read as UTC. A time-only layout such as `%H:%M`
/// pins every value to January 1st of year 0, so the window compares times
/// of day.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TimeSpec {
    /// Key path to read
    pub key: String,
    /// strftime layout
    #[serde(default)]
    pub layout: Option<String>,
    /// Exclusive upper bound
    #[serde(default)]
    pub before: Option<String>,
    /// Exclusive lower bound
    #[serde(default)]
    pub after: Option<String>,
    #[serde(skip)]
    before_at: Option<DateTime<FixedOffset>>,
    #[serde(skip)]
    after_at: Option<DateTime<FixedOffset>>,
}

impl TimeSpec {
    /// Create a time window condition, parsing the bounds.
    pub fn new(
        key: impl Into<String>,
        layout: Option<String>,
        after: Option<String>,
        before: Option<String>,
    ) -> Result<Self> {
        let mut spec = Self {
            key: key.into(),
            layout,
            before,
            after,
            before_at: None,
            after_at: None,
        };
        spec.compile()?;
        Ok(spec)
    }

    fn compile(&mut self) -> Result<()> {
        require_key("time", &self.key)?;
        self.layout = self.layout.take().filter(|l| !l.is_empty());
        self.before = self.before.take().filter(|b| !b.is_empty());
        self.after = self.after.take().filter(|a| !a.is_empty());

        if self.before.is_none() && self.after.is_none() {
            return Err(Error::invalid_spec(
                "time",
                "at least one of before or after must be set",
            ));
        }

        let layout = self.layout.as_deref();
        self.before_at = self
            .before
            .as_deref()
            .map(|raw| {
                parse_time(raw, layout).ok_or_else(|| {
                    Error::invalid_spec("time", format!("could not parse before time {:?}", raw))
                })
            })
            .transpose()?;
        self.after_at = self
            .after
            .as_deref()
            .map(|raw| {
                parse_time(raw, layout).ok_or_else(|| {
                    Error::invalid_spec("time", format!("could not parse after time {:?}", raw))
                })
            })
            .transpose()?;
        Ok(())
    }
}

/// Parse `raw` with `layout`, or as RFC 3339 when no layout is set.
fn parse_time(raw: &str, layout: Option<&str>) -> Option<DateTime<FixedOffset>> {
    let Some(layout) = layout else {
        return DateTime::parse_from_rfc3339(raw).ok();
    };
    if let Ok(t) = DateTime::parse_from_str(raw, layout) {
        return Some(t);
    }
    let naive = NaiveDateTime::parse_from_str(raw, layout)
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(raw, layout)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .or_else(|| {
            let time = NaiveTime::parse_from_str(raw, layout).ok()?;
            NaiveDate::from_ymd_opt(0, 1, 1).map(|d| d.and_time(time))
        })?;
    Some(Utc.from_utc_datetime(&naive).into())
}

impl fmt::Display for TimeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.after, &self.before) {
            (Some(after), Some(before)) => {
                write!(f, "[{}] BETWEEN {} AND {}", self.key, after, before)
            }
            (None, Some(before)) => write!(f, "[{}] BEFORE {}", self.key, before),
            (Some(after), None) => write!(f, "[{}] AFTER {}", self.key, after),
            (None, None) => write!(f, "[{}] ANY TIME", self.key),
        }
    }
}

impl ConditionSpec for TimeSpec {
    fn decode(&mut self, payload: Value, _registry: &ConditionRegistry) -> Result<()> {
        *self = decode_payload("time", payload)?;
        self.compile()
    }

    fn evaluate(&self, context: &EvaluationContext) -> Result<bool> {
        let raw = context.require_str(&self.key)?;
        let at = parse_time(raw, self.layout.as_deref()).ok_or_else(|| {
            Error::evaluation_key(
                format!(
                    "value at key {} does not conform to the expected layout ({}): {:?}",
                    self.key,
                    self.layout.as_deref().unwrap_or("RFC 3339"),
                    raw
                ),
                &self.key,
            )
        })?;

        let after_ok = self.after_at.map_or(true, |after| at > after);
        let before_ok = self.before_at.map_or(true, |before| at < before);
        Ok(after_ok && before_ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn at(t: &str) -> EvaluationContext {
        EvaluationContext::builder().with("now", t).build()
    }

    fn decoded(payload: Value) -> Result<TimeSpec> {
        let mut spec = TimeSpec::default();
        spec.decode(payload, &ConditionRegistry::new())?;
        Ok(spec)
    }

    #[test]
    fn test_window_rfc3339() {
        let spec = decoded(json!({
            "key": "now",
            "after": "2024-01-01T00:00:00Z",
            "before": "2024-12-31T23:59:59Z",
        }))
        .unwrap();

        assert!(spec.evaluate(&at("2024-06-15T12:00:00Z")).unwrap());
        assert!(spec.evaluate(&at("2024-06-15T12:00:00+02:00")).unwrap());
        assert!(!spec.evaluate(&at("2023-06-15T12:00:00Z")).unwrap());
        assert!(!spec.evaluate(&at("2025-01-01T00:00:00Z")).unwrap());
        // bounds are exclusive
        assert!(!spec.evaluate(&at("2024-01-01T00:00:00Z")).unwrap());
        assert_eq!(
            spec.to_string(),
            "[now] BETWEEN 2024-01-01T00:00:00Z AND 2024-12-31T23:59:59Z"
        );
    }

    #[test]
    fn test_single_bound() {
        let spec = TimeSpec::new("now", None, None, Some("2024-01-01T00:00:00Z".into())).unwrap();
        assert!(spec.evaluate(&at("2023-12-31T23:00:00Z")).unwrap());
        assert!(!spec.evaluate(&at("2024-02-01T00:00:00Z")).unwrap());
        assert_eq!(spec.to_string(), "[now] BEFORE 2024-01-01T00:00:00Z");

        let spec = TimeSpec::new("now", None, Some("2024-01-01T00:00:00Z".into()), None).unwrap();
        assert!(spec.evaluate(&at("2024-02-01T00:00:00Z")).unwrap());
        assert_eq!(spec.to_string(), "[now] AFTER 2024-01-01T00:00:00Z");
    }

    #[test]
    fn test_custom_layouts() {
        let spec = decoded(json!({
            "key": "now",
            "layout": "%Y-%m-%d %H:%M",
            "after": "2024-03-01 09:00",
            "before": "2024-03-01 17:00",
        }))
        .unwrap();
        assert!(spec.evaluate(&at("2024-03-01 12:30")).unwrap());
        assert!(!spec.evaluate(&at("2024-03-01 18:00")).unwrap());

        let spec = decoded(json!({"key": "now", "layout": "%Y-%m-%d", "after": "2024-03-01"})).unwrap();
        assert!(spec.evaluate(&at("2024-03-02")).unwrap());
        assert!(!spec.evaluate(&at("2024-03-01")).unwrap());
    }

    #[test]
    fn test_time_of_day_window() {
        let spec = decoded(json!({
            "key": "now",
            "layout": "%H:%M",
            "after": "09:00",
            "before": "17:00",
        }))
        .unwrap();
        assert!(spec.evaluate(&at("12:30")).unwrap());
        assert!(!spec.evaluate(&at("08:59")).unwrap());
        assert!(!spec.evaluate(&at("17:00")).unwrap());
        assert_eq!(spec.to_string(), "[now] BETWEEN 09:00 AND 17:00");
    }

    #[test]
    fn test_configuration_errors() {
        assert!(matches!(
            decoded(json!({"key": "now"})).unwrap_err(),
            Error::InvalidSpec { ref kind, .. } if kind == "time"
        ));
        assert!(decoded(json!({"key": "now", "before": "tomorrow"})).is_err());
        assert!(decoded(json!({
            "key": "now",
            "layout": "%Y-%m-%d",
            "before": "2024-01-01T00:00:00Z",
        }))
        .is_err());
    }

    #[test]
    fn test_unparsable_context_value() {
        let spec = TimeSpec::new("now", None, Some("2024-01-01T00:00:00Z".into()), None).unwrap();
        let err = spec.evaluate(&at("yesterday")).unwrap_err();
        assert!(err.is_evaluation());
        assert_eq!(err.key(), Some("now"));

        let ctx = EvaluationContext::builder().with("now", 1_700_000_000).build();
        assert!(matches!(
            spec.evaluate(&ctx).unwrap_err(),
            Error::TypeMismatch { .. }
        ));
    }
}
