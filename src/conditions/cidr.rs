//! IP range membership.

use super::{decode_payload, not_decoded, require_key};
use crate::api::EvaluationContext;
use crate::core::{ConditionRegistry, ConditionSpec};
use crate::{Error, Result};

use ipnet::IpNet;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::net::IpAddr;

/// Hits when the IP address at `key` lies inside the CIDR range `value`.
///
/// The range may have host bits set (`10.1.0.1/24` covers `10.1.0.0/24`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CidrSpec {
    /// Key path to read
    pub key: String,
    /// CIDR range, IPv4 or IPv6
    pub value: String,
    #[serde(skip)]
    network: Option<IpNet>,
}

impl CidrSpec {
    /// Create a CIDR condition, parsing the range.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Result<Self> {
        let mut spec = Self {
            key: key.into(),
            value: value.into(),
            network: None,
        };
        spec.compile()?;
        Ok(spec)
    }

    fn compile(&mut self) -> Result<()> {
        require_key("cidr", &self.key)?;
        let network = self.value.trim().parse::<IpNet>().map_err(|e| {
            Error::invalid_spec("cidr", format!("invalid CIDR range {:?}: {}", self.value, e))
        })?;
        self.network = Some(network);
        Ok(())
    }
}

impl fmt::Display for CidrSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] IN CIDR RANGE {}", self.key, self.value)
    }
}

impl ConditionSpec for CidrSpec {
    fn decode(&mut self, payload: Value, _registry: &ConditionRegistry) -> Result<()> {
        *self = decode_payload("cidr", payload)?;
        self.compile()
    }

    fn evaluate(&self, context: &EvaluationContext) -> Result<bool> {
        let network = self.network.as_ref().ok_or_else(|| not_decoded("cidr"))?;
        let raw = context.require_str(&self.key)?;
        let ip: IpAddr = raw.trim().parse().map_err(|_| {
            Error::evaluation_key(
                format!("value at key {} is not a valid IP address: {:?}", self.key, raw),
                &self.key,
            )
        })?;
        Ok(network.contains(&ip))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(ip: &str) -> EvaluationContext {
        EvaluationContext::builder()
            .with_path("header.X-Forwarded-For", ip)
            .build()
    }

    #[test]
    fn test_cidr_membership() {
        let spec = CidrSpec::new("header.X-Forwarded-For", "10.1.0.1/24").unwrap();
        assert!(spec.evaluate(&ctx("10.1.0.1")).unwrap());
        assert!(spec.evaluate(&ctx("10.1.0.254")).unwrap());
        assert!(!spec.evaluate(&ctx("12.1.0.1")).unwrap());
        assert!(!spec.evaluate(&ctx("10.1.1.1")).unwrap());
    }

    #[test]
    fn test_cidr_ipv6() {
        let spec = CidrSpec::new("header.X-Forwarded-For", "2001:db8::/32").unwrap();
        assert!(spec.evaluate(&ctx("2001:db8::1")).unwrap());
        assert!(!spec.evaluate(&ctx("2001:db9::1")).unwrap());
        assert!(!spec.evaluate(&ctx("10.1.0.1")).unwrap());
    }

    #[test]
    fn test_invalid_range_rejected_at_decode() {
        let mut spec = CidrSpec::default();
        let err = spec
            .decode(
                serde_json::json!({"key": "ip", "value": "10.1.0.1"}),
                &ConditionRegistry::new(),
            )
            .unwrap_err();
        assert!(matches!(err, Error::InvalidSpec { ref kind, .. } if kind == "cidr"));
        assert!(CidrSpec::new("ip", "not-a-range").is_err());
    }

    #[test]
    fn test_invalid_ip_in_context() {
        let spec = CidrSpec::new("header.X-Forwarded-For", "10.1.0.0/16").unwrap();
        let err = spec.evaluate(&ctx("localhost")).unwrap_err();
        assert!(err.is_evaluation());
        assert_eq!(err.key(), Some("header.X-Forwarded-For"));
    }

    #[test]
    fn test_missing_key() {
        let spec = CidrSpec::new("header.X-Forwarded-For", "10.1.0.0/16").unwrap();
        let ctx = EvaluationContext::builder().with("remote_addr", "x").build();
        assert!(spec.evaluate(&ctx).unwrap_err().is_key_not_found());
    }

    #[test]
    fn test_undecoded_spec_errors() {
        let spec = CidrSpec::default();
        assert!(matches!(
            spec.evaluate(&ctx("10.1.0.1")).unwrap_err(),
            Error::Internal { .. }
        ));
    }
}
