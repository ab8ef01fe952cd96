//! Policy engine implementation.

use super::{EvaluationContext, PolicyDecision};
use crate::config::Config;
use crate::core::{ConditionRegistry, Semantics};
use crate::error::ErrorContext;
use crate::policy::{Policy, PolicyDocument};
use crate::{Error, Result};

use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// An ordered list of policies evaluated first-match-wins.
///
/// Engines are immutable once built, so a shared reference can serve any
/// number of concurrent `evaluate` calls.
#[derive(Debug)]
pub struct PolicyEngine {
    policies: Vec<Policy>,
}

impl PolicyEngine {
    /// Create a policy engine builder.
    pub fn builder() -> PolicyEngineBuilder {
        PolicyEngineBuilder::new()
    }

    /// Create an engine from decoded policies.
    pub fn new(policies: Vec<Policy>) -> Result<Self> {
        if policies.is_empty() {
            return Err(Error::validation("no policies found"));
        }
        Ok(Self { policies })
    }

    /// Decode every policy of `document` through `registry`.
    ///
    /// Loading is all or nothing: the first invalid policy fails the whole
    /// document.
    ///
    /// # Arguments
    /// * `document` - The parsed policy document
    /// * `registry` - Condition types available to the document
    ///
    /// # Returns
    /// * `Ok(PolicyEngine)` - An engine over the decoded policies
    /// * `Err(Error)` - If the registry is empty, the document has no
    ///   policies, or a policy fails to decode (the error names its path)
    pub fn from_document(document: PolicyDocument, registry: &ConditionRegistry) -> Result<Self> {
        if registry.is_empty() {
            return Err(Error::NoConditionsRegistered);
        }

        let policies = document
            .policies
            .into_iter()
            .enumerate()
            .map(|(i, definition)| {
                Policy::decode(definition, registry).with_field(format!("policies[{}]", i))
            })
            .collect::<Result<Vec<_>>>()?;

        let engine = Self::new(policies)?;
        info!(
            policies = engine.policy_count(),
            semantics = %registry.semantics(),
            "Policy engine built"
        );
        Ok(engine)
    }

    /// Build an engine from a YAML document.
    pub fn from_yaml(yaml: &str, registry: &ConditionRegistry) -> Result<Self> {
        Self::from_document(PolicyDocument::from_yaml(yaml)?, registry)
    }

    /// Build an engine from a JSON document.
    pub fn from_json(json: &str, registry: &ConditionRegistry) -> Result<Self> {
        Self::from_document(PolicyDocument::from_json(json)?, registry)
    }

    /// Build an engine from a policy file (YAML or JSON).
    ///
    /// # Arguments
    /// * `path` - Path to the policy file; a `.json` extension selects JSON
    /// * `registry` - Condition types available to the document
    pub fn from_file(path: impl AsRef<Path>, registry: &ConditionRegistry) -> Result<Self> {
        Self::from_document(PolicyDocument::from_file(path)?, registry)
    }

    /// Evaluate policies against the given context.
    ///
    /// Policies are tried in document order and the first hit decides. An
    /// error from any policy ends the evaluation; later policies are not
    /// tried.
    ///
    /// # Arguments
    /// * `context` - The evaluation context the conditions read from
    ///
    /// # Returns
    /// * `Ok(PolicyDecision)` - The first hit, or a miss
    /// * `Err(Error)` - If the context is empty or a policy failed to evaluate
    pub fn evaluate(&self, context: &EvaluationContext) -> Result<PolicyDecision> {
        if context.is_empty() {
            return Err(Error::EmptyContext);
        }

        for (index, policy) in self.policies.iter().enumerate() {
            match policy.evaluate(context) {
                Ok(Some(value)) => {
                    debug!(policy = index, name = ?policy.name(), "Policy hit");
                    return Ok(PolicyDecision::hit(value, index)
                        .with_policy_name(policy.name().map(str::to_string)));
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(
                        policy = index,
                        category = e.category(),
                        error = %e,
                        "Policy evaluation failed"
                    );
                    return Err(e);
                }
            }
        }

        debug!("No policy hit");
        Ok(PolicyDecision::miss())
    }

    /// The loaded policies, in evaluation order.
    pub fn policies(&self) -> &[Policy] {
        &self.policies
    }

    /// Get the number of loaded policies.
    pub fn policy_count(&self) -> usize {
        self.policies.len()
    }
}

impl fmt::Display for PolicyEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, policy) in self.policies.iter().enumerate() {
            if i > 0 {
                f.write_str(" OR ")?;
            }
            write!(f, "({})", policy)?;
        }
        Ok(())
    }
}

#[derive(Debug)]
enum PolicySource {
    Policy(Policy),
    Document(PolicyDocument),
    Yaml(String),
    File(PathBuf),
}

/// Builder for creating a PolicyEngine.
///
/// Sources are loaded in the order they were added. Without an explicit
/// registry every built-in condition type is available.
#[derive(Debug, Default)]
pub struct PolicyEngineBuilder {
    registry: Option<ConditionRegistry>,
    semantics: Option<Semantics>,
    sources: Vec<PolicySource>,
}

impl PolicyEngineBuilder {
    /// Create a new policy engine builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve condition types through `registry`.
    pub fn with_registry(mut self, registry: ConditionRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Override the registry's combinator semantics.
    pub fn with_semantics(mut self, semantics: Semantics) -> Self {
        self.semantics = Some(semantics);
        self
    }

    /// Apply engine configuration: semantics and the startup policy file.
    pub fn with_config(mut self, config: &Config) -> Self {
        self.semantics = Some(config.engine.semantics);
        if let Some(path) = &config.engine.policy_file {
            self.sources.push(PolicySource::File(path.clone()));
        }
        self
    }

    /// Add an already-decoded policy.
    pub fn with_policy(mut self, policy: Policy) -> Self {
        self.sources.push(PolicySource::Policy(policy));
        self
    }

    /// Add the policies of a parsed document.
    pub fn with_document(mut self, document: PolicyDocument) -> Self {
        self.sources.push(PolicySource::Document(document));
        self
    }

    /// Add the policies of a YAML document.
    pub fn with_yaml(mut self, yaml: impl Into<String>) -> Self {
        self.sources.push(PolicySource::Yaml(yaml.into()));
        self
    }

    /// Add the policies of a policy file.
    pub fn with_policy_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.sources.push(PolicySource::File(path.into()));
        self
    }

    /// Build the policy engine.
    pub fn build(self) -> Result<PolicyEngine> {
        let mut registry = self.registry.unwrap_or_else(ConditionRegistry::with_builtins);
        if let Some(semantics) = self.semantics {
            registry = registry.with_semantics(semantics);
        }

        let mut policies = Vec::new();
        for source in self.sources {
            let document = match source {
                PolicySource::Policy(policy) => {
                    policies.push(policy);
                    continue;
                }
                PolicySource::Document(document) => document,
                PolicySource::Yaml(yaml) => PolicyDocument::from_yaml(&yaml)?,
                PolicySource::File(path) => {
                    info!(path = %path.display(), "Loading policy file");
                    PolicyDocument::from_file(&path)?
                }
            };
            let engine = PolicyEngine::from_document(document, &registry)?;
            policies.extend(engine.policies);
        }

        PolicyEngine::new(policies)
    }
}
