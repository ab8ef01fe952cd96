//! Error types for the policy engine.
//!
//! Errors fall into three groups. Configuration errors surface while a policy
//! document is loaded and abort the whole load. Evaluation errors abort a
//! single `evaluate` call and carry enough context (the offending key, the
//! expected type) for callers to pick a fail-open or fail-closed policy.
//! Caller misuse (an empty evaluation context) is rejected before any
//! condition runs.

use thiserror::Error;

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the policy engine.
#[derive(Error, Debug)]
pub enum Error {
    /// Structural problem in a policy document
    #[error("Policy validation error: {message}")]
    Validation {
        /// Detailed error message
        message: String,
        /// Document path that caused the error, if known
        field: Option<String>,
    },

    /// A condition node names a type nobody registered
    #[error("unknown condition type: {kind}")]
    UnknownCondition {
        /// The discriminator that failed to resolve
        kind: String,
    },

    /// A condition node without a discriminator
    #[error("condition type must be set")]
    EmptyConditionType,

    /// Documents cannot be decoded before any condition type is registered
    #[error("no specs registered")]
    NoConditionsRegistered,

    /// The payload of a registered condition type is malformed
    #[error("invalid {kind} condition: {message}")]
    InvalidSpec {
        /// The condition discriminator
        kind: String,
        /// Detailed error message
        message: String,
    },

    /// A key required by a condition is absent from the context
    #[error("key not found: {key}")]
    KeyNotFound {
        /// The dot-separated key path
        key: String,
    },

    /// A context value has the wrong type for the condition reading it
    #[error("value at key {key} is not {expected}, got {found}")]
    TypeMismatch {
        /// The dot-separated key path
        key: String,
        /// Type the condition needs
        expected: &'static str,
        /// Type actually present
        found: &'static str,
    },

    /// A context value has the right type but cannot be interpreted
    #[error("Evaluation error: {message}")]
    Evaluation {
        /// Detailed error message
        message: String,
        /// Key whose value failed, if applicable
        key: Option<String>,
    },

    /// Evaluating against an empty context is always a caller bug
    #[error("evaluation context is empty")]
    EmptyContext,

    /// Application configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Detailed error message
        message: String,
        /// Configuration key that caused the error
        key: Option<String>,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Internal error (broken invariant)
    #[error("Internal error: {message}")]
    Internal {
        /// Detailed error message
        message: String,
    },
}

impl Error {
    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation {
            message: message.into(),
            field: None,
        }
    }

    /// Create a validation error with field context.
    pub fn validation_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Error::Validation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create an unknown condition type error.
    pub fn unknown_condition(kind: impl Into<String>) -> Self {
        Error::UnknownCondition { kind: kind.into() }
    }

    /// Create an invalid condition payload error.
    pub fn invalid_spec(kind: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Error::InvalidSpec {
            kind: kind.into(),
            message: message.to_string(),
        }
    }

    /// Create a key not found error.
    pub fn key_not_found(key: impl Into<String>) -> Self {
        Error::KeyNotFound { key: key.into() }
    }

    /// Create a type mismatch error for the value found at `key`.
    pub fn type_mismatch(
        key: impl Into<String>,
        expected: &'static str,
        found: &serde_json::Value,
    ) -> Self {
        Error::TypeMismatch {
            key: key.into(),
            expected,
            found: json_type_name(found),
        }
    }

    /// Create an evaluation error.
    pub fn evaluation(message: impl Into<String>) -> Self {
        Error::Evaluation {
            message: message.into(),
            key: None,
        }
    }

    /// Create an evaluation error tied to a context key.
    pub fn evaluation_key(message: impl Into<String>, key: impl Into<String>) -> Self {
        Error::Evaluation {
            message: message.into(),
            key: Some(key.into()),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: None,
        }
    }

    /// Create a configuration error with key context.
    pub fn config_key(message: impl Into<String>, key: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Error::Internal {
            message: message.into(),
        }
    }

    /// Whether this error was raised while loading a document or configuration.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::Validation { .. }
                | Error::UnknownCondition { .. }
                | Error::EmptyConditionType
                | Error::NoConditionsRegistered
                | Error::InvalidSpec { .. }
                | Error::Config { .. }
                | Error::Serialization(_)
                | Error::Yaml(_)
        )
    }

    /// Whether this error was raised while evaluating a context.
    pub fn is_evaluation(&self) -> bool {
        matches!(
            self,
            Error::KeyNotFound { .. } | Error::TypeMismatch { .. } | Error::Evaluation { .. }
        )
    }

    /// Whether this is a missing-key error.
    pub fn is_key_not_found(&self) -> bool {
        matches!(self, Error::KeyNotFound { .. })
    }

    /// The context key an evaluation error refers to.
    pub fn key(&self) -> Option<&str> {
        match self {
            Error::KeyNotFound { key } | Error::TypeMismatch { key, .. } => Some(key),
            Error::Evaluation { key, .. } => key.as_deref(),
            _ => None,
        }
    }

    /// Get the error category for logs.
    pub fn category(&self) -> &'static str {
        match self {
            Error::Validation { .. } => "validation",
            Error::UnknownCondition { .. } => "unknown_condition",
            Error::EmptyConditionType => "empty_condition_type",
            Error::NoConditionsRegistered => "no_conditions_registered",
            Error::InvalidSpec { .. } => "invalid_spec",
            Error::KeyNotFound { .. } => "key_not_found",
            Error::TypeMismatch { .. } => "type_mismatch",
            Error::Evaluation { .. } => "evaluation",
            Error::EmptyContext => "empty_context",
            Error::Config { .. } => "config",
            Error::Io(_) => "io",
            Error::Serialization(_) => "serialization",
            Error::Yaml(_) => "yaml",
            Error::Internal { .. } => "internal",
        }
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Error::config(err.to_string())
    }
}

/// Name of a JSON value's type, for diagnostics.
pub(crate) fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "a map",
    }
}

/// Extension trait for adding context to errors.
pub trait ErrorContext<T> {
    /// Attach a document path to validation errors, prefixing any path the
    /// error already carries (`policies[1]` + `conditions[0]`).
    fn with_field(self, field: impl Into<String>) -> Result<T>;
}

impl<T> ErrorContext<T> for Result<T> {
    fn with_field(self, field: impl Into<String>) -> Result<T> {
        self.map_err(|e| match e {
            Error::Validation { message, field: inner } => {
                let outer = field.into();
                let field = match inner {
                    Some(inner) => format!("{}.{}", outer, inner),
                    None => outer,
                };
                Error::Validation {
                    message,
                    field: Some(field),
                }
            }
            other => other,
        })
    }
}
