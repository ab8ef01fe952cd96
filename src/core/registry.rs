//! Condition type registry.
//!
//! A [`ConditionRegistry`] maps discriminator strings to factories producing
//! fresh, empty [`ConditionSpec`] instances. Documents are decoded against an
//! explicit registry; the process-wide registry behind
//! [`register_condition`] and [`global_registry`] exists for applications
//! that prefer to register once at startup.

use super::spec::{ConditionSpec, Semantics};

use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};
use tracing::warn;

/// Factory producing an empty spec for one condition type.
pub type SpecFactory = Arc<dyn Fn() -> Box<dyn ConditionSpec> + Send + Sync>;

/// Build a [`SpecFactory`] for a spec type with a `Default` empty state.
pub fn factory_of<S>() -> SpecFactory
where
    S: ConditionSpec + Default + 'static,
{
    Arc::new(|| Box::new(S::default()) as Box<dyn ConditionSpec>)
}

/// Mapping from condition discriminator to spec factory.
#[derive(Clone, Default)]
pub struct ConditionRegistry {
    factories: HashMap<String, SpecFactory>,
    semantics: Semantics,
}

impl ConditionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding every built-in condition type.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register_all(crate::conditions::builtin_conditions());
        registry
    }

    /// Set the semantics adopted by combinators decoded through this registry.
    pub fn with_semantics(mut self, semantics: Semantics) -> Self {
        self.semantics = semantics;
        self
    }

    /// Semantics adopted by combinators decoded through this registry.
    pub fn semantics(&self) -> Semantics {
        self.semantics
    }

    /// Register a factory under `name`, replacing any previous entry.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn ConditionSpec> + Send + Sync + 'static,
    {
        self.insert(name.into(), Arc::new(factory));
    }

    /// Register several factories at once.
    pub fn register_all<K>(&mut self, factories: impl IntoIterator<Item = (K, SpecFactory)>)
    where
        K: Into<String>,
    {
        for (name, factory) in factories {
            self.insert(name.into(), factory);
        }
    }

    fn insert(&mut self, name: String, factory: SpecFactory) {
        if self.factories.insert(name.clone(), factory).is_some() {
            warn!(condition = %name, "replacing registered condition type");
        }
    }

    /// Look up the factory for `name`.
    pub fn lookup(&self, name: &str) -> Option<&SpecFactory> {
        self.factories.get(name)
    }

    /// Whether `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Whether no condition type is registered.
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Number of registered condition types.
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Registered discriminators, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for ConditionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConditionRegistry")
            .field("conditions", &self.names())
            .field("semantics", &self.semantics)
            .finish()
    }
}

fn global() -> &'static RwLock<ConditionRegistry> {
    static GLOBAL: OnceLock<RwLock<ConditionRegistry>> = OnceLock::new();
    GLOBAL.get_or_init(|| RwLock::new(ConditionRegistry::new()))
}

/// Register a condition type in the process-wide registry.
///
/// Registration must happen before documents are decoded against
/// [`global_registry`]; it is not meant to race with decoding.
pub fn register_condition<F>(name: impl Into<String>, factory: F)
where
    F: Fn() -> Box<dyn ConditionSpec> + Send + Sync + 'static,
{
    global().write().register(name, factory);
}

/// Register several condition types in the process-wide registry.
pub fn register_conditions<K>(factories: impl IntoIterator<Item = (K, SpecFactory)>)
where
    K: Into<String>,
{
    global().write().register_all(factories);
}

/// Snapshot of the process-wide registry.
pub fn global_registry() -> ConditionRegistry {
    global().read().clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conditions::{EqualSpec, NotSpec};

    #[test]
    fn test_empty_registry() {
        let registry = ConditionRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.lookup("equal").is_none());
    }

    #[test]
    fn test_builtins() {
        let registry = ConditionRegistry::with_builtins();
        for name in [
            "and", "or", "not", "equal", "contains", "substring", "cidr", "regex", "time",
            "range", "exists",
        ] {
            assert!(registry.contains(name), "missing builtin {}", name);
        }
        assert_eq!(registry.len(), 11);
        assert_eq!(registry.semantics(), Semantics::Strict);
    }

    #[test]
    fn test_last_writer_wins() {
        let mut registry = ConditionRegistry::new();
        registry.register("same", || Box::new(EqualSpec::default()));
        registry.register_all([("same", factory_of::<NotSpec>())]);
        assert_eq!(registry.len(), 1);
        let spec = (registry.lookup("same").unwrap())();
        assert!(format!("{:?}", spec).contains("NotSpec"));
    }

    #[test]
    fn test_factories_produce_fresh_instances() {
        let registry = ConditionRegistry::with_builtins();
        let factory = registry.lookup("equal").unwrap();
        let a = factory();
        let b = factory();
        assert_eq!(a.to_string(), b.to_string());
    }

    #[test]
    fn test_global_registry() {
        register_condition("global-equal", || Box::new(EqualSpec::default()));
        register_conditions([("global-equal-2", factory_of::<EqualSpec>())]);
        crate::conditions::register_builtin_conditions();
        let snapshot = global_registry();
        assert!(snapshot.contains("regex"));
        assert!(snapshot.contains("global-equal"));
        assert!(snapshot.contains("global-equal-2"));
    }
}
