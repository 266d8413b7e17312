// Validator registry

use crate::{UnknownRule, ValidationContext, ValidationFailure, validators};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// A named validator: inspects the context, may coerce its value or stop the
/// field's remaining rules, and rejects the value with a failure.
pub type ValidatorFilter =
    Arc<dyn Fn(&mut ValidationContext<'_>, &[String]) -> Result<(), ValidationFailure> + Send + Sync>;

/// Mapping from rule name to validator.
#[derive(Clone, Default)]
pub struct Registry {
    validators: HashMap<String, ValidatorFilter>,
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in validators
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        validators::register_builtins(&mut registry);
        registry
    }

    /// Register a validator. A previous registration under the same name is
    /// replaced.
    pub fn register<F>(&mut self, name: impl Into<String>, filter: F)
    where
        F: Fn(&mut ValidationContext<'_>, &[String]) -> Result<(), ValidationFailure>
            + Send
            + Sync
            + 'static,
    {
        let name = name.into();
        if self.validators.insert(name.clone(), Arc::new(filter)).is_some() {
            debug!(rule = %name, "Replaced validator registration");
        }
    }

    /// Look up a validator by rule name
    pub fn lookup(&self, name: &str) -> Result<ValidatorFilter, UnknownRule> {
        self.validators
            .get(name)
            .cloned()
            .ok_or_else(|| UnknownRule(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.validators.contains_key(name)
    }

    /// Registered rule names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.validators.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("validators", &self.names())
            .finish()
    }
}

/// Process-wide registry used by [`register`] and [`crate::validate`].
static GLOBAL_REGISTRY: Lazy<RwLock<Registry>> =
    Lazy::new(|| RwLock::new(Registry::with_builtins()));

/// Register a validator in the process-wide registry.
///
/// ```
/// use ruleval_core::{ValidationFailure, register, registry_snapshot};
///
/// register("even", |context, _options| match context.value().as_int() {
///     Some(n) if n % 2 != 0 => Err(ValidationFailure::new("{field} must be even.")),
///     _ => Ok(()),
/// });
///
/// assert!(registry_snapshot().contains("even"));
/// ```
pub fn register<F>(name: impl Into<String>, filter: F)
where
    F: Fn(&mut ValidationContext<'_>, &[String]) -> Result<(), ValidationFailure>
        + Send
        + Sync
        + 'static,
{
    GLOBAL_REGISTRY.write().register(name, filter);
}

/// Look up a validator in the process-wide registry.
pub fn lookup(name: &str) -> Result<ValidatorFilter, UnknownRule> {
    GLOBAL_REGISTRY.read().lookup(name)
}

/// Copy of the process-wide registry.
///
/// Walks run against a copy so validators may register or validate
/// themselves without holding the lock.
pub fn registry_snapshot() -> Registry {
    GLOBAL_REGISTRY.read().clone()
}
