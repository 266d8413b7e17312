// Recursive validation walk
//
// Records are walked field by field in declaration order, sequences by index
// and maps in their stored order. Every field runs its rule chain before the
// walk descends into its (possibly coerced) value.

use crate::{
    AnnotationError, CYCLE_DETECTED, EngineConfig, ErrorReport, Field, FieldDescriptor,
    Introspectable, MAX_DEPTH_EXCEEDED, MISSING_TAG_NAME, Registry, ToValue, ValidationContext,
    ValidationError, ValidationFailure, Value, fields, normalize, registry_snapshot,
};
use std::any::TypeId;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Validates values against the rules attached to their record fields.
///
/// ```
/// use ruleval_core::{ValidationEngine, ValidationFailure};
///
/// let mut engine = ValidationEngine::new();
/// engine.register("even", |context, _options| match context.value().as_int() {
///     Some(n) if n % 2 != 0 => Err(ValidationFailure::new("{field} must be even.")),
///     _ => Ok(()),
/// });
///
/// // bare values carry no rules
/// assert!(engine.validate(&vec![1, 2, 3]).unwrap().is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct ValidationEngine {
    registry: Registry,
    config: EngineConfig,
}

impl ValidationEngine {
    /// Engine with the built-in validators and the process-wide configuration
    pub fn new() -> Self {
        Self::with_registry(Registry::with_builtins())
    }

    pub fn with_registry(registry: Registry) -> Self {
        Self {
            registry,
            config: EngineConfig::global().clone(),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Register a validator on this engine only
    pub fn register<F>(&mut self, name: impl Into<String>, filter: F)
    where
        F: Fn(&mut ValidationContext<'_>, &[String]) -> Result<(), ValidationFailure>
            + Send
            + Sync
            + 'static,
    {
        self.registry.register(name, filter);
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Walk `value` and collect every rule failure.
    ///
    /// Rule failures end up in the report; only a malformed annotation on a
    /// record type fails the call.
    pub fn validate<T: ToValue + ?Sized>(&self, value: &T) -> Result<ErrorReport, AnnotationError> {
        let mut walk = Walk {
            engine: self,
            context: ValidationContext::new(),
            report: ErrorReport::default(),
            active: Vec::new(),
        };

        match normalize(value.to_value()) {
            Ok(root) => walk.value(root.into_value(), None, 0)?,
            Err(err) => debug!(error = %err, "Root value cannot be walked"),
        }

        Ok(walk.report)
    }
}

impl Default for ValidationEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate `value` with the process-wide registry and configuration.
pub fn validate<T: ToValue + ?Sized>(value: &T) -> Result<ErrorReport, AnnotationError> {
    ValidationEngine::with_registry(registry_snapshot()).validate(value)
}

/// Record identity on the active path: address plus type, since a record and
/// its first field may share an address.
type RecordKey = (usize, TypeId);

struct Walk<'e, 'a> {
    engine: &'e ValidationEngine,
    context: ValidationContext<'a>,
    report: ErrorReport,
    active: Vec<RecordKey>,
}

impl<'a> Walk<'_, 'a> {
    /// Descend into a normalized value. `depth` counts the records enclosing it.
    fn value(
        &mut self,
        value: Value<'a>,
        field: Option<Arc<Field>>,
        depth: usize,
    ) -> Result<(), AnnotationError> {
        match value {
            Value::Record(record) => self.record(record, field, depth),
            Value::Seq(items) => {
                for (index, item) in items.into_iter().enumerate() {
                    let node = Arc::new(Field::new(index.to_string(), None, field.clone()));
                    self.element(item, node, depth)?;
                }
                Ok(())
            }
            Value::Map(entries) => {
                for (key, item) in entries {
                    let node = Arc::new(Field::new(key, None, field.clone()));
                    self.element(item, node, depth)?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn element(
        &mut self,
        item: Value<'a>,
        node: Arc<Field>,
        depth: usize,
    ) -> Result<(), AnnotationError> {
        match normalize(item) {
            Ok(item) => self.value(item.into_value(), Some(node), depth),
            Err(err) => {
                self.missing(&node, &err.to_string());
                Ok(())
            }
        }
    }

    fn record(
        &mut self,
        record: &'a dyn Introspectable,
        field: Option<Arc<Field>>,
        depth: usize,
    ) -> Result<(), AnnotationError> {
        let config = &self.engine.config;
        let path = field.as_ref().map(|f| f.full_name(&[])).unwrap_or_default();

        if depth >= config.max_depth {
            warn!(record = record.type_name(), field = %path, depth, "Maximum validation depth exceeded");
            self.report.add(ValidationError::new(
                path.clone(),
                MAX_DEPTH_EXCEEDED,
                format!(
                    "Record '{}' on field '{}' is nested deeper than {} records.",
                    record.type_name(),
                    path,
                    config.max_depth
                ),
            ));
            return Ok(());
        }

        let key: RecordKey = (
            record as *const dyn Introspectable as *const () as usize,
            record.as_any().type_id(),
        );

        if config.detect_cycles && self.active.contains(&key) {
            warn!(record = record.type_name(), field = %path, "Cycle detected");
            self.report.add(ValidationError::new(
                path.clone(),
                CYCLE_DETECTED,
                format!(
                    "Record '{}' on field '{}' is already being validated.",
                    record.type_name(),
                    path
                ),
            ));
            return Ok(());
        }

        let descriptors = fields(record, &config.rule_tag, config.display_tag.as_deref())?;

        let previous = self.context.parent();
        self.context.set_parent(record);
        self.active.push(key);

        let result = self.record_fields(record, &descriptors, &field, depth);

        self.active.pop();
        self.context.restore_parent(previous);
        result
    }

    fn record_fields(
        &mut self,
        record: &'a dyn Introspectable,
        descriptors: &[FieldDescriptor],
        field: &Option<Arc<Field>>,
        depth: usize,
    ) -> Result<(), AnnotationError> {
        for descriptor in descriptors {
            let node = Arc::new(Field::from_descriptor(descriptor, field.clone()));

            let value = match normalize(record.field_value(descriptor.index)) {
                Ok(value) => value.into_value(),
                Err(err) => {
                    self.missing(&node, &err.to_string());
                    continue;
                }
            };

            self.context.set_field(Arc::clone(&node));
            self.context.set_value(value);
            self.context.resume();

            self.rules(record, descriptor, &node);

            let value = self.context.take_value();
            self.value(value, Some(node), depth + 1)?;
        }

        Ok(())
    }

    fn rules(&mut self, record: &'a dyn Introspectable, descriptor: &FieldDescriptor, node: &Field) {
        let path = node.full_name(&[]);

        for rule in &descriptor.rules {
            let filter = match self.engine.registry.lookup(&rule.name) {
                Ok(filter) => filter,
                Err(_) => {
                    self.report.add(ValidationError::new(
                        path.clone(),
                        rule.name.clone(),
                        format!(
                            "Validator '{}' used on field '{}' does not exist.",
                            rule.name, path
                        ),
                    ));
                    break;
                }
            };

            trace!(rule = %rule, field = %path, "Running validator");

            if let Err(failure) = filter(&mut self.context, &rule.arguments) {
                let message = failure.render(
                    &rule.name,
                    record.type_name(),
                    &node.full_display_name(&[]),
                );
                self.report
                    .add(ValidationError::new(path.clone(), rule.name.clone(), message));
            }

            if self.context.is_stopped() {
                break;
            }
        }
    }

    fn missing(&mut self, node: &Field, message: &str) {
        self.report.add(ValidationError::new(
            node.full_name(&[]),
            MISSING_TAG_NAME,
            message.replace("{field}", &node.full_display_name(&[])),
        ));
    }
}
