// Validation context

use crate::{Field, Introspectable, Value};
use std::fmt;
use std::sync::Arc;

/// Mutable state of one validation walk, handed to every validator.
///
/// The walker moves it from field to field. Validators read the current value
/// and may replace it (type coercion) or stop the remaining rules of the
/// current field.
pub struct ValidationContext<'a> {
    value: Value<'a>,
    field: Option<Arc<Field>>,
    parent: Option<&'a dyn Introspectable>,
    stopped: bool,
}

impl<'a> ValidationContext<'a> {
    /// Create an empty context
    pub fn new() -> Self {
        Self {
            value: Value::Null,
            field: None,
            parent: None,
            stopped: false,
        }
    }

    /// Create a context positioned on a bare value, for calling validators
    /// directly
    pub fn for_value(value: impl Into<Value<'a>>) -> Self {
        let mut context = Self::new();
        context.value = value.into();
        context
    }

    /// Value currently being validated
    pub fn value(&self) -> &Value<'a> {
        &self.value
    }

    /// Replace the current value; later rules and the walk see the new one
    pub fn set_value(&mut self, value: Value<'a>) {
        self.value = value;
    }

    pub(crate) fn take_value(&mut self) -> Value<'a> {
        std::mem::replace(&mut self.value, Value::Null)
    }

    /// Field currently being validated
    pub fn field(&self) -> Option<&Arc<Field>> {
        self.field.as_ref()
    }

    pub fn set_field(&mut self, field: Arc<Field>) {
        self.field = Some(field);
    }

    /// Record that declares the current field
    pub fn parent(&self) -> Option<&'a dyn Introspectable> {
        self.parent
    }

    pub fn set_parent(&mut self, parent: &'a dyn Introspectable) {
        self.parent = Some(parent);
    }

    pub(crate) fn restore_parent(&mut self, parent: Option<&'a dyn Introspectable>) {
        self.parent = parent;
    }

    /// Skip the remaining rules of the current field
    pub fn stop(&mut self) {
        self.stopped = true;
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub(crate) fn resume(&mut self) {
        self.stopped = false;
    }
}

impl Default for ValidationContext<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ValidationContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationContext")
            .field("value", &self.value)
            .field("field", &self.field.as_ref().map(|field| field.full_name(&[])))
            .field("parent", &self.parent.map(|parent| parent.type_name()))
            .field("stopped", &self.stopped)
            .finish()
    }
}
