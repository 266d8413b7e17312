// Field introspection
//
// Record types describe themselves through `Introspectable` (usually derived).
// Descriptors are parsed once per concrete type and cached for the lifetime of
// the process.

use crate::{AnnotationError, RuleInvocation, Value, parse};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Static metadata of one declared field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Declared field name
    pub name: &'static str,

    /// Whether the field is visible outside its type (`pub`)
    pub public: bool,

    /// `key = "value"` metadata attached to the field
    pub tags: &'static [(&'static str, &'static str)],
}

impl FieldSpec {
    pub const fn new(
        name: &'static str,
        public: bool,
        tags: &'static [(&'static str, &'static str)],
    ) -> Self {
        Self { name, public, tags }
    }

    /// Look up a tag value by key
    pub fn tag(&self, key: &str) -> Option<&'static str> {
        self.tags
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, value)| *value)
    }
}

/// A record type whose fields can be enumerated and read.
///
/// Use `#[derive(Introspectable)]` rather than implementing this by hand.
pub trait Introspectable: Any {
    /// Name used in messages
    fn type_name(&self) -> &'static str;

    /// Every declared field, in declaration order
    fn field_specs(&self) -> &'static [FieldSpec];

    /// Value of the field at `index` in [`field_specs`](Self::field_specs)
    fn field_value(&self, index: usize) -> Value<'_>;

    fn as_any(&self) -> &dyn Any;
}

/// Parsed description of a validatable field, shared by every instance of a
/// record type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Position in the record's declared fields
    pub index: usize,
    pub name: String,
    pub display_name: Option<String>,
    pub rules: Vec<RuleInvocation>,
}

/// A field at a concrete position in the walked value graph.
///
/// The parent link points towards the root, so chains are finite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    name: String,
    display_name: Option<String>,
    parent: Option<Arc<Field>>,
}

impl Field {
    pub fn new(
        name: impl Into<String>,
        display_name: Option<String>,
        parent: Option<Arc<Field>>,
    ) -> Self {
        Self {
            name: name.into(),
            display_name,
            parent,
        }
    }

    /// Node for a record field reached below `parent`
    pub fn from_descriptor(descriptor: &FieldDescriptor, parent: Option<Arc<Field>>) -> Self {
        Self::new(
            descriptor.name.clone(),
            descriptor.display_name.clone(),
            parent,
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Display name, falling back to the declared name
    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }

    pub fn parent(&self) -> Option<&Field> {
        self.parent.as_deref()
    }

    /// Dotted path from the root to this field, plus `postfix` segments.
    pub fn full_name(&self, postfix: &[&str]) -> String {
        join_path(self, Field::name, postfix)
    }

    /// Like [`full_name`](Self::full_name) but using display names.
    pub fn full_display_name(&self, postfix: &[&str]) -> String {
        join_path(self, Field::display_name, postfix)
    }
}

fn join_path<'f>(field: &'f Field, segment: fn(&'f Field) -> &'f str, postfix: &[&'f str]) -> String {
    let mut segments = Vec::new();
    let mut current = Some(field);

    while let Some(node) = current {
        let name = segment(node);
        if !name.is_empty() {
            segments.push(name);
        }
        current = node.parent();
    }

    segments.reverse();
    segments.extend(postfix.iter().copied().filter(|s| !s.is_empty()));
    segments.join(".")
}

/// Descriptor cache keyed by concrete type. Entries are never evicted.
static FIELD_CACHE: Lazy<RwLock<HashMap<TypeId, Arc<[FieldDescriptor]>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Validatable fields of a record's type, parsed on first use and cached.
///
/// Only `pub` fields are returned. A malformed annotation fails the whole type
/// and nothing is cached for it.
///
/// The cache is keyed by type alone: use the same tag names for the lifetime
/// of the process.
pub fn fields(
    record: &dyn Introspectable,
    rule_tag: &str,
    display_tag: Option<&str>,
) -> Result<Arc<[FieldDescriptor]>, AnnotationError> {
    let type_id = record.as_any().type_id();

    let cached = FIELD_CACHE.read().get(&type_id).cloned();
    if let Some(cached) = cached {
        return Ok(cached);
    }

    let descriptors: Arc<[FieldDescriptor]> = describe(record, rule_tag, display_tag)?.into();

    let mut cache = FIELD_CACHE.write();
    let entry = cache.entry(type_id).or_insert_with(|| {
        debug!(
            record = record.type_name(),
            fields = descriptors.len(),
            "Cached record fields"
        );
        descriptors
    });

    Ok(Arc::clone(entry))
}

/// Number of record types currently cached.
pub fn cached_types() -> usize {
    FIELD_CACHE.read().len()
}

fn describe(
    record: &dyn Introspectable,
    rule_tag: &str,
    display_tag: Option<&str>,
) -> Result<Vec<FieldDescriptor>, AnnotationError> {
    record
        .field_specs()
        .iter()
        .enumerate()
        .filter(|(_, spec)| spec.public)
        .map(|(index, spec)| {
            let rules = parse(spec.tag(rule_tag).unwrap_or("")).map_err(|source| {
                AnnotationError {
                    type_name: record.type_name(),
                    field: spec.name,
                    source,
                }
            })?;

            let display_name = display_tag
                .and_then(|tag| spec.tag(tag))
                .filter(|name| !name.is_empty())
                .map(str::to_string);

            Ok(FieldDescriptor {
                index,
                name: spec.name.to_string(),
                display_name,
                rules,
            })
        })
        .collect()
}
