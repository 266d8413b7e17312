// Value model and normalization
//
// Every value the walker touches is converted into `Value`, a closed set of
// cases. Records stay borrowed so validators can reach the enclosing instance.

use crate::{Introspectable, NormalizeError};
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fmt;
use std::hash::BuildHasher;
use std::rc::Rc;
use std::sync::Arc;

/// A value under validation.
#[derive(Clone)]
pub enum Value<'a> {
    /// Absent optional value
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Cow<'a, str>),
    Seq(Vec<Value<'a>>),
    /// Associative map, in traversal order
    Map(Vec<(String, Value<'a>)>),
    Record(&'a dyn Introspectable),
    /// One level of optional indirection, removed by normalization
    Optional(Option<Box<Value<'a>>>),
    /// A value that cannot be represented, carrying its type name
    Unsupported(&'static str),
}

/// Structural classification of a normalized value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Scalar,
    Sequence,
    Map,
    Record,
    Unsupported,
}

impl<'a> Value<'a> {
    /// Structural kind of this value.
    ///
    /// Optional wrappers report `Unsupported`; normalize first.
    pub fn kind(&self) -> Kind {
        match self {
            Value::Null | Value::Bool(_) | Value::Int(_) | Value::Float(_) | Value::Str(_) => {
                Kind::Scalar
            }
            Value::Seq(_) => Kind::Sequence,
            Value::Map(_) => Kind::Map,
            Value::Record(_) => Kind::Record,
            Value::Optional(_) | Value::Unsupported(_) => Kind::Unsupported,
        }
    }

    /// Short human readable name of the value's case, used in messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Seq(_) => "sequence",
            Value::Map(_) => "map",
            Value::Record(_) => "record",
            Value::Optional(_) => "optional",
            Value::Unsupported(name) => *name,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null | Value::Optional(None))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(text) => Some(text.as_ref()),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Numeric view of integers and floats
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Float(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&'a dyn Introspectable> {
        match self {
            Value::Record(record) => Some(*record),
            _ => None,
        }
    }

    /// Character count of strings, element count of sequences and maps
    pub fn len(&self) -> Option<usize> {
        match self {
            Value::Str(text) => Some(text.chars().count()),
            Value::Seq(items) => Some(items.len()),
            Value::Map(entries) => Some(entries.len()),
            _ => None,
        }
    }
}

impl fmt::Debug for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Value::Int(n) => f.debug_tuple("Int").field(n).finish(),
            Value::Float(n) => f.debug_tuple("Float").field(n).finish(),
            Value::Str(text) => f.debug_tuple("Str").field(text).finish(),
            Value::Seq(items) => f.debug_tuple("Seq").field(items).finish(),
            Value::Map(entries) => f.debug_tuple("Map").field(entries).finish(),
            Value::Record(record) => f.debug_tuple("Record").field(&record.type_name()).finish(),
            Value::Optional(inner) => f.debug_tuple("Optional").field(inner).finish(),
            Value::Unsupported(name) => f.debug_tuple("Unsupported").field(name).finish(),
        }
    }
}

impl PartialEq for Value<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Seq(a), Value::Seq(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            // records compare by identity
            (Value::Record(a), Value::Record(b)) => std::ptr::addr_eq(*a, *b),
            (Value::Optional(a), Value::Optional(b)) => a == b,
            (Value::Unsupported(a), Value::Unsupported(b)) => a == b,
            _ => false,
        }
    }
}

impl From<bool> for Value<'_> {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value<'_> {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value<'_> {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl<'a> From<&'a str> for Value<'a> {
    fn from(value: &'a str) -> Self {
        Value::Str(Cow::Borrowed(value))
    }
}

impl From<String> for Value<'_> {
    fn from(value: String) -> Self {
        Value::Str(Cow::Owned(value))
    }
}

impl<'a> From<Vec<Value<'a>>> for Value<'a> {
    fn from(items: Vec<Value<'a>>) -> Self {
        Value::Seq(items)
    }
}

// ============================================================================
// Normalization
// ============================================================================

/// A value with its optional wrapper removed and its kind resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized<'a> {
    value: Value<'a>,
    kind: Kind,
}

impl<'a> Normalized<'a> {
    pub fn value(&self) -> &Value<'a> {
        &self.value
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn into_value(self) -> Value<'a> {
        self.value
    }
}

/// Conversion into a [`Normalized`] value.
///
/// Implemented for raw values and for already normalized ones, which pass
/// through unchanged.
pub trait Normalize<'a> {
    fn normalize(self) -> Result<Normalized<'a>, NormalizeError>;
}

impl<'a> Normalize<'a> for Value<'a> {
    fn normalize(self) -> Result<Normalized<'a>, NormalizeError> {
        let value = match self {
            Value::Optional(None) => Value::Null,
            Value::Optional(Some(inner)) => match *inner {
                Value::Optional(_) => return Err(NormalizeError::NestedOptional),
                inner => inner,
            },
            value => value,
        };

        if let Value::Unsupported(type_name) = value {
            return Err(NormalizeError::Unsupported { type_name });
        }

        let kind = value.kind();
        Ok(Normalized { value, kind })
    }
}

impl<'a> Normalize<'a> for Normalized<'a> {
    fn normalize(self) -> Result<Normalized<'a>, NormalizeError> {
        Ok(self)
    }
}

/// Normalize a raw or already normalized value.
pub fn normalize<'a>(value: impl Normalize<'a>) -> Result<Normalized<'a>, NormalizeError> {
    value.normalize()
}

// ============================================================================
// Conversion from Rust values
// ============================================================================

/// Conversion of a Rust value into a [`Value`] the walker can traverse.
///
/// Record types get this from `#[derive(Introspectable)]`.
pub trait ToValue {
    fn to_value(&self) -> Value<'_>;
}

macro_rules! int_to_value {
    ($($ty:ty),*) => {
        $(
            impl ToValue for $ty {
                fn to_value(&self) -> Value<'_> {
                    Value::Int(i64::from(*self))
                }
            }
        )*
    };
}

int_to_value!(i8, i16, i32, i64, u8, u16, u32);

// Wide integers fall back to a float when they leave the i64 range.
macro_rules! wide_int_to_value {
    ($($ty:ty),*) => {
        $(
            impl ToValue for $ty {
                fn to_value(&self) -> Value<'_> {
                    match i64::try_from(*self) {
                        Ok(n) => Value::Int(n),
                        Err(_) => Value::Float(*self as f64),
                    }
                }
            }
        )*
    };
}

wide_int_to_value!(isize, usize, u64, i128, u128);

impl ToValue for f32 {
    fn to_value(&self) -> Value<'_> {
        Value::Float(f64::from(*self))
    }
}

impl ToValue for f64 {
    fn to_value(&self) -> Value<'_> {
        Value::Float(*self)
    }
}

impl ToValue for bool {
    fn to_value(&self) -> Value<'_> {
        Value::Bool(*self)
    }
}

impl ToValue for char {
    fn to_value(&self) -> Value<'_> {
        Value::Str(Cow::Owned(self.to_string()))
    }
}

impl ToValue for str {
    fn to_value(&self) -> Value<'_> {
        Value::Str(Cow::Borrowed(self))
    }
}

impl ToValue for String {
    fn to_value(&self) -> Value<'_> {
        Value::Str(Cow::Borrowed(self.as_str()))
    }
}

impl ToValue for Cow<'_, str> {
    fn to_value(&self) -> Value<'_> {
        Value::Str(Cow::Borrowed(self.as_ref()))
    }
}

impl ToValue for Value<'_> {
    fn to_value(&self) -> Value<'_> {
        self.clone()
    }
}

impl<T: ToValue> ToValue for Option<T> {
    fn to_value(&self) -> Value<'_> {
        Value::Optional(self.as_ref().map(|inner| Box::new(inner.to_value())))
    }
}

impl<T: ToValue + ?Sized> ToValue for &T {
    fn to_value(&self) -> Value<'_> {
        (**self).to_value()
    }
}

impl<T: ToValue + ?Sized> ToValue for Box<T> {
    fn to_value(&self) -> Value<'_> {
        (**self).to_value()
    }
}

impl<T: ToValue + ?Sized> ToValue for Rc<T> {
    fn to_value(&self) -> Value<'_> {
        (**self).to_value()
    }
}

impl<T: ToValue + ?Sized> ToValue for Arc<T> {
    fn to_value(&self) -> Value<'_> {
        (**self).to_value()
    }
}

impl<T: ToValue> ToValue for [T] {
    fn to_value(&self) -> Value<'_> {
        Value::Seq(self.iter().map(ToValue::to_value).collect())
    }
}

impl<T: ToValue, const N: usize> ToValue for [T; N] {
    fn to_value(&self) -> Value<'_> {
        self.as_slice().to_value()
    }
}

impl<T: ToValue> ToValue for Vec<T> {
    fn to_value(&self) -> Value<'_> {
        self.as_slice().to_value()
    }
}

impl<T: ToValue> ToValue for VecDeque<T> {
    fn to_value(&self) -> Value<'_> {
        Value::Seq(self.iter().map(ToValue::to_value).collect())
    }
}

// Hash maps have no stable order; entries are sorted by key so reports are
// reproducible.
impl<K: fmt::Display, V: ToValue, S: BuildHasher> ToValue for HashMap<K, V, S> {
    fn to_value(&self) -> Value<'_> {
        let mut entries: Vec<(String, Value<'_>)> = self
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_value()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Value::Map(entries)
    }
}

impl<K: fmt::Display, V: ToValue> ToValue for BTreeMap<K, V> {
    fn to_value(&self) -> Value<'_> {
        Value::Map(
            self.iter()
                .map(|(key, value)| (key.to_string(), value.to_value()))
                .collect(),
        )
    }
}
