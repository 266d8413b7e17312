// Validation errors

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Rule name recorded when a field's value cannot be normalized.
pub const MISSING_TAG_NAME: &str = "MISSING_TAG_NAME";

/// Rule name recorded when a record is reached again through itself.
pub const CYCLE_DETECTED: &str = "CYCLE_DETECTED";

/// Rule name recorded when the walk goes deeper than the configured limit.
pub const MAX_DEPTH_EXCEEDED: &str = "MAX_DEPTH_EXCEEDED";

/// Validation error for a single field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    /// Dotted path of the field that failed validation
    pub field: String,

    /// Rule that produced the error
    pub rule: String,

    /// Error message
    pub message: String,
}

impl ValidationError {
    /// Create a new validation error
    pub fn new(
        field: impl Into<String>,
        rule: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            rule: rule.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Ordered collection of the errors found by one validation walk.
///
/// Entries keep discovery order: depth first, fields in declaration order.
/// An empty report means the value passed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    pub errors: Vec<ValidationError>,
}

impl ErrorReport {
    /// Create a new report from existing errors
    pub fn new(errors: Vec<ValidationError>) -> Self {
        Self { errors }
    }

    /// Check if there are any errors
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Get the number of errors
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Add an error
    pub fn add(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Iterate over the errors in discovery order
    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.errors.iter()
    }

    /// Get errors for a specific field path
    pub fn get_field_errors(&self, field: &str) -> Vec<&ValidationError> {
        self.errors.iter().filter(|e| e.field == field).collect()
    }

    /// Get errors produced by a specific rule
    pub fn get_rule_errors(&self, rule: &str) -> Vec<&ValidationError> {
        self.errors.iter().filter(|e| e.rule == rule).collect()
    }

    /// `Ok(())` for an empty report, the report itself otherwise
    pub fn into_result(self) -> Result<(), ErrorReport> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }

    /// Convert to JSON representation
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "errors": self.errors.iter().map(|e| {
                serde_json::json!({
                    "field": e.field,
                    "rule": e.rule,
                    "message": e.message,
                })
            }).collect::<Vec<_>>()
        })
    }
}

impl fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for error in &self.errors {
            writeln!(f, "{}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ErrorReport {}

impl From<Vec<ValidationError>> for ErrorReport {
    fn from(errors: Vec<ValidationError>) -> Self {
        Self::new(errors)
    }
}

impl IntoIterator for ErrorReport {
    type Item = ValidationError;
    type IntoIter = std::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'r> IntoIterator for &'r ErrorReport {
    type Item = &'r ValidationError;
    type IntoIter = std::slice::Iter<'r, ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

/// Malformed rule annotation.
///
/// Every variant carries the annotation and the byte offset of the problem.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unexpected character '{ch}' at position {position} in \"{annotation}\"")]
    UnexpectedChar {
        annotation: String,
        position: usize,
        ch: char,
    },

    #[error("empty rule at position {position} in \"{annotation}\"")]
    EmptyRule { annotation: String, position: usize },

    #[error("empty argument at position {position} in \"{annotation}\"")]
    EmptyArgument { annotation: String, position: usize },

    #[error("argument list opened at position {position} is never closed in \"{annotation}\"")]
    UnclosedArguments { annotation: String, position: usize },

    #[error("unexpected ')' at position {position} in \"{annotation}\"")]
    UnexpectedCloseParen { annotation: String, position: usize },

    #[error("nested '(' at position {position} in \"{annotation}\"")]
    NestedParen { annotation: String, position: usize },

    #[error("missing ',' before position {position} in \"{annotation}\"")]
    MissingDelimiter { annotation: String, position: usize },
}

impl ParseError {
    /// Byte offset of the offending fragment
    pub fn position(&self) -> usize {
        match self {
            Self::UnexpectedChar { position, .. }
            | Self::EmptyRule { position, .. }
            | Self::EmptyArgument { position, .. }
            | Self::UnclosedArguments { position, .. }
            | Self::UnexpectedCloseParen { position, .. }
            | Self::NestedParen { position, .. }
            | Self::MissingDelimiter { position, .. } => *position,
        }
    }

    /// The annotation that failed to parse
    pub fn annotation(&self) -> &str {
        match self {
            Self::UnexpectedChar { annotation, .. }
            | Self::EmptyRule { annotation, .. }
            | Self::EmptyArgument { annotation, .. }
            | Self::UnclosedArguments { annotation, .. }
            | Self::UnexpectedCloseParen { annotation, .. }
            | Self::NestedParen { annotation, .. }
            | Self::MissingDelimiter { annotation, .. } => annotation,
        }
    }
}

/// A field annotation failed to parse while a record type was introspected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid rule annotation on {type_name}.{field}: {source}")]
pub struct AnnotationError {
    pub type_name: &'static str,
    pub field: &'static str,
    #[source]
    pub source: ParseError,
}

/// A value could not be classified.
///
/// Messages keep a `{field}` placeholder for the caller to fill in.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("Value of type '{type_name}' on field '{{field}}' is not supported.")]
    Unsupported { type_name: &'static str },

    #[error("Nested optional value on field '{{field}}' is not supported.")]
    NestedOptional,
}

/// Outcome of a validator that rejected the current value.
///
/// `Message` and `InvalidArguments` may use the `{field}` and `{struct}`
/// placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationFailure {
    #[error("{0}")]
    Message(String),

    #[error("Validator does not support {kind} values.")]
    UnsupportedType { kind: &'static str },

    #[error("{0}")]
    InvalidArguments(String),
}

impl ValidationFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }

    pub fn unsupported(kind: &'static str) -> Self {
        Self::UnsupportedType { kind }
    }

    pub fn invalid_arguments(message: impl Into<String>) -> Self {
        Self::InvalidArguments(message.into())
    }

    /// Final report message for this failure.
    pub fn render(&self, rule: &str, struct_name: &str, field: &str) -> String {
        match self {
            Self::Message(message) | Self::InvalidArguments(message) => message
                .replace("{field}", field)
                .replace("{struct}", struct_name),
            Self::UnsupportedType { kind } => format!(
                "Validator '{}' does not support {} values on struct '{}' and field '{}'.",
                rule, kind, struct_name, field
            ),
        }
    }
}

/// Rule name without a registry entry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Validator '{0}' is not registered.")]
pub struct UnknownRule(pub String);

/// Failure to call a method through the dispatch table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("Method '{method}' does not exist on '{type_name}'.")]
    InvalidMethod {
        type_name: &'static str,
        method: String,
    },

    #[error("Parameters do not match those of method '{method}'.")]
    ParameterMismatch { method: String },

    #[error("Unhandled call of method '{method}'.")]
    UnhandledCall { method: String },
}
