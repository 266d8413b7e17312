// Built-in validators

use crate::{
    Arg, DispatchError, Registry, Returned, ValidationContext, ValidationFailure, Value, invoke,
};
use once_cell::sync::Lazy;
use regex::Regex;
use std::cmp::Ordering;
use std::fmt;

// Common regex patterns
static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$").unwrap()
});

static URL_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^https?://[^\s/$.?#].[^\s]*$").unwrap());

static UUID_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$").unwrap()
});

static ALPHA_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z]+$").unwrap());

static ALPHANUMERIC_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z0-9]+$").unwrap());

/// Register every built-in validator under its rule name.
pub fn register_builtins(registry: &mut Registry) {
    registry.register("empty", empty);
    registry.register("not_empty", not_empty);
    registry.register("min", min);
    registry.register("max", max);
    registry.register("lowercase", lowercase);
    registry.register("uppercase", uppercase);
    registry.register("numeric", numeric);
    registry.register("func", func);
    registry.register("email", email);
    registry.register("url", url);
    registry.register("uuid", uuid);
    registry.register("alpha", alpha);
    registry.register("alphanumeric", alphanumeric);
}

fn failure(message: String) -> ValidationFailure {
    ValidationFailure::Message(message)
}

/// Bound of a `min` / `max` rule. Integer options stay integers so large
/// `i64` values compare exactly.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Limit {
    Int(i64),
    Float(f64),
}

impl Limit {
    fn parse(rule: &str, option: &str) -> Result<Self, ValidationFailure> {
        let trimmed = option.trim();
        if let Ok(n) = trimmed.parse::<i64>() {
            return Ok(Limit::Int(n));
        }
        match trimmed.parse::<f64>() {
            Ok(n) if n.is_finite() => Ok(Limit::Float(n)),
            _ => Err(ValidationFailure::invalid_arguments(format!(
                "Unable to parse '{}' validator value '{}'.",
                rule, option
            ))),
        }
    }

    fn cmp_int(self, n: i64) -> Option<Ordering> {
        match self {
            Limit::Int(limit) => Some(n.cmp(&limit)),
            Limit::Float(limit) => (n as f64).partial_cmp(&limit),
        }
    }

    fn cmp_float(self, n: f64) -> Option<Ordering> {
        match self {
            Limit::Int(limit) => n.partial_cmp(&(limit as f64)),
            Limit::Float(limit) => n.partial_cmp(&limit),
        }
    }

    fn cmp_count(self, count: usize) -> Option<Ordering> {
        self.cmp_int(i64::try_from(count).unwrap_or(i64::MAX))
    }
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Limit::Int(n) => write!(f, "{}", n),
            Limit::Float(n) => write!(f, "{}", n),
        }
    }
}

// Unordered comparisons (NaN) fail both bounds.
fn below(ordering: Option<Ordering>) -> bool {
    !matches!(ordering, Some(Ordering::Equal | Ordering::Greater))
}

fn above(ordering: Option<Ordering>) -> bool {
    !matches!(ordering, Some(Ordering::Equal | Ordering::Less))
}

/// The single numeric option of a limit rule
fn single_limit(rule: &str, options: &[String]) -> Result<Limit, ValidationFailure> {
    match options {
        [option] => Limit::parse(rule, option),
        _ => Err(ValidationFailure::invalid_arguments(format!(
            "Validator '{}' requires exactly one argument.",
            rule
        ))),
    }
}

/// Whether a value counts as empty, `None` when emptiness is undefined for it
fn is_empty_value(value: &Value<'_>) -> Option<bool> {
    match value {
        Value::Null => Some(true),
        Value::Str(text) => Some(text.is_empty()),
        Value::Int(n) => Some(*n == 0),
        Value::Float(n) => Some(*n == 0.0),
        Value::Seq(items) => Some(items.is_empty()),
        Value::Map(entries) => Some(entries.is_empty()),
        _ => None,
    }
}

// Presence validators

/// `empty`: an empty value skips the field's remaining rules
pub fn empty(context: &mut ValidationContext<'_>, _options: &[String]) -> Result<(), ValidationFailure> {
    match is_empty_value(context.value()) {
        Some(true) => {
            context.stop();
            Ok(())
        }
        Some(false) => Ok(()),
        None => Err(ValidationFailure::unsupported(context.value().kind_name())),
    }
}

/// `not_empty`: rejects empty strings, zero numbers, empty collections and
/// absent values
pub fn not_empty(
    context: &mut ValidationContext<'_>,
    _options: &[String],
) -> Result<(), ValidationFailure> {
    match is_empty_value(context.value()) {
        Some(true) => Err(failure("{field} cannot be empty.".to_string())),
        Some(false) => Ok(()),
        None => Err(ValidationFailure::unsupported(context.value().kind_name())),
    }
}

// Limit validators
//
// Strings are measured in characters, sequences and maps in entries, numbers
// by magnitude. Both bounds are inclusive; a NaN value fails either bound.

/// `min(n)`
pub fn min(context: &mut ValidationContext<'_>, options: &[String]) -> Result<(), ValidationFailure> {
    let limit = single_limit("min", options)?;

    match context.value() {
        Value::Null => Err(failure(format!("{{field}} must be at least {}.", limit))),
        Value::Str(text) if below(limit.cmp_count(text.chars().count())) => Err(failure(format!(
            "{{field}} cannot be shorter than {} characters.",
            limit
        ))),
        Value::Int(n) if below(limit.cmp_int(*n)) => {
            Err(failure(format!("{{field}} cannot be less than {}.", limit)))
        }
        Value::Float(n) if below(limit.cmp_float(*n)) => {
            Err(failure(format!("{{field}} cannot be less than {}.", limit)))
        }
        Value::Seq(items) if below(limit.cmp_count(items.len())) => Err(failure(format!(
            "{{field}} cannot contain fewer items than {}.",
            limit
        ))),
        Value::Map(entries) if below(limit.cmp_count(entries.len())) => Err(failure(format!(
            "{{field}} cannot contain fewer keys than {}.",
            limit
        ))),
        Value::Str(_) | Value::Int(_) | Value::Float(_) | Value::Seq(_) | Value::Map(_) => Ok(()),
        other => Err(ValidationFailure::unsupported(other.kind_name())),
    }
}

/// `max(n)`; absent values pass
pub fn max(context: &mut ValidationContext<'_>, options: &[String]) -> Result<(), ValidationFailure> {
    let limit = single_limit("max", options)?;

    match context.value() {
        Value::Str(text) if above(limit.cmp_count(text.chars().count())) => Err(failure(format!(
            "{{field}} is longer than {} characters.",
            limit
        ))),
        Value::Int(n) if above(limit.cmp_int(*n)) => {
            Err(failure(format!("{{field}} cannot be greater than {}.", limit)))
        }
        Value::Float(n) if above(limit.cmp_float(*n)) => {
            Err(failure(format!("{{field}} cannot be greater than {}.", limit)))
        }
        Value::Seq(items) if above(limit.cmp_count(items.len())) => Err(failure(format!(
            "{{field}} cannot contain more items than {}.",
            limit
        ))),
        Value::Map(entries) if above(limit.cmp_count(entries.len())) => Err(failure(format!(
            "{{field}} cannot contain more keys than {}.",
            limit
        ))),
        Value::Null
        | Value::Str(_)
        | Value::Int(_)
        | Value::Float(_)
        | Value::Seq(_)
        | Value::Map(_) => Ok(()),
        other => Err(ValidationFailure::unsupported(other.kind_name())),
    }
}

// Text validators

fn check_case(
    context: &ValidationContext<'_>,
    accepts: fn(char) -> bool,
    message: &str,
) -> Result<(), ValidationFailure> {
    match context.value() {
        Value::Null => Ok(()),
        Value::Str(text) => {
            if text.chars().all(|c| !c.is_alphabetic() || accepts(c)) {
                Ok(())
            } else {
                Err(failure(message.to_string()))
            }
        }
        other => Err(ValidationFailure::unsupported(other.kind_name())),
    }
}

/// `lowercase`: every letter must be lower case
pub fn lowercase(
    context: &mut ValidationContext<'_>,
    _options: &[String],
) -> Result<(), ValidationFailure> {
    check_case(context, char::is_lowercase, "{field} must be in lower case.")
}

/// `uppercase`: every letter must be upper case
pub fn uppercase(
    context: &mut ValidationContext<'_>,
    _options: &[String],
) -> Result<(), ValidationFailure> {
    check_case(context, char::is_uppercase, "{field} must be in upper case.")
}

/// `numeric`: the text must be an integer; the field's value becomes that
/// integer for the following rules
pub fn numeric(
    context: &mut ValidationContext<'_>,
    _options: &[String],
) -> Result<(), ValidationFailure> {
    let parsed = match context.value() {
        Value::Null => return Err(failure("{field} must be numeric.".to_string())),
        Value::Int(_) => return Ok(()),
        Value::Str(text) if text.is_empty() => {
            return Err(failure("{field} must be numeric.".to_string()));
        }
        Value::Str(text) => text
            .parse::<i64>()
            .map_err(|_| failure("{field} must contain numbers only.".to_string()))?,
        other => return Err(ValidationFailure::unsupported(other.kind_name())),
    };

    context.set_value(Value::Int(parsed));
    Ok(())
}

fn check_pattern(
    context: &ValidationContext<'_>,
    pattern: &Regex,
    message: &str,
) -> Result<(), ValidationFailure> {
    match context.value() {
        Value::Null => Ok(()),
        Value::Str(text) if pattern.is_match(text) => Ok(()),
        Value::Str(_) => Err(failure(message.to_string())),
        other => Err(ValidationFailure::unsupported(other.kind_name())),
    }
}

/// `email`
pub fn email(context: &mut ValidationContext<'_>, _options: &[String]) -> Result<(), ValidationFailure> {
    check_pattern(context, &EMAIL_REGEX, "{field} must be a valid email.")
}

/// `url`
pub fn url(context: &mut ValidationContext<'_>, _options: &[String]) -> Result<(), ValidationFailure> {
    check_pattern(context, &URL_REGEX, "{field} must be a valid URL.")
}

/// `uuid`
pub fn uuid(context: &mut ValidationContext<'_>, _options: &[String]) -> Result<(), ValidationFailure> {
    check_pattern(context, &UUID_REGEX, "{field} must be a valid UUID.")
}

/// `alpha`
pub fn alpha(context: &mut ValidationContext<'_>, _options: &[String]) -> Result<(), ValidationFailure> {
    check_pattern(context, &ALPHA_REGEX, "{field} must contain only letters.")
}

/// `alphanumeric`
pub fn alphanumeric(
    context: &mut ValidationContext<'_>,
    _options: &[String],
) -> Result<(), ValidationFailure> {
    check_pattern(
        context,
        &ALPHANUMERIC_REGEX,
        "{field} must contain only letters and numbers.",
    )
}

// Record methods

/// `func` / `func(name)`: calls a method registered for the enclosing record.
///
/// Without an argument the method is `validate_<field>`. The method must
/// hand back exactly one success or failure.
pub fn func(context: &mut ValidationContext<'_>, options: &[String]) -> Result<(), ValidationFailure> {
    let method = match options {
        [] => format!(
            "validate_{}",
            context.field().map(|field| field.name()).unwrap_or_default()
        ),
        [name] => name.clone(),
        _ => {
            return Err(ValidationFailure::invalid_arguments(
                "Validator 'func' accepts at most one argument.",
            ));
        }
    };

    let path = match context.field().and_then(|field| field.parent()) {
        Some(parent) => parent.full_name(&[&method]),
        None => method.clone(),
    };

    let Some(record) = context.parent() else {
        return Err(failure(format!(
            "Validation method '{}' on field '{{field}}' has no enclosing record.",
            path
        )));
    };

    let invalid_return = || {
        failure(format!(
            "Invalid return value(s) of validation method '{}'. Return value must be of type 'error'.",
            path
        ))
    };

    let returned = match invoke(record, &method, &[Arg::Context(&*context), Arg::Options(options)]) {
        Ok(returned) => returned,
        Err(DispatchError::InvalidMethod { .. }) => {
            return Err(failure(format!(
                "Validation method '{}' on field '{{field}}' does not exist.",
                path
            )));
        }
        Err(DispatchError::ParameterMismatch { .. }) => return Err(invalid_return()),
        Err(err @ DispatchError::UnhandledCall { .. }) => return Err(failure(err.to_string())),
    };

    match returned.as_slice() {
        [Returned::Unit] => Ok(()),
        [Returned::Failure(failure)] => Err(failure.clone()),
        _ => Err(invalid_return()),
    }
}
