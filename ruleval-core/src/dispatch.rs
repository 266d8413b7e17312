// Method dispatch by name
//
// Record types register named methods (closures over the concrete type).
// Validators such as `func` call them by name on the enclosing record.

use crate::{DispatchError, Introspectable, ValidationContext, ValidationFailure, Value};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Kind of a method parameter. `Any` accepts every argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Context,
    Options,
    Value,
    Any,
}

/// Argument passed to a dispatched method.
#[derive(Debug, Clone, Copy)]
pub enum Arg<'r, 'a> {
    Context(&'r ValidationContext<'a>),
    Options(&'r [String]),
    Value(&'r Value<'a>),
}

impl Arg<'_, '_> {
    pub fn kind(&self) -> ParamKind {
        match self {
            Arg::Context(_) => ParamKind::Context,
            Arg::Options(_) => ParamKind::Options,
            Arg::Value(_) => ParamKind::Value,
        }
    }
}

/// Value handed back by a dispatched method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Returned {
    /// Clean success
    Unit,
    Failure(ValidationFailure),
    /// Anything else, by type name
    Other(&'static str),
}

type MethodFn = Arc<dyn Fn(&dyn Any, &[Arg<'_, '_>]) -> Option<Vec<Returned>> + Send + Sync>;

// Pins the closure signature so it is inferred as higher-ranked.
fn method_fn<F>(call: F) -> F
where
    F: Fn(&dyn Any, &[Arg<'_, '_>]) -> Option<Vec<Returned>> + Send + Sync + 'static,
{
    call
}

#[derive(Clone)]
struct Method {
    params: Vec<ParamKind>,
    call: MethodFn,
}

static METHOD_TABLE: Lazy<RwLock<HashMap<TypeId, HashMap<String, Method>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

fn insert<T: Introspectable>(name: String, method: Method) {
    debug!(
        record = std::any::type_name::<T>(),
        method = %name,
        "Registered record method"
    );
    METHOD_TABLE
        .write()
        .entry(TypeId::of::<T>())
        .or_default()
        .insert(name, method);
}

/// Register a validation method for record type `T`.
///
/// The method receives the record, the validation context and the rule
/// options, and is what the `func` validator calls.
///
/// ```
/// use ruleval_core::{Arg, Introspectable, ValidationContext, ValidationFailure, register_method, invoke};
/// # use ruleval_core::{FieldSpec, Value};
/// # use std::any::Any;
///
/// struct Order { total: i64 }
/// # impl Introspectable for Order {
/// #     fn type_name(&self) -> &'static str { "Order" }
/// #     fn field_specs(&self) -> &'static [FieldSpec] { &[] }
/// #     fn field_value(&self, _index: usize) -> Value<'_> { Value::Null }
/// #     fn as_any(&self) -> &dyn Any { self }
/// # }
///
/// register_method::<Order, _>("validate_total", |order, _context, _options| {
///     if order.total < 0 {
///         Err(ValidationFailure::new("{field} cannot be negative."))
///     } else {
///         Ok(())
///     }
/// });
///
/// let order = Order { total: -5 };
/// let context = ValidationContext::new();
/// let returned = invoke(&order, "validate_total", &[Arg::Context(&context), Arg::Options(&[])]).unwrap();
/// assert_eq!(returned.len(), 1);
/// ```
pub fn register_method<T, F>(name: impl Into<String>, method: F)
where
    T: Introspectable,
    F: Fn(&T, &ValidationContext<'_>, &[String]) -> Result<(), ValidationFailure>
        + Send
        + Sync
        + 'static,
{
    let call = method_fn(move |receiver, args| {
        let receiver = receiver.downcast_ref::<T>()?;
        let [Arg::Context(context), Arg::Options(options)] = args else {
            return None;
        };
        let returned = match method(receiver, context, options) {
            Ok(()) => Returned::Unit,
            Err(failure) => Returned::Failure(failure),
        };
        Some(vec![returned])
    });

    insert::<T>(
        name.into(),
        Method {
            params: vec![ParamKind::Context, ParamKind::Options],
            call: Arc::new(call),
        },
    );
}

/// Register a method for record type `T` with an arbitrary signature.
pub fn register_raw_method<T, F>(name: impl Into<String>, params: Vec<ParamKind>, method: F)
where
    T: Introspectable,
    F: Fn(&T, &[Arg<'_, '_>]) -> Vec<Returned> + Send + Sync + 'static,
{
    let call = method_fn(move |receiver, args| {
        let receiver = receiver.downcast_ref::<T>()?;
        Some(method(receiver, args))
    });

    insert::<T>(
        name.into(),
        Method {
            params,
            call: Arc::new(call),
        },
    );
}

/// Whether a method is registered for the instance's type.
pub fn has_method(instance: &dyn Introspectable, method: &str) -> bool {
    METHOD_TABLE
        .read()
        .get(&instance.as_any().type_id())
        .is_some_and(|methods| methods.contains_key(method))
}

/// Call a named method on a record instance.
///
/// The argument count must match the registered parameters, and every
/// parameter that is not [`ParamKind::Any`] must match its argument's kind.
pub fn invoke(
    instance: &dyn Introspectable,
    method: &str,
    args: &[Arg<'_, '_>],
) -> Result<Vec<Returned>, DispatchError> {
    let receiver = instance.as_any();

    let entry = METHOD_TABLE
        .read()
        .get(&receiver.type_id())
        .and_then(|methods| methods.get(method))
        .cloned()
        .ok_or_else(|| DispatchError::InvalidMethod {
            type_name: instance.type_name(),
            method: method.to_string(),
        })?;

    let mismatch = || DispatchError::ParameterMismatch {
        method: method.to_string(),
    };

    if entry.params.len() != args.len() {
        return Err(mismatch());
    }

    for (param, arg) in entry.params.iter().zip(args) {
        if *param != ParamKind::Any && *param != arg.kind() {
            return Err(mismatch());
        }
    }

    (entry.call)(receiver, args).ok_or_else(|| DispatchError::UnhandledCall {
        method: method.to_string(),
    })
}
