//! Fuzz target for the built-in validators.
//!
//! Runs every registered validator against arbitrary values and options.
//! Validators must report failures, never panic.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use ruleval_core::{Registry, ValidationContext, Value};

/// Arbitrary value for fuzzing.
#[derive(Debug, Arbitrary)]
enum FuzzValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Items(Vec<i64>),
}

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    value: FuzzValue,
    options: Vec<String>,
}

fuzz_target!(|input: FuzzInput| {
    let registry = Registry::with_builtins();

    for name in registry.names() {
        let value = match &input.value {
            FuzzValue::Null => Value::Null,
            FuzzValue::Bool(b) => Value::Bool(*b),
            FuzzValue::Int(n) => Value::Int(*n),
            FuzzValue::Float(n) => Value::Float(*n),
            FuzzValue::Text(text) => Value::from(text.as_str()),
            FuzzValue::Items(items) => Value::Seq(items.iter().map(|n| Value::Int(*n)).collect()),
        };

        let Ok(filter) = registry.lookup(name) else {
            continue;
        };

        let mut context = ValidationContext::for_value(value);
        let _ = filter(&mut context, &input.options);
    }
});
