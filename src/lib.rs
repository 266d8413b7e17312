// ruleval - validate in-memory records against rule annotations
//
// Record types derive `Introspectable` and annotate their fields with
// `#[rule(validate = "...")]`; `validate` walks a value and returns every
// rule failure as an `ErrorReport`.

// Re-export core functionality
pub use ruleval_core::*;

// Re-export the derive macro
#[cfg(feature = "derive")]
pub use ruleval_macro::Introspectable;
