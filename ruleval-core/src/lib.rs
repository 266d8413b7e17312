//! Rule-annotation driven validation engine
//!
//! Record fields carry a rule annotation such as `not_empty,min(3)`. The
//! engine walks a value depth first, runs the named validator for every rule
//! and collects every failure into an [`ErrorReport`].
//!
//! # Examples
//!
//! ## Validating a record
//!
//! ```
//! use ruleval_core::validate;
//! use ruleval_macro::Introspectable;
//!
//! #[derive(Introspectable)]
//! pub struct SignUp {
//!     #[rule(validate = "not_empty,min(3)", label = "User name")]
//!     pub username: String,
//!     #[rule(validate = "numeric,min(18)")]
//!     pub age: String,
//! }
//!
//! let input = SignUp {
//!     username: "jo".to_string(),
//!     age: "17".to_string(),
//! };
//!
//! let report = validate(&input).unwrap();
//! assert_eq!(report.len(), 2);
//! assert_eq!(report.errors[0].message, "User name cannot be shorter than 3 characters.");
//! assert_eq!(report.errors[1].message, "age cannot be less than 18.");
//! ```
//!
//! ## Custom validators
//!
//! ```
//! use ruleval_core::{ValidationContext, ValidationEngine, ValidationFailure};
//!
//! fn even(context: &mut ValidationContext<'_>, _options: &[String]) -> Result<(), ValidationFailure> {
//!     match context.value().as_int() {
//!         Some(n) if n % 2 != 0 => Err(ValidationFailure::new("{field} must be even.")),
//!         _ => Ok(()),
//!     }
//! }
//!
//! let mut engine = ValidationEngine::new();
//! engine.register("even", even);
//! assert!(engine.registry().contains("even"));
//! ```
//!
//! ## Parsing annotations
//!
//! ```
//! use ruleval_core::parse;
//!
//! let rules = parse("not_empty, max(10)").unwrap();
//! assert_eq!(rules[1].name, "max");
//! assert_eq!(rules[1].arguments, vec!["10"]);
//! ```

mod config;
mod context;
mod dispatch;
mod errors;
mod introspect;
mod registry;
mod rules;
mod value;
mod walker;

pub mod validators;

pub use config::*;
pub use context::*;
pub use dispatch::*;
pub use errors::*;
pub use introspect::*;
pub use registry::*;
pub use rules::*;
pub use value::*;
pub use walker::*;
