// Procedural macros for ruleval
// Field metadata is written as `#[rule(...)]` attributes and compiled into
// static tables, so no runtime reflection is needed.

use proc_macro::TokenStream;

mod introspectable;

/// Derives `ruleval_core::Introspectable` and `ruleval_core::ToValue` for a
/// struct with named fields.
///
/// Every `key = "value"` pair in a field's `#[rule(...)]` attribute becomes a
/// tag. The engine reads rules from the `validate` tag and display names from
/// the `label` tag by default. Only `pub` fields are validated; `skip` hides a
/// public field as well.
///
/// ```ignore
/// #[derive(Introspectable)]
/// pub struct SignUp {
///     #[rule(validate = "not_empty,min(3)", label = "User name")]
///     pub username: String,
///     #[rule(skip)]
///     pub token: Token,
/// }
/// ```
#[proc_macro_derive(Introspectable, attributes(rule))]
pub fn introspectable_derive(input: TokenStream) -> TokenStream {
    introspectable::introspectable_derive_impl(input)
}
