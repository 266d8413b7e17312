use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    Attribute, Data, DeriveInput, Error, Fields, LitStr, Visibility, parse_macro_input,
    parse_quote,
};

/// Metadata collected from one field's `#[rule(...)]` attributes
struct FieldRules {
    tags: Vec<(String, String)>,
    skip: bool,
}

pub fn introspectable_derive_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match expand(input) {
        Ok(tokens) => tokens.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

fn expand(input: DeriveInput) -> Result<TokenStream2, Error> {
    let name = &input.ident;
    let type_name = name.to_string();

    if let Some(attr) = input.attrs.iter().find(|attr| attr.path().is_ident("rule")) {
        return Err(Error::new_spanned(
            attr,
            "#[rule] is only supported on fields",
        ));
    }

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(Error::new_spanned(
                    name,
                    "Introspectable can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(Error::new_spanned(
                name,
                "Introspectable can only be derived for structs",
            ));
        }
    };

    let mut specs = Vec::new();
    let mut arms = Vec::new();
    let mut walked_types = Vec::new();

    for (index, field) in fields.iter().enumerate() {
        let Some(ident) = &field.ident else {
            continue;
        };
        let field_name = ident.to_string();
        let rules = field_rules(&field.attrs)?;
        let public = matches!(field.vis, Visibility::Public(_)) && !rules.skip;

        let keys = rules.tags.iter().map(|(key, _)| key);
        let values = rules.tags.iter().map(|(_, value)| value);
        specs.push(quote! {
            ::ruleval_core::FieldSpec::new(#field_name, #public, &[#((#keys, #values)),*])
        });

        if public {
            let ty = &field.ty;
            arms.push(quote! {
                #index => ::ruleval_core::ToValue::to_value(&self.#ident),
            });
            walked_types.push(ty.clone());
        }
    }

    let mut generics = input.generics.clone();
    {
        let where_clause = generics.make_where_clause();
        for param in input.generics.type_params() {
            let ident = &param.ident;
            where_clause.predicates.push(parse_quote!(#ident: 'static));
        }
        if !input.generics.params.is_empty() {
            for ty in &walked_types {
                where_clause
                    .predicates
                    .push(parse_quote!(#ty: ::ruleval_core::ToValue));
            }
        }
    }
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    Ok(quote! {
        #[automatically_derived]
        impl #impl_generics ::ruleval_core::Introspectable for #name #ty_generics #where_clause {
            fn type_name(&self) -> &'static str {
                #type_name
            }

            fn field_specs(&self) -> &'static [::ruleval_core::FieldSpec] {
                const FIELDS: &[::ruleval_core::FieldSpec] = &[#(#specs),*];
                FIELDS
            }

            fn field_value(&self, index: usize) -> ::ruleval_core::Value<'_> {
                match index {
                    #(#arms)*
                    _ => ::ruleval_core::Value::Unsupported(#type_name),
                }
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }
        }

        #[automatically_derived]
        impl #impl_generics ::ruleval_core::ToValue for #name #ty_generics #where_clause {
            fn to_value(&self) -> ::ruleval_core::Value<'_> {
                ::ruleval_core::Value::Record(self)
            }
        }
    })
}

/// Collect `key = "value"` tags and the `skip` flag from `#[rule(...)]`
fn field_rules(attrs: &[Attribute]) -> Result<FieldRules, Error> {
    let mut rules = FieldRules {
        tags: Vec::new(),
        skip: false,
    };

    for attr in attrs.iter().filter(|attr| attr.path().is_ident("rule")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("skip") {
                rules.skip = true;
                return Ok(());
            }

            let key = meta
                .path
                .get_ident()
                .ok_or_else(|| meta.error("expected a tag name"))?
                .to_string();
            let value: LitStr = meta.value()?.parse()?;

            if rules.tags.iter().any(|(existing, _)| *existing == key) {
                return Err(meta.error(format!("duplicate tag `{}`", key)));
            }

            rules.tags.push((key, value.value()));
            Ok(())
        })?;
    }

    Ok(rules)
}
