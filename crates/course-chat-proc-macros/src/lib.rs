// course-chat/course-chat-proc-macros
//
// Copyright: 2023, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use proc_macro::TokenStream;

use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Error, Fields, Ident};

/// Derives `From<&AppDependencies>` for a service struct.
///
/// Fields marked with `#[inject]` are cloned from the field of the same name on
/// `crate::app::deps::AppDependencies`. `#[inject(from = other_name)]` reads a differently named
/// dependency. All remaining fields are initialized with `Default::default()`.
#[proc_macro_derive(InjectDependencies, attributes(inject))]
pub fn inject_deps(stream: TokenStream) -> TokenStream {
    let input = parse_macro_input!(stream as DeriveInput);

    let Data::Struct(struct_data) = &input.data else {
        return Error::new_spanned(&input.ident, "InjectDependencies only supports structs.")
            .to_compile_error()
            .into();
    };

    let Fields::Named(fields) = &struct_data.fields else {
        return Error::new_spanned(
            &input.ident,
            "InjectDependencies only supports structs with named fields.",
        )
        .to_compile_error()
        .into();
    };

    let mut field_initialization = vec![];

    for field in fields.named.iter() {
        let Some(ref ident) = field.ident else {
            continue;
        };

        let Some(attr) = field.attrs.iter().find(|attr| attr.path().is_ident("inject")) else {
            field_initialization.push(quote! { #ident: Default::default() });
            continue;
        };

        let mut source: Ident = ident.clone();

        if let syn::Meta::List(_) = &attr.meta {
            let result = attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("from") {
                    source = meta.value()?.parse()?;
                    return Ok(());
                }
                Err(meta.error("unsupported inject attribute, expected `from = <field>`"))
            });

            if let Err(err) = result {
                return err.to_compile_error().into();
            }
        }

        field_initialization.push(quote! { #ident: deps.#source.clone() });
    }

    let name = &input.ident;
    let expanded = quote! {
        impl From<&crate::app::deps::AppDependencies> for #name {
            fn from(deps: &crate::app::deps::AppDependencies) -> Self {
                Self {
                    #(#field_initialization,)*
                }
            }
        }
    };

    TokenStream::from(expanded)
}
