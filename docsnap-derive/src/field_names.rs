use crate::attributes::{parse_field_attributes, to_upper_camel_case};
use proc_macro2::{Ident, TokenStream};
use quote::{format_ident, quote};
use syn::ext::IdentExt;
use syn::{DataStruct, DeriveInput, Error, Fields, Result};

/// Generates `<Type>Field`, one variant per struct field, and the lookup
/// table from variant to wire name.
pub(crate) fn generate_field_names(ast: &DeriveInput, data: &DataStruct) -> Result<TokenStream> {
    let fields = match &data.fields {
        Fields::Named(fields) => fields,
        _ => {
            return Err(Error::new_spanned(
                ast,
                "only structs with named fields are supported",
            ))
        }
    };

    let name = &ast.ident;
    let vis = &ast.vis;
    let enum_name = format_ident!("{}Field", name);
    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();

    let mut variants: Vec<Ident> = Vec::with_capacity(fields.named.len());
    let mut arms: Vec<TokenStream> = Vec::with_capacity(fields.named.len());

    for field in &fields.named {
        let ident = match &field.ident {
            Some(ident) => ident,
            None => continue,
        };
        let attributes = parse_field_attributes(field)?;
        let variant = format_ident!("{}", to_upper_camel_case(&ident.unraw().to_string()));

        if attributes.is_queryable() {
            let wire_name = attributes.wire_name(ident);
            arms.push(quote! { #enum_name::#variant => Some(#wire_name) });
        } else {
            arms.push(quote! { #enum_name::#variant => None });
        }
        variants.push(variant);
    }

    let doc = format!("Field identifiers of [{}], for typed queries.", name);

    let gen = quote! {
        #[doc = #doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #vis enum #enum_name {
            #(#variants,)*
        }

        impl #impl_generics docsnap::schema::FieldNameReferable for #name #ty_generics #where_clause {
            type Field = #enum_name;

            fn field_name(field: #enum_name) -> Option<&'static str> {
                match field {
                    #(#arms,)*
                }
            }
        }
    };

    Ok(gen)
}
