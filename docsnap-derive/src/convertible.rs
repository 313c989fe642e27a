use crate::attributes::parse_field_attributes;
use proc_macro2::{Ident, Span, TokenStream};
use quote::quote;
use syn::{DataEnum, DataStruct, DeriveInput, Error, Fields, FieldsNamed, Result};

pub(crate) fn generate_convertible_for_struct(ast: &DeriveInput, data: &DataStruct) -> Result<TokenStream> {
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
    let type_name = name.to_string();
    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();
    let (encoders, decoders) = named_field_codecs(fields, quote! { &self. }, quote! { doc })?;

    let gen = quote! {
        impl #impl_generics docsnap::common::Convertible for #name #ty_generics #where_clause {
            fn to_value(&self) -> docsnap::errors::SnapshotResult<docsnap::common::Value> {
                let mut doc = docsnap::document::Document::new();
                #(#encoders)*
                Ok(docsnap::common::Value::Document(doc))
            }

            fn from_value(value: &docsnap::common::Value) -> docsnap::errors::SnapshotResult<Self> {
                match value {
                    docsnap::common::Value::Document(doc) => {
                        Ok(#name {
                            #(#decoders,)*
                        })
                    }
                    _ => Err(docsnap::errors::SnapshotError::new(
                        &format!("Expected a document for {} but found {}", #type_name, value.type_name()),
                        docsnap::errors::ErrorKind::DecodingError,
                    )),
                }
            }
        }
    };

    Ok(gen)
}

pub(crate) fn generate_convertible_for_enum(ast: &DeriveInput, data: &DataEnum) -> Result<TokenStream> {
    let name = &ast.ident;
    let type_name = name.to_string();
    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();

    let variant_count = data.variants.len();
    let mut to_value_variants = Vec::with_capacity(variant_count);
    let mut from_value_variants = Vec::with_capacity(variant_count);

    for variant in &data.variants {
        let variant_ident = &variant.ident;
        let variant_name = variant_ident.to_string();

        match &variant.fields {
            Fields::Named(fields) => {
                let all_idents: Vec<&Ident> = fields
                    .named
                    .iter()
                    .filter_map(|f| f.ident.as_ref())
                    .collect();
                let (encoders, decoders) = named_field_codecs(fields, quote! {}, quote! { data })?;

                to_value_variants.push(quote! {
                    #[allow(unused_variables)]
                    #name::#variant_ident { #(#all_idents),* } => {
                        let mut doc = docsnap::document::Document::new();
                        #(#encoders)*
                        (#variant_name, docsnap::common::Value::Document(doc))
                    }
                });

                from_value_variants.push(quote! {
                    #variant_name => {
                        let data = <docsnap::document::Document as docsnap::common::Convertible>::from_value(data)?;
                        let data = &data;
                        Ok(#name::#variant_ident {
                            #(#decoders,)*
                        })
                    }
                });
            }
            Fields::Unnamed(fields) => {
                let field_count = fields.unnamed.len();
                let field_idents: Vec<Ident> = (0..field_count)
                    .map(|i| Ident::new(&format!("field_{}", i), Span::call_site()))
                    .collect();
                let field_indices: Vec<usize> = (0..field_count).collect();
                let field_types: Vec<&syn::Type> = fields.unnamed.iter().map(|f| &f.ty).collect();

                to_value_variants.push(quote! {
                    #name::#variant_ident(#(#field_idents),*) => {
                        let mut array = Vec::with_capacity(#field_count);
                        #(array.push(docsnap::common::Convertible::to_value(#field_idents)?);)*
                        (#variant_name, docsnap::common::Value::Array(array))
                    }
                });

                from_value_variants.push(quote! {
                    #variant_name => {
                        let data = <Vec<docsnap::common::Value> as docsnap::common::Convertible>::from_value(data)?;
                        if data.len() != #field_count {
                            return Err(docsnap::errors::SnapshotError::new(
                                &format!(
                                    "Variant {}::{} expects {} values but found {}",
                                    #type_name, #variant_name, #field_count, data.len()
                                ),
                                docsnap::errors::ErrorKind::DecodingError,
                            ));
                        }
                        Ok(#name::#variant_ident(
                            #(<#field_types as docsnap::common::Convertible>::from_value(&data[#field_indices])?,)*
                        ))
                    }
                });
            }
            Fields::Unit => {
                to_value_variants.push(quote! {
                    #name::#variant_ident => (#variant_name, docsnap::common::Value::Null)
                });

                from_value_variants.push(quote! {
                    #variant_name => Ok(#name::#variant_ident)
                });
            }
        }
    }

    let gen = quote! {
        impl #impl_generics docsnap::common::Convertible for #name #ty_generics #where_clause {
            fn to_value(&self) -> docsnap::errors::SnapshotResult<docsnap::common::Value> {
                let (variant, value): (&str, docsnap::common::Value) = match self {
                    #(#to_value_variants),*
                };
                let mut document = docsnap::document::Document::new();
                document.insert_raw("variant".to_string(), docsnap::common::Value::from(variant));
                document.insert_raw("value".to_string(), value);
                Ok(docsnap::common::Value::Document(document))
            }

            fn from_value(value: &docsnap::common::Value) -> docsnap::errors::SnapshotResult<Self> {
                let doc = match value {
                    docsnap::common::Value::Document(doc) => doc,
                    _ => {
                        return Err(docsnap::errors::SnapshotError::new(
                            &format!("Expected a document for {} but found {}", #type_name, value.type_name()),
                            docsnap::errors::ErrorKind::DecodingError,
                        ))
                    }
                };
                let variant: String = docsnap::common::decode_field(doc, "variant")?;
                let data = docsnap::common::field_value(doc, "value");
                match variant.as_str() {
                    #(#from_value_variants,)*
                    _ => Err(docsnap::errors::SnapshotError::new(
                        &format!("Unknown variant '{}' for {}", variant, #type_name),
                        docsnap::errors::ErrorKind::DecodingError,
                    )),
                }
            }
        }
    };

    Ok(gen)
}

/// Encoder statements and decoder initializers for named fields.
///
/// Encoders insert `<access><ident>`, which must evaluate to a reference, into
/// a `doc` binding; decoders read each field from the document bound to
/// `source`.
fn named_field_codecs(
    fields: &FieldsNamed,
    access: TokenStream,
    source: TokenStream,
) -> Result<(Vec<TokenStream>, Vec<TokenStream>)> {
    let mut encoders = Vec::with_capacity(fields.named.len());
    let mut decoders = Vec::with_capacity(fields.named.len());

    for field in &fields.named {
        let attributes = parse_field_attributes(field)?;
        let ident = match &field.ident {
            Some(ident) => ident,
            None => continue,
        };
        let ty = &field.ty;

        if attributes.ignore {
            decoders.push(quote! { #ident: Default::default() });
            continue;
        }

        let wire_name = attributes.wire_name(ident);
        encoders.push(quote! {
            doc.insert_raw(
                #wire_name.to_string(),
                docsnap::common::Convertible::to_value(#access #ident)?,
            );
        });
        decoders.push(quote! {
            #ident: docsnap::common::decode_field::<#ty>(#source, #wire_name)?
        });
    }

    Ok((encoders, decoders))
}
