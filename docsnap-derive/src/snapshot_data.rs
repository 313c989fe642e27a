use crate::attributes::has_timestamps;
use proc_macro2::TokenStream;
use quote::quote;
use syn::{DeriveInput, Result};

pub(crate) fn generate_snapshot_data(ast: &DeriveInput) -> Result<TokenStream> {
    let name = &ast.ident;
    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();

    let gen = if has_timestamps(ast)? {
        quote! {
            impl #impl_generics docsnap::schema::SnapshotData for #name #ty_generics #where_clause {
                const HAS_TIMESTAMPS: bool = true;
            }

            impl #impl_generics docsnap::schema::HasTimestamps for #name #ty_generics #where_clause {}
        }
    } else {
        quote! {
            impl #impl_generics docsnap::schema::SnapshotData for #name #ty_generics #where_clause {}
        }
    };

    Ok(gen)
}
