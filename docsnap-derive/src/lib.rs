#![recursion_limit = "128"]
//! # docsnap Derive Macros
//!
//! Procedural macros implementing the docsnap payload traits.
//!
//! ## Macros
//!
//! ### `Convertible`
//!
//! Converts structs with named fields to and from a `Document`, and enums to
//! and from a `{variant, value}` document.
//!
//! - **Field attribute**: `#[field(name = "...")]` sets the stored name, which
//!   must not contain `.`
//! - **Field attribute**: `#[field(ignore)]` skips the field; it decodes as
//!   `Default::default()`
//!
//! ### `SnapshotData`
//!
//! Marks a type as a snapshot payload. `#[snapshot(timestamps)]` on the type
//! makes writes record `createTime` / `updateTime` and enables the timestamp
//! accessors and query clauses.
//!
//! ### `FieldNames`
//!
//! Generates a `<Type>Field` enum with one variant per field, in
//! UpperCamelCase, and maps each variant to the stored field name.
//! `#[field(unqueryable)]` keeps the variant but maps it to nothing, so query
//! clauses on it are dropped.
//!
//! # Examples
//!
//! ```rust,ignore
//! use docsnap::delta::Incrementable;
//! use docsnap_derive::{Convertible, FieldNames, SnapshotData};
//!
//! #[derive(Convertible, SnapshotData, FieldNames)]
//! #[snapshot(timestamps)]
//! pub struct Post {
//!     pub title: String,
//!     #[field(name = "likes")]
//!     pub like_count: Incrementable<i64>,
//!     #[field(unqueryable)]
//!     pub body: String,
//! }
//!
//! // PostField::Title -> "title", PostField::LikeCount -> "likes",
//! // PostField::Body -> no name
//! ```

extern crate proc_macro;
mod attributes;
mod convertible;
mod field_names;
mod snapshot_data;

use crate::convertible::{generate_convertible_for_enum, generate_convertible_for_struct};
use crate::field_names::generate_field_names;
use crate::snapshot_data::generate_snapshot_data;
use proc_macro::TokenStream;
use syn::{Data, DeriveInput};

/// Derives `docsnap::common::Convertible`.
///
/// Every stored field must implement `Convertible` itself; missing keys
/// decode from `Null`, so `Option` fields tolerate documents written without
/// them.
///
/// # Errors
///
/// Returns a compile error for unions, tuple structs and unit structs, and
/// for unknown `#[field(...)]` options.
#[proc_macro_derive(Convertible, attributes(field))]
pub fn derive_convertible(input: TokenStream) -> TokenStream {
    let ast = syn::parse_macro_input!(input as DeriveInput);

    let result = match ast.data {
        Data::Struct(ref data) => generate_convertible_for_struct(&ast, data),
        Data::Enum(ref data) => generate_convertible_for_enum(&ast, data),
        Data::Union(_) => Err(syn::Error::new_spanned(
            &ast,
            "Cannot derive Convertible for unions. Only structs and enums are supported.",
        )),
    };

    match result {
        Ok(token_stream) => token_stream.into(),
        Err(e) => {
            let error = syn::Error::new(
                e.span(),
                format!("Failed to derive Convertible for '{}': {}", ast.ident, e),
            );
            error.to_compile_error().into()
        }
    }
}

/// Derives `docsnap::schema::SnapshotData`, plus `HasTimestamps` when the
/// type carries `#[snapshot(timestamps)]`.
#[proc_macro_derive(SnapshotData, attributes(snapshot))]
pub fn derive_snapshot_data(input: TokenStream) -> TokenStream {
    let ast = syn::parse_macro_input!(input as DeriveInput);

    match generate_snapshot_data(&ast) {
        Ok(token_stream) => token_stream.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

/// Derives `docsnap::schema::FieldNameReferable` and the `<Type>Field` enum.
///
/// # Errors
///
/// Returns a compile error for enums, unions, tuple structs and unit
/// structs.
#[proc_macro_derive(FieldNames, attributes(field))]
pub fn derive_field_names(input: TokenStream) -> TokenStream {
    let ast = syn::parse_macro_input!(input as DeriveInput);

    let result = match ast.data {
        Data::Struct(ref data) => generate_field_names(&ast, data),
        _ => Err(syn::Error::new_spanned(
            &ast,
            "Cannot derive FieldNames for enums or unions. Only structs with named fields are supported.",
        )),
    };

    match result {
        Ok(token_stream) => token_stream.into(),
        Err(e) => {
            let error = syn::Error::new(
                e.span(),
                format!("Failed to derive FieldNames for '{}': {}", ast.ident, e),
            );
            error.to_compile_error().into()
        }
    }
}
