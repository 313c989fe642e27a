use proc_macro2::Ident;
use syn::ext::IdentExt;
use syn::{DeriveInput, Field, LitStr, Result};

/// Options read from `#[field(...)]` on a struct or variant field.
pub(crate) struct FieldAttributes {
    pub(crate) name: Option<String>,
    pub(crate) ignore: bool,
    pub(crate) unqueryable: bool,
}

impl FieldAttributes {
    /// Name of the field in stored documents.
    pub(crate) fn wire_name(&self, ident: &Ident) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => ident.unraw().to_string(),
        }
    }

    /// Whether queries may reference the field. Ignored fields are never
    /// stored, so they cannot be queried either.
    pub(crate) fn is_queryable(&self) -> bool {
        !self.ignore && !self.unqueryable
    }
}

pub(crate) fn parse_field_attributes(field: &Field) -> Result<FieldAttributes> {
    let mut attributes = FieldAttributes {
        name: None,
        ignore: false,
        unqueryable: false,
    };

    for attr in &field.attrs {
        if attr.path().is_ident("field") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    let value = meta.value()?;
                    let s: LitStr = value.parse()?;
                    if s.value().is_empty() {
                        return Err(meta.error("Field name must not be empty"));
                    }
                    // updates read dots as nested field paths
                    if s.value().contains('.') {
                        return Err(meta.error("Field name must not contain '.'"));
                    }
                    attributes.name = Some(s.value());
                    Ok(())
                } else if meta.path.is_ident("ignore") {
                    attributes.ignore = true;
                    Ok(())
                } else if meta.path.is_ident("unqueryable") {
                    attributes.unqueryable = true;
                    Ok(())
                } else {
                    Err(meta.error("Unknown field attribute, expected `name`, `ignore` or `unqueryable`"))
                }
            })?;
        }
    }

    Ok(attributes)
}

/// Whether the container carries `#[snapshot(timestamps)]`.
pub(crate) fn has_timestamps(ast: &DeriveInput) -> Result<bool> {
    let mut timestamps = false;
    for attr in &ast.attrs {
        if attr.path().is_ident("snapshot") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("timestamps") {
                    timestamps = true;
                    Ok(())
                } else {
                    Err(meta.error("Unknown snapshot attribute, expected `timestamps`"))
                }
            })?;
        }
    }
    Ok(timestamps)
}

/// `created_at` -> `CreatedAt`.
pub(crate) fn to_upper_camel_case(name: &str) -> String {
    name.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}
