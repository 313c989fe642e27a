//! Schema traits: what a payload type declares about itself.
//!
//! A payload stored through a [crate::snapshot::Snapshot] implements
//! [SnapshotData]. To be queried with typed field references it also
//! implements [FieldNameReferable], which maps a symbolic field identifier to
//! the field's wire name. Both are normally derived:
//!
//! ```rust,ignore
//! #[derive(Convertible, SnapshotData, FieldNames)]
//! #[snapshot(timestamps)]
//! struct Mock {
//!     name: String,
//!     #[field(name = "cnt")]
//!     count: Incrementable<i64>,
//!     #[field(unqueryable)]
//!     note: Option<String>,
//! }
//!
//! assert_eq!(resolve_field_name::<Mock>(MockField::Count), Some("cnt"));
//! assert_eq!(resolve_field_name::<Mock>(MockField::Note), None);
//! ```

use crate::common::Convertible;
use crate::document::Document;
use std::fmt::Debug;

/// A payload type that can be stored in a document.
pub trait SnapshotData: Convertible {
    /// When true, writes add server timestamps under `createTime` /
    /// `updateTime`, and reads pick them back up.
    const HAS_TIMESTAMPS: bool = false;
}

/// Marks a payload whose documents carry `createTime` / `updateTime`.
/// Gates the timestamp accessors and timestamp query clauses.
pub trait HasTimestamps: SnapshotData {}

/// Maps a payload's symbolic field identifiers to wire field names.
///
/// The lookup is total: a field that has no wire name (for example one that
/// is never meant to be queried) yields `None` rather than an error.
pub trait FieldNameReferable {
    type Field: Copy + Debug;

    fn field_name(field: Self::Field) -> Option<&'static str>;
}

pub fn resolve_field_name<D: FieldNameReferable>(field: D::Field) -> Option<&'static str> {
    D::field_name(field)
}

impl SnapshotData for Document {}

/// An untyped document is addressed by its wire names directly.
impl FieldNameReferable for Document {
    type Field = &'static str;

    fn field_name(field: Self::Field) -> Option<&'static str> {
        if field.is_empty() {
            None
        } else {
            Some(field)
        }
    }
}
