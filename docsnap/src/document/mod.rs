//! Field maps and locations.
//!
//! A [Document] is the map of fields exchanged with a backend. Locations are
//! typed by the payload they hold: a [DocumentPath] addresses one document, a
//! [CollectionPath] a collection, and a [CollectionGroup] every collection
//! sharing an id.
//!
//! ```rust,ignore
//! use docsnap::document::CollectionPath;
//!
//! let mocks = CollectionPath::<Mock>::new("mocks");
//! let fixed = mocks.document("a");        // mocks/a
//! let fresh = mocks.new_document();       // mocks/<20 random chars>
//! let children = fixed.collection::<Child>("children");
//! ```
//!
//! Paths are validated lazily: constructing a malformed path is allowed, and
//! the first read or write through it fails with `ErrorKind::InvalidPath`.

mod fields;
mod path;
mod reference;

pub use fields::*;
pub use path::*;
pub use reference::*;
