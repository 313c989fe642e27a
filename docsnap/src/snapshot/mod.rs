//! The document envelope: a typed payload bound to its document path.
//!
//! [Snapshot] reads, writes and listens to single documents and collections;
//! [Batch] and [Transaction] group snapshot writes so they apply atomically.

mod batch;
mod read;
#[allow(clippy::module_inception)]
mod snapshot;
mod transaction;
mod write;

pub use batch::*;
pub use snapshot::*;
pub use transaction::*;
