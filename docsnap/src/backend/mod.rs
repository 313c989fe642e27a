//! The document store collaborator.
//!
//! Everything that touches persistence goes through [DocumentStore]. The
//! crate ships [MemoryBackend], an in-process implementation used as the
//! default store and as the test double; a hosted database is plugged in by
//! implementing the trait over its client.
//!
//! Field maps handed to a store may contain [crate::common::Sentinel]
//! values, which the store interprets. Field maps returned by a store never
//! do.

mod memory;

pub use memory::*;

use crate::common::PATH_SEPARATOR;
use crate::document::Document;
use crate::errors::SnapshotResult;
use crate::query::Query;
use std::fmt::{Debug, Formatter};

/// A document as returned by a store.
///
/// `fields == None` means the read succeeded but nothing is stored at `path`.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDocument {
    pub path: String,
    pub fields: Option<Document>,
}

impl RawDocument {
    pub fn new(path: &str, fields: Option<Document>) -> Self {
        RawDocument {
            path: path.to_string(),
            fields,
        }
    }

    pub fn exists(&self) -> bool {
        self.fields.is_some()
    }

    /// The document id: the last segment of its path.
    pub fn id(&self) -> &str {
        self.path
            .rsplit(PATH_SEPARATOR)
            .next()
            .unwrap_or(&self.path)
    }
}

/// One staged write of a batch.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    Set {
        path: String,
        fields: Document,
        merge: bool,
    },
    Update {
        path: String,
        fields: Document,
    },
    Delete {
        path: String,
    },
}

impl WriteOp {
    pub fn path(&self) -> &str {
        match self {
            WriteOp::Set { path, .. } | WriteOp::Update { path, .. } | WriteOp::Delete { path } => {
                path
            }
        }
    }
}

/// Operations available to the body of a transaction.
///
/// Reads must come before writes; the writes are buffered and committed
/// together when the body returns successfully.
pub trait TransactionContext {
    fn get(&mut self, path: &str) -> SnapshotResult<RawDocument>;
    fn set_fields(&mut self, path: &str, fields: Document, merge: bool) -> SnapshotResult<()>;
    fn update_fields(&mut self, path: &str, fields: Document) -> SnapshotResult<()>;
    fn delete_document(&mut self, path: &str) -> SnapshotResult<()>;
}

/// Body of a transaction. May run more than once when the store retries on
/// contention.
pub type TransactionBody<'a> = dyn FnMut(&mut dyn TransactionContext) -> SnapshotResult<()> + 'a;

/// Receives the current state of a listened document: once on registration,
/// then after every committed change to it.
pub type DocumentCallback = Box<dyn Fn(SnapshotResult<RawDocument>) + Send + Sync>;

/// Receives the current result of a listened query: once on registration,
/// then after every committed change that may affect it.
pub type QueryCallback = Box<dyn Fn(SnapshotResult<Vec<RawDocument>>) + Send + Sync>;

/// A document store.
///
/// Every call either completes with a result or fails with the store's own
/// error; implementations map their native error codes to
/// `ErrorKind::Backend(code)` verbatim, and report a successful read of an
/// empty location as a [RawDocument] without fields.
pub trait DocumentStore: Send + Sync {
    fn get_document(&self, path: &str) -> SnapshotResult<RawDocument>;

    fn get_documents(&self, query: &Query) -> SnapshotResult<Vec<RawDocument>>;

    /// Writes `fields` at `path`. With `merge` the existing fields not named
    /// in `fields` are kept, otherwise the document is replaced.
    fn set_fields(&self, path: &str, fields: Document, merge: bool) -> SnapshotResult<()>;

    /// Updates the named fields of an existing document. Fails with
    /// `ErrorKind::NotFound` when nothing is stored at `path`.
    fn update_fields(&self, path: &str, fields: Document) -> SnapshotResult<()>;

    fn delete_document(&self, path: &str) -> SnapshotResult<()>;

    /// Applies all writes atomically, or none of them.
    fn commit_batch(&self, writes: Vec<WriteOp>) -> SnapshotResult<()>;

    /// Runs `body` and commits its writes atomically. Retrying on contention
    /// is up to the store.
    fn run_transaction(&self, body: &mut TransactionBody<'_>) -> SnapshotResult<()>;

    fn add_document_listener(
        &self,
        path: &str,
        callback: DocumentCallback,
    ) -> SnapshotResult<ListenerRegistration>;

    fn add_query_listener(
        &self,
        query: &Query,
        callback: QueryCallback,
    ) -> SnapshotResult<ListenerRegistration>;
}

type Remover = Box<dyn FnOnce() -> SnapshotResult<()> + Send + Sync>;

/// Handle of a registered listener.
///
/// [ListenerRegistration::remove] stops further deliveries. Dropping the
/// handle does not: the listener stays registered for the store's lifetime.
pub struct ListenerRegistration {
    remover: Option<Remover>,
}

impl ListenerRegistration {
    pub fn new(remover: impl FnOnce() -> SnapshotResult<()> + Send + Sync + 'static) -> Self {
        ListenerRegistration {
            remover: Some(Box::new(remover)),
        }
    }

    /// Deregisters the listener. Calling it again is a no-op.
    pub fn remove(&mut self) -> SnapshotResult<()> {
        match self.remover.take() {
            Some(remover) => remover(),
            None => Ok(()),
        }
    }

    pub fn is_active(&self) -> bool {
        self.remover.is_some()
    }
}

impl Debug for ListenerRegistration {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistration")
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_raw_document_id() {
        let raw = RawDocument::new("mocks/a/children/b", None);
        assert_eq!(raw.id(), "b");
        assert!(!raw.exists());
    }

    #[test]
    fn test_write_op_path() {
        let op = WriteOp::Delete {
            path: "mocks/a".to_string(),
        };
        assert_eq!(op.path(), "mocks/a");
    }

    #[test]
    fn test_registration_removes_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let mut registration = ListenerRegistration::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        assert!(registration.is_active());
        registration.remove().unwrap();
        registration.remove().unwrap();
        assert!(!registration.is_active());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
