use crate::backend::memory::listeners::{ChangeEvent, ChangeListener};
use crate::backend::memory::query_eval::execute;
use crate::backend::memory::transforms::{apply_write, validate_document_path, DocumentMap};
use crate::backend::{
    DocumentCallback, DocumentStore, ListenerRegistration, QueryCallback, RawDocument,
    TransactionBody, TransactionContext, WriteOp,
};
use crate::common::{
    atomic, Atomic, ChangeBus, ReadExecutor, Timestamp, WriteExecutor, MAX_TRANSACTION_ATTEMPTS,
};
use crate::document::Document;
use crate::errors::{ErrorKind, SnapshotError, SnapshotResult};
use crate::query::Query;
use std::collections::HashMap;
use std::sync::Arc;

/// Source of the server time used for `ServerTimestamp` sentinels.
pub type Clock = Arc<dyn Fn() -> Timestamp + Send + Sync>;

#[derive(Default)]
struct MemoryState {
    docs: DocumentMap,
    // last commit sequence that wrote each path, deletes included
    versions: HashMap<String, u64>,
    sequence: u64,
}

impl MemoryState {
    fn version(&self, path: &str) -> u64 {
        self.versions.get(path).copied().unwrap_or(0)
    }
}

/// An in-process [DocumentStore].
///
/// Writes resolve sentinels the way a hosted document database does, batches
/// and transactions commit atomically, and listeners are notified on the
/// writing thread once a commit is visible. Listener callbacks may write to
/// the backend, register listeners or remove their own registration.
///
/// Clones share the same data.
///
/// ```rust
/// use docsnap::backend::{DocumentStore, MemoryBackend};
/// use docsnap::doc;
///
/// let backend = MemoryBackend::new();
/// backend.set_fields("mocks/a", doc! { count: 1 }, false).unwrap();
/// assert!(backend.get_document("mocks/a").unwrap().exists());
/// ```
#[derive(Clone)]
pub struct MemoryBackend {
    inner: Arc<MemoryBackendInner>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(Timestamp::now))
    }

    /// Creates a backend whose server time comes from `clock`.
    pub fn with_clock(clock: Clock) -> Self {
        MemoryBackend {
            inner: Arc::new(MemoryBackendInner {
                state: atomic(MemoryState::default()),
                clock,
                bus: ChangeBus::new(),
                max_attempts: MAX_TRANSACTION_ATTEMPTS,
            }),
        }
    }

    /// Number of documents currently stored, across all collections.
    pub fn document_count(&self) -> usize {
        self.inner.state.read_with(|state| state.docs.len())
    }

    pub fn has_listeners(&self) -> bool {
        self.inner.bus.has_listeners()
    }
}

impl DocumentStore for MemoryBackend {
    fn get_document(&self, path: &str) -> SnapshotResult<RawDocument> {
        self.inner.get_document(path)
    }

    fn get_documents(&self, query: &Query) -> SnapshotResult<Vec<RawDocument>> {
        self.inner.get_documents(query)
    }

    fn set_fields(&self, path: &str, fields: Document, merge: bool) -> SnapshotResult<()> {
        self.inner.commit(
            vec![WriteOp::Set {
                path: path.to_string(),
                fields,
                merge,
            }],
            None,
        )?;
        Ok(())
    }

    fn update_fields(&self, path: &str, fields: Document) -> SnapshotResult<()> {
        self.inner.commit(
            vec![WriteOp::Update {
                path: path.to_string(),
                fields,
            }],
            None,
        )?;
        Ok(())
    }

    fn delete_document(&self, path: &str) -> SnapshotResult<()> {
        self.inner.commit(
            vec![WriteOp::Delete {
                path: path.to_string(),
            }],
            None,
        )?;
        Ok(())
    }

    fn commit_batch(&self, writes: Vec<WriteOp>) -> SnapshotResult<()> {
        self.inner.commit(writes, None)?;
        Ok(())
    }

    fn run_transaction(&self, body: &mut TransactionBody<'_>) -> SnapshotResult<()> {
        self.inner.run_transaction(body)
    }

    fn add_document_listener(
        &self,
        path: &str,
        callback: DocumentCallback,
    ) -> SnapshotResult<ListenerRegistration> {
        validate_document_path(path)?;
        self.inner.register(ChangeListener::document(path, callback))
    }

    fn add_query_listener(
        &self,
        query: &Query,
        callback: QueryCallback,
    ) -> SnapshotResult<ListenerRegistration> {
        self.inner.register(ChangeListener::query(query, callback))
    }
}

struct MemoryBackendInner {
    state: Atomic<MemoryState>,
    clock: Clock,
    bus: ChangeBus<ChangeEvent, ChangeListener>,
    max_attempts: u32,
}

impl MemoryBackendInner {
    fn get_document(&self, path: &str) -> SnapshotResult<RawDocument> {
        validate_document_path(path)?;
        let fields = self.state.read_with(|state| state.docs.get(path).cloned());
        Ok(RawDocument::new(path, fields))
    }

    fn get_documents(&self, query: &Query) -> SnapshotResult<Vec<RawDocument>> {
        let docs = self.state.read_with(|state| state.docs.clone());
        execute(&docs, query)
    }

    /// Applies `writes` atomically. With `expected` versions, the commit is
    /// skipped (returning `false`) if any of those paths changed since.
    fn commit(&self, writes: Vec<WriteOp>, expected: Option<&HashMap<String, u64>>) -> SnapshotResult<bool> {
        let now = (self.clock)();
        let event = self.state.write_with(|state| -> SnapshotResult<Option<ChangeEvent>> {
            if let Some(expected) = expected {
                if expected.iter().any(|(path, version)| state.version(path) != *version) {
                    return Ok(None);
                }
            }

            let mut docs = state.docs.clone();
            for write in &writes {
                apply_write(&mut docs, write, now)?;
            }

            state.sequence += 1;
            let sequence = state.sequence;
            let changed: Vec<String> = writes.iter().map(|w| w.path().to_string()).collect();
            for path in &changed {
                state.versions.insert(path.clone(), sequence);
            }
            state.docs = docs;

            Ok(Some(ChangeEvent::new(sequence, changed, state.docs.clone())))
        })?;

        match event {
            Some(event) => {
                if let Err(e) = self.bus.publish(event.clone()) {
                    log::warn!("Failed to notify change listeners: {}", e);
                }
                event.deliver_pending();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn run_transaction(&self, body: &mut TransactionBody<'_>) -> SnapshotResult<()> {
        for attempt in 1..=self.max_attempts {
            let mut context = MemoryTransaction::new(self);
            body(&mut context)?;

            let MemoryTransaction { reads, writes, .. } = context;
            if self.commit(writes, Some(&reads))? {
                return Ok(());
            }
            log::debug!("Transaction attempt {} hit contention, retrying", attempt);
        }

        log::error!("Transaction aborted after {} attempts", self.max_attempts);
        Err(SnapshotError::new(
            &format!("Transaction aborted after {} attempts", self.max_attempts),
            ErrorKind::TransactionAborted,
        ))
    }

    fn register(&self, listener: ChangeListener) -> SnapshotResult<ListenerRegistration> {
        let subscriber = self.bus.register(listener.clone())?;

        // initial delivery; a commit racing with this read is ordered by sequence
        let (sequence, docs) = self
            .state
            .read_with(|state| (state.sequence, state.docs.clone()));
        listener.deliver(sequence, &docs);

        let bus = self.bus.clone();
        Ok(ListenerRegistration::new(move || bus.deregister(&subscriber)))
    }
}

struct MemoryTransaction<'a> {
    backend: &'a MemoryBackendInner,
    reads: HashMap<String, u64>,
    writes: Vec<WriteOp>,
}

impl<'a> MemoryTransaction<'a> {
    fn new(backend: &'a MemoryBackendInner) -> Self {
        MemoryTransaction {
            backend,
            reads: HashMap::new(),
            writes: Vec::new(),
        }
    }

    fn stage(&mut self, write: WriteOp) -> SnapshotResult<()> {
        validate_document_path(write.path())?;
        self.writes.push(write);
        Ok(())
    }
}

impl TransactionContext for MemoryTransaction<'_> {
    fn get(&mut self, path: &str) -> SnapshotResult<RawDocument> {
        if !self.writes.is_empty() {
            log::error!("Transaction read of {} after a write", path);
            return Err(SnapshotError::new(
                "Transactions require all reads to be executed before all writes",
                ErrorKind::InvalidOperation,
            ));
        }
        validate_document_path(path)?;
        let (fields, version) = self
            .backend
            .state
            .read_with(|state| (state.docs.get(path).cloned(), state.version(path)));
        self.reads.entry(path.to_string()).or_insert(version);
        Ok(RawDocument::new(path, fields))
    }

    fn set_fields(&mut self, path: &str, fields: Document, merge: bool) -> SnapshotResult<()> {
        self.stage(WriteOp::Set {
            path: path.to_string(),
            fields,
            merge,
        })
    }

    fn update_fields(&mut self, path: &str, fields: Document) -> SnapshotResult<()> {
        self.stage(WriteOp::Update {
            path: path.to_string(),
            fields,
        })
    }

    fn delete_document(&mut self, path: &str) -> SnapshotResult<()> {
        self.stage(WriteOp::Delete {
            path: path.to_string(),
        })
    }
}
