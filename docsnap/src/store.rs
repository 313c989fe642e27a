//! The store handle every snapshot operation goes through.

use crate::backend::{DocumentStore, MemoryBackend};
use crate::common::DEFAULT_AUTO_ID_LENGTH;
use crate::errors::{ErrorKind, SnapshotError, SnapshotResult};
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// Settings shared by every snapshot created through a [Store].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    auto_id_length: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            auto_id_length: DEFAULT_AUTO_ID_LENGTH,
        }
    }
}

impl StoreConfig {
    /// Length of the ids generated for documents created without one.
    pub fn auto_id_length(&self) -> usize {
        self.auto_id_length
    }

    pub(crate) fn set_auto_id_length(&mut self, length: usize) -> SnapshotResult<()> {
        if length == 0 {
            log::error!("Auto id length must be positive");
            return Err(SnapshotError::new(
                "Auto id length must be greater than zero",
                ErrorKind::InvalidOperation,
            ));
        }
        self.auto_id_length = length;
        Ok(())
    }
}

/// A handle to a document store.
///
/// Cheap to clone; clones share the backend and the configuration. A store is
/// passed explicitly to every snapshot, so tests can hand each case its own
/// [MemoryBackend].
///
/// # Examples
///
/// ```rust
/// use docsnap::store::Store;
///
/// let store = Store::in_memory();
/// let custom = Store::builder().auto_id_length(12).build().unwrap();
/// assert_eq!(custom.config().auto_id_length(), 12);
/// ```
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    backend: Arc<dyn DocumentStore>,
    config: StoreConfig,
}

impl Store {
    /// Creates a store over `backend` with the default configuration.
    pub fn new(backend: impl DocumentStore + 'static) -> Self {
        Store::from_parts(Arc::new(backend), StoreConfig::default())
    }

    /// Creates a store over a fresh [MemoryBackend].
    pub fn in_memory() -> Self {
        Store::new(MemoryBackend::new())
    }

    pub fn builder() -> StoreBuilder {
        StoreBuilder::new()
    }

    fn from_parts(backend: Arc<dyn DocumentStore>, config: StoreConfig) -> Self {
        Store {
            inner: Arc::new(StoreInner { backend, config }),
        }
    }

    pub fn backend(&self) -> &dyn DocumentStore {
        self.inner.backend.as_ref()
    }

    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }
}

impl Debug for Store {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("config", &self.inner.config)
            .finish()
    }
}

/// Builder for a [Store].
///
/// Configuration errors are kept until [StoreBuilder::build], which reports
/// the first one.
#[derive(Default)]
pub struct StoreBuilder {
    error: Option<SnapshotError>,
    backend: Option<Arc<dyn DocumentStore>>,
    config: StoreConfig,
}

impl StoreBuilder {
    pub fn new() -> Self {
        StoreBuilder::default()
    }

    /// Sets the backend. Defaults to a fresh [MemoryBackend].
    pub fn backend(mut self, backend: impl DocumentStore + 'static) -> Self {
        self.backend = Some(Arc::new(backend));
        self
    }

    /// Sets the length of generated document ids; must be positive.
    pub fn auto_id_length(mut self, length: usize) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.config.set_auto_id_length(length) {
                self.error = Some(e);
            }
        }
        self
    }

    pub fn build(self) -> SnapshotResult<Store> {
        if let Some(error) = self.error {
            return Err(error);
        }
        let backend = match self.backend {
            Some(backend) => backend,
            None => Arc::new(MemoryBackend::new()),
        };
        Ok(Store::from_parts(backend, self.config))
    }
}
