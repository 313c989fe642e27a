use crate::backend::ListenerRegistration;
use crate::common::{Convertible, Value};
use crate::document::DocumentPath;
use crate::errors::{ErrorKind, SnapshotError, SnapshotResult};
use crate::schema::SnapshotData;
use crate::snapshot::Snapshot;
use crate::store::Store;
use std::fmt::{Debug, Formatter};

/// A payload field pointing at another document.
///
/// Stored as `Value::Reference(path)`; an unset reference is stored as `Null`.
pub struct Reference<D> {
    path: Option<DocumentPath<D>>,
}

impl<D> Reference<D> {
    pub fn new(path: DocumentPath<D>) -> Self {
        Reference { path: Some(path) }
    }

    pub fn empty() -> Self {
        Reference { path: None }
    }

    pub fn path(&self) -> Option<&DocumentPath<D>> {
        self.path.as_ref()
    }

    pub fn is_set(&self) -> bool {
        self.path.is_some()
    }

    fn require_path(&self) -> SnapshotResult<&DocumentPath<D>> {
        self.path.as_ref().ok_or_else(|| {
            log::error!("Reference is not set");
            SnapshotError::new("Reference does not point at a document", ErrorKind::NotExists)
        })
    }
}

impl<D: SnapshotData> Reference<D> {
    /// Reads the referenced document.
    ///
    /// Fails with `NotExists` when the reference is unset or nothing is stored
    /// at its path.
    pub fn get(&self, store: &Store) -> SnapshotResult<Snapshot<D>> {
        let path = self.require_path()?;
        Snapshot::get(store, path)
    }

    /// Listens to the referenced document. Fails with `NotExists` up front
    /// when the reference is unset.
    pub fn listen<F>(&self, store: &Store, callback: F) -> SnapshotResult<ListenerRegistration>
    where
        D: 'static,
        F: Fn(SnapshotResult<Snapshot<D>>) + Send + Sync + 'static,
    {
        let path = self.require_path()?;
        Snapshot::listen(store, path, callback)
    }
}

impl<D> Convertible for Reference<D> {
    fn to_value(&self) -> SnapshotResult<Value> {
        match &self.path {
            Some(path) => Ok(Value::Reference(path.as_str().to_string())),
            None => Ok(Value::Null),
        }
    }

    fn from_value(value: &Value) -> SnapshotResult<Self> {
        match value {
            Value::Reference(path) => Ok(Reference::new(DocumentPath::new(path.clone()))),
            Value::Null => Ok(Reference::empty()),
            _ => {
                log::error!("Value {} is not a reference", value);
                Err(SnapshotError::new(
                    &format!("Expected reference but found {}", value.type_name()),
                    ErrorKind::DecodingError,
                ))
            }
        }
    }
}

impl<D> Default for Reference<D> {
    fn default() -> Self {
        Reference::empty()
    }
}

impl<D> Clone for Reference<D> {
    fn clone(&self) -> Self {
        Reference {
            path: self.path.clone(),
        }
    }
}

impl<D> PartialEq for Reference<D> {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl<D> Debug for Reference<D> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.path {
            Some(path) => write!(f, "Reference({})", path),
            None => write!(f, "Reference(unset)"),
        }
    }
}

impl<D> From<DocumentPath<D>> for Reference<D> {
    fn from(path: DocumentPath<D>) -> Self {
        Reference::new(path)
    }
}
