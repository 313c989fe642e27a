use crate::backend::WriteOp;
use crate::errors::SnapshotResult;
use crate::schema::SnapshotData;
use crate::snapshot::Snapshot;
use crate::store::Store;

type StagedWrite<'a> = Box<dyn FnOnce() -> SnapshotResult<WriteOp> + 'a>;

/// A set of snapshot writes committed atomically.
///
/// Staging only records the write. Payloads are encoded by [Batch::commit],
/// and if any of them fails to encode nothing is sent.
///
/// # Examples
///
/// ```rust
/// use docsnap::doc;
/// use docsnap::document::DocumentPath;
/// use docsnap::snapshot::Snapshot;
/// use docsnap::store::Store;
///
/// let store = Store::in_memory();
/// let a = Snapshot::new(&store, DocumentPath::new("mocks/a"), doc! { n: 1 });
/// let b = Snapshot::new(&store, DocumentPath::new("mocks/b"), doc! { n: 2 });
///
/// let mut batch = store.batch();
/// batch.create(&a, false).create(&b, false);
/// batch.commit().unwrap();
/// ```
pub struct Batch<'a> {
    store: Store,
    staged: Vec<StagedWrite<'a>>,
}

impl<'a> Batch<'a> {
    pub fn new(store: &Store) -> Self {
        Batch {
            store: store.clone(),
            staged: Vec::new(),
        }
    }

    /// Stages [Snapshot::create].
    pub fn create<D: SnapshotData>(&mut self, snapshot: &'a Snapshot<D>, merge: bool) -> &mut Self {
        self.staged.push(Box::new(move || {
            snapshot.path().validate()?;
            Ok(WriteOp::Set {
                path: snapshot.path().as_str().to_string(),
                fields: snapshot.extract_fields_for_create()?,
                merge,
            })
        }));
        self
    }

    /// Stages [Snapshot::update].
    pub fn update<D: SnapshotData>(&mut self, snapshot: &'a Snapshot<D>) -> &mut Self {
        self.staged.push(Box::new(move || {
            snapshot.path().validate()?;
            Ok(WriteOp::Update {
                path: snapshot.path().as_str().to_string(),
                fields: snapshot.extract_fields_for_update()?,
            })
        }));
        self
    }

    /// Stages [Snapshot::delete].
    pub fn delete<D>(&mut self, snapshot: &'a Snapshot<D>) -> &mut Self {
        self.staged.push(Box::new(move || {
            snapshot.path().validate()?;
            Ok(WriteOp::Delete {
                path: snapshot.path().as_str().to_string(),
            })
        }));
        self
    }

    pub fn len(&self) -> usize {
        self.staged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }

    /// Encodes every staged write and applies them all, or none of them.
    pub fn commit(self) -> SnapshotResult<()> {
        let writes = self
            .staged
            .into_iter()
            .map(|stage| stage())
            .collect::<SnapshotResult<Vec<WriteOp>>>()?;
        log::debug!("Committing batch of {} writes", writes.len());
        self.store.backend().commit_batch(writes)
    }
}

impl Store {
    /// Starts a [Batch] on this store.
    pub fn batch<'a>(&self) -> Batch<'a> {
        Batch::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Convertible;
    use crate::common::Value;
    use crate::doc;
    use crate::document::{Document, DocumentPath};
    use crate::errors::{ErrorKind, SnapshotError};

    struct Unencodable;

    impl Convertible for Unencodable {
        fn to_value(&self) -> SnapshotResult<Value> {
            Err(SnapshotError::new("cannot encode", ErrorKind::EncodingError))
        }

        fn from_value(_value: &Value) -> SnapshotResult<Self> {
            Ok(Unencodable)
        }
    }

    impl SnapshotData for Unencodable {}

    #[test]
    fn test_commit_applies_all() {
        let store = Store::in_memory();
        let existing = Snapshot::new(&store, DocumentPath::new("mocks/old"), doc! { a: 1 });
        existing.create(false).unwrap();

        let a = Snapshot::new(&store, DocumentPath::new("mocks/a"), doc! { a: 1 });
        let mut batch = store.batch();
        batch.create(&a, false).delete(&existing);
        assert_eq!(batch.len(), 2);
        batch.commit().unwrap();

        assert!(Snapshot::<Document>::get(&store, a.path()).is_ok());
        assert!(Snapshot::<Document>::get(&store, existing.path()).is_err());
    }

    #[test]
    fn test_update_encodes_current_payload() {
        let store = Store::in_memory();
        let mut a = Snapshot::new(&store, DocumentPath::new("mocks/a"), doc! { a: 1 });
        {
            let mut batch = store.batch();
            batch.create(&a, false);
            batch.commit().unwrap();
        }
        a.data_mut().put("a", 2).unwrap();
        let mut batch = store.batch();
        batch.update(&a);
        batch.commit().unwrap();

        let read = Snapshot::<Document>::get(&store, a.path()).unwrap();
        assert_eq!(read.data(), &doc! { a: 2 });
    }

    #[test]
    fn test_encoding_failure_sends_nothing() {
        let store = Store::in_memory();
        let good = Snapshot::new(&store, DocumentPath::new("mocks/a"), doc! { a: 1 });
        let bad = Snapshot::new(&store, DocumentPath::new("mocks/b"), Unencodable);

        let mut batch = store.batch();
        batch.create(&good, false).create(&bad, false);
        let err = batch.commit().unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::EncodingError);
        assert!(Snapshot::<Document>::get(&store, good.path()).is_err());
    }

    #[test]
    fn test_failed_update_rolls_back_batch() {
        let store = Store::in_memory();
        let a = Snapshot::new(&store, DocumentPath::new("mocks/a"), doc! { a: 1 });
        let missing = Snapshot::new(&store, DocumentPath::new("mocks/missing"), doc! { a: 1 });

        let mut batch = store.batch();
        batch.create(&a, false).update(&missing);
        assert_eq!(batch.commit().unwrap_err().kind(), &ErrorKind::NotFound);
        assert!(Snapshot::<Document>::get(&store, a.path()).is_err());
    }
}
