use crate::backend::TransactionContext;
use crate::document::DocumentPath;
use crate::errors::{ErrorKind, SnapshotError, SnapshotResult};
use crate::schema::SnapshotData;
use crate::snapshot::Snapshot;
use crate::store::Store;

/// Snapshot operations inside a transaction body.
///
/// Reads must come before writes. Writes are buffered by the backend and
/// committed when the body returns `Ok`.
pub struct Transaction<'a> {
    store: &'a Store,
    context: &'a mut dyn TransactionContext,
}

impl<'a> Transaction<'a> {
    pub fn get<D: SnapshotData>(&mut self, path: &DocumentPath<D>) -> SnapshotResult<Snapshot<D>> {
        path.validate()?;
        let raw = self.context.get(path.as_str())?;
        Snapshot::from_raw(self.store, raw)
    }

    pub fn create<D: SnapshotData>(&mut self, snapshot: &Snapshot<D>, merge: bool) -> SnapshotResult<()> {
        snapshot.path().validate()?;
        let fields = snapshot.extract_fields_for_create()?;
        self.context
            .set_fields(snapshot.path().as_str(), fields, merge)
    }

    pub fn update<D: SnapshotData>(&mut self, snapshot: &Snapshot<D>) -> SnapshotResult<()> {
        snapshot.path().validate()?;
        let fields = snapshot.extract_fields_for_update()?;
        self.context.update_fields(snapshot.path().as_str(), fields)
    }

    pub fn delete<D>(&mut self, snapshot: &Snapshot<D>) -> SnapshotResult<()> {
        snapshot.path().validate()?;
        self.context.delete_document(snapshot.path().as_str())
    }
}

/// Runs `body` in a transaction on `store` and returns its value.
///
/// The backend may run `body` more than once on contention, so it must not
/// have side effects besides the transaction's own operations. An error
/// returned by `body` aborts the transaction and is returned as is.
///
/// # Examples
///
/// ```rust
/// use docsnap::doc;
/// use docsnap::document::{Document, DocumentPath};
/// use docsnap::snapshot::{run_transaction, Snapshot};
/// use docsnap::store::Store;
///
/// let store = Store::in_memory();
/// let path: DocumentPath<Document> = DocumentPath::new("mocks/a");
/// Snapshot::new(&store, path.clone(), doc! { n: 1 }).create(false).unwrap();
///
/// let n = run_transaction(&store, |txn| {
///     let mut snapshot = txn.get(&path)?;
///     snapshot.data_mut().put("n", 2)?;
///     txn.update(&snapshot)?;
///     Ok(2)
/// })
/// .unwrap();
/// assert_eq!(n, 2);
/// ```
pub fn run_transaction<T, F>(store: &Store, mut body: F) -> SnapshotResult<T>
where
    F: FnMut(&mut Transaction<'_>) -> SnapshotResult<T>,
{
    let mut output = None;
    store
        .backend()
        .run_transaction(&mut |context: &mut dyn TransactionContext| {
            let mut txn = Transaction { store, context };
            output = Some(body(&mut txn)?);
            Ok(())
        })?;

    output.ok_or_else(|| {
        log::error!("Transaction committed without running its body");
        SnapshotError::new(
            "Transaction committed without running its body",
            ErrorKind::InternalError,
        )
    })
}

impl Store {
    /// Shorthand for [run_transaction] on this store.
    pub fn run_transaction<T, F>(&self, body: F) -> SnapshotResult<T>
    where
        F: FnMut(&mut Transaction<'_>) -> SnapshotResult<T>,
    {
        run_transaction(self, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Value;
    use crate::doc;
    use crate::document::Document;

    fn path(p: &str) -> DocumentPath<Document> {
        DocumentPath::new(p)
    }

    #[test]
    fn test_transfer_between_documents() {
        let store = Store::in_memory();
        Snapshot::new(&store, path("accounts/a"), doc! { balance: 10 }).create(false).unwrap();
        Snapshot::new(&store, path("accounts/b"), doc! { balance: 0 }).create(false).unwrap();

        store
            .run_transaction(|txn| {
                let mut from = txn.get(&path("accounts/a"))?;
                let mut to = txn.get(&path("accounts/b"))?;
                from.data_mut().put("balance", 6)?;
                to.data_mut().put("balance", 4)?;
                txn.update(&from)?;
                txn.update(&to)
            })
            .unwrap();

        let a = Snapshot::get(&store, &path("accounts/a")).unwrap();
        let b = Snapshot::get(&store, &path("accounts/b")).unwrap();
        assert_eq!(a.data().get("balance"), Some(&Value::from(6)));
        assert_eq!(b.data().get("balance"), Some(&Value::from(4)));
    }

    #[test]
    fn test_get_missing_aborts_with_not_exists() {
        let store = Store::in_memory();
        let err = run_transaction(&store, |txn| {
            txn.get(&path("mocks/a"))?;
            Ok(())
        })
        .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::NotExists);
    }

    #[test]
    fn test_body_error_discards_writes() {
        let store = Store::in_memory();
        let snapshot = Snapshot::new(&store, path("mocks/a"), doc! { a: 1 });
        let result: SnapshotResult<()> = run_transaction(&store, |txn| {
            txn.create(&snapshot, false)?;
            Err(SnapshotError::new("stop", ErrorKind::InvalidOperation))
        });
        assert_eq!(result.unwrap_err().kind(), &ErrorKind::InvalidOperation);
        assert!(Snapshot::get(&store, snapshot.path()).is_err());
    }

    #[test]
    fn test_create_and_delete() {
        let store = Store::in_memory();
        let old = Snapshot::new(&store, path("mocks/old"), doc! { a: 1 });
        old.create(false).unwrap();
        let new = Snapshot::new(&store, path("mocks/new"), doc! { a: 2 });

        store
            .run_transaction(|txn| {
                txn.delete(&old)?;
                txn.create(&new, false)
            })
            .unwrap();

        assert!(Snapshot::get(&store, old.path()).is_err());
        assert!(Snapshot::get(&store, new.path()).is_ok());
    }
}
