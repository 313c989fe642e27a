use crate::backend::RawDocument;
use crate::common::{
    field_value, to_document, Convertible, Sentinel, Timestamp, Value, CREATE_TIME, UPDATE_TIME,
};
use crate::document::{CollectionPath, Document, DocumentPath};
use crate::errors::{ErrorKind, SnapshotError, SnapshotResult};
use crate::schema::{HasTimestamps, SnapshotData};
use crate::store::Store;
use std::fmt::{Debug, Formatter};
use std::ops::{Deref, DerefMut};

/// A typed payload bound to the location of its document.
///
/// The payload is a plain value owned by the snapshot: mutate it through
/// [Snapshot::data_mut] (or through `DerefMut`) and write it back with
/// [Snapshot::create], [Snapshot::update] or [Snapshot::merge]. The path never
/// changes after construction; [Snapshot::replicate] produces a copy at a new
/// location instead.
///
/// `create_time` and `update_time` are only known for snapshots read back from
/// the store, and only for payloads declaring timestamps.
///
/// # Examples
///
/// ```rust
/// use docsnap::doc;
/// use docsnap::document::{CollectionPath, Document};
/// use docsnap::snapshot::Snapshot;
/// use docsnap::store::Store;
///
/// let store = Store::in_memory();
/// let users: CollectionPath<Document> = CollectionPath::new("users");
/// let snapshot = Snapshot::new_in(&store, &users, Some("alice"), doc! { age: 30 });
/// snapshot.create(false).unwrap();
///
/// let read = Snapshot::get(&store, snapshot.path()).unwrap();
/// assert_eq!(read.data(), &doc! { age: 30 });
/// ```
pub struct Snapshot<D> {
    store: Store,
    path: DocumentPath<D>,
    data: D,
    create_time: Option<Timestamp>,
    update_time: Option<Timestamp>,
}

impl<D> Snapshot<D> {
    /// Binds `data` to `path`. The path is validated by the first operation
    /// that uses it.
    pub fn new(store: &Store, path: DocumentPath<D>, data: D) -> Self {
        Snapshot {
            store: store.clone(),
            path,
            data,
            create_time: None,
            update_time: None,
        }
    }

    /// Binds `data` to a document of `collection`. A missing or empty `id` is
    /// replaced by a generated one.
    pub fn new_in(store: &Store, collection: &CollectionPath<D>, id: Option<&str>, data: D) -> Self {
        let path = Self::document_path(store, collection, id);
        Snapshot::new(store, path, data)
    }

    /// Builds the payload from the path it is going to live at, for payloads
    /// that embed their own id.
    pub fn with_factory<F>(store: &Store, path: DocumentPath<D>, factory: F) -> Self
    where
        F: FnOnce(&DocumentPath<D>) -> D,
    {
        let data = factory(&path);
        Snapshot::new(store, path, data)
    }

    /// [Snapshot::with_factory] for a document of `collection`, generating the
    /// id when `id` is missing or empty.
    pub fn with_factory_in<F>(
        store: &Store,
        collection: &CollectionPath<D>,
        id: Option<&str>,
        factory: F,
    ) -> Self
    where
        F: FnOnce(&DocumentPath<D>) -> D,
    {
        let path = Self::document_path(store, collection, id);
        Snapshot::with_factory(store, path, factory)
    }

    fn document_path(store: &Store, collection: &CollectionPath<D>, id: Option<&str>) -> DocumentPath<D> {
        match id {
            Some(id) if !id.is_empty() => collection.document(id),
            _ => collection.new_document_with_length(store.config().auto_id_length()),
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn path(&self) -> &DocumentPath<D> {
        &self.path
    }

    /// The id of the document, i.e. the last segment of its path.
    pub fn id(&self) -> &str {
        self.path.id()
    }

    pub fn data(&self) -> &D {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut D {
        &mut self.data
    }

    pub fn into_data(self) -> D {
        self.data
    }

    /// Copies the snapshot, payload included, to `path` or to the same
    /// location when `path` is `None`.
    ///
    /// Observed timestamps belong to the stored document, so they are kept
    /// only when the copy stays at the same location.
    pub fn replicate(&self, path: Option<DocumentPath<D>>) -> Snapshot<D>
    where
        D: Clone,
    {
        match path {
            Some(path) if path != self.path => Snapshot::new(&self.store, path, self.data.clone()),
            _ => Snapshot {
                store: self.store.clone(),
                path: self.path.clone(),
                data: self.data.clone(),
                create_time: self.create_time,
                update_time: self.update_time,
            },
        }
    }
}

impl<D: SnapshotData> Snapshot<D> {
    /// Decodes a document returned by the store. Fails with `NotExists` when
    /// the read found nothing.
    pub fn from_raw(store: &Store, raw: RawDocument) -> SnapshotResult<Self> {
        let fields = match raw.fields {
            Some(fields) => fields,
            None => {
                log::debug!("No document exists at {}", raw.path);
                return Err(SnapshotError::new(
                    &format!("No document exists at {}", raw.path),
                    ErrorKind::NotExists,
                ));
            }
        };

        let data = D::from_value(&Value::Document(fields.clone()))?;
        let (create_time, update_time) = if D::HAS_TIMESTAMPS {
            (
                Option::<Timestamp>::from_value(field_value(&fields, CREATE_TIME))?,
                Option::<Timestamp>::from_value(field_value(&fields, UPDATE_TIME))?,
            )
        } else {
            (None, None)
        };

        Ok(Snapshot {
            store: store.clone(),
            path: DocumentPath::new(raw.path),
            data,
            create_time,
            update_time,
        })
    }

    /// The field map written by [Snapshot::create]: the encoded payload, with
    /// both timestamps set to the server time when the payload declares
    /// timestamps.
    pub fn extract_fields_for_create(&self) -> SnapshotResult<Document> {
        let mut fields = to_document(&self.data)?;
        if D::HAS_TIMESTAMPS {
            fields.insert_raw(CREATE_TIME.to_string(), Value::Sentinel(Sentinel::ServerTimestamp));
            fields.insert_raw(UPDATE_TIME.to_string(), Value::Sentinel(Sentinel::ServerTimestamp));
        }
        Ok(fields)
    }

    /// The field map written by [Snapshot::update]. Only `updateTime` is set to
    /// the server time.
    pub fn extract_fields_for_update(&self) -> SnapshotResult<Document> {
        let mut fields = to_document(&self.data)?;
        if D::HAS_TIMESTAMPS {
            fields.insert_raw(UPDATE_TIME.to_string(), Value::Sentinel(Sentinel::ServerTimestamp));
        }
        Ok(fields)
    }
}

impl<D: HasTimestamps> Snapshot<D> {
    /// Server time of the document's creation, as last read.
    pub fn create_time(&self) -> Option<Timestamp> {
        self.create_time
    }

    /// Server time of the document's last write, as last read.
    pub fn update_time(&self) -> Option<Timestamp> {
        self.update_time
    }
}

impl<D> Deref for Snapshot<D> {
    type Target = D;

    fn deref(&self) -> &D {
        &self.data
    }
}

impl<D> DerefMut for Snapshot<D> {
    fn deref_mut(&mut self) -> &mut D {
        &mut self.data
    }
}

impl<D: Clone> Clone for Snapshot<D> {
    fn clone(&self) -> Self {
        self.replicate(None)
    }
}

impl<D: PartialEq> PartialEq for Snapshot<D> {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path && self.data == other.data
    }
}

impl<D: Debug> Debug for Snapshot<D> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Snapshot")
            .field("path", &self.path)
            .field("data", &self.data)
            .field("create_time", &self.create_time)
            .field("update_time", &self.update_time)
            .finish()
    }
}
