use crate::backend::{ListenerRegistration, RawDocument};
use crate::document::{CollectionGroup, CollectionPath, DocumentPath};
use crate::errors::SnapshotResult;
use crate::query::{Query, QueryBuilder};
use crate::schema::{FieldNameReferable, SnapshotData};
use crate::snapshot::Snapshot;
use crate::store::Store;

impl<D: SnapshotData> Snapshot<D> {
    /// Reads the document at `path`. Fails with `NotExists` when the read
    /// succeeds but nothing is stored there.
    pub fn get(store: &Store, path: &DocumentPath<D>) -> SnapshotResult<Snapshot<D>> {
        path.validate()?;
        let raw = store.backend().get_document(path.as_str())?;
        Snapshot::from_raw(store, raw)
    }

    /// Runs `query` and decodes every result.
    pub fn query(store: &Store, query: &Query) -> SnapshotResult<Vec<Snapshot<D>>> {
        let raws = store.backend().get_documents(query)?;
        decode_all(store, raws)
    }

    /// Listens to the document at `path`.
    ///
    /// `callback` receives the current state right away and again after each
    /// change. A missing document is delivered as a `NotExists` error.
    pub fn listen<F>(
        store: &Store,
        path: &DocumentPath<D>,
        callback: F,
    ) -> SnapshotResult<ListenerRegistration>
    where
        D: 'static,
        F: Fn(SnapshotResult<Snapshot<D>>) + Send + Sync + 'static,
    {
        path.validate()?;
        let listener_store = store.clone();
        store.backend().add_document_listener(
            path.as_str(),
            Box::new(move |result| {
                callback(result.and_then(|raw| Snapshot::from_raw(&listener_store, raw)))
            }),
        )
    }

    /// Listens to the results of `query`.
    pub fn listen_query<F>(
        store: &Store,
        query: &Query,
        callback: F,
    ) -> SnapshotResult<ListenerRegistration>
    where
        D: 'static,
        F: Fn(SnapshotResult<Vec<Snapshot<D>>>) + Send + Sync + 'static,
    {
        let listener_store = store.clone();
        store.backend().add_query_listener(
            query,
            Box::new(move |result| {
                callback(result.and_then(|raws| decode_all(&listener_store, raws)))
            }),
        )
    }
}

impl<D: SnapshotData + FieldNameReferable> Snapshot<D> {
    /// Reads the documents of `collection` matching the clauses added by
    /// `build`. Clauses naming fields without a wire name are dropped, see
    /// [QueryBuilder].
    ///
    /// ```rust
    /// use docsnap::document::{CollectionPath, Document};
    /// use docsnap::snapshot::Snapshot;
    /// use docsnap::store::Store;
    ///
    /// let store = Store::in_memory();
    /// let all = Snapshot::get_all(&store, &CollectionPath::<Document>::new("users"), |q| {
    ///     q.limit(10);
    /// })
    /// .unwrap();
    /// assert!(all.is_empty());
    /// ```
    pub fn get_all<F>(store: &Store, collection: &CollectionPath<D>, build: F) -> SnapshotResult<Vec<Snapshot<D>>>
    where
        F: FnOnce(&mut QueryBuilder<D>),
    {
        collection.validate()?;
        let query = build_query(Query::collection(collection.as_str()), build);
        Snapshot::query(store, &query)
    }

    /// [Snapshot::get_all] across every collection named like `group`.
    pub fn get_group<F>(store: &Store, group: &CollectionGroup<D>, build: F) -> SnapshotResult<Vec<Snapshot<D>>>
    where
        F: FnOnce(&mut QueryBuilder<D>),
    {
        group.validate()?;
        let query = build_query(Query::collection_group(group.collection_id()), build);
        Snapshot::query(store, &query)
    }

    /// Listens to the documents of `collection` matching the clauses added by
    /// `build`.
    pub fn listen_all<B, F>(
        store: &Store,
        collection: &CollectionPath<D>,
        build: B,
        callback: F,
    ) -> SnapshotResult<ListenerRegistration>
    where
        D: 'static,
        B: FnOnce(&mut QueryBuilder<D>),
        F: Fn(SnapshotResult<Vec<Snapshot<D>>>) + Send + Sync + 'static,
    {
        collection.validate()?;
        let query = build_query(Query::collection(collection.as_str()), build);
        Snapshot::listen_query(store, &query, callback)
    }
}

fn build_query<D, F>(query: Query, build: F) -> Query
where
    D: FieldNameReferable,
    F: FnOnce(&mut QueryBuilder<D>),
{
    let mut builder = QueryBuilder::new(query);
    build(&mut builder);
    if builder.attempted_calls() != builder.resolved_clauses() {
        log::warn!(
            "Query {} dropped {} of {} clauses",
            builder.build(),
            builder.attempted_calls() - builder.resolved_clauses(),
            builder.attempted_calls()
        );
    }
    builder.build()
}

fn decode_all<D: SnapshotData>(store: &Store, raws: Vec<RawDocument>) -> SnapshotResult<Vec<Snapshot<D>>> {
    raws.into_iter()
        .map(|raw| Snapshot::from_raw(store, raw))
        .collect()
}
