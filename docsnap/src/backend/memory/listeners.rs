use crate::backend::memory::query_eval::{execute, in_target};
use crate::backend::memory::transforms::DocumentMap;
use crate::backend::{DocumentCallback, QueryCallback, RawDocument};
use crate::common::{atomic, Atomic, WriteExecutor};
use crate::query::Query;
use basu::error::BasuError;
use basu::event::Event;
use basu::Handle;
use parking_lot::ReentrantMutex;
use std::cell::Cell;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// Published after every commit: the commit sequence, the paths the commit
/// wrote, and the state of the store right after it.
///
/// The bus only matches listeners against the change. Matched listeners are
/// collected on the event and called by [ChangeEvent::deliver_pending] once
/// the bus has returned, so callbacks never run under a bus lock.
#[derive(Clone)]
pub struct ChangeEvent {
    pub(crate) sequence: u64,
    pub(crate) changed: Vec<String>,
    pub(crate) docs: DocumentMap,
    pending: Atomic<Vec<ChangeListener>>,
}

impl ChangeEvent {
    pub(crate) fn new(sequence: u64, changed: Vec<String>, docs: DocumentMap) -> Self {
        ChangeEvent {
            sequence,
            changed,
            docs,
            pending: atomic(Vec::new()),
        }
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn changed_paths(&self) -> &[String] {
        &self.changed
    }

    /// Calls every listener the bus matched, one after the other on the
    /// calling thread.
    pub(crate) fn deliver_pending(&self) {
        let pending = self.pending.write_with(std::mem::take);
        for listener in pending {
            listener.deliver(self.sequence, &self.docs);
        }
    }
}

impl Debug for ChangeEvent {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeEvent")
            .field("sequence", &self.sequence)
            .field("changed", &self.changed)
            .finish()
    }
}

enum Watch {
    Document { path: String, callback: DocumentCallback },
    Query { query: Query, callback: QueryCallback },
}

struct ListenerInner {
    watch: Watch,
    // sequence of the last state handed to the callback
    delivered: ReentrantMutex<Cell<Option<u64>>>,
}

/// A registered document or query listener.
///
/// Clones share the callback and the delivery position.
#[derive(Clone)]
pub struct ChangeListener {
    inner: Arc<ListenerInner>,
}

impl ChangeListener {
    pub(crate) fn document(path: &str, callback: DocumentCallback) -> Self {
        ChangeListener::from_watch(Watch::Document {
            path: path.to_string(),
            callback,
        })
    }

    pub(crate) fn query(query: &Query, callback: QueryCallback) -> Self {
        ChangeListener::from_watch(Watch::Query {
            query: query.clone(),
            callback,
        })
    }

    fn from_watch(watch: Watch) -> Self {
        ChangeListener {
            inner: Arc::new(ListenerInner {
                watch,
                delivered: ReentrantMutex::new(Cell::new(None)),
            }),
        }
    }

    /// Delivers the store state as of commit `sequence`, regardless of what
    /// changed.
    ///
    /// Deliveries to one listener are serialized. A state no newer than the
    /// last one delivered is skipped, so the listener always settles on the
    /// latest commit. A callback may write to the store it listens on: the
    /// nested delivery happens on the same thread and is not blocked.
    pub(crate) fn deliver(&self, sequence: u64, docs: &DocumentMap) {
        let delivered = self.inner.delivered.lock();
        if let Some(last) = delivered.get() {
            if last >= sequence {
                log::debug!("Skipping stale delivery of commit {} to {:?}", sequence, self);
                return;
            }
        }
        delivered.set(Some(sequence));

        match &self.inner.watch {
            Watch::Document { path, callback } => {
                callback(Ok(RawDocument::new(path, docs.get(path).cloned())))
            }
            Watch::Query { query, callback } => callback(execute(docs, query)),
        }
    }

    fn is_affected_by(&self, changed: &[String]) -> bool {
        match &self.inner.watch {
            Watch::Document { path, .. } => changed.iter().any(|c| c == path),
            Watch::Query { query, .. } => changed.iter().any(|c| in_target(c, query.target())),
        }
    }
}

impl Handle<ChangeEvent> for ChangeListener {
    fn handle(&self, event: &Event<ChangeEvent>) -> Result<(), BasuError> {
        let change = &event.data;
        if self.is_affected_by(&change.changed) {
            change.pending.write_with(|pending| pending.push(self.clone()));
        }
        Ok(())
    }
}

impl Debug for ChangeListener {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.inner.watch {
            Watch::Document { path, .. } => write!(f, "ChangeListener(document {})", path),
            Watch::Query { query, .. } => write!(f, "ChangeListener({})", query),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn event(sequence: u64, changed: &[&str], docs: DocumentMap) -> Event<ChangeEvent> {
        Event::new(ChangeEvent::new(
            sequence,
            changed.iter().map(|s| s.to_string()).collect(),
            docs,
        ))
    }

    #[test]
    fn test_document_listener_filters_by_path() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let listener = ChangeListener::document(
            "mocks/a",
            Box::new(move |result| {
                assert!(result.unwrap().exists());
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        let mut docs = DocumentMap::new();
        docs.insert("mocks/a".to_string(), doc! { a: 1 });

        let unrelated = event(1, &["mocks/b"], docs.clone());
        listener.handle(&unrelated).unwrap();
        unrelated.data.deliver_pending();
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        let related = event(2, &["mocks/a"], docs);
        listener.handle(&related).unwrap();
        // handling only queues the listener
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        related.data.deliver_pending();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_query_listener_filters_by_target() {
        let sizes = Arc::new(AtomicUsize::new(0));
        let last = sizes.clone();
        let listener = ChangeListener::query(
            &Query::collection("mocks"),
            Box::new(move |result| {
                last.store(result.unwrap().len(), Ordering::SeqCst);
            }),
        );

        let mut docs = DocumentMap::new();
        docs.insert("mocks/a".to_string(), doc! { a: 1 });
        docs.insert("mocks/b".to_string(), doc! { a: 2 });

        let unrelated = event(1, &["others/a"], docs.clone());
        listener.handle(&unrelated).unwrap();
        unrelated.data.deliver_pending();
        assert_eq!(sizes.load(Ordering::SeqCst), 0);

        let related = event(2, &["mocks/b"], docs);
        listener.handle(&related).unwrap();
        related.data.deliver_pending();
        assert_eq!(sizes.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_older_state_is_skipped() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let listener = ChangeListener::document(
            "mocks/a",
            Box::new(move |result| {
                let fields = result.unwrap().fields.unwrap();
                sink.lock().unwrap().push(fields.get("v").cloned());
            }),
        );

        let mut older = DocumentMap::new();
        older.insert("mocks/a".to_string(), doc! { v: 1 });
        let mut newer = DocumentMap::new();
        newer.insert("mocks/a".to_string(), doc! { v: 2 });

        listener.deliver(5, &newer);
        listener.deliver(4, &older);
        listener.deliver(5, &newer);
        assert_eq!(*seen.lock().unwrap(), vec![Some(crate::common::Value::from(2))]);
    }

    #[test]
    fn test_event_clones_share_pending_listeners() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let listener = ChangeListener::document(
            "mocks/a",
            Box::new(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        let change = ChangeEvent::new(1, vec!["mocks/a".to_string()], DocumentMap::new());
        listener.handle(&Event::new(change.clone())).unwrap();
        change.deliver_pending();
        change.deliver_pending();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
