use crate::common::CHANGE_EVENT;
use crate::errors::{ErrorKind, SnapshotError, SnapshotResult};
use basu::error::BasuError;
use basu::event::Event;
use basu::{EventBus, Handle, HandlerId};
use std::marker::PhantomData;
use std::sync::Arc;

/// Fans change notifications out to registered listeners.
///
/// A thin wrapper around a `basu` event bus bound to a single event type.
/// Publishing with no registered listener is a no-op and never builds the
/// event.
///
/// # Example
///
/// ```ignore
/// let bus: ChangeBus<ChangeEvent, ChangeListener> = ChangeBus::new();
/// let subscriber = bus.register(listener)?;
/// bus.publish(event)?;
/// bus.deregister(subscriber)?;
/// ```
pub struct ChangeBus<E, L> {
    inner: Arc<ChangeBusInner<E, L>>,
}

impl<E, L> Clone for ChangeBus<E, L> {
    fn clone(&self) -> Self {
        ChangeBus {
            inner: self.inner.clone(),
        }
    }
}

impl<E, L> Default for ChangeBus<E, L>
where
    L: Handle<E> + 'static,
    E: Send + Sync,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<E, L> ChangeBus<E, L>
where
    L: Handle<E> + 'static,
    E: Send + Sync,
{
    pub fn new() -> Self {
        ChangeBus {
            inner: Arc::new(ChangeBusInner::new()),
        }
    }

    /// Registers a listener and returns the handle needed to deregister it.
    pub fn register(&self, listener: L) -> SnapshotResult<SubscriberRef> {
        self.inner.register(listener)
    }

    pub fn deregister(&self, subscriber: &SubscriberRef) -> SnapshotResult<()> {
        self.inner.deregister(subscriber)
    }

    /// Hands the event to every registered listener and returns once all of
    /// them have handled it. Listeners may be called in parallel.
    pub fn publish(&self, event: E) -> SnapshotResult<()> {
        self.inner.publish(event)
    }

    /// Drops every registered listener.
    pub fn close(&self) -> SnapshotResult<()> {
        self.inner.close()
    }

    pub fn has_listeners(&self) -> bool {
        self.inner.has_listeners()
    }
}

/// Identifies one registration on a [ChangeBus].
#[derive(Debug, Clone)]
pub struct SubscriberRef {
    pub(crate) inner: HandlerId,
}

impl SubscriberRef {
    pub fn new(inner: HandlerId) -> Self {
        SubscriberRef { inner }
    }
}

struct ChangeBusInner<E, L> {
    event_bus: EventBus<E>,
    phantom_data: PhantomData<L>,
}

impl<E, L> ChangeBusInner<E, L>
where
    L: Handle<E> + 'static,
    E: Send + Sync,
{
    fn new() -> Self {
        ChangeBusInner {
            event_bus: EventBus::new(),
            phantom_data: PhantomData,
        }
    }

    fn register(&self, listener: L) -> SnapshotResult<SubscriberRef> {
        match self.event_bus.subscribe(CHANGE_EVENT, Box::new(listener)) {
            Ok(id) => Ok(SubscriberRef::new(id)),
            Err(e) => Err(to_snapshot_error(e)),
        }
    }

    #[inline]
    fn deregister(&self, subscriber: &SubscriberRef) -> SnapshotResult<()> {
        self.event_bus
            .unsubscribe(CHANGE_EVENT, &subscriber.inner)
            .map_err(to_snapshot_error)
    }

    fn publish(&self, event: E) -> SnapshotResult<()> {
        let handler_count = match self.event_bus.get_handler_count(CHANGE_EVENT) {
            Ok(count) => count,
            Err(BasuError::EventTypeNotFOUND) => return Ok(()),
            Err(e) => return Err(to_snapshot_error(e)),
        };

        if handler_count == 0 {
            return Ok(());
        }

        let basu_event = Event::new(event);
        self.event_bus
            .publish(CHANGE_EVENT, &basu_event)
            .map_err(to_snapshot_error)
    }

    #[inline]
    fn close(&self) -> SnapshotResult<()> {
        self.event_bus.clear().map_err(to_snapshot_error)
    }

    fn has_listeners(&self) -> bool {
        match self.event_bus.get_handler_count(CHANGE_EVENT) {
            Ok(count) => count > 0,
            Err(BasuError::EventTypeNotFOUND) => false,
            Err(e) => {
                log::warn!("Failed to count change listeners: {}", e);
                false
            }
        }
    }
}

/// Maps a `basu` failure onto [ErrorKind::EventError].
pub(crate) fn to_snapshot_error(e: BasuError) -> SnapshotError {
    match e {
        BasuError::EventTypeNotFOUND => SnapshotError::new(
            "Event bus error: no listener is registered for change events",
            ErrorKind::EventError,
        ),
        BasuError::MutexPoisoned => SnapshotError::new(
            "Event bus error: internal mutex poisoned",
            ErrorKind::EventError,
        ),
        BasuError::HandlerError(e) => SnapshotError::new(
            &format!("Change listener failed: {}", e),
            ErrorKind::EventError,
        ),
    }
}
