// ============================================================================
// ripple-array - Events
// Snapshots and the publish/subscribe contract
// ============================================================================

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::core::changeset::Changeset;

// =============================================================================
// SNAPSHOT
// =============================================================================

/// One published state transition of an observable sequence.
///
/// `previous` is absent only on the initial snapshot delivered at
/// subscription time; every later snapshot's `previous` is the preceding
/// snapshot's `current`. Both buffers are reference-counted value
/// snapshots; observers never alias live storage.
pub struct Snapshot<T> {
    pub previous: Option<Arc<Vec<T>>>,
    pub current: Arc<Vec<T>>,
    pub changeset: Changeset,
}

impl<T> Clone for Snapshot<T> {
    fn clone(&self) -> Self {
        Self {
            previous: self.previous.clone(),
            current: Arc::clone(&self.current),
            changeset: self.changeset.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Snapshot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Snapshot")
            .field("previous", &self.previous)
            .field("current", &self.current)
            .field("changeset", &self.changeset)
            .finish()
    }
}

// =============================================================================
// EVENT
// =============================================================================

/// What an observer receives: a stream of snapshots terminated by a single
/// completion once the publisher goes away.
pub enum Event<T> {
    Snapshot(Snapshot<T>),
    Completed,
}

impl<T> Event<T> {
    /// The snapshot payload, if this is not the terminal event.
    pub fn into_snapshot(self) -> Option<Snapshot<T>> {
        match self {
            Event::Snapshot(snapshot) => Some(snapshot),
            Event::Completed => None,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Event::Completed)
    }
}

impl<T> Clone for Event<T> {
    fn clone(&self) -> Self {
        match self {
            Event::Snapshot(snapshot) => Event::Snapshot(snapshot.clone()),
            Event::Completed => Event::Completed,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Event<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Snapshot(snapshot) => f.debug_tuple("Snapshot").field(snapshot).finish(),
            Event::Completed => write!(f, "Completed"),
        }
    }
}

// =============================================================================
// OBSERVER / BUS CONTRACT
// =============================================================================

/// Observer callback. Receives every published event in publish order, then
/// at most one `Completed`.
pub type Observer<T> = Box<dyn FnMut(Event<T>) + Send>;

/// The broadcast contract an observable sequence publishes through.
///
/// Guarantees required of an implementation:
///
/// - Events reach every live observer in publish order, the same order for
///   all of them.
/// - `close` delivers a terminal [`Event::Completed`] to every live observer;
///   nothing follows it, and observers subscribing afterwards receive
///   `Completed` immediately.
/// - Cancellation is best-effort: after `Subscription::cancel` returns, the
///   observer receives no further events.
pub trait EventBus<T> {
    /// Register an observer. No replay: delivery starts with the next
    /// published event.
    fn subscribe(&self, observer: Observer<T>) -> Subscription;

    /// Deliver an event to every live observer.
    fn publish(&self, event: Event<T>);

    /// Terminate the stream.
    fn close(&self);
}

// =============================================================================
// BROADCAST
// =============================================================================

struct Slot<T> {
    /// Shared with the slot's `Subscription`, which holds no other tie to
    /// the bus; cancellation is a type-erased flag flip.
    cancelled: Arc<AtomicBool>,
    observer: Mutex<Observer<T>>,
}

struct BusInner<T> {
    subscribers: Mutex<Vec<Arc<Slot<T>>>>,
    closed: AtomicBool,
}

/// The crate's multi-observer broadcast channel.
///
/// Observers are invoked synchronously on the publishing thread. The
/// subscriber list lock is released before callbacks run, so an observer may
/// subscribe or cancel (including cancelling itself) without deadlocking.
pub struct Broadcast<T> {
    inner: Arc<BusInner<T>>,
}

impl<T> Broadcast<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(BusInner {
                subscribers: Mutex::new(Vec::new()),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Number of observers that have not cancelled.
    pub fn observer_count(&self) -> usize {
        self.inner
            .subscribers
            .lock()
            .iter()
            .filter(|slot| !slot.cancelled.load(Ordering::Acquire))
            .count()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }
}

impl<T> Default for Broadcast<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Broadcast<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> EventBus<T> for Broadcast<T> {
    fn subscribe(&self, mut observer: Observer<T>) -> Subscription {
        if self.is_closed() {
            observer(Event::Completed);
            return Subscription::completed();
        }
        let cancelled = Arc::new(AtomicBool::new(false));
        let slot = Arc::new(Slot {
            cancelled: Arc::clone(&cancelled),
            observer: Mutex::new(observer),
        });
        self.inner.subscribers.lock().push(slot);
        Subscription::new(move || cancelled.store(true, Ordering::Release))
    }

    fn publish(&self, event: Event<T>) {
        if self.is_closed() {
            return;
        }
        // Snapshot the list, dropping cancelled slots, then invoke with the
        // lock released.
        let live: Vec<Arc<Slot<T>>> = {
            let mut subscribers = self.inner.subscribers.lock();
            subscribers.retain(|slot| !slot.cancelled.load(Ordering::Acquire));
            subscribers.clone()
        };
        for slot in live {
            if !slot.cancelled.load(Ordering::Acquire) {
                let mut observer = slot.observer.lock();
                (*observer)(event.clone());
            }
        }
    }

    fn close(&self) {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let live: Vec<Arc<Slot<T>>> = std::mem::take(&mut *self.inner.subscribers.lock());
        for slot in live {
            if !slot.cancelled.load(Ordering::Acquire) {
                let mut observer = slot.observer.lock();
                (*observer)(Event::Completed);
            }
        }
    }
}

// =============================================================================
// SUBSCRIPTION
// =============================================================================

/// RAII handle to an observer registration.
///
/// Dropping the handle cancels the subscription; call [`detach`] to keep the
/// observer alive for the publisher's lifetime instead.
///
/// [`detach`]: Subscription::detach
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A subscription that was terminated at creation time (the stream had
    /// already completed).
    pub(crate) fn completed() -> Self {
        Self { cancel: None }
    }

    /// Stop receiving events. Best-effort: an event already being delivered
    /// on another thread may still arrive.
    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }

    /// Consume the handle without cancelling; the observer stays subscribed
    /// until the publisher completes.
    pub fn detach(mut self) {
        self.cancel = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("live", &self.cancel.is_some())
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
