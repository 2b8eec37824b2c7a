// ============================================================================
// ripple-array - Mutable observable array
// An ordered container that publishes the net changeset of each batch
// ============================================================================

pub mod staging;

use std::cell::RefCell;
use std::ops::Range;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::core::changeset::Changeset;
use crate::events::{Broadcast, Event, EventBus, Observer, Snapshot, Subscription};

pub use staging::Staging;

// =============================================================================
// RE-ENTRANCY GUARD
// =============================================================================

thread_local! {
    /// Arrays whose write lock this thread currently holds, by shared-state
    /// address. Observers run while the lock is held, so re-entering
    /// `modify` or `subscribe` on the same array from an observer would
    /// deadlock; the registry turns that into a panic at the point of the
    /// mistake.
    static HELD_WRITE_LOCKS: RefCell<Vec<usize>> = RefCell::new(Vec::new());
}

struct WriteGuard {
    key: usize,
}

impl WriteGuard {
    fn enter(key: usize) -> Self {
        HELD_WRITE_LOCKS.with(|held| {
            let mut held = held.borrow_mut();
            assert!(
                !held.contains(&key),
                "array write lock re-entered: modify or subscribe called from \
                 within the same array's own observer"
            );
            held.push(key);
        });
        Self { key }
    }
}

impl Drop for WriteGuard {
    fn drop(&mut self) {
        HELD_WRITE_LOCKS.with(|held| {
            let mut held = held.borrow_mut();
            if let Some(at) = held.iter().rposition(|k| *k == self.key) {
                held.remove(at);
            }
        });
    }
}

// =============================================================================
// SHARED STATE
// =============================================================================

struct Shared<T> {
    /// Copy-on-write storage: readers clone the Arc and never contend with a
    /// batch in progress.
    storage: RwLock<Arc<Vec<T>>>,
    /// Serialises batches and subscriptions; snapshots publish while it is
    /// held, which is what makes consecutive frames chain.
    write: Mutex<()>,
    bus: Broadcast<T>,
}

impl<T> Shared<T> {
    fn key(&self) -> usize {
        self as *const Self as usize
    }

    fn contents(&self) -> Arc<Vec<T>> {
        Arc::clone(&self.storage.read())
    }

    fn subscribe(&self, mut observer: Observer<T>) -> Subscription {
        let _guard = WriteGuard::enter(self.key());
        let _write = self.write.lock();
        let current = self.contents();
        let changeset = Changeset::initial(current.len());
        observer(Event::Snapshot(Snapshot {
            previous: None,
            current,
            changeset,
        }));
        // On a closed bus this immediately completes the observer.
        self.bus.subscribe(observer)
    }
}

// =============================================================================
// MUTABLE ARRAY
// =============================================================================

/// An observable ordered container.
///
/// All edits happen inside [`modify`](MutableArray::modify), which hands the
/// closure an exclusively-owned [`Staging`] view, derives the net
/// [`Changeset`] of the batch, swaps the storage, and publishes a
/// [`Snapshot`] to every subscriber, all under one write lock, so every
/// observer sees the same totally-ordered stream of frames and each frame's
/// `previous` is the last frame's `current`.
///
/// Reads never take the write lock: storage is a reference-counted buffer
/// replaced wholesale at commit, and readers hold a value snapshot.
///
/// # Example
///
/// ```
/// use ripple_array::{Event, MutableArray};
///
/// let array = MutableArray::from_vec(vec![1, 2, 3]);
///
/// let seen = std::sync::Arc::new(parking_lot::Mutex::new(Vec::new()));
/// let seen_in = std::sync::Arc::clone(&seen);
/// let _sub = array.subscribe(move |event| {
///     if let Event::Snapshot(snapshot) = event {
///         seen_in.lock().push(snapshot.changeset.clone());
///     }
/// });
///
/// array.modify(|staging| {
///     staging.insert(1, 100);
///     staging.remove(3);
/// });
///
/// let changesets = seen.lock();
/// assert_eq!(changesets[0].inserts.ranges(), &[0..3]); // initial snapshot
/// assert_eq!(changesets[1].inserts, [1].into_iter().collect());
/// assert_eq!(changesets[1].removals, [2].into_iter().collect());
/// ```
pub struct MutableArray<T> {
    shared: Arc<Shared<T>>,
}

impl<T: Clone + Send + Sync + 'static> MutableArray<T> {
    /// Create an empty array.
    pub fn new() -> Self {
        Self::from_vec(Vec::new())
    }

    /// Create an array owning `values`.
    pub fn from_vec(values: Vec<T>) -> Self {
        Self {
            shared: Arc::new(Shared {
                storage: RwLock::new(Arc::new(values)),
                write: Mutex::new(()),
                bus: Broadcast::new(),
            }),
        }
    }

    // =========================================================================
    // READS
    // =========================================================================

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.shared.storage.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clone of the element at `index`.
    pub fn get(&self, index: usize) -> Option<T> {
        self.shared.storage.read().get(index).cloned()
    }

    /// A value snapshot of the current contents. Cheap: bumps a reference
    /// count, copies nothing.
    pub fn contents(&self) -> Arc<Vec<T>> {
        self.shared.contents()
    }

    /// Run `f` against a value snapshot of the contents.
    pub fn with<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        let contents = self.shared.contents();
        f(&contents)
    }

    // =========================================================================
    // MUTATION
    // =========================================================================

    /// Run a batch of edits and publish their net effect as one snapshot.
    ///
    /// The closure gets an exclusively-owned [`Staging`] view; when it
    /// returns, the staged buffer becomes the array's contents and the
    /// accumulated changeset is published. A batch that nets out to no change
    /// publishes nothing.
    ///
    /// # Panics
    ///
    /// Panics when called from within one of this array's own observers,
    /// which would deadlock on the write lock otherwise.
    pub fn modify<R>(&self, f: impl FnOnce(&mut Staging<T>) -> R) -> R {
        let _guard = WriteGuard::enter(self.shared.key());
        let _write = self.shared.write.lock();

        let previous = self.shared.contents();
        let mut staging = Staging::new((*previous).clone());
        let result = f(&mut staging);
        let (buffer, changeset) = staging.into_parts();
        if changeset.is_empty() {
            return result;
        }

        let current = Arc::new(buffer);
        *self.shared.storage.write() = Arc::clone(&current);
        self.shared.bus.publish(Event::Snapshot(Snapshot {
            previous: Some(previous),
            current,
            changeset,
        }));
        result
    }

    /// Append one element.
    pub fn push(&self, item: T) {
        self.modify(|staging| staging.push(item));
    }

    /// Insert one element at `index`.
    pub fn insert(&self, index: usize, item: T) {
        self.modify(|staging| staging.insert(index, item));
    }

    /// Remove and return the element at `index`.
    pub fn remove(&self, index: usize) -> T {
        self.modify(|staging| staging.remove(index))
    }

    /// Overwrite the element at `index`, returning the previous value.
    pub fn set(&self, index: usize, item: T) -> T {
        self.modify(|staging| staging.set(index, item))
    }

    /// Append every element of `items`.
    pub fn extend(&self, items: impl IntoIterator<Item = T>) {
        self.modify(|staging| staging.extend(items));
    }

    /// Replace the elements in `range` with `items`.
    pub fn replace_range(&self, range: Range<usize>, items: impl IntoIterator<Item = T>) {
        self.modify(|staging| staging.replace(range, items));
    }

    /// Replace the whole contents, publishing a full-replacement changeset.
    pub fn replace_all(&self, items: impl IntoIterator<Item = T>) {
        self.modify(|staging| staging.reset(items));
    }

    /// Remove every element.
    pub fn clear(&self) {
        self.modify(|staging| staging.remove_all());
    }

    // =========================================================================
    // OBSERVATION
    // =========================================================================

    /// Subscribe to this array's snapshots.
    ///
    /// The observer synchronously receives an initial snapshot framing the
    /// current contents as all-inserts (`previous` absent), then every
    /// published snapshot in order, then `Completed` when the array drops.
    pub fn subscribe(&self, observer: impl FnMut(Event<T>) + Send + 'static) -> Subscription {
        self.shared.subscribe(Box::new(observer))
    }

    /// A producer handle that can hand out subscriptions independently of the
    /// array's lifetime.
    ///
    /// Subscribing through the handle after the array has dropped still
    /// delivers the final contents as an initial snapshot, immediately
    /// followed by `Completed`.
    pub fn stream(&self) -> Snapshots<T> {
        Snapshots {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Default for MutableArray<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + Sync + 'static> FromIterator<T> for MutableArray<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_vec(iter.into_iter().collect())
    }
}

impl<T> Drop for MutableArray<T> {
    fn drop(&mut self) {
        self.shared.bus.close();
    }
}

// =============================================================================
// SNAPSHOTS (PRODUCER HANDLE)
// =============================================================================

/// A subscription factory for one [`MutableArray`], detached from the
/// array's ownership.
pub struct Snapshots<T> {
    shared: Arc<Shared<T>>,
}

impl<T: Clone + Send + Sync + 'static> Snapshots<T> {
    /// Subscribe exactly as [`MutableArray::subscribe`] does.
    pub fn subscribe(&self, observer: impl FnMut(Event<T>) + Send + 'static) -> Subscription {
        self.shared.subscribe(Box::new(observer))
    }
}

impl<T> Clone for Snapshots<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
