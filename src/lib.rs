// ============================================================================
// ripple-array - Reactive collection diffing for Rust
// ============================================================================
//
// Two subsystems share one changeset vocabulary:
//
// - `diff` / `diff_with` compute the minimal edit script between two
//   versions of an ordered sequence.
// - `MutableArray` is an observable ordered container whose batched edits
//   publish the same kind of changeset to subscribers.
//
// Either way the contract is identical: applying the changeset to the
// previous sequence (`apply_changeset`) reproduces the current one.
// ============================================================================

//! Observable arrays that publish minimal changesets, plus a move-aware
//! diff engine.
//!
//! # Diffing two sequences
//!
//! ```
//! use ripple_array::{diff_with, apply_changeset};
//!
//! let previous = vec![(1, "ok"), (2, "old"), (3, "ok")];
//! let current = vec![(1, "ok"), (2, "fresh"), (3, "ok"), (4, "new")];
//!
//! // Identify rows by id, compare them by contents.
//! let changeset = diff_with(&previous, &current, |row| row.0, |a, b| a == b);
//!
//! assert_eq!(changeset.inserts, [3].into_iter().collect());
//! assert_eq!(changeset.mutations, [1].into_iter().collect());
//! assert_eq!(apply_changeset(&previous, &current, &changeset), current);
//! ```
//!
//! # Observing an array
//!
//! ```
//! use ripple_array::{Event, MutableArray};
//!
//! let array = MutableArray::from_vec(vec!["a", "b"]);
//! let _sub = array.subscribe(|event| {
//!     if let Event::Snapshot(snapshot) = event {
//!         // Feed snapshot.changeset to a list view, mirror it into
//!         // another collection, or rebuild state from scratch.
//!         let _ = snapshot.changeset;
//!     }
//! });
//!
//! array.modify(|staging| {
//!     staging.push("c");
//!     staging.set(0, "A");
//! });
//! ```

pub mod array;
pub mod core;
pub mod diff;
pub mod events;

// Re-export the whole surface at the crate root for ergonomic access
pub use crate::core::apply::{apply_changeset, insertion_union, removal_union};
pub use crate::core::changeset::{Changeset, Move};
pub use crate::core::index_set::IndexSet;

pub use crate::array::staging::Staging;
pub use crate::array::{MutableArray, Snapshots};

pub use crate::diff::{diff, diff_with};

pub use crate::events::{Broadcast, Event, EventBus, Observer, Snapshot, Subscription};

// =============================================================================
// TESTS
// =============================================================================
