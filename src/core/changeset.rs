// ============================================================================
// ripple-array - Changeset
// The four-part description of how one ordered sequence becomes another
// ============================================================================

use crate::core::index_set::IndexSet;

// =============================================================================
// MOVE
// =============================================================================

/// One element identified across two versions of a sequence, occupying
/// different positions.
///
/// `source` is an offset in the *previous* frame, before any edit applies.
/// `destination` is an offset in the *current* frame, after all edits apply.
/// `is_mutated` records that the element also changed value on the way.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Move {
    pub source: usize,
    pub destination: usize,
    pub is_mutated: bool,
}

impl Move {
    pub fn new(source: usize, destination: usize) -> Self {
        Self {
            source,
            destination,
            is_mutated: false,
        }
    }

    pub fn mutated(source: usize, destination: usize) -> Self {
        Self {
            source,
            destination,
            is_mutated: true,
        }
    }
}

// =============================================================================
// CHANGESET
// =============================================================================

/// The net difference between two versions of an ordered sequence.
///
/// Offsets live in three frames:
///
/// - `inserts` are positions in the *current* sequence: where the inserted
///   elements ended up.
/// - `removals` are positions in the *previous* sequence.
/// - `mutations` are position-invariant: the element sits at the same offset
///   in both versions, only its value changed. An element that changed value
///   *and* position is a [`Move`] with `is_mutated` set, never a mutation.
/// - `moves` pair a previous-frame source with a current-frame destination.
///
/// What a changeset *means* is defined operationally by
/// [`apply_changeset`](crate::apply_changeset): applying it to the previous
/// sequence yields the current one.
///
/// # Example
///
/// ```
/// use ripple_array::{diff, apply_changeset};
///
/// let previous = vec![1, 2, 3];
/// let current = vec![0, 1, 3];
/// let changeset = diff(&previous, &current);
///
/// assert_eq!(apply_changeset(&previous, &current, &changeset), current);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Changeset {
    pub inserts: IndexSet,
    pub removals: IndexSet,
    pub mutations: IndexSet,
    pub moves: Vec<Move>,
}

impl Changeset {
    /// An empty changeset: the two versions are identical.
    pub fn new() -> Self {
        Self::default()
    }

    /// The changeset framing a sequence as its own first appearance:
    /// everything is an insert.
    ///
    /// This is the shape of the initial snapshot a subscriber receives.
    pub fn initial(count: usize) -> Self {
        Self {
            inserts: IndexSet::from_range(0..count),
            ..Self::default()
        }
    }

    /// True when all four fields are empty.
    pub fn is_empty(&self) -> bool {
        self.inserts.is_empty()
            && self.removals.is_empty()
            && self.mutations.is_empty()
            && self.moves.is_empty()
    }
}

// =============================================================================
// TESTS
// =============================================================================
