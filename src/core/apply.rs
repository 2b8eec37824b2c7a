// ============================================================================
// ripple-array - Changeset application
// The canonical interpretation of a changeset
// ============================================================================

use crate::core::changeset::Changeset;
use crate::core::index_set::IndexSet;

/// Apply `changeset` to `previous`, producing a new sequence.
///
/// This is the operational definition of a changeset. Any consumer that
/// reconciles state from snapshots (a mirror collection, a list-view
/// binding) performs exactly these steps, so the function doubles as the
/// reference against which every changeset producer in this crate is tested.
///
/// The algorithm:
///
/// 1. Copy each contiguous run of `mutations` from `current`; mutation
///    offsets are position-invariant, so the same offsets address both
///    sequences.
/// 2. Drain `removals` together with every move source, walking the runs in
///    reverse so earlier offsets stay valid.
/// 3. Splice `inserts` together with every move destination, walking the
///    runs forward and taking each run's values from `current`.
///
/// For a well-formed changeset the result equals `current`. A hand-built
/// changeset that violates the frame invariants gets no repair here; offsets
/// out of bounds panic.
///
/// # Example
///
/// ```
/// use ripple_array::{apply_changeset, Changeset, Move};
///
/// let previous = vec!['a', 'b', 'c'];
/// let current = vec!['b', 'c', 'a'];
/// let changeset = Changeset {
///     moves: vec![Move::new(0, 2)],
///     ..Changeset::default()
/// };
///
/// assert_eq!(apply_changeset(&previous, &current, &changeset), current);
/// ```
pub fn apply_changeset<T: Clone>(previous: &[T], current: &[T], changeset: &Changeset) -> Vec<T> {
    let mut values: Vec<T> = previous.to_vec();

    for r in changeset.mutations.ranges() {
        values[r.clone()].clone_from_slice(&current[r.clone()]);
    }

    let mut drops = changeset.removals.clone();
    for m in &changeset.moves {
        drops.insert(m.source);
    }
    for r in drops.reversed_ranges() {
        values.drain(r);
    }

    let mut adds = changeset.inserts.clone();
    for m in &changeset.moves {
        adds.insert(m.destination);
    }
    for r in adds.ranges() {
        values.splice(r.start..r.start, current[r.clone()].iter().cloned());
    }

    values
}

/// The removal set the application step 2 drains: `removals` plus every move
/// source, all in the previous frame.
pub fn removal_union(changeset: &Changeset) -> IndexSet {
    let mut drops = changeset.removals.clone();
    for m in &changeset.moves {
        drops.insert(m.source);
    }
    drops
}

/// The insertion set the application step 3 splices: `inserts` plus every
/// move destination, all in the current frame.
pub fn insertion_union(changeset: &Changeset) -> IndexSet {
    let mut adds = changeset.inserts.clone();
    for m in &changeset.moves {
        adds.insert(m.destination);
    }
    adds
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::changeset::Move;

    #[test]
    fn empty_changeset_is_identity() {
        let values = vec![1, 2, 3];
        assert_eq!(apply_changeset(&values, &values, &Changeset::new()), values);
    }

    #[test]
    fn initial_changeset_builds_from_nothing() {
        let current = vec![7, 8, 9];
        let changeset = Changeset::initial(current.len());
        assert_eq!(
            apply_changeset(&Vec::<i32>::new(), &current, &changeset),
            current
        );
    }

    #[test]
    fn mutations_copy_in_place() {
        let previous = vec![1, 2, 3, 4];
        let current = vec![1, 20, 30, 4];
        let changeset = Changeset {
            mutations: IndexSet::from_range(1..3),
            ..Changeset::default()
        };
        assert_eq!(apply_changeset(&previous, &current, &changeset), current);
    }

    #[test]
    fn removals_drain_in_reverse() {
        let previous = vec![0, 1, 2, 3, 4, 5];
        let current = vec![1, 4];
        let changeset = Changeset {
            removals: [0, 2, 3, 5].into_iter().collect(),
            ..Changeset::default()
        };
        assert_eq!(apply_changeset(&previous, &current, &changeset), current);
    }

    #[test]
    fn inserts_splice_forward() {
        let previous = vec![1, 4];
        let current = vec![0, 1, 2, 3, 4, 5];
        let changeset = Changeset {
            inserts: [0, 2, 3, 5].into_iter().collect(),
            ..Changeset::default()
        };
        assert_eq!(apply_changeset(&previous, &current, &changeset), current);
    }

    #[test]
    fn move_sources_and_destinations_join_the_sets() {
        let previous = vec!['a', 'b', 'c', 'd'];
        let current = vec!['b', 'd', 'a'];
        // 'c' removed, 'a' moved behind 'd'.
        let changeset = Changeset {
            removals: [2].into_iter().collect(),
            moves: vec![Move::new(0, 2)],
            ..Changeset::default()
        };
        assert_eq!(apply_changeset(&previous, &current, &changeset), current);

        assert_eq!(removal_union(&changeset), [0, 2].into_iter().collect());
        assert_eq!(insertion_union(&changeset), [2].into_iter().collect());
    }

    #[test]
    fn mutated_move_takes_value_from_current() {
        let previous = vec![10, 11, 12];
        let current = vec![11, 12, 100];
        let changeset = Changeset {
            moves: vec![Move::mutated(0, 2)],
            ..Changeset::default()
        };
        assert_eq!(apply_changeset(&previous, &current, &changeset), current);
    }
}
