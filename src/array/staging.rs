// ============================================================================
// ripple-array - Staging view
// Batched edits with net-change accounting
// ============================================================================

use std::ops::Range;

use crate::core::changeset::Changeset;
use crate::core::index_set::IndexSet;

// =============================================================================
// STAGING
// =============================================================================

/// The exclusively-owned edit surface handed to a
/// [`modify`](crate::MutableArray::modify) closure.
///
/// Every edit is lowered onto one primitive, [`replace`](Staging::replace),
/// which keeps three accumulators describing the *net* effect of the batch
/// so far:
///
/// - `inserts`: staged-frame positions of elements added in this batch,
/// - `removals`: original-frame positions of elements dropped in this batch,
/// - `mutations`: original-frame positions of surviving elements whose value
///   was overwritten.
///
/// Editing an element that this same batch inserted never touches `removals`
/// or `mutations`: an insert later overwritten is still just an insert, and
/// an insert later removed cancels out entirely.
pub struct Staging<T> {
    buffer: Vec<T>,
    previous_len: usize,
    inserts: IndexSet,
    removals: IndexSet,
    mutations: IndexSet,
    reset: bool,
}

impl<T> Staging<T> {
    pub(crate) fn new(buffer: Vec<T>) -> Self {
        Self {
            previous_len: buffer.len(),
            buffer,
            inserts: IndexSet::new(),
            removals: IndexSet::new(),
            mutations: IndexSet::new(),
            reset: false,
        }
    }

    // =========================================================================
    // READS
    // =========================================================================

    /// Current number of staged elements.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.buffer.get(index)
    }

    pub fn first(&self) -> Option<&T> {
        self.buffer.first()
    }

    pub fn last(&self) -> Option<&T> {
        self.buffer.last()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.buffer
    }

    // =========================================================================
    // EDITS
    // =========================================================================

    /// Replace the elements in `range` with `items`. The one primitive every
    /// other edit lowers onto.
    ///
    /// Positions shared by the old and new images of the range count as
    /// mutations; a longer replacement inserts its excess after the range, a
    /// shorter one removes the tail of the range.
    ///
    /// # Panics
    ///
    /// Panics if `range` is not within `0..=len`.
    pub fn replace(&mut self, range: Range<usize>, items: impl IntoIterator<Item = T>) {
        let items: Vec<T> = items.into_iter().collect();
        assert!(
            range.start <= range.end && range.end <= self.buffer.len(),
            "staged replace of {:?} outside 0..{}",
            range,
            self.buffer.len(),
        );
        if self.reset {
            // Wholesale replacement already subsumes per-edit accounting.
            self.buffer.splice(range, items);
            return;
        }

        let removed = range.end - range.start;
        let added = items.len();

        // Overlap: positions present in both images mutate, unless this
        // batch inserted them (then the insert simply carries the new value).
        let overlap = range.start..range.start + removed.min(added);
        for staged in overlap {
            if !self.inserts.contains(staged) {
                let original = self.original_offset(staged);
                self.mutations.insert(original);
            }
        }

        if added > removed {
            let grown_by = added - removed;
            self.inserts.shift_up(range.end, grown_by);
            self.inserts.insert_range(range.end..range.end + grown_by);
        } else if removed > added {
            let shrunk_by = removed - added;
            self.account_removal(range.end - shrunk_by..range.end);
        }

        self.buffer.splice(range, items);
    }

    /// Insert `item` at `index`.
    pub fn insert(&mut self, index: usize, item: T) {
        self.replace(index..index, [item]);
    }

    /// Insert every element of `items` at `index`, preserving order.
    pub fn insert_all(&mut self, index: usize, items: impl IntoIterator<Item = T>) {
        self.replace(index..index, items);
    }

    /// Append `item` at the end.
    pub fn push(&mut self, item: T) {
        let end = self.buffer.len();
        self.replace(end..end, [item]);
    }

    /// Append every element of `items` at the end.
    pub fn extend(&mut self, items: impl IntoIterator<Item = T>) {
        let end = self.buffer.len();
        self.replace(end..end, items);
    }

    /// Remove and return the element at `index`.
    pub fn remove(&mut self, index: usize) -> T {
        assert!(
            index < self.buffer.len(),
            "staged remove at {index} outside 0..{}",
            self.buffer.len(),
        );
        self.account_removal(index..index + 1);
        self.buffer.remove(index)
    }

    /// Remove every element in `range`.
    pub fn remove_range(&mut self, range: Range<usize>) {
        self.replace(range, []);
    }

    /// Remove the first `n` elements.
    pub fn remove_first(&mut self, n: usize) {
        self.replace(0..n, []);
    }

    /// Remove the last `n` elements.
    pub fn remove_last(&mut self, n: usize) {
        let len = self.buffer.len();
        assert!(n <= len, "cannot remove last {n} of {len} elements");
        self.replace(len - n..len, []);
    }

    /// Remove every element, keeping the removal accounted per element.
    pub fn remove_all(&mut self) {
        self.replace(0..self.buffer.len(), []);
    }

    /// Overwrite the element at `index`, returning the previous value.
    pub fn set(&mut self, index: usize, item: T) -> T {
        assert!(
            index < self.buffer.len(),
            "staged set at {index} outside 0..{}",
            self.buffer.len(),
        );
        if !self.reset && !self.inserts.contains(index) {
            let original = self.original_offset(index);
            self.mutations.insert(original);
        }
        std::mem::replace(&mut self.buffer[index], item)
    }

    /// Replace the staged contents wholesale.
    ///
    /// Unlike editing in place, this commits as a removal of everything the
    /// array previously held followed by an insertion of everything in
    /// `items`, regardless of any edits staged before the reset.
    pub fn reset(&mut self, items: impl IntoIterator<Item = T>) {
        self.buffer.clear();
        self.buffer.extend(items);
        self.inserts = IndexSet::new();
        self.removals = IndexSet::new();
        self.mutations = IndexSet::new();
        self.reset = true;
    }

    // =========================================================================
    // COMMIT
    // =========================================================================

    /// Consume the view, yielding the final buffer and the net changeset.
    pub(crate) fn into_parts(self) -> (Vec<T>, Changeset) {
        if self.reset {
            let changeset = Changeset {
                inserts: IndexSet::from_range(0..self.buffer.len()),
                removals: IndexSet::from_range(0..self.previous_len),
                ..Changeset::default()
            };
            return (self.buffer, changeset);
        }

        // A mutation is only publishable while its element still sits at its
        // original offset once all staged edits apply; anything displaced is
        // downgraded to a removal + insert of the same element.
        let mut inserts = self.inserts;
        let mut removals = self.removals;
        let mut mutations = IndexSet::new();
        for original in self.mutations.iter().collect::<Vec<_>>() {
            let rank = original - removals.count_before(original);
            let landing = inserts.nth_absent(rank);
            if landing == original {
                mutations.insert(original);
            } else {
                removals.insert(original);
                inserts.insert(landing);
            }
        }

        (
            self.buffer,
            Changeset {
                inserts,
                removals,
                mutations,
                moves: Vec::new(),
            },
        )
    }

    // =========================================================================
    // INTERNAL
    // =========================================================================

    /// Map a staged offset of a surviving element back to its offset in the
    /// sequence as it stood when the batch began.
    ///
    /// Subtracting the staged inserts below the offset gives the element's
    /// rank among survivors; the original offset is then the rank-th offset
    /// the committed removals left behind.
    fn original_offset(&self, staged: usize) -> usize {
        debug_assert!(!self.inserts.contains(staged));
        let rank = staged - self.inserts.count_before(staged);
        self.removals.nth_absent(rank)
    }

    /// Accumulator bookkeeping for a band of staged offsets about to
    /// disappear: surviving originals become removals (shedding any staged
    /// mutation), staged inserts cancel to net zero, everything above the
    /// band shifts down.
    fn account_removal(&mut self, range: Range<usize>) {
        if self.reset {
            return;
        }
        // Translate before touching the accumulators; each translation must
        // see the pre-edit frame.
        let originals: Vec<usize> = range
            .clone()
            .filter(|staged| !self.inserts.contains(*staged))
            .map(|staged| self.original_offset(staged))
            .collect();
        for original in originals {
            self.mutations.remove(original);
            self.removals.insert(original);
        }
        self.inserts.remove_range(range.clone());
        self.inserts.shift_down(range.end, range.end - range.start);
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::apply::apply_changeset;

    fn commit(staging: Staging<i32>) -> (Vec<i32>, Changeset) {
        staging.into_parts()
    }

    /// Drive a batch and check the committed changeset actually maps the
    /// original buffer onto the final one.
    fn verify(previous: Vec<i32>, edit: impl FnOnce(&mut Staging<i32>)) -> (Vec<i32>, Changeset) {
        let mut staging = Staging::new(previous.clone());
        edit(&mut staging);
        let (current, changeset) = commit(staging);
        assert_eq!(
            apply_changeset(&previous, &current, &changeset),
            current,
            "changeset {changeset:?} does not rebuild {current:?} from {previous:?}"
        );
        (current, changeset)
    }

    #[test]
    fn untouched_batch_commits_empty_changeset() {
        let (current, changeset) = verify(vec![1, 2, 3], |_| {});
        assert_eq!(current, vec![1, 2, 3]);
        assert!(changeset.is_empty());
    }

    #[test]
    fn plain_inserts_land_in_final_frame() {
        let (current, changeset) = verify(vec![1, 2, 3], |s| {
            s.insert(0, 10);
            s.push(11);
        });
        assert_eq!(current, vec![10, 1, 2, 3, 11]);
        assert_eq!(changeset.inserts, [0, 4].into_iter().collect());
        assert!(changeset.removals.is_empty());
    }

    #[test]
    fn insert_then_remove_later_element_rebases_the_removal() {
        // Inserting at 1 shifts the later removal's staged offset; the
        // committed removal must name the original offset.
        let (current, changeset) = verify(vec![1, 2, 3], |s| {
            s.insert(1, 100);
            s.remove(3);
        });
        assert_eq!(current, vec![1, 100, 2]);
        assert_eq!(changeset.inserts, [1].into_iter().collect());
        assert_eq!(changeset.removals, [2].into_iter().collect());
        assert!(changeset.mutations.is_empty());
    }

    #[test]
    fn repeated_front_removal_names_successive_originals() {
        let (current, changeset) = verify(vec![1, 2, 3], |s| {
            s.remove(0);
            s.remove(0);
        });
        assert_eq!(current, vec![3]);
        assert_eq!(changeset.removals, [0, 1].into_iter().collect());
        assert!(changeset.inserts.is_empty());
    }

    #[test]
    fn removing_a_staged_insert_cancels_to_nothing() {
        let (current, changeset) = verify(vec![1, 2], |s| {
            s.insert(1, 99);
            s.remove(1);
        });
        assert_eq!(current, vec![1, 2]);
        assert!(changeset.is_empty());
    }

    #[test]
    fn set_records_a_mutation_at_the_original_offset() {
        let (current, changeset) = verify(vec![1, 2, 3], |s| {
            let old = s.set(1, 20);
            assert_eq!(old, 2);
        });
        assert_eq!(current, vec![1, 20, 3]);
        assert_eq!(changeset.mutations, [1].into_iter().collect());
        assert!(changeset.inserts.is_empty());
        assert!(changeset.removals.is_empty());
    }

    #[test]
    fn mutating_a_staged_insert_stays_an_insert() {
        let (current, changeset) = verify(vec![1, 2], |s| {
            s.insert(1, 50);
            s.set(1, 51);
        });
        assert_eq!(current, vec![1, 51, 2]);
        assert_eq!(changeset.inserts, [1].into_iter().collect());
        assert!(changeset.mutations.is_empty());
    }

    #[test]
    fn removing_a_mutated_element_keeps_only_the_removal() {
        let (current, changeset) = verify(vec![1, 2, 3], |s| {
            s.set(1, 20);
            s.remove(1);
        });
        assert_eq!(current, vec![1, 3]);
        assert_eq!(changeset.removals, [1].into_iter().collect());
        assert!(changeset.mutations.is_empty());
    }

    #[test]
    fn displaced_mutation_downgrades_at_commit() {
        // After removing the head, the surviving element no longer sits at
        // its original offset, so its value change cannot publish as a
        // mutation.
        let (current, changeset) = verify(vec![1, 2, 3], |s| {
            s.remove(0);
            s.set(0, 20);
        });
        assert_eq!(current, vec![20, 3]);
        assert!(changeset.mutations.is_empty());
        assert_eq!(changeset.removals, [0, 1].into_iter().collect());
        assert_eq!(changeset.inserts, [0].into_iter().collect());
    }

    #[test]
    fn replace_shorter_removes_the_tail_of_the_range() {
        let (current, changeset) = verify(vec![1, 2, 3, 4, 5], |s| {
            s.replace(1..4, [20]);
        });
        assert_eq!(current, vec![1, 20, 5]);
        assert_eq!(changeset.mutations, [1].into_iter().collect());
        assert_eq!(changeset.removals, [2, 3].into_iter().collect());
    }

    #[test]
    fn replace_longer_inserts_after_the_range() {
        let (current, changeset) = verify(vec![1, 2, 3], |s| {
            s.replace(1..2, [20, 21, 22]);
        });
        assert_eq!(current, vec![1, 20, 21, 22, 3]);
        assert_eq!(changeset.mutations, [1].into_iter().collect());
        assert_eq!(changeset.inserts, [2, 3].into_iter().collect());
    }

    #[test]
    fn bulk_edits_compose() {
        let (current, changeset) = verify(vec![0, 1, 2, 3, 4, 5], |s| {
            s.remove_first(2);
            s.remove_last(1);
            s.extend([90, 91]);
            s.insert_all(1, [80]);
        });
        assert_eq!(current, vec![2, 80, 3, 4, 90, 91]);
        assert_eq!(changeset.removals, [0, 1, 5].into_iter().collect());
        assert_eq!(changeset.inserts, [1, 4, 5].into_iter().collect());
    }

    #[test]
    fn remove_all_accounts_every_element() {
        let (current, changeset) = verify(vec![1, 2, 3], |s| {
            s.remove_all();
            s.push(9);
        });
        assert_eq!(current, vec![9]);
        assert_eq!(changeset.removals.ranges(), &[0..3]);
        assert_eq!(changeset.inserts, [0].into_iter().collect());
    }

    #[test]
    fn reset_commits_as_full_replacement() {
        let (current, changeset) = verify(vec![1, 2, 3], |s| {
            s.set(0, 10); // staged before the reset; subsumed by it
            s.reset([7, 8]);
            s.push(9);
        });
        assert_eq!(current, vec![7, 8, 9]);
        assert_eq!(changeset.removals.ranges(), &[0..3]);
        assert_eq!(changeset.inserts.ranges(), &[0..3]);
        assert!(changeset.mutations.is_empty());
    }

    #[test]
    fn reads_see_staged_state() {
        let mut staging = Staging::new(vec![1, 2, 3]);
        staging.push(4);
        assert_eq!(staging.len(), 4);
        assert!(!staging.is_empty());
        assert_eq!(staging.get(3), Some(&4));
        assert_eq!(staging.first(), Some(&1));
        assert_eq!(staging.last(), Some(&4));
        assert_eq!(staging.as_slice(), &[1, 2, 3, 4]);
    }

    #[test]
    #[should_panic(expected = "staged replace")]
    fn replace_out_of_bounds_panics() {
        let mut staging = Staging::new(vec![1, 2]);
        staging.replace(1..4, [0]);
    }

    #[test]
    #[should_panic(expected = "staged remove")]
    fn remove_out_of_bounds_panics() {
        let mut staging: Staging<i32> = Staging::new(vec![]);
        staging.remove(0);
    }
}
