// ============================================================================
// ripple-array - Diff Engine
// Heckel-style sequence diff with move detection
// ============================================================================
//
// Five passes over a symbol table keyed by caller-supplied identity:
//
// 1. Scan `current`, counting occurrences per identity.
// 2. Scan `previous`, counting occurrences and recording positions.
// 3. Anchor identities that occur exactly once on both sides.
// 4. Classify: unanchored old positions are removals, unanchored new
//    positions are inserts, anchored pairs at the same offset that compare
//    unequal are mutations, anchored pairs at different offsets are move
//    candidates.
// 5. Elide candidate moves whose displacement is fully explained by the
//    surrounding removals and inserts; emit the rest, then stabilise.
// ============================================================================

use std::hash::Hash;

use rustc_hash::FxHashMap;

use crate::core::changeset::{Changeset, Move};
use crate::core::index_set::IndexSet;

// =============================================================================
// SYMBOL TABLE
// =============================================================================

/// Occurrence bookkeeping for one identity.
#[derive(Default)]
struct Symbol {
    occurrences_in_old: u32,
    occurrences_in_new: u32,
    location_in_old: usize,
}

/// What a position refers to after anchoring: either its symbol-table entry
/// (identity not matched one-to-one) or the matched offset in the other
/// sequence.
#[derive(Clone, Copy)]
enum PositionRef {
    Table(usize),
    Anchor(usize),
}

// =============================================================================
// DIFF
// =============================================================================

/// Diff two sequences using structural identity and equality.
///
/// Shorthand for [`diff_with`] where the element itself is its identity and
/// `==` decides equality. Elements that occur at most once per side get
/// matched across versions; duplicated elements degrade to removal + insert
/// pairs.
///
/// # Example
///
/// ```
/// use ripple_array::{diff, apply_changeset};
///
/// let previous = vec![0, 1, 2, 3];
/// let current = vec![10, 0, 11, 1, 12, 2, 3];
/// let changeset = diff(&previous, &current);
///
/// assert_eq!(changeset.inserts, [0, 2, 4].into_iter().collect());
/// assert!(changeset.removals.is_empty());
/// assert_eq!(apply_changeset(&previous, &current, &changeset), current);
/// ```
pub fn diff<T>(previous: &[T], current: &[T]) -> Changeset
where
    T: Hash + Eq + Clone,
{
    diff_with(previous, current, |element| element.clone(), |a, b| a == b)
}

/// Diff two sequences, producing a [`Changeset`] whose application to
/// `previous` reproduces `current`.
///
/// `identify` maps an element to the hashable key that means "same element
/// across versions". `equal` compares values and may be strictly finer than
/// identity (identify rows by a stable id, compare them by contents), which
/// is what separates a mutation from a no-op.
///
/// Runs in expected O(n + m) time and space.
///
/// # Example
///
/// ```
/// use ripple_array::diff_with;
///
/// let previous = vec![(1, "one"), (2, "two")];
/// let current = vec![(1, "uno"), (2, "two")];
/// let changeset = diff_with(&previous, &current, |e| e.0, |a, b| a == b);
///
/// assert_eq!(changeset.mutations, [0].into_iter().collect());
/// ```
pub fn diff_with<T, K, I, E>(previous: &[T], current: &[T], identify: I, equal: E) -> Changeset
where
    K: Hash + Eq,
    I: Fn(&T) -> K,
    E: Fn(&T, &T) -> bool,
{
    let mut symbols: Vec<Symbol> = Vec::new();
    let mut table: FxHashMap<K, usize> = FxHashMap::default();
    let mut entry_for = |symbols: &mut Vec<Symbol>, element: &T| -> usize {
        *table.entry(identify(element)).or_insert_with(|| {
            symbols.push(Symbol::default());
            symbols.len() - 1
        })
    };

    // Pass 1: scan `current`.
    let mut new_refs: Vec<PositionRef> = Vec::with_capacity(current.len());
    for element in current {
        let id = entry_for(&mut symbols, element);
        symbols[id].occurrences_in_new = symbols[id].occurrences_in_new.saturating_add(1);
        new_refs.push(PositionRef::Table(id));
    }

    // Pass 2: scan `previous`.
    let mut old_refs: Vec<PositionRef> = Vec::with_capacity(previous.len());
    for (j, element) in previous.iter().enumerate() {
        let id = entry_for(&mut symbols, element);
        symbols[id].occurrences_in_old = symbols[id].occurrences_in_old.saturating_add(1);
        symbols[id].location_in_old = j;
        old_refs.push(PositionRef::Table(id));
    }

    // Pass 3: anchor identities unique on both sides.
    for i in 0..new_refs.len() {
        if let PositionRef::Table(id) = new_refs[i] {
            let symbol = &symbols[id];
            if symbol.occurrences_in_new == 1 && symbol.occurrences_in_old == 1 {
                let j = symbol.location_in_old;
                new_refs[i] = PositionRef::Anchor(j);
                old_refs[j] = PositionRef::Anchor(i);
            }
        }
    }

    // Pass 4: classify.
    let mut removals = IndexSet::new();
    let mut inserts = IndexSet::new();
    let mut mutations = IndexSet::new();
    // Anchored pairs that are not (yet) moves, and move candidates, both in
    // ascending old-frame order.
    let mut anchored: Vec<(usize, usize)> = Vec::new();
    let mut candidates: Vec<(usize, usize)> = Vec::new();

    for (i, position) in new_refs.iter().enumerate() {
        if matches!(position, PositionRef::Table(_)) {
            inserts.insert(i);
        }
    }
    for (j, position) in old_refs.iter().enumerate() {
        match *position {
            PositionRef::Table(_) => removals.insert(j),
            PositionRef::Anchor(i) if i == j => {
                if !equal(&previous[j], &current[i]) {
                    mutations.insert(i);
                }
                anchored.push((j, i));
            }
            PositionRef::Anchor(i) => candidates.push((j, i)),
        }
    }

    // Pass 5: elide moves explained by surrounding edits.
    let mut moves: Vec<Move> = Vec::new();
    let mut drops = removals.clone(); // removals ∪ emitted move sources
    let mut adds = inserts.clone(); // inserts ∪ emitted move destinations
    for &(j, i) in &candidates {
        let value_changed = !equal(&previous[j], &current[i]);
        let replayed = j - drops.count_before(j) + adds.count_before(i);
        if replayed == i && !value_changed {
            anchored.push((j, i));
        } else {
            // A changed value cannot ride along as a mutation once the
            // offsets differ; the move carries it instead.
            moves.push(Move {
                source: j,
                destination: i,
                is_mutated: value_changed,
            });
            drops.insert(j);
            adds.insert(i);
        }
    }

    // Stabilise: an elision decided early can be invalidated by a move
    // emitted later (its destination lands below the elided pair's). Every
    // anchored pair that is not a move must land exactly on its destination
    // once all removals and insertions apply; escalate any that would not,
    // until the set is consistent.
    loop {
        let mut escalated = false;
        anchored.retain(|&(j, i)| {
            let landing = adds.nth_absent(j - drops.count_before(j));
            if landing == i {
                return true;
            }
            if mutations.contains(i) {
                mutations.remove(i);
            }
            moves.push(Move {
                source: j,
                destination: i,
                is_mutated: !equal(&previous[j], &current[i]),
            });
            drops.insert(j);
            adds.insert(i);
            escalated = true;
            false
        });
        if !escalated {
            break;
        }
    }

    Changeset {
        inserts,
        removals,
        mutations,
        moves,
    }
}

// =============================================================================
// TESTS
// =============================================================================
