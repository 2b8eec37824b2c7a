//! End-to-end diff scenarios, plus a micro-suite pinning down what each
//! changeset shape means under the canonical application algorithm.

use ripple_array::{apply_changeset, diff, diff_with, Changeset, IndexSet, Move};

fn assert_reproduces<T: Clone + PartialEq + std::fmt::Debug>(
    previous: &[T],
    current: &[T],
    changeset: &Changeset,
) {
    assert_eq!(
        apply_changeset(previous, current, changeset),
        current,
        "{changeset:?} does not turn {previous:?} into {current:?}"
    );
}

// ── Concrete end-to-end scenarios ───────────────────────────────────────

#[test]
fn pure_insertions() {
    let previous = vec![0, 1, 2, 3];
    let current = vec![10, 0, 11, 1, 12, 2, 3];
    let changeset = diff(&previous, &current);
    assert_eq!(
        changeset,
        Changeset {
            inserts: [0, 2, 4].into_iter().collect(),
            ..Changeset::default()
        }
    );
    assert_reproduces(&previous, &current, &changeset);
}

#[test]
fn pure_removals() {
    let previous = vec![0, 1, 2, 3, 4, 5, 6, 7, 8];
    let current = vec![0, 3, 7];
    let changeset = diff(&previous, &current);
    assert_eq!(
        changeset,
        Changeset {
            removals: [1, 2, 4, 5, 6, 8].into_iter().collect(),
            ..Changeset::default()
        }
    );
    assert_reproduces(&previous, &current, &changeset);
}

#[test]
fn mutations_under_identity_coarser_than_equality() {
    let previous = vec![(1, "v1_old"), (2, "v2"), (3, "v3_old"), (4, "v4")];
    let current = vec![(1, "v1_new"), (2, "v2"), (3, "v3_new"), (4, "v4")];
    let changeset = diff_with(&previous, &current, |pair| pair.0, |a, b| a == b);
    assert_eq!(
        changeset,
        Changeset {
            mutations: [0, 2].into_iter().collect(),
            ..Changeset::default()
        }
    );
    assert_reproduces(&previous, &current, &changeset);
}

#[test]
fn forward_move() {
    let previous = vec![0, 1, 2, 3, 4];
    let current = vec![1, 2, 3, 0, 4];
    let changeset = diff(&previous, &current);
    assert_eq!(
        changeset,
        Changeset {
            moves: vec![Move::new(0, 3)],
            ..Changeset::default()
        }
    );
    assert_reproduces(&previous, &current, &changeset);
}

#[test]
fn move_combined_with_removal() {
    let previous = vec![0, 1, 2, 3, 4];
    let current = vec![2, 3, 0, 4];
    let changeset = diff(&previous, &current);
    assert_eq!(
        changeset,
        Changeset {
            removals: [1].into_iter().collect(),
            moves: vec![Move::new(0, 2)],
            ..Changeset::default()
        }
    );
    assert_reproduces(&previous, &current, &changeset);
}

// ── Reproducibility micro-suite: inserts ────────────────────────────────

fn inserts(offsets: impl IntoIterator<Item = usize>) -> Changeset {
    Changeset {
        inserts: offsets.into_iter().collect(),
        ..Changeset::default()
    }
}

fn removals(offsets: impl IntoIterator<Item = usize>) -> Changeset {
    Changeset {
        removals: offsets.into_iter().collect(),
        ..Changeset::default()
    }
}

fn mutations(offsets: impl IntoIterator<Item = usize>) -> Changeset {
    Changeset {
        mutations: offsets.into_iter().collect(),
        ..Changeset::default()
    }
}

#[test]
fn insert_at_beginning_middle_end() {
    assert_reproduces(&[1, 2], &[9, 1, 2], &inserts([0]));
    assert_reproduces(&[1, 2], &[1, 9, 2], &inserts([1]));
    assert_reproduces(&[1, 2], &[1, 2, 9], &inserts([2]));
}

#[test]
fn insert_contiguous_run() {
    assert_reproduces(&[1, 2], &[7, 8, 9, 1, 2], &inserts([0, 1, 2]));
    assert_reproduces(&[1, 2], &[1, 7, 8, 9, 2], &inserts([1, 2, 3]));
}

#[test]
fn insert_scattered() {
    assert_reproduces(&[1, 2], &[7, 1, 8, 2, 9], &inserts([0, 2, 4]));
}

#[test]
fn insert_into_empty() {
    assert_reproduces(&[], &[1, 2, 3], &inserts([0, 1, 2]));
}

// ── Reproducibility micro-suite: removals ───────────────────────────────

#[test]
fn remove_at_beginning_middle_end() {
    assert_reproduces(&[1, 2, 3], &[2, 3], &removals([0]));
    assert_reproduces(&[1, 2, 3], &[1, 3], &removals([1]));
    assert_reproduces(&[1, 2, 3], &[1, 2], &removals([2]));
}

#[test]
fn remove_contiguous_run() {
    assert_reproduces(&[1, 2, 3, 4, 5], &[1, 5], &removals([1, 2, 3]));
}

#[test]
fn remove_scattered() {
    assert_reproduces(&[1, 2, 3, 4, 5], &[2, 4], &removals([0, 2, 4]));
}

#[test]
fn remove_everything() {
    assert_reproduces(&[1, 2, 3], &[], &removals([0, 1, 2]));
}

// ── Reproducibility micro-suite: mutations ──────────────────────────────

#[test]
fn mutate_at_beginning_middle_end() {
    assert_reproduces(&[1, 2, 3], &[9, 2, 3], &mutations([0]));
    assert_reproduces(&[1, 2, 3], &[1, 9, 3], &mutations([1]));
    assert_reproduces(&[1, 2, 3], &[1, 2, 9], &mutations([2]));
}

#[test]
fn mutate_contiguous_and_scattered() {
    assert_reproduces(&[1, 2, 3, 4], &[8, 9, 3, 4], &mutations([0, 1]));
    assert_reproduces(&[1, 2, 3, 4], &[8, 2, 9, 4], &mutations([0, 2]));
}

// ── Reproducibility micro-suite: moves ──────────────────────────────────

#[test]
fn forward_and_backward_moves() {
    let forward = Changeset {
        moves: vec![Move::new(0, 3)],
        ..Changeset::default()
    };
    assert_reproduces(&[0, 1, 2, 3, 4], &[1, 2, 3, 0, 4], &forward);

    let backward = Changeset {
        moves: vec![Move::new(3, 0)],
        ..Changeset::default()
    };
    assert_reproduces(&[0, 1, 2, 3], &[3, 0, 1, 2], &backward);
}

#[test]
fn crossing_moves() {
    let changeset = Changeset {
        moves: vec![Move::new(0, 1), Move::new(2, 3)],
        ..Changeset::default()
    };
    assert_reproduces(&['a', 'b', 'c', 'd'], &['b', 'a', 'd', 'c'], &changeset);
}

#[test]
fn mutating_move_carries_the_new_value() {
    let changeset = Changeset {
        moves: vec![Move::mutated(0, 2)],
        ..Changeset::default()
    };
    assert_reproduces(&[10, 11, 12], &[11, 12, 99], &changeset);
}

// ── Reproducibility micro-suite: everything at once ─────────────────────

#[test]
fn mixed_changeset() {
    // b removed, d moved behind e, c mutated in place, x inserted in front.
    let previous = vec!["a", "b", "c", "d", "e"];
    let current = vec!["x", "a", "c2", "e", "d"];
    let changeset = Changeset {
        inserts: IndexSet::from_range(0..1),
        removals: [1].into_iter().collect(),
        mutations: [2].into_iter().collect(),
        moves: vec![Move::new(3, 4)],
    };
    assert_reproduces(&previous, &current, &changeset);
}

// ── Diff-specific edges ─────────────────────────────────────────────────

#[test]
fn empty_diff_on_identical_sequences() {
    let values = vec![3, 1, 4, 1, 5];
    let changeset = diff(&values, &values);
    assert!(changeset.is_empty());
}

#[test]
fn both_sequences_empty() {
    let changeset = diff::<i32>(&[], &[]);
    assert!(changeset.is_empty());
}

#[test]
fn duplicates_never_anchor() {
    let previous = vec![1, 1, 2];
    let current = vec![2, 1, 1];
    let changeset = diff(&previous, &current);
    // The duplicated 1s fall back to removal + insert; only 2 anchors.
    assert_reproduces(&previous, &current, &changeset);
    assert_eq!(changeset.removals, [0, 1].into_iter().collect());
    assert_eq!(changeset.inserts, [1, 2].into_iter().collect());
}

#[test]
fn diff_reproduces_across_assorted_shuffles() {
    let cases: &[(&[u8], &[u8])] = &[
        (&[1, 2, 3, 4, 5], &[5, 4, 3, 2, 1]),
        (&[1, 2, 3, 4, 5], &[2, 4, 1, 5, 3]),
        (&[1, 2, 3, 4, 5], &[6, 4, 2, 7, 8]),
        (&[1, 2, 3], &[4, 5, 6]),
        (&[1, 2, 3, 4], &[3, 4, 1, 2]),
    ];
    for (previous, current) in cases {
        let changeset = diff(previous, current);
        assert_reproduces(previous, current, &changeset);
    }
}
