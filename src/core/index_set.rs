// ============================================================================
// ripple-array - IndexSet
// A sorted set of offsets stored as disjoint half-open ranges
// ============================================================================

use std::fmt;
use std::ops::Range;

// =============================================================================
// INDEX SET
// =============================================================================

/// A set of non-negative offsets, kept sorted and exposed as the smallest
/// list of disjoint half-open ranges covering it.
///
/// Changesets address elements by offset, and almost every question asked of
/// those offsets is a range question: "how many removals precede offset j?",
/// "which contiguous runs do I splice?". Storing ranges directly makes the
/// range view free and rank queries logarithmic in the number of ranges.
///
/// # Example
///
/// ```
/// use ripple_array::IndexSet;
///
/// let mut set = IndexSet::new();
/// set.insert(4);
/// set.insert_range(0..2);
/// set.insert(2); // adjacent, coalesces with 0..2
///
/// assert_eq!(set.ranges(), &[0..3, 4..5]);
/// assert_eq!(set.len(), 4);
/// assert!(set.contains(4));
/// assert!(!set.contains(3));
/// assert_eq!(set.count_before(4), 3);
/// ```
#[derive(Clone)]
pub struct IndexSet {
    /// Sorted, disjoint, non-empty, non-adjacent ranges.
    ranges: Vec<Range<usize>>,
    /// prefix[i] = number of offsets covered by ranges[..i]. One entry longer
    /// than `ranges`, so prefix.last() is the total count.
    prefix: Vec<usize>,
}

impl Default for IndexSet {
    fn default() -> Self {
        Self::new()
    }
}

impl IndexSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self {
            ranges: Vec::new(),
            prefix: vec![0],
        }
    }

    /// Create a set covering a single contiguous range.
    pub fn from_range(range: Range<usize>) -> Self {
        let mut set = Self::new();
        set.insert_range(range);
        set
    }

    /// Number of offsets in the set.
    pub fn len(&self) -> usize {
        *self.prefix.last().unwrap_or(&0)
    }

    /// Returns true if the set contains no offsets.
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Returns true if `offset` is a member.
    pub fn contains(&self, offset: usize) -> bool {
        let i = self.ranges.partition_point(|r| r.end <= offset);
        i < self.ranges.len() && self.ranges[i].start <= offset
    }

    /// The range view: disjoint half-open ranges in ascending order.
    pub fn ranges(&self) -> &[Range<usize>] {
        &self.ranges
    }

    /// The range view in descending order.
    pub fn reversed_ranges(&self) -> impl Iterator<Item = Range<usize>> + '_ {
        self.ranges.iter().rev().cloned()
    }

    /// Iterate over all member offsets in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.ranges.iter().flat_map(|r| r.clone())
    }

    // =========================================================================
    // MUTATION
    // =========================================================================

    /// Insert a single offset.
    pub fn insert(&mut self, offset: usize) {
        self.insert_range(offset..offset + 1);
    }

    /// Insert every offset in `range`, coalescing with overlapping or
    /// adjacent ranges.
    pub fn insert_range(&mut self, range: Range<usize>) {
        if range.start >= range.end {
            return;
        }
        // Everything in ranges[i..j] overlaps or adjoins `range`.
        let i = self.ranges.partition_point(|r| r.end < range.start);
        let j = self.ranges.partition_point(|r| r.start <= range.end);
        let merged = if i < j {
            self.ranges[i].start.min(range.start)..self.ranges[j - 1].end.max(range.end)
        } else {
            range
        };
        self.ranges.splice(i..j, [merged]);
        self.rebuild();
    }

    /// Remove a single offset.
    pub fn remove(&mut self, offset: usize) {
        self.remove_range(offset..offset + 1);
    }

    /// Remove every offset in `range`.
    pub fn remove_range(&mut self, range: Range<usize>) {
        if range.start >= range.end || self.ranges.is_empty() {
            return;
        }
        let i = self.ranges.partition_point(|r| r.end <= range.start);
        let j = self.ranges.partition_point(|r| r.start < range.end);
        if i >= j {
            return;
        }
        let mut keep: Vec<Range<usize>> = Vec::with_capacity(2);
        if self.ranges[i].start < range.start {
            keep.push(self.ranges[i].start..range.start);
        }
        if self.ranges[j - 1].end > range.end {
            keep.push(range.end..self.ranges[j - 1].end);
        }
        self.ranges.splice(i..j, keep);
        self.rebuild();
    }

    // =========================================================================
    // SET ALGEBRA
    // =========================================================================

    /// The union of two sets.
    pub fn union(&self, other: &IndexSet) -> IndexSet {
        let mut out: Vec<Range<usize>> = Vec::with_capacity(self.ranges.len() + other.ranges.len());
        let (mut i, mut j) = (0, 0);
        while i < self.ranges.len() || j < other.ranges.len() {
            let take_left = match (self.ranges.get(i), other.ranges.get(j)) {
                (Some(a), Some(b)) => a.start <= b.start,
                (Some(_), None) => true,
                _ => false,
            };
            let next = if take_left {
                i += 1;
                self.ranges[i - 1].clone()
            } else {
                j += 1;
                other.ranges[j - 1].clone()
            };
            push_coalescing(&mut out, next);
        }
        Self::from_normalized(out)
    }

    /// Union `other` into `self`.
    pub fn union_with(&mut self, other: &IndexSet) {
        *self = self.union(other);
    }

    /// The intersection of two sets.
    pub fn intersection(&self, other: &IndexSet) -> IndexSet {
        let mut out = Vec::new();
        let (mut i, mut j) = (0, 0);
        while i < self.ranges.len() && j < other.ranges.len() {
            let a = &self.ranges[i];
            let b = &other.ranges[j];
            let start = a.start.max(b.start);
            let end = a.end.min(b.end);
            if start < end {
                out.push(start..end);
            }
            if a.end < b.end {
                i += 1;
            } else {
                j += 1;
            }
        }
        Self::from_normalized(out)
    }

    /// The set difference `self \ other`.
    pub fn subtracting(&self, other: &IndexSet) -> IndexSet {
        let mut out = Vec::new();
        let mut j = 0;
        for r in &self.ranges {
            let mut start = r.start;
            while j < other.ranges.len() && other.ranges[j].end <= start {
                j += 1;
            }
            let mut k = j;
            while k < other.ranges.len() && other.ranges[k].start < r.end {
                if other.ranges[k].start > start {
                    out.push(start..other.ranges[k].start);
                }
                start = start.max(other.ranges[k].end);
                if start >= r.end {
                    break;
                }
                k += 1;
            }
            if start < r.end {
                out.push(start..r.end);
            }
        }
        Self::from_normalized(out)
    }

    /// Remove every member of `other` from `self`.
    pub fn subtract(&mut self, other: &IndexSet) {
        *self = self.subtracting(other);
    }

    // =========================================================================
    // RANK QUERIES
    // =========================================================================

    /// Number of members strictly below `offset`. O(log r) in the number of
    /// ranges.
    pub fn count_before(&self, offset: usize) -> usize {
        let i = self.ranges.partition_point(|r| r.end <= offset);
        let mut n = self.prefix[i];
        if i < self.ranges.len() && self.ranges[i].start < offset {
            n += offset - self.ranges[i].start;
        }
        n
    }

    /// Number of members inside `range`.
    pub fn count_in(&self, range: Range<usize>) -> usize {
        if range.start >= range.end {
            return 0;
        }
        self.count_before(range.end) - self.count_before(range.start)
    }

    /// The `rank`-th (zero-based, ascending) offset *not* in the set.
    ///
    /// This is the select operation over the complement: it answers "where
    /// does the rank-th surviving element land once these offsets are taken
    /// by someone else".
    ///
    /// # Example
    ///
    /// ```
    /// use ripple_array::IndexSet;
    ///
    /// let set = IndexSet::from_range(1..3);
    /// assert_eq!(set.nth_absent(0), 0);
    /// assert_eq!(set.nth_absent(1), 3);
    /// assert_eq!(set.nth_absent(2), 4);
    /// ```
    pub fn nth_absent(&self, rank: usize) -> usize {
        // Binary search for the first range whose gap-prefix exceeds `rank`:
        // ranges[i].start - prefix[i] is the number of absent offsets below
        // ranges[i], and it is non-decreasing in i.
        let (mut lo, mut hi) = (0, self.ranges.len());
        while lo < hi {
            let mid = (lo + hi) / 2;
            if self.ranges[mid].start - self.prefix[mid] <= rank {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        rank + self.prefix[lo]
    }

    // =========================================================================
    // OFFSET TRANSLATION
    // =========================================================================

    /// Shift every member at or above `from` upward by `by`, splitting a
    /// range that straddles `from`.
    pub fn shift_up(&mut self, from: usize, by: usize) {
        if by == 0 || self.ranges.is_empty() {
            return;
        }
        let mut out: Vec<Range<usize>> = Vec::with_capacity(self.ranges.len() + 1);
        for r in &self.ranges {
            if r.end <= from {
                out.push(r.clone());
            } else if r.start >= from {
                out.push(r.start + by..r.end + by);
            } else {
                out.push(r.start..from);
                out.push(from + by..r.end + by);
            }
        }
        self.ranges = out;
        self.rebuild();
    }

    /// Shift every member at or above `from` downward by `by`.
    ///
    /// Requires `from >= by`, and the band `[from - by, from)` must contain
    /// no members; shifting would otherwise collide with them.
    pub fn shift_down(&mut self, from: usize, by: usize) {
        if by == 0 || self.ranges.is_empty() {
            return;
        }
        assert!(from >= by, "shift_down of {by} from {from} crosses zero");
        assert!(
            self.count_in(from - by..from) == 0,
            "shift_down would collide: members in {:?}",
            from - by..from
        );
        let mut out: Vec<Range<usize>> = Vec::with_capacity(self.ranges.len());
        for r in &self.ranges {
            let shifted = if r.start >= from {
                r.start - by..r.end - by
            } else {
                r.clone()
            };
            push_coalescing(&mut out, shifted);
        }
        self.ranges = out;
        self.rebuild();
    }

    // =========================================================================
    // INTERNAL
    // =========================================================================

    /// Build from ranges that are already sorted, disjoint and non-adjacent.
    fn from_normalized(ranges: Vec<Range<usize>>) -> Self {
        let mut set = Self {
            ranges,
            prefix: Vec::new(),
        };
        set.rebuild();
        set
    }

    fn rebuild(&mut self) {
        self.prefix.clear();
        self.prefix.reserve(self.ranges.len() + 1);
        self.prefix.push(0);
        let mut total = 0;
        for r in &self.ranges {
            total += r.end - r.start;
            self.prefix.push(total);
        }
    }
}

/// Append `next` to a sorted range list, merging it into the tail range when
/// they overlap or adjoin.
fn push_coalescing(out: &mut Vec<Range<usize>>, next: Range<usize>) {
    if let Some(last) = out.last_mut() {
        if last.end >= next.start {
            last.end = last.end.max(next.end);
            return;
        }
    }
    out.push(next);
}

impl PartialEq for IndexSet {
    fn eq(&self, other: &Self) -> bool {
        self.ranges == other.ranges
    }
}

impl Eq for IndexSet {}

impl fmt::Debug for IndexSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.ranges.iter()).finish()
    }
}

impl FromIterator<usize> for IndexSet {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl FromIterator<Range<usize>> for IndexSet {
    fn from_iter<I: IntoIterator<Item = Range<usize>>>(iter: I) -> Self {
        let mut set = Self::new();
        for r in iter {
            set.insert_range(r);
        }
        set
    }
}

impl Extend<usize> for IndexSet {
    fn extend<I: IntoIterator<Item = usize>>(&mut self, iter: I) {
        for offset in iter {
            self.insert(offset);
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
