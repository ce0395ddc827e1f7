//! Compact sets of row or element positions.
//!
//! An `IndexSet` stores positions as sorted, disjoint and non-adjacent
//! half-open ranges. Besides plain set operations it knows how to keep its
//! contents in step with insertions and removals in the collection the
//! positions refer to, which is what change tracking needs.

use alloc::vec::Vec;
use core::ops::Range;

/// An ordered set of indices stored as half-open ranges.
///
/// Invariant: every range is non-empty and `ranges[i].1 < ranges[i + 1].0`,
/// so touching ranges are always merged.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct IndexSet {
    ranges: Vec<(usize, usize)>,
}

impl IndexSet {
    /// Creates a new empty set.
    pub fn new() -> Self {
        Self { ranges: Vec::new() }
    }

    /// Creates a set containing `[start, end)`.
    pub fn from_range(start: usize, end: usize) -> Self {
        let mut set = Self::new();
        set.add_range(start, end);
        set
    }

    /// Returns true if the set is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Returns the number of indices in the set.
    pub fn count(&self) -> usize {
        self.ranges.iter().map(|&(s, e)| e - s).sum()
    }

    /// Returns the number of indices in `[start, end)`.
    pub fn count_in(&self, start: usize, end: usize) -> usize {
        let mut total = 0;
        let mut pos = self.find(start, 0);
        while pos < self.ranges.len() && self.ranges[pos].0 < end {
            let (s, e) = self.ranges[pos];
            total += e.min(end) - s.max(start);
            pos += 1;
        }
        total
    }

    /// Returns true if `index` is in the set.
    pub fn contains(&self, index: usize) -> bool {
        let pos = self.find(index, 0);
        pos < self.ranges.len() && self.ranges[pos].0 <= index
    }

    /// Returns the ranges of the set.
    pub fn ranges(&self) -> impl Iterator<Item = Range<usize>> + '_ {
        self.ranges.iter().map(|&(s, e)| s..e)
    }

    /// Returns the number of ranges.
    #[inline]
    pub fn range_count(&self) -> usize {
        self.ranges.len()
    }

    /// Iterates the individual indices in ascending order.
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.ranges.iter().flat_map(|&(s, e)| s..e)
    }

    /// Returns the smallest index.
    #[inline]
    pub fn first(&self) -> Option<usize> {
        self.ranges.first().map(|r| r.0)
    }

    /// Returns the largest index.
    #[inline]
    pub fn last(&self) -> Option<usize> {
        self.ranges.last().map(|r| r.1 - 1)
    }

    /// Position of the first range, at or after `from`, ending after `index`.
    fn find(&self, index: usize, from: usize) -> usize {
        let from = from.min(self.ranges.len());
        from + self.ranges[from..].partition_point(|r| r.1 <= index)
    }

    /// Adds `index` given the position returned by `find`. Returns the
    /// position of the range now containing it.
    fn do_add(&mut self, pos: usize, index: usize) -> usize {
        let valid = pos < self.ranges.len();
        let more_before = pos > 0;
        debug_assert!(!more_before || index >= self.ranges[pos - 1].1);

        if valid && self.ranges[pos].0 <= index {
            return pos;
        }

        if more_before && self.ranges[pos - 1].1 == index {
            self.ranges[pos - 1].1 += 1;
            if valid && self.ranges[pos - 1].1 == self.ranges[pos].0 {
                self.ranges[pos - 1].1 = self.ranges[pos].1;
                self.ranges.remove(pos);
            }
            return pos - 1;
        }

        if valid && self.ranges[pos].0 == index + 1 {
            self.ranges[pos].0 = index;
            return pos;
        }

        self.ranges.insert(pos, (index, index + 1));
        pos
    }

    /// Adds an index.
    pub fn add(&mut self, index: usize) {
        let pos = self.find(index, 0);
        self.do_add(pos, index);
    }

    /// Adds every index in `[start, end)`.
    pub fn add_range(&mut self, start: usize, end: usize) {
        let mut pos = self.find(start, 0);
        for index in start..end {
            pos = self.do_add(self.find(index, pos), index);
        }
    }

    /// Adds every index of `other`.
    pub fn add_all(&mut self, other: &IndexSet) {
        let mut pos = 0;
        for index in other.indices() {
            pos = self.do_add(self.find(index, pos), index);
        }
    }

    /// Adds `index` after shifting it past every index already in the set,
    /// i.e. treats `index` as a position in the sequence with the set's
    /// members removed. Returns the index actually added.
    pub fn add_shifted(&mut self, mut index: usize) -> usize {
        let mut pos = 0;
        while pos < self.ranges.len() && self.ranges[pos].0 <= index {
            index += self.ranges[pos].1 - self.ranges[pos].0;
            pos += 1;
        }
        self.do_add(pos, index);
        index
    }

    /// Adds each index of `values` shifted by `shifted_by` and by the
    /// indices already added from `values`. Values inside `shifted_by` are
    /// skipped.
    pub fn add_shifted_by(&mut self, shifted_by: &IndexSet, values: &IndexSet) {
        let mut it = 0;
        let mut shift = 0;
        let mut skip_until = 0;
        for index in values.indices() {
            while it < shifted_by.ranges.len() && shifted_by.ranges[it].0 <= index {
                let (s, e) = shifted_by.ranges[it];
                shift += e - s;
                skip_until = e;
                it += 1;
            }
            if index >= skip_until {
                debug_assert!(index >= shift);
                self.add_shifted(index - shift);
                shift += 1;
            }
        }
    }

    /// Replaces the contents with `[0, len)`.
    pub fn set(&mut self, len: usize) {
        self.ranges.clear();
        if len > 0 {
            self.ranges.push((0, len));
        }
    }

    /// Shifts every index at or after `index` up by `count` and adds
    /// `[index, index + count)`.
    ///
    /// An insertion inside an existing range extends it; one in a gap never
    /// joins the ranges on either side of the gap.
    pub fn insert_at(&mut self, index: usize, count: usize) {
        if count == 0 {
            return;
        }
        let mut pos = self.find(index, 0);
        let mut in_existing = false;
        if pos < self.ranges.len() {
            if self.ranges[pos].0 <= index {
                in_existing = true;
            } else {
                self.ranges[pos].0 += count;
            }
            self.ranges[pos].1 += count;
            for range in &mut self.ranges[pos + 1..] {
                range.0 += count;
                range.1 += count;
            }
        }

        if !in_existing {
            for i in 0..count {
                pos = self.do_add(pos, index + i) + 1;
            }
        }

        #[cfg(debug_assertions)]
        self.verify();
    }

    /// `insert_at` for every index of `positions`, which are post-insertion
    /// positions in ascending order.
    pub fn insert_at_all(&mut self, positions: &IndexSet) {
        for index in positions.indices() {
            self.insert_at(index, 1);
        }
    }

    /// Shifts every index at or after `index` up by `count` without adding
    /// anything. A range spanning `index` is split.
    pub fn shift_for_insert_at(&mut self, index: usize, count: usize) {
        if count == 0 {
            return;
        }
        let mut pos = self.find(index, 0);
        if pos == self.ranges.len() {
            return;
        }

        if self.ranges[pos].0 < index {
            let end = self.ranges[pos].1;
            self.ranges[pos].1 = index;
            self.ranges.insert(pos + 1, (index, end));
            pos += 1;
        }

        for range in &mut self.ranges[pos..] {
            range.0 += count;
            range.1 += count;
        }

        #[cfg(debug_assertions)]
        self.verify();
    }

    /// `shift_for_insert_at` for every index of `positions`, in ascending order.
    pub fn shift_for_insert_at_all(&mut self, positions: &IndexSet) {
        for index in positions.indices() {
            self.shift_for_insert_at(index, 1);
        }
    }

    /// Removes the element at `index` (if present) and shifts every later
    /// index down by one. Works on the range at `pos` as returned by `find`.
    fn do_erase(&mut self, mut pos: usize, index: usize) {
        if self.ranges[pos].0 <= index {
            self.ranges[pos].1 -= 1;
            if self.ranges[pos].0 == self.ranges[pos].1 {
                self.ranges.remove(pos);
            } else {
                pos += 1;
            }
        } else if pos > 0 && self.ranges[pos - 1].1 + 1 == self.ranges[pos].0 {
            // erasing the only gap between two ranges joins them
            self.ranges[pos - 1].1 = self.ranges[pos].1 - 1;
            self.ranges.remove(pos);
        }

        for range in &mut self.ranges[pos..] {
            range.0 -= 1;
            range.1 -= 1;
        }
    }

    fn erase_one(&mut self, index: usize) {
        let pos = self.find(index, 0);
        if pos < self.ranges.len() {
            self.do_erase(pos, index);
        }
    }

    /// Removes `[index, index + count)` and shifts every later index down by
    /// `count`. Positions that are not in the set still cause the shift.
    pub fn erase_at(&mut self, index: usize, count: usize) {
        for _ in 0..count {
            self.erase_one(index);
        }

        #[cfg(debug_assertions)]
        self.verify();
    }

    /// `erase_at` for every index of `positions`, which are pre-removal
    /// positions.
    pub fn erase_at_all(&mut self, positions: &IndexSet) {
        for (shift, index) in positions.indices().enumerate() {
            self.erase_one(index - shift);
        }
    }

    /// Erases `index` like `erase_at`. Returns `None` if it was in the set,
    /// otherwise `index` minus the number of members before it.
    pub fn erase_and_unshift(&mut self, index: usize) -> Option<usize> {
        let mut shifted = index;
        let mut pos = 0;
        while pos < self.ranges.len() && self.ranges[pos].1 <= index {
            shifted -= self.ranges[pos].1 - self.ranges[pos].0;
            pos += 1;
        }
        if pos == self.ranges.len() {
            return Some(shifted);
        }

        let present = self.ranges[pos].0 <= index;
        self.do_erase(pos, index);
        if present {
            None
        } else {
            Some(shifted)
        }
    }

    fn do_remove(&mut self, pos: usize, begin: usize, end: usize) -> usize {
        let mut begin = begin;
        let mut pos = self.find(begin, pos);
        while pos < self.ranges.len() && self.ranges[pos].0 < end {
            begin = begin.max(self.ranges[pos].0);
            let (start, stop) = self.ranges[pos];

            if start < begin && stop > end {
                // removal from the middle of a range splits it
                self.ranges.insert(pos + 1, (end, stop));
                self.ranges[pos].1 = begin;
            } else if begin == start && end >= stop {
                self.ranges.remove(pos);
            } else if begin == start {
                self.ranges[pos].0 = end;
            } else {
                self.ranges[pos].1 = begin;
            }
            pos = self.find(begin, pos);
        }
        pos
    }

    /// Removes `[index, index + count)` without shifting anything.
    pub fn remove(&mut self, index: usize, count: usize) {
        if count > 0 {
            self.do_remove(0, index, index + count);
        }
    }

    /// Removes every index of `other` without shifting anything.
    pub fn remove_all(&mut self, other: &IndexSet) {
        let mut pos = 0;
        for &(begin, end) in &other.ranges {
            pos = self.do_remove(pos, begin, end);
            if pos == self.ranges.len() {
                break;
            }
        }
    }

    /// Maps `index` from the space with the set's members removed back to
    /// absolute positions.
    pub fn shift(&self, mut index: usize) -> usize {
        for &(s, e) in &self.ranges {
            if s > index {
                break;
            }
            index += e - s;
        }
        index
    }

    /// Maps an absolute `index` not in the set to the space with the set's
    /// members removed.
    pub fn unshift(&self, index: usize) -> usize {
        debug_assert!(!self.contains(index));
        let mut shifted = index;
        for &(s, e) in &self.ranges {
            if s >= index {
                break;
            }
            shifted -= e.min(index) - s;
        }
        shifted
    }

    /// Removes everything.
    #[inline]
    pub fn clear(&mut self) {
        self.ranges.clear();
    }

    /// Panics if the range invariant does not hold.
    pub fn verify(&self) {
        let mut prev_end: Option<usize> = None;
        for &(s, e) in &self.ranges {
            assert!(s < e, "empty range [{}, {})", s, e);
            if let Some(prev) = prev_end {
                assert!(s > prev, "range [{}, {}) touches or overlaps its predecessor", s, e);
            }
            prev_end = Some(e);
        }
    }
}

impl FromIterator<usize> for IndexSet {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        let mut set = IndexSet::new();
        for index in iter {
            set.add(index);
        }
        set
    }
}

impl Extend<usize> for IndexSet {
    fn extend<I: IntoIterator<Item = usize>>(&mut self, iter: I) {
        for index in iter {
            self.add(index);
        }
    }
}

/// Updates a single position the way `IndexSet::insert_at(index, count)`
/// shifts the members of a set.
#[inline]
pub fn shift_for_insert(position: usize, index: usize, count: usize) -> usize {
    if position >= index {
        position + count
    } else {
        position
    }
}

/// Updates a single position the way `IndexSet::erase_at(index, count)`
/// shifts the members of a set. Returns `None` if the position was erased.
#[inline]
pub fn shift_for_erase(position: usize, index: usize, count: usize) -> Option<usize> {
    if position < index {
        Some(position)
    } else if position < index + count {
        None
    } else {
        Some(position - count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn set(indices: &[usize]) -> IndexSet {
        indices.iter().copied().collect()
    }

    fn list(set: &IndexSet) -> Vec<usize> {
        set.indices().collect()
    }

    #[test]
    fn test_add_merges_ranges() {
        let mut s = IndexSet::new();
        s.add(5);
        s.add(3);
        assert_eq!(s.range_count(), 2);
        s.add(4);
        assert_eq!(s.range_count(), 1);
        assert_eq!(list(&s), vec![3, 4, 5]);
        s.add(4);
        assert_eq!(s.count(), 3);
        s.verify();
    }

    #[test]
    fn test_add_extends_both_sides() {
        let mut s = set(&[5]);
        s.add(6);
        s.add(4);
        assert_eq!(s.ranges().collect::<Vec<_>>(), vec![4..7]);
    }

    #[test]
    fn test_contains_and_count_in() {
        let s = set(&[1, 2, 3, 8, 9]);
        assert!(s.contains(2));
        assert!(!s.contains(4));
        assert!(!s.contains(10));
        assert_eq!(s.count_in(0, 10), 5);
        assert_eq!(s.count_in(2, 9), 3);
        assert_eq!(s.count_in(4, 8), 0);
        assert_eq!(s.first(), Some(1));
        assert_eq!(s.last(), Some(9));
    }

    #[test]
    fn test_add_shifted() {
        let mut s = set(&[1, 2]);
        assert_eq!(s.add_shifted(0), 0);
        assert_eq!(s.add_shifted(1), 4);
        assert_eq!(list(&s), vec![0, 1, 2, 4]);

        let mut s = set(&[3, 4]);
        assert_eq!(s.add_shifted(3), 5);
        assert_eq!(list(&s), vec![3, 4, 5]);
    }

    #[test]
    fn test_add_shifted_by() {
        let mut s = set(&[3, 4]);
        s.add_shifted_by(&set(&[1]), &set(&[1, 4]));
        // 1 is skipped because it is itself in shifted_by; 4 -> 3 -> 5
        assert_eq!(list(&s), vec![3, 4, 5]);
    }

    #[test]
    fn test_set_len() {
        let mut s = set(&[8]);
        s.set(5);
        assert_eq!(list(&s), vec![0, 1, 2, 3, 4]);
        s.set(0);
        assert!(s.is_empty());
    }

    #[test]
    fn test_insert_at_shifts_and_adds() {
        let mut s = set(&[5]);
        s.insert_at(4, 1);
        assert_eq!(list(&s), vec![4, 6]);

        let mut s = set(&[5]);
        s.insert_at(5, 1);
        assert_eq!(list(&s), vec![5, 6]);

        let mut s = set(&[5, 6]);
        s.insert_at(6, 2);
        assert_eq!(list(&s), vec![5, 6, 7, 8]);
    }

    #[test]
    fn test_insert_at_does_not_join_ranges() {
        let mut s = set(&[5, 7]);
        s.insert_at(6, 1);
        assert_eq!(list(&s), vec![5, 6, 8]);
    }

    #[test]
    fn test_shift_for_insert_at_splits() {
        let mut s = set(&[3, 4, 5]);
        s.shift_for_insert_at(4, 2);
        assert_eq!(list(&s), vec![3, 6, 7]);

        let mut s = set(&[3]);
        s.shift_for_insert_at(4, 1);
        assert_eq!(list(&s), vec![3]);
    }

    #[test]
    fn test_erase_at() {
        let mut s = set(&[3, 4, 5]);
        s.erase_at(4, 1);
        assert_eq!(list(&s), vec![3, 4]);

        let mut s = set(&[3, 6]);
        s.erase_at(4, 1);
        assert_eq!(list(&s), vec![3, 5]);

        let mut s = set(&[3, 5]);
        s.erase_at(4, 1);
        assert_eq!(list(&s), vec![3, 4]);
        assert_eq!(s.range_count(), 1);

        let mut s = set(&[1, 2, 3, 7]);
        s.erase_at(2, 3);
        assert_eq!(list(&s), vec![1, 4]);
    }

    #[test]
    fn test_erase_and_unshift() {
        let mut s = set(&[3, 4]);
        assert_eq!(s.erase_and_unshift(3), None);
        assert_eq!(list(&s), vec![3]);
        assert_eq!(s.erase_and_unshift(5), Some(4));
        assert_eq!(list(&s), vec![3]);
        assert_eq!(s.erase_and_unshift(1), Some(1));
        assert_eq!(list(&s), vec![2]);
    }

    #[test]
    fn test_remove() {
        let mut s = set(&[1, 2, 3, 4, 5]);
        s.remove(2, 2);
        assert_eq!(list(&s), vec![1, 4, 5]);

        let mut s = set(&[1, 2, 3, 7, 8]);
        s.remove_all(&set(&[0, 3, 7, 9]));
        assert_eq!(list(&s), vec![1, 2, 8]);
        s.verify();
    }

    #[test]
    fn test_shift_unshift() {
        let s = set(&[2, 3, 6]);
        assert_eq!(s.shift(0), 0);
        assert_eq!(s.shift(2), 4);
        assert_eq!(s.shift(4), 7);
        assert_eq!(s.unshift(5), 3);
        assert_eq!(s.unshift(7), 4);
        assert_eq!(s.unshift(1), 1);
        for i in 0..10 {
            assert_eq!(s.unshift(s.shift(i)), i);
        }
    }

    #[test]
    fn test_bulk_insert_and_erase() {
        let mut s = set(&[1, 5]);
        s.insert_at_all(&set(&[0, 3]));
        assert_eq!(list(&s), vec![0, 2, 3, 7]);
        s.erase_at_all(&set(&[0, 3]));
        assert_eq!(list(&s), vec![1, 5]);

        let mut s = set(&[1, 5]);
        s.shift_for_insert_at_all(&set(&[0, 3]));
        assert_eq!(list(&s), vec![2, 7]);
    }

    #[test]
    fn test_single_position_helpers() {
        assert_eq!(shift_for_insert(5, 3, 2), 7);
        assert_eq!(shift_for_insert(2, 3, 2), 2);
        assert_eq!(shift_for_insert(3, 3, 1), 4);
        assert_eq!(shift_for_erase(2, 3, 2), Some(2));
        assert_eq!(shift_for_erase(4, 3, 2), None);
        assert_eq!(shift_for_erase(6, 3, 2), Some(4));
    }

    #[test]
    #[should_panic]
    fn test_verify_rejects_touching_ranges() {
        let s = IndexSet {
            ranges: vec![(0, 2), (2, 3)],
        };
        s.verify();
    }
}
