//! Accumulates primitive collection operations into a `CollectionChangeSet`.

use crate::change_set::{CollectionChangeSet, Move};
use alloc::format;
use alloc::vec::Vec;
use tether_core::{Error, Result};
use tether_index::{shift_for_erase, shift_for_insert, IndexSet};

/// What currently sits at a position, expressed in terms of the collection
/// before the first recorded operation.
#[derive(Clone, Copy, Debug)]
enum Occupant {
    /// The destination of the move at this index in `moves`.
    Moved(usize),
    /// A plain insertion.
    Inserted,
    /// An untouched element at this original index.
    Original(usize),
}

/// Folds a stream of primitive operations on one ordered collection into
/// the net change between its old and new contents.
///
/// Operations are applied in the order they happened; every index is a
/// position in the collection as it was immediately before that operation.
/// Call [`parse_complete`](Self::parse_complete) once the stream has ended,
/// then [`finalize`](Self::finalize).
///
/// # Example
///
/// ```rust
/// use tether_incremental::CollectionChangeBuilder;
///
/// let mut builder = CollectionChangeBuilder::new();
/// builder.insert(0);
/// builder.modify(3);
/// builder.erase(0);
/// builder.parse_complete();
///
/// let changes = builder.finalize();
/// assert!(changes.insertions.is_empty());
/// assert!(changes.modifications.contains(2));
/// ```
#[derive(Clone, Debug)]
pub struct CollectionChangeBuilder {
    changes: CollectionChangeSet,
    /// Modifications carried along by `move_item`; reported only if the move
    /// turns out to be a no-op or the element is modified again.
    carried: IndexSet,
    track_moves: bool,
}

impl CollectionChangeBuilder {
    /// Creates a new, empty builder that reports moves.
    pub fn new() -> Self {
        Self {
            changes: CollectionChangeSet::default(),
            carried: IndexSet::new(),
            track_moves: true,
        }
    }

    /// Creates a builder whose finished changeset reports no moves. Moved
    /// elements are left out entirely rather than turned into
    /// delete/insert pairs.
    pub fn without_moves() -> Self {
        Self {
            track_moves: false,
            ..Self::new()
        }
    }

    /// Creates a builder that continues from an existing changeset.
    pub fn from_changes(changes: CollectionChangeSet) -> Self {
        Self {
            changes,
            carried: IndexSet::new(),
            track_moves: true,
        }
    }

    #[inline]
    pub fn deletions(&self) -> &IndexSet {
        &self.changes.deletions
    }

    #[inline]
    pub fn insertions(&self) -> &IndexSet {
        &self.changes.insertions
    }

    #[inline]
    pub fn modifications(&self) -> &IndexSet {
        &self.changes.modifications
    }

    #[inline]
    pub fn moves(&self) -> &[Move] {
        &self.changes.moves
    }

    #[inline]
    pub fn tracks_moves(&self) -> bool {
        self.track_moves
    }

    /// Returns true if nothing has been recorded.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    fn move_targeting(&self, index: usize) -> Option<usize> {
        self.changes.moves.iter().position(|m| m.to == index)
    }

    fn is_plain_insertion(&self, index: usize) -> bool {
        self.changes.insertions.contains(index) && self.move_targeting(index).is_none()
    }

    /// Records a single inserted element at `index`.
    #[inline]
    pub fn insert(&mut self, index: usize) {
        self.insert_rows(index, 1);
    }

    /// Records `count` inserted elements starting at `index`.
    pub fn insert_rows(&mut self, index: usize, count: usize) {
        if count == 0 {
            return;
        }
        let c = &mut self.changes;
        c.modifications.shift_for_insert_at(index, count);
        self.carried.shift_for_insert_at(index, count);
        c.insertions.insert_at(index, count);
        for m in &mut c.moves {
            if m.to >= index {
                m.to += count;
            }
        }
    }

    /// Records the removal of the element at `index`.
    pub fn erase(&mut self, index: usize) {
        self.changes.modifications.erase_at(index, 1);
        self.carried.erase_at(index, 1);

        if let Some(pos) = self.move_targeting(index) {
            // the source is already a deletion
            self.changes.moves.swap_remove(pos);
            self.changes.insertions.erase_at(index, 1);
        } else if let Some(original) = self.changes.insertions.erase_and_unshift(index) {
            self.changes.deletions.add_shifted(original);
        }

        for m in &mut self.changes.moves {
            if m.to > index {
                m.to -= 1;
            }
        }
    }

    /// Records a change to the element at `index`. Plain insertions are
    /// already reported as such and are not marked.
    pub fn modify(&mut self, index: usize) {
        if self.is_plain_insertion(index) {
            return;
        }
        self.changes.modifications.add(index);
        self.carried.remove(index, 1);
    }

    /// Records moving the element at `from` so that it ends up at `to`.
    pub fn move_item(&mut self, from: usize, to: usize) {
        if from != to {
            self.relocate(from, to, false);
        }
    }

    fn relocate(&mut self, from: usize, to: usize, keep_modification: bool) {
        let modified = self.changes.modifications.contains(from);
        let was_carried = self.carried.contains(from);
        let chained = self.move_targeting(from);

        let c = &mut self.changes;
        let new_move = match chained {
            None if !c.insertions.contains(from) => {
                let original = c.deletions.add_shifted(c.insertions.unshift(from));
                Some(Move::new(original, to))
            }
            _ => None,
        };

        for (i, m) in c.moves.iter_mut().enumerate() {
            if Some(i) == chained {
                m.to = to;
            } else if let Some(shifted) = shift_for_erase(m.to, from, 1) {
                m.to = shift_for_insert(shifted, to, 1);
            }
        }
        if let Some(m) = new_move {
            c.moves.push(m);
        }

        c.modifications.erase_at(from, 1);
        c.insertions.erase_at(from, 1);
        c.modifications.shift_for_insert_at(to, 1);
        c.insertions.insert_at(to, 1);
        self.carried.erase_at(from, 1);
        self.carried.shift_for_insert_at(to, 1);

        if modified {
            c.modifications.add(to);
            if !keep_modification || was_carried {
                self.carried.add(to);
            }
        }
    }

    fn occupant(&self, index: usize) -> Occupant {
        if let Some(pos) = self.move_targeting(index) {
            Occupant::Moved(pos)
        } else if self.changes.insertions.contains(index) {
            Occupant::Inserted
        } else {
            let c = &self.changes;
            Occupant::Original(c.deletions.shift(c.insertions.unshift(index)))
        }
    }

    fn place(&mut self, occupant: Occupant, index: usize) {
        match occupant {
            Occupant::Moved(pos) => self.changes.moves[pos].to = index,
            Occupant::Inserted => {}
            Occupant::Original(original) => {
                self.changes.deletions.add(original);
                self.changes.moves.push(Move::new(original, index));
            }
        }
    }

    /// Records exchanging the elements at `a` and `b`.
    pub fn swap(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        let at_a = self.occupant(a);
        let at_b = self.occupant(b);
        self.place(at_a, b);
        self.place(at_b, a);
        self.changes.insertions.add(a);
        self.changes.insertions.add(b);

        exchange(&mut self.changes.modifications, a, b);
        exchange(&mut self.carried, a, b);
    }

    /// Records removing every element from a collection of `old_size`
    /// elements.
    ///
    /// Fails without recording anything if `old_size` is smaller than the
    /// number of elements inserted so far.
    pub fn clear(&mut self, old_size: usize) -> Result<()> {
        let c = &mut self.changes;
        let original_size = (old_size + c.deletions.count())
            .checked_sub(c.insertions.count())
            .ok_or_else(|| {
                Error::invalid_log(format!(
                    "cleared {} elements after {} insertions",
                    old_size,
                    c.insertions.count()
                ))
            })?;
        c.deletions.set(original_size);
        c.insertions.clear();
        c.modifications.clear();
        c.moves.clear();
        self.carried.clear();
        Ok(())
    }

    /// Records deleting `row` by moving the element at `last` (the last
    /// index) over it, the way tables delete rows.
    pub fn move_over(&mut self, row: usize, last: usize) {
        debug_assert!(row <= last);
        self.erase(row);
        if row + 1 < last {
            self.relocate(last - 1, row, true);
        }
    }

    /// Composes `other`, a changeset that happened after this one, onto
    /// this builder.
    pub fn merge(&mut self, mut other: CollectionChangeSet) {
        if other.is_empty() {
            return;
        }
        if self.changes.is_empty() {
            self.changes = other;
            self.carried.clear();
            return;
        }

        let c = &mut self.changes;
        let mut carried_to = Vec::new();

        // Old moves: follow the element if it moved again, drop the move if
        // it was deleted, otherwise shift the destination.
        c.moves.retain_mut(|old| {
            if let Some(pos) = other.moves.iter().position(|m| m.from == old.to) {
                if c.modifications.contains(old.to) {
                    carried_to.push(other.moves[pos].to);
                }
                old.to = other.moves[pos].to;
                other.moves.swap_remove(pos);
                return true;
            }
            if other.deletions.contains(old.to) {
                return false;
            }
            old.to = other.insertions.shift(other.deletions.unshift(old.to));
            true
        });

        // A new move of an element inserted earlier is just an insertion.
        other.moves.retain(|m| !c.insertions.contains(m.from));
        for m in &mut other.moves {
            if c.modifications.contains(m.from) {
                carried_to.push(m.to);
            }
            m.from = c.deletions.shift(c.insertions.unshift(m.from));
        }
        c.moves.extend(other.moves.iter().copied());

        c.deletions.add_shifted_by(&c.insertions, &other.deletions);

        c.insertions.erase_at_all(&other.deletions);
        c.insertions.insert_at_all(&other.insertions);

        c.modifications.erase_at_all(&other.deletions);
        c.modifications.shift_for_insert_at_all(&other.insertions);
        self.carried.erase_at_all(&other.deletions);
        self.carried.shift_for_insert_at_all(&other.insertions);

        let mut plain = c.insertions.clone();
        for m in &c.moves {
            plain.remove(m.to, 1);
        }
        other.modifications.remove_all(&plain);
        c.modifications.add_all(&other.modifications);
        for to in carried_to {
            if !other.modifications.contains(to) {
                c.modifications.add(to);
                self.carried.add(to);
            }
        }

        self.clean_up_stale_moves(true);
        self.settle_moves();
    }

    /// Drops carried modifications of elements that really moved and sorts
    /// the moves by source index.
    fn settle_moves(&mut self) {
        let c = &mut self.changes;
        for m in &c.moves {
            if self.carried.contains(m.to) {
                c.modifications.remove(m.to, 1);
            }
        }
        self.carried.clear();
        c.moves.sort_unstable();
    }

    /// Drops moves whose element ended up exactly where the surrounding
    /// insertions and deletions would have put it anyway.
    ///
    /// A settled move stands in for the modification of its element, so
    /// with `mark_modified` the element is reported modified in its place.
    fn clean_up_stale_moves(&mut self, mark_modified: bool) {
        let c = &mut self.changes;
        let deletions = &mut c.deletions;
        let insertions = &mut c.insertions;
        let modifications = &mut c.modifications;
        c.moves.retain(|m| {
            if m.from - deletions.count_in(0, m.from) != m.to - insertions.count_in(0, m.to) {
                return true;
            }
            deletions.remove(m.from, 1);
            insertions.remove(m.to, 1);
            if mark_modified {
                modifications.add(m.to);
            }
            false
        });
    }

    /// Finishes the operation stream: removes no-op moves, strips moves if
    /// they are not tracked and sorts the rest by source index.
    pub fn parse_complete(&mut self) {
        self.clean_up_stale_moves(false);

        let c = &mut self.changes;
        if !self.track_moves {
            for m in c.moves.drain(..) {
                c.deletions.remove(m.from, 1);
                c.insertions.remove(m.to, 1);
            }
        }

        self.settle_moves();

        #[cfg(debug_assertions)]
        self.changes.verify();
    }

    /// Consumes the builder and returns the accumulated changes.
    #[inline]
    pub fn finalize(self) -> CollectionChangeSet {
        self.changes
    }
}

impl Default for CollectionChangeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl From<CollectionChangeSet> for CollectionChangeBuilder {
    fn from(changes: CollectionChangeSet) -> Self {
        Self::from_changes(changes)
    }
}

fn exchange(set: &mut IndexSet, a: usize, b: usize) {
    let (has_a, has_b) = (set.contains(a), set.contains(b));
    if has_a != has_b {
        let (from, to) = if has_a { (a, b) } else { (b, a) };
        set.remove(from, 1);
        set.add(to);
    }
}
