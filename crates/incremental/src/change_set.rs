//! Net changes to an ordered collection.

use alloc::vec::Vec;
use tether_core::{Error, Result};
use tether_index::IndexSet;

/// An element that moved from `from` (pre-transaction index) to `to`
/// (post-transaction index).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Move {
    pub from: usize,
    pub to: usize,
}

impl Move {
    /// Creates a new move.
    #[inline]
    pub fn new(from: usize, to: usize) -> Self {
        Self { from, to }
    }
}

/// The minimal diff between two versions of a collection.
///
/// `deletions` are indices into the old collection; `insertions` and
/// `modifications` are indices into the new one. Every move's `from` is also
/// a deletion and its `to` an insertion, so a consumer that ignores moves can
/// still replay the diff.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CollectionChangeSet {
    pub deletions: IndexSet,
    pub insertions: IndexSet,
    pub modifications: IndexSet,
    pub moves: Vec<Move>,
}

impl CollectionChangeSet {
    /// Creates a changeset, adding the endpoints of `moves` to the
    /// deletions and insertions.
    pub fn new(
        mut deletions: IndexSet,
        mut insertions: IndexSet,
        modifications: IndexSet,
        moves: Vec<Move>,
    ) -> Self {
        for m in &moves {
            deletions.add(m.from);
            insertions.add(m.to);
        }
        Self {
            deletions,
            insertions,
            modifications,
            moves,
        }
    }

    /// Returns true if nothing changed.
    pub fn is_empty(&self) -> bool {
        self.deletions.is_empty()
            && self.insertions.is_empty()
            && self.modifications.is_empty()
            && self.moves.is_empty()
    }

    /// Returns true if `index` is the destination of a move.
    pub fn is_move_target(&self, index: usize) -> bool {
        self.moves.iter().any(|m| m.to == index)
    }

    /// Replays the changes onto `previous`, which must hold the old
    /// contents, pulling new values from `current`: deletions from the
    /// highest index down, then insertions in ascending order, then
    /// modifications.
    pub fn apply<T: Clone>(&self, previous: &mut Vec<T>, current: &[T]) -> Result<()> {
        let deletions: Vec<usize> = self.deletions.indices().collect();
        for &index in deletions.iter().rev() {
            if index >= previous.len() {
                return Err(Error::out_of_bounds("deletion", index, previous.len()));
            }
            previous.remove(index);
        }
        for index in self.insertions.indices() {
            let value = current
                .get(index)
                .ok_or_else(|| Error::out_of_bounds("insertion", index, current.len()))?;
            if index > previous.len() {
                return Err(Error::out_of_bounds("insertion", index, previous.len()));
            }
            previous.insert(index, value.clone());
        }
        for index in self.modifications.indices() {
            match (previous.get_mut(index), current.get(index)) {
                (Some(slot), Some(value)) => *slot = value.clone(),
                _ => return Err(Error::out_of_bounds("modification", index, current.len())),
            }
        }
        Ok(())
    }

    /// Panics if the changeset is internally inconsistent.
    pub fn verify(&self) {
        self.deletions.verify();
        self.insertions.verify();
        self.modifications.verify();
        for (i, m) in self.moves.iter().enumerate() {
            assert!(self.deletions.contains(m.from), "move source {} not deleted", m.from);
            assert!(self.insertions.contains(m.to), "move target {} not inserted", m.to);
            assert!(
                self.moves[i + 1..].iter().all(|o| o.from != m.from && o.to != m.to),
                "duplicate move endpoint in {:?}",
                m
            );
        }
        for index in self.modifications.indices() {
            assert!(
                !self.insertions.contains(index) || self.is_move_target(index),
                "inserted index {} reported as modified",
                index
            );
        }
    }
}
