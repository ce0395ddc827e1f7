//! Tether Index - Position sets for change tracking.
//!
//! This crate provides `IndexSet`, an ordered set of positions stored as
//! disjoint half-open ranges. It is the building block every changeset is made
//! of: deletions, insertions and modifications are all `IndexSet`s, and the
//! set keeps itself consistent as positions shift under insertions and
//! removals in the underlying collection.
//!
//! # Example
//!
//! ```rust
//! use tether_index::IndexSet;
//!
//! let mut set: IndexSet = [1, 2, 3, 8].into_iter().collect();
//! assert_eq!(set.range_count(), 2);
//!
//! // Inserting two elements at position 2 shifts 2, 3 and 8 up and marks
//! // the new positions.
//! set.insert_at(2, 2);
//! assert_eq!(set.indices().collect::<Vec<_>>(), vec![1, 2, 3, 4, 5, 10]);
//!
//! // Erasing position 0 shifts everything down, even though 0 is absent.
//! set.erase_at(0, 1);
//! assert_eq!(set.first(), Some(0));
//! ```

#![no_std]

extern crate alloc;

pub mod index_set;

pub use index_set::{shift_for_erase, shift_for_insert, IndexSet};
