//! Tether Incremental - Net changes to ordered collections.
//!
//! A write transaction touches a table or a link-list through a stream of
//! primitive operations: insertions, removals, moves, swaps and value
//! changes. Observers only care about the net effect, so this crate folds
//! the stream into a `CollectionChangeSet`:
//!
//! - `deletions`: indices in the old collection that are gone
//! - `insertions`: indices in the new collection that are new
//! - `modifications`: indices in the new collection whose value changed
//! - `moves`: elements that survived but changed position
//!
//! Consecutive changesets can be composed with `CollectionChangeBuilder::merge`.
//!
//! # Example
//!
//! ```rust
//! use tether_incremental::{CollectionChangeBuilder, Move};
//!
//! let mut builder = CollectionChangeBuilder::new();
//! builder.move_item(4, 0);
//! builder.modify(2);
//! builder.parse_complete();
//!
//! let changes = builder.finalize();
//! assert_eq!(changes.moves, vec![Move::new(4, 0)]);
//! assert!(changes.deletions.contains(4));
//! assert!(changes.insertions.contains(0));
//! assert!(changes.modifications.contains(2));
//! ```

#![no_std]

extern crate alloc;

pub mod builder;
pub mod change_set;

pub use builder::CollectionChangeBuilder;
pub use change_set::{CollectionChangeSet, Move};
