//! Tether Reactive - Change notifications from committed transactions.
//!
//! Every commit leaves a transaction log behind. An observer that is a few
//! versions behind catches up by replaying those logs, and this crate turns
//! the replay into the changes its subscribers see:
//!
//! - `TransactLogInterpreter`: walks log instructions and feeds them to the
//!   change builders of tracked tables and link lists and to observed rows
//! - `SchemaChangeValidator`: rejects schema changes an observer cannot
//!   follow, according to its `SchemaMode`
//! - `advance` / `ReadView`: validate and replay a version range, publishing
//!   the results only if the whole range replayed cleanly
//! - `DeepChangeChecker`: answers whether a row or anything it links to
//!   changed
//! - `ChangeNotifier`: ties it together, delivering `CollectionChangeSet`s to
//!   subscriptions and per-row changes to a `BindingContext`
//!
//! # Example
//!
//! ```rust
//! use tether_core::schema::{Column, Schema, Table};
//! use tether_core::{DataType, SchemaMode};
//! use tether_reactive::{ObservedRows, ReadView, TransactionChangeInfo};
//! use tether_storage::Database;
//!
//! let schema = Schema::from_tables(vec![Table::new(
//!     "dog",
//!     vec![Column::new("age", DataType::Int)],
//! )])
//! .unwrap();
//! let mut db = Database::from_schema(&schema).unwrap();
//! let mut view = ReadView::new(db.version(), SchemaMode::Automatic);
//!
//! let mut tx = db.begin_write();
//! tx.add_empty_rows(0, 3).unwrap();
//! tx.set(0, 0, 1, 4i64).unwrap();
//! tx.commit().unwrap();
//!
//! let mut info = TransactionChangeInfo::new();
//! info.track_table(0, false);
//! view.advance(&db, &mut info, &mut ObservedRows::new()).unwrap();
//!
//! let changes = info.table_changes(0).cloned().unwrap_or_default().finalize();
//! assert_eq!(changes.insertions.count(), 3);
//! assert!(changes.modifications.is_empty());
//! assert_eq!(view.version(), db.version());
//! ```

#![no_std]

extern crate alloc;

pub mod change_info;
pub mod deep_change;
pub mod notifier;
pub mod observer;
pub mod schema_check;
pub mod subscription;
pub mod transact_log;

pub use change_info::{ListChangeInfo, TransactionChangeInfo};
pub use deep_change::{find_related_tables, DeepChangeChecker, LinkReader, RelatedTable, MAX_DEPTH};
pub use notifier::{BindingContext, ChangeNotifier, NotificationToken};
pub use observer::{ColumnInfo, Kind, ObservedRows, ObserverState, RowStatus};
pub use schema_check::{validate_schema_changes, SchemaChangeValidator};
pub use subscription::{ChangeCallback, SubscriptionId, SubscriptionManager};
pub use transact_log::{advance, LogSource, ReadView, TransactLogInterpreter};

// Re-export the changeset types subscribers receive
pub use tether_incremental::{CollectionChangeSet, Move};
