//! Tether Storage - In-memory versioned storage for Tether.
//!
//! This crate provides the storage engine the change-tracking layers read
//! from:
//!
//! - `Group`: the schema and the rows of every table
//! - `TableStore`: positional row storage for one table
//! - `Database`: the current group plus the log and schema of every commit
//! - `WriteTransaction`: mutations that record a `TransactLog`
//! - `Instruction`: one entry of the physical transaction log
//!
//! # Example
//!
//! ```rust
//! use tether_core::schema::{Schema, TableBuilder};
//! use tether_core::{DataType, Value};
//! use tether_storage::{Database, Instruction};
//!
//! let dog = TableBuilder::new("dog")
//!     .unwrap()
//!     .add_column("age", DataType::Int)
//!     .unwrap()
//!     .build()
//!     .unwrap();
//! let mut db = Database::from_schema(&Schema::from_tables(vec![dog]).unwrap()).unwrap();
//!
//! let mut tx = db.begin_write();
//! let row = tx.add_empty_rows(0, 1).unwrap();
//! tx.set(0, 0, row, 3i64).unwrap();
//! let version = tx.commit().unwrap();
//!
//! assert_eq!(db.group().get(0, 0, row).unwrap(), &Value::Int(3));
//! let log = &db.logs_between(version - 1, version).unwrap()[0];
//! assert_eq!(log.instructions()[0], Instruction::SelectTable { table: 0 });
//! ```

#![no_std]

extern crate alloc;

pub mod database;
pub mod group;
pub mod log;
pub mod table_store;
pub mod transaction;

pub use database::{Database, VersionId};
pub use group::Group;
pub use log::{Instruction, TransactLog};
pub use table_store::{Cell, TableStore};
pub use transaction::WriteTransaction;
