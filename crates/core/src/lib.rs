//! Tether Core - Core types and schema definitions for Tether.
//!
//! This crate provides the foundational types shared by the change-tracking
//! crates of the workspace:
//!
//! - `DataType`: Column types, including `Link` and `LinkList` references
//! - `Value`: Runtime values stored in scalar and link cells
//! - `schema`: Table and column definitions, the ordered `Schema`, the
//!   `LinkGraph` derived from it and the observer `SchemaMode`
//! - `Error`: Error types shared by every crate
//!
//! # Example
//!
//! ```rust
//! use tether_core::DataType;
//! use tether_core::schema::{LinkGraph, Schema, TableBuilder};
//!
//! let person = TableBuilder::new("person")
//!     .unwrap()
//!     .add_column("name", DataType::String)
//!     .unwrap()
//!     .add_link_list("dogs", "dog")
//!     .unwrap()
//!     .build()
//!     .unwrap();
//! let dog = TableBuilder::new("dog")
//!     .unwrap()
//!     .add_column("name", DataType::String)
//!     .unwrap()
//!     .build()
//!     .unwrap();
//!
//! let schema = Schema::from_tables(vec![person, dog]).unwrap();
//! let links = LinkGraph::new(&schema);
//! assert_eq!(links.incoming(1).len(), 1);
//! ```

#![no_std]

extern crate alloc;

mod error;
pub mod schema;
mod types;
mod value;

pub use error::{Error, Result};
pub use schema::SchemaMode;
pub use types::DataType;
pub use value::Value;
