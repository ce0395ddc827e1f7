//! Data type definitions for Tether.
//!
//! This module defines the column types a table can hold. Two of them,
//! `Link` and `LinkList`, reference rows of another (or the same) table and
//! are what the change-tracking layers follow when propagating changes.

/// Supported column types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DataType {
    /// Boolean type (true/false)
    Bool,
    /// 64-bit signed integer
    Int,
    /// 64-bit floating point number
    Double,
    /// UTF-8 string
    String,
    /// Binary data
    Binary,
    /// Unix timestamp in milliseconds
    Timestamp,
    /// Nullable reference to a single row of the target table
    Link,
    /// Ordered list of references to rows of the target table
    LinkList,
}

impl DataType {
    /// Returns whether this type references another table.
    #[inline]
    pub fn is_link(&self) -> bool {
        matches!(self, DataType::Link | DataType::LinkList)
    }

    /// Returns whether this type is a list-typed property.
    #[inline]
    pub fn is_list(&self) -> bool {
        matches!(self, DataType::LinkList)
    }

    /// Returns whether this type is nullable by default.
    pub fn is_nullable_by_default(&self) -> bool {
        matches!(self, DataType::Link | DataType::Binary)
    }

    /// Returns whether a search index can be built over this type.
    pub fn is_indexable(&self) -> bool {
        !matches!(self, DataType::Binary | DataType::Link | DataType::LinkList)
    }
}
