//! Value type definitions for Tether.
//!
//! This module defines the `Value` enum which represents anything that can be
//! written to a scalar or link cell. Link lists are not values; they are
//! mutated element by element through dedicated operations.

use crate::types::DataType;
use alloc::string::String;
use alloc::vec::Vec;

/// A value that can be stored in a scalar or link cell.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// Null value, also the null link
    Null,
    /// Boolean value
    Bool(bool),
    /// 64-bit signed integer
    Int(i64),
    /// 64-bit floating point
    Double(f64),
    /// UTF-8 string
    String(String),
    /// Binary data
    Binary(Vec<u8>),
    /// Unix timestamp in milliseconds
    Timestamp(i64),
    /// Row index in the link column's target table
    Link(usize),
}

impl Value {
    /// Returns the data type of this value, or None if it's Null.
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Value::Null => None,
            Value::Bool(_) => Some(DataType::Bool),
            Value::Int(_) => Some(DataType::Int),
            Value::Double(_) => Some(DataType::Double),
            Value::String(_) => Some(DataType::String),
            Value::Binary(_) => Some(DataType::Binary),
            Value::Timestamp(_) => Some(DataType::Timestamp),
            Value::Link(_) => Some(DataType::Link),
        }
    }

    /// Returns the value a fresh cell of the given type holds.
    pub fn default_for(data_type: DataType) -> Self {
        match data_type {
            DataType::Bool => Value::Bool(false),
            DataType::Int => Value::Int(0),
            DataType::Double => Value::Double(0.0),
            DataType::String => Value::String(String::new()),
            DataType::Binary | DataType::Link | DataType::LinkList => Value::Null,
            DataType::Timestamp => Value::Timestamp(0),
        }
    }

    /// Returns whether this value can be stored in a column of the given type.
    pub fn fits(&self, data_type: DataType, nullable: bool) -> bool {
        match self.data_type() {
            None => nullable,
            Some(t) => t == data_type,
        }
    }

    /// Returns true if this is a null value.
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the value as an i64, if it is an integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the target row, if this is a non-null link.
    pub fn as_link(&self) -> Option<usize> {
        match self {
            Value::Link(row) => Some(*row),
            _ => None,
        }
    }

    /// Returns the value as a string slice, if it is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_data_type() {
        assert_eq!(Value::Null.data_type(), None);
        assert_eq!(Value::Int(1).data_type(), Some(DataType::Int));
        assert_eq!(Value::Link(3).data_type(), Some(DataType::Link));
    }

    #[test]
    fn test_value_fits() {
        assert!(Value::Int(1).fits(DataType::Int, false));
        assert!(!Value::Int(1).fits(DataType::String, true));
        assert!(Value::Null.fits(DataType::Link, true));
        assert!(!Value::Null.fits(DataType::Int, false));
    }

    #[test]
    fn test_default_for() {
        assert_eq!(Value::default_for(DataType::Int), Value::Int(0));
        assert_eq!(Value::default_for(DataType::Link), Value::Null);
    }

    #[test]
    fn test_accessors() {
        assert_eq!(Value::Link(4).as_link(), Some(4));
        assert_eq!(Value::Null.as_link(), None);
        assert_eq!(Value::from(7).as_int(), Some(7));
        assert_eq!(Value::from("x").as_str(), Some("x"));
    }
}
