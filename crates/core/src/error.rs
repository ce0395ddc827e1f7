//! Error types for Tether.

use crate::types::DataType;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use thiserror::Error;

/// Result type alias for Tether operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Error types for Tether operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Type mismatch error.
    #[error("Type mismatch: expected {expected:?}, got {got:?}")]
    TypeMismatch { expected: DataType, got: DataType },
    /// Invalid schema definition.
    #[error("Invalid schema: {message}")]
    InvalidSchema { message: String },
    /// Table not found.
    #[error("Table not found: {name}")]
    TableNotFound { name: String },
    /// Column not found.
    #[error("Column {column} not found in table {table}")]
    ColumnNotFound { table: String, column: String },
    /// Row, column, table or list position out of range.
    #[error("{what} index {index} out of bounds (len {len})")]
    IndexOutOfBounds {
        what: &'static str,
        index: usize,
        len: usize,
    },
    /// Invalid operation.
    #[error("Invalid operation: {message}")]
    InvalidOperation { message: String },
    /// A committed schema change is not allowed under the observer's schema mode.
    #[error("Migration is required due to the following errors:{}", bullet_list(.errors))]
    SchemaMismatch { errors: Vec<String> },
    /// The transaction log contradicts the interpreter's view of the tables.
    #[error("Invalid transaction log: {message}")]
    InvalidLog { message: String },
    /// The observed row was deleted.
    #[error("Row {row} of table {table} was invalidated")]
    Invalidated { table: usize, row: usize },
    /// The requested version is not retained.
    #[error("Unknown version: {version}")]
    UnknownVersion { version: u64 },
}

fn bullet_list(errors: &[String]) -> String {
    errors.iter().map(|e| format!("\n- {}", e)).collect()
}

impl Error {
    /// Creates a type mismatch error.
    pub fn type_mismatch(expected: DataType, got: DataType) -> Self {
        Error::TypeMismatch { expected, got }
    }

    /// Creates an invalid schema error.
    pub fn invalid_schema(message: impl Into<String>) -> Self {
        Error::InvalidSchema {
            message: message.into(),
        }
    }

    /// Creates a table not found error.
    pub fn table_not_found(name: impl Into<String>) -> Self {
        Error::TableNotFound { name: name.into() }
    }

    /// Creates a column not found error.
    pub fn column_not_found(table: impl Into<String>, column: impl Into<String>) -> Self {
        Error::ColumnNotFound {
            table: table.into(),
            column: column.into(),
        }
    }

    /// Creates an out of bounds error.
    pub fn out_of_bounds(what: &'static str, index: usize, len: usize) -> Self {
        Error::IndexOutOfBounds { what, index, len }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Error::InvalidOperation {
            message: message.into(),
        }
    }

    /// Creates an invalid log error.
    pub fn invalid_log(message: impl Into<String>) -> Self {
        Error::InvalidLog {
            message: message.into(),
        }
    }

    /// Returns true if this error was caused by a rejected schema change.
    pub fn is_schema_mismatch(&self) -> bool {
        matches!(self, Error::SchemaMismatch { .. })
    }
}
