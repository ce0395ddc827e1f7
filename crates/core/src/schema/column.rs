//! Column definition for Tether schemas.

use crate::types::DataType;
use alloc::string::String;

/// A column definition in a table schema.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Column {
    /// Column name.
    name: String,
    /// Data type of the column.
    data_type: DataType,
    /// Whether this column allows null values.
    nullable: bool,
    /// Whether a search index is maintained for this column.
    indexed: bool,
    /// Name of the table a link or link-list column points into.
    link_target: Option<String>,
}

impl Column {
    /// Creates a new column definition.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable: data_type.is_nullable_by_default(),
            indexed: false,
            link_target: None,
        }
    }

    /// Creates a link column pointing into `target`.
    pub fn link(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(name, DataType::Link).target(target)
    }

    /// Creates a link-list column pointing into `target`.
    pub fn link_list(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(name, DataType::LinkList).target(target)
    }

    /// Sets whether this column is nullable.
    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Sets whether this column carries a search index.
    pub fn indexed(mut self, indexed: bool) -> Self {
        self.indexed = indexed;
        self
    }

    /// Sets the link target table.
    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.link_target = Some(target.into());
        self
    }

    /// Returns the column name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the data type.
    #[inline]
    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Returns whether this column is nullable.
    #[inline]
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Returns whether this column has a search index.
    #[inline]
    pub fn is_indexed(&self) -> bool {
        self.indexed
    }

    /// Returns the name of the link target table.
    #[inline]
    pub fn link_target(&self) -> Option<&str> {
        self.link_target.as_deref()
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }

    pub(crate) fn set_indexed(&mut self, indexed: bool) {
        self.indexed = indexed;
    }

    pub(crate) fn retarget(&mut self, target: String) {
        self.link_target = Some(target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_new() {
        let col = Column::new("age", DataType::Int);
        assert_eq!(col.name(), "age");
        assert_eq!(col.data_type(), DataType::Int);
        assert!(!col.is_nullable());
        assert!(!col.is_indexed());
        assert_eq!(col.link_target(), None);
    }

    #[test]
    fn test_link_columns() {
        let link = Column::link("owner", "person");
        assert_eq!(link.data_type(), DataType::Link);
        assert!(link.is_nullable());
        assert_eq!(link.link_target(), Some("person"));

        let list = Column::link_list("dogs", "dog");
        assert_eq!(list.data_type(), DataType::LinkList);
        assert_eq!(list.link_target(), Some("dog"));
    }

    #[test]
    fn test_column_builder_flags() {
        let col = Column::new("name", DataType::String).indexed(true).nullable(true);
        assert!(col.is_indexed());
        assert!(col.is_nullable());
    }
}
