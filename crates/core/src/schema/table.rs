//! Table definition for Tether schemas.

use super::column::Column;
use crate::error::{Error, Result};
use crate::types::DataType;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

/// A table definition in the database schema.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Table {
    /// Table name.
    name: String,
    /// Column definitions, in physical order.
    columns: Vec<Column>,
}

impl Table {
    /// Creates a new table with the given name and columns.
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }

    /// Returns the table name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the columns.
    #[inline]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Returns the number of columns.
    #[inline]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Gets a column by position.
    #[inline]
    pub fn column(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    /// Gets a column by name.
    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    /// Gets a column index by name.
    pub fn get_column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name() == name)
    }

    /// Inserts a column at `index`, shifting later columns right.
    pub fn insert_column(&mut self, index: usize, column: Column) -> Result<()> {
        if index > self.columns.len() {
            return Err(Error::out_of_bounds("column", index, self.columns.len()));
        }
        TableBuilder::check_naming_rules(column.name())?;
        if self.get_column(column.name()).is_some() {
            return Err(Error::invalid_schema(format!(
                "Column already exists: {}",
                column.name()
            )));
        }
        if column.data_type().is_link() && column.link_target().is_none() {
            return Err(Error::invalid_schema(format!(
                "Link column has no target: {}",
                column.name()
            )));
        }
        self.columns.insert(index, column);
        Ok(())
    }

    /// Removes and returns the column at `index`.
    pub fn remove_column(&mut self, index: usize) -> Result<Column> {
        self.check_column(index)?;
        Ok(self.columns.remove(index))
    }

    /// Moves the column at `from` so that it ends up at `to`.
    pub fn move_column(&mut self, from: usize, to: usize) -> Result<()> {
        self.check_column(from)?;
        self.check_column(to)?;
        let column = self.columns.remove(from);
        self.columns.insert(to, column);
        Ok(())
    }

    /// Renames the column at `index`.
    pub fn rename_column(&mut self, index: usize, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        self.check_column(index)?;
        TableBuilder::check_naming_rules(&name)?;
        if self.get_column_index(&name).is_some_and(|i| i != index) {
            return Err(Error::invalid_schema(format!("Column already exists: {}", name)));
        }
        self.columns[index].set_name(name);
        Ok(())
    }

    /// Adds or removes the search index of the column at `index`.
    pub fn set_indexed(&mut self, index: usize, indexed: bool) -> Result<()> {
        self.check_column(index)?;
        if indexed && !self.columns[index].data_type().is_indexable() {
            return Err(Error::invalid_schema(format!(
                "Column is not indexable: {}",
                self.columns[index].name()
            )));
        }
        self.columns[index].set_indexed(indexed);
        Ok(())
    }

    /// Renames the table.
    pub fn rename(&mut self, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        TableBuilder::check_naming_rules(&name)?;
        self.name = name;
        Ok(())
    }

    /// Points every link column targeting `from` at `to` instead.
    pub fn retarget_links(&mut self, from: &str, to: &str) {
        for column in &mut self.columns {
            if column.link_target() == Some(from) {
                column.retarget(to.into());
            }
        }
    }

    fn check_column(&self, index: usize) -> Result<()> {
        if index >= self.columns.len() {
            return Err(Error::out_of_bounds("column", index, self.columns.len()));
        }
        Ok(())
    }
}

/// Builder for creating table definitions.
pub struct TableBuilder {
    name: String,
    columns: Vec<Column>,
}

impl TableBuilder {
    /// Creates a new table builder.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        Self::check_naming_rules(&name)?;
        Ok(Self {
            name,
            columns: Vec::new(),
        })
    }

    /// Validates a name follows naming rules.
    pub(crate) fn check_naming_rules(name: &str) -> Result<()> {
        let mut chars = name.chars();
        let first = match chars.next() {
            Some(c) => c,
            None => return Err(Error::invalid_schema("Name cannot be empty")),
        };
        if !first.is_ascii_alphabetic() && first != '_' {
            return Err(Error::invalid_schema(format!(
                "Name must start with letter or underscore: {}",
                name
            )));
        }
        if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(Error::invalid_schema(format!(
                "Name contains invalid characters: {}",
                name
            )));
        }
        Ok(())
    }

    fn push(mut self, column: Column) -> Result<Self> {
        Self::check_naming_rules(column.name())?;
        if self.columns.iter().any(|c| c.name() == column.name()) {
            return Err(Error::invalid_schema(format!(
                "Column already exists: {}",
                column.name()
            )));
        }
        self.columns.push(column);
        Ok(self)
    }

    /// Adds a scalar column to the table.
    pub fn add_column(self, name: impl Into<String>, data_type: DataType) -> Result<Self> {
        if data_type.is_link() {
            return Err(Error::invalid_schema(
                "Link columns need a target, use add_link or add_link_list",
            ));
        }
        self.push(Column::new(name, data_type))
    }

    /// Adds a link column pointing into `target`.
    pub fn add_link(self, name: impl Into<String>, target: impl Into<String>) -> Result<Self> {
        let target = target.into();
        Self::check_naming_rules(&target)?;
        self.push(Column::link(name, target))
    }

    /// Adds a link-list column pointing into `target`.
    pub fn add_link_list(
        self,
        name: impl Into<String>,
        target: impl Into<String>,
    ) -> Result<Self> {
        let target = target.into();
        Self::check_naming_rules(&target)?;
        self.push(Column::link_list(name, target))
    }

    /// Adds a search index on an existing column.
    pub fn add_index(mut self, column: &str) -> Result<Self> {
        let col = self
            .columns
            .iter_mut()
            .find(|c| c.name() == column)
            .ok_or_else(|| Error::invalid_schema(format!("Column not found: {}", column)))?;
        if !col.data_type().is_indexable() {
            return Err(Error::invalid_schema(format!(
                "Column is not indexable: {}",
                column
            )));
        }
        col.set_indexed(true);
        Ok(self)
    }

    /// Marks columns as nullable.
    pub fn add_nullable(mut self, columns: &[&str]) -> Self {
        for name in columns {
            if let Some(col) = self.columns.iter_mut().find(|c| c.name() == *name) {
                *col = col.clone().nullable(true);
            }
        }
        self
    }

    /// Builds the table definition.
    pub fn build(self) -> Result<Table> {
        Ok(Table {
            name: self.name,
            columns: self.columns,
        })
    }
}
