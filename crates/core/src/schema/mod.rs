//! Schema module for Tether.
//!
//! This module contains the schema definitions: columns, tables, the ordered
//! group of tables (`Schema`), the link graph derived from it and the schema
//! mode an observer uses to decide which committed schema changes it accepts.

mod column;
mod links;
mod table;

pub use column::Column;
pub use links::{IncomingLink, LinkGraph, OutgoingLink};
pub use table::{Table, TableBuilder};

use crate::error::{Error, Result};
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

/// How strictly an observer treats schema changes committed by other writers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SchemaMode {
    /// Only new tables and search index changes are accepted.
    #[default]
    Automatic,
    /// Additionally accepts new columns and column/table reordering.
    Additive,
}

impl SchemaMode {
    /// Returns whether columns may be added to or reordered in existing tables.
    #[inline]
    pub fn allows_additive_changes(&self) -> bool {
        matches!(self, SchemaMode::Additive)
    }
}

/// The ordered set of tables of a database at one version.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Schema {
    tables: Vec<Table>,
}

impl Schema {
    /// Creates an empty schema.
    pub fn new() -> Self {
        Self { tables: Vec::new() }
    }

    /// Creates a schema from tables, checking names and link targets.
    pub fn from_tables(tables: Vec<Table>) -> Result<Self> {
        let schema = Self { tables };
        schema.validate()?;
        Ok(schema)
    }

    /// Checks that table names are unique and every link target exists.
    pub fn validate(&self) -> Result<()> {
        for (i, table) in self.tables.iter().enumerate() {
            if self.tables[..i].iter().any(|t| t.name() == table.name()) {
                return Err(Error::invalid_schema(format!(
                    "Duplicate table: {}",
                    table.name()
                )));
            }
            for column in table.columns() {
                if let Some(target) = column.link_target() {
                    if self.table_index(target).is_none() {
                        return Err(Error::invalid_schema(format!(
                            "Link {}.{} targets unknown table {}",
                            table.name(),
                            column.name(),
                            target
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Returns the tables in physical order.
    #[inline]
    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    /// Returns the number of tables.
    #[inline]
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Returns true if there are no tables.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Gets a table by position.
    #[inline]
    pub fn table(&self, index: usize) -> Option<&Table> {
        self.tables.get(index)
    }

    /// Gets a table by name.
    pub fn get_table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name() == name)
    }

    /// Gets a table index by name.
    pub fn table_index(&self, name: &str) -> Option<usize> {
        self.tables.iter().position(|t| t.name() == name)
    }

    /// Resolves the target table index of a link or link-list column.
    pub fn link_target(&self, table: usize, column: usize) -> Option<usize> {
        let target = self.table(table)?.column(column)?.link_target()?;
        self.table_index(target)
    }

    /// Gets a mutable table by position.
    pub fn table_mut(&mut self, index: usize) -> Result<&mut Table> {
        let len = self.tables.len();
        self.tables
            .get_mut(index)
            .ok_or_else(|| Error::out_of_bounds("table", index, len))
    }

    /// Inserts a table at `index`.
    pub fn insert_table(&mut self, index: usize, table: Table) -> Result<()> {
        if index > self.tables.len() {
            return Err(Error::out_of_bounds("table", index, self.tables.len()));
        }
        if self.table_index(table.name()).is_some() {
            return Err(Error::invalid_schema(format!(
                "Duplicate table: {}",
                table.name()
            )));
        }
        self.tables.insert(index, table);
        Ok(())
    }

    /// Removes the table at `index`. Fails while other tables link to it.
    pub fn remove_table(&mut self, index: usize) -> Result<Table> {
        let name = match self.table(index) {
            Some(t) => String::from(t.name()),
            None => return Err(Error::out_of_bounds("table", index, self.tables.len())),
        };
        let linked_from = self.tables.iter().enumerate().any(|(i, t)| {
            i != index && t.columns().iter().any(|c| c.link_target() == Some(name.as_str()))
        });
        if linked_from {
            return Err(Error::invalid_operation(format!(
                "Table {} is the target of a link",
                name
            )));
        }
        Ok(self.tables.remove(index))
    }

    /// Moves the table at `from` so that it ends up at `to`.
    pub fn move_table(&mut self, from: usize, to: usize) -> Result<()> {
        let len = self.tables.len();
        if from >= len {
            return Err(Error::out_of_bounds("table", from, len));
        }
        if to >= len {
            return Err(Error::out_of_bounds("table", to, len));
        }
        let table = self.tables.remove(from);
        self.tables.insert(to, table);
        Ok(())
    }

    /// Renames the table at `index` and every link column targeting it.
    pub fn rename_table(&mut self, index: usize, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        if self.table_index(&name).is_some_and(|i| i != index) {
            return Err(Error::invalid_schema(format!("Duplicate table: {}", name)));
        }
        let old = String::from(self.table_mut(index)?.name());
        self.tables[index].rename(name.clone())?;
        for table in &mut self.tables {
            table.retarget_links(&old, &name);
        }
        Ok(())
    }
}
