//! The tables of a database and their contents.

use crate::table_store::TableStore;
use alloc::string::ToString;
use alloc::vec::Vec;
use tether_core::schema::{IncomingLink, LinkGraph, Schema, Table};
use tether_core::{Error, Result, Value};

/// A group of tables: the schema plus one row store per table, in the same
/// physical order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Group {
    schema: Schema,
    stores: Vec<TableStore>,
}

impl Group {
    /// Creates a new empty group.
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    #[inline]
    pub fn table_count(&self) -> usize {
        self.stores.len()
    }

    /// Gets the rows of a table by position.
    #[inline]
    pub fn store(&self, table: usize) -> Option<&TableStore> {
        self.stores.get(table)
    }

    /// Returns the position of the table named `name`.
    pub fn table_index(&self, name: &str) -> Result<usize> {
        self.schema
            .table_index(name)
            .ok_or_else(|| Error::table_not_found(name))
    }

    /// Returns the number of rows in `table`, or 0 for an unknown table.
    pub fn row_count(&self, table: usize) -> usize {
        self.stores.get(table).map_or(0, TableStore::len)
    }

    /// Gets a scalar or link value.
    pub fn get(&self, table: usize, column: usize, row: usize) -> Result<&Value> {
        let store = self.store_ref(table)?;
        if row >= store.len() {
            return Err(Error::out_of_bounds("row", row, store.len()));
        }
        store
            .value(row, column)
            .ok_or_else(|| self.column_error(table, column))
    }

    /// Gets the target row of a link cell.
    pub fn link(&self, table: usize, column: usize, row: usize) -> Option<usize> {
        self.store(table)?.value(row, column)?.as_link()
    }

    /// Gets the targets of a link-list cell; empty if the cell is not a list.
    pub fn link_list(&self, table: usize, column: usize, row: usize) -> &[usize] {
        self.store(table)
            .and_then(|s| s.list(row, column))
            .unwrap_or(&[])
    }

    fn store_ref(&self, table: usize) -> Result<&TableStore> {
        self.stores
            .get(table)
            .ok_or_else(|| Error::out_of_bounds("table", table, self.stores.len()))
    }

    pub(crate) fn store_mut(&mut self, table: usize) -> Result<&mut TableStore> {
        let len = self.stores.len();
        self.stores
            .get_mut(table)
            .ok_or_else(|| Error::out_of_bounds("table", table, len))
    }

    pub(crate) fn table_def(&self, table: usize) -> Result<&Table> {
        self.schema
            .table(table)
            .ok_or_else(|| Error::out_of_bounds("table", table, self.stores.len()))
    }

    fn column_error(&self, table: usize, column: usize) -> Error {
        match self.schema.table(table) {
            Some(t) => Error::column_not_found(t.name(), column.to_string()),
            None => Error::out_of_bounds("table", table, self.stores.len()),
        }
    }

    pub(crate) fn schema_mut(&mut self) -> &mut Schema {
        &mut self.schema
    }

    pub(crate) fn insert_store(&mut self, index: usize, table: Table) -> Result<()> {
        self.schema.insert_table(index, table)?;
        self.stores.insert(index, TableStore::new());
        Ok(())
    }

    pub(crate) fn remove_store(&mut self, index: usize) -> Result<()> {
        self.schema.remove_table(index)?;
        self.stores.remove(index);
        Ok(())
    }

    pub(crate) fn move_store(&mut self, from: usize, to: usize) -> Result<()> {
        self.schema.move_table(from, to)?;
        let store = self.stores.remove(from);
        self.stores.insert(to, store);
        Ok(())
    }

    /// Link and link-list columns pointing into `table`.
    pub(crate) fn incoming_links(&self, table: usize) -> Vec<IncomingLink> {
        LinkGraph::new(&self.schema).incoming(table).to_vec()
    }

    /// Rewrites every link into `table` with `f`.
    pub(crate) fn map_links_into(&mut self, table: usize, mut f: impl FnMut(usize) -> Option<usize>) {
        for link in self.incoming_links(table) {
            if let Some(store) = self.stores.get_mut(link.origin) {
                store.map_links(link.column, &mut f);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_core::schema::Column;
    use tether_core::DataType;
    use alloc::vec;

    fn group() -> Group {
        let mut group = Group::new();
        group
            .insert_store(0, Table::new("dog", vec![Column::new("name", DataType::String)]))
            .unwrap();
        group
            .insert_store(
                1,
                Table::new(
                    "person",
                    vec![Column::link("best", "dog"), Column::link_list("dogs", "dog")],
                ),
            )
            .unwrap();
        let columns = group.schema().table(1).unwrap().columns().to_vec();
        group.store_mut(1).unwrap().insert_rows(0, 1, &columns);
        group
    }

    #[test]
    fn test_reads() {
        let group = group();
        assert_eq!(group.table_count(), 2);
        assert_eq!(group.table_index("person").unwrap(), 1);
        assert!(group.table_index("cat").is_err());
        assert_eq!(group.row_count(1), 1);
        assert_eq!(group.get(1, 0, 0).unwrap(), &Value::Null);
        assert!(group.get(1, 0, 1).is_err());
        assert!(group.get(1, 5, 0).is_err());
        assert_eq!(group.link(1, 0, 0), None);
        assert!(group.link_list(1, 1, 0).is_empty());
    }

    #[test]
    fn test_map_links_into() {
        let mut group = group();
        group.store_mut(1).unwrap().list_mut(0, 1).unwrap().extend([0, 1, 2]);
        group.map_links_into(0, |t| if t == 1 { None } else { Some(t) });
        assert_eq!(group.link_list(1, 1, 0), &[0, 2]);
        assert_eq!(group.incoming_links(0).len(), 2);
        assert!(group.incoming_links(1).is_empty());
    }
}
