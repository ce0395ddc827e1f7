//! Row storage for a single table.
//!
//! Rows are addressed by position. Deleting a row moves the last row into its
//! slot, so positions stay dense.

use alloc::vec;
use alloc::vec::Vec;
use tether_core::schema::Column;
use tether_core::{Error, Result, Value};

/// The contents of one cell.
#[derive(Clone, Debug, PartialEq)]
pub enum Cell {
    /// A scalar or single-link cell.
    Value(Value),
    /// A link-list cell: target row indices in order.
    List(Vec<usize>),
}

impl Cell {
    /// Returns the cell a new row gets for `column`.
    pub fn default_for(column: &Column) -> Self {
        if column.data_type().is_list() {
            Cell::List(Vec::new())
        } else if column.is_nullable() {
            Cell::Value(Value::Null)
        } else {
            Cell::Value(Value::default_for(column.data_type()))
        }
    }

    #[inline]
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Cell::Value(v) => Some(v),
            Cell::List(_) => None,
        }
    }

    #[inline]
    pub fn as_list(&self) -> Option<&[usize]> {
        match self {
            Cell::List(l) => Some(l),
            Cell::Value(_) => None,
        }
    }
}

/// Row storage for a single table.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TableStore {
    rows: Vec<Vec<Cell>>,
}

impl TableStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    /// Returns the number of rows.
    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the store holds no rows.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Gets a cell by position.
    pub fn cell(&self, row: usize, column: usize) -> Option<&Cell> {
        self.rows.get(row)?.get(column)
    }

    /// Gets a scalar or link value by position.
    pub fn value(&self, row: usize, column: usize) -> Option<&Value> {
        self.cell(row, column)?.as_value()
    }

    /// Gets a link list by position.
    pub fn list(&self, row: usize, column: usize) -> Option<&[usize]> {
        self.cell(row, column)?.as_list()
    }

    pub(crate) fn cell_mut(&mut self, row: usize, column: usize) -> Result<&mut Cell> {
        let len = self.rows.len();
        let cells = self
            .rows
            .get_mut(row)
            .ok_or_else(|| Error::out_of_bounds("row", row, len))?;
        let width = cells.len();
        cells
            .get_mut(column)
            .ok_or_else(|| Error::out_of_bounds("column", column, width))
    }

    pub(crate) fn list_mut(&mut self, row: usize, column: usize) -> Result<&mut Vec<usize>> {
        match self.cell_mut(row, column)? {
            Cell::List(list) => Ok(list),
            Cell::Value(_) => Err(Error::invalid_operation("column is not a link list")),
        }
    }

    /// Inserts `count` default rows at `row`.
    pub(crate) fn insert_rows(&mut self, row: usize, count: usize, columns: &[Column]) {
        let template: Vec<Cell> = columns.iter().map(Cell::default_for).collect();
        self.rows
            .splice(row..row, (0..count).map(|_| template.clone()));
    }

    /// Removes `row` by moving the last row into its place.
    pub(crate) fn move_last_over(&mut self, row: usize) {
        self.rows.swap_remove(row);
    }

    pub(crate) fn swap_rows(&mut self, a: usize, b: usize) {
        self.rows.swap(a, b);
    }

    pub(crate) fn clear(&mut self) {
        self.rows.clear();
    }

    pub(crate) fn insert_column(&mut self, index: usize, column: &Column) {
        let cell = Cell::default_for(column);
        for cells in &mut self.rows {
            cells.insert(index, cell.clone());
        }
    }

    pub(crate) fn remove_column(&mut self, index: usize) {
        for cells in &mut self.rows {
            cells.remove(index);
        }
    }

    pub(crate) fn move_column(&mut self, from: usize, to: usize) {
        for cells in &mut self.rows {
            let cell = cells.remove(from);
            cells.insert(to, cell);
        }
    }

    /// Rewrites every link in `column` with `f`; `None` nulls a single link
    /// and drops a list entry.
    pub(crate) fn map_links(&mut self, column: usize, mut f: impl FnMut(usize) -> Option<usize>) {
        for cells in &mut self.rows {
            match &mut cells[column] {
                Cell::Value(value) => {
                    if let Some(target) = value.as_link() {
                        *value = f(target).map_or(Value::Null, Value::Link);
                    }
                }
                Cell::List(list) => {
                    let mut mapped = vec![];
                    for &target in list.iter() {
                        if let Some(t) = f(target) {
                            mapped.push(t);
                        }
                    }
                    *list = mapped;
                }
            }
        }
    }
}
