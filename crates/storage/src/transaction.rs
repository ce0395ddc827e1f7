//! Write transactions.
//!
//! A `WriteTransaction` mutates the database in place and records every
//! change in a `TransactLog`. Deleting or clearing rows that other rows link
//! to writes nullify entries for those links before the deletion itself;
//! retargeting after a move and shifting after an insert are silent.

use crate::database::{Database, VersionId};
use crate::group::Group;
use crate::log::{Instruction, TransactLog};
use crate::table_store::Cell;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use tether_core::schema::{Column, Table};
use tether_core::{Error, Result, Value};
use tracing::{debug, trace};

/// An open write transaction.
///
/// Dropping the transaction without calling [`commit`](Self::commit) restores
/// the database to its state at [`Database::begin_write`].
pub struct WriteTransaction<'a> {
    db: &'a mut Database,
    /// Contents at the start, restored on rollback.
    snapshot: Option<Group>,
    log: TransactLog,
}

impl<'a> WriteTransaction<'a> {
    pub(crate) fn new(db: &'a mut Database) -> Self {
        let snapshot = Some(db.group.clone());
        Self {
            db,
            snapshot,
            log: TransactLog::new(),
        }
    }

    /// Returns the current contents, including uncommitted changes.
    #[inline]
    pub fn group(&self) -> &Group {
        &self.db.group
    }

    /// Returns the instructions recorded so far.
    #[inline]
    pub fn log(&self) -> &TransactLog {
        &self.log
    }

    /// Commits the transaction and returns the new version.
    pub fn commit(mut self) -> Result<VersionId> {
        self.db.group.schema().validate()?;
        let log = core::mem::take(&mut self.log);
        let instructions = log.len();
        self.snapshot = None;

        self.db.commits.push(log);
        let schema = self.db.group.schema().clone();
        self.db.schemas.push(schema);
        let version = self.db.version();
        debug!(version, instructions, "committed write transaction");
        Ok(version)
    }

    /// Discards every change made by the transaction.
    pub fn rollback(self) {
        trace!(instructions = self.log.len(), "rolling back write transaction");
    }

    // ---- tables ----

    /// Appends a table and returns its index.
    pub fn add_table(&mut self, table: Table) -> Result<usize> {
        let index = self.db.group.table_count();
        self.insert_table(index, table)?;
        Ok(index)
    }

    /// Inserts a table at `index`. Link columns may target existing tables
    /// or the table itself.
    pub fn insert_table(&mut self, index: usize, table: Table) -> Result<()> {
        let schema = self.db.group.schema();
        if index > schema.len() {
            return Err(Error::out_of_bounds("table", index, schema.len()));
        }
        if schema.table_index(table.name()).is_some() {
            return Err(Error::invalid_schema(format!(
                "Duplicate table: {}",
                table.name()
            )));
        }
        // check every column before touching anything
        let mut scratch = Table::new(table.name(), Vec::new());
        for column in table.columns() {
            if let Some(target) = column.link_target() {
                if target != table.name() && schema.table_index(target).is_none() {
                    return Err(Error::table_not_found(target));
                }
            }
            scratch.insert_column(scratch.column_count(), column.clone())?;
        }

        self.db
            .group
            .insert_store(index, Table::new(table.name(), Vec::new()))?;
        self.log.group_op(Instruction::InsertTable {
            table: index,
            name: String::from(table.name()),
        });
        for (i, column) in table.columns().iter().enumerate() {
            self.insert_column(index, i, column.clone())?;
        }
        Ok(())
    }

    /// Removes the table at `index`. Fails while other tables link to it.
    pub fn remove_table(&mut self, index: usize) -> Result<()> {
        self.db.group.remove_store(index)?;
        self.log.group_op(Instruction::EraseTable { table: index });
        Ok(())
    }

    pub fn rename_table(&mut self, index: usize, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        self.db.group.schema_mut().rename_table(index, name.clone())?;
        self.log
            .group_op(Instruction::RenameTable { table: index, name });
        Ok(())
    }

    /// Moves the table at `from` so that it ends up at `to`.
    pub fn move_table(&mut self, from: usize, to: usize) -> Result<()> {
        self.db.group.move_store(from, to)?;
        if from != to {
            self.log.group_op(Instruction::MoveTable { from, to });
        }
        Ok(())
    }

    // ---- columns ----

    /// Appends a column to `table` and returns its index.
    pub fn add_column(&mut self, table: usize, column: Column) -> Result<usize> {
        let index = self.db.group.table_def(table)?.column_count();
        self.insert_column(table, index, column)?;
        Ok(index)
    }

    /// Inserts a column; existing rows get the column's default value.
    pub fn insert_column(&mut self, table: usize, index: usize, column: Column) -> Result<()> {
        if let Some(target) = column.link_target() {
            if self.db.group.schema().table_index(target).is_none() {
                return Err(Error::table_not_found(target));
            }
        }
        self.db
            .group
            .schema_mut()
            .table_mut(table)?
            .insert_column(index, column.clone())?;
        self.db.group.store_mut(table)?.insert_column(index, &column);
        self.log.table_op(
            table,
            Instruction::InsertColumn {
                column: index,
                name: String::from(column.name()),
                data_type: column.data_type(),
                link_target: column.link_target().map(String::from),
            },
        );
        Ok(())
    }

    pub fn remove_column(&mut self, table: usize, column: usize) -> Result<()> {
        self.db
            .group
            .schema_mut()
            .table_mut(table)?
            .remove_column(column)?;
        self.db.group.store_mut(table)?.remove_column(column);
        self.log
            .table_op(table, Instruction::EraseColumn { column });
        Ok(())
    }

    pub fn rename_column(&mut self, table: usize, column: usize, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        self.db
            .group
            .schema_mut()
            .table_mut(table)?
            .rename_column(column, name.clone())?;
        self.log
            .table_op(table, Instruction::RenameColumn { column, name });
        Ok(())
    }

    pub fn move_column(&mut self, table: usize, from: usize, to: usize) -> Result<()> {
        self.db
            .group
            .schema_mut()
            .table_mut(table)?
            .move_column(from, to)?;
        if from != to {
            self.db.group.store_mut(table)?.move_column(from, to);
            self.log
                .table_op(table, Instruction::MoveColumn { from, to });
        }
        Ok(())
    }

    pub fn add_search_index(&mut self, table: usize, column: usize) -> Result<()> {
        self.db
            .group
            .schema_mut()
            .table_mut(table)?
            .set_indexed(column, true)?;
        self.log
            .table_op(table, Instruction::AddSearchIndex { column });
        Ok(())
    }

    pub fn remove_search_index(&mut self, table: usize, column: usize) -> Result<()> {
        self.db
            .group
            .schema_mut()
            .table_mut(table)?
            .set_indexed(column, false)?;
        self.log
            .table_op(table, Instruction::RemoveSearchIndex { column });
        Ok(())
    }

    // ---- rows ----

    fn check_row(&self, table: usize, row: usize) -> Result<usize> {
        self.db.group.table_def(table)?;
        let len = self.db.group.row_count(table);
        if row >= len {
            return Err(Error::out_of_bounds("row", row, len));
        }
        Ok(len)
    }

    /// Appends `count` empty rows and returns the index of the first one.
    pub fn add_empty_rows(&mut self, table: usize, count: usize) -> Result<usize> {
        let row = self.db.group.row_count(table);
        self.insert_empty_rows(table, row, count)?;
        Ok(row)
    }

    /// Inserts one empty row at `row`.
    #[inline]
    pub fn insert_empty_row(&mut self, table: usize, row: usize) -> Result<()> {
        self.insert_empty_rows(table, row, 1)
    }

    /// Inserts `count` empty rows at `row`, shifting later rows and the links
    /// that point at them.
    pub fn insert_empty_rows(&mut self, table: usize, row: usize, count: usize) -> Result<()> {
        let columns = self.db.group.table_def(table)?.columns().to_vec();
        let prior_size = self.db.group.row_count(table);
        if row > prior_size {
            return Err(Error::out_of_bounds("row", row, prior_size));
        }
        if count == 0 {
            return Ok(());
        }
        self.db.group.store_mut(table)?.insert_rows(row, count, &columns);
        if row < prior_size {
            self.db
                .group
                .map_links_into(table, |t| Some(if t >= row { t + count } else { t }));
        }
        self.log.table_op(
            table,
            Instruction::InsertEmptyRows {
                row,
                count,
                prior_size,
            },
        );
        Ok(())
    }

    /// Deletes `row` by moving the last row of the table over it.
    pub fn move_last_over(&mut self, table: usize, row: usize) -> Result<()> {
        let prior_size = self.check_row(table, row)?;
        self.nullify_links_into(table, true, |target| target == row)?;

        self.db.group.store_mut(table)?.move_last_over(row);
        self.log
            .table_op(table, Instruction::MoveLastOver { row, prior_size });

        let last = prior_size - 1;
        if row != last {
            self.db
                .group
                .map_links_into(table, |t| Some(if t == last { row } else { t }));
        }
        Ok(())
    }

    /// Clears and logs every link and list entry pointing at a row of
    /// `table` for which `is_target` holds. Links from `table` itself are
    /// only visited with `same_table`.
    fn nullify_links_into(
        &mut self,
        table: usize,
        same_table: bool,
        is_target: impl Fn(usize) -> bool,
    ) -> Result<()> {
        for link in self.db.group.incoming_links(table) {
            if link.origin == table && !same_table {
                continue;
            }
            let column = link.column;
            for origin_row in 0..self.db.group.row_count(link.origin) {
                if link.is_list {
                    let list = self.db.group.store_mut(link.origin)?.list_mut(origin_row, column)?;
                    while let Some(index) = list.iter().position(|&t| is_target(t)) {
                        list.remove(index);
                        self.log.list_op(
                            link.origin,
                            column,
                            origin_row,
                            Instruction::LinkListNullify { index },
                        );
                    }
                } else if self.db.group.link(link.origin, column, origin_row).is_some_and(&is_target) {
                    *self.db.group.store_mut(link.origin)?.cell_mut(origin_row, column)? =
                        Cell::Value(Value::Null);
                    self.log.table_op(
                        link.origin,
                        Instruction::NullifyLink {
                            column,
                            row: origin_row,
                        },
                    );
                }
            }
        }
        Ok(())
    }

    /// Exchanges two rows; links follow the rows.
    pub fn swap_rows(&mut self, table: usize, row1: usize, row2: usize) -> Result<()> {
        self.check_row(table, row1)?;
        self.check_row(table, row2)?;
        if row1 == row2 {
            return Ok(());
        }
        self.db.group.store_mut(table)?.swap_rows(row1, row2);
        self.db.group.map_links_into(table, |t| {
            Some(if t == row1 {
                row2
            } else if t == row2 {
                row1
            } else {
                t
            })
        });
        self.log
            .table_op(table, Instruction::SwapRows { row1, row2 });
        Ok(())
    }

    /// Deletes every row of `table`. Links from other tables into it are
    /// nulled and logged the way `move_last_over` logs them.
    pub fn clear_table(&mut self, table: usize) -> Result<()> {
        self.db.group.table_def(table)?;
        let prior_size = self.db.group.row_count(table);
        self.nullify_links_into(table, false, |_| true)?;
        self.db.group.store_mut(table)?.clear();
        self.log
            .table_op(table, Instruction::ClearTable { prior_size });
        Ok(())
    }

    // ---- values ----

    /// Assigns a scalar or link cell.
    pub fn set(&mut self, table: usize, column: usize, row: usize, value: impl Into<Value>) -> Result<()> {
        self.set_value(table, column, row, value.into(), false)
    }

    /// Assigns a cell as part of filling in defaults, for example while
    /// migrating data into a new column. Observers do not see it as a change.
    pub fn set_default(&mut self, table: usize, column: usize, row: usize, value: impl Into<Value>) -> Result<()> {
        self.set_value(table, column, row, value.into(), true)
    }

    /// Points a link cell at `target`, or nulls it.
    pub fn set_link(&mut self, table: usize, column: usize, row: usize, target: Option<usize>) -> Result<()> {
        self.set(table, column, row, target.map_or(Value::Null, Value::Link))
    }

    fn set_value(&mut self, table: usize, column: usize, row: usize, value: Value, is_default: bool) -> Result<()> {
        let def = self.db.group.table_def(table)?;
        let col = def
            .column(column)
            .ok_or_else(|| Error::column_not_found(def.name(), format!("{}", column)))?;
        let data_type = col.data_type();
        if data_type.is_list() {
            return Err(Error::invalid_operation(format!(
                "{} is a link list; use the list operations",
                col.name()
            )));
        }
        if !value.fits(data_type, col.is_nullable()) {
            return Err(match value.data_type() {
                Some(got) => Error::type_mismatch(data_type, got),
                None => Error::invalid_operation(format!("{} is not nullable", col.name())),
            });
        }
        if let Some(target) = value.as_link() {
            self.check_target(table, column, target)?;
        }
        self.check_row(table, row)?;

        *self.db.group.store_mut(table)?.cell_mut(row, column)? = Cell::Value(value.clone());
        self.log.table_op(
            table,
            Instruction::Set {
                column,
                row,
                value,
                is_default,
            },
        );
        Ok(())
    }

    /// Checks that `target` is a row of the table `column` links to.
    fn check_target(&self, table: usize, column: usize, target: usize) -> Result<()> {
        let target_table = self
            .db
            .group
            .schema()
            .link_target(table, column)
            .ok_or_else(|| Error::invalid_schema("link column without a target table"))?;
        let len = self.db.group.row_count(target_table);
        if target >= len {
            return Err(Error::out_of_bounds("link target", target, len));
        }
        Ok(())
    }

    // ---- link lists ----

    /// Returns the current length of a link list.
    fn list_len(&self, table: usize, column: usize, row: usize) -> Result<usize> {
        self.check_row(table, row)?;
        let store = self
            .db
            .group
            .store(table)
            .ok_or_else(|| Error::out_of_bounds("table", table, self.db.group.table_count()))?;
        store
            .list(row, column)
            .map(|l| l.len())
            .ok_or_else(|| Error::invalid_operation("column is not a link list"))
    }

    fn list_mut(&mut self, table: usize, column: usize, row: usize) -> Result<&mut Vec<usize>> {
        self.db.group.store_mut(table)?.list_mut(row, column)
    }

    fn check_index(index: usize, len: usize) -> Result<()> {
        if index >= len {
            return Err(Error::out_of_bounds("list", index, len));
        }
        Ok(())
    }

    /// Appends `target` to a link list.
    pub fn list_add(&mut self, table: usize, column: usize, row: usize, target: usize) -> Result<()> {
        let len = self.list_len(table, column, row)?;
        self.list_insert(table, column, row, len, target)
    }

    pub fn list_insert(&mut self, table: usize, column: usize, row: usize, index: usize, target: usize) -> Result<()> {
        let len = self.list_len(table, column, row)?;
        if index > len {
            return Err(Error::out_of_bounds("list", index, len));
        }
        self.check_target(table, column, target)?;
        self.list_mut(table, column, row)?.insert(index, target);
        self.log
            .list_op(table, column, row, Instruction::LinkListInsert { index, target });
        Ok(())
    }

    pub fn list_set(&mut self, table: usize, column: usize, row: usize, index: usize, target: usize) -> Result<()> {
        Self::check_index(index, self.list_len(table, column, row)?)?;
        self.check_target(table, column, target)?;
        self.list_mut(table, column, row)?[index] = target;
        self.log
            .list_op(table, column, row, Instruction::LinkListSet { index, target });
        Ok(())
    }

    pub fn list_remove(&mut self, table: usize, column: usize, row: usize, index: usize) -> Result<()> {
        Self::check_index(index, self.list_len(table, column, row)?)?;
        self.list_mut(table, column, row)?.remove(index);
        self.log
            .list_op(table, column, row, Instruction::LinkListErase { index });
        Ok(())
    }

    /// Moves the entry at `from` so that it ends up at `to`.
    pub fn list_move(&mut self, table: usize, column: usize, row: usize, from: usize, to: usize) -> Result<()> {
        let len = self.list_len(table, column, row)?;
        Self::check_index(from, len)?;
        Self::check_index(to, len)?;
        if from == to {
            return Ok(());
        }
        let list = self.list_mut(table, column, row)?;
        let target = list.remove(from);
        list.insert(to, target);
        self.log
            .list_op(table, column, row, Instruction::LinkListMove { from, to });
        Ok(())
    }

    pub fn list_swap(&mut self, table: usize, column: usize, row: usize, index1: usize, index2: usize) -> Result<()> {
        let len = self.list_len(table, column, row)?;
        Self::check_index(index1, len)?;
        Self::check_index(index2, len)?;
        if index1 == index2 {
            return Ok(());
        }
        self.list_mut(table, column, row)?.swap(index1, index2);
        self.log
            .list_op(table, column, row, Instruction::LinkListSwap { index1, index2 });
        Ok(())
    }

    pub fn list_clear(&mut self, table: usize, column: usize, row: usize) -> Result<()> {
        let prior_size = self.list_len(table, column, row)?;
        self.list_mut(table, column, row)?.clear();
        self.log
            .list_op(table, column, row, Instruction::LinkListClear { prior_size });
        Ok(())
    }
}

impl Drop for WriteTransaction<'_> {
    fn drop(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            self.db.group = snapshot;
        }
    }
}
