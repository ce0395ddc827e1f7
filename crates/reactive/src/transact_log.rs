//! Replay of committed transaction logs into change information.
//!
//! The interpreter walks the instructions of one or more logs and feeds
//! them to the builders of tracked tables and lists and to observed rows.
//! Logs address tables and columns by their physical position at the time
//! of writing; the interpreter follows schema changes so that everything it
//! reports uses logical positions, the ones of the version the pass started
//! from.

use crate::change_info::TransactionChangeInfo;
use crate::observer::{Kind, ObservedRows};
use crate::schema_check::validate_schema_changes;
use alloc::format;
use alloc::vec::Vec;
use tether_core::schema::{LinkGraph, Schema};
use tether_core::{Error, Result, SchemaMode};
use tether_storage::{Database, Instruction, TransactLog, VersionId};
use tracing::{debug, trace, warn};

/// Where committed logs come from.
pub trait LogSource {
    /// The latest committed version.
    fn latest_version(&self) -> VersionId;

    /// The schema as of `version`.
    fn schema_at(&self, version: VersionId) -> Result<&Schema>;

    /// The logs leading from `from` to `to`, oldest first.
    fn logs(&self, from: VersionId, to: VersionId) -> Result<&[TransactLog]>;
}

impl LogSource for Database {
    #[inline]
    fn latest_version(&self) -> VersionId {
        self.version()
    }

    #[inline]
    fn schema_at(&self, version: VersionId) -> Result<&Schema> {
        Database::schema_at(self, version)
    }

    #[inline]
    fn logs(&self, from: VersionId, to: VersionId) -> Result<&[TransactLog]> {
        self.logs_between(from, to)
    }
}

/// Replays transaction logs into a `TransactionChangeInfo` and a set of
/// observed rows.
pub struct TransactLogInterpreter<'a> {
    info: &'a mut TransactionChangeInfo,
    rows: &'a mut ObservedRows,
    /// Links of the start schema, in logical positions.
    links: LinkGraph,
    /// Physical table to logical table.
    tables: Vec<Option<usize>>,
    /// Per logical table: physical column to logical column.
    columns: Vec<Vec<Option<usize>>>,
    selected_table: Option<usize>,
    selected_list: Option<(usize, usize)>,
}

impl<'a> TransactLogInterpreter<'a> {
    /// Creates an interpreter for logs written on top of `schema`.
    pub fn new(schema: &Schema, info: &'a mut TransactionChangeInfo, rows: &'a mut ObservedRows) -> Self {
        Self {
            info,
            rows,
            links: LinkGraph::new(schema),
            tables: (0..schema.len()).map(Some).collect(),
            columns: schema
                .tables()
                .iter()
                .map(|t| (0..t.column_count()).map(Some).collect())
                .collect(),
            selected_table: None,
            selected_list: None,
        }
    }

    /// Replays every instruction of `log`.
    pub fn apply(&mut self, log: &TransactLog) -> Result<()> {
        self.selected_table = None;
        self.selected_list = None;
        for instruction in log {
            self.apply_instruction(instruction)?;
        }
        Ok(())
    }

    /// Records the final positions and finishes every builder.
    pub fn finish(self) {
        self.info.table_positions = self.tables;
        self.info.column_positions = self.columns;
        self.info.parse_complete();
    }

    fn apply_instruction(&mut self, instruction: &Instruction) -> Result<()> {
        if instruction.is_list_instruction() {
            return self.apply_list_instruction(instruction);
        }
        if !matches!(instruction, Instruction::SelectLinkList { .. }) {
            self.selected_list = None;
        }
        match *instruction {
            Instruction::SelectTable { table } => {
                if table >= self.tables.len() {
                    return Err(Error::invalid_log(format!("unknown table {}", table)));
                }
                self.selected_table = Some(table);
            }
            Instruction::SelectLinkList { column, row } => {
                if let Some(table) = self.selected()? {
                    self.logical_column(table, column)?;
                }
                self.selected_list = Some((column, row));
            }
            Instruction::InsertEmptyRows { row, count, .. } => {
                if let Some(table) = self.selected()? {
                    self.insert_rows(table, row, count);
                }
            }
            Instruction::MoveLastOver { row, prior_size } => {
                if let Some(table) = self.selected()? {
                    if row >= prior_size {
                        return Err(Error::invalid_log(format!(
                            "row {} deleted from a table of {} rows",
                            row, prior_size
                        )));
                    }
                    self.move_last_over(table, row, prior_size - 1);
                }
            }
            Instruction::SwapRows { row1, row2 } => {
                if let Some(table) = self.selected()? {
                    self.swap_rows(table, row1, row2);
                }
            }
            Instruction::ClearTable { prior_size } => {
                if let Some(table) = self.selected()? {
                    self.clear_table(table, prior_size)?;
                }
            }
            Instruction::Set {
                column,
                row,
                is_default,
                ..
            } => {
                if let Some(table) = self.selected()? {
                    let column = self.logical_column(table, column)?;
                    if !is_default {
                        self.set(table, column, row);
                    }
                }
            }
            Instruction::NullifyLink { column, row } => {
                if let Some(table) = self.selected()? {
                    let column = self.logical_column(table, column)?;
                    self.set(table, column, row);
                }
            }
            Instruction::InsertTable { table, .. } => {
                if table > self.tables.len() {
                    return Err(Error::invalid_log(format!("cannot insert table at {}", table)));
                }
                trace!(table, "table inserted");
                self.tables.insert(table, None);
                self.selected_table = None;
            }
            Instruction::EraseTable { table } => {
                self.check_table(table)?;
                trace!(table, "table erased");
                if let Some(logical) = self.tables.remove(table) {
                    self.rows.invalidate_table(logical);
                }
                self.selected_table = None;
            }
            Instruction::RenameTable { table, .. } => {
                self.check_table(table)?;
                self.selected_table = None;
            }
            Instruction::MoveTable { from, to } => {
                self.check_table(from)?;
                self.check_table(to)?;
                trace!(from, to, "table moved");
                let moved = self.tables.remove(from);
                self.tables.insert(to, moved);
                self.selected_table = None;
            }
            Instruction::InsertColumn { column, .. } => {
                if let Some(table) = self.selected()? {
                    let columns = &mut self.columns[table];
                    if column > columns.len() {
                        return Err(Error::invalid_log(format!("cannot insert column at {}", column)));
                    }
                    trace!(table, column, "column inserted");
                    columns.insert(column, None);
                }
            }
            Instruction::EraseColumn { column } => {
                if let Some(table) = self.selected()? {
                    self.logical_column(table, column)?;
                    self.columns[table].remove(column);
                }
            }
            Instruction::MoveColumn { from, to } => {
                if let Some(table) = self.selected()? {
                    self.logical_column(table, from)?;
                    self.logical_column(table, to)?;
                    trace!(table, from, to, "column moved");
                    let columns = &mut self.columns[table];
                    let moved = columns.remove(from);
                    columns.insert(to, moved);
                }
            }
            Instruction::RenameColumn { column, .. }
            | Instruction::AddSearchIndex { column }
            | Instruction::RemoveSearchIndex { column } => {
                if let Some(table) = self.selected()? {
                    self.logical_column(table, column)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn check_table(&self, table: usize) -> Result<()> {
        if table >= self.tables.len() {
            return Err(Error::invalid_log(format!("unknown table {}", table)));
        }
        Ok(())
    }

    /// Logical index of the selected table; `None` for a table created
    /// during the pass.
    fn selected(&self) -> Result<Option<usize>> {
        let table = self
            .selected_table
            .ok_or_else(|| Error::invalid_log("row or column instruction without a selected table"))?;
        Ok(self.tables[table])
    }

    fn logical_column(&self, table: usize, column: usize) -> Result<Option<usize>> {
        self.columns[table]
            .get(column)
            .copied()
            .ok_or_else(|| Error::invalid_log(format!("unknown column {} of table {}", column, table)))
    }

    fn insert_rows(&mut self, table: usize, row: usize, count: usize) {
        if let Some(builder) = self.info.table_builder(table) {
            builder.insert_rows(row, count);
        }
        self.rows.shift_for_insert(table, row, count);
        for list in &mut self.info.lists {
            if list.table == table && !list.deleted && list.row >= row {
                list.row += count;
            }
        }
    }

    fn move_last_over(&mut self, table: usize, row: usize, last: usize) {
        if let Some(builder) = self.info.table_builder(table) {
            builder.move_over(row, last);
        }
        self.rows.invalidate_row(table, row);
        if row != last {
            self.rows.move_row(table, last, row);
        }
        for list in &mut self.info.lists {
            if list.table != table || list.deleted {
                continue;
            }
            if list.row == row {
                list.deleted = true;
            } else if list.row == last {
                list.row = row;
            }
        }
    }

    fn swap_rows(&mut self, table: usize, row1: usize, row2: usize) {
        if let Some(builder) = self.info.table_builder(table) {
            builder.swap(row1, row2);
        }
        self.rows.swap_rows(table, row1, row2);
        for list in &mut self.info.lists {
            if list.table != table || list.deleted {
                continue;
            }
            if list.row == row1 {
                list.row = row2;
            } else if list.row == row2 {
                list.row = row1;
            }
        }
    }

    fn clear_table(&mut self, table: usize, prior_size: usize) -> Result<()> {
        trace!(table, prior_size, "table cleared");
        if let Some(builder) = self.info.table_builder(table) {
            builder.clear(prior_size)?;
        }
        self.rows.invalidate_table(table);
        for list in &mut self.info.lists {
            if list.table == table {
                list.deleted = true;
            }
        }

        // every link into the table is now empty
        for link in self.links.incoming(table) {
            for list in &mut self.info.lists {
                if list.table == link.origin && list.column == link.column && !list.deleted {
                    list.changes.clear(list.len)?;
                    list.len = 0;
                }
            }
            for handle in self.rows.handles_in(link.origin) {
                let Some(info) = self.rows.column_mut(handle, link.column) else {
                    continue;
                };
                if !link.is_list {
                    info.mark_set();
                } else {
                    match info.len {
                        Some(0) => {}
                        Some(len) => info.append_clear(len),
                        None => info.set_all(),
                    }
                }
            }
        }
        Ok(())
    }

    fn set(&mut self, table: usize, column: Option<usize>, row: usize) {
        if let Some(builder) = self.info.table_builder(table) {
            builder.modify(row);
        }
        let Some(column) = column else {
            return;
        };
        for handle in self.rows.handles_at(table, row).to_vec() {
            if let Some(info) = self.rows.column_mut(handle, column) {
                info.mark_set();
            }
        }
    }

    fn apply_list_instruction(&mut self, instruction: &Instruction) -> Result<()> {
        let (column, row) = self
            .selected_list
            .ok_or_else(|| Error::invalid_log("list instruction without a selected list"))?;
        let Some(table) = self.selected()? else {
            return Ok(());
        };
        if let Some(builder) = self.info.table_builder(table) {
            builder.modify(row);
        }
        let Some(column) = self.logical_column(table, column)? else {
            return Ok(());
        };

        let tracked = self
            .info
            .lists
            .iter()
            .rposition(|l| !l.deleted && l.table == table && l.column == column && l.row == row);
        if let Some(index) = tracked {
            let list = &mut self.info.lists[index];
            match *instruction {
                Instruction::LinkListInsert { index, .. } => {
                    list.changes.insert(index);
                    list.len += 1;
                }
                Instruction::LinkListSet { index, .. } => list.changes.modify(index),
                Instruction::LinkListErase { index } | Instruction::LinkListNullify { index } => {
                    list.changes.erase(index);
                    list.len = list.len.saturating_sub(1);
                }
                Instruction::LinkListMove { from, to } => list.changes.move_item(from, to),
                Instruction::LinkListSwap { index1, index2 } => list.changes.swap(index1, index2),
                Instruction::LinkListClear { prior_size } => {
                    list.changes.clear(prior_size)?;
                    list.len = 0;
                }
                _ => {}
            }
        }

        for handle in self.rows.handles_at(table, row).to_vec() {
            let Some(info) = self.rows.column_mut(handle, column) else {
                continue;
            };
            match *instruction {
                Instruction::LinkListInsert { index, .. } => info.append(Kind::Insert, index),
                Instruction::LinkListSet { index, .. } => info.append(Kind::Set, index),
                Instruction::LinkListErase { index } | Instruction::LinkListNullify { index } => {
                    info.append(Kind::Remove, index)
                }
                Instruction::LinkListMove { from, to } => info.append_move(from, to),
                Instruction::LinkListSwap { index1, index2 } => {
                    info.append(Kind::Set, index1);
                    info.append(Kind::Set, index2);
                }
                Instruction::LinkListClear { prior_size } => info.append_clear(prior_size),
                _ => {}
            }
        }
        Ok(())
    }
}

/// Replays the logs that lead from `from` to `to` into `info` and `rows`.
///
/// Schema changes are validated against `mode` before anything is replayed.
/// The replay runs on copies; `info` and `rows` are only updated if the whole
/// range was valid. Returns the version reached.
pub fn advance<S: LogSource + ?Sized>(
    source: &S,
    from: VersionId,
    to: VersionId,
    mode: SchemaMode,
    info: &mut TransactionChangeInfo,
    rows: &mut ObservedRows,
) -> Result<VersionId> {
    let logs = source.logs(from, to)?;
    let schema = source.schema_at(from)?;
    debug!(from, to, logs = logs.len(), "advancing");

    if let Err(error) = validate_schema_changes(schema, logs, mode) {
        warn!(%error, from, to, "cannot advance");
        return Err(error);
    }

    let mut scratch_info = info.clone();
    let mut scratch_rows = rows.clone();
    let mut interpreter = TransactLogInterpreter::new(schema, &mut scratch_info, &mut scratch_rows);
    for log in logs {
        if let Err(error) = interpreter.apply(log) {
            warn!(%error, from, to, "invalid transaction log");
            return Err(error);
        }
    }
    interpreter.finish();

    *info = scratch_info;
    *rows = scratch_rows;
    debug!(version = to, "advanced");
    Ok(to)
}

/// An observer's position in the history.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReadView {
    version: VersionId,
    mode: SchemaMode,
}

impl ReadView {
    pub fn new(version: VersionId, mode: SchemaMode) -> Self {
        Self { version, mode }
    }

    #[inline]
    pub fn version(&self) -> VersionId {
        self.version
    }

    #[inline]
    pub fn mode(&self) -> SchemaMode {
        self.mode
    }

    /// Advances to the latest version of `source`.
    pub fn advance<S: LogSource + ?Sized>(
        &mut self,
        source: &S,
        info: &mut TransactionChangeInfo,
        rows: &mut ObservedRows,
    ) -> Result<VersionId> {
        self.advance_to(source, source.latest_version(), info, rows)
    }

    /// Advances to `to`. On error the view stays where it was.
    pub fn advance_to<S: LogSource + ?Sized>(
        &mut self,
        source: &S,
        to: VersionId,
        info: &mut TransactionChangeInfo,
        rows: &mut ObservedRows,
    ) -> Result<VersionId> {
        self.version = advance(source, self.version, to, self.mode, info, rows)?;
        Ok(self.version)
    }
}
