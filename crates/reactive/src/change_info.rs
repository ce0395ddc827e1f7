//! Per-pass accumulators for tracked tables and link lists.

use alloc::vec::Vec;
use tether_incremental::CollectionChangeBuilder;

/// A link list whose changes are being collected.
#[derive(Clone, Debug)]
pub struct ListChangeInfo {
    /// Logical index of the owning table.
    pub table: usize,
    /// Logical index of the link-list column.
    pub column: usize,
    /// Current index of the owning row.
    pub row: usize,
    /// Current length of the list.
    pub len: usize,
    /// Set once the owning row has been deleted.
    pub deleted: bool,
    pub changes: CollectionChangeBuilder,
}

/// Everything one replay pass collects about tracked tables and lists.
///
/// Tables and columns are identified by their logical index: their position
/// at the version the pass starts from. After the pass `table_positions` and
/// `column_positions` map the current positions back to logical ones.
#[derive(Clone, Debug, Default)]
pub struct TransactionChangeInfo {
    pub table_modifications_needed: Vec<bool>,
    pub table_moves_needed: Vec<bool>,
    /// Builders for tracked tables, grown on first touch. Read them through
    /// [`table_changes`](Self::table_changes).
    tables: Vec<CollectionChangeBuilder>,
    pub lists: Vec<ListChangeInfo>,
    /// Current table position to logical table; `None` for tables created
    /// during the pass.
    pub table_positions: Vec<Option<usize>>,
    /// Per logical table: current column position to logical column.
    pub column_positions: Vec<Vec<Option<usize>>>,
}

impl TransactionChangeInfo {
    /// Creates a new info tracking nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Collects row-level changes of `table`, reporting moves if `moves` is
    /// set. Tracking is cumulative.
    pub fn track_table(&mut self, table: usize, moves: bool) {
        if self.table_modifications_needed.len() <= table {
            self.table_modifications_needed.resize(table + 1, false);
            self.table_moves_needed.resize(table + 1, false);
        }
        self.table_modifications_needed[table] = true;
        self.table_moves_needed[table] |= moves;
    }

    /// Collects the changes of the link list at `(table, column, row)`,
    /// currently `len` entries long. Returns its index in `lists`.
    pub fn track_list(&mut self, table: usize, column: usize, row: usize, len: usize) -> usize {
        self.lists.push(ListChangeInfo {
            table,
            column,
            row,
            len,
            deleted: false,
            changes: CollectionChangeBuilder::new(),
        });
        self.lists.len() - 1
    }

    #[inline]
    pub fn is_table_tracked(&self, table: usize) -> bool {
        self.table_modifications_needed.get(table).copied().unwrap_or(false)
    }

    /// Returns the builder of a tracked table, creating it on first use.
    pub fn table_builder(&mut self, table: usize) -> Option<&mut CollectionChangeBuilder> {
        if !self.is_table_tracked(table) {
            return None;
        }
        while self.tables.len() <= table {
            let moves = self.table_moves_needed[self.tables.len()];
            self.tables.push(if moves {
                CollectionChangeBuilder::new()
            } else {
                CollectionChangeBuilder::without_moves()
            });
        }
        Some(&mut self.tables[table])
    }

    /// Changes of the tracked table at logical index `table`; `None` if it
    /// is untracked or nothing touched it.
    #[inline]
    pub fn table_changes(&self, table: usize) -> Option<&CollectionChangeBuilder> {
        self.tables.get(table).filter(|_| self.is_table_tracked(table))
    }

    /// Changes of the table currently at position `current`.
    pub fn table_changes_at(&self, current: usize) -> Option<&CollectionChangeBuilder> {
        let logical = match self.table_positions.get(current) {
            Some(position) => (*position)?,
            // no pass has run yet
            None if self.table_positions.is_empty() => current,
            None => return None,
        };
        self.table_changes(logical)
    }

    /// Current position of the logical table `table`, or `None` if it no
    /// longer exists.
    pub fn current_table(&self, table: usize) -> Option<usize> {
        if self.table_positions.is_empty() {
            return Some(table);
        }
        self.table_positions.iter().position(|&t| t == Some(table))
    }

    /// Current position of a logical column of a logical table.
    pub fn current_column(&self, table: usize, column: usize) -> Option<usize> {
        match self.column_positions.get(table) {
            Some(positions) => positions.iter().position(|&c| c == Some(column)),
            None => Some(column),
        }
    }

    /// Finishes every builder.
    pub fn parse_complete(&mut self) {
        for builder in &mut self.tables {
            builder.parse_complete();
        }
        for list in &mut self.lists {
            list.changes.parse_complete();
        }
    }
}
