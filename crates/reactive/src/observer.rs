//! Per-row, per-property change tracking for bound objects.
//!
//! A binding registers the rows it displays as `ObserverState`s. While a
//! pass replays the log each state follows its row as it moves and collects
//! one `ColumnInfo` per touched property; a deleted row is dropped from the
//! index at once and its binding handle reported as invalidated.

use alloc::vec::Vec;
use hashbrown::HashMap;
use tether_core::{Error, Result};
use tether_index::IndexSet;

/// The kind of change collected for a property.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Kind {
    #[default]
    None,
    Set,
    Insert,
    Remove,
    /// Mixed list changes; the whole list must be reloaded.
    SetAll,
}

/// Changes collected for one property of an observed row.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ColumnInfo {
    pub kind: Kind,
    pub changed: bool,
    /// List positions affected, for list properties.
    pub indices: IndexSet,
    /// Known length of a list property.
    pub len: Option<usize>,
}

impl ColumnInfo {
    /// Marks a scalar or link property as assigned.
    pub fn mark_set(&mut self) {
        self.changed = true;
        if self.kind == Kind::None {
            self.kind = Kind::Set;
        }
    }

    /// Records one list change at `index`. List changes of a single kind
    /// accumulate; mixing kinds degrades to `SetAll`.
    pub fn append(&mut self, kind: Kind, index: usize) {
        match kind {
            Kind::Insert => self.len = self.len.map(|len| len + 1),
            Kind::Remove => self.len = self.len.map(|len| len.saturating_sub(1)),
            _ => {}
        }
        if self.kind == Kind::SetAll {
            return;
        }
        self.changed = true;
        if self.kind == Kind::None {
            self.kind = kind;
            self.indices.add(index);
        } else if self.kind == kind {
            match kind {
                Kind::Remove => {
                    self.indices.add_shifted(index);
                }
                Kind::Insert => self.indices.insert_at(index, 1),
                _ => self.indices.add(index),
            }
        } else {
            self.set_all();
        }
    }

    /// Records a list move, which marks every position between `from` and
    /// `to` as set.
    pub fn append_move(&mut self, from: usize, to: usize) {
        if self.kind == Kind::SetAll {
            return;
        }
        let (low, high) = if from <= to { (from, to) } else { (to, from) };
        self.changed = true;
        if self.kind == Kind::None {
            self.kind = Kind::Set;
        }
        if self.kind == Kind::Set {
            self.indices.add_range(low, high + 1);
        } else {
            self.set_all();
        }
    }

    /// Records that a list of `prior_size` entries was emptied.
    pub fn append_clear(&mut self, prior_size: usize) {
        self.len = Some(0);
        if self.kind == Kind::SetAll {
            return;
        }
        // express the clear in terms of the list before this pass
        let original = match self.kind {
            Kind::Remove => prior_size + self.indices.count(),
            Kind::Insert => prior_size.saturating_sub(self.indices.count()),
            _ => prior_size,
        };
        self.indices.set(original);
        self.kind = Kind::Remove;
        self.changed = true;
    }

    pub(crate) fn set_all(&mut self) {
        self.indices.clear();
        self.kind = Kind::SetAll;
        self.changed = true;
    }

    /// Forgets collected changes, keeping the known length.
    pub fn reset(&mut self) {
        let len = self.len;
        *self = ColumnInfo {
            len,
            ..ColumnInfo::default()
        };
    }
}

/// An observed row and the changes collected for it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObserverState {
    /// Logical table index.
    pub table: usize,
    /// Current row index.
    pub row: usize,
    /// Opaque handle of the binding's object.
    pub info: usize,
    /// Per logical column.
    pub changes: Vec<ColumnInfo>,
}

impl ObserverState {
    pub fn new(table: usize, row: usize, info: usize) -> Self {
        Self {
            table,
            row,
            info,
            changes: Vec::new(),
        }
    }

    /// Records the current length of the list property at `column`.
    pub fn with_list_len(mut self, column: usize, len: usize) -> Self {
        self.column_mut(column).len = Some(len);
        self
    }

    /// Changes of `column`, if any were collected.
    pub fn column(&self, column: usize) -> Option<&ColumnInfo> {
        self.changes.get(column)
    }

    /// Returns true if any property changed.
    pub fn has_changes(&self) -> bool {
        self.changes.iter().any(|c| c.changed)
    }

    pub(crate) fn column_mut(&mut self, column: usize) -> &mut ColumnInfo {
        if self.changes.len() <= column {
            self.changes.resize_with(column + 1, ColumnInfo::default);
        }
        &mut self.changes[column]
    }
}

/// Liveness of an observed row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RowStatus {
    Live,
    Invalidated,
}

#[derive(Clone, Debug)]
struct Slot {
    state: ObserverState,
    live: bool,
}

/// The observed rows of a binding, addressed by stable handles.
#[derive(Clone, Debug, Default)]
pub struct ObservedRows {
    slots: Vec<Slot>,
    by_row: HashMap<(usize, usize), Vec<usize>>,
    invalidated: Vec<usize>,
}

impl ObservedRows {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts observing a row; returns its handle.
    pub fn add(&mut self, state: ObserverState) -> usize {
        let handle = self.slots.len();
        self.by_row
            .entry((state.table, state.row))
            .or_default()
            .push(handle);
        self.slots.push(Slot { state, live: true });
        handle
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Returns whether the row behind `handle` still exists.
    pub fn status(&self, handle: usize) -> Option<RowStatus> {
        self.slots.get(handle).map(|slot| {
            if slot.live {
                RowStatus::Live
            } else {
                RowStatus::Invalidated
            }
        })
    }

    /// Gets the state of a live row.
    pub fn get(&self, handle: usize) -> Result<&ObserverState> {
        let slot = self
            .slots
            .get(handle)
            .ok_or_else(|| Error::out_of_bounds("observer", handle, self.slots.len()))?;
        if slot.live {
            Ok(&slot.state)
        } else {
            Err(Error::Invalidated {
                table: slot.state.table,
                row: slot.state.row,
            })
        }
    }

    /// Iterates over the states of live rows.
    pub fn live(&self) -> impl Iterator<Item = &ObserverState> {
        self.slots.iter().filter(|s| s.live).map(|s| &s.state)
    }

    /// Binding handles of rows deleted since the last reset.
    #[inline]
    pub fn invalidated(&self) -> &[usize] {
        &self.invalidated
    }

    /// Handles of the live rows at `(table, row)`.
    pub fn handles_at(&self, table: usize, row: usize) -> &[usize] {
        self.by_row.get(&(table, row)).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Handles of every live row of `table`.
    pub(crate) fn handles_in(&self, table: usize) -> Vec<usize> {
        let mut handles: Vec<usize> = self
            .by_row
            .iter()
            .filter(|((t, _), _)| *t == table)
            .flat_map(|(_, h)| h.iter().copied())
            .collect();
        handles.sort_unstable();
        handles
    }

    pub(crate) fn column_mut(&mut self, handle: usize, column: usize) -> Option<&mut ColumnInfo> {
        let slot = self.slots.get_mut(handle)?;
        Some(slot.state.column_mut(column))
    }

    pub(crate) fn invalidate_row(&mut self, table: usize, row: usize) {
        let Some(handles) = self.by_row.remove(&(table, row)) else {
            return;
        };
        for handle in handles {
            let slot = &mut self.slots[handle];
            slot.live = false;
            self.invalidated.push(slot.state.info);
        }
    }

    pub(crate) fn invalidate_table(&mut self, table: usize) {
        let mut rows: Vec<usize> = self
            .by_row
            .keys()
            .filter(|(t, _)| *t == table)
            .map(|(_, r)| *r)
            .collect();
        rows.sort_unstable();
        for row in rows {
            self.invalidate_row(table, row);
        }
    }

    /// Re-keys the rows at `from` to `to`. Nothing may be observed at `to`.
    pub(crate) fn move_row(&mut self, table: usize, from: usize, to: usize) {
        let Some(handles) = self.by_row.remove(&(table, from)) else {
            return;
        };
        for &handle in &handles {
            self.slots[handle].state.row = to;
        }
        self.by_row.insert((table, to), handles);
    }

    pub(crate) fn swap_rows(&mut self, table: usize, a: usize, b: usize) {
        let first = self.by_row.remove(&(table, a));
        let second = self.by_row.remove(&(table, b));
        for (handles, row) in [(first, b), (second, a)] {
            if let Some(handles) = handles {
                for &handle in &handles {
                    self.slots[handle].state.row = row;
                }
                self.by_row.insert((table, row), handles);
            }
        }
    }

    /// Shifts rows at or after `row` up by `count`.
    pub(crate) fn shift_for_insert(&mut self, table: usize, row: usize, count: usize) {
        let mut moved: Vec<usize> = self
            .by_row
            .keys()
            .filter(|(t, r)| *t == table && *r >= row)
            .map(|(_, r)| *r)
            .collect();
        // highest first so that no target is still occupied
        moved.sort_unstable_by(|a, b| b.cmp(a));
        for r in moved {
            self.move_row(table, r, r + count);
        }
    }

    /// Re-keys every live row after a pass with new table and column
    /// positions. `table` maps a logical table to its current position and
    /// `column` a logical column of a logical table to its current position.
    pub(crate) fn rebase(
        &mut self,
        table: impl Fn(usize) -> Option<usize>,
        column: impl Fn(usize, usize) -> Option<usize>,
    ) {
        self.by_row.clear();
        for (handle, slot) in self.slots.iter_mut().enumerate() {
            if !slot.live {
                continue;
            }
            let old_table = slot.state.table;
            let Some(new_table) = table(old_table) else {
                slot.live = false;
                self.invalidated.push(slot.state.info);
                continue;
            };
            let mut changes = Vec::new();
            for (index, info) in slot.state.changes.drain(..).enumerate() {
                if let Some(target) = column(old_table, index) {
                    if changes.len() <= target {
                        changes.resize_with(target + 1, ColumnInfo::default);
                    }
                    changes[target] = info;
                }
            }
            slot.state.table = new_table;
            slot.state.changes = changes;
            self.by_row
                .entry((new_table, slot.state.row))
                .or_default()
                .push(handle);
        }
    }

    /// Forgets collected changes and reported invalidations.
    pub fn reset_changes(&mut self) {
        for slot in &mut self.slots {
            for info in &mut slot.state.changes {
                info.reset();
            }
        }
        self.invalidated.clear();
    }
}
