//! Delivery of change notifications after new commits.
//!
//! A `ChangeNotifier` is one observer of a database. It holds the table and
//! list subscriptions and the observed rows of a binding, and on `refresh`
//! catches up with the latest version: it replays the new logs, hands each
//! subscription the changes of its collection and tells the binding which
//! observed rows changed or were deleted.

use crate::change_info::TransactionChangeInfo;
use crate::deep_change::{find_related_tables, DeepChangeChecker, LinkReader};
use crate::observer::{ObservedRows, ObserverState};
use crate::subscription::{SubscriptionId, SubscriptionManager};
use crate::transact_log::{LogSource, ReadView};
use alloc::format;
use alloc::vec::Vec;
use tether_core::schema::LinkGraph;
use tether_core::{Error, Result, SchemaMode};
use tether_incremental::CollectionChangeSet;
use tether_storage::VersionId;
use tracing::debug;

/// Receives per-row changes after each refresh.
pub trait BindingContext {
    /// Called once per refresh that moved to a new version. `observers` are
    /// the live observed rows with their collected changes; `invalidated`
    /// holds the binding handles of rows deleted since the last refresh.
    fn did_change(&mut self, observers: &[&ObserverState], invalidated: &[usize]);
}

impl BindingContext for () {
    fn did_change(&mut self, _observers: &[&ObserverState], _invalidated: &[usize]) {}
}

/// Identifies a subscription made through a `ChangeNotifier`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NotificationToken {
    Table { registration: usize, id: SubscriptionId },
    List { registration: usize, id: SubscriptionId },
}

struct TableRegistration {
    table: usize,
    moves: bool,
    subscriptions: SubscriptionManager,
}

struct ListRegistration {
    table: usize,
    column: usize,
    row: usize,
    len: usize,
    detached: bool,
    subscriptions: SubscriptionManager,
}

/// An observer of a database that delivers changesets to subscriptions.
///
/// Tables and columns are named by their position at the notifier's current
/// version; registrations follow them when later versions move them.
pub struct ChangeNotifier {
    view: ReadView,
    tables: Vec<TableRegistration>,
    lists: Vec<ListRegistration>,
    rows: ObservedRows,
    last: TransactionChangeInfo,
}

impl ChangeNotifier {
    /// Creates a notifier positioned at the latest version of `source`.
    pub fn new<S: LogSource + ?Sized>(source: &S, mode: SchemaMode) -> Self {
        Self {
            view: ReadView::new(source.latest_version(), mode),
            tables: Vec::new(),
            lists: Vec::new(),
            rows: ObservedRows::new(),
            last: TransactionChangeInfo::new(),
        }
    }

    #[inline]
    pub fn version(&self) -> VersionId {
        self.view.version()
    }

    /// Subscribes to the row changes of `table`. Moves are reported if any
    /// subscription of the table asks for them.
    pub fn subscribe_table<F>(&mut self, table: usize, track_moves: bool, callback: F) -> NotificationToken
    where
        F: Fn(&CollectionChangeSet) + 'static,
    {
        let registration = match self.tables.iter().position(|r| r.table == table) {
            Some(index) => index,
            None => {
                self.tables.push(TableRegistration {
                    table,
                    moves: false,
                    subscriptions: SubscriptionManager::new(),
                });
                self.tables.len() - 1
            }
        };
        let entry = &mut self.tables[registration];
        entry.moves |= track_moves;
        let id = entry.subscriptions.subscribe(callback);
        NotificationToken::Table { registration, id }
    }

    /// Subscribes to the changes of the link list at `(table, column, row)`.
    /// `reader` must show the notifier's current version.
    pub fn subscribe_list<R, F>(
        &mut self,
        reader: &R,
        table: usize,
        column: usize,
        row: usize,
        callback: F,
    ) -> Result<NotificationToken>
    where
        R: LinkReader + ?Sized,
        F: Fn(&CollectionChangeSet) + 'static,
    {
        let is_list = reader
            .schema()
            .table(table)
            .and_then(|t| t.column(column))
            .is_some_and(|c| c.data_type().is_list());
        if !is_list {
            return Err(Error::invalid_operation(format!(
                "column {} of table {} is not a link list",
                column, table
            )));
        }

        let existing = self
            .lists
            .iter()
            .position(|l| !l.detached && l.table == table && l.column == column && l.row == row);
        let registration = match existing {
            Some(index) => index,
            None => {
                self.lists.push(ListRegistration {
                    table,
                    column,
                    row,
                    len: reader.link_list(table, column, row).len(),
                    detached: false,
                    subscriptions: SubscriptionManager::new(),
                });
                self.lists.len() - 1
            }
        };
        let id = self.lists[registration].subscriptions.subscribe(callback);
        Ok(NotificationToken::List { registration, id })
    }

    /// Returns true if the subscription was found and removed.
    pub fn unsubscribe(&mut self, token: NotificationToken) -> bool {
        match token {
            NotificationToken::Table { registration, id } => self
                .tables
                .get_mut(registration)
                .is_some_and(|r| r.subscriptions.unsubscribe(id)),
            NotificationToken::List { registration, id } => self
                .lists
                .get_mut(registration)
                .is_some_and(|r| r.subscriptions.unsubscribe(id)),
        }
    }

    /// Returns true if the list behind `token` was deleted along with its
    /// owning row. Detached lists are never notified again.
    pub fn is_detached(&self, token: NotificationToken) -> bool {
        match token {
            NotificationToken::List { registration, .. } => {
                self.lists.get(registration).is_some_and(|r| r.detached)
            }
            NotificationToken::Table { .. } => false,
        }
    }

    /// Starts tracking a row for the binding; returns its handle.
    pub fn observe_row(&mut self, state: ObserverState) -> usize {
        self.rows.add(state)
    }

    #[inline]
    pub fn observed_rows(&self) -> &ObservedRows {
        &self.rows
    }

    /// What the last refresh collected, in the positions of the version
    /// before it.
    #[inline]
    pub fn last_changes(&self) -> &TransactionChangeInfo {
        &self.last
    }

    /// A deep change checker for rows of `table` over the last refresh.
    /// `reader` must show the notifier's current version.
    pub fn deep_checker<'a, R: LinkReader + ?Sized>(&'a self, reader: &'a R, table: usize) -> DeepChangeChecker<'a, R> {
        DeepChangeChecker::new(&self.last, reader, table)
    }

    /// Catches up with the latest version of `source` and delivers the
    /// changes. Returns false if there was nothing new.
    ///
    /// On error nothing is delivered and the notifier stays at its version.
    pub fn refresh<S, B>(&mut self, source: &S, binding: &mut B) -> Result<bool>
    where
        S: LogSource + ?Sized,
        B: BindingContext + ?Sized,
    {
        let from = self.view.version();
        if source.latest_version() == from {
            return Ok(false);
        }

        let mut info = TransactionChangeInfo::new();
        let graph = LinkGraph::new(source.schema_at(from)?);
        for registration in &self.tables {
            for related in find_related_tables(&graph, registration.table) {
                info.track_table(related.table, false);
            }
            info.track_table(registration.table, registration.moves);
        }
        let mut tracked = Vec::new();
        for (index, list) in self.lists.iter().enumerate() {
            if !list.detached {
                tracked.push((index, info.track_list(list.table, list.column, list.row, list.len)));
            }
        }

        let to = self.view.advance(source, &mut info, &mut self.rows)?;
        debug!(from, to, "delivering changes");

        for registration in &self.tables {
            let Some(builder) = info.table_changes(registration.table) else {
                continue;
            };
            let changes = builder.clone().finalize();
            if !changes.is_empty() {
                registration.subscriptions.notify_all(&changes);
            }
        }
        for (index, slot) in tracked {
            let list = &info.lists[slot];
            let registration = &mut self.lists[index];
            if list.deleted {
                debug!(table = list.table, row = list.row, "list detached");
                registration.detached = true;
                continue;
            }
            registration.row = list.row;
            registration.len = list.len;
            let changes = list.changes.clone().finalize();
            if !changes.is_empty() {
                registration.subscriptions.notify_all(&changes);
            }
        }

        let observers: Vec<&ObserverState> = self.rows.live().collect();
        binding.did_change(&observers, self.rows.invalidated());

        // follow tables and columns to their new positions
        for registration in &mut self.tables {
            if let Some(table) = info.current_table(registration.table) {
                registration.table = table;
            }
        }
        for registration in self.lists.iter_mut().filter(|l| !l.detached) {
            let table = info.current_table(registration.table);
            let column = info.current_column(registration.table, registration.column);
            if let (Some(table), Some(column)) = (table, column) {
                registration.table = table;
                registration.column = column;
            }
        }
        self.rows
            .rebase(|t| info.current_table(t), |t, c| info.current_column(t, c));
        self.rows.reset_changes();
        self.last = info;
        Ok(true)
    }
}
