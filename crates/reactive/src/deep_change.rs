//! Detection of changes reachable through links.
//!
//! A row counts as changed if it was modified itself or if any row reachable
//! from it through link and link-list columns was, up to `MAX_DEPTH` hops.

use crate::change_info::TransactionChangeInfo;
use alloc::collections::VecDeque;
use alloc::vec;
use alloc::vec::Vec;
use hashbrown::HashMap;
use tether_core::schema::{LinkGraph, OutgoingLink, Schema};
use tether_index::IndexSet;
use tether_storage::{Database, Group};
use tracing::trace;

/// Links deeper than this are not followed.
pub const MAX_DEPTH: usize = 16;

/// A table reachable from the root and the links leaving it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelatedTable {
    pub table: usize,
    pub links: Vec<OutgoingLink>,
}

/// Collects every table reachable from `root` through links, `root`
/// included, in breadth-first order.
pub fn find_related_tables(graph: &LinkGraph, root: usize) -> Vec<RelatedTable> {
    let mut related: Vec<RelatedTable> = Vec::new();
    let mut queue = VecDeque::from(vec![root]);
    while let Some(table) = queue.pop_front() {
        if related.iter().any(|r| r.table == table) {
            continue;
        }
        let links = graph.outgoing(table).to_vec();
        queue.extend(links.iter().map(|l| l.target));
        related.push(RelatedTable { table, links });
    }
    related
}

/// Read access to the links of the current version.
pub trait LinkReader {
    fn schema(&self) -> &Schema;

    /// Target of a link cell; `None` if null.
    fn link(&self, table: usize, column: usize, row: usize) -> Option<usize>;

    /// Targets of a link-list cell.
    fn link_list(&self, table: usize, column: usize, row: usize) -> &[usize];
}

impl LinkReader for Group {
    #[inline]
    fn schema(&self) -> &Schema {
        Group::schema(self)
    }

    #[inline]
    fn link(&self, table: usize, column: usize, row: usize) -> Option<usize> {
        Group::link(self, table, column, row)
    }

    #[inline]
    fn link_list(&self, table: usize, column: usize, row: usize) -> &[usize] {
        Group::link_list(self, table, column, row)
    }
}

impl LinkReader for Database {
    #[inline]
    fn schema(&self) -> &Schema {
        self.group().schema()
    }

    #[inline]
    fn link(&self, table: usize, column: usize, row: usize) -> Option<usize> {
        self.group().link(table, column, row)
    }

    #[inline]
    fn link_list(&self, table: usize, column: usize, row: usize) -> &[usize] {
        self.group().link_list(table, column, row)
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct Outcome {
    changed: bool,
    /// The depth bound cut the search.
    cut: bool,
    /// A link back into the current path was skipped.
    pruned: bool,
}

const CHANGED: Outcome = Outcome {
    changed: true,
    cut: false,
    pruned: false,
};

/// Answers "did this row or anything it links to change" for rows of one
/// table, after a replay pass.
///
/// Rows found unchanged are remembered per table for the lifetime of the
/// checker. A row whose search was cut by the depth bound is never
/// remembered, and one whose search skipped a link back into the current
/// path is only remembered once the whole query came out unchanged without
/// hitting the bound. Answers therefore do not depend on query order.
pub struct DeepChangeChecker<'a, R: ?Sized> {
    info: &'a TransactionChangeInfo,
    reader: &'a R,
    root: usize,
    related: Vec<RelatedTable>,
    not_modified: HashMap<usize, IndexSet>,
    pending: Vec<(usize, usize)>,
    /// `(table, row, column)` of the links followed so far.
    path: Vec<(usize, usize, usize)>,
}

impl<'a, R: LinkReader + ?Sized> DeepChangeChecker<'a, R> {
    /// Creates a checker for rows of `root`, following every link
    /// reachable from it in the schema of `reader`.
    pub fn new(info: &'a TransactionChangeInfo, reader: &'a R, root: usize) -> Self {
        let related = find_related_tables(&LinkGraph::new(reader.schema()), root);
        Self::with_related(info, reader, root, related)
    }

    /// Creates a checker following only the links of `related`.
    pub fn with_related(
        info: &'a TransactionChangeInfo,
        reader: &'a R,
        root: usize,
        related: Vec<RelatedTable>,
    ) -> Self {
        Self {
            info,
            reader,
            root,
            related,
            not_modified: HashMap::new(),
            pending: Vec::new(),
            path: Vec::new(),
        }
    }

    #[inline]
    pub fn related(&self) -> &[RelatedTable] {
        &self.related
    }

    /// Returns true if `row` of the root table or a row reachable from it
    /// was modified.
    pub fn check(&mut self, row: usize) -> bool {
        if self.is_modified(self.root, row) {
            return true;
        }
        let outcome = self.check_row(self.root, row, 0);
        if outcome.changed || outcome.cut {
            self.pending.clear();
        } else {
            for (table, row) in self.pending.drain(..) {
                self.not_modified.entry(table).or_default().add(row);
            }
        }
        outcome.changed
    }

    fn is_modified(&self, table: usize, row: usize) -> bool {
        self.info
            .table_changes_at(table)
            .is_some_and(|changes| changes.modifications().contains(row))
    }

    fn check_row(&mut self, table: usize, row: usize, depth: usize) -> Outcome {
        if depth >= MAX_DEPTH {
            trace!(table, row, "depth bound reached");
            return Outcome {
                cut: true,
                ..Outcome::default()
            };
        }
        if depth > 0 && self.is_modified(table, row) {
            return CHANGED;
        }
        if self.not_modified.get(&table).is_some_and(|rows| rows.contains(row)) {
            return Outcome::default();
        }
        let Some(index) = self.related.iter().position(|r| r.table == table) else {
            return Outcome::default();
        };

        let reader = self.reader;
        let mut outcome = Outcome::default();
        for i in 0..self.related[index].links.len() {
            let link = self.related[index].links[i];
            if self.path.contains(&(table, row, link.column)) {
                outcome.pruned = true;
                continue;
            }
            let single;
            let targets: &[usize] = if link.is_list {
                reader.link_list(table, link.column, row)
            } else {
                single = reader.link(table, link.column, row);
                single.as_slice()
            };
            if targets.is_empty() {
                continue;
            }

            self.path.push((table, row, link.column));
            for &target in targets {
                let found = self.check_row(link.target, target, depth + 1);
                outcome.cut |= found.cut;
                outcome.pruned |= found.pruned;
                if found.changed {
                    self.path.pop();
                    return CHANGED;
                }
            }
            self.path.pop();
        }

        if !outcome.cut {
            if outcome.pruned {
                self.pending.push((table, row));
            } else {
                self.not_modified.entry(table).or_default().add(row);
            }
        }
        outcome
    }
}
