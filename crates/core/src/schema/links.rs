//! Link graph derived from a schema.
//!
//! Computed once per schema shape: for every table the link and link-list
//! columns leaving it, and the inverted view of which `(table, column)` pairs
//! point into it.

use super::Schema;
use alloc::vec::Vec;

/// A link or link-list column leaving a table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct OutgoingLink {
    /// Column index in the origin table.
    pub column: usize,
    /// Index of the target table.
    pub target: usize,
    /// Whether the column is a link list.
    pub is_list: bool,
}

/// A link or link-list column pointing into a table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct IncomingLink {
    /// Index of the origin table.
    pub origin: usize,
    /// Column index in the origin table.
    pub column: usize,
    /// Whether the column is a link list.
    pub is_list: bool,
}

/// Forward and reverse link adjacency of a schema.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LinkGraph {
    outgoing: Vec<Vec<OutgoingLink>>,
    incoming: Vec<Vec<IncomingLink>>,
}

impl LinkGraph {
    /// Builds the graph for a schema. Links to unknown tables are skipped.
    pub fn new(schema: &Schema) -> Self {
        let mut outgoing = Vec::with_capacity(schema.len());
        let mut incoming: Vec<Vec<IncomingLink>> = (0..schema.len()).map(|_| Vec::new()).collect();

        for (origin, table) in schema.tables().iter().enumerate() {
            let mut links = Vec::new();
            for (column, col) in table.columns().iter().enumerate() {
                let Some(target) = col.link_target().and_then(|t| schema.table_index(t)) else {
                    continue;
                };
                let is_list = col.data_type().is_list();
                links.push(OutgoingLink {
                    column,
                    target,
                    is_list,
                });
                incoming[target].push(IncomingLink {
                    origin,
                    column,
                    is_list,
                });
            }
            outgoing.push(links);
        }

        Self { outgoing, incoming }
    }

    /// Returns the number of tables the graph covers.
    #[inline]
    pub fn table_count(&self) -> usize {
        self.outgoing.len()
    }

    /// Link columns leaving `table`.
    pub fn outgoing(&self, table: usize) -> &[OutgoingLink] {
        self.outgoing.get(table).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Link columns pointing into `table`.
    pub fn incoming(&self, table: usize) -> &[IncomingLink] {
        self.incoming.get(table).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Returns the target table of `(table, column)` if it is a link column.
    pub fn target_of(&self, table: usize, column: usize) -> Option<usize> {
        self.outgoing(table)
            .iter()
            .find(|l| l.column == column)
            .map(|l| l.target)
    }
}
