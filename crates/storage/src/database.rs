//! Versioned in-memory database.
//!
//! Every committed write transaction produces a new version. The database
//! keeps the log of each commit and the schema as of each version, which is
//! what observers replay to catch up. History grows with every commit until
//! [`Database::compact`] drops the part no reader needs any more.

use crate::group::Group;
use crate::log::TransactLog;
use crate::transaction::WriteTransaction;
use alloc::vec;
use alloc::vec::Vec;
use tether_core::schema::{Schema, Table};
use tether_core::{Error, Result};
use tracing::debug;

/// Version number. Version 0 is the empty database; the log that produced
/// version `v` is the `v`-th commit.
pub type VersionId = u64;

/// An in-memory database with a retained commit history.
#[derive(Debug)]
pub struct Database {
    pub(crate) group: Group,
    /// Oldest version whose schema is retained.
    oldest: VersionId,
    /// `commits[i]` produced version `oldest + i + 1`.
    pub(crate) commits: Vec<TransactLog>,
    /// `schemas[i]` is the schema as of version `oldest + i`.
    pub(crate) schemas: Vec<Schema>,
}

impl Database {
    /// Creates a new empty database at version 0.
    pub fn new() -> Self {
        Self {
            group: Group::new(),
            oldest: 0,
            commits: Vec::new(),
            schemas: vec![Schema::new()],
        }
    }

    /// Creates a database holding the tables of `schema`, committed as
    /// version 1.
    pub fn from_schema(schema: &Schema) -> Result<Self> {
        schema.validate()?;
        let mut db = Self::new();
        {
            let mut tx = db.begin_write();
            // empty tables first so that links may point forward
            for (index, table) in schema.tables().iter().enumerate() {
                tx.insert_table(index, Table::new(table.name(), Vec::new()))?;
            }
            for (index, table) in schema.tables().iter().enumerate() {
                for column in table.columns() {
                    tx.add_column(index, column.clone())?;
                }
            }
            tx.commit()?;
        }
        Ok(db)
    }

    /// Returns the latest committed version.
    #[inline]
    pub fn version(&self) -> VersionId {
        self.oldest + self.commits.len() as VersionId
    }

    /// Returns the oldest version readers can still advance from.
    #[inline]
    pub fn oldest_version(&self) -> VersionId {
        self.oldest
    }

    /// Returns the current contents.
    #[inline]
    pub fn group(&self) -> &Group {
        &self.group
    }

    /// Returns the current schema.
    #[inline]
    pub fn schema(&self) -> &Schema {
        self.group.schema()
    }

    /// Returns the schema as of `version`.
    pub fn schema_at(&self, version: VersionId) -> Result<&Schema> {
        version
            .checked_sub(self.oldest)
            .and_then(|offset| self.schemas.get(offset as usize))
            .ok_or(Error::UnknownVersion { version })
    }

    /// Returns the logs that lead from `from` to `to`, oldest first.
    pub fn logs_between(&self, from: VersionId, to: VersionId) -> Result<&[TransactLog]> {
        let latest = self.version();
        if to > latest {
            return Err(Error::UnknownVersion { version: to });
        }
        if from > to || from < self.oldest {
            return Err(Error::UnknownVersion { version: from });
        }
        Ok(&self.commits[(from - self.oldest) as usize..(to - self.oldest) as usize])
    }

    /// Drops the logs and schemas of versions before `oldest`. Afterwards
    /// readers can only advance from `oldest` or later.
    ///
    /// Callers pass the oldest version any live reader is still at.
    /// Compacting to a version already dropped is a no-op.
    pub fn compact(&mut self, oldest: VersionId) -> Result<()> {
        if oldest > self.version() {
            return Err(Error::UnknownVersion { version: oldest });
        }
        if oldest <= self.oldest {
            return Ok(());
        }
        let dropped = (oldest - self.oldest) as usize;
        self.commits.drain(..dropped);
        self.schemas.drain(..dropped);
        self.oldest = oldest;
        debug!(oldest, dropped, "compacted history");
        Ok(())
    }

    /// Starts a write transaction. Changes become visible to readers of the
    /// history only on commit; dropping the transaction rolls it back.
    pub fn begin_write(&mut self) -> WriteTransaction<'_> {
        WriteTransaction::new(self)
    }
}

impl Default for Database {
    fn default() -> Self {
        Self::new()
    }
}
