//! SQLite-backed key-value store over the `kv_entries` table.
//!
//! # Invariants
//! - Each compare-and-swap is one guarded SQL statement, so concurrent
//!   connections to the same file cannot interleave a lost update.

use super::{CasOutcome, KeyValueStore, Revision, StoreError, StoreResult, StoredValue};
use crate::db::migrations::{current_user_version, latest_version};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension};

const KV_TABLE: &str = "kv_entries";

/// Key-value store borrowing a migrated connection.
pub struct SqliteKvStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteKvStore<'conn> {
    /// Wraps a connection returned by `open_db`/`open_db_in_memory`.
    ///
    /// # Errors
    /// - `UninitializedConnection` when migrations have not been applied.
    /// - `MissingRequiredTable` when the schema version is right but the
    ///   table was dropped or never created.
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        let expected_version = latest_version();
        let actual_version = current_user_version(conn)?;
        if actual_version != expected_version {
            return Err(StoreError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }

        let table_exists: bool = conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1
            );",
            [KV_TABLE],
            |row| row.get(0),
        )?;
        if !table_exists {
            return Err(StoreError::MissingRequiredTable(KV_TABLE));
        }

        Ok(Self { conn })
    }

    fn current_revision(&self, key: &str) -> StoreResult<Option<Revision>> {
        let revision = self
            .conn
            .query_row(
                "SELECT revision FROM kv_entries WHERE key = ?1;",
                [key],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        revision.map(revision_from_db).transpose()
    }
}

impl KeyValueStore for SqliteKvStore<'_> {
    fn get(&self, key: &str) -> StoreResult<Option<StoredValue>> {
        let row = self
            .conn
            .query_row(
                "SELECT value, revision FROM kv_entries WHERE key = ?1;",
                [key],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)),
            )
            .optional()?;

        match row {
            Some((value, revision)) => Ok(Some(StoredValue {
                value,
                revision: revision_from_db(revision)?,
            })),
            None => Ok(None),
        }
    }

    fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<Revision>,
        value: &str,
    ) -> StoreResult<CasOutcome> {
        let changed = match expected {
            None => self.conn.execute(
                "INSERT INTO kv_entries (key, value, revision)
                 VALUES (?1, ?2, 1)
                 ON CONFLICT(key) DO NOTHING;",
                params![key, value],
            )?,
            Some(revision) => self.conn.execute(
                "UPDATE kv_entries
                 SET
                    value = ?2,
                    revision = revision + 1,
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE key = ?1
                   AND revision = ?3;",
                params![key, value, revision_to_db(revision)?],
            )?,
        };

        if changed == 1 {
            let revision = expected.map_or(1, |revision| revision + 1);
            return Ok(CasOutcome::Swapped(revision));
        }

        let current = self.current_revision(key)?;
        debug!(
            "event=kv_cas module=kv status=conflict expected={:?} current={:?}",
            expected, current
        );
        Ok(CasOutcome::Conflict(current))
    }
}

fn revision_from_db(value: i64) -> StoreResult<Revision> {
    Revision::try_from(value).map_err(|_| {
        StoreError::InvalidData(format!("invalid revision `{value}` in kv_entries.revision"))
    })
}

fn revision_to_db(value: Revision) -> StoreResult<i64> {
    i64::try_from(value)
        .map_err(|_| StoreError::InvalidData(format!("revision `{value}` exceeds storage range")))
}
