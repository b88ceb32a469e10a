//! Revisioned key-value storage seam.
//!
//! # Responsibility
//! - Define the minimal storage capability the market repository needs.
//! - Provide a durable SQLite backend and an in-memory backend.
//!
//! # Invariants
//! - Every successful write bumps the key revision by exactly one.
//! - A write only lands when the caller's expected revision matches the
//!   stored one (`None` = key must be absent).

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod memory;
pub mod sqlite;

pub use memory::MemoryKvStore;
pub use sqlite::SqliteKvStore;

/// Per-key write counter. The first write of a key produces revision `1`.
pub type Revision = u64;

pub type StoreResult<T> = Result<T, StoreError>;

/// One stored value together with the revision that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredValue {
    pub value: String,
    pub revision: Revision,
}

/// Result of a compare-and-swap attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CasOutcome {
    /// The value was written; carries the new revision.
    Swapped(Revision),
    /// Another writer got there first; carries the revision now stored.
    Conflict(Option<Revision>),
}

#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    /// A memory store lock was poisoned by a panicking writer.
    Poisoned,
    /// Connection has not been migrated to the schema this binary expects.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    InvalidData(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Poisoned => write!(f, "key-value store lock poisoned"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}"
            ),
            Self::MissingRequiredTable(table) => write!(f, "required table missing: {table}"),
            Self::InvalidData(message) => write!(f, "invalid key-value data: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// String-keyed storage with optimistic concurrency.
pub trait KeyValueStore {
    /// Reads the current value for `key`, if any.
    fn get(&self, key: &str) -> StoreResult<Option<StoredValue>>;

    /// Writes `value` only if the stored revision equals `expected`.
    fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<Revision>,
        value: &str,
    ) -> StoreResult<CasOutcome>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for &S {
    fn get(&self, key: &str) -> StoreResult<Option<StoredValue>> {
        (**self).get(key)
    }

    fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<Revision>,
        value: &str,
    ) -> StoreResult<CasOutcome> {
        (**self).compare_and_swap(key, expected, value)
    }
}
