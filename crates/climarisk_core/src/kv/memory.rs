//! In-memory key-value store, used for tests and `--in-memory` sessions.

use super::{CasOutcome, KeyValueStore, Revision, StoreError, StoreResult, StoredValue};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
pub struct MemoryKvStore {
    entries: Mutex<BTreeMap<String, StoredValue>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, BTreeMap<String, StoredValue>>> {
        self.entries.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl KeyValueStore for MemoryKvStore {
    fn get(&self, key: &str) -> StoreResult<Option<StoredValue>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<Revision>,
        value: &str,
    ) -> StoreResult<CasOutcome> {
        let mut entries = self.lock()?;
        let current = entries.get(key).map(|entry| entry.revision);
        if current != expected {
            return Ok(CasOutcome::Conflict(current));
        }

        let revision = current.map_or(1, |revision| revision + 1);
        entries.insert(
            key.to_string(),
            StoredValue {
                value: value.to_string(),
                revision,
            },
        );
        Ok(CasOutcome::Swapped(revision))
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryKvStore;
    use crate::kv::{CasOutcome, KeyValueStore};

    #[test]
    fn first_write_requires_absent_key() {
        let store = MemoryKvStore::new();
        assert_eq!(
            store.compare_and_swap("k", None, "a").unwrap(),
            CasOutcome::Swapped(1)
        );
        assert_eq!(
            store.compare_and_swap("k", None, "b").unwrap(),
            CasOutcome::Conflict(Some(1))
        );
        assert_eq!(store.get("k").unwrap().unwrap().value, "a");
    }

    #[test]
    fn stale_revision_is_rejected() {
        let store = MemoryKvStore::new();
        store.compare_and_swap("k", None, "a").unwrap();
        store.compare_and_swap("k", Some(1), "b").unwrap();

        let outcome = store.compare_and_swap("k", Some(1), "c").unwrap();
        assert_eq!(outcome, CasOutcome::Conflict(Some(2)));
        assert_eq!(store.get("k").unwrap().unwrap().value, "b");
    }

    #[test]
    fn missing_key_reads_as_none() {
        let store = MemoryKvStore::new();
        assert!(store.get("nothing").unwrap().is_none());
        assert_eq!(
            store.compare_and_swap("nothing", Some(3), "x").unwrap(),
            CasOutcome::Conflict(None)
        );
    }
}
