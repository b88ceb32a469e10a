//! Market repository contract and key-value implementation.
//!
//! # Responsibility
//! - Provide list/find/insert/delete/update over the market collection.
//! - Keep the single-key JSON layout inside the persistence boundary.
//!
//! # Invariants
//! - The whole collection lives under `MARKETS_KEY` as one JSON array.
//! - Writes are read-modify-write cycles committed by compare-and-swap;
//!   a concurrent writer forces a re-read, never a silent overwrite.
//! - Market ids are unique within the collection.
//! - Read paths reject undecodable or invalid stored state instead of
//!   masking it.

use crate::kv::{CasOutcome, KeyValueStore, Revision, StoreError};
use crate::model::market::{Market, MarketId, MarketPatch, MarketValidationError};
use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Storage key holding the JSON-encoded market array.
pub const MARKETS_KEY: &str = "markets";

/// Attempts per write before giving up on a contended key.
pub const MAX_WRITE_ATTEMPTS: u32 = 8;

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug)]
pub enum RepoError {
    Validation(MarketValidationError),
    Store(StoreError),
    NotFound(MarketId),
    DuplicateId(MarketId),
    /// Stored collection could not be decoded or holds an invalid record.
    CorruptCollection(String),
    /// Every compare-and-swap attempt lost to another writer.
    Contention { attempts: u32 },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "market not found: {id}"),
            Self::DuplicateId(id) => write!(f, "market id already exists: {id}"),
            Self::CorruptCollection(message) => {
                write!(f, "stored market collection is corrupt: {message}")
            }
            Self::Contention { attempts } => write!(
                f,
                "market collection changed concurrently; gave up after {attempts} attempts"
            ),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<MarketValidationError> for RepoError {
    fn from(value: MarketValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StoreError> for RepoError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Repository interface for market CRUD operations.
pub trait MarketRepository {
    /// Returns every stored market in stored order; empty when none.
    fn list_all(&self) -> RepoResult<Vec<Market>>;
    /// Linear scan of `list_all` by id.
    fn find_by_id(&self, id: &MarketId) -> RepoResult<Option<Market>>;
    /// Appends one market. Rejects ids already present.
    fn insert(&self, market: &Market) -> RepoResult<()>;
    /// Removes the market with `id`. Returns `false` when it was absent.
    fn delete_by_id(&self, id: &MarketId) -> RepoResult<bool>;
    /// Applies `patch` to the stored market with `id` and returns the result.
    ///
    /// The patch is re-applied to the freshly loaded record on every write
    /// attempt, so fields changed concurrently by another writer survive.
    fn update(
        &self,
        id: &MarketId,
        patch: &MarketPatch,
        now: DateTime<Utc>,
    ) -> RepoResult<Market>;
}

impl<R: MarketRepository + ?Sized> MarketRepository for &R {
    fn list_all(&self) -> RepoResult<Vec<Market>> {
        (**self).list_all()
    }

    fn find_by_id(&self, id: &MarketId) -> RepoResult<Option<Market>> {
        (**self).find_by_id(id)
    }

    fn insert(&self, market: &Market) -> RepoResult<()> {
        (**self).insert(market)
    }

    fn delete_by_id(&self, id: &MarketId) -> RepoResult<bool> {
        (**self).delete_by_id(id)
    }

    fn update(
        &self,
        id: &MarketId,
        patch: &MarketPatch,
        now: DateTime<Utc>,
    ) -> RepoResult<Market> {
        (**self).update(id, patch, now)
    }
}

/// Outcome of one collection edit inside a write cycle.
enum Edit<T> {
    /// Persist the edited collection, then return the value.
    Write(T),
    /// Nothing changed; skip the write.
    Unchanged(T),
}

/// Market repository persisting the collection in a key-value store.
pub struct KvMarketRepository<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> KvMarketRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    fn load(&self) -> RepoResult<(Vec<Market>, Option<Revision>)> {
        let Some(stored) = self.store.get(MARKETS_KEY)? else {
            return Ok((Vec::new(), None));
        };

        let markets: Vec<Market> = serde_json::from_str(&stored.value).map_err(|err| {
            error!(
                "event=markets_load module=repo status=error error_code=corrupt_collection revision={}",
                stored.revision
            );
            RepoError::CorruptCollection(err.to_string())
        })?;
        let mut seen = HashSet::with_capacity(markets.len());
        for market in &markets {
            market.validate().map_err(|err| {
                RepoError::CorruptCollection(format!("market `{}`: {err}", market.id))
            })?;
            if !seen.insert(&market.id) {
                error!(
                    "event=markets_load module=repo status=error error_code=duplicate_id revision={}",
                    stored.revision
                );
                return Err(RepoError::CorruptCollection(format!(
                    "market id `{}` stored more than once",
                    market.id
                )));
            }
        }

        Ok((markets, Some(stored.revision)))
    }

    fn write_cycle<T>(
        &self,
        op: &'static str,
        mut edit: impl FnMut(&mut Vec<Market>) -> RepoResult<Edit<T>>,
    ) -> RepoResult<T> {
        let started_at = Instant::now();
        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let (mut markets, revision) = self.load()?;
            let value = match edit(&mut markets)? {
                Edit::Write(value) => value,
                Edit::Unchanged(value) => {
                    debug!("event={op} module=repo status=ok changed=false attempts={attempt}");
                    return Ok(value);
                }
            };

            let encoded = serde_json::to_string(&markets)
                .map_err(|err| RepoError::CorruptCollection(err.to_string()))?;
            match self.store.compare_and_swap(MARKETS_KEY, revision, &encoded)? {
                CasOutcome::Swapped(new_revision) => {
                    info!(
                        "event={op} module=repo status=ok attempts={attempt} count={} revision={new_revision} duration_ms={}",
                        markets.len(),
                        started_at.elapsed().as_millis()
                    );
                    return Ok(value);
                }
                CasOutcome::Conflict(current) => {
                    debug!(
                        "event={op} module=repo status=retry attempt={attempt} expected={revision:?} current={current:?}"
                    );
                }
            }
        }

        warn!(
            "event={op} module=repo status=error error_code=contention attempts={MAX_WRITE_ATTEMPTS}"
        );
        Err(RepoError::Contention {
            attempts: MAX_WRITE_ATTEMPTS,
        })
    }
}

impl<S: KeyValueStore> MarketRepository for KvMarketRepository<S> {
    fn list_all(&self) -> RepoResult<Vec<Market>> {
        self.load().map(|(markets, _)| markets)
    }

    fn find_by_id(&self, id: &MarketId) -> RepoResult<Option<Market>> {
        Ok(self
            .list_all()?
            .into_iter()
            .find(|market| &market.id == id))
    }

    fn insert(&self, market: &Market) -> RepoResult<()> {
        market.validate()?;
        self.write_cycle("market_insert", |markets| {
            if markets.iter().any(|existing| existing.id == market.id) {
                return Err(RepoError::DuplicateId(market.id.clone()));
            }
            markets.push(market.clone());
            Ok(Edit::Write(()))
        })
    }

    fn delete_by_id(&self, id: &MarketId) -> RepoResult<bool> {
        self.write_cycle("market_delete", |markets| {
            let before = markets.len();
            markets.retain(|market| &market.id != id);
            if markets.len() == before {
                Ok(Edit::Unchanged(false))
            } else {
                Ok(Edit::Write(true))
            }
        })
    }

    fn update(
        &self,
        id: &MarketId,
        patch: &MarketPatch,
        now: DateTime<Utc>,
    ) -> RepoResult<Market> {
        patch.validate()?;
        self.write_cycle("market_update", |markets| {
            let slot = markets
                .iter_mut()
                .find(|existing| &existing.id == id)
                .ok_or_else(|| RepoError::NotFound(id.clone()))?;
            slot.apply_patch(patch.clone(), now)?;
            Ok(Edit::Write(slot.clone()))
        })
    }
}
