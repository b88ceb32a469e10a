//! Market use-case service.
//!
//! # Responsibility
//! - Turn form input into persisted markets (id, owner, timestamps).
//! - Provide the dashboard listing, detail lookup, delete and update flows.
//!
//! # Invariants
//! - Service APIs never bypass repository validation/persistence contracts.
//! - Owner ids come from the identity provider, falling back to
//!   `PLACEHOLDER_USER_ID` when nobody is signed in.

use crate::identity::{Anonymous, IdentityProvider, DEFAULT_GREETING_NAME};
use crate::model::market::{
    CreateMarketInput, Market, MarketId, MarketPatch, PLACEHOLDER_USER_ID,
};
use crate::repo::market_repo::{MarketRepository, RepoResult};
use chrono::{DateTime, Utc};

/// Dashboard listing: every market plus the total count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketListing {
    pub items: Vec<Market>,
    pub count: usize,
}

/// Use-case service wrapper for market CRUD.
pub struct MarketService<R: MarketRepository, I: IdentityProvider = Anonymous> {
    repo: R,
    identity: I,
    now: fn() -> DateTime<Utc>,
}

impl<R: MarketRepository> MarketService<R> {
    /// Creates a service with no signed-in user.
    pub fn new(repo: R) -> Self {
        Self::with_identity(repo, Anonymous)
    }
}

impl<R: MarketRepository, I: IdentityProvider> MarketService<R, I> {
    pub fn with_identity(repo: R, identity: I) -> Self {
        Self {
            repo,
            identity,
            now: Utc::now,
        }
    }

    /// Replaces the time source used for ids and timestamps.
    pub fn with_clock(mut self, now: fn() -> DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// Creates and persists a market from add-market form input.
    ///
    /// # Contract
    /// - Assigns a fresh `market_<epoch_ms>_<suffix>` id.
    /// - Sets `createdAt == updatedAt == now`.
    /// - Returns the stored record.
    pub fn create_market(&self, input: CreateMarketInput) -> RepoResult<Market> {
        let market = Market::create(input, self.owner_id(), (self.now)())?;
        self.repo.insert(&market)?;
        Ok(market)
    }

    /// Lists every market for the dashboard; no paging, filter or sort.
    pub fn list_markets(&self) -> RepoResult<MarketListing> {
        let items = self.repo.list_all()?;
        Ok(MarketListing {
            count: items.len(),
            items,
        })
    }

    /// Resolves one market for the detail screen.
    pub fn get_market(&self, id: &MarketId) -> RepoResult<Option<Market>> {
        self.repo.find_by_id(id)
    }

    /// Deletes a market. Deleting an unknown id is a silent no-op.
    pub fn delete_market(&self, id: &MarketId) -> RepoResult<bool> {
        self.repo.delete_by_id(id)
    }

    /// Applies a partial update and refreshes `updatedAt`.
    pub fn update_market(&self, id: &MarketId, patch: MarketPatch) -> RepoResult<Market> {
        self.repo.update(id, &patch, (self.now)())
    }

    /// Name used by the dashboard greeting.
    pub fn greeting_name(&self) -> String {
        self.identity
            .current_user()
            .map(|user| user.greeting_name().to_string())
            .unwrap_or_else(|| DEFAULT_GREETING_NAME.to_string())
    }

    fn owner_id(&self) -> String {
        self.identity
            .current_user()
            .map(|user| user.id)
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| PLACEHOLDER_USER_ID.to_string())
    }
}
