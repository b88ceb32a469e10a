//! Core domain logic for the climate-risk market workspace.
//! This crate is the single source of truth for market invariants.

pub mod config;
pub mod db;
pub mod identity;
pub mod kv;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{AppConfig, ConfigError, IdentityConfig};
pub use identity::{Anonymous, CurrentUser, IdentityProvider, StaticIdentity};
pub use kv::{
    CasOutcome, KeyValueStore, MemoryKvStore, Revision, SqliteKvStore, StoreError, StoreResult,
    StoredValue,
};
pub use logging::{
    default_log_level, flush_logging, init_logging, logging_status, LoggingError,
};
pub use model::analysis::{Analysis, RawData};
pub use model::market::{
    AssetClass, CreateMarketInput, Market, MarketId, MarketPatch, MarketValidationError,
    PLACEHOLDER_USER_ID,
};
pub use repo::market_repo::{
    KvMarketRepository, MarketRepository, RepoError, RepoResult, MARKETS_KEY,
};
pub use service::market_service::{MarketListing, MarketService};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
