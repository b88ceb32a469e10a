//! Domain model for markets and their (future) analysis reports.
//!
//! # Invariants
//! - Every market is identified by a stable `MarketId`.
//! - Deletion is a hard delete; no tombstones are kept.

pub mod analysis;
pub mod market;
