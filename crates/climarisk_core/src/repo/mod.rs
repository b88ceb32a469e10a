//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate key-value layout details from service orchestration.
//!
//! # Invariants
//! - Repository writes enforce `Market::validate()` before persistence.
//! - Repository APIs return semantic errors (`NotFound`, `DuplicateId`) in
//!   addition to storage errors.

pub mod market_repo;
