//! Storage backends for the storefront system.
//!
//! The [`Store`] trait is the boundary between the HTTP layer and
//! persistence. Its central operation, [`Store::place_order`], commits an
//! order, its lines, and the matching stock decrements as one atomic unit
//! — or commits nothing. Two implementations are provided:
//!
//! - [`InMemoryStore`] for tests and local runs, using per-product
//!   `tokio` mutexes as reservations;
//! - [`PostgresStore`] for production, using row-level `FOR UPDATE` locks
//!   inside a single transaction.
//!
//! Both acquire reservations in the same deterministic product order (see
//! `domain::placement`), so overlapping placements serialize without
//! deadlock and disjoint placements stay independent.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use store::Store;
