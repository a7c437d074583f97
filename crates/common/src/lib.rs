//! Shared identifier types used across the storefront crates.

pub mod types;

pub use types::{OrderId, ProductId, UserId};
