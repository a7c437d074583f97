//! Domain layer for the storefront system.
//!
//! Holds the value objects (money, catalog, order, user types) and the pure
//! order-placement algorithm: request validation, deterministic lock
//! ordering, per-product demand accumulation, and exact pricing. This crate
//! performs no I/O; the `store` crate supplies the reservation and
//! atomic-commit discipline around it.

pub mod catalog;
pub mod error;
pub mod money;
pub mod order;
pub mod placement;
pub mod user;

pub use catalog::{InventoryLevel, NewProduct, Product, ProductListing};
pub use error::PlacementError;
pub use money::Money;
pub use order::{Order, OrderLine, OrderStatus, OrderSummary, PlacementReceipt};
pub use placement::{ItemRequest, OrderDraft, PlacementRequest, ProductRead, price_placement};
pub use user::User;
