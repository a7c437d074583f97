//! Catalog and inventory entity types.
//!
//! Products are read-only from the placement core's perspective; the
//! inventory level is the only catalog-side state a placement mutates.

use common::ProductId;
use serde::{Deserialize, Serialize};

use crate::money::Money;

/// A product in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub product_id: ProductId,
    pub name: String,
    pub description: Option<String>,
    /// Unit price, positive.
    pub price: Money,
    /// ISO 4217 currency code, e.g. `"USD"`.
    pub currency: String,
}

/// Input for registering a new product together with its opening stock.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub currency: String,
    pub stock_quantity: i64,
}

impl NewProduct {
    /// Checks the fields a product row must satisfy: non-empty name,
    /// positive price, non-negative opening stock.
    pub fn is_valid(&self) -> bool {
        !self.name.trim().is_empty() && self.price.is_positive() && self.stock_quantity >= 0
    }
}

/// Available stock for a product. One-to-one with [`Product`].
///
/// Invariant: `stock_quantity` is never negative at any committed state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryLevel {
    pub product_id: ProductId,
    pub stock_quantity: i64,
}

/// A product joined with its current stock, as shown in catalog listings.
#[derive(Debug, Clone, Serialize)]
pub struct ProductListing {
    pub product_id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub currency: String,
    pub stock_quantity: i64,
}
