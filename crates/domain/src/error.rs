//! Placement error taxonomy.

use common::ProductId;
use thiserror::Error;

/// Errors a placement request can fail with before anything is written.
///
/// `EmptyOrder` and `InvalidQuantity` mean the caller's input is wrong and
/// must be fixed; `ProductNotFound` likewise. `InsufficientStock` is a
/// business-rule rejection the caller can only resolve by adjusting
/// quantities. None of these are retryable as-is, and none leave any
/// partial write behind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlacementError {
    /// The request carried no items at all.
    #[error("order must contain at least one item")]
    EmptyOrder,

    /// An item carried a non-positive quantity.
    #[error("invalid quantity {quantity} for product {product_id}")]
    InvalidQuantity { product_id: ProductId, quantity: u32 },

    /// A referenced product does not exist in the catalog.
    #[error("product {product_id} not found")]
    ProductNotFound { product_id: ProductId },

    /// Accumulated demand for a product exceeds its available stock.
    #[error(
        "insufficient stock for product {product_id}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        product_id: ProductId,
        requested: i64,
        available: i64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_product() {
        let id = ProductId::new();
        let err = PlacementError::ProductNotFound { product_id: id };
        assert!(err.to_string().contains(&id.to_string()));

        let err = PlacementError::InsufficientStock {
            product_id: id,
            requested: 3,
            available: 2,
        };
        let msg = err.to_string();
        assert!(msg.contains(&id.to_string()));
        assert!(msg.contains("requested 3"));
        assert!(msg.contains("available 2"));
    }
}
