//! The pure half of order placement.
//!
//! A placement decision has two parts: a reservation-and-commit discipline
//! that only a store backend can provide, and a pure computation — input
//! validation, lock ordering, demand accumulation, and exact pricing —
//! that must be identical across backends. This module holds the pure
//! computation so the in-memory and Postgres stores cannot drift apart.
//!
//! Backends drive it in three steps:
//!
//! 1. [`PlacementRequest::validate`] before any I/O;
//! 2. acquire per-product reservations in [`PlacementRequest::lock_order`]
//!    and read each product's price and stock into a [`ProductRead`];
//! 3. [`price_placement`] to turn those reads into an [`OrderDraft`], then
//!    persist the draft and the stock decrements in one atomic unit.

use std::collections::BTreeMap;

use common::{ProductId, UserId};
use serde::Deserialize;

use crate::error::PlacementError;
use crate::money::Money;
use crate::order::OrderLine;

/// One requested item: a product and a quantity.
///
/// A request may reference the same product in several items; each entry
/// is priced independently and demand is accumulated per product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ItemRequest {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// A full placement request as received from the caller.
#[derive(Debug, Clone, Deserialize)]
pub struct PlacementRequest {
    pub user_id: UserId,
    pub items: Vec<ItemRequest>,
}

impl PlacementRequest {
    /// Rejects empty requests and non-positive quantities.
    ///
    /// Must run before any I/O: a request that fails validation performs
    /// no reads, takes no reservations, and writes nothing.
    pub fn validate(&self) -> Result<(), PlacementError> {
        if self.items.is_empty() {
            return Err(PlacementError::EmptyOrder);
        }
        for item in &self.items {
            if item.quantity == 0 {
                return Err(PlacementError::InvalidQuantity {
                    product_id: item.product_id,
                    quantity: item.quantity,
                });
            }
        }
        Ok(())
    }

    /// The distinct referenced products in ascending identifier order.
    ///
    /// This is the mandatory reservation acquisition order. Every
    /// placement locks products in this same global order, so two
    /// concurrent requests over overlapping product sets can never
    /// deadlock by locking in opposite orders.
    pub fn lock_order(&self) -> Vec<ProductId> {
        let mut ids: Vec<ProductId> = self.items.iter().map(|i| i.product_id).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Total quantity demanded per distinct product, accumulated across
    /// duplicate item entries.
    pub fn demand(&self) -> BTreeMap<ProductId, i64> {
        let mut demand = BTreeMap::new();
        for item in &self.items {
            *demand.entry(item.product_id).or_insert(0) += i64::from(item.quantity);
        }
        demand
    }
}

/// Price and stock of one product, read under its reservation.
#[derive(Debug, Clone, Copy)]
pub struct ProductRead {
    pub product_id: ProductId,
    pub price: Money,
    pub stock_quantity: i64,
}

/// A fully priced order ready to be committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDraft {
    /// One line per input item, in input order, with `price_at_time` set.
    pub lines: Vec<OrderLine>,
    /// Exact sum of `price_at_time × quantity` over all lines.
    pub total_amount: Money,
    /// Stock decrement to apply per distinct product.
    pub demand: BTreeMap<ProductId, i64>,
}

/// Decides a validated placement against the reserved product reads.
///
/// Fails with [`PlacementError::ProductNotFound`] if any referenced
/// product has no read, or [`PlacementError::InsufficientStock`] if
/// accumulated demand for a product exceeds the stock that was read.
/// On success the returned draft carries everything a backend needs to
/// commit: lines with captured prices, the exact total, and the per-
/// product decrements.
pub fn price_placement(
    request: &PlacementRequest,
    reads: &[ProductRead],
) -> Result<OrderDraft, PlacementError> {
    let by_id: BTreeMap<ProductId, &ProductRead> =
        reads.iter().map(|r| (r.product_id, r)).collect();

    let demand = request.demand();
    for (&product_id, &requested) in &demand {
        let read = by_id
            .get(&product_id)
            .ok_or(PlacementError::ProductNotFound { product_id })?;
        if requested > read.stock_quantity {
            return Err(PlacementError::InsufficientStock {
                product_id,
                requested,
                available: read.stock_quantity,
            });
        }
    }

    // Lines keep the caller's item order; the total is an exact integer
    // sum, so accumulation order cannot change the result.
    let mut lines = Vec::with_capacity(request.items.len());
    let mut total_amount = Money::zero();
    for item in &request.items {
        let price_at_time = by_id[&item.product_id].price;
        total_amount += price_at_time.multiply(item.quantity);
        lines.push(OrderLine {
            product_id: item.product_id,
            quantity: item.quantity,
            price_at_time,
        });
    }

    Ok(OrderDraft {
        lines,
        total_amount,
        demand,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn pid(n: u128) -> ProductId {
        ProductId::from_uuid(Uuid::from_u128(n))
    }

    fn request(items: Vec<ItemRequest>) -> PlacementRequest {
        PlacementRequest {
            user_id: UserId::new(),
            items,
        }
    }

    fn read(id: ProductId, price_cents: i64, stock: i64) -> ProductRead {
        ProductRead {
            product_id: id,
            price: Money::from_cents(price_cents),
            stock_quantity: stock,
        }
    }

    #[test]
    fn empty_request_fails_validation() {
        let req = request(vec![]);
        assert_eq!(req.validate(), Err(PlacementError::EmptyOrder));
    }

    #[test]
    fn zero_quantity_fails_validation() {
        let req = request(vec![ItemRequest {
            product_id: pid(1),
            quantity: 0,
        }]);
        assert!(matches!(
            req.validate(),
            Err(PlacementError::InvalidQuantity { quantity: 0, .. })
        ));
    }

    #[test]
    fn lock_order_is_sorted_and_distinct() {
        let req = request(vec![
            ItemRequest {
                product_id: pid(3),
                quantity: 1,
            },
            ItemRequest {
                product_id: pid(1),
                quantity: 1,
            },
            ItemRequest {
                product_id: pid(3),
                quantity: 2,
            },
        ]);
        assert_eq!(req.lock_order(), vec![pid(1), pid(3)]);
    }

    #[test]
    fn demand_accumulates_duplicate_entries() {
        let req = request(vec![
            ItemRequest {
                product_id: pid(1),
                quantity: 2,
            },
            ItemRequest {
                product_id: pid(1),
                quantity: 3,
            },
        ]);
        assert_eq!(req.demand()[&pid(1)], 5);
    }

    #[test]
    fn prices_lines_in_input_order_with_exact_total() {
        let req = request(vec![
            ItemRequest {
                product_id: pid(2),
                quantity: 3,
            },
            ItemRequest {
                product_id: pid(1),
                quantity: 1,
            },
        ]);
        let reads = [read(pid(1), 501, 10), read(pid(2), 1000, 10)];

        let draft = price_placement(&req, &reads).unwrap();
        assert_eq!(draft.lines.len(), 2);
        assert_eq!(draft.lines[0].product_id, pid(2));
        assert_eq!(draft.lines[0].price_at_time, Money::from_cents(1000));
        assert_eq!(draft.lines[1].product_id, pid(1));
        assert_eq!(draft.total_amount, Money::from_cents(3 * 1000 + 501));
        assert_eq!(draft.demand[&pid(2)], 3);
    }

    #[test]
    fn missing_product_aborts_whole_placement() {
        let req = request(vec![
            ItemRequest {
                product_id: pid(1),
                quantity: 1,
            },
            ItemRequest {
                product_id: pid(9),
                quantity: 1,
            },
        ]);
        let reads = [read(pid(1), 100, 10)];

        assert_eq!(
            price_placement(&req, &reads),
            Err(PlacementError::ProductNotFound { product_id: pid(9) })
        );
    }

    #[test]
    fn accumulated_demand_checked_against_stock() {
        // Each entry fits on its own; together they overshoot.
        let req = request(vec![
            ItemRequest {
                product_id: pid(1),
                quantity: 3,
            },
            ItemRequest {
                product_id: pid(1),
                quantity: 3,
            },
        ]);
        let reads = [read(pid(1), 100, 5)];

        assert_eq!(
            price_placement(&req, &reads),
            Err(PlacementError::InsufficientStock {
                product_id: pid(1),
                requested: 6,
                available: 5,
            })
        );
    }

    #[test]
    fn demand_equal_to_stock_succeeds() {
        let req = request(vec![ItemRequest {
            product_id: pid(1),
            quantity: 5,
        }]);
        let reads = [read(pid(1), 100, 5)];

        let draft = price_placement(&req, &reads).unwrap();
        assert_eq!(draft.total_amount, Money::from_cents(500));
    }
}
