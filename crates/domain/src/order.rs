//! Order entity types.

use chrono::{DateTime, Utc};
use common::{OrderId, ProductId, UserId};
use serde::{Deserialize, Serialize};

use crate::money::Money;

/// Lifecycle state of an order.
///
/// Placement only ever produces `Created`; richer lifecycle states
/// (fulfillment, cancellation) belong to collaborators outside this core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Created,
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatus::Created => write!(f, "created"),
        }
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(OrderStatus::Created),
            other => Err(format!("unknown order status: {other}")),
        }
    }
}

/// A single line of an order.
///
/// `price_at_time` is the product price captured at placement and is
/// immutable thereafter, so historical orders are unaffected by later
/// catalog price changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub quantity: u32,
    pub price_at_time: Money,
}

impl OrderLine {
    /// The exact amount this line contributes to the order total.
    pub fn line_total(&self) -> Money {
        self.price_at_time.multiply(self.quantity)
    }
}

/// A durably recorded order with its lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: OrderId,
    pub user_id: UserId,
    pub total_amount: Money,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub lines: Vec<OrderLine>,
}

/// An order as shown in a user's order history.
#[derive(Debug, Clone, Serialize)]
pub struct OrderSummary {
    pub order_id: OrderId,
    pub total_amount: Money,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

/// What a successful placement returns to the caller: the new order id,
/// the exact total charged, and the per-line prices actually applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementReceipt {
    pub order_id: OrderId,
    pub total_amount: Money,
    pub lines: Vec<OrderLine>,
}
