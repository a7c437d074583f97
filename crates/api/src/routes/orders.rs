//! Order placement and order history endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use common::UserId;
use domain::{ItemRequest, PlacementRequest};
use serde::{Deserialize, Serialize};
use store::{Store, StoreError};

use crate::AppState;
use crate::error::ApiError;

// -- Request types --

#[derive(Deserialize)]
pub struct PlaceOrderRequest {
    pub user_id: uuid::Uuid,
    #[serde(default)]
    pub items: Vec<OrderItemRequest>,
}

#[derive(Deserialize)]
pub struct OrderItemRequest {
    pub product_id: uuid::Uuid,
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
pub struct ListOrdersParams {
    pub user_id: Option<uuid::Uuid>,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderCreatedResponse {
    pub message: &'static str,
    pub order_id: String,
    pub total_amount: String,
    pub total_cents: i64,
    pub items: Vec<OrderLineResponse>,
}

#[derive(Serialize)]
pub struct OrderLineResponse {
    pub product_id: String,
    pub quantity: u32,
    pub price_at_time: String,
    pub price_at_time_cents: i64,
}

#[derive(Serialize)]
pub struct OrderSummaryResponse {
    pub order_id: String,
    pub total_amount: String,
    pub total_cents: i64,
    pub status: String,
    pub created_at: String,
}

// -- Handlers --

/// POST /orders — place an order atomically against catalog and stock.
#[tracing::instrument(skip(state, req), fields(user_id = %req.user_id))]
pub async fn create<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<PlaceOrderRequest>,
) -> Result<(axum::http::StatusCode, Json<OrderCreatedResponse>), ApiError> {
    let request = PlacementRequest {
        user_id: UserId::from_uuid(req.user_id),
        items: req
            .items
            .iter()
            .map(|item| ItemRequest {
                product_id: item.product_id.into(),
                quantity: item.quantity,
            })
            .collect(),
    };

    let receipt = match state.store.place_order(request).await {
        Ok(receipt) => {
            metrics::counter!("orders_placed_total").increment(1);
            receipt
        }
        Err(err) => {
            metrics::counter!("order_placement_failures_total", "kind" => failure_kind(&err))
                .increment(1);
            return Err(err.into());
        }
    };

    let items = receipt
        .lines
        .iter()
        .map(|line| OrderLineResponse {
            product_id: line.product_id.to_string(),
            quantity: line.quantity,
            price_at_time: line.price_at_time.to_decimal_string(),
            price_at_time_cents: line.price_at_time.cents(),
        })
        .collect();

    Ok((
        axum::http::StatusCode::CREATED,
        Json(OrderCreatedResponse {
            message: "Order created",
            order_id: receipt.order_id.to_string(),
            total_amount: receipt.total_amount.to_decimal_string(),
            total_cents: receipt.total_amount.cents(),
            items,
        }),
    ))
}

/// GET /orders?user_id=… — list a user's past orders.
#[tracing::instrument(skip(state))]
pub async fn list<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<ListOrdersParams>,
) -> Result<Json<Vec<OrderSummaryResponse>>, ApiError> {
    let user_id = params
        .user_id
        .ok_or_else(|| ApiError::BadRequest("user_id is required".to_string()))?;

    let orders = state.store.orders_for_user(UserId::from_uuid(user_id)).await?;

    let responses = orders
        .into_iter()
        .map(|o| OrderSummaryResponse {
            order_id: o.order_id.to_string(),
            total_amount: o.total_amount.to_decimal_string(),
            total_cents: o.total_amount.cents(),
            status: o.status.to_string(),
            created_at: o.created_at.to_rfc3339(),
        })
        .collect();

    Ok(Json(responses))
}

fn failure_kind(err: &StoreError) -> &'static str {
    match err {
        StoreError::Placement(placement) => match placement {
            domain::PlacementError::EmptyOrder
            | domain::PlacementError::InvalidQuantity { .. } => "validation",
            domain::PlacementError::ProductNotFound { .. } => "not_found",
            domain::PlacementError::InsufficientStock { .. } => "insufficient_stock",
        },
        StoreError::Conflict { .. } => "conflict",
        StoreError::Database(_) | StoreError::Migration(_) | StoreError::InvalidRow(_) => {
            "internal"
        }
    }
}
