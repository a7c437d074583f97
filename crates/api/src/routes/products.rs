//! Catalog listing and product registration endpoints.
//!
//! These are simple read/insert operations with no cross-entity
//! invariant; stock changes from restocking are out of scope here and
//! products enter the catalog with their opening inventory row.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use domain::{Money, NewProduct};
use serde::{Deserialize, Serialize};
use store::Store;

use crate::AppState;
use crate::error::ApiError;

// -- Request types --

#[derive(Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub stock_quantity: i64,
}

fn default_currency() -> String {
    "USD".to_string()
}

// -- Response types --

#[derive(Serialize)]
pub struct ProductResponse {
    pub product_id: String,
    pub name: String,
    pub description: Option<String>,
    pub price: String,
    pub price_cents: i64,
    pub currency: String,
    pub stock_quantity: i64,
}

#[derive(Serialize)]
pub struct ProductCreatedResponse {
    pub message: &'static str,
    pub product_id: String,
}

// -- Handlers --

/// GET /products — list all products with current stock.
#[tracing::instrument(skip(state))]
pub async fn list<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    let listings = state.store.list_products().await?;

    let responses = listings
        .into_iter()
        .map(|p| ProductResponse {
            product_id: p.product_id.to_string(),
            name: p.name,
            description: p.description,
            price: p.price.to_decimal_string(),
            price_cents: p.price.cents(),
            currency: p.currency,
            stock_quantity: p.stock_quantity,
        })
        .collect();

    Ok(Json(responses))
}

/// POST /products — register a product with its opening stock.
#[tracing::instrument(skip(state, req), fields(name = %req.name))]
pub async fn create<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CreateProductRequest>,
) -> Result<(axum::http::StatusCode, Json<ProductCreatedResponse>), ApiError> {
    let new_product = NewProduct {
        name: req.name,
        description: req.description,
        price: Money::from_cents(req.price_cents),
        currency: req.currency,
        stock_quantity: req.stock_quantity,
    };
    if !new_product.is_valid() {
        return Err(ApiError::BadRequest(
            "product requires a name, a positive price, and non-negative stock".to_string(),
        ));
    }

    let product = state.store.add_product(new_product).await?;

    Ok((
        axum::http::StatusCode::CREATED,
        Json(ProductCreatedResponse {
            message: "Product added",
            product_id: product.product_id.to_string(),
        }),
    ))
}
