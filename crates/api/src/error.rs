//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::PlacementError;
use store::StoreError;

/// API-level error type that maps to HTTP responses.
///
/// The status code tells the caller's retry logic what to do: 400/404
/// mean the request must change, 409 means the identical request is safe
/// to retry, 500 is retryable at the caller's discretion with backoff.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from the client.
    BadRequest(String),
    /// Resource not found.
    NotFound(String),
    /// Store layer error.
    Store(StoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Store(err) => store_error_to_response(err),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn store_error_to_response(err: StoreError) -> (StatusCode, String) {
    match &err {
        StoreError::Placement(placement) => match placement {
            PlacementError::ProductNotFound { .. } => (StatusCode::NOT_FOUND, err.to_string()),
            PlacementError::EmptyOrder
            | PlacementError::InvalidQuantity { .. }
            | PlacementError::InsufficientStock { .. } => {
                (StatusCode::BAD_REQUEST, err.to_string())
            }
        },
        StoreError::Conflict { .. } => (StatusCode::CONFLICT, err.to_string()),
        StoreError::Database(_) | StoreError::Migration(_) | StoreError::InvalidRow(_) => {
            tracing::error!(error = %err, "internal store error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal server error".to_string(),
            )
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Store(err)
    }
}
