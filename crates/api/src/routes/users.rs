//! User lookup/registration endpoint.
//!
//! Users are an external collaborator of the placement core: the order
//! endpoints take a user id as given and never validate it beyond shape.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use domain::user::email_is_valid;
use serde::{Deserialize, Serialize};
use store::Store;

use crate::AppState;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
}

#[derive(Serialize)]
pub struct UserResponse {
    pub user_id: String,
    pub email: String,
    pub username: String,
}

/// POST /users — look a user up by email, creating them if absent.
///
/// Returns 201 when a new user was created and 200 when the email was
/// already registered.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    if !email_is_valid(&req.email) {
        return Err(ApiError::BadRequest("Valid email is required".to_string()));
    }

    let (user, created) = state.store.find_or_create_user(&req.email).await?;

    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((
        status,
        Json(UserResponse {
            user_id: user.user_id.to_string(),
            email: user.email,
            username: user.username,
        }),
    ))
}
