//! User management endpoints.
//!
//! Flow Overview:
//! 1) The gate attaches an identity from the bearer token.
//! 2) The route policy and the `Identity` extractor reject requests without one.
//! 3) The directory performs the read, update or delete.

use axum::{
    Json,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
};
use std::sync::Arc;
use tracing::instrument;

use super::{json_payload, parse_user_id};
use crate::{
    api::{ApiError, ErrorBody},
    auth::Identity,
    users::{Credentials, UserDirectory, UserResponse},
};

#[utoipa::path(
    get,
    path = "/users",
    responses(
        (status = 200, description = "All users, oldest first.", body = [UserResponse]),
        (status = 401, description = "Missing, invalid or expired token.", body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "users"
)]
#[instrument(skip_all, fields(caller = %identity.username))]
pub async fn list_users(
    identity: Identity,
    directory: Extension<Arc<UserDirectory>>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let records = directory.list().await?;
    Ok(Json(records.into_iter().map(UserResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/users/{id}",
    params(
        ("id" = String, Path, description = "User id")
    ),
    responses(
        (status = 200, description = "User record.", body = UserResponse),
        (status = 400, description = "Invalid user id.", body = ErrorBody),
        (status = 401, description = "Missing, invalid or expired token.", body = ErrorBody),
        (status = 404, description = "User not found.", body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "users"
)]
#[instrument(skip_all, fields(caller = %identity.username))]
pub async fn get_user(
    Path(id): Path<String>,
    identity: Identity,
    directory: Extension<Arc<UserDirectory>>,
) -> Result<Json<UserResponse>, ApiError> {
    let user_id = parse_user_id(&id)?;
    let record = directory.get(user_id).await?;
    Ok(Json(record.into()))
}

#[utoipa::path(
    put,
    path = "/users/{id}",
    params(
        ("id" = String, Path, description = "User id")
    ),
    request_body = Credentials,
    responses(
        (status = 200, description = "User updated; the password is re-hashed.", body = UserResponse),
        (status = 400, description = "Invalid id or input.", body = ErrorBody),
        (status = 401, description = "Missing, invalid or expired token.", body = ErrorBody),
        (status = 404, description = "User not found.", body = ErrorBody),
        (status = 409, description = "Username belongs to another user.", body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "users"
)]
#[instrument(skip_all, fields(caller = %identity.username))]
pub async fn update_user(
    Path(id): Path<String>,
    identity: Identity,
    directory: Extension<Arc<UserDirectory>>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<Json<UserResponse>, ApiError> {
    let user_id = parse_user_id(&id)?;
    let credentials = json_payload(payload)?;
    let record = directory
        .update(user_id, &credentials.username, &credentials.password)
        .await?;
    Ok(Json(record.into()))
}

#[utoipa::path(
    delete,
    path = "/users/{id}",
    params(
        ("id" = String, Path, description = "User id")
    ),
    responses(
        (status = 204, description = "User deleted."),
        (status = 400, description = "Invalid user id.", body = ErrorBody),
        (status = 401, description = "Missing, invalid or expired token.", body = ErrorBody),
        (status = 404, description = "User not found.", body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "users"
)]
#[instrument(skip_all, fields(caller = %identity.username))]
pub async fn delete_user(
    Path(id): Path<String>,
    identity: Identity,
    directory: Extension<Arc<UserDirectory>>,
) -> Result<StatusCode, ApiError> {
    let user_id = parse_user_id(&id)?;
    if directory.delete(user_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}
