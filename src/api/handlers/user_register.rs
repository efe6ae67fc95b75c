use axum::{
    Json,
    extract::{Extension, rejection::JsonRejection},
    http::StatusCode,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;

use super::json_payload;
use crate::{
    api::{ApiError, ErrorBody},
    auth::IssuedToken,
    users::{Credentials, UserDirectory, UserResponse},
};

#[derive(Debug, Serialize, ToSchema)]
pub struct RegisterResponse {
    pub user: UserResponse,
    pub token: IssuedToken,
}

#[utoipa::path(
    post,
    path = "/register",
    request_body = Credentials,
    responses (
        (status = 201, description = "User created; a session token is returned", body = RegisterResponse),
        (status = 400, description = "Missing or invalid username/password", body = ErrorBody),
        (status = 409, description = "Username already exists", body = ErrorBody),
    ),
    tag = "users"
)]
#[instrument(skip_all)]
pub async fn register(
    directory: Extension<Arc<UserDirectory>>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let credentials = json_payload(payload)?;

    let record = directory
        .register(&credentials.username, &credentials.password)
        .await?;
    let token = directory.session_for(&record.username)?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user: record.into(),
            token,
        }),
    ))
}
