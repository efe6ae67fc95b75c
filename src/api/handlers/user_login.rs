use axum::{
    Json,
    extract::{Extension, rejection::JsonRejection},
};
use std::sync::Arc;
use tracing::instrument;

use super::json_payload;
use crate::{
    api::{ApiError, ErrorBody},
    auth::IssuedToken,
    users::{Credentials, UserDirectory},
};

#[utoipa::path(
    post,
    path = "/login",
    request_body = Credentials,
    responses (
        (status = 200, description = "Credentials accepted", body = IssuedToken),
        (status = 400, description = "Malformed request body", body = ErrorBody),
        (status = 401, description = "Unknown username or wrong password", body = ErrorBody),
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn login(
    directory: Extension<Arc<UserDirectory>>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<Json<IssuedToken>, ApiError> {
    let credentials = json_payload(payload)?;
    let issued = directory
        .authenticate(&credentials.username, &credentials.password)
        .await?;
    Ok(Json(issued))
}
