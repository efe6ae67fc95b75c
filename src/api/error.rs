//! HTTP error mapping.
//!
//! Every 401 caused by a missing, malformed, forged or expired token renders
//! the same body so callers cannot tell them apart.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;
use utoipa::ToSchema;

use crate::users::DirectoryError;

pub const UNAUTHORIZED: &str = "unauthorized";

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("not found")]
    NotFound,
    #[error("user already exists")]
    Duplicate,
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("invalid or expired token")]
    InvalidOrExpiredToken,
    #[error("missing bearer token")]
    Unauthenticated,
    #[error("{0}")]
    BadRequest(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Duplicate => StatusCode::CONFLICT,
            Self::InvalidCredentials | Self::InvalidOrExpiredToken | Self::Unauthenticated => {
                StatusCode::UNAUTHORIZED
            }
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn public_message(&self) -> String {
        match self {
            Self::InvalidOrExpiredToken | Self::Unauthenticated => UNAUTHORIZED.to_string(),
            Self::Internal(_) => "internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Internal(detail) = &self {
            error!("Failed to handle request: {detail}");
        }
        let body = ErrorBody {
            error: self.public_message(),
        };
        (self.status(), Json(body)).into_response()
    }
}

impl From<DirectoryError> for ApiError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::BadRequest(message) => Self::BadRequest(message.to_string()),
            DirectoryError::Duplicate => Self::Duplicate,
            DirectoryError::NotFound => Self::NotFound,
            DirectoryError::InvalidCredentials => Self::InvalidCredentials,
            other => Self::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn render(error: ApiError) -> (StatusCode, serde_json::Value) {
        let response = error.into_response();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn token_failures_are_indistinguishable() {
        let missing = render(ApiError::Unauthenticated).await;
        let invalid = render(ApiError::InvalidOrExpiredToken).await;
        assert_eq!(missing, invalid);
        assert_eq!(missing.0, StatusCode::UNAUTHORIZED);
        assert_eq!(missing.1["error"], "unauthorized");
    }

    #[tokio::test]
    async fn status_codes() {
        assert_eq!(render(ApiError::NotFound).await.0, StatusCode::NOT_FOUND);
        assert_eq!(render(ApiError::Duplicate).await.0, StatusCode::CONFLICT);
        assert_eq!(
            render(ApiError::InvalidCredentials).await.0,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            render(ApiError::BadRequest("bad".to_string())).await.0,
            StatusCode::BAD_REQUEST
        );
    }

    #[tokio::test]
    async fn internal_details_stay_in_logs() {
        let (status, body) = render(ApiError::Internal("pool timed out".to_string())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "internal server error");
    }

    #[test]
    fn directory_errors_map_to_api_errors() {
        assert!(matches!(
            ApiError::from(DirectoryError::Duplicate),
            ApiError::Duplicate
        ));
        assert!(matches!(
            ApiError::from(DirectoryError::BadRequest("invalid username")),
            ApiError::BadRequest(message) if message == "invalid username"
        ));
        assert!(matches!(
            ApiError::from(DirectoryError::Store(crate::users::StoreError::Database(
                sqlx::Error::PoolTimedOut
            ))),
            ApiError::Internal(_)
        ));
    }
}
