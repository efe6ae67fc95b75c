//! Route handlers.
//!
//! `/health`, `/register` and `/login` are public; everything under `/users`
//! takes an [`crate::auth::Identity`] and is only reached with a valid token.

pub mod health;
pub mod user_login;
pub mod user_register;
pub mod users;

use axum::{Json, extract::rejection::JsonRejection};
use uuid::Uuid;

use super::ApiError;

/// Unwrap a JSON body, turning any extractor rejection into a 400.
pub(crate) fn json_payload<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

pub(crate) fn parse_user_id(id: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(id.trim()).map_err(|_| ApiError::BadRequest("invalid user id".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_id_parsing() {
        let id = Uuid::now_v7();
        assert_eq!(parse_user_id(&id.to_string()).ok(), Some(id));
        assert_eq!(parse_user_id(&format!(" {id} ")).ok(), Some(id));
        assert!(matches!(parse_user_id("42"), Err(ApiError::BadRequest(_))));
    }
}
