//! Bearer token authentication middleware.
//!
//! Flow Overview:
//! 1) Read `Authorization: Bearer <token>`.
//! 2) Validate it with the [`TokenService`].
//! 3) Attach an [`Identity`] to the request extensions if none is present yet.
//! 4) Always hand the request to the next stage.
//!
//! The gate never rejects. Enforcement happens in [`super::policy`] and in the
//! [`Identity`] extractor used by protected handlers.

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{
        Extensions, HeaderMap,
        header::AUTHORIZATION,
        request::Parts,
    },
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::debug;

use super::token::TokenService;
use crate::api::ApiError;

/// Authenticated user for the current request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub username: String,
}

/// Return the bearer credential from the `Authorization` header, if any.
#[must_use]
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Attach an [`Identity`] for a valid bearer token. Returns `true` if one was attached.
pub fn establish_identity(
    tokens: &TokenService,
    headers: &HeaderMap,
    extensions: &mut Extensions,
) -> bool {
    if extensions.get::<Identity>().is_some() {
        return false;
    }

    let Some(token) = bearer_token(headers) else {
        return false;
    };

    let Some(username) = tokens.validate(token) else {
        return false;
    };

    debug!(username = %username, "request authenticated");
    extensions.insert(Identity { username });
    true
}

/// axum middleware running [`establish_identity`] for every request.
pub async fn authenticate(
    State(tokens): State<Arc<TokenService>>,
    request: Request,
    next: Next,
) -> Response {
    let (mut parts, body) = request.into_parts();
    establish_identity(&tokens, &parts.headers, &mut parts.extensions);
    next.run(Request::from_parts(parts, body)).await
}

#[async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or(ApiError::Unauthenticated)
    }
}
