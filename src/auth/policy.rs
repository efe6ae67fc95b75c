//! Route access table.
//!
//! Every path is looked up in [`ROUTES`]; the first matching rule wins and any
//! path without a rule requires authentication. The check runs after the gate
//! and before any handler.

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;

use super::gate::{Identity, bearer_token};
use crate::api::ApiError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    Public,
    Authenticated,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PathPattern {
    Exact(&'static str),
    Prefix(&'static str),
}

impl PathPattern {
    #[must_use]
    pub fn matches(self, path: &str) -> bool {
        match self {
            Self::Exact(expected) => path == expected,
            Self::Prefix(prefix) => path.starts_with(prefix),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct RouteRule {
    pub pattern: PathPattern,
    pub access: Access,
}

impl RouteRule {
    const fn public(pattern: PathPattern) -> Self {
        Self {
            pattern,
            access: Access::Public,
        }
    }

    const fn authenticated(pattern: PathPattern) -> Self {
        Self {
            pattern,
            access: Access::Authenticated,
        }
    }
}

pub const ROUTES: &[RouteRule] = &[
    RouteRule::public(PathPattern::Exact("/register")),
    RouteRule::public(PathPattern::Exact("/login")),
    RouteRule::public(PathPattern::Exact("/health")),
    RouteRule::public(PathPattern::Exact("/swagger-ui")),
    RouteRule::public(PathPattern::Prefix("/swagger-ui/")),
    RouteRule::public(PathPattern::Prefix("/api-docs/")),
    RouteRule::authenticated(PathPattern::Exact("/users")),
    RouteRule::authenticated(PathPattern::Prefix("/users/")),
];

/// Access level for a request path; unlisted paths require authentication.
#[must_use]
pub fn access_for(path: &str) -> Access {
    ROUTES
        .iter()
        .find(|rule| rule.pattern.matches(path))
        .map_or(Access::Authenticated, |rule| rule.access)
}

/// Reject requests to protected paths that carry no [`Identity`].
pub async fn enforce(request: Request, next: Next) -> Response {
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    if access_for(path) == Access::Authenticated && request.extensions().get::<Identity>().is_none()
    {
        // Both variants render the same response; the split only shows up in logs.
        let error = if bearer_token(request.headers()).is_some() {
            ApiError::InvalidOrExpiredToken
        } else {
            ApiError::Unauthenticated
        };
        debug!(path, "rejecting request: {error}");
        return error.into_response();
    }

    next.run(request).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode, header::AUTHORIZATION},
        middleware,
        routing::get,
    };
    use tower::ServiceExt;

    #[test]
    fn public_routes() {
        for path in [
            "/register",
            "/login",
            "/health",
            "/swagger-ui",
            "/swagger-ui/index.html",
            "/api-docs/openapi.json",
        ] {
            assert_eq!(access_for(path), Access::Public, "{path}");
        }
    }

    #[test]
    fn protected_and_unlisted_routes() {
        for path in ["/users", "/users/123", "/users/:id", "/", "/admin", "/registerx", "/swagger-uix"] {
            assert_eq!(access_for(path), Access::Authenticated, "{path}");
        }
    }

    fn app() -> Router {
        Router::new()
            .route("/users", get(|| async { "users" }))
            .route("/login", get(|| async { "login" }))
            .layer(middleware::from_fn(enforce))
    }

    #[tokio::test]
    async fn protected_route_without_identity_is_unauthorized() {
        for header in [None, Some("Bearer forged.token.here")] {
            let mut builder = Request::builder().uri("/users");
            if let Some(value) = header {
                builder = builder.header(AUTHORIZATION, value);
            }
            let response = app()
                .oneshot(builder.body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[tokio::test]
    async fn public_route_passes_through() {
        let response = app()
            .oneshot(Request::builder().uri("/login").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_route_requires_identity() {
        let response = app()
            .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
