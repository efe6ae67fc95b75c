//! # Usergate
//!
//! `usergate` is a user-management API. It registers and authenticates users,
//! issues stateless bearer tokens and exposes CRUD on user records behind an
//! authentication gate.
//!
//! ## Authentication
//!
//! Passwords are stored as Argon2id PHC strings and are only ever compared by
//! hash verification. A successful login returns an HS256-signed JWT carrying
//! the username (`sub`), a role and an expiry (one hour unless configured).
//! The signing key is loaded once at startup (or generated) and shared
//! read-only by every request.
//!
//! ## Request pipeline
//!
//! Every request passes through the [`auth::gate`] middleware, which attaches an
//! [`auth::Identity`] when a valid bearer token is present, and then through the
//! route policy table in [`auth::policy`]. Any path not listed as public
//! requires an identity; missing, expired and forged tokens all produce the
//! same `401 Unauthorized`.

pub mod api;
pub mod auth;
pub mod cli;
pub mod users;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
