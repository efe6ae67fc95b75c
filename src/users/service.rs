//! User directory operations.
//!
//! Orchestrates the credential store, the password hasher and the token
//! service. Argon2 work is moved onto the blocking pool so request workers are
//! never stalled by hashing.

use regex::Regex;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinError;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::{
    models::UserRecord,
    store::{StoreError, UserStore},
};
use crate::auth::{
    IssuedToken, PasswordHasher, TokenService,
    password::HashError,
    token::{ROLE_USER, TokenError},
};

pub const MAX_USERNAME_CHARS: usize = 64;
pub const MAX_PASSWORD_CHARS: usize = 1024;

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("{0}")]
    BadRequest(&'static str),
    #[error("user already exists")]
    Duplicate,
    #[error("user not found")]
    NotFound,
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("store error: {0}")]
    Store(StoreError),
    #[error(transparent)]
    Hash(#[from] HashError),
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error("blocking task failed: {0}")]
    Task(#[from] JoinError),
}

impl From<StoreError> for DirectoryError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate => Self::Duplicate,
            StoreError::Database(_) => Self::Store(err),
        }
    }
}

/// Usernames: 1-64 characters from `[A-Za-z0-9._@-]`.
#[must_use]
pub fn valid_username(username: &str) -> bool {
    Regex::new(&format!(r"^[A-Za-z0-9._@-]{{1,{MAX_USERNAME_CHARS}}}$"))
        .is_ok_and(|re| re.is_match(username))
}

#[must_use]
pub fn valid_password(password: &str) -> bool {
    let chars = password.chars().count();
    (1..=MAX_PASSWORD_CHARS).contains(&chars)
}

fn validated(username: &str, password: &str) -> Result<String, DirectoryError> {
    let username = username.trim();
    if !valid_username(username) {
        return Err(DirectoryError::BadRequest("invalid username"));
    }
    if !valid_password(password) {
        return Err(DirectoryError::BadRequest("invalid password"));
    }
    Ok(username.to_string())
}

pub struct UserDirectory {
    store: Arc<dyn UserStore>,
    hasher: PasswordHasher,
    tokens: Arc<TokenService>,
}

impl UserDirectory {
    #[must_use]
    pub fn new(store: Arc<dyn UserStore>, hasher: PasswordHasher, tokens: Arc<TokenService>) -> Self {
        Self {
            store,
            hasher,
            tokens,
        }
    }

    #[must_use]
    pub fn tokens(&self) -> Arc<TokenService> {
        Arc::clone(&self.tokens)
    }

    async fn hash(&self, password: &str) -> Result<String, DirectoryError> {
        let hasher = self.hasher.clone();
        let password = password.to_string();
        Ok(tokio::task::spawn_blocking(move || hasher.hash(&password)).await??)
    }

    async fn verify(&self, password: &str, stored: Option<String>) -> Result<bool, DirectoryError> {
        let hasher = self.hasher.clone();
        let password = password.to_string();
        let matched = tokio::task::spawn_blocking(move || match stored {
            Some(hash) => hasher.verify(&password, &hash),
            None => {
                hasher.verify_dummy(&password);
                false
            }
        })
        .await?;
        Ok(matched)
    }

    /// Create a user with a freshly hashed password.
    ///
    /// # Errors
    /// `BadRequest` for invalid input, `Duplicate` if the username is taken.
    #[instrument(skip_all, fields(username = %username.trim()))]
    pub async fn register(&self, username: &str, password: &str) -> Result<UserRecord, DirectoryError> {
        let username = validated(username, password)?;

        if self.store.find_by_username(&username).await?.is_some() {
            return Err(DirectoryError::Duplicate);
        }

        let record = UserRecord {
            id: Uuid::now_v7(),
            username,
            password_hash: self.hash(password).await?,
        };

        // The store's uniqueness check settles races between concurrent registrations.
        self.store.insert(&record).await?;
        info!(user_id = %record.id, "user registered");
        Ok(record)
    }

    /// Check credentials and issue a session token.
    ///
    /// # Errors
    /// `InvalidCredentials` for an unknown username or a wrong password.
    #[instrument(skip_all, fields(username = %username.trim()))]
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<IssuedToken, DirectoryError> {
        let username = username.trim();
        let record = self.store.find_by_username(username).await?;
        let stored = record.as_ref().map(|r| r.password_hash.clone());

        if !self.verify(password, stored).await? {
            debug!("login rejected");
            return Err(DirectoryError::InvalidCredentials);
        }

        self.session_for(username)
    }

    /// Issue a token for an already verified username.
    ///
    /// # Errors
    /// Returns an error if the token cannot be signed.
    pub fn session_for(&self, username: &str) -> Result<IssuedToken, DirectoryError> {
        Ok(self.tokens.issue(username, ROLE_USER)?)
    }

    /// # Errors
    /// Returns an error if the store fails.
    pub async fn list(&self) -> Result<Vec<UserRecord>, DirectoryError> {
        Ok(self.store.list().await?)
    }

    /// # Errors
    /// `NotFound` if no user has this id.
    pub async fn get(&self, id: Uuid) -> Result<UserRecord, DirectoryError> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or(DirectoryError::NotFound)
    }

    /// Overwrite username and password. The password is always re-hashed.
    ///
    /// # Errors
    /// `BadRequest`, `NotFound`, or `Duplicate` if the name belongs to another user.
    #[instrument(skip_all, fields(user_id = %id))]
    pub async fn update(
        &self,
        id: Uuid,
        username: &str,
        password: &str,
    ) -> Result<UserRecord, DirectoryError> {
        let username = validated(username, password)?;

        if self.store.find_by_id(id).await?.is_none() {
            return Err(DirectoryError::NotFound);
        }

        let record = UserRecord {
            id,
            username,
            password_hash: self.hash(password).await?,
        };

        if !self.store.update(&record).await? {
            return Err(DirectoryError::NotFound);
        }
        info!("user updated");
        Ok(record)
    }

    /// Returns `false` if the id was unknown.
    ///
    /// # Errors
    /// Returns an error if the store fails.
    #[instrument(skip_all, fields(user_id = %id))]
    pub async fn delete(&self, id: Uuid) -> Result<bool, DirectoryError> {
        let deleted = self.store.delete(id).await?;
        if deleted {
            info!("user deleted");
        }
        Ok(deleted)
    }

    /// # Errors
    /// Returns an error if the store is unreachable.
    pub async fn ping(&self) -> Result<(), DirectoryError> {
        Ok(self.store.ping().await?)
    }
}
