//! Signed session tokens (JWT, HS256).
//!
//! Tokens are self-contained: `sub` is the username, `role` the granted role,
//! `iat`/`exp` are unix seconds. Nothing is persisted; a token is valid as long
//! as its signature verifies under the process signing key and `now <= exp`.
//!
//! The validator pins HS256. The `alg` header is never trusted to select the
//! verification scheme, so `none` or asymmetric algorithms are rejected.

use base64ct::{Base64, Encoding};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::{RngCore, rngs::OsRng};
use secrecy::{ExposeSecret, SecretBox, SecretSlice};
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    time::{SystemTime, UNIX_EPOCH},
};
use thiserror::Error;
use tracing::debug;
use utoipa::ToSchema;

pub const DEFAULT_TTL_SECONDS: u64 = 3600;
pub const MIN_KEY_BYTES: usize = 32;
pub const ROLE_USER: &str = "user";
pub const TOKEN_TYPE: &str = "Bearer";

const ALGORITHM: Algorithm = Algorithm::HS256;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("signing key must be at least {min} bytes, got {0}", min = MIN_KEY_BYTES)]
    WeakKey(usize),
    #[error("signing key is not valid base64")]
    KeyEncoding,
    #[error("jwt error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

/// Process-wide HMAC secret.
pub struct SigningKey(SecretSlice<u8>);

impl SigningKey {
    /// # Errors
    /// Returns [`TokenError::WeakKey`] if fewer than [`MIN_KEY_BYTES`] bytes are given.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, TokenError> {
        if bytes.len() < MIN_KEY_BYTES {
            return Err(TokenError::WeakKey(bytes.len()));
        }
        Ok(Self(SecretBox::new(bytes.into_boxed_slice())))
    }

    /// Decode a standard (padded) base64 secret.
    ///
    /// # Errors
    /// Returns an error if the value is not base64 or decodes to a short key.
    pub fn from_base64(encoded: &str) -> Result<Self, TokenError> {
        let bytes = Base64::decode_vec(encoded.trim()).map_err(|_| TokenError::KeyEncoding)?;
        Self::from_bytes(bytes)
    }

    /// Random key from the OS RNG. Tokens signed with it do not survive a restart.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = vec![0u8; MIN_KEY_BYTES];
        OsRng.fill_bytes(&mut bytes);
        Self(SecretBox::new(bytes.into_boxed_slice()))
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningKey(***)")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

/// Token handed back to the client after a successful login.
#[derive(Clone, Serialize, ToSchema)]
pub struct IssuedToken {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

impl fmt::Debug for IssuedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedToken")
            .field("access_token", &"***")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl_seconds: u64,
}

impl TokenService {
    #[must_use]
    pub fn new(key: &SigningKey, ttl_seconds: u64) -> Self {
        let secret = key.0.expose_secret();

        let mut validation = Validation::new(ALGORITHM);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl_seconds,
        }
    }

    #[must_use]
    pub const fn ttl_seconds(&self) -> u64 {
        self.ttl_seconds
    }

    /// Issue a token for `subject` valid from now for the configured TTL.
    ///
    /// # Errors
    /// Returns an error if the claims cannot be encoded.
    pub fn issue(&self, subject: &str, role: &str) -> Result<IssuedToken, TokenError> {
        self.issue_at(subject, role, now_unix_seconds())
    }

    /// Issue a token as if the current time were `issued_at`.
    ///
    /// # Errors
    /// Returns an error if the claims cannot be encoded.
    pub fn issue_at(
        &self,
        subject: &str,
        role: &str,
        issued_at: i64,
    ) -> Result<IssuedToken, TokenError> {
        let ttl = i64::try_from(self.ttl_seconds).unwrap_or(i64::MAX);
        let claims = Claims {
            sub: subject.to_string(),
            role: role.to_string(),
            iat: issued_at,
            exp: issued_at.saturating_add(ttl),
        };

        let access_token = encode(&Header::new(ALGORITHM), &claims, &self.encoding)?;

        Ok(IssuedToken {
            access_token,
            token_type: TOKEN_TYPE.to_string(),
            expires_in: self.ttl_seconds,
        })
    }

    /// Verify signature, algorithm and expiry, returning the claims.
    ///
    /// # Errors
    /// Returns the underlying reason the token was rejected.
    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation)?;
        Ok(data.claims)
    }

    /// Return the token subject, or `None` for any malformed, forged or expired token.
    #[must_use]
    pub fn validate(&self, token: &str) -> Option<String> {
        match self.decode(token) {
            Ok(claims) => Some(claims.sub),
            Err(err) => {
                debug!("Invalid or expired token: {err}");
                None
            }
        }
    }
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("algorithm", &ALGORITHM)
            .field("ttl_seconds", &self.ttl_seconds)
            .finish_non_exhaustive()
    }
}

fn now_unix_seconds() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| {
            i64::try_from(duration.as_secs()).unwrap_or(i64::MAX)
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use base64ct::Base64UrlUnpadded;

    fn service() -> TokenService {
        TokenService::new(&SigningKey::generate(), DEFAULT_TTL_SECONDS)
    }

    #[test]
    fn issued_token_validates_to_subject() {
        let tokens = service();
        let issued = tokens.issue("alice", ROLE_USER).unwrap();
        assert_eq!(issued.token_type, "Bearer");
        assert_eq!(issued.expires_in, 3600);
        assert_eq!(tokens.validate(&issued.access_token).as_deref(), Some("alice"));
    }

    #[test]
    fn claims_cover_role_and_ttl() {
        let tokens = service();
        let issued = tokens.issue("alice", ROLE_USER).unwrap();
        let claims = tokens.decode(&issued.access_token).unwrap();
        assert_eq!(claims.role, "user");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn token_is_three_base64url_segments() {
        let tokens = service();
        let issued = tokens.issue("alice", ROLE_USER).unwrap();
        let segments: Vec<&str> = issued.access_token.split('.').collect();
        assert_eq!(segments.len(), 3);
        for segment in segments {
            assert!(
                segment
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
            );
        }
    }

    #[test]
    fn expired_token_is_invalid() {
        let tokens = service();
        let issued_at = now_unix_seconds() - 2 * 3600;
        let issued = tokens.issue_at("alice", ROLE_USER, issued_at).unwrap();
        assert!(tokens.validate(&issued.access_token).is_none());
        assert!(matches!(
            tokens.decode(&issued.access_token),
            Err(TokenError::Jwt(_))
        ));
    }

    #[test]
    fn any_single_byte_change_invalidates_token() {
        let tokens = service();
        let token = tokens.issue("alice", ROLE_USER).unwrap().access_token;

        for index in 0..token.len() {
            let mut bytes = token.clone().into_bytes();
            bytes[index] = if bytes[index] == b'A' { b'B' } else { b'A' };
            let mutated = String::from_utf8(bytes).unwrap();
            assert!(
                tokens.validate(&mutated).is_none(),
                "mutation at byte {index} was accepted"
            );
        }
    }

    #[test]
    fn token_signed_with_other_key_is_invalid() {
        let tokens = service();
        let other = service();
        let issued = other.issue("alice", ROLE_USER).unwrap();
        assert!(tokens.validate(&issued.access_token).is_none());
    }

    #[test]
    fn other_algorithms_are_rejected() {
        let key = SigningKey::generate();
        let tokens = TokenService::new(&key, DEFAULT_TTL_SECONDS);
        let claims = Claims {
            sub: "alice".to_string(),
            role: ROLE_USER.to_string(),
            iat: now_unix_seconds(),
            exp: now_unix_seconds() + 60,
        };
        let hs512 = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(key.0.expose_secret()),
        )
        .unwrap();
        assert!(tokens.validate(&hs512).is_none());

        let header = Base64UrlUnpadded::encode_string(br#"{"alg":"none","typ":"JWT"}"#);
        let payload = Base64UrlUnpadded::encode_string(&serde_json::to_vec(&claims).unwrap());
        assert!(tokens.validate(&format!("{header}.{payload}.")).is_none());
    }

    #[test]
    fn garbage_is_invalid() {
        let tokens = service();
        for token in ["", "abc", "a.b.c", "..", "Bearer x.y.z"] {
            assert!(tokens.validate(token).is_none(), "{token} accepted");
        }
    }

    #[test]
    fn signing_key_from_base64() {
        let encoded = Base64::encode_string(&[7u8; 32]);
        assert!(SigningKey::from_base64(&encoded).is_ok());

        let short = Base64::encode_string(&[7u8; 16]);
        assert!(matches!(
            SigningKey::from_base64(&short),
            Err(TokenError::WeakKey(16))
        ));
        assert!(matches!(
            SigningKey::from_base64("not base64!"),
            Err(TokenError::KeyEncoding)
        ));
    }

    #[test]
    fn same_key_validates_across_services() {
        let encoded = Base64::encode_string(&[42u8; 48]);
        let first = TokenService::new(&SigningKey::from_base64(&encoded).unwrap(), 60);
        let second = TokenService::new(&SigningKey::from_base64(&encoded).unwrap(), 60);
        let issued = first.issue("bob", ROLE_USER).unwrap();
        assert_eq!(second.validate(&issued.access_token).as_deref(), Some("bob"));
    }

    #[test]
    fn debug_output_hides_secrets() {
        let key = SigningKey::generate();
        assert_eq!(format!("{key:?}"), "SigningKey(***)");

        let issued = TokenService::new(&key, 60).issue("alice", ROLE_USER).unwrap();
        assert!(!format!("{issued:?}").contains(&issued.access_token));
    }
}
