use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

/// Stored user. `password_hash` is a PHC string and never leaves the service.
#[derive(Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
}

impl fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserRecord")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("password_hash", &"***")
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
}

impl From<&UserRecord> for UserResponse {
    fn from(record: &UserRecord) -> Self {
        Self {
            id: record.id.to_string(),
            username: record.username.clone(),
        }
    }
}

impl From<UserRecord> for UserResponse {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.id.to_string(),
            username: record.username,
        }
    }
}

/// Username/password pair used by register, login and update.
#[derive(Clone, Deserialize, Serialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_secrets() {
        let record = UserRecord {
            id: Uuid::now_v7(),
            username: "alice".to_string(),
            password_hash: "$argon2id$secret".to_string(),
        };
        let printed = format!("{record:?}");
        assert!(printed.contains("alice"));
        assert!(!printed.contains("secret"));

        let credentials = Credentials {
            username: "alice".to_string(),
            password: "pw123".to_string(),
        };
        assert!(!format!("{credentials:?}").contains("pw123"));
    }

    #[test]
    fn response_omits_hash() {
        let record = UserRecord {
            id: Uuid::now_v7(),
            username: "alice".to_string(),
            password_hash: "$argon2id$secret".to_string(),
        };
        let json = serde_json::to_value(UserResponse::from(&record)).unwrap();
        assert_eq!(json["username"], "alice");
        assert_eq!(json["id"], record.id.to_string());
        assert!(json.get("password_hash").is_none());
    }

    #[test]
    fn credentials_reject_unknown_fields() {
        let result: Result<Credentials, _> =
            serde_json::from_str(r#"{"username":"a","password":"b","role":"admin"}"#);
        assert!(result.is_err());
    }
}
