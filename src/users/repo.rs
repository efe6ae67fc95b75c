//! PostgreSQL credential store.

use async_trait::async_trait;
use sqlx::{Connection, PgPool, Row, postgres::PgRow};
use tracing::{Instrument, info_span};
use uuid::Uuid;

use super::{
    models::UserRecord,
    store::{StoreError, UserStore},
};

const SCHEMA: &str = include_str!("../../sql/schema.sql");

#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the `users` table if it does not exist yet.
    ///
    /// # Errors
    /// Returns an error if the schema statements fail.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

fn map_write_error(err: sqlx::Error) -> StoreError {
    if is_unique_violation(&err) {
        StoreError::Duplicate
    } else {
        StoreError::Database(err)
    }
}

fn record_from_row(row: &PgRow) -> UserRecord {
    UserRecord {
        id: row.get("id"),
        username: row.get("username"),
        password_hash: row.get("password_hash"),
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, StoreError> {
        let query = "SELECT id, username, password_hash FROM users WHERE username = $1";
        let row = sqlx::query(query)
            .bind(username)
            .fetch_optional(&self.pool)
            .instrument(info_span!("db.query", db.system = "postgresql", db.operation = "SELECT"))
            .await?;
        Ok(row.as_ref().map(record_from_row))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, StoreError> {
        let query = "SELECT id, username, password_hash FROM users WHERE id = $1";
        let row = sqlx::query(query)
            .bind(id)
            .fetch_optional(&self.pool)
            .instrument(info_span!("db.query", db.system = "postgresql", db.operation = "SELECT"))
            .await?;
        Ok(row.as_ref().map(record_from_row))
    }

    async fn list(&self) -> Result<Vec<UserRecord>, StoreError> {
        let query = r"
            SELECT id, username, password_hash
            FROM users
            ORDER BY created_at ASC, id ASC
        ";
        let rows = sqlx::query(query)
            .fetch_all(&self.pool)
            .instrument(info_span!("db.query", db.system = "postgresql", db.operation = "SELECT"))
            .await?;
        Ok(rows.iter().map(record_from_row).collect())
    }

    async fn insert(&self, record: &UserRecord) -> Result<(), StoreError> {
        let query = "INSERT INTO users (id, username, password_hash) VALUES ($1, $2, $3)";
        sqlx::query(query)
            .bind(record.id)
            .bind(&record.username)
            .bind(&record.password_hash)
            .execute(&self.pool)
            .instrument(info_span!("db.query", db.system = "postgresql", db.operation = "INSERT"))
            .await
            .map_err(map_write_error)?;
        Ok(())
    }

    async fn update(&self, record: &UserRecord) -> Result<bool, StoreError> {
        let query = r"
            UPDATE users
            SET username = $1, password_hash = $2, updated_at = NOW()
            WHERE id = $3
        ";
        let result = sqlx::query(query)
            .bind(&record.username)
            .bind(&record.password_hash)
            .bind(record.id)
            .execute(&self.pool)
            .instrument(info_span!("db.query", db.system = "postgresql", db.operation = "UPDATE"))
            .await
            .map_err(map_write_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .instrument(info_span!("db.query", db.system = "postgresql", db.operation = "DELETE"))
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self
            .pool
            .acquire()
            .instrument(info_span!("db.acquire", db.system = "postgresql", db.operation = "ACQUIRE"))
            .await?;
        conn.ping()
            .instrument(info_span!("db.ping", db.system = "postgresql", db.operation = "PING"))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::error::{DatabaseError, ErrorKind};
    use std::{borrow::Cow, error::Error as StdError, fmt};

    #[derive(Debug)]
    struct TestDbError {
        code: Option<&'static str>,
    }

    impl fmt::Display for TestDbError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "test database error")
        }
    }

    impl StdError for TestDbError {}

    impl DatabaseError for TestDbError {
        fn message(&self) -> &'static str {
            "test database error"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            self.code.map(Cow::Borrowed)
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            ErrorKind::UniqueViolation
        }
    }

    #[test]
    fn unique_violation_maps_to_duplicate() {
        let err = sqlx::Error::Database(Box::new(TestDbError {
            code: Some("23505"),
        }));
        assert!(matches!(map_write_error(err), StoreError::Duplicate));

        let err = sqlx::Error::Database(Box::new(TestDbError {
            code: Some("40001"),
        }));
        assert!(matches!(map_write_error(err), StoreError::Database(_)));

        assert!(matches!(
            map_write_error(sqlx::Error::RowNotFound),
            StoreError::Database(_)
        ));
    }

    #[test]
    fn schema_is_idempotent() {
        assert!(SCHEMA.contains("CREATE TABLE IF NOT EXISTS users"));
        assert!(SCHEMA.contains("username text NOT NULL UNIQUE"));
        assert!(!SCHEMA.contains("DROP"));
    }
}
