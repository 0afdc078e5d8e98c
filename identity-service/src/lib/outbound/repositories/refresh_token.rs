use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::PgPool;

use crate::domain::auth::errors::AuthError;
use crate::domain::auth::models::RefreshTokenRecord;
use crate::domain::auth::ports::RefreshTokenStore;
use crate::domain::user::models::UserId;

fn database_error(e: sqlx::Error) -> AuthError {
    tracing::error!("Refresh token query failed: {}", e);
    AuthError::Unavailable(e.to_string())
}

/// Refresh-token digests in the `refresh_tokens` table.
///
/// Each method is a single statement, so rotation and revocation stay atomic
/// across any number of service instances.
pub struct PostgresRefreshTokenStore {
    pool: PgPool,
}

impl PostgresRefreshTokenStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RefreshTokenStore for PostgresRefreshTokenStore {
    async fn insert(&self, user_id: &UserId, record: RefreshTokenRecord) -> Result<(), AuthError> {
        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (user_id, token_hash, expires_at, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, token_hash) DO NOTHING
            "#,
        )
        .bind(user_id.0)
        .bind(&record.token_hash)
        .bind(record.expires_at)
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(())
    }

    async fn remove(&self, user_id: &UserId, token_hash: &str) -> Result<bool, AuthError> {
        let result = sqlx::query(
            r#"
            DELETE FROM refresh_tokens
            WHERE user_id = $1 AND token_hash = $2
            "#,
        )
        .bind(user_id.0)
        .bind(token_hash)
        .execute(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(result.rows_affected() == 1)
    }

    async fn remove_all(&self, user_id: &UserId) -> Result<u64, AuthError> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE user_id = $1")
            .bind(user_id.0)
            .execute(&self.pool)
            .await
            .map_err(database_error)?;

        Ok(result.rows_affected())
    }

    async fn contains(&self, user_id: &UserId, token_hash: &str) -> Result<bool, AuthError> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM refresh_tokens WHERE user_id = $1 AND token_hash = $2
            )
            "#,
        )
        .bind(user_id.0)
        .bind(token_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(database_error)
    }

    async fn prune_expired(&self, user_id: &UserId, now: DateTime<Utc>) -> Result<u64, AuthError> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE user_id = $1 AND expires_at < $2")
            .bind(user_id.0)
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(database_error)?;

        Ok(result.rows_affected())
    }

    async fn evict_oldest_beyond(&self, user_id: &UserId, keep: usize) -> Result<u64, AuthError> {
        let result = sqlx::query(
            r#"
            DELETE FROM refresh_tokens
            WHERE user_id = $1 AND token_hash IN (
                SELECT token_hash FROM refresh_tokens
                WHERE user_id = $1
                ORDER BY created_at DESC
                OFFSET $2
            )
            "#,
        )
        .bind(user_id.0)
        .bind(keep as i64)
        .execute(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(result.rows_affected())
    }
}
