//! PostgreSQL-backed static API token digests.

use async_trait::async_trait;
use sqlx::PgPool;

use expensa_application::ApiTokenRepository;
use expensa_core::{AppError, AppResult};
use expensa_domain::UserId;

use crate::postgres_errors::{is_foreign_key_violation, unique_or_internal};

/// PostgreSQL implementation of the API token repository port.
#[derive(Clone)]
pub struct PostgresApiTokenRepository {
    pool: PgPool,
}

impl PostgresApiTokenRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ApiTokenRepository for PostgresApiTokenRepository {
    async fn store_token_hash(&self, user_id: UserId, token_hash: &str) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO api_tokens (token_hash, user_id)
            VALUES ($1, $2)
            "#,
        )
        .bind(token_hash)
        .bind(user_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            if is_foreign_key_violation(&error) {
                return AppError::NotFound(format!("user '{user_id}' not found"));
            }
            unique_or_internal(error, "api token already exists", "store api token")
        })?;

        Ok(())
    }

    async fn find_user_by_token_hash(&self, token_hash: &str) -> AppResult<Option<UserId>> {
        let user_id = sqlx::query_scalar::<_, uuid::Uuid>(
            r#"
            SELECT user_id
            FROM api_tokens
            WHERE token_hash = $1
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to look up api token: {error}")))?;

        Ok(user_id.map(UserId::from_uuid))
    }
}
