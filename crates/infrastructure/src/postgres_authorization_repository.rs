//! PostgreSQL-backed permission lookups.

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::PgPool;

use expensa_application::AuthorizationRepository;
use expensa_core::{AppError, AppResult};
use expensa_domain::{Permission, UserId};

/// PostgreSQL implementation of the authorization repository port.
#[derive(Clone)]
pub struct PostgresAuthorizationRepository {
    pool: PgPool,
}

impl PostgresAuthorizationRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuthorizationRepository for PostgresAuthorizationRepository {
    async fn list_permissions_for_user(&self, user_id: UserId) -> AppResult<Vec<Permission>> {
        let actions = sqlx::query_scalar::<_, String>(
            r#"
            SELECT DISTINCT grants.action
            FROM user_groups AS memberships
            INNER JOIN group_permissions AS grants
                ON grants.group_id = memberships.group_id
            WHERE memberships.user_id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load permissions: {error}")))?;

        actions
            .into_iter()
            .map(|action| {
                Permission::from_str(action.as_str()).map_err(|error| {
                    AppError::Internal(format!(
                        "failed to decode permission '{action}' for user '{user_id}': {error}"
                    ))
                })
            })
            .collect()
    }
}
