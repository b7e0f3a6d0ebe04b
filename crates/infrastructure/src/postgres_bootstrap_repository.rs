//! Idempotent seeding of the permission catalog, default groups and first administrator.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use expensa_application::{BootstrapRepository, SeedAdministrator, SeedOutcome, SeedPlan};
use expensa_core::{AppError, AppResult};
use expensa_domain::{DefaultGroup, GroupId, SUPER_ADMIN_GROUP, UserId};

/// PostgreSQL implementation of the bootstrap repository port.
#[derive(Clone)]
pub struct PostgresBootstrapRepository {
    pool: PgPool,
}

impl PostgresBootstrapRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BootstrapRepository for PostgresBootstrapRepository {
    async fn has_users(&self) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM users)")
            .fetch_one(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to count users: {error}")))
    }

    async fn seed(&self, plan: &SeedPlan) -> AppResult<SeedOutcome> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to start seed transaction: {error}"))
        })?;

        for permission in plan.permissions {
            sqlx::query(
                r#"
                INSERT INTO permissions (action)
                VALUES ($1)
                ON CONFLICT (action) DO NOTHING
                "#,
            )
            .bind(permission.as_str())
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to seed permission '{permission}': {error}"))
            })?;
        }

        for group in plan.groups {
            seed_group(&mut transaction, group).await?;
        }

        let administrator_created = match &plan.administrator {
            Some(administrator) => seed_administrator(&mut transaction, administrator).await?,
            None => false,
        };

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit seed transaction: {error}"))
        })?;

        if administrator_created {
            tracing::info!("seeded initial administrator account");
        }

        Ok(SeedOutcome {
            administrator_created,
        })
    }
}

async fn seed_group(
    transaction: &mut Transaction<'_, Postgres>,
    group: &DefaultGroup,
) -> AppResult<()> {
    // The no-op update makes RETURNING yield the id of an existing row.
    let group_id = sqlx::query_scalar::<_, uuid::Uuid>(
        r#"
        INSERT INTO groups (id, name)
        VALUES ($1, $2)
        ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
        RETURNING id
        "#,
    )
    .bind(GroupId::new().as_uuid())
    .bind(group.name)
    .fetch_one(&mut **transaction)
    .await
    .map_err(|error| {
        AppError::Internal(format!("failed to seed group '{}': {error}", group.name))
    })?;

    for permission in group.permissions {
        sqlx::query(
            r#"
            INSERT INTO group_permissions (group_id, action)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(group_id)
        .bind(permission.as_str())
        .execute(&mut **transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to grant '{permission}' to group '{}': {error}",
                group.name
            ))
        })?;
    }

    Ok(())
}

async fn seed_administrator(
    transaction: &mut Transaction<'_, Postgres>,
    administrator: &SeedAdministrator,
) -> AppResult<bool> {
    let user_id = sqlx::query_scalar::<_, uuid::Uuid>(
        r#"
        INSERT INTO users (id, email, password_hash)
        SELECT $1, LOWER($2), $3
        WHERE NOT EXISTS (SELECT 1 FROM users)
        RETURNING id
        "#,
    )
    .bind(UserId::new().as_uuid())
    .bind(administrator.email.as_str())
    .bind(administrator.password_hash.as_str())
    .fetch_optional(&mut **transaction)
    .await
    .map_err(|error| AppError::Internal(format!("failed to seed administrator: {error}")))?;

    let Some(user_id) = user_id else {
        return Ok(false);
    };

    sqlx::query(
        r#"
        INSERT INTO user_groups (user_id, group_id)
        SELECT $1, id
        FROM groups
        WHERE name = $2
        "#,
    )
    .bind(user_id)
    .bind(SUPER_ADMIN_GROUP)
    .execute(&mut **transaction)
    .await
    .map_err(|error| {
        AppError::Internal(format!("failed to add administrator to '{SUPER_ADMIN_GROUP}': {error}"))
    })?;

    Ok(true)
}

#[cfg(test)]
mod tests {
    use expensa_application::{BootstrapRepository, SeedPlan};
    use expensa_domain::{Permission, default_groups};
    use sqlx::PgPool;
    use sqlx::migrate::Migrator;
    use sqlx::postgres::PgPoolOptions;

    use super::PostgresBootstrapRepository;

    static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

    async fn test_pool() -> Option<PgPool> {
        let Ok(database_url) = std::env::var("DATABASE_URL") else {
            return None;
        };

        let pool = match PgPoolOptions::new()
            .max_connections(2)
            .connect(database_url.as_str())
            .await
        {
            Ok(pool) => pool,
            Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
        };

        if let Err(error) = MIGRATOR.run(&pool).await {
            panic!("failed to run migrations for postgres bootstrap tests: {error}");
        }

        Some(pool)
    }

    async fn seeded_rows(pool: &PgPool) -> (i64, i64) {
        let counts = sqlx::query_as::<_, (i64, i64)>(
            r#"
                SELECT
                    (SELECT COUNT(*) FROM permissions),
                    (SELECT COUNT(*) FROM group_permissions AS grants
                     INNER JOIN groups ON groups.id = grants.group_id
                     WHERE groups.name = ANY($1))
                "#,
        )
        .bind(
            default_groups()
                .iter()
                .map(|group| group.name.to_owned())
                .collect::<Vec<_>>(),
        )
        .fetch_one(pool)
        .await;

        match counts {
            Ok(counts) => counts,
            Err(error) => panic!("failed to count seeded rows: {error}"),
        }
    }

    #[tokio::test]
    async fn seeding_is_idempotent() {
        let Some(pool) = test_pool().await else {
            return;
        };

        let repository = PostgresBootstrapRepository::new(pool.clone());
        let plan = SeedPlan {
            permissions: Permission::all(),
            groups: default_groups(),
            administrator: None,
        };

        assert!(repository.seed(&plan).await.is_ok());
        let first = seeded_rows(&pool).await;
        let second_run = repository.seed(&plan).await;
        assert!(matches!(second_run, Ok(outcome) if !outcome.administrator_created));
        assert_eq!(seeded_rows(&pool).await, first);

        let expected_grants: usize = default_groups()
            .iter()
            .map(|group| group.permissions.len())
            .sum();
        assert_eq!(first.1, i64::try_from(expected_grants).unwrap_or(i64::MAX));
        assert!(first.0 >= 13);
    }
}
