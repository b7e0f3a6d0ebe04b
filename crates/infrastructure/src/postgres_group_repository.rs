//! PostgreSQL-backed groups, grants and memberships.

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};

use expensa_application::{GroupRecord, GroupRepository};
use expensa_core::{AppError, AppResult};
use expensa_domain::{GroupId, GroupName, Permission, UserId};

use crate::postgres_errors::{is_foreign_key_violation, unique_or_internal};

/// PostgreSQL implementation of the group repository port.
#[derive(Clone)]
pub struct PostgresGroupRepository {
    pool: PgPool,
}

impl PostgresGroupRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct GroupRow {
    id: uuid::Uuid,
    name: String,
    actions: Vec<String>,
}

impl TryFrom<GroupRow> for GroupRecord {
    type Error = AppError;

    fn try_from(row: GroupRow) -> Result<Self, Self::Error> {
        let mut permissions = row
            .actions
            .iter()
            .map(|action| {
                Permission::from_str(action).map_err(|error| {
                    AppError::Internal(format!(
                        "failed to decode permission '{action}' of group '{}': {error}",
                        row.name
                    ))
                })
            })
            .collect::<AppResult<Vec<_>>>()?;
        permissions.sort();

        Ok(Self {
            id: GroupId::from_uuid(row.id),
            name: row.name,
            permissions,
        })
    }
}

const GROUP_SELECT: &str = r#"
    SELECT groups.id, groups.name,
           COALESCE(
               array_agg(grants.action) FILTER (WHERE grants.action IS NOT NULL),
               ARRAY[]::TEXT[]
           ) AS actions
    FROM groups
    LEFT JOIN group_permissions AS grants ON grants.group_id = groups.id
"#;

async fn find_group(connection: &mut PgConnection, group_id: GroupId) -> AppResult<Option<GroupRecord>> {
    let row = sqlx::query_as::<_, GroupRow>(&format!(
        "{GROUP_SELECT} WHERE groups.id = $1 GROUP BY groups.id, groups.name"
    ))
    .bind(group_id.as_uuid())
    .fetch_optional(&mut *connection)
    .await
    .map_err(|error| AppError::Internal(format!("failed to load group '{group_id}': {error}")))?;

    row.map(GroupRecord::try_from).transpose()
}

mod membership;

#[async_trait]
impl GroupRepository for PostgresGroupRepository {
    async fn list_groups(&self) -> AppResult<Vec<GroupRecord>> {
        let rows = sqlx::query_as::<_, GroupRow>(&format!(
            "{GROUP_SELECT} GROUP BY groups.id, groups.name ORDER BY groups.name"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list groups: {error}")))?;

        rows.into_iter().map(GroupRecord::try_from).collect()
    }

    async fn create_group(&self, name: &GroupName) -> AppResult<GroupRecord> {
        let id = sqlx::query_scalar::<_, uuid::Uuid>(
            r#"
            INSERT INTO groups (id, name)
            VALUES ($1, $2)
            RETURNING id
            "#,
        )
        .bind(GroupId::new().as_uuid())
        .bind(name.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| {
            unique_or_internal(
                error,
                format!("group '{}' already exists", name.as_str()),
                "create group",
            )
        })?;

        Ok(GroupRecord {
            id: GroupId::from_uuid(id),
            name: name.as_str().to_owned(),
            permissions: Vec::new(),
        })
    }

    async fn grant_permissions(
        &self,
        group_id: GroupId,
        permissions: &[Permission],
    ) -> AppResult<GroupRecord> {
        self.grant_permissions_impl(group_id, permissions).await
    }

    async fn add_member(&self, group_id: GroupId, user_id: UserId) -> AppResult<()> {
        self.add_member_impl(group_id, user_id).await
    }

    async fn remove_member(&self, group_id: GroupId, user_id: UserId) -> AppResult<bool> {
        self.remove_member_impl(group_id, user_id).await
    }
}
