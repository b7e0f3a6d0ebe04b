use super::*;

impl PostgresGroupRepository {
    pub(super) async fn grant_permissions_impl(
        &self,
        group_id: GroupId,
        permissions: &[Permission],
    ) -> AppResult<GroupRecord> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to start permission grant transaction: {error}"))
        })?;

        for permission in permissions {
            sqlx::query(
                r#"
                INSERT INTO group_permissions (group_id, action)
                VALUES ($1, $2)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(group_id.as_uuid())
            .bind(permission.as_str())
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                if is_foreign_key_violation(&error) {
                    return AppError::NotFound(format!("group '{group_id}' not found"));
                }
                AppError::Internal(format!(
                    "failed to grant '{permission}' to group '{group_id}': {error}"
                ))
            })?;
        }

        let group = find_group(&mut *transaction, group_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("group '{group_id}' not found")))?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit permission grant transaction: {error}"))
        })?;

        Ok(group)
    }

    pub(super) async fn add_member_impl(&self, group_id: GroupId, user_id: UserId) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO user_groups (user_id, group_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(group_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            if is_foreign_key_violation(&error) {
                return AppError::NotFound(format!(
                    "group '{group_id}' or user '{user_id}' not found"
                ));
            }
            AppError::Internal(format!("failed to add group member: {error}"))
        })?;

        Ok(())
    }

    pub(super) async fn remove_member_impl(
        &self,
        group_id: GroupId,
        user_id: UserId,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM user_groups
            WHERE user_id = $1 AND group_id = $2
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(group_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to remove group member: {error}")))?;

        Ok(result.rows_affected() > 0)
    }
}
