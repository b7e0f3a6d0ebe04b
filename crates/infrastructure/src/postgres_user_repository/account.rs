use super::*;

impl PostgresUserRepository {
    pub(super) async fn create_user_impl(&self, user: NewUser) -> AppResult<UserSummary> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to start user create transaction: {error}"))
        })?;

        let row = sqlx::query_as::<_, UserSummaryRow>(
            r#"
            INSERT INTO users (id, email, password_hash)
            VALUES ($1, LOWER($2), $3)
            RETURNING id, email, created_at
            "#,
        )
        .bind(UserId::new().as_uuid())
        .bind(user.email.as_str())
        .bind(user.password_hash.as_str())
        .fetch_one(&mut *transaction)
        .await
        .map_err(|error| email_conflict_or_internal(error, "create user"))?;

        for group_id in &user.group_ids {
            sqlx::query(
                r#"
                INSERT INTO user_groups (user_id, group_id)
                VALUES ($1, $2)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(row.id)
            .bind(group_id.as_uuid())
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                crate::postgres_errors::foreign_key_or_internal(
                    error,
                    format!("unknown group '{group_id}'"),
                    "assign user to group",
                )
            })?;
        }

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit user create transaction: {error}"))
        })?;

        Ok(UserSummary::from(row))
    }
}
