use super::*;

impl PostgresReportRepository {
    pub(super) async fn add_item_impl(&self, item: &ExpenseItem) -> AppResult<bool> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to start item insert transaction: {error}"))
        })?;

        if !lock_draft_report(&mut transaction, item.report_id()).await? {
            return Ok(false);
        }

        let amounts = item.amounts();
        sqlx::query(
            r#"
            INSERT INTO expense_items (
                id, report_id, description, expense_date,
                amount_ht, vat_rate, amount_ttc, receipt_path, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(item.id().as_uuid())
        .bind(item.report_id().as_uuid())
        .bind(item.description().as_str())
        .bind(item.expense_date())
        .bind(amounts.amount_ht())
        .bind(amounts.vat_rate())
        .bind(amounts.amount_ttc())
        .bind(item.receipt_path())
        .bind(item.created_at())
        .execute(&mut *transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to add item to report '{}': {error}",
                item.report_id()
            ))
        })?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit item insert transaction: {error}"))
        })?;

        Ok(true)
    }

    pub(super) async fn update_item_impl(
        &self,
        item_id: ExpenseItemId,
        details: &ItemDetails,
    ) -> AppResult<Option<ExpenseItem>> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to start item update transaction: {error}"))
        })?;

        if !lock_draft_parent(&mut transaction, item_id).await? {
            return Ok(None);
        }

        let amounts = details.amounts();
        let row = sqlx::query_as::<_, ItemRow>(
            r#"
            UPDATE expense_items
            SET description = $2,
                expense_date = $3,
                amount_ht = $4,
                vat_rate = $5,
                amount_ttc = $6
            WHERE id = $1
            RETURNING id, report_id, description, expense_date,
                      amount_ht, vat_rate, receipt_path, created_at
            "#,
        )
        .bind(item_id.as_uuid())
        .bind(details.description().as_str())
        .bind(details.expense_date())
        .bind(amounts.amount_ht())
        .bind(amounts.vat_rate())
        .bind(amounts.amount_ttc())
        .fetch_optional(&mut *transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to update expense item '{item_id}': {error}"))
        })?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit item update transaction: {error}"))
        })?;

        row.map(ExpenseItem::try_from).transpose()
    }

    pub(super) async fn set_receipt_impl(
        &self,
        item_id: ExpenseItemId,
        receipt_path: &str,
    ) -> AppResult<Option<ReplacedReceipt>> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to start receipt transaction: {error}"))
        })?;

        if !lock_draft_parent(&mut transaction, item_id).await? {
            return Ok(None);
        }

        let previous_path = sqlx::query_scalar::<_, Option<String>>(
            r#"
            SELECT receipt_path
            FROM expense_items
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(item_id.as_uuid())
        .fetch_optional(&mut *transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to lock expense item '{item_id}' for its receipt: {error}"
            ))
        })?;
        let Some(previous_path) = previous_path else {
            return Ok(None);
        };

        sqlx::query(
            r#"
            UPDATE expense_items
            SET receipt_path = $2
            WHERE id = $1
            "#,
        )
        .bind(item_id.as_uuid())
        .bind(receipt_path)
        .execute(&mut *transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to record receipt of expense item '{item_id}': {error}"
            ))
        })?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit receipt transaction: {error}"))
        })?;

        Ok(Some(ReplacedReceipt { previous_path }))
    }
}

/// Takes a share lock on a draft report. A concurrent status change either
/// waits for the surrounding transaction or, when it commits first, makes
/// this return `false`.
async fn lock_draft_report(
    transaction: &mut Transaction<'_, Postgres>,
    report_id: ReportId,
) -> AppResult<bool> {
    let locked = sqlx::query_scalar::<_, uuid::Uuid>(
        r#"
        SELECT id
        FROM expense_reports
        WHERE id = $1 AND status = 'draft'
        FOR SHARE
        "#,
    )
    .bind(report_id.as_uuid())
    .fetch_optional(&mut **transaction)
    .await
    .map_err(|error| {
        AppError::Internal(format!("failed to lock report '{report_id}': {error}"))
    })?;

    Ok(locked.is_some())
}

async fn lock_draft_parent(
    transaction: &mut Transaction<'_, Postgres>,
    item_id: ExpenseItemId,
) -> AppResult<bool> {
    let locked = sqlx::query_scalar::<_, uuid::Uuid>(
        r#"
        SELECT id
        FROM expense_reports
        WHERE id = (SELECT report_id FROM expense_items WHERE id = $1)
          AND status = 'draft'
        FOR SHARE
        "#,
    )
    .bind(item_id.as_uuid())
    .fetch_optional(&mut **transaction)
    .await
    .map_err(|error| {
        AppError::Internal(format!(
            "failed to lock the report of expense item '{item_id}': {error}"
        ))
    })?;

    Ok(locked.is_some())
}
