use super::*;

impl PostgresReportRepository {
    pub(super) async fn find_report_access_impl(
        &self,
        report_id: ReportId,
    ) -> AppResult<Option<ResourceAccess>> {
        let row = sqlx::query_as::<_, AccessRow>(
            r#"
            SELECT id AS report_id, owner_id, status
            FROM expense_reports
            WHERE id = $1
            "#,
        )
        .bind(report_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to load access for report '{report_id}': {error}"))
        })?;

        row.map(ResourceAccess::try_from).transpose()
    }

    pub(super) async fn find_item_access_impl(
        &self,
        item_id: ExpenseItemId,
    ) -> AppResult<Option<ResourceAccess>> {
        let row = sqlx::query_as::<_, AccessRow>(
            r#"
            SELECT reports.id AS report_id, reports.owner_id, reports.status
            FROM expense_items AS items
            INNER JOIN expense_reports AS reports ON reports.id = items.report_id
            WHERE items.id = $1
            "#,
        )
        .bind(item_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to load access for item '{item_id}': {error}"))
        })?;

        row.map(ResourceAccess::try_from).transpose()
    }

    pub(super) async fn find_report_impl(
        &self,
        report_id: ReportId,
    ) -> AppResult<Option<ReportDetails>> {
        let row = sqlx::query_as::<_, ReportRow>(&format!("{REPORT_COLUMNS} WHERE reports.id = $1"))
            .bind(report_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to load report '{report_id}': {error}"))
            })?;

        let Some(row) = row else {
            return Ok(None);
        };

        let items = self.load_items(vec![row.id]).await?;
        Ok(attach_items(vec![row], items)?
            .into_iter()
            .next()
            .map(|(details, _)| details))
    }

    pub(super) async fn find_item_impl(
        &self,
        item_id: ExpenseItemId,
    ) -> AppResult<Option<ExpenseItem>> {
        let row = sqlx::query_as::<_, ItemRow>(&format!("{ITEM_COLUMNS} WHERE id = $1"))
            .bind(item_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to load expense item '{item_id}': {error}"))
            })?;

        row.map(ExpenseItem::try_from).transpose()
    }

    pub(super) async fn list_reports_for_owner_impl(
        &self,
        owner_id: UserId,
    ) -> AppResult<Vec<ReportDetails>> {
        let rows = sqlx::query_as::<_, ReportRow>(&format!(
            "{REPORT_COLUMNS} WHERE reports.owner_id = $1 \
             ORDER BY reports.created_at DESC, reports.id DESC"
        ))
        .bind(owner_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list reports of '{owner_id}': {error}"))
        })?;

        let items = self.load_items(rows.iter().map(|row| row.id).collect()).await?;
        Ok(attach_items(rows, items)?
            .into_iter()
            .map(|(details, _)| details)
            .collect())
    }

    /// Lists reports with owner emails. `filter_and_order` is a fixed SQL tail.
    pub(super) async fn list_overviews_impl(
        &self,
        filter_and_order: &'static str,
    ) -> AppResult<Vec<ReportOverview>> {
        let rows = sqlx::query_as::<_, ReportRow>(&format!("{REPORT_COLUMNS} {filter_and_order}"))
            .fetch_all(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to list reports: {error}")))?;

        let items = self.load_items(rows.iter().map(|row| row.id).collect()).await?;
        Ok(attach_items(rows, items)?
            .into_iter()
            .map(|(details, owner_email)| ReportOverview {
                details,
                owner_email,
            })
            .collect())
    }

    async fn load_items(&self, report_ids: Vec<uuid::Uuid>) -> AppResult<Vec<ItemRow>> {
        if report_ids.is_empty() {
            return Ok(Vec::new());
        }

        sqlx::query_as::<_, ItemRow>(&format!(
            "{ITEM_COLUMNS} WHERE report_id = ANY($1) ORDER BY created_at ASC, id ASC"
        ))
        .bind(report_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load expense items: {error}")))
    }
}
