use super::*;

fn with_status(report: &ExpenseReport, status: ReportStatus) -> ExpenseReport {
    ExpenseReport::from_parts(
        report.id(),
        report.owner_id(),
        report.title().clone(),
        status,
        report.created_at(),
    )
}

#[async_trait]
impl ReportRepository for InMemoryStore {
    async fn create_report(&self, report: &ExpenseReport) -> AppResult<()> {
        let mut state = self.state.write().await;
        if state.reports.iter().any(|stored| stored.id() == report.id()) {
            return Err(AppError::Conflict(format!(
                "report '{}' already exists",
                report.id()
            )));
        }

        state.reports.push(report.clone());
        Ok(())
    }

    async fn find_report_access(&self, report_id: ReportId) -> AppResult<Option<ResourceAccess>> {
        Ok(self.state.read().await.report_access(report_id))
    }

    async fn find_item_access(
        &self,
        item_id: ExpenseItemId,
    ) -> AppResult<Option<ResourceAccess>> {
        Ok(self.state.read().await.item_access(item_id))
    }

    async fn find_report(&self, report_id: ReportId) -> AppResult<Option<ReportDetails>> {
        let state = self.state.read().await;
        Ok(state
            .reports
            .iter()
            .find(|report| report.id() == report_id)
            .map(|report| state.details(report)))
    }

    async fn find_item(&self, item_id: ExpenseItemId) -> AppResult<Option<ExpenseItem>> {
        Ok(self
            .state
            .read()
            .await
            .items
            .iter()
            .find(|item| item.id() == item_id)
            .cloned())
    }

    async fn list_reports_for_owner(&self, owner_id: UserId) -> AppResult<Vec<ReportDetails>> {
        let state = self.state.read().await;
        Ok(state
            .reports
            .iter()
            .rev()
            .filter(|report| report.owner_id() == owner_id)
            .map(|report| state.details(report))
            .collect())
    }

    async fn list_reviewable_reports(&self) -> AppResult<Vec<ReportOverview>> {
        let state = self.state.read().await;
        Ok(state
            .reports
            .iter()
            .rev()
            .filter(|report| report.status() != ReportStatus::Draft)
            .map(|report| state.overview(report))
            .collect())
    }

    async fn list_all_reports(&self) -> AppResult<Vec<ReportOverview>> {
        let state = self.state.read().await;
        Ok(state
            .reports
            .iter()
            .map(|report| state.overview(report))
            .collect())
    }

    async fn transition_status(
        &self,
        report_id: ReportId,
        from: ReportStatus,
        to: ReportStatus,
    ) -> AppResult<bool> {
        let mut state = self.state.write().await;
        let Some(report) = state
            .reports
            .iter_mut()
            .find(|report| report.id() == report_id && report.status() == from)
        else {
            return Ok(false);
        };

        *report = with_status(report, to);
        Ok(true)
    }

    async fn delete_draft_report(&self, report_id: ReportId) -> AppResult<bool> {
        let mut state = self.state.write().await;
        let before = state.reports.len();
        state
            .reports
            .retain(|report| report.id() != report_id || report.status() != ReportStatus::Draft);

        let deleted = state.reports.len() != before;
        if deleted {
            state.items.retain(|item| item.report_id() != report_id);
        }
        Ok(deleted)
    }

    async fn add_item(&self, item: &ExpenseItem) -> AppResult<bool> {
        let mut state = self.state.write().await;
        let is_draft = state
            .report_access(item.report_id())
            .is_some_and(|access| access.status.is_editable());
        if is_draft {
            state.items.push(item.clone());
        }
        Ok(is_draft)
    }

    async fn update_item(
        &self,
        item_id: ExpenseItemId,
        details: &ItemDetails,
    ) -> AppResult<Option<ExpenseItem>> {
        let mut state = self.state.write().await;
        if !state.item_is_editable(item_id) {
            return Ok(None);
        }

        Ok(state
            .items
            .iter_mut()
            .find(|item| item.id() == item_id)
            .map(|item| {
                *item = item.with_details(details.clone());
                item.clone()
            }))
    }

    async fn set_receipt(
        &self,
        item_id: ExpenseItemId,
        receipt_path: &str,
    ) -> AppResult<Option<ReplacedReceipt>> {
        let mut state = self.state.write().await;
        if !state.item_is_editable(item_id) {
            return Ok(None);
        }

        Ok(state
            .items
            .iter_mut()
            .find(|item| item.id() == item_id)
            .map(|item| {
                let previous_path = item.receipt_path().map(ToOwned::to_owned);
                *item = item.with_receipt(receipt_path);
                ReplacedReceipt { previous_path }
            }))
    }
}

#[async_trait]
impl ReceiptStore for InMemoryStore {
    async fn save(
        &self,
        owner_id: UserId,
        item_id: ExpenseItemId,
        extension: &str,
        bytes: &[u8],
    ) -> AppResult<String> {
        let upload_id = uuid::Uuid::new_v4().simple();
        let receipt_path = format!("{owner_id}/receipts/{item_id}-{upload_id}.{extension}");
        self.state
            .write()
            .await
            .receipts
            .insert(receipt_path.clone(), bytes.to_vec());
        Ok(receipt_path)
    }

    async fn load(&self, receipt_path: &str) -> AppResult<ReceiptFile> {
        let bytes = self
            .state
            .read()
            .await
            .receipts
            .get(receipt_path)
            .cloned()
            .ok_or_else(|| AppError::NotFound("receipt file not found".to_owned()))?;

        let file_name = receipt_path
            .rsplit_once('/')
            .map_or(receipt_path, |(_, name)| name)
            .to_owned();
        Ok(ReceiptFile { file_name, bytes })
    }

    async fn remove(&self, receipt_path: &str) {
        self.state.write().await.receipts.remove(receipt_path);
    }
}
