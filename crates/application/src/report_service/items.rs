use super::*;

impl ReportService {
    /// Adds an item to one of the caller's draft reports.
    pub async fn add_item(
        &self,
        principal: &Principal,
        report_id: ReportId,
        input: &ItemInput,
    ) -> AppResult<ExpenseItem> {
        self.gate
            .authorize(principal, Operation::AddItem, AccessTarget::Report(report_id))
            .await?;

        let item = ExpenseItem::new(report_id, input.validate()?, Utc::now());
        if !self.repository.add_item(&item).await? {
            return Err(self.report_write_lost(report_id, Operation::AddItem).await);
        }

        Ok(item)
    }

    /// Replaces the content of an item on one of the caller's draft reports.
    pub async fn update_item(
        &self,
        principal: &Principal,
        item_id: ExpenseItemId,
        input: &ItemInput,
    ) -> AppResult<ExpenseItem> {
        self.gate
            .authorize(principal, Operation::UpdateItem, AccessTarget::Item(item_id))
            .await?;

        let details = input.validate()?;
        match self.repository.update_item(item_id, &details).await? {
            Some(item) => Ok(item),
            None => Err(self.item_write_lost(item_id, Operation::UpdateItem).await),
        }
    }

    /// Stores a receipt for an item on one of the caller's draft reports,
    /// replacing any previous one.
    ///
    /// The file is written under a fresh path and only becomes the item's
    /// receipt once the draft-conditioned write succeeds; otherwise it is
    /// removed again and the stored receipt stays untouched.
    pub async fn upload_receipt(
        &self,
        principal: &Principal,
        item_id: ExpenseItemId,
        upload: &ReceiptUpload,
    ) -> AppResult<ExpenseItem> {
        let access = self
            .gate
            .authorize(principal, Operation::UploadReceipt, AccessTarget::Item(item_id))
            .await?;
        let owner_id = access
            .resource
            .map(|resource| resource.owner_id)
            .ok_or_else(|| item_not_found(item_id))?;

        if upload.bytes.is_empty() {
            return Err(AppError::Validation("receipt file is empty".to_owned()));
        }
        if upload.bytes.len() > MAX_RECEIPT_BYTES {
            return Err(AppError::Validation(format!(
                "receipt file must not exceed {MAX_RECEIPT_BYTES} bytes"
            )));
        }

        let receipt_path = self
            .receipt_store
            .save(owner_id, item_id, &upload.extension(), &upload.bytes)
            .await?;

        let replaced = match self.repository.set_receipt(item_id, &receipt_path).await {
            Ok(Some(replaced)) => replaced,
            Ok(None) => {
                self.receipt_store.remove(&receipt_path).await;
                return Err(self
                    .item_write_lost(item_id, Operation::UploadReceipt)
                    .await);
            }
            Err(error) => {
                self.receipt_store.remove(&receipt_path).await;
                return Err(error);
            }
        };
        if let Some(previous_path) = replaced.previous_path {
            self.receipt_store.remove(&previous_path).await;
        }

        self.load_item(item_id).await
    }

    /// Returns the receipt of an item. Owners and holders of `reports:read:all` only.
    pub async fn read_receipt(
        &self,
        principal: &Principal,
        item_id: ExpenseItemId,
    ) -> AppResult<ReceiptFile> {
        self.gate
            .authorize(principal, Operation::ReadReceipt, AccessTarget::Item(item_id))
            .await?;

        let item = self.load_item(item_id).await?;
        let Some(receipt_path) = item.receipt_path() else {
            return Err(AppError::NotFound(format!(
                "item '{item_id}' has no receipt"
            )));
        };

        self.receipt_store.load(receipt_path).await
    }
}
