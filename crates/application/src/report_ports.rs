use async_trait::async_trait;
use expensa_core::AppResult;
use expensa_domain::{
    ExpenseItem, ExpenseItemId, ExpenseReport, ItemDetails, ReportId, ReportStatus,
    ResourceAccess, UserId,
};

/// Report header together with its items in insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportDetails {
    /// Report header.
    pub report: ExpenseReport,
    /// Items ordered by creation.
    pub items: Vec<ExpenseItem>,
}

/// Report as seen by reviewers and exports, including the owner email.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportOverview {
    /// Report and items.
    pub details: ReportDetails,
    /// Canonical email of the owner.
    pub owner_email: String,
}

/// Receipt location an item pointed at before a successful replacement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplacedReceipt {
    /// Previous stored path, if the item had a receipt.
    pub previous_path: Option<String>,
}

/// Repository port for reports and their items.
///
/// Every mutation is conditioned on the report status atomically with the
/// write, so a concurrent transition can never be overwritten.
#[async_trait]
pub trait ReportRepository: Send + Sync {
    /// Persists a new report.
    async fn create_report(&self, report: &ExpenseReport) -> AppResult<()>;

    /// Loads owner and status of a report.
    async fn find_report_access(&self, report_id: ReportId) -> AppResult<Option<ResourceAccess>>;

    /// Loads owner and status of the report an item belongs to.
    async fn find_item_access(&self, item_id: ExpenseItemId)
    -> AppResult<Option<ResourceAccess>>;

    /// Loads a report with its items.
    async fn find_report(&self, report_id: ReportId) -> AppResult<Option<ReportDetails>>;

    /// Loads one item.
    async fn find_item(&self, item_id: ExpenseItemId) -> AppResult<Option<ExpenseItem>>;

    /// Lists an owner's reports, newest first.
    async fn list_reports_for_owner(&self, owner_id: UserId) -> AppResult<Vec<ReportDetails>>;

    /// Lists every report that has left `draft`, newest first.
    async fn list_reviewable_reports(&self) -> AppResult<Vec<ReportOverview>>;

    /// Lists every report in creation order.
    async fn list_all_reports(&self) -> AppResult<Vec<ReportOverview>>;

    /// Moves a report from `from` to `to`. Returns `false` when the report is
    /// missing or no longer in `from`.
    async fn transition_status(
        &self,
        report_id: ReportId,
        from: ReportStatus,
        to: ReportStatus,
    ) -> AppResult<bool>;

    /// Deletes a draft report and its items. Returns `false` when the report
    /// is missing or not a draft.
    async fn delete_draft_report(&self, report_id: ReportId) -> AppResult<bool>;

    /// Inserts an item. Returns `false` when the parent is missing or not a draft.
    async fn add_item(&self, item: &ExpenseItem) -> AppResult<bool>;

    /// Replaces item content. Returns `None` when the item is missing or its
    /// report is not a draft.
    async fn update_item(
        &self,
        item_id: ExpenseItemId,
        details: &ItemDetails,
    ) -> AppResult<Option<ExpenseItem>>;

    /// Records the receipt location and returns the one it replaced. Returns
    /// `None` when the item is missing or its report is not a draft.
    async fn set_receipt(
        &self,
        item_id: ExpenseItemId,
        receipt_path: &str,
    ) -> AppResult<Option<ReplacedReceipt>>;
}

/// Receipt bytes with the name they were stored under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptFile {
    /// Stored file name, `<item id>-<upload id>.<extension>`.
    pub file_name: String,
    /// File content.
    pub bytes: Vec<u8>,
}

/// Port for receipt file storage.
#[async_trait]
pub trait ReceiptStore: Send + Sync {
    /// Stores a receipt for an item of the owner's report under a fresh path
    /// and returns it. Existing receipts are never overwritten.
    async fn save(
        &self,
        owner_id: UserId,
        item_id: ExpenseItemId,
        extension: &str,
        bytes: &[u8],
    ) -> AppResult<String>;

    /// Reads a receipt previously returned by [`ReceiptStore::save`].
    async fn load(&self, receipt_path: &str) -> AppResult<ReceiptFile>;

    /// Deletes a stored receipt. Missing files are ignored and other failures
    /// are logged by the store, leaving at worst an orphaned file.
    async fn remove(&self, receipt_path: &str);
}
