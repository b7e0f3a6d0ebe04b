//! Expense report lifecycle service.
//!
//! Every method authorizes through the gate first. Writes are then issued as
//! status-conditioned repository calls; when one affects nothing the report
//! is re-read to tell a vanished report from one that moved on.

use std::sync::Arc;

use chrono::Utc;
use expensa_core::{AppError, AppResult};
use expensa_domain::{
    ExpenseItem, ExpenseItemId, ExpenseReport, ItemDetails, Operation, Principal, ReportId,
    ReportTransition, ResourceAccess,
};

use crate::{
    AccessTarget, AuthorizationGate, ReceiptFile, ReceiptStore, ReportDetails, ReportOverview,
    ReportRepository,
};

mod items;
mod lifecycle;

/// Largest accepted receipt upload.
pub const MAX_RECEIPT_BYTES: usize = 10 * 1024 * 1024;

/// Raw item fields as submitted by a caller. Validated after authorization.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemInput {
    /// Free-text description.
    pub description: String,
    /// Expense date, `YYYY-MM-DD`.
    pub expense_date: String,
    /// Pre-tax amount.
    pub amount_ht: f64,
    /// Tax rate as a fraction.
    pub vat_rate: f64,
}

impl ItemInput {
    fn validate(&self) -> AppResult<ItemDetails> {
        ItemDetails::new(
            &self.description,
            &self.expense_date,
            self.amount_ht,
            self.vat_rate,
        )
    }
}

/// Uploaded receipt file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptUpload {
    /// Client-side file name, used only for its extension.
    pub file_name: String,
    /// File content.
    pub bytes: Vec<u8>,
}

impl ReceiptUpload {
    /// Returns a safe lowercase extension, or `bin` when none is usable.
    fn extension(&self) -> String {
        std::path::Path::new(&self.file_name)
            .extension()
            .and_then(|extension| extension.to_str())
            .filter(|extension| {
                (1..=8).contains(&extension.len())
                    && extension.chars().all(|character| character.is_ascii_alphanumeric())
            })
            .map(str::to_ascii_lowercase)
            .unwrap_or_else(|| "bin".to_owned())
    }
}

/// Application service for expense reports, items and receipts.
#[derive(Clone)]
pub struct ReportService {
    gate: AuthorizationGate,
    repository: Arc<dyn ReportRepository>,
    receipt_store: Arc<dyn ReceiptStore>,
}

impl ReportService {
    /// Creates a new report service.
    #[must_use]
    pub fn new(
        gate: AuthorizationGate,
        repository: Arc<dyn ReportRepository>,
        receipt_store: Arc<dyn ReceiptStore>,
    ) -> Self {
        Self {
            gate,
            repository,
            receipt_store,
        }
    }

    async fn load_report(&self, report_id: ReportId) -> AppResult<ReportDetails> {
        self.repository
            .find_report(report_id)
            .await?
            .ok_or_else(|| report_not_found(report_id))
    }

    async fn load_item(&self, item_id: ExpenseItemId) -> AppResult<ExpenseItem> {
        self.repository
            .find_item(item_id)
            .await?
            .ok_or_else(|| item_not_found(item_id))
    }

    /// Explains why a conditional write on a report changed nothing.
    async fn report_write_lost(&self, report_id: ReportId, operation: Operation) -> AppError {
        let access = self.repository.find_report_access(report_id).await;
        lost_race(access, operation, || report_not_found(report_id))
    }

    /// Explains why a conditional write on an item changed nothing.
    async fn item_write_lost(&self, item_id: ExpenseItemId, operation: Operation) -> AppError {
        let access = self.repository.find_item_access(item_id).await;
        lost_race(access, operation, || item_not_found(item_id))
    }
}

fn lost_race(
    access: AppResult<Option<ResourceAccess>>,
    operation: Operation,
    missing: impl FnOnce() -> AppError,
) -> AppError {
    match access {
        Err(error) => error,
        Ok(None) => missing(),
        Ok(Some(access)) => AppError::InvalidState(format!(
            "operation '{operation}' lost a race: report is now {}",
            access.status
        )),
    }
}

fn report_not_found(report_id: ReportId) -> AppError {
    AppError::NotFound(format!("report '{report_id}' not found"))
}

fn item_not_found(item_id: ExpenseItemId) -> AppError {
    AppError::NotFound(format!("item '{item_id}' not found"))
}
