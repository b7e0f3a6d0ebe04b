//! PostgreSQL-backed expense reports and items.
//!
//! Status transitions carry the expected status in their `WHERE` clause.
//! Item writes first take a share lock on the draft parent in the same
//! transaction, so a submit cannot slip in between check and write. A write
//! that matches no row tells the caller the report moved on or disappeared.

use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgPool, Postgres, Transaction};

use expensa_application::{ReplacedReceipt, ReportDetails, ReportOverview, ReportRepository};
use expensa_core::{AppError, AppResult, NonEmptyString};
use expensa_domain::{
    ExpenseItem, ExpenseItemId, ExpenseReport, ItemDetails, ReportId, ReportStatus,
    ResourceAccess, UserId,
};

mod items;
mod reads;

#[cfg(test)]
mod tests;

/// PostgreSQL implementation of the report repository port.
#[derive(Clone)]
pub struct PostgresReportRepository {
    pool: PgPool,
}

impl PostgresReportRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ReportRow {
    id: uuid::Uuid,
    owner_id: uuid::Uuid,
    owner_email: String,
    title: String,
    status: String,
    created_at: DateTime<Utc>,
}

impl ReportRow {
    fn into_report(self) -> AppResult<(ExpenseReport, String)> {
        let title = NonEmptyString::new(self.title).map_err(|error| {
            AppError::Internal(format!("failed to decode title of report '{}': {error}", self.id))
        })?;
        let status = decode_status(self.id, &self.status)?;

        Ok((
            ExpenseReport::from_parts(
                ReportId::from_uuid(self.id),
                UserId::from_uuid(self.owner_id),
                title,
                status,
                self.created_at,
            ),
            self.owner_email,
        ))
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AccessRow {
    report_id: uuid::Uuid,
    owner_id: uuid::Uuid,
    status: String,
}

impl TryFrom<AccessRow> for ResourceAccess {
    type Error = AppError;

    fn try_from(row: AccessRow) -> Result<Self, Self::Error> {
        Ok(Self {
            report_id: ReportId::from_uuid(row.report_id),
            owner_id: UserId::from_uuid(row.owner_id),
            status: decode_status(row.report_id, &row.status)?,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ItemRow {
    id: uuid::Uuid,
    report_id: uuid::Uuid,
    description: String,
    expense_date: NaiveDate,
    amount_ht: f64,
    vat_rate: f64,
    receipt_path: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<ItemRow> for ExpenseItem {
    type Error = AppError;

    fn try_from(row: ItemRow) -> Result<Self, Self::Error> {
        let details = ItemDetails::new(
            &row.description,
            &row.expense_date.to_string(),
            row.amount_ht,
            row.vat_rate,
        )
        .map_err(|error| {
            AppError::Internal(format!("failed to decode expense item '{}': {error}", row.id))
        })?;

        Ok(Self::from_parts(
            ExpenseItemId::from_uuid(row.id),
            ReportId::from_uuid(row.report_id),
            details,
            row.receipt_path,
            row.created_at,
        ))
    }
}

fn decode_status(report_id: uuid::Uuid, status: &str) -> AppResult<ReportStatus> {
    ReportStatus::from_str(status).map_err(|error| {
        AppError::Internal(format!(
            "failed to decode status of report '{report_id}': {error}"
        ))
    })
}

/// Pairs each report with its items, keeping report order.
fn attach_items(
    reports: Vec<ReportRow>,
    items: Vec<ItemRow>,
) -> AppResult<Vec<(ReportDetails, String)>> {
    let mut items_by_report: HashMap<uuid::Uuid, Vec<ExpenseItem>> = HashMap::new();
    for row in items {
        let report_id = row.report_id;
        items_by_report
            .entry(report_id)
            .or_default()
            .push(ExpenseItem::try_from(row)?);
    }

    reports
        .into_iter()
        .map(|row| {
            let items = items_by_report.remove(&row.id).unwrap_or_default();
            let (report, owner_email) = row.into_report()?;
            Ok((ReportDetails { report, items }, owner_email))
        })
        .collect()
}

const REPORT_COLUMNS: &str = r#"
    SELECT reports.id, reports.owner_id, users.email AS owner_email,
           reports.title, reports.status, reports.created_at
    FROM expense_reports AS reports
    INNER JOIN users ON users.id = reports.owner_id
"#;

const ITEM_COLUMNS: &str = r#"
    SELECT id, report_id, description, expense_date, amount_ht, vat_rate,
           receipt_path, created_at
    FROM expense_items
"#;

#[async_trait]
impl ReportRepository for PostgresReportRepository {
    async fn create_report(&self, report: &ExpenseReport) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO expense_reports (id, owner_id, title, status, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(report.id().as_uuid())
        .bind(report.owner_id().as_uuid())
        .bind(report.title().as_str())
        .bind(report.status().as_str())
        .bind(report.created_at())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to create report: {error}")))?;

        Ok(())
    }

    async fn find_report_access(&self, report_id: ReportId) -> AppResult<Option<ResourceAccess>> {
        self.find_report_access_impl(report_id).await
    }

    async fn find_item_access(
        &self,
        item_id: ExpenseItemId,
    ) -> AppResult<Option<ResourceAccess>> {
        self.find_item_access_impl(item_id).await
    }

    async fn find_report(&self, report_id: ReportId) -> AppResult<Option<ReportDetails>> {
        self.find_report_impl(report_id).await
    }

    async fn find_item(&self, item_id: ExpenseItemId) -> AppResult<Option<ExpenseItem>> {
        self.find_item_impl(item_id).await
    }

    async fn list_reports_for_owner(&self, owner_id: UserId) -> AppResult<Vec<ReportDetails>> {
        self.list_reports_for_owner_impl(owner_id).await
    }

    async fn list_reviewable_reports(&self) -> AppResult<Vec<ReportOverview>> {
        self.list_overviews_impl(
            "WHERE reports.status <> 'draft' ORDER BY reports.created_at DESC, reports.id DESC",
        )
        .await
    }

    async fn list_all_reports(&self) -> AppResult<Vec<ReportOverview>> {
        self.list_overviews_impl("ORDER BY reports.created_at ASC, reports.id ASC")
            .await
    }

    async fn transition_status(
        &self,
        report_id: ReportId,
        from: ReportStatus,
        to: ReportStatus,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE expense_reports
            SET status = $3
            WHERE id = $1 AND status = $2
            "#,
        )
        .bind(report_id.as_uuid())
        .bind(from.as_str())
        .bind(to.as_str())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to move report '{report_id}' from {from} to {to}: {error}"
            ))
        })?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_draft_report(&self, report_id: ReportId) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM expense_reports
            WHERE id = $1 AND status = 'draft'
            "#,
        )
        .bind(report_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to delete report '{report_id}': {error}"))
        })?;

        Ok(result.rows_affected() > 0)
    }

    async fn add_item(&self, item: &ExpenseItem) -> AppResult<bool> {
        self.add_item_impl(item).await
    }

    async fn update_item(
        &self,
        item_id: ExpenseItemId,
        details: &ItemDetails,
    ) -> AppResult<Option<ExpenseItem>> {
        self.update_item_impl(item_id, details).await
    }

    async fn set_receipt(
        &self,
        item_id: ExpenseItemId,
        receipt_path: &str,
    ) -> AppResult<Option<ReplacedReceipt>> {
        self.set_receipt_impl(item_id, receipt_path).await
    }
}
