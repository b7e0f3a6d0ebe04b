use chrono::{DateTime, NaiveDate, Utc};
use expensa_application::{ItemInput, ReportDetails, ReportOverview};
use expensa_domain::{ExpenseItem, ExpenseReport};
use serde::{Deserialize, Serialize};

/// Incoming payload for report creation.
#[derive(Debug, Deserialize)]
pub struct CreateReportRequest {
    pub title: String,
}

/// Incoming payload for item creation and replacement.
#[derive(Debug, Deserialize)]
pub struct ItemRequest {
    pub description: String,
    pub expense_date: String,
    pub amount_ht: f64,
    pub vat_rate: f64,
}

impl From<ItemRequest> for ItemInput {
    fn from(value: ItemRequest) -> Self {
        Self {
            description: value.description,
            expense_date: value.expense_date,
            amount_ht: value.amount_ht,
            vat_rate: value.vat_rate,
        }
    }
}

/// API representation of an expense item.
#[derive(Debug, Serialize)]
pub struct ItemResponse {
    pub id: String,
    pub report_id: String,
    pub description: String,
    pub expense_date: NaiveDate,
    pub amount_ht: f64,
    pub vat_rate: f64,
    pub amount_ttc: f64,
    pub has_receipt: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&ExpenseItem> for ItemResponse {
    fn from(value: &ExpenseItem) -> Self {
        let amounts = value.amounts();
        Self {
            id: value.id().to_string(),
            report_id: value.report_id().to_string(),
            description: value.description().as_str().to_owned(),
            expense_date: value.expense_date(),
            amount_ht: amounts.amount_ht(),
            vat_rate: amounts.vat_rate(),
            amount_ttc: amounts.amount_ttc(),
            has_receipt: value.receipt_path().is_some(),
            created_at: value.created_at(),
        }
    }
}

/// API representation of an expense report.
#[derive(Debug, Serialize)]
pub struct ReportResponse {
    pub id: String,
    pub owner_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_email: Option<String>,
    pub title: String,
    pub status: &'static str,
    pub created_at: DateTime<Utc>,
    pub total_ttc: f64,
    pub items: Vec<ItemResponse>,
}

impl ReportResponse {
    fn build(report: &ExpenseReport, items: &[ExpenseItem], owner_email: Option<String>) -> Self {
        let items: Vec<ItemResponse> = items.iter().map(ItemResponse::from).collect();
        let total_ttc = (items.iter().map(|item| item.amount_ttc).sum::<f64>() * 100.0).round() / 100.0;

        Self {
            id: report.id().to_string(),
            owner_id: report.owner_id().to_string(),
            owner_email,
            title: report.title().as_str().to_owned(),
            status: report.status().as_str(),
            created_at: report.created_at(),
            total_ttc,
            items,
        }
    }

    /// Report header without items, as returned by status transitions.
    pub fn header(report: &ExpenseReport) -> Self {
        Self::build(report, &[], None)
    }
}

impl From<ReportDetails> for ReportResponse {
    fn from(value: ReportDetails) -> Self {
        Self::build(&value.report, &value.items, None)
    }
}

impl From<ReportOverview> for ReportResponse {
    fn from(value: ReportOverview) -> Self {
        Self::build(
            &value.details.report,
            &value.details.items,
            Some(value.owner_email),
        )
    }
}

/// Full export of every report.
#[derive(Debug, Serialize)]
pub struct ExportResponse {
    pub generated_at: DateTime<Utc>,
    pub reports: Vec<ReportResponse>,
}
