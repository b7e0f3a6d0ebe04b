use chrono::{DateTime, NaiveDate, Utc};
use expensa_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

use crate::{ExpenseItemId, ReportId};

/// Date format accepted for expense dates.
const EXPENSE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Pre-tax amount and tax rate of an expense line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ItemAmounts {
    amount_ht: f64,
    vat_rate: f64,
}

impl ItemAmounts {
    /// Validates amounts. `vat_rate` is a fraction, so `0.2` means 20%.
    pub fn new(amount_ht: f64, vat_rate: f64) -> AppResult<Self> {
        if !amount_ht.is_finite() || amount_ht < 0.0 {
            return Err(AppError::Validation(
                "amount_ht must be a non-negative number".to_owned(),
            ));
        }

        if !vat_rate.is_finite() || !(0.0..=1.0).contains(&vat_rate) {
            return Err(AppError::Validation(
                "vat_rate must be between 0 and 1".to_owned(),
            ));
        }

        Ok(Self {
            amount_ht,
            vat_rate,
        })
    }

    /// Returns the pre-tax amount.
    #[must_use]
    pub fn amount_ht(&self) -> f64 {
        self.amount_ht
    }

    /// Returns the tax rate.
    #[must_use]
    pub fn vat_rate(&self) -> f64 {
        self.vat_rate
    }

    /// Returns the tax-inclusive amount rounded to cents.
    #[must_use]
    pub fn amount_ttc(&self) -> f64 {
        (self.amount_ht * (1.0 + self.vat_rate) * 100.0).round() / 100.0
    }
}

/// Caller-supplied content of an expense line.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemDetails {
    description: NonEmptyString,
    expense_date: NaiveDate,
    amounts: ItemAmounts,
}

impl ItemDetails {
    /// Validates raw item input. `expense_date` uses `YYYY-MM-DD`.
    pub fn new(
        description: &str,
        expense_date: &str,
        amount_ht: f64,
        vat_rate: f64,
    ) -> AppResult<Self> {
        let description = NonEmptyString::new(description)
            .map_err(|_| AppError::Validation("description is required".to_owned()))?;
        let expense_date = NaiveDate::parse_from_str(expense_date.trim(), EXPENSE_DATE_FORMAT)
            .map_err(|_| {
                AppError::Validation(format!(
                    "invalid expense date '{expense_date}', expected YYYY-MM-DD"
                ))
            })?;

        Ok(Self {
            description,
            expense_date,
            amounts: ItemAmounts::new(amount_ht, vat_rate)?,
        })
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> &NonEmptyString {
        &self.description
    }

    /// Returns the expense date.
    #[must_use]
    pub fn expense_date(&self) -> NaiveDate {
        self.expense_date
    }

    /// Returns the validated amounts.
    #[must_use]
    pub fn amounts(&self) -> ItemAmounts {
        self.amounts
    }
}

/// One line of an expense report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseItem {
    id: ExpenseItemId,
    report_id: ReportId,
    description: NonEmptyString,
    expense_date: NaiveDate,
    amounts: ItemAmounts,
    receipt_path: Option<String>,
    created_at: DateTime<Utc>,
}

impl ExpenseItem {
    /// Creates a new item without receipt.
    #[must_use]
    pub fn new(report_id: ReportId, details: ItemDetails, created_at: DateTime<Utc>) -> Self {
        Self {
            id: ExpenseItemId::new(),
            report_id,
            description: details.description,
            expense_date: details.expense_date,
            amounts: details.amounts,
            receipt_path: None,
            created_at,
        }
    }

    /// Rebuilds an item from persisted values.
    #[must_use]
    pub fn from_parts(
        id: ExpenseItemId,
        report_id: ReportId,
        details: ItemDetails,
        receipt_path: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            report_id,
            description: details.description,
            expense_date: details.expense_date,
            amounts: details.amounts,
            receipt_path,
            created_at,
        }
    }

    /// Returns a copy with replaced content. Identity and receipt are kept.
    #[must_use]
    pub fn with_details(&self, details: ItemDetails) -> Self {
        Self {
            description: details.description,
            expense_date: details.expense_date,
            amounts: details.amounts,
            ..self.clone()
        }
    }

    /// Returns a copy pointing at a stored receipt.
    #[must_use]
    pub fn with_receipt(&self, receipt_path: impl Into<String>) -> Self {
        Self {
            receipt_path: Some(receipt_path.into()),
            ..self.clone()
        }
    }

    /// Returns the item id.
    #[must_use]
    pub fn id(&self) -> ExpenseItemId {
        self.id
    }

    /// Returns the parent report id.
    #[must_use]
    pub fn report_id(&self) -> ReportId {
        self.report_id
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> &NonEmptyString {
        &self.description
    }

    /// Returns the expense date.
    #[must_use]
    pub fn expense_date(&self) -> NaiveDate {
        self.expense_date
    }

    /// Returns the amounts.
    #[must_use]
    pub fn amounts(&self) -> ItemAmounts {
        self.amounts
    }

    /// Returns the stored receipt reference, if any.
    #[must_use]
    pub fn receipt_path(&self) -> Option<&str> {
        self.receipt_path.as_deref()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::{ExpenseItem, ItemAmounts, ItemDetails};
    use crate::ReportId;

    #[test]
    fn twenty_percent_vat_on_one_hundred() {
        let amounts = ItemAmounts::new(100.0, 0.2);
        assert_eq!(amounts.map(|amounts| amounts.amount_ttc()), Ok(120.0));
    }

    #[test]
    fn tax_inclusive_amount_is_rounded_to_cents() {
        let amounts = ItemAmounts::new(19.99, 0.055);
        assert_eq!(amounts.map(|amounts| amounts.amount_ttc()), Ok(21.09));
    }

    #[test]
    fn negative_or_non_finite_amounts_are_rejected() {
        assert!(ItemAmounts::new(-1.0, 0.2).is_err());
        assert!(ItemAmounts::new(f64::NAN, 0.2).is_err());
        assert!(ItemAmounts::new(10.0, 1.5).is_err());
        assert!(ItemAmounts::new(10.0, -0.1).is_err());
    }

    #[test]
    fn details_require_iso_date() {
        assert!(ItemDetails::new("Taxi", "2024-03-01", 30.0, 0.1).is_ok());
        assert!(ItemDetails::new("Taxi", "01/03/2024", 30.0, 0.1).is_err());
        assert!(ItemDetails::new("  ", "2024-03-01", 30.0, 0.1).is_err());
    }

    #[test]
    fn updating_details_keeps_receipt() {
        let original = ItemDetails::new("Hotel", "2024-03-01", 80.0, 0.1);
        let replacement = ItemDetails::new("Hotel (2 nights)", "2024-03-02", 160.0, 0.1);
        assert!(original.is_ok() && replacement.is_ok());

        if let (Ok(original), Ok(replacement)) = (original, replacement) {
            let item = ExpenseItem::new(ReportId::new(), original, Utc::now())
                .with_receipt("user/receipts/item.pdf");
            let updated = item.with_details(replacement);

            assert_eq!(updated.id(), item.id());
            assert_eq!(updated.receipt_path(), Some("user/receipts/item.pdf"));
            assert_eq!(updated.amounts().amount_ttc(), 176.0);
        }
    }
}
