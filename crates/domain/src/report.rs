//! Expense report lifecycle.
//!
//! `draft` is the only editable state. Reports leave it through `submit` and
//! end in `approved` or `rejected`, from which nothing moves.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use expensa_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

use crate::{ReportId, UserId};

/// Status of an expense report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    /// Owned and editable by its author.
    Draft,
    /// Waiting for a reviewer decision.
    Submitted,
    /// Accepted by a reviewer. Terminal.
    Approved,
    /// Refused by a reviewer. Terminal.
    Rejected,
}

impl ReportStatus {
    /// Returns a stable storage value for this status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Submitted => "submitted",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Returns whether items, receipts and the report itself may still change.
    #[must_use]
    pub fn is_editable(&self) -> bool {
        matches!(self, Self::Draft)
    }

    /// Returns whether no transition leaves this status.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }

    /// Applies a transition, failing with `InvalidState` when the transition is
    /// not defined from the current status.
    pub fn apply(self, transition: ReportTransition) -> AppResult<Self> {
        if self != transition.source() {
            return Err(AppError::InvalidState(format!(
                "cannot {} a report that is {}",
                transition.as_str(),
                self.as_str()
            )));
        }

        Ok(transition.target())
    }
}

impl FromStr for ReportStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "draft" => Ok(Self::Draft),
            "submitted" => Ok(Self::Submitted),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            _ => Err(AppError::Validation(format!(
                "unknown report status '{value}'"
            ))),
        }
    }
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Status-changing actions on a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportTransition {
    /// Owner hands a draft over for review.
    Submit,
    /// Reviewer accepts a submitted report.
    Approve,
    /// Reviewer refuses a submitted report.
    Reject,
}

impl ReportTransition {
    /// Status the report must be in for the transition to apply.
    #[must_use]
    pub fn source(&self) -> ReportStatus {
        match self {
            Self::Submit => ReportStatus::Draft,
            Self::Approve | Self::Reject => ReportStatus::Submitted,
        }
    }

    /// Status the report ends up in.
    #[must_use]
    pub fn target(&self) -> ReportStatus {
        match self {
            Self::Submit => ReportStatus::Submitted,
            Self::Approve => ReportStatus::Approved,
            Self::Reject => ReportStatus::Rejected,
        }
    }

    /// Returns the verb used in messages and logs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Submit => "submit",
            Self::Approve => "approve",
            Self::Reject => "reject",
        }
    }
}

/// Expense report header.
///
/// The owner is fixed at construction; there is intentionally no way to change it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseReport {
    id: ReportId,
    owner_id: UserId,
    title: NonEmptyString,
    status: ReportStatus,
    created_at: DateTime<Utc>,
}

impl ExpenseReport {
    /// Starts a new draft report for its owner.
    pub fn draft(owner_id: UserId, title: &str, created_at: DateTime<Utc>) -> AppResult<Self> {
        let title = NonEmptyString::new(title)
            .map_err(|_| AppError::Validation("title is required".to_owned()))?;

        Ok(Self {
            id: ReportId::new(),
            owner_id,
            title,
            status: ReportStatus::Draft,
            created_at,
        })
    }

    /// Rebuilds a report from persisted values.
    #[must_use]
    pub fn from_parts(
        id: ReportId,
        owner_id: UserId,
        title: NonEmptyString,
        status: ReportStatus,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            owner_id,
            title,
            status,
            created_at,
        }
    }

    /// Returns the report id.
    #[must_use]
    pub fn id(&self) -> ReportId {
        self.id
    }

    /// Returns the owning user.
    #[must_use]
    pub fn owner_id(&self) -> UserId {
        self.owner_id
    }

    /// Returns the report title.
    #[must_use]
    pub fn title(&self) -> &NonEmptyString {
        &self.title
    }

    /// Returns the current status.
    #[must_use]
    pub fn status(&self) -> ReportStatus {
        self.status
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns a copy carrying the status reached after `transition`.
    pub fn transitioned(&self, transition: ReportTransition) -> AppResult<Self> {
        let status = self.status.apply(transition)?;
        Ok(Self {
            status,
            ..self.clone()
        })
    }
}
