//! Process-local implementation of every repository port.
//!
//! One lock guards the whole state, so each port call is atomic the same way
//! a single SQL statement or transaction is.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use expensa_application::{
    ApiTokenRepository, AuthorizationRepository, BootstrapRepository, GroupRecord,
    GroupRepository, NewUser, ReceiptFile, ReceiptStore, ReplacedReceipt, ReportDetails, ReportOverview,
    ReportRepository, SeedOutcome, SeedPlan, UserRecord, UserRepository, UserSummary,
};
use expensa_core::{AppError, AppResult};
use expensa_domain::{
    ExpenseItem, ExpenseItemId, ExpenseReport, GroupId, GroupName, ItemDetails, Permission,
    ReportId, ReportStatus, ResourceAccess, SUPER_ADMIN_GROUP, UserId,
};

mod accounts;
mod reports;


#[derive(Debug, Clone)]
struct StoredGroup {
    id: GroupId,
    name: String,
    permissions: Vec<Permission>,
    members: Vec<UserId>,
}

impl StoredGroup {
    fn record(&self) -> GroupRecord {
        let mut permissions = self.permissions.clone();
        permissions.sort();
        GroupRecord {
            id: self.id,
            name: self.name.clone(),
            permissions,
        }
    }

    fn grant(&mut self, permissions: &[Permission]) {
        for permission in permissions {
            if !self.permissions.contains(permission) {
                self.permissions.push(*permission);
            }
        }
    }
}

#[derive(Debug, Default)]
struct StoreState {
    users: Vec<UserRecord>,
    groups: Vec<StoredGroup>,
    catalog: Vec<Permission>,
    api_tokens: HashMap<String, UserId>,
    reports: Vec<ExpenseReport>,
    items: Vec<ExpenseItem>,
    receipts: HashMap<String, Vec<u8>>,
}

impl StoreState {
    fn report_access(&self, report_id: ReportId) -> Option<ResourceAccess> {
        self.reports
            .iter()
            .find(|report| report.id() == report_id)
            .map(|report| ResourceAccess {
                report_id,
                owner_id: report.owner_id(),
                status: report.status(),
            })
    }

    fn item_access(&self, item_id: ExpenseItemId) -> Option<ResourceAccess> {
        self.items
            .iter()
            .find(|item| item.id() == item_id)
            .and_then(|item| self.report_access(item.report_id()))
    }

    fn item_is_editable(&self, item_id: ExpenseItemId) -> bool {
        self.item_access(item_id)
            .is_some_and(|access| access.status.is_editable())
    }

    fn details(&self, report: &ExpenseReport) -> ReportDetails {
        ReportDetails {
            report: report.clone(),
            items: self
                .items
                .iter()
                .filter(|item| item.report_id() == report.id())
                .cloned()
                .collect(),
        }
    }

    fn overview(&self, report: &ExpenseReport) -> ReportOverview {
        ReportOverview {
            details: self.details(report),
            owner_email: self
                .users
                .iter()
                .find(|user| user.id == report.owner_id())
                .map(|user| user.email.clone())
                .unwrap_or_default(),
        }
    }

    fn group_mut(&mut self, group_id: GroupId) -> AppResult<&mut StoredGroup> {
        self.groups
            .iter_mut()
            .find(|group| group.id == group_id)
            .ok_or_else(|| AppError::NotFound(format!("group '{group_id}' not found")))
    }
}

/// In-memory store used by tests and local experiments.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<StoreState>,
}

impl InMemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}
