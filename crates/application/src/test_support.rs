//! Port fakes shared by the service tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use expensa_core::{AppError, AppResult};
use expensa_domain::{
    ExpenseItem, ExpenseItemId, ExpenseReport, GroupId, GroupName, ItemDetails, Permission,
    ReportId, ReportStatus, ResourceAccess, SUPER_ADMIN_GROUP, UserId,
};
use tokio::sync::Mutex;

use crate::{
    ApiTokenRepository, AuthorizationGate, AuthorizationRepository, AuthorizationService,
    BootstrapRepository, GroupRecord, GroupRepository, IssuedToken, NewUser, PasswordHasher,
    ReceiptFile, ReceiptStore, ReplacedReceipt, ReportDetails, ReportOverview, ReportRepository, SeedOutcome,
    SeedPlan, TokenService, UserRecord, UserRepository, UserSummary,
};

/// Hasher that prefixes the password and counts hash calls.
#[derive(Default)]
pub(crate) struct FakePasswordHasher {
    pub(crate) hash_calls: AtomicUsize,
}

impl PasswordHasher for FakePasswordHasher {
    fn hash_password(&self, password: &str) -> AppResult<String> {
        self.hash_calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("hashed:{password}"))
    }

    fn verify_password(&self, password: &str, hash: &str) -> AppResult<bool> {
        Ok(hash == format!("hashed:{password}"))
    }
}

/// Token service whose tokens are `token:<user id>`.
pub(crate) struct FakeTokenService;

impl TokenService for FakeTokenService {
    fn issue(&self, user_id: UserId) -> AppResult<IssuedToken> {
        Ok(IssuedToken {
            token: format!("token:{user_id}"),
            expires_at: Utc::now() + Duration::hours(24),
        })
    }

    fn verify(&self, token: &str) -> AppResult<UserId> {
        token
            .strip_prefix("token:")
            .and_then(|value| value.parse().ok())
            .ok_or_else(|| AppError::Unauthenticated("invalid token".to_owned()))
    }
}

struct StoredGroup {
    name: String,
    permissions: Vec<Permission>,
    members: Vec<UserId>,
}

#[derive(Default)]
struct FakeState {
    users: Vec<UserRecord>,
    groups: BTreeMap<GroupId, StoredGroup>,
    api_tokens: HashMap<String, UserId>,
    reports: Vec<ExpenseReport>,
    items: Vec<ExpenseItem>,
}

impl FakeState {
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

    fn group_record(&self, group_id: GroupId, group: &StoredGroup) -> GroupRecord {
        GroupRecord {
            id: group_id,
            name: group.name.clone(),
            permissions: group.permissions.clone(),
        }
    }
}

/// In-memory implementation of every repository port.
#[derive(Default)]
pub(crate) struct FakeStore {
    state: Mutex<FakeState>,
}

impl FakeStore {
    /// Inserts a user holding exactly the given permissions through one group.
    pub(crate) async fn user_with(&self, email: &str, permissions: &[Permission]) -> UserId {
        let user_id = UserId::new();
        let mut state = self.state.lock().await;
        state.users.push(UserRecord {
            id: user_id,
            email: email.to_owned(),
            password_hash: "hashed:correct horse battery".to_owned(),
            created_at: Utc::now(),
        });
        state.groups.insert(
            GroupId::new(),
            StoredGroup {
                name: format!("group-of-{email}"),
                permissions: permissions.to_vec(),
                members: vec![user_id],
            },
        );
        user_id
    }

    /// Drops every group membership of a user.
    pub(crate) async fn revoke_all(&self, user_id: UserId) {
        let mut state = self.state.lock().await;
        for group in state.groups.values_mut() {
            group.members.retain(|member| *member != user_id);
        }
    }

    /// Forces a report status, as a concurrent request would.
    pub(crate) async fn force_status(&self, report_id: ReportId, status: ReportStatus) {
        let mut state = self.state.lock().await;
        for report in &mut state.reports {
            if report.id() == report_id {
                *report = ExpenseReport::from_parts(
                    report.id(),
                    report.owner_id(),
                    report.title().clone(),
                    status,
                    report.created_at(),
                );
            }
        }
    }

    /// Returns the number of stored users and groups.
    pub(crate) async fn counts(&self) -> (usize, usize) {
        let state = self.state.lock().await;
        (state.users.len(), state.groups.len())
    }
}

#[async_trait]
impl UserRepository for FakeStore {
    async fn find_by_email(&self, email: &str) -> AppResult<Option<UserRecord>> {
        Ok(self
            .state
            .lock()
            .await
            .users
            .iter()
            .find(|user| user.email == email)
            .cloned())
    }

    async fn find_by_id(&self, user_id: UserId) -> AppResult<Option<UserSummary>> {
        Ok(self
            .state
            .lock()
            .await
            .users
            .iter()
            .find(|user| user.id == user_id)
            .map(UserRecord::summary))
    }

    async fn list_users(&self) -> AppResult<Vec<UserSummary>> {
        Ok(self
            .state
            .lock()
            .await
            .users
            .iter()
            .map(UserRecord::summary)
            .collect())
    }

    async fn create_user(&self, user: NewUser) -> AppResult<UserSummary> {
        let mut state = self.state.lock().await;
        if state
            .users
            .iter()
            .any(|existing| existing.email == user.email.as_str())
        {
            return Err(AppError::Conflict("email already exists".to_owned()));
        }
        if let Some(missing) = user
            .group_ids
            .iter()
            .find(|group_id| !state.groups.contains_key(group_id))
        {
            return Err(AppError::Validation(format!("unknown group '{missing}'")));
        }

        let record = UserRecord {
            id: UserId::new(),
            email: user.email.as_str().to_owned(),
            password_hash: user.password_hash,
            created_at: Utc::now(),
        };
        for group_id in &user.group_ids {
            if let Some(group) = state.groups.get_mut(group_id) {
                group.members.push(record.id);
            }
        }
        let summary = record.summary();
        state.users.push(record);
        Ok(summary)
    }
}

#[async_trait]
impl AuthorizationRepository for FakeStore {
    async fn list_permissions_for_user(&self, user_id: UserId) -> AppResult<Vec<Permission>> {
        Ok(self
            .state
            .lock()
            .await
            .groups
            .values()
            .filter(|group| group.members.contains(&user_id))
            .flat_map(|group| group.permissions.iter().copied())
            .collect())
    }
}

#[async_trait]
impl GroupRepository for FakeStore {
    async fn list_groups(&self) -> AppResult<Vec<GroupRecord>> {
        let state = self.state.lock().await;
        Ok(state
            .groups
            .iter()
            .map(|(group_id, group)| state.group_record(*group_id, group))
            .collect())
    }

    async fn create_group(&self, name: &GroupName) -> AppResult<GroupRecord> {
        let mut state = self.state.lock().await;
        if state
            .groups
            .values()
            .any(|group| group.name == name.as_str())
        {
            return Err(AppError::Conflict("group already exists".to_owned()));
        }
        let group_id = GroupId::new();
        state.groups.insert(
            group_id,
            StoredGroup {
                name: name.as_str().to_owned(),
                permissions: Vec::new(),
                members: Vec::new(),
            },
        );
        Ok(GroupRecord {
            id: group_id,
            name: name.as_str().to_owned(),
            permissions: Vec::new(),
        })
    }

    async fn grant_permissions(
        &self,
        group_id: GroupId,
        permissions: &[Permission],
    ) -> AppResult<GroupRecord> {
        let mut state = self.state.lock().await;
        let group = state
            .groups
            .get_mut(&group_id)
            .ok_or_else(|| AppError::NotFound("group not found".to_owned()))?;
        for permission in permissions {
            if !group.permissions.contains(permission) {
                group.permissions.push(*permission);
            }
        }
        Ok(GroupRecord {
            id: group_id,
            name: group.name.clone(),
            permissions: group.permissions.clone(),
        })
    }

    async fn add_member(&self, group_id: GroupId, user_id: UserId) -> AppResult<()> {
        let mut state = self.state.lock().await;
        if !state.users.iter().any(|user| user.id == user_id) {
            return Err(AppError::NotFound("user not found".to_owned()));
        }
        let group = state
            .groups
            .get_mut(&group_id)
            .ok_or_else(|| AppError::NotFound("group not found".to_owned()))?;
        if !group.members.contains(&user_id) {
            group.members.push(user_id);
        }
        Ok(())
    }

    async fn remove_member(&self, group_id: GroupId, user_id: UserId) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        let Some(group) = state.groups.get_mut(&group_id) else {
            return Ok(false);
        };
        let before = group.members.len();
        group.members.retain(|member| *member != user_id);
        Ok(group.members.len() != before)
    }
}

#[async_trait]
impl ApiTokenRepository for FakeStore {
    async fn store_token_hash(&self, user_id: UserId, token_hash: &str) -> AppResult<()> {
        self.state
            .lock()
            .await
            .api_tokens
            .insert(token_hash.to_owned(), user_id);
        Ok(())
    }

    async fn find_user_by_token_hash(&self, token_hash: &str) -> AppResult<Option<UserId>> {
        Ok(self.state.lock().await.api_tokens.get(token_hash).copied())
    }
}

#[async_trait]
impl BootstrapRepository for FakeStore {
    async fn has_users(&self) -> AppResult<bool> {
        Ok(!self.state.lock().await.users.is_empty())
    }

    async fn seed(&self, plan: &SeedPlan) -> AppResult<SeedOutcome> {
        let mut state = self.state.lock().await;
        for default_group in plan.groups {
            let existing = state
                .groups
                .values_mut()
                .find(|group| group.name == default_group.name);
            match existing {
                Some(group) => {
                    for permission in default_group.permissions {
                        if !group.permissions.contains(permission) {
                            group.permissions.push(*permission);
                        }
                    }
                }
                None => {
                    state.groups.insert(
                        GroupId::new(),
                        StoredGroup {
                            name: default_group.name.to_owned(),
                            permissions: default_group.permissions.to_vec(),
                            members: Vec::new(),
                        },
                    );
                }
            }
        }

        let mut outcome = SeedOutcome::default();
        if let Some(administrator) = &plan.administrator
            && state.users.is_empty()
        {
            let user_id = UserId::new();
            state.users.push(UserRecord {
                id: user_id,
                email: administrator.email.as_str().to_owned(),
                password_hash: administrator.password_hash.clone(),
                created_at: Utc::now(),
            });
            if let Some(group) = state
                .groups
                .values_mut()
                .find(|group| group.name == SUPER_ADMIN_GROUP)
            {
                group.members.push(user_id);
            }
            outcome.administrator_created = true;
        }

        Ok(outcome)
    }
}

#[async_trait]
impl ReportRepository for FakeStore {
    async fn create_report(&self, report: &ExpenseReport) -> AppResult<()> {
        self.state.lock().await.reports.push(report.clone());
        Ok(())
    }

    async fn find_report_access(&self, report_id: ReportId) -> AppResult<Option<ResourceAccess>> {
        Ok(self.state.lock().await.report_access(report_id))
    }

    async fn find_item_access(
        &self,
        item_id: ExpenseItemId,
    ) -> AppResult<Option<ResourceAccess>> {
        Ok(self.state.lock().await.item_access(item_id))
    }

    async fn find_report(&self, report_id: ReportId) -> AppResult<Option<ReportDetails>> {
        let state = self.state.lock().await;
        Ok(state
            .reports
            .iter()
            .find(|report| report.id() == report_id)
            .map(|report| state.details(report)))
    }

    async fn find_item(&self, item_id: ExpenseItemId) -> AppResult<Option<ExpenseItem>> {
        Ok(self
            .state
            .lock()
            .await
            .items
            .iter()
            .find(|item| item.id() == item_id)
            .cloned())
    }

    async fn list_reports_for_owner(&self, owner_id: UserId) -> AppResult<Vec<ReportDetails>> {
        let state = self.state.lock().await;
        Ok(state
            .reports
            .iter()
            .rev()
            .filter(|report| report.owner_id() == owner_id)
            .map(|report| state.details(report))
            .collect())
    }

    async fn list_reviewable_reports(&self) -> AppResult<Vec<ReportOverview>> {
        let state = self.state.lock().await;
        Ok(state
            .reports
            .iter()
            .rev()
            .filter(|report| report.status() != ReportStatus::Draft)
            .map(|report| state.overview(report))
            .collect())
    }

    async fn list_all_reports(&self) -> AppResult<Vec<ReportOverview>> {
        let state = self.state.lock().await;
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
        let mut state = self.state.lock().await;
        let Some(report) = state
            .reports
            .iter_mut()
            .find(|report| report.id() == report_id && report.status() == from)
        else {
            return Ok(false);
        };
        *report = ExpenseReport::from_parts(
            report.id(),
            report.owner_id(),
            report.title().clone(),
            to,
            report.created_at(),
        );
        Ok(true)
    }

    async fn delete_draft_report(&self, report_id: ReportId) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        let before = state.reports.len();
        state.reports.retain(|report| {
            report.id() != report_id || report.status() != ReportStatus::Draft
        });
        let deleted = state.reports.len() != before;
        if deleted {
            state.items.retain(|item| item.report_id() != report_id);
        }
        Ok(deleted)
    }

    async fn add_item(&self, item: &ExpenseItem) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        let is_draft = state
            .report_access(item.report_id())
            .is_some_and(|access| access.status == ReportStatus::Draft);
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
        let mut state = self.state.lock().await;
        let is_draft = state
            .item_access(item_id)
            .is_some_and(|access| access.status == ReportStatus::Draft);
        if !is_draft {
            return Ok(None);
        }
        let Some(item) = state.items.iter_mut().find(|item| item.id() == item_id) else {
            return Ok(None);
        };
        *item = item.with_details(details.clone());
        Ok(Some(item.clone()))
    }

    async fn set_receipt(
        &self,
        item_id: ExpenseItemId,
        receipt_path: &str,
    ) -> AppResult<Option<ReplacedReceipt>> {
        let mut state = self.state.lock().await;
        let is_draft = state
            .item_access(item_id)
            .is_some_and(|access| access.status == ReportStatus::Draft);
        if !is_draft {
            return Ok(None);
        }
        let Some(item) = state.items.iter_mut().find(|item| item.id() == item_id) else {
            return Ok(None);
        };
        let previous_path = item.receipt_path().map(ToOwned::to_owned);
        *item = item.with_receipt(receipt_path);
        Ok(Some(ReplacedReceipt { previous_path }))
    }
}

/// Receipt store backed by a map. Every save gets a new numbered path.
#[derive(Default)]
pub(crate) struct FakeReceiptStore {
    files: Mutex<HashMap<String, Vec<u8>>>,
    uploads: AtomicUsize,
}

impl FakeReceiptStore {
    /// Paths currently holding a file, sorted.
    pub(crate) async fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.files.lock().await.keys().cloned().collect();
        paths.sort();
        paths
    }
}

#[async_trait]
impl ReceiptStore for FakeReceiptStore {
    async fn save(
        &self,
        owner_id: UserId,
        item_id: ExpenseItemId,
        extension: &str,
        bytes: &[u8],
    ) -> AppResult<String> {
        let upload = self.uploads.fetch_add(1, Ordering::SeqCst);
        let path = format!("{owner_id}/receipts/{item_id}-{upload}.{extension}");
        self.files.lock().await.insert(path.clone(), bytes.to_vec());
        Ok(path)
    }

    async fn load(&self, receipt_path: &str) -> AppResult<ReceiptFile> {
        let bytes = self
            .files
            .lock()
            .await
            .get(receipt_path)
            .cloned()
            .ok_or_else(|| AppError::NotFound("receipt file not found".to_owned()))?;
        let file_name = receipt_path
            .rsplit('/')
            .next()
            .unwrap_or(receipt_path)
            .to_owned();
        Ok(ReceiptFile { file_name, bytes })
    }

    async fn remove(&self, receipt_path: &str) {
        self.files.lock().await.remove(receipt_path);
    }
}

/// Fully wired gate over one shared fake store.
pub(crate) fn gate(store: &Arc<FakeStore>) -> AuthorizationGate {
    AuthorizationGate::new(
        Arc::new(FakeTokenService),
        store.clone(),
        AuthorizationService::new(store.clone()),
        store.clone(),
    )
}
