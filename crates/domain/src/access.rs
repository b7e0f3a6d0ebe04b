//! Access rules for every operation exposed by the service.
//!
//! Each [`Operation`] maps to exactly one [`AccessRule`]. A rule names the
//! permission the caller must hold, whether the target report must belong to
//! the caller, and which report status the operation needs. Evaluation order
//! is permission, then ownership, then status; resource lookup happens between
//! the first two steps and belongs to the caller of [`AccessRule::evaluate`].

use expensa_core::{AppError, AppResult};

use crate::{Permission, PermissionSet, ReportId, ReportStatus, UserId};

/// Every authorized operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Create a draft report.
    CreateReport,
    /// List the caller's own reports.
    ListOwnReports,
    /// Read one report with its items.
    ViewReport,
    /// Hand a draft over for review.
    SubmitReport,
    /// Remove a draft report and its items.
    DeleteReport,
    /// Add a line to a draft report.
    AddItem,
    /// Change a line of a draft report.
    UpdateItem,
    /// Attach a receipt file to a line of a draft report.
    UploadReceipt,
    /// Download a receipt file.
    ReadReceipt,
    /// List every non-draft report.
    ListReviewableReports,
    /// Approve a submitted report.
    ApproveReport,
    /// Reject a submitted report.
    RejectReport,
    /// List user accounts.
    ListUsers,
    /// Create a user account.
    CreateUser,
    /// List groups and the permission catalog.
    ListGroups,
    /// Create a group.
    CreateGroup,
    /// Grant permissions to a group.
    AssignPermissions,
    /// Add or remove group members.
    ManageGroupMembers,
    /// Issue a static API token for a user.
    CreateApiToken,
    /// Export every report.
    ExportReports,
}

impl Operation {
    /// Returns the access rule governing this operation.
    #[must_use]
    pub fn rule(&self) -> AccessRule {
        use Ownership::{Owner, OwnerOr, Unscoped};
        use Permission as P;
        use ReportStatus::{Draft, Submitted};

        match self {
            Self::CreateReport => AccessRule::new(P::ReportsCreate, Unscoped, None),
            Self::ListOwnReports => AccessRule::new(P::ReportsReadOwn, Unscoped, None),
            Self::ViewReport => {
                AccessRule::new(P::ReportsReadOwn, OwnerOr(P::ReportsReadAll), None)
            }
            Self::SubmitReport => AccessRule::new(P::ReportsUpdateOwn, Owner, Some(Draft)),
            Self::DeleteReport => AccessRule::new(P::ReportsUpdateOwn, Owner, Some(Draft)),
            Self::AddItem => AccessRule::new(P::ReportsCreate, Owner, Some(Draft)),
            Self::UpdateItem => AccessRule::new(P::ReportsUpdateOwn, Owner, Some(Draft)),
            Self::UploadReceipt => AccessRule::new(P::ReportsUpdateOwn, Owner, Some(Draft)),
            Self::ReadReceipt => {
                AccessRule::new(P::ReportsReadOwn, OwnerOr(P::ReportsReadAll), None)
            }
            Self::ListReviewableReports => AccessRule::new(P::ReportsReadAll, Unscoped, None),
            Self::ApproveReport => AccessRule::new(P::ReportsApprove, Unscoped, Some(Submitted)),
            Self::RejectReport => AccessRule::new(P::ReportsReject, Unscoped, Some(Submitted)),
            Self::ListUsers => AccessRule::new(P::UsersRead, Unscoped, None),
            Self::CreateUser => AccessRule::new(P::UsersCreate, Unscoped, None),
            Self::ListGroups => AccessRule::new(P::GroupsRead, Unscoped, None),
            Self::CreateGroup => AccessRule::new(P::GroupsCreate, Unscoped, None),
            Self::AssignPermissions | Self::ManageGroupMembers => {
                AccessRule::new(P::PermissionsAssign, Unscoped, None)
            }
            Self::CreateApiToken => AccessRule::new(P::TokensCreate, Unscoped, None),
            Self::ExportReports => AccessRule::new(P::ReportsExportAll, Unscoped, None),
        }
    }

    /// Returns a stable name for logs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreateReport => "create_report",
            Self::ListOwnReports => "list_own_reports",
            Self::ViewReport => "view_report",
            Self::SubmitReport => "submit_report",
            Self::DeleteReport => "delete_report",
            Self::AddItem => "add_item",
            Self::UpdateItem => "update_item",
            Self::UploadReceipt => "upload_receipt",
            Self::ReadReceipt => "read_receipt",
            Self::ListReviewableReports => "list_reviewable_reports",
            Self::ApproveReport => "approve_report",
            Self::RejectReport => "reject_report",
            Self::ListUsers => "list_users",
            Self::CreateUser => "create_user",
            Self::ListGroups => "list_groups",
            Self::CreateGroup => "create_group",
            Self::AssignPermissions => "assign_permissions",
            Self::ManageGroupMembers => "manage_group_members",
            Self::CreateApiToken => "create_api_token",
            Self::ExportReports => "export_reports",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Ownership requirement of an operation on a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    /// Not tied to a specific report owner.
    Unscoped,
    /// Caller must own the report.
    Owner,
    /// Caller must own the report unless they hold the override permission.
    OwnerOr(Permission),
}

impl Ownership {
    /// Returns the permission that lifts the ownership requirement, if any.
    #[must_use]
    pub fn override_permission(&self) -> Option<Permission> {
        match self {
            Self::OwnerOr(permission) => Some(*permission),
            Self::Unscoped | Self::Owner => None,
        }
    }
}

/// Owner and status of a report, as loaded by the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceAccess {
    /// Report the target belongs to. For items this is the parent report.
    pub report_id: ReportId,
    /// Report owner.
    pub owner_id: UserId,
    /// Current report status.
    pub status: ReportStatus,
}

/// Outcome of evaluating an access rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    /// The caller may proceed.
    Allowed,
    /// Missing permission or ownership.
    Forbidden,
    /// Permission and ownership hold but the report is in the wrong status.
    InvalidState {
        /// Status the operation needs.
        required: ReportStatus,
        /// Status the report is in.
        actual: ReportStatus,
    },
}

impl AccessDecision {
    /// Converts the decision to a result for `?` propagation.
    pub fn into_result(self, operation: Operation) -> AppResult<()> {
        match self {
            Self::Allowed => Ok(()),
            Self::Forbidden => Err(AppError::Forbidden(format!(
                "operation '{operation}' denied"
            ))),
            Self::InvalidState { required, actual } => Err(AppError::InvalidState(format!(
                "operation '{operation}' requires a {required} report, found {actual}"
            ))),
        }
    }
}

/// Access requirements of one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessRule {
    permission: Permission,
    ownership: Ownership,
    required_status: Option<ReportStatus>,
}

impl AccessRule {
    /// Creates a rule.
    #[must_use]
    pub const fn new(
        permission: Permission,
        ownership: Ownership,
        required_status: Option<ReportStatus>,
    ) -> Self {
        Self {
            permission,
            ownership,
            required_status,
        }
    }

    /// Returns the required permission.
    #[must_use]
    pub fn permission(&self) -> Permission {
        self.permission
    }

    /// Returns the ownership requirement.
    #[must_use]
    pub fn ownership(&self) -> Ownership {
        self.ownership
    }

    /// Returns the report status the operation needs, if any.
    #[must_use]
    pub fn required_status(&self) -> Option<ReportStatus> {
        self.required_status
    }

    /// Returns whether the rule can only be decided against a loaded report.
    #[must_use]
    pub fn requires_resource(&self) -> bool {
        self.ownership != Ownership::Unscoped || self.required_status.is_some()
    }

    /// Returns whether the permission set passes the action check.
    ///
    /// Holding the override variant counts as holding the action.
    #[must_use]
    pub fn permits_action(&self, permissions: &PermissionSet) -> bool {
        permissions.contains(self.permission)
            || self
                .ownership
                .override_permission()
                .is_some_and(|permission| permissions.contains(permission))
    }

    /// Decides access for a caller and an optional loaded resource.
    ///
    /// A rule that needs a resource and is given none is denied.
    #[must_use]
    pub fn evaluate(
        &self,
        user_id: UserId,
        permissions: &PermissionSet,
        resource: Option<&ResourceAccess>,
    ) -> AccessDecision {
        if !self.permits_action(permissions) {
            return AccessDecision::Forbidden;
        }

        let Some(resource) = resource else {
            return if self.requires_resource() {
                AccessDecision::Forbidden
            } else {
                AccessDecision::Allowed
            };
        };

        let owns_resource = resource.owner_id == user_id;
        let ownership_ok = match self.ownership {
            Ownership::Unscoped => true,
            Ownership::Owner => owns_resource,
            Ownership::OwnerOr(permission) => owns_resource || permissions.contains(permission),
        };
        if !ownership_ok {
            return AccessDecision::Forbidden;
        }

        match self.required_status {
            Some(required) if resource.status != required => AccessDecision::InvalidState {
                required,
                actual: resource.status,
            },
            _ => AccessDecision::Allowed,
        }
    }
}
