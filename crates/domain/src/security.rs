use std::collections::BTreeSet;
use std::str::FromStr;

use expensa_core::AppError;
use serde::{Deserialize, Serialize};

/// Permissions enforced by the authorization gate.
///
/// Stored and transported as their action string (for example `reports:create`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Permission {
    /// Allows creating expense reports and adding items to them.
    ReportsCreate,
    /// Allows mutating and submitting one's own draft reports.
    ReportsUpdateOwn,
    /// Allows reading one's own reports and receipts.
    ReportsReadOwn,
    /// Allows reading every report and receipt.
    ReportsReadAll,
    /// Allows approving submitted reports.
    ReportsApprove,
    /// Allows rejecting submitted reports.
    ReportsReject,
    /// Allows listing users.
    UsersRead,
    /// Allows creating users.
    UsersCreate,
    /// Allows listing groups and the permission catalog.
    GroupsRead,
    /// Allows creating groups.
    GroupsCreate,
    /// Allows granting permissions to groups and managing group membership.
    PermissionsAssign,
    /// Allows issuing static API tokens.
    TokensCreate,
    /// Allows exporting every report.
    ReportsExportAll,
}

impl Permission {
    /// Returns a stable storage value for this permission.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ReportsCreate => "reports:create",
            Self::ReportsUpdateOwn => "reports:update:own",
            Self::ReportsReadOwn => "reports:read:own",
            Self::ReportsReadAll => "reports:read:all",
            Self::ReportsApprove => "reports:approve",
            Self::ReportsReject => "reports:reject",
            Self::UsersRead => "users:read",
            Self::UsersCreate => "users:create",
            Self::GroupsRead => "groups:read",
            Self::GroupsCreate => "groups:create",
            Self::PermissionsAssign => "permissions:assign",
            Self::TokensCreate => "tokens:create",
            Self::ReportsExportAll => "reports:export:all",
        }
    }

    /// Returns all known permissions.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Permission] = &[
            Permission::ReportsCreate,
            Permission::ReportsUpdateOwn,
            Permission::ReportsReadOwn,
            Permission::ReportsReadAll,
            Permission::ReportsApprove,
            Permission::ReportsReject,
            Permission::UsersRead,
            Permission::UsersCreate,
            Permission::GroupsRead,
            Permission::GroupsCreate,
            Permission::PermissionsAssign,
            Permission::TokensCreate,
            Permission::ReportsExportAll,
        ];

        ALL
    }

    /// Parses a transport value into a permission.
    pub fn from_transport(value: &str) -> Result<Self, AppError> {
        Self::from_str(value)
    }
}

impl FromStr for Permission {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|permission| permission.as_str() == value)
            .ok_or_else(|| AppError::Validation(format!("unknown permission value '{value}'")))
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl From<Permission> for String {
    fn from(value: Permission) -> Self {
        value.as_str().to_owned()
    }
}

impl TryFrom<String> for Permission {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_str(value.as_str())
    }
}

/// Effective permission set of a user: the union of all group grants.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionSet(BTreeSet<Permission>);

impl PermissionSet {
    /// Creates an empty permission set.
    #[must_use]
    pub fn new() -> Self {
        Self(BTreeSet::new())
    }

    /// Returns whether the set grants the permission.
    #[must_use]
    pub fn contains(&self, permission: Permission) -> bool {
        self.0.contains(&permission)
    }

    /// Returns whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of distinct permissions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterates permissions in a stable order.
    pub fn iter(&self) -> impl Iterator<Item = Permission> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Permission> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<PermissionSet> for Vec<Permission> {
    fn from(value: PermissionSet) -> Self {
        value.0.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::{Permission, PermissionSet};

    #[test]
    fn permission_roundtrip_storage_value() {
        for permission in Permission::all() {
            assert_eq!(Permission::from_str(permission.as_str()), Ok(*permission));
        }
    }

    #[test]
    fn unknown_permission_is_rejected() {
        // A typo must not silently become an always-deny string.
        assert!(Permission::from_str("reports:approv").is_err());
        assert!(Permission::from_str("reports:read:any").is_err());
    }

    #[test]
    fn catalog_has_thirteen_distinct_actions() {
        let set: PermissionSet = Permission::all().iter().copied().collect();
        assert_eq!(set.len(), 13);
    }

    #[test]
    fn duplicates_collapse_in_permission_set() {
        let set: PermissionSet = [
            Permission::ReportsCreate,
            Permission::ReportsCreate,
            Permission::ReportsReadOwn,
        ]
        .into_iter()
        .collect();

        assert_eq!(set.len(), 2);
        assert!(set.contains(Permission::ReportsReadOwn));
        assert!(!set.contains(Permission::ReportsReadAll));
    }

    #[test]
    fn permission_converts_to_action_string() {
        assert_eq!(
            String::from(Permission::ReportsExportAll),
            "reports:export:all"
        );
        assert_eq!(
            Permission::try_from("reports:update:own".to_owned()),
            Ok(Permission::ReportsUpdateOwn)
        );
    }
}
