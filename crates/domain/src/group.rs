use expensa_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::Permission;

/// Name of the seeded group that holds every permission. The bootstrap
/// administrator is placed in it.
pub const SUPER_ADMIN_GROUP: &str = "Administrateurs";

/// Maximum accepted length of a group name.
const GROUP_NAME_MAX_LENGTH: usize = 100;

/// Validated, trimmed group name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupName(String);

impl GroupName {
    /// Creates a validated group name.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let trimmed = value.trim();

        if trimmed.is_empty() {
            return Err(AppError::Validation("group name is required".to_owned()));
        }

        if trimmed.chars().count() > GROUP_NAME_MAX_LENGTH {
            return Err(AppError::Validation(format!(
                "group name must not exceed {GROUP_NAME_MAX_LENGTH} characters"
            )));
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the validated name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<GroupName> for String {
    fn from(value: GroupName) -> Self {
        value.0
    }
}

/// Group seeded by the bootstrap procedure together with its grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultGroup {
    /// Unique group name.
    pub name: &'static str,
    /// Permissions granted to the group.
    pub permissions: &'static [Permission],
}

/// Returns the groups every installation starts with.
#[must_use]
pub fn default_groups() -> &'static [DefaultGroup] {
    const GROUPS: &[DefaultGroup] = &[
        DefaultGroup {
            name: SUPER_ADMIN_GROUP,
            permissions: &[
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
            ],
        },
        DefaultGroup {
            name: "Validateurs",
            permissions: &[
                Permission::ReportsReadAll,
                Permission::ReportsApprove,
                Permission::ReportsReject,
            ],
        },
        DefaultGroup {
            name: "Utilisateurs",
            permissions: &[
                Permission::ReportsCreate,
                Permission::ReportsUpdateOwn,
                Permission::ReportsReadOwn,
            ],
        },
    ];

    GROUPS
}
