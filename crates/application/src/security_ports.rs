use async_trait::async_trait;
use expensa_core::AppResult;
use expensa_domain::{DefaultGroup, EmailAddress, GroupId, GroupName, Permission, UserId};
use serde::Serialize;

/// Repository port for permission lookups.
#[async_trait]
pub trait AuthorizationRepository: Send + Sync {
    /// Lists the permissions granted to the user through all of their groups.
    ///
    /// Unknown users and users without groups yield an empty list.
    async fn list_permissions_for_user(&self, user_id: UserId) -> AppResult<Vec<Permission>>;
}

/// Group with its current grants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupRecord {
    /// Group id.
    pub id: GroupId,
    /// Unique group name.
    pub name: String,
    /// Granted permissions in catalog order.
    pub permissions: Vec<Permission>,
}

/// Repository port for groups, grants and memberships.
#[async_trait]
pub trait GroupRepository: Send + Sync {
    /// Lists groups ordered by name.
    async fn list_groups(&self) -> AppResult<Vec<GroupRecord>>;

    /// Creates an empty group. Fails with `Conflict` on a duplicate name.
    async fn create_group(&self, name: &GroupName) -> AppResult<GroupRecord>;

    /// Grants permissions to a group. Already granted permissions are left as is.
    ///
    /// Fails with `NotFound` when the group does not exist.
    async fn grant_permissions(
        &self,
        group_id: GroupId,
        permissions: &[Permission],
    ) -> AppResult<GroupRecord>;

    /// Adds a user to a group. Adding an existing member is a no-op.
    ///
    /// Fails with `NotFound` when the group or the user does not exist.
    async fn add_member(&self, group_id: GroupId, user_id: UserId) -> AppResult<()>;

    /// Removes a user from a group. Returns whether a membership was removed.
    async fn remove_member(&self, group_id: GroupId, user_id: UserId) -> AppResult<bool>;
}

/// Super administrator created by the bootstrap procedure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedAdministrator {
    /// Login email.
    pub email: EmailAddress,
    /// Encoded password hash.
    pub password_hash: String,
}

/// Everything the bootstrap procedure ensures exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedPlan {
    /// Permission catalog.
    pub permissions: &'static [Permission],
    /// Groups and their grants.
    pub groups: &'static [DefaultGroup],
    /// Administrator inserted only while no user exists, as a member of
    /// [`expensa_domain::SUPER_ADMIN_GROUP`].
    pub administrator: Option<SeedAdministrator>,
}

/// What a seeding run changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SeedOutcome {
    /// Whether the administrator account was created.
    pub administrator_created: bool,
}

/// Repository port for idempotent seeding. Implementations apply a plan in one transaction.
#[async_trait]
pub trait BootstrapRepository: Send + Sync {
    /// Returns whether at least one user exists.
    async fn has_users(&self) -> AppResult<bool>;

    /// Applies the plan. Running it twice leaves the same rows.
    async fn seed(&self, plan: &SeedPlan) -> AppResult<SeedOutcome>;
}
