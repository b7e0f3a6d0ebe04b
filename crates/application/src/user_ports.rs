use async_trait::async_trait;
use chrono::{DateTime, Utc};
use expensa_core::AppResult;
use expensa_domain::{EmailAddress, GroupId, UserId};
use serde::Serialize;

/// User record including the stored credential. Never leaves the application layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    /// Unique user identifier.
    pub id: UserId,
    /// Canonical lowercased email.
    pub email: String,
    /// Encoded password hash.
    pub password_hash: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    /// Returns the public projection of the record.
    #[must_use]
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            email: self.email.clone(),
            created_at: self.created_at,
        }
    }
}

/// Public user projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSummary {
    /// Unique user identifier.
    pub id: UserId,
    /// Canonical lowercased email.
    pub email: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Values persisted when creating a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    /// Validated email.
    pub email: EmailAddress,
    /// Encoded password hash.
    pub password_hash: String,
    /// Groups the user joins on creation.
    pub group_ids: Vec<GroupId>,
}

/// Repository port for user persistence.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Finds a user by canonical email.
    async fn find_by_email(&self, email: &str) -> AppResult<Option<UserRecord>>;

    /// Finds a user by id.
    async fn find_by_id(&self, user_id: UserId) -> AppResult<Option<UserSummary>>;

    /// Lists users ordered by creation time.
    async fn list_users(&self) -> AppResult<Vec<UserSummary>>;

    /// Creates the user and its group memberships atomically.
    ///
    /// Fails with `Conflict` on a duplicate email and `Validation` on an
    /// unknown group id; nothing is written in either case.
    async fn create_user(&self, user: NewUser) -> AppResult<UserSummary>;
}
