use std::sync::Arc;

use expensa_core::{AppError, AppResult};
use expensa_domain::{
    EmailAddress, GroupId, GroupName, Operation, Permission, Principal, UserId, validate_password,
};

use crate::token_crypto::generate_api_token;
use crate::{
    AccessTarget, ApiTokenRepository, AuthorizationGate, GroupRecord, GroupRepository, NewUser,
    PasswordHasher, UserRepository, UserSummary,
};

/// Input for creating a user account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateUserInput {
    /// Login email.
    pub email: String,
    /// Initial plaintext password.
    pub password: String,
    /// Groups to join.
    pub group_ids: Vec<GroupId>,
}

/// Application service for user, group and token administration.
#[derive(Clone)]
pub struct AdminService {
    gate: AuthorizationGate,
    user_repository: Arc<dyn UserRepository>,
    group_repository: Arc<dyn GroupRepository>,
    api_token_repository: Arc<dyn ApiTokenRepository>,
    password_hasher: Arc<dyn PasswordHasher>,
}

impl AdminService {
    /// Creates a new admin service.
    #[must_use]
    pub fn new(
        gate: AuthorizationGate,
        user_repository: Arc<dyn UserRepository>,
        group_repository: Arc<dyn GroupRepository>,
        api_token_repository: Arc<dyn ApiTokenRepository>,
        password_hasher: Arc<dyn PasswordHasher>,
    ) -> Self {
        Self {
            gate,
            user_repository,
            group_repository,
            api_token_repository,
            password_hasher,
        }
    }

    /// Lists user accounts.
    pub async fn list_users(&self, principal: &Principal) -> AppResult<Vec<UserSummary>> {
        self.authorize(principal, Operation::ListUsers).await?;
        self.user_repository.list_users().await
    }

    /// Creates a user and joins the given groups in one transaction.
    pub async fn create_user(
        &self,
        principal: &Principal,
        input: CreateUserInput,
    ) -> AppResult<UserSummary> {
        self.authorize(principal, Operation::CreateUser).await?;

        let email = EmailAddress::new(input.email)?;
        validate_password(&input.password)?;
        let password_hash = self.password_hasher.hash_password(&input.password)?;

        let mut group_ids = input.group_ids;
        group_ids.sort();
        group_ids.dedup();

        self.user_repository
            .create_user(NewUser {
                email,
                password_hash,
                group_ids,
            })
            .await
    }

    /// Lists groups with their grants.
    pub async fn list_groups(&self, principal: &Principal) -> AppResult<Vec<GroupRecord>> {
        self.authorize(principal, Operation::ListGroups).await?;
        self.group_repository.list_groups().await
    }

    /// Returns every known permission.
    pub async fn permission_catalog(
        &self,
        principal: &Principal,
    ) -> AppResult<&'static [Permission]> {
        self.authorize(principal, Operation::ListGroups).await?;
        Ok(Permission::all())
    }

    /// Creates an empty group.
    pub async fn create_group(&self, principal: &Principal, name: &str) -> AppResult<GroupRecord> {
        self.authorize(principal, Operation::CreateGroup).await?;

        let name = GroupName::new(name)?;
        self.group_repository.create_group(&name).await
    }

    /// Grants permissions to a group. Re-granting is a no-op.
    pub async fn assign_permissions(
        &self,
        principal: &Principal,
        group_id: GroupId,
        actions: &[String],
    ) -> AppResult<GroupRecord> {
        self.authorize(principal, Operation::AssignPermissions)
            .await?;

        if actions.is_empty() {
            return Err(AppError::Validation(
                "at least one permission is required".to_owned(),
            ));
        }
        let permissions = actions
            .iter()
            .map(|action| Permission::from_transport(action.trim()))
            .collect::<AppResult<Vec<_>>>()?;

        self.group_repository
            .grant_permissions(group_id, &permissions)
            .await
    }

    /// Adds a user to a group.
    pub async fn add_group_member(
        &self,
        principal: &Principal,
        group_id: GroupId,
        user_id: UserId,
    ) -> AppResult<()> {
        self.authorize(principal, Operation::ManageGroupMembers)
            .await?;
        self.group_repository.add_member(group_id, user_id).await
    }

    /// Removes a user from a group.
    pub async fn remove_group_member(
        &self,
        principal: &Principal,
        group_id: GroupId,
        user_id: UserId,
    ) -> AppResult<()> {
        self.authorize(principal, Operation::ManageGroupMembers)
            .await?;

        if !self
            .group_repository
            .remove_member(group_id, user_id)
            .await?
        {
            return Err(AppError::NotFound(format!(
                "user '{user_id}' is not a member of group '{group_id}'"
            )));
        }

        Ok(())
    }

    /// Issues a static API token for a user. The raw token is returned once
    /// and only its digest is stored.
    pub async fn create_api_token(&self, principal: &Principal, user_id: UserId) -> AppResult<String> {
        self.authorize(principal, Operation::CreateApiToken).await?;

        if self.user_repository.find_by_id(user_id).await?.is_none() {
            return Err(AppError::NotFound(format!("user '{user_id}' not found")));
        }

        let (raw_token, token_hash) = generate_api_token()?;
        self.api_token_repository
            .store_token_hash(user_id, &token_hash)
            .await?;

        Ok(raw_token)
    }

    async fn authorize(&self, principal: &Principal, operation: Operation) -> AppResult<()> {
        self.gate
            .authorize(principal, operation, AccessTarget::None)
            .await
            .map(|_| ())
    }
}
