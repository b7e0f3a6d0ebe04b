use std::sync::Arc;

use expensa_core::AppResult;
use expensa_domain::{Permission, PermissionSet, UserId};

use crate::AuthorizationRepository;

/// Resolves effective permissions from group grants.
///
/// Nothing is cached: every call reads current memberships and grants.
#[derive(Clone)]
pub struct AuthorizationService {
    repository: Arc<dyn AuthorizationRepository>,
}

impl AuthorizationService {
    /// Creates a new authorization service from a repository implementation.
    #[must_use]
    pub fn new(repository: Arc<dyn AuthorizationRepository>) -> Self {
        Self { repository }
    }

    /// Returns the union of permissions granted through the user's groups.
    pub async fn resolve(&self, user_id: UserId) -> AppResult<PermissionSet> {
        let permissions = self.repository.list_permissions_for_user(user_id).await?;
        Ok(permissions.into_iter().collect())
    }

    /// Returns whether the user currently holds the permission.
    pub async fn has_permission(&self, user_id: UserId, permission: Permission) -> AppResult<bool> {
        Ok(self.resolve(user_id).await?.contains(permission))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use async_trait::async_trait;
    use expensa_core::AppResult;
    use expensa_domain::{Permission, UserId};
    use tokio::sync::Mutex;

    use super::{AuthorizationRepository, AuthorizationService};

    #[derive(Default)]
    struct FakeAuthorizationRepository {
        groups: Mutex<HashMap<UserId, Vec<Vec<Permission>>>>,
    }

    #[async_trait]
    impl AuthorizationRepository for FakeAuthorizationRepository {
        async fn list_permissions_for_user(&self, user_id: UserId) -> AppResult<Vec<Permission>> {
            Ok(self
                .groups
                .lock()
                .await
                .get(&user_id)
                .map(|groups| groups.iter().flatten().copied().collect())
                .unwrap_or_default())
        }
    }

    #[tokio::test]
    async fn resolve_is_union_of_group_grants() -> AppResult<()> {
        let user_id = UserId::new();
        let repository = Arc::new(FakeAuthorizationRepository::default());
        repository.groups.lock().await.insert(
            user_id,
            vec![
                vec![Permission::ReportsCreate, Permission::ReportsReadOwn],
                vec![Permission::ReportsReadOwn, Permission::ReportsApprove],
            ],
        );
        let service = AuthorizationService::new(repository);

        let permissions = service.resolve(user_id).await?;
        assert_eq!(permissions.len(), 3);
        assert!(permissions.contains(Permission::ReportsApprove));
        assert!(!permissions.contains(Permission::ReportsReject));
        Ok(())
    }

    #[tokio::test]
    async fn unknown_user_has_no_permissions() -> AppResult<()> {
        let service = AuthorizationService::new(Arc::new(FakeAuthorizationRepository::default()));
        assert!(service.resolve(UserId::new()).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn revocation_is_visible_on_next_call() -> AppResult<()> {
        let user_id = UserId::new();
        let repository = Arc::new(FakeAuthorizationRepository::default());
        repository
            .groups
            .lock()
            .await
            .insert(user_id, vec![vec![Permission::ReportsApprove]]);
        let service = AuthorizationService::new(repository.clone());

        assert!(
            service
                .has_permission(user_id, Permission::ReportsApprove)
                .await?
        );

        repository.groups.lock().await.remove(&user_id);

        assert!(
            !service
                .has_permission(user_id, Permission::ReportsApprove)
                .await?
        );
        Ok(())
    }
}
