//! Password login and caller profile.
//!
//! Login failures are indistinguishable: an unknown email, a malformed email
//! and a wrong password all return the same error after one hash computation.

use std::sync::Arc;

use expensa_core::{AppError, AppResult};
use expensa_domain::{EmailAddress, Permission, Principal};

use crate::{
    AuthorizationService, IssuedToken, PasswordHasher, TokenService, UserRepository, UserSummary,
};

/// Successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    /// Bearer token for subsequent requests.
    pub token: IssuedToken,
    /// Authenticated user.
    pub user: UserSummary,
}

/// Authenticated caller with effective permissions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    /// Caller account.
    pub user: UserSummary,
    /// How the caller authenticated.
    pub principal: Principal,
    /// Effective permissions in catalog order.
    pub permissions: Vec<Permission>,
}

/// Application service for password authentication.
#[derive(Clone)]
pub struct AuthenticationService {
    user_repository: Arc<dyn UserRepository>,
    password_hasher: Arc<dyn PasswordHasher>,
    token_service: Arc<dyn TokenService>,
    authorization_service: AuthorizationService,
}

impl AuthenticationService {
    /// Creates a new authentication service.
    #[must_use]
    pub fn new(
        user_repository: Arc<dyn UserRepository>,
        password_hasher: Arc<dyn PasswordHasher>,
        token_service: Arc<dyn TokenService>,
        authorization_service: AuthorizationService,
    ) -> Self {
        Self {
            user_repository,
            password_hasher,
            token_service,
            authorization_service,
        }
    }

    /// Authenticates with email and password and issues a bearer token.
    pub async fn login(&self, email: &str, password: &str) -> AppResult<LoginOutcome> {
        let user = match EmailAddress::new(email) {
            Ok(email) => self.user_repository.find_by_email(email.as_str()).await?,
            Err(_) => None,
        };

        let Some(user) = user else {
            // Hash anyway so unknown accounts cost the same as known ones.
            let _ = self.password_hasher.hash_password(password);
            return Err(invalid_credentials());
        };

        if !self
            .password_hasher
            .verify_password(password, &user.password_hash)?
        {
            return Err(invalid_credentials());
        }

        let token = self.token_service.issue(user.id)?;
        Ok(LoginOutcome {
            token,
            user: user.summary(),
        })
    }

    /// Returns the caller's account and effective permissions.
    pub async fn profile(&self, principal: &Principal) -> AppResult<UserProfile> {
        let user = self
            .user_repository
            .find_by_id(principal.user_id())
            .await?
            .ok_or_else(|| AppError::Unauthenticated("principal no longer exists".to_owned()))?;
        let permissions = self
            .authorization_service
            .resolve(principal.user_id())
            .await?;

        Ok(UserProfile {
            user,
            principal: *principal,
            permissions: permissions.into(),
        })
    }
}

fn invalid_credentials() -> AppError {
    AppError::Unauthenticated("invalid credentials".to_owned())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::Ordering;

    use expensa_core::{AppError, AppResult};
    use expensa_domain::{AuthenticationMethod, Permission, Principal};

    use crate::AuthorizationService;
    use crate::test_support::{FakePasswordHasher, FakeStore, FakeTokenService};

    use super::AuthenticationService;

    fn service(
        store: &Arc<FakeStore>,
        hasher: &Arc<FakePasswordHasher>,
    ) -> AuthenticationService {
        AuthenticationService::new(
            store.clone(),
            hasher.clone(),
            Arc::new(FakeTokenService),
            AuthorizationService::new(store.clone()),
        )
    }

    #[tokio::test]
    async fn login_issues_token_for_valid_credentials() -> AppResult<()> {
        let store = Arc::new(FakeStore::default());
        let user_id = store.user_with("alice@example.com", &[]).await;
        let hasher = Arc::new(FakePasswordHasher::default());

        let outcome = service(&store, &hasher)
            .login("Alice@Example.com", "correct horse battery")
            .await?;
        assert_eq!(outcome.user.id, user_id);
        assert_eq!(outcome.token.token, format!("token:{user_id}"));
        Ok(())
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_fail_identically() {
        let store = Arc::new(FakeStore::default());
        store.user_with("alice@example.com", &[]).await;
        let hasher = Arc::new(FakePasswordHasher::default());
        let service = service(&store, &hasher);

        let wrong_password = service.login("alice@example.com", "nope").await;
        let unknown_email = service.login("bob@example.com", "nope").await;
        let malformed_email = service.login("not-an-email", "nope").await;

        assert!(matches!(wrong_password, Err(AppError::Unauthenticated(_))));
        assert_eq!(wrong_password, unknown_email);
        assert_eq!(unknown_email, malformed_email);
        assert_eq!(hasher.hash_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn profile_lists_effective_permissions() -> AppResult<()> {
        let store = Arc::new(FakeStore::default());
        let user_id = store
            .user_with(
                "alice@example.com",
                &[Permission::ReportsReadOwn, Permission::ReportsCreate],
            )
            .await;
        let hasher = Arc::new(FakePasswordHasher::default());

        let profile = service(&store, &hasher)
            .profile(&Principal::new(user_id, AuthenticationMethod::BearerToken))
            .await?;
        assert_eq!(profile.user.email, "alice@example.com");
        assert_eq!(
            profile.permissions,
            vec![Permission::ReportsCreate, Permission::ReportsReadOwn]
        );
        Ok(())
    }
}
