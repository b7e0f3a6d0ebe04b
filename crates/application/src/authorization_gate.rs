//! Single decision point for every authenticated operation.
//!
//! The gate turns a raw credential into a [`Principal`], then decides whether
//! that principal may run an [`Operation`] on a target. Checks run in a fixed
//! order: credential, permission, resource existence, ownership, status. The
//! gate reads but never writes.

use std::sync::Arc;

use expensa_core::{AppError, AppResult};
use expensa_domain::{
    AuthenticationMethod, ExpenseItemId, Operation, PermissionSet, Principal, ReportId,
    ResourceAccess,
};

use crate::token_crypto::hash_api_token;
use crate::{ApiTokenRepository, AuthorizationService, ReportRepository, TokenService};

/// Raw credential presented by a caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    /// Value of `Authorization: Bearer`.
    Bearer(String),
    /// Value of `X-API-Key`.
    ApiKey(String),
}

/// Resource an operation is aimed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessTarget {
    /// No specific resource.
    None,
    /// A report.
    Report(ReportId),
    /// An item, checked against its parent report.
    Item(ExpenseItemId),
}

/// Proof that an operation passed the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizedAccess {
    /// Caller.
    pub principal: Principal,
    /// Permissions resolved for this decision.
    pub permissions: PermissionSet,
    /// Owner and status of the target report, when there is one.
    pub resource: Option<ResourceAccess>,
}

/// Authentication and authorization gate.
#[derive(Clone)]
pub struct AuthorizationGate {
    token_service: Arc<dyn TokenService>,
    api_token_repository: Arc<dyn ApiTokenRepository>,
    authorization_service: AuthorizationService,
    report_repository: Arc<dyn ReportRepository>,
}

impl AuthorizationGate {
    /// Creates a gate.
    #[must_use]
    pub fn new(
        token_service: Arc<dyn TokenService>,
        api_token_repository: Arc<dyn ApiTokenRepository>,
        authorization_service: AuthorizationService,
        report_repository: Arc<dyn ReportRepository>,
    ) -> Self {
        Self {
            token_service,
            api_token_repository,
            authorization_service,
            report_repository,
        }
    }

    /// Verifies a credential. Absent, blank or invalid credentials all yield
    /// `Unauthenticated`.
    pub async fn authenticate(&self, credential: Option<&Credential>) -> AppResult<Principal> {
        let Some(credential) = credential else {
            return Err(AppError::Unauthenticated("missing credential".to_owned()));
        };

        match credential {
            Credential::Bearer(token) => {
                let token = non_blank(token)?;
                let user_id = self.token_service.verify(token)?;
                Ok(Principal::new(user_id, AuthenticationMethod::BearerToken))
            }
            Credential::ApiKey(key) => {
                let key = non_blank(key)?;
                let user_id = self
                    .api_token_repository
                    .find_user_by_token_hash(&hash_api_token(key))
                    .await?
                    .ok_or_else(|| AppError::Unauthenticated("unknown api key".to_owned()))?;
                Ok(Principal::new(user_id, AuthenticationMethod::ApiKey))
            }
        }
    }

    /// Decides whether an authenticated principal may run an operation on a target.
    pub async fn authorize(
        &self,
        principal: &Principal,
        operation: Operation,
        target: AccessTarget,
    ) -> AppResult<AuthorizedAccess> {
        let rule = operation.rule();
        let permissions = self
            .authorization_service
            .resolve(principal.user_id())
            .await?;

        if !rule.permits_action(&permissions) {
            return Err(AppError::Forbidden(format!(
                "user '{}' is missing permission '{}' for '{operation}'",
                principal.user_id(),
                rule.permission()
            )));
        }

        let resource = self.load_target(target).await?;

        rule.evaluate(principal.user_id(), &permissions, resource.as_ref())
            .into_result(operation)?;

        Ok(AuthorizedAccess {
            principal: *principal,
            permissions,
            resource,
        })
    }

    /// Authenticates then authorizes in one step.
    pub async fn check(
        &self,
        credential: Option<&Credential>,
        operation: Operation,
        target: AccessTarget,
    ) -> AppResult<AuthorizedAccess> {
        let principal = self.authenticate(credential).await?;
        self.authorize(&principal, operation, target).await
    }

    /// Resolves the caller's effective permissions.
    pub async fn permissions(&self, principal: &Principal) -> AppResult<PermissionSet> {
        self.authorization_service
            .resolve(principal.user_id())
            .await
    }

    async fn load_target(&self, target: AccessTarget) -> AppResult<Option<ResourceAccess>> {
        match target {
            AccessTarget::None => Ok(None),
            AccessTarget::Report(report_id) => self
                .report_repository
                .find_report_access(report_id)
                .await?
                .map(Some)
                .ok_or_else(|| AppError::NotFound(format!("report '{report_id}' not found"))),
            AccessTarget::Item(item_id) => self
                .report_repository
                .find_item_access(item_id)
                .await?
                .map(Some)
                .ok_or_else(|| AppError::NotFound(format!("item '{item_id}' not found"))),
        }
    }
}

fn non_blank(value: &str) -> AppResult<&str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::Unauthenticated("blank credential".to_owned()));
    }

    Ok(value)
}
