use std::path::Path;
use std::sync::Arc;

use expensa_application::{
    AdminService, ApiTokenRepository, AuthenticationService, AuthorizationGate,
    AuthorizationRepository, AuthorizationService, BootstrapRepository, BootstrapService,
    GroupRepository, PasswordHasher, ReceiptStore, ReportRepository, ReportService, TokenService,
    UserRepository,
};
use expensa_infrastructure::{
    LocalReceiptStore, PostgresApiTokenRepository, PostgresAuthorizationRepository,
    PostgresBootstrapRepository, PostgresGroupRepository, PostgresReportRepository,
    PostgresUserRepository,
};
use sqlx::PgPool;

use crate::state::AppState;

/// Adapters behind every port the services need.
#[derive(Clone)]
pub struct AppPorts {
    pub users: Arc<dyn UserRepository>,
    pub authorization: Arc<dyn AuthorizationRepository>,
    pub groups: Arc<dyn GroupRepository>,
    pub api_tokens: Arc<dyn ApiTokenRepository>,
    pub bootstrap: Arc<dyn BootstrapRepository>,
    pub reports: Arc<dyn ReportRepository>,
    pub receipts: Arc<dyn ReceiptStore>,
    pub password_hasher: Arc<dyn PasswordHasher>,
    pub token_service: Arc<dyn TokenService>,
}

impl AppPorts {
    /// PostgreSQL repositories with receipts under `data_dir`.
    pub fn postgres(
        pool: &PgPool,
        data_dir: &Path,
        password_hasher: Arc<dyn PasswordHasher>,
        token_service: Arc<dyn TokenService>,
    ) -> Self {
        Self {
            users: Arc::new(PostgresUserRepository::new(pool.clone())),
            authorization: Arc::new(PostgresAuthorizationRepository::new(pool.clone())),
            groups: Arc::new(PostgresGroupRepository::new(pool.clone())),
            api_tokens: Arc::new(PostgresApiTokenRepository::new(pool.clone())),
            bootstrap: Arc::new(PostgresBootstrapRepository::new(pool.clone())),
            reports: Arc::new(PostgresReportRepository::new(pool.clone())),
            receipts: Arc::new(LocalReceiptStore::new(data_dir)),
            password_hasher,
            token_service,
        }
    }

    pub fn bootstrap_service(&self) -> BootstrapService {
        BootstrapService::new(self.bootstrap.clone(), self.password_hasher.clone())
    }
}

pub fn build_app_state(ports: AppPorts) -> AppState {
    let authorization_service = AuthorizationService::new(ports.authorization);
    let gate = AuthorizationGate::new(
        ports.token_service.clone(),
        ports.api_tokens.clone(),
        authorization_service.clone(),
        ports.reports.clone(),
    );

    AppState {
        authentication_service: AuthenticationService::new(
            ports.users.clone(),
            ports.password_hasher.clone(),
            ports.token_service,
            authorization_service,
        ),
        report_service: ReportService::new(gate.clone(), ports.reports, ports.receipts),
        admin_service: AdminService::new(
            gate.clone(),
            ports.users,
            ports.groups,
            ports.api_tokens,
            ports.password_hasher,
        ),
        gate,
    }
}
