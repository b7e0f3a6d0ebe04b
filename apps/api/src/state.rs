use expensa_application::{AdminService, AuthenticationService, AuthorizationGate, ReportService};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub gate: AuthorizationGate,
    pub authentication_service: AuthenticationService,
    pub report_service: ReportService,
    pub admin_service: AdminService,
}
