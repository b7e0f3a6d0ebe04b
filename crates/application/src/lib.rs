//! Application services and ports.

#![forbid(unsafe_code)]

mod admin_service;
mod auth_ports;
mod authentication_service;
mod authorization_gate;
mod authorization_service;
mod bootstrap_service;
mod report_ports;
mod report_service;
mod security_ports;
#[cfg(test)]
mod test_support;
mod token_crypto;
mod user_ports;

pub use admin_service::{AdminService, CreateUserInput};
pub use auth_ports::{ApiTokenRepository, IssuedToken, PasswordHasher, TokenService};
pub use authentication_service::{AuthenticationService, LoginOutcome, UserProfile};
pub use authorization_gate::{AccessTarget, AuthorizationGate, AuthorizedAccess, Credential};
pub use authorization_service::AuthorizationService;
pub use bootstrap_service::BootstrapService;
pub use report_ports::{
    ReceiptFile, ReceiptStore, ReplacedReceipt, ReportDetails, ReportOverview, ReportRepository,
};
pub use report_service::{ItemInput, MAX_RECEIPT_BYTES, ReceiptUpload, ReportService};
pub use security_ports::{
    AuthorizationRepository, BootstrapRepository, GroupRecord, GroupRepository,
    SeedAdministrator, SeedOutcome, SeedPlan,
};
pub use token_crypto::hash_api_token;
pub use user_ports::{NewUser, UserRecord, UserRepository, UserSummary};
