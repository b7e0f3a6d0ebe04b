//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod argon2_password_hasher;
mod in_memory_store;
mod jwt_token_service;
mod local_receipt_store;
mod postgres_api_token_repository;
mod postgres_authorization_repository;
mod postgres_bootstrap_repository;
mod postgres_errors;
mod postgres_group_repository;
mod postgres_report_repository;
mod postgres_user_repository;

pub use argon2_password_hasher::Argon2PasswordHasher;
pub use in_memory_store::InMemoryStore;
pub use jwt_token_service::{JwtTokenService, TOKEN_TTL_HOURS};
pub use local_receipt_store::LocalReceiptStore;
pub use postgres_api_token_repository::PostgresApiTokenRepository;
pub use postgres_authorization_repository::PostgresAuthorizationRepository;
pub use postgres_bootstrap_repository::PostgresBootstrapRepository;
pub use postgres_group_repository::PostgresGroupRepository;
pub use postgres_report_repository::PostgresReportRepository;
pub use postgres_user_repository::PostgresUserRepository;

