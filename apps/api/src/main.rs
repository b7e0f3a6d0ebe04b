//! Expensa API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod api_router;
mod api_services;
mod dto;
mod error;
mod handlers;
mod middleware;
mod state;

use std::sync::Arc;

use expensa_core::AppError;
use expensa_infrastructure::{Argon2PasswordHasher, JwtTokenService};
use tracing::{info, warn};

use crate::api_config::{ApiConfig, init_tracing};
use crate::api_router::build_router;
use crate::api_services::{AppPorts, build_app_state, connect_and_migrate};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ApiConfig::load()?;
    let pool = connect_and_migrate(&config.database_url).await?;

    if config.migrate_only {
        info!("database migrations applied successfully");
        return Ok(());
    }

    let ports = AppPorts::postgres(
        &pool,
        &config.data_dir,
        Arc::new(Argon2PasswordHasher::new()),
        Arc::new(JwtTokenService::new(&config.jwt_secret)),
    );

    let seed = ports
        .bootstrap_service()
        .seed(&config.admin_email, &config.admin_password)
        .await?;
    if seed.administrator_created {
        if config.admin_password_generated {
            warn!(
                email = %config.admin_email,
                "created administrator with a generated password, printed once to stderr"
            );
            eprintln!(
                "{}",
                generated_password_notice(&config.admin_email, &config.admin_password)
            );
        } else {
            info!(email = %config.admin_email, "created administrator");
        }
    }

    let app = build_router(build_app_state(ports));

    let address = config.socket_address()?;
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(%address, environment = ?config.environment, "expensa-api listening");

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("api server error: {error}")))
}

/// Console text for a generated administrator password. Printed to stderr,
/// never logged.
fn generated_password_notice(email: &str, password: &str) -> String {
    format!(
        "administrator {email} was created with the generated password: {password}\n\
         change it after the first login"
    )
}
