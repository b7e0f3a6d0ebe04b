use std::env;
use std::fmt::Write;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use expensa_core::AppError;
use tracing_subscriber::EnvFilter;

const MIN_SECRET_BYTES: usize = 32;

/// Deployment mode selected by `APP_ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Production,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub migrate_only: bool,
    pub environment: AppEnvironment,
    pub database_url: String,
    pub jwt_secret: Vec<u8>,
    pub api_host: String,
    pub api_port: u16,
    pub data_dir: PathBuf,
    pub admin_email: String,
    pub admin_password: String,
    /// Set when `admin_password` was generated for this process.
    pub admin_password_generated: bool,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let migrate_only = env::args().nth(1).as_deref() == Some("migrate");
        Self::from_lookup(migrate_only, |name| env::var(name).ok())
    }

    /// Builds the configuration from a variable lookup.
    fn from_lookup(
        migrate_only: bool,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, AppError> {
        let non_empty = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let environment = match non_empty("APP_ENV").as_deref() {
            None | Some("development") => AppEnvironment::Development,
            Some("production") => AppEnvironment::Production,
            Some(other) => {
                return Err(AppError::Validation(format!(
                    "APP_ENV must be either 'development' or 'production', got '{other}'"
                )));
            }
        };

        let database_url = non_empty("DATABASE_URL")
            .ok_or_else(|| AppError::Validation("DATABASE_URL is required".to_owned()))?;

        let jwt_secret = match (non_empty("JWT_SECRET"), environment) {
            (Some(secret), AppEnvironment::Production) if secret.len() < MIN_SECRET_BYTES => {
                return Err(AppError::Validation(format!(
                    "JWT_SECRET must be at least {MIN_SECRET_BYTES} bytes in production"
                )));
            }
            (Some(secret), _) => secret.into_bytes(),
            (None, AppEnvironment::Production) => {
                return Err(AppError::Validation(
                    "JWT_SECRET is required in production".to_owned(),
                ));
            }
            (None, AppEnvironment::Development) => {
                tracing::warn!("JWT_SECRET is not set, using a random per-process secret");
                random_bytes::<MIN_SECRET_BYTES>()?.to_vec()
            }
        };

        let admin_password_generated = non_empty("ADMIN_PASSWORD").is_none();
        let admin_password = match (non_empty("ADMIN_PASSWORD"), environment) {
            (Some(password), _) => password,
            (None, AppEnvironment::Production) => {
                return Err(AppError::Validation(
                    "ADMIN_PASSWORD is required in production".to_owned(),
                ));
            }
            (None, AppEnvironment::Development) => hex(&random_bytes::<12>()?),
        };

        let api_port = match non_empty("API_PORT") {
            Some(value) => value
                .parse::<u16>()
                .map_err(|error| AppError::Validation(format!("invalid API_PORT: {error}")))?,
            None => 8080,
        };

        Ok(Self {
            migrate_only,
            environment,
            database_url,
            jwt_secret,
            api_host: non_empty("API_HOST").unwrap_or_else(|| "127.0.0.1".to_owned()),
            api_port,
            data_dir: PathBuf::from(non_empty("DATA_DIR").unwrap_or_else(|| "./data".to_owned())),
            admin_email: non_empty("ADMIN_EMAIL")
                .unwrap_or_else(|| "admin@example.com".to_owned()),
            admin_password,
            admin_password_generated,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn random_bytes<const N: usize>() -> Result<[u8; N], AppError> {
    let mut bytes = [0u8; N];
    getrandom::fill(&mut bytes)
        .map_err(|error| AppError::Internal(format!("failed to generate random bytes: {error}")))?;
    Ok(bytes)
}

fn hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .fold(String::with_capacity(bytes.len() * 2), |mut acc, byte| {
            let _ = write!(acc, "{byte:02x}");
            acc
        })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use expensa_core::AppError;

    use super::{ApiConfig, AppEnvironment};

    fn load(pairs: &[(&str, &str)]) -> Result<ApiConfig, AppError> {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(name, value)| ((*name).to_owned(), (*value).to_owned()))
            .collect();
        ApiConfig::from_lookup(false, |name| values.get(name).cloned())
    }

    #[test]
    fn development_defaults_generate_secrets() -> Result<(), AppError> {
        let config = load(&[("DATABASE_URL", "postgres://localhost/expensa")])?;

        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.jwt_secret.len(), 32);
        assert_eq!(config.admin_password.len(), 24);
        assert!(config.admin_password_generated);
        assert_eq!(config.api_port, 8080);
        assert_eq!(config.admin_email, "admin@example.com");
        assert_eq!(config.data_dir, std::path::PathBuf::from("./data"));

        let other = load(&[("DATABASE_URL", "postgres://localhost/expensa")])?;
        assert_ne!(config.jwt_secret, other.jwt_secret);
        Ok(())
    }

    #[test]
    fn production_requires_strong_secret_and_admin_password() {
        let missing_secret = load(&[
            ("APP_ENV", "production"),
            ("DATABASE_URL", "postgres://db/expensa"),
            ("ADMIN_PASSWORD", "a-long-admin-password"),
        ]);
        assert!(matches!(missing_secret, Err(AppError::Validation(_))));

        let short_secret = load(&[
            ("APP_ENV", "production"),
            ("DATABASE_URL", "postgres://db/expensa"),
            ("JWT_SECRET", "too-short"),
            ("ADMIN_PASSWORD", "a-long-admin-password"),
        ]);
        assert!(matches!(short_secret, Err(AppError::Validation(_))));

        let missing_password = load(&[
            ("APP_ENV", "production"),
            ("DATABASE_URL", "postgres://db/expensa"),
            ("JWT_SECRET", "0123456789abcdef0123456789abcdef"),
        ]);
        assert!(matches!(missing_password, Err(AppError::Validation(_))));

        let valid = load(&[
            ("APP_ENV", "production"),
            ("DATABASE_URL", "postgres://db/expensa"),
            ("JWT_SECRET", "0123456789abcdef0123456789abcdef"),
            ("ADMIN_PASSWORD", "a-long-admin-password"),
        ]);
        assert!(valid.is_ok());
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(load(&[]), Err(AppError::Validation(_))));
        assert!(matches!(
            load(&[("DATABASE_URL", "postgres://db"), ("APP_ENV", "staging")]),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            load(&[("DATABASE_URL", "postgres://db"), ("API_PORT", "http")]),
            Err(AppError::Validation(_))
        ));
    }
}
