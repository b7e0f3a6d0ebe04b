use chrono::{DateTime, Utc};
use expensa_application::{LoginOutcome, UserProfile};
use serde::{Deserialize, Serialize};

use super::UserResponse;

/// Incoming payload for password login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Issued bearer token with the authenticated user.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_at: DateTime<Utc>,
    pub user: UserResponse,
}

impl From<LoginOutcome> for LoginResponse {
    fn from(value: LoginOutcome) -> Self {
        Self {
            token: value.token.token,
            token_type: "Bearer",
            expires_at: value.token.expires_at,
            user: UserResponse::from(value.user),
        }
    }
}

/// Current principal and effective permissions.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: UserResponse,
    pub authentication_method: &'static str,
    pub permissions: Vec<String>,
}

impl From<UserProfile> for MeResponse {
    fn from(value: UserProfile) -> Self {
        Self {
            user: UserResponse::from(value.user),
            authentication_method: value.principal.method().as_str(),
            permissions: value
                .permissions
                .iter()
                .map(|permission| permission.as_str().to_owned())
                .collect(),
        }
    }
}
