use serde::{Deserialize, Serialize};

use crate::UserId;

/// How a caller proved their identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthenticationMethod {
    /// Signed, expiring session token from `Authorization: Bearer`.
    BearerToken,
    /// Static API token from `X-API-Key`.
    ApiKey,
}

impl AuthenticationMethod {
    /// Returns a stable name for logs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BearerToken => "bearer",
            Self::ApiKey => "api_key",
        }
    }
}

/// Authenticated caller. Only ever built from a verified credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    user_id: UserId,
    method: AuthenticationMethod,
}

impl Principal {
    /// Creates a principal for a verified user.
    #[must_use]
    pub fn new(user_id: UserId, method: AuthenticationMethod) -> Self {
        Self { user_id, method }
    }

    /// Returns the authenticated user.
    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the credential kind that authenticated this principal.
    #[must_use]
    pub fn method(&self) -> AuthenticationMethod {
        self.method
    }
}
