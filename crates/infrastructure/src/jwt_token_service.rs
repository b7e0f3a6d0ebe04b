//! HS256 bearer tokens.
//!
//! Tokens carry `sub` (user id), `iat` and `exp`. Verification accepts only
//! HS256, requires `sub` and `exp`, and applies no clock leeway.

use chrono::{DateTime, Duration, Utc};
use expensa_application::{IssuedToken, TokenService};
use expensa_core::{AppError, AppResult};
use expensa_domain::UserId;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

/// Lifetime of an issued token.
pub const TOKEN_TTL_HOURS: i64 = 24;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iat: i64,
    exp: i64,
}

/// Issues and verifies signed session tokens with a process-wide secret.
#[derive(Clone)]
pub struct JwtTokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtTokenService {
    /// Creates a token service for the signing secret.
    #[must_use]
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    fn issue_at(&self, user_id: UserId, issued_at: DateTime<Utc>) -> AppResult<IssuedToken> {
        let expires_at = issued_at + Duration::hours(TOKEN_TTL_HOURS);
        let claims = Claims {
            sub: user_id.to_string(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|error| AppError::Internal(format!("failed to sign token: {error}")))?;

        Ok(IssuedToken { token, expires_at })
    }
}

impl TokenService for JwtTokenService {
    fn issue(&self, user_id: UserId) -> AppResult<IssuedToken> {
        self.issue_at(user_id, Utc::now())
    }

    fn verify(&self, token: &str) -> AppResult<UserId> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|error| {
            tracing::debug!(reason = %error, "bearer token rejected");
            invalid_token()
        })?;

        data.claims.sub.parse::<UserId>().map_err(|_| invalid_token())
    }
}

fn invalid_token() -> AppError {
    AppError::Unauthenticated("invalid or expired token".to_owned())
}
