use async_trait::async_trait;
use chrono::{DateTime, Utc};
use expensa_core::AppResult;
use expensa_domain::UserId;

/// Port for password hashing operations. Keeps domain/application free of
/// direct cryptographic library coupling.
pub trait PasswordHasher: Send + Sync {
    /// Hashes a plaintext password into a self-describing credential string.
    fn hash_password(&self, password: &str) -> AppResult<String>;

    /// Verifies a plaintext password against a stored credential.
    /// Must run in constant time regardless of validity.
    fn verify_password(&self, password: &str, hash: &str) -> AppResult<bool>;
}

/// Signed bearer token returned to a caller after login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    /// Encoded token.
    pub token: String,
    /// Instant after which the token is refused.
    pub expires_at: DateTime<Utc>,
}

/// Port for issuing and verifying stateless bearer tokens.
pub trait TokenService: Send + Sync {
    /// Issues a token whose subject is the user.
    fn issue(&self, user_id: UserId) -> AppResult<IssuedToken>;

    /// Verifies a token and returns its subject.
    ///
    /// Every failure is reported as the same `Unauthenticated` error.
    fn verify(&self, token: &str) -> AppResult<UserId>;
}

/// Repository port for static API tokens. Only SHA-256 digests are stored.
#[async_trait]
pub trait ApiTokenRepository: Send + Sync {
    /// Stores the digest of a freshly generated token for a user.
    async fn store_token_hash(&self, user_id: UserId, token_hash: &str) -> AppResult<()>;

    /// Returns the user bound to a token digest.
    async fn find_user_by_token_hash(&self, token_hash: &str) -> AppResult<Option<UserId>>;
}
