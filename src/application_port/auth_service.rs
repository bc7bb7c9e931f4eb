use crate::domain_model::{MemberId, Role};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("no member matches the supplied identity")]
    PrincipalNotFound,
    #[error("account is deactivated")]
    InactiveAccount,
    #[error("invalid credentials")]
    InvalidCredential,
    #[error("email is already registered")]
    EmailTaken,
    #[error("refresh token is not registered or has expired")]
    InvalidRefreshToken,
    #[error("access token has been revoked")]
    Blacklisted,
    #[error("token expired")]
    TokenExpired,
    #[error("token signature is invalid")]
    InvalidSignature,
    #[error("reset token is invalid or has expired")]
    InvalidOrExpiredResetToken,
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub email: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct LoginResult {
    pub member_id: MemberId,
    pub tokens: AuthTokens,
}

#[derive(Debug, Clone, Serialize)]
pub struct AccessToken(pub String);

#[derive(Debug, Clone, Serialize)]
pub struct RefreshToken(pub String);

#[derive(Debug, Clone, Serialize)]
pub struct AuthTokens {
    pub access_token: AccessToken,
    pub refresh_token: RefreshToken,
    pub access_token_expires_at: DateTime<Utc>,
    pub refresh_token_expires_at: DateTime<Utc>,
}

/// A freshly minted access token, as returned by `refresh`. The refresh
/// token it was minted from stays registered and untouched.
#[derive(Debug, Clone, Serialize)]
pub struct AccessGrant {
    pub access_token: AccessToken,
    pub access_token_expires_at: DateTime<Utc>,
}

/// The principal a validated credential resolves to, attached to the
/// request-scoped context by the authentication gate.
#[derive(Debug, Clone, Copy)]
pub struct AuthContext {
    pub member_id: MemberId,
    pub role: Role,
}

/// Claims carried by a signed access token.
#[derive(Debug, Clone)]
pub struct TokenClaims {
    pub subject: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub token_type: Option<String>,
    pub jti: String,
}

/// Signs and verifies compact self-contained tokens. Implementations hold
/// an immutable signing key and no other state, so calls are safe under
/// arbitrary concurrency.
pub trait TokenCodec: Send + Sync {
    /// Sign a token for `subject` expiring `lifetime` from now.
    fn issue(
        &self,
        subject: &str,
        token_type: Option<&str>,
        lifetime: Duration,
    ) -> Result<(String, DateTime<Utc>), AuthError>;

    /// Check signature and expiry, returning the embedded claims.
    fn verify(&self, token: &str) -> Result<TokenClaims, AuthError>;

    /// Extract the expiry claim without enforcing it. The signature is
    /// still checked. Used to compute the remaining blacklist TTL at
    /// logout, which must work for already-expired tokens.
    fn decode_expiry(&self, token: &str) -> Result<DateTime<Utc>, AuthError>;
}

#[async_trait::async_trait]
pub trait CredentialHasher: Send + Sync {
    async fn hash_password(&self, password: &str) -> Result<String, AuthError>;
    async fn verify_password(&self, password: &str, password_hash: &str)
    -> Result<bool, AuthError>;
}

#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    async fn register(&self, request: RegisterInput) -> Result<MemberId, AuthError>;
    async fn login(&self, request: LoginInput) -> Result<LoginResult, AuthError>;
    /// Validate a presented access token. Blacklist membership is checked
    /// before the signature; a revoked token must never be trusted even
    /// while cryptographically valid.
    async fn validate_access(&self, access_token: &str) -> Result<MemberId, AuthError>;
    /// `validate_access` plus principal resolution: the member row must
    /// still exist and be active for a request context to be attached.
    async fn authenticate(&self, access_token: &str) -> Result<AuthContext, AuthError>;
    async fn refresh(&self, refresh_token: &str) -> Result<AccessGrant, AuthError>;
    async fn logout(
        &self,
        access_token: &str,
        refresh_token: Option<&str>,
    ) -> Result<(), AuthError>;
}
