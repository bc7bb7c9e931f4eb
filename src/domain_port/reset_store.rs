use crate::application_port::AuthError;

/// Store for one-time password-reset credentials: opaque token -> the
/// verified email, self-expiring. Consumption must be atomic so a token
/// can never authorize two password changes.
#[async_trait::async_trait]
pub trait ResetStore: Send + Sync {
    async fn save(&self, token: &str, email: &str, ttl_secs: u64) -> Result<(), AuthError>;

    /// Fetch and delete in one step. Returns the stored email, or `None`
    /// when the token is unknown, already consumed, or expired.
    async fn consume(&self, token: &str) -> Result<Option<String>, AuthError>;
}
