use super::AuthError;
use serde::Serialize;

/// One-time credential authorizing a single password change, valid for
/// fifteen minutes from issue.
#[derive(Debug, Clone, Serialize)]
pub struct ResetToken(pub String);

#[derive(Debug, Clone)]
pub struct ResetRequestInput {
    pub username: String,
    pub email: String,
}

#[async_trait::async_trait]
pub trait PasswordResetService: Send + Sync {
    /// Verify that an active member matches both username and email, then
    /// issue a reset token. The token is returned directly to the caller
    /// rather than delivered out-of-band; a known weakening of the flow.
    async fn request_reset(&self, request: ResetRequestInput) -> Result<ResetToken, AuthError>;

    /// Consume a reset token and overwrite the member's credential hash.
    /// Single use: the token is deleted atomically on consumption.
    async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), AuthError>;
}
