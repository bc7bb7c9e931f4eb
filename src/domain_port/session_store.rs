use crate::application_port::AuthError;
use crate::domain_model::MemberId;

/// Facade over the external TTL-capable key-value store holding the two
/// session namespaces: the refresh registry (opaque token -> member id)
/// and the blacklist (revoked access token -> marker). Every operation is
/// a single round-trip; results are never cached locally, so revocation
/// is visible the moment it is written.
#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    /// Register an opaque refresh token for a member with TTL equal to
    /// the token's intended lifetime.
    async fn register_refresh(
        &self,
        token: &str,
        member_id: MemberId,
        ttl_secs: u64,
    ) -> Result<(), AuthError>;

    /// A refresh token absent from the registry is invalid regardless of
    /// its own structure.
    async fn lookup_refresh(&self, token: &str) -> Result<Option<MemberId>, AuthError>;

    /// Idempotent; revoking an unknown token is not an error.
    async fn revoke_refresh(&self, token: &str) -> Result<(), AuthError>;

    /// Blacklist an access token for its remaining natural lifetime.
    async fn blacklist(&self, token: &str, ttl_secs: u64) -> Result<(), AuthError>;

    async fn is_blacklisted(&self, token: &str) -> Result<bool, AuthError>;
}
