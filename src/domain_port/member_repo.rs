use crate::application_port::AuthError;
use crate::domain_model::{MemberId, Role};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct MemberRecord {
    pub member_id: MemberId,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Narrow view of the member persistence collaborator. The credential
/// core only ever reads principals and overwrites their stored hash;
/// profile management lives elsewhere.
#[async_trait::async_trait]
pub trait MemberRepo: Send + Sync {
    async fn create(
        &self,
        member_id: MemberId,
        email: &str,
        username: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<(), AuthError>;

    async fn find_by_id(&self, member_id: MemberId) -> Result<Option<MemberRecord>, AuthError>;

    /// Fetch by email (for login and reset-token consumption).
    async fn find_by_email(&self, email: &str) -> Result<Option<MemberRecord>, AuthError>;

    /// Fetch by username AND email; both must match (reset-token issue).
    async fn find_by_username_and_email(
        &self,
        username: &str,
        email: &str,
    ) -> Result<Option<MemberRecord>, AuthError>;

    async fn email_exists(&self, email: &str) -> Result<bool, AuthError>;

    async fn update_password_hash(
        &self,
        member_id: MemberId,
        password_hash: &str,
    ) -> Result<(), AuthError>;
}
