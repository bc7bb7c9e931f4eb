use crate::application_port::AuthError;
use crate::domain_model::{MemberId, Role};
use crate::domain_port::{MemberRecord, MemberRepo};
use chrono::Utc;
use dashmap::DashMap;

pub struct MemoryMemberRepo {
    members: DashMap<MemberId, MemberRecord>,
}

impl MemoryMemberRepo {
    pub fn new() -> Self {
        MemoryMemberRepo {
            members: DashMap::new(),
        }
    }

    /// Soft-delete, the way the member-management collaborator would.
    pub fn deactivate(&self, member_id: MemberId) {
        if let Some(mut member) = self.members.get_mut(&member_id) {
            member.is_active = false;
        }
    }

    /// Hard-delete, for exercising the issued-then-deleted reset path.
    pub fn remove(&self, member_id: MemberId) {
        self.members.remove(&member_id);
    }
}

impl Default for MemoryMemberRepo {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl MemberRepo for MemoryMemberRepo {
    async fn create(
        &self,
        member_id: MemberId,
        email: &str,
        username: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<(), AuthError> {
        self.members.insert(
            member_id,
            MemberRecord {
                member_id,
                email: email.to_string(),
                username: username.to_string(),
                password_hash: password_hash.to_string(),
                role,
                is_active: true,
                created_at: Utc::now(),
            },
        );
        Ok(())
    }

    async fn find_by_id(&self, member_id: MemberId) -> Result<Option<MemberRecord>, AuthError> {
        Ok(self.members.get(&member_id).map(|m| m.value().clone()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<MemberRecord>, AuthError> {
        Ok(self
            .members
            .iter()
            .find(|m| m.email == email)
            .map(|m| m.value().clone()))
    }

    async fn find_by_username_and_email(
        &self,
        username: &str,
        email: &str,
    ) -> Result<Option<MemberRecord>, AuthError> {
        Ok(self
            .members
            .iter()
            .find(|m| m.username == username && m.email == email)
            .map(|m| m.value().clone()))
    }

    async fn email_exists(&self, email: &str) -> Result<bool, AuthError> {
        Ok(self.members.iter().any(|m| m.email == email))
    }

    async fn update_password_hash(
        &self,
        member_id: MemberId,
        password_hash: &str,
    ) -> Result<(), AuthError> {
        match self.members.get_mut(&member_id) {
            Some(mut member) => {
                member.password_hash = password_hash.to_string();
                Ok(())
            }
            None => Err(AuthError::PrincipalNotFound),
        }
    }
}
