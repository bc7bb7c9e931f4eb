use super::auth_service_impl::opaque_token;
use crate::application_port::{
    AuthError, CredentialHasher, PasswordResetService, ResetRequestInput, ResetToken,
};
use crate::domain_port::{MemberRepo, ResetStore};
use std::sync::Arc;
use tracing::info;

/// Fixed window between identity verification and the password change.
const RESET_TTL_SECS: u64 = 15 * 60;

pub struct RealPasswordResetService {
    member_repo: Arc<dyn MemberRepo>,
    credential_hasher: Arc<dyn CredentialHasher>,
    reset_store: Arc<dyn ResetStore>,
    min_password_len: usize,
}

impl RealPasswordResetService {
    pub fn new(
        member_repo: Arc<dyn MemberRepo>,
        credential_hasher: Arc<dyn CredentialHasher>,
        reset_store: Arc<dyn ResetStore>,
    ) -> Self {
        Self {
            member_repo,
            credential_hasher,
            reset_store,
            min_password_len: 6,
        }
    }
}

#[async_trait::async_trait]
impl PasswordResetService for RealPasswordResetService {
    async fn request_reset(&self, request: ResetRequestInput) -> Result<ResetToken, AuthError> {
        let ResetRequestInput { username, email } = request;

        let member = self
            .member_repo
            .find_by_username_and_email(&username, &email)
            .await?
            .ok_or(AuthError::PrincipalNotFound)?;

        if !member.is_active {
            return Err(AuthError::InactiveAccount);
        }

        let token = opaque_token();
        self.reset_store
            .save(&token, &member.email, RESET_TTL_SECS)
            .await?;

        info!(member_id = %member.member_id, "reset token issued");
        Ok(ResetToken(token))
    }

    async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), AuthError> {
        if new_password.chars().count() < self.min_password_len {
            return Err(AuthError::Validation("password too short".to_string()));
        }

        // Consume first: the atomic get+delete is what enforces single
        // use, independent of the TTL racing a "used" flag.
        let email = self
            .reset_store
            .consume(token)
            .await?
            .ok_or(AuthError::InvalidOrExpiredResetToken)?;

        // the member may have been deleted since the token was issued
        let member = self
            .member_repo
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::PrincipalNotFound)?;

        let password_hash = self.credential_hasher.hash_password(new_password).await?;
        self.member_repo
            .update_password_hash(member.member_id, &password_hash)
            .await?;

        info!(member_id = %member.member_id, "password reset");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application_impl::{Argon2PasswordHasher, JwtHs256Codec, RealAuthService, TokenPolicy};
    use crate::application_port::{AuthService, LoginInput, RegisterInput};
    use crate::infra_memory::{MemoryMemberRepo, MemoryResetStore, MemorySessionStore};
    use std::time::Duration;

    struct Fixture {
        auth: RealAuthService,
        reset: RealPasswordResetService,
        member_repo: Arc<MemoryMemberRepo>,
        reset_store: Arc<MemoryResetStore>,
    }

    fn fixture() -> Fixture {
        let member_repo = Arc::new(MemoryMemberRepo::new());
        let reset_store = Arc::new(MemoryResetStore::new());
        let hasher = Arc::new(Argon2PasswordHasher);
        let auth = RealAuthService::new(
            member_repo.clone(),
            hasher.clone(),
            Arc::new(JwtHs256Codec::new(b"reset-test-key")),
            Arc::new(MemorySessionStore::new()),
            TokenPolicy {
                access_ttl: Duration::from_secs(3600),
                refresh_ttl: Duration::from_secs(86400),
            },
        );
        let reset = RealPasswordResetService::new(member_repo.clone(), hasher, reset_store.clone());
        Fixture {
            auth,
            reset,
            member_repo,
            reset_store,
        }
    }

    async fn signed_up(fx: &Fixture) {
        fx.auth
            .register(RegisterInput {
                email: "a@x.com".to_string(),
                username: "ada".to_string(),
                password: "old-secret".to_string(),
            })
            .await
            .unwrap();
    }

    fn verify_input() -> ResetRequestInput {
        ResetRequestInput {
            username: "ada".to_string(),
            email: "a@x.com".to_string(),
        }
    }

    #[tokio::test]
    async fn reset_changes_the_credential() {
        let fx = fixture();
        signed_up(&fx).await;

        let token = fx.reset.request_reset(verify_input()).await.unwrap();
        fx.reset
            .reset_password(&token.0, "new-secret")
            .await
            .unwrap();

        let relogin = fx
            .auth
            .login(LoginInput {
                email: "a@x.com".to_string(),
                password: "new-secret".to_string(),
            })
            .await;
        assert!(relogin.is_ok());

        let old = fx
            .auth
            .login(LoginInput {
                email: "a@x.com".to_string(),
                password: "old-secret".to_string(),
            })
            .await;
        assert!(matches!(old, Err(AuthError::InvalidCredential)));
    }

    #[tokio::test]
    async fn reset_token_is_single_use() {
        let fx = fixture();
        signed_up(&fx).await;

        let token = fx.reset.request_reset(verify_input()).await.unwrap();
        fx.reset.reset_password(&token.0, "first-new").await.unwrap();

        let second = fx.reset.reset_password(&token.0, "second-new").await;
        assert!(matches!(second, Err(AuthError::InvalidOrExpiredResetToken)));
    }

    #[tokio::test]
    async fn expired_reset_token_is_rejected() {
        let fx = fixture();
        signed_up(&fx).await;

        let token = fx.reset.request_reset(verify_input()).await.unwrap();
        fx.reset_store.force_expire(&token.0);

        let result = fx.reset.reset_password(&token.0, "new-secret").await;
        assert!(matches!(result, Err(AuthError::InvalidOrExpiredResetToken)));
    }

    #[tokio::test]
    async fn identity_must_match_on_both_fields() {
        let fx = fixture();
        signed_up(&fx).await;

        let wrong_name = fx
            .reset
            .request_reset(ResetRequestInput {
                username: "eve".to_string(),
                email: "a@x.com".to_string(),
            })
            .await;
        assert!(matches!(wrong_name, Err(AuthError::PrincipalNotFound)));

        let wrong_email = fx
            .reset
            .request_reset(ResetRequestInput {
                username: "ada".to_string(),
                email: "eve@x.com".to_string(),
            })
            .await;
        assert!(matches!(wrong_email, Err(AuthError::PrincipalNotFound)));
    }

    #[tokio::test]
    async fn inactive_member_cannot_request_a_reset() {
        let fx = fixture();
        signed_up(&fx).await;
        let member = fx
            .member_repo
            .find_by_email("a@x.com")
            .await
            .unwrap()
            .unwrap();
        fx.member_repo.deactivate(member.member_id);

        let result = fx.reset.request_reset(verify_input()).await;
        assert!(matches!(result, Err(AuthError::InactiveAccount)));
    }

    #[tokio::test]
    async fn member_deleted_after_issue_fails_cleanly() {
        let fx = fixture();
        signed_up(&fx).await;

        let token = fx.reset.request_reset(verify_input()).await.unwrap();
        let member = fx
            .member_repo
            .find_by_email("a@x.com")
            .await
            .unwrap()
            .unwrap();
        fx.member_repo.remove(member.member_id);

        let result = fx.reset.reset_password(&token.0, "new-secret").await;
        assert!(matches!(result, Err(AuthError::PrincipalNotFound)));
    }
}
