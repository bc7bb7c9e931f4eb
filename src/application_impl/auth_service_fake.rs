use crate::application_port::*;
use crate::domain_model::{MemberId, Role};
use chrono::{Duration, Utc};

#[derive(Debug)]
pub struct FakeAuthService;

impl FakeAuthService {
    pub fn new() -> Self {
        Self
    }
}

// Minimal fake implementation for basic use only.
// Extend to simulate more error cases and configurable responses when needed.
#[async_trait::async_trait]
impl AuthService for FakeAuthService {
    async fn register(&self, request: RegisterInput) -> Result<MemberId, AuthError> {
        Ok(fake_id(&request.email))
    }

    async fn login(&self, request: LoginInput) -> Result<LoginResult, AuthError> {
        Ok(LoginResult {
            member_id: fake_id(&request.email),
            tokens: fake_tokens(&request.email),
        })
    }

    async fn validate_access(&self, access_token: &str) -> Result<MemberId, AuthError> {
        if let Some(email) = access_token.strip_prefix("fake-access-token:") {
            Ok(fake_id(email))
        } else {
            Err(AuthError::InvalidSignature)
        }
    }

    async fn authenticate(&self, access_token: &str) -> Result<AuthContext, AuthError> {
        let member_id = self.validate_access(access_token).await?;
        Ok(AuthContext {
            member_id,
            role: Role::User,
        })
    }

    async fn refresh(&self, refresh_token: &str) -> Result<AccessGrant, AuthError> {
        if let Some(email) = refresh_token.strip_prefix("fake-refresh-token:") {
            let tokens = fake_tokens(email);
            Ok(AccessGrant {
                access_token: tokens.access_token,
                access_token_expires_at: tokens.access_token_expires_at,
            })
        } else {
            Err(AuthError::InvalidRefreshToken)
        }
    }

    async fn logout(
        &self,
        _access_token: &str,
        _refresh_token: Option<&str>,
    ) -> Result<(), AuthError> {
        Ok(())
    }
}

fn fake_id(email: &str) -> MemberId {
    MemberId(uuid::Uuid::new_v5(
        &uuid::Uuid::NAMESPACE_OID,
        email.as_bytes(),
    ))
}

fn fake_tokens(email: &str) -> AuthTokens {
    let now = Utc::now();
    AuthTokens {
        access_token: AccessToken(format!("fake-access-token:{}", email)),
        access_token_expires_at: now + Duration::hours(1),
        refresh_token: RefreshToken(format!("fake-refresh-token:{}", email)),
        refresh_token_expires_at: now + Duration::days(14),
    }
}
