use crate::application_port::{
    AccessGrant, AccessToken, AuthContext, AuthError, AuthService, AuthTokens, CredentialHasher,
    LoginInput, LoginResult, RefreshToken, RegisterInput, TokenCodec,
};
use crate::domain_model::{MemberId, Role};
use crate::domain_port::{MemberRepo, SessionStore};
use argon2::password_hash::rand_core::{OsRng, RngCore};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

pub const TOKEN_TYPE_ACCESS: &str = "access";

/// Opaque credential: 32 bytes of OS randomness, hex-encoded. Refresh and
/// reset tokens carry no structure on purpose; their validity lives
/// entirely in the store.
pub fn opaque_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[derive(Debug, Clone)]
pub struct TokenPolicy {
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

pub struct RealAuthService {
    member_repo: Arc<dyn MemberRepo>,
    credential_hasher: Arc<dyn CredentialHasher>,
    token_codec: Arc<dyn TokenCodec>,
    session_store: Arc<dyn SessionStore>,
    policy: TokenPolicy,
    min_username_len: usize,
    min_password_len: usize,
}

impl RealAuthService {
    pub fn new(
        member_repo: Arc<dyn MemberRepo>,
        credential_hasher: Arc<dyn CredentialHasher>,
        token_codec: Arc<dyn TokenCodec>,
        session_store: Arc<dyn SessionStore>,
        policy: TokenPolicy,
    ) -> Self {
        Self {
            member_repo,
            credential_hasher,
            token_codec,
            session_store,
            policy,
            min_username_len: 2,
            min_password_len: 6,
        }
    }

    fn validate_registration(
        &self,
        email: &str,
        username: &str,
        password: &str,
    ) -> Result<(), AuthError> {
        if !email.contains('@') {
            return Err(AuthError::Validation("email is malformed".to_string()));
        }
        if username.chars().count() < self.min_username_len {
            return Err(AuthError::Validation("username too short".to_string()));
        }
        if password.chars().count() < self.min_password_len {
            return Err(AuthError::Validation("password too short".to_string()));
        }
        Ok(())
    }

    fn issue_access_token(
        &self,
        member_id: MemberId,
    ) -> Result<(AccessToken, DateTime<Utc>), AuthError> {
        let (token, expires_at) = self.token_codec.issue(
            &member_id.to_string(),
            Some(TOKEN_TYPE_ACCESS),
            self.policy.access_ttl,
        )?;
        Ok((AccessToken(token), expires_at))
    }

    async fn issue_refresh_token(
        &self,
        member_id: MemberId,
    ) -> Result<(RefreshToken, DateTime<Utc>), AuthError> {
        let token = opaque_token();
        let ttl = self.policy.refresh_ttl;
        self.session_store
            .register_refresh(&token, member_id, ttl.as_secs().max(1))
            .await?;
        Ok((RefreshToken(token), Utc::now() + ttl))
    }
}

#[async_trait::async_trait]
impl AuthService for RealAuthService {
    async fn register(&self, request: RegisterInput) -> Result<MemberId, AuthError> {
        let RegisterInput {
            email,
            username,
            password,
        } = request;

        self.validate_registration(&email, &username, &password)?;

        if self.member_repo.email_exists(&email).await? {
            return Err(AuthError::EmailTaken);
        }

        let member_id = MemberId(Uuid::new_v4());
        let password_hash = self.credential_hasher.hash_password(&password).await?;
        self.member_repo
            .create(member_id, &email, &username, &password_hash, Role::User)
            .await?;

        info!(%member_id, "member registered");
        Ok(member_id)
    }

    async fn login(&self, request: LoginInput) -> Result<LoginResult, AuthError> {
        let LoginInput { email, password } = request;

        let rec = self
            .member_repo
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::PrincipalNotFound)?;

        if !rec.is_active {
            return Err(AuthError::InactiveAccount);
        }

        let ok = self
            .credential_hasher
            .verify_password(&password, &rec.password_hash)
            .await?;
        if !ok {
            return Err(AuthError::InvalidCredential);
        }

        // Two effects, no transaction: if registering the refresh token
        // fails the minted access token stays valid for its short natural
        // lifetime, but the caller must not treat the member as logged in.
        let (access_token, access_exp) = self.issue_access_token(rec.member_id)?;
        let (refresh_token, refresh_exp) = self.issue_refresh_token(rec.member_id).await?;

        Ok(LoginResult {
            member_id: rec.member_id,
            tokens: AuthTokens {
                access_token,
                refresh_token,
                access_token_expires_at: access_exp,
                refresh_token_expires_at: refresh_exp,
            },
        })
    }

    async fn validate_access(&self, access_token: &str) -> Result<MemberId, AuthError> {
        // Blacklist membership is authoritative; check it before touching
        // the signature so a freshly revoked token cannot race past.
        if self.session_store.is_blacklisted(access_token).await? {
            warn!("revoked access token presented");
            return Err(AuthError::Blacklisted);
        }

        let claims = self.token_codec.verify(access_token)?;
        if claims.token_type.as_deref() != Some(TOKEN_TYPE_ACCESS) {
            return Err(AuthError::InvalidSignature);
        }

        claims
            .subject
            .parse::<MemberId>()
            .map_err(|_| AuthError::InvalidSignature)
    }

    async fn authenticate(&self, access_token: &str) -> Result<AuthContext, AuthError> {
        let member_id = self.validate_access(access_token).await?;

        let rec = self
            .member_repo
            .find_by_id(member_id)
            .await?
            .ok_or(AuthError::PrincipalNotFound)?;
        if !rec.is_active {
            return Err(AuthError::InactiveAccount);
        }

        Ok(AuthContext {
            member_id,
            role: rec.role,
        })
    }

    async fn refresh(&self, refresh_token: &str) -> Result<AccessGrant, AuthError> {
        let member_id = self
            .session_store
            .lookup_refresh(refresh_token)
            .await?
            .ok_or(AuthError::InvalidRefreshToken)?;

        // The refresh token itself is left registered: no rotation-on-use.
        let (access_token, access_exp) = self.issue_access_token(member_id)?;
        Ok(AccessGrant {
            access_token,
            access_token_expires_at: access_exp,
        })
    }

    async fn logout(
        &self,
        access_token: &str,
        refresh_token: Option<&str>,
    ) -> Result<(), AuthError> {
        // Remaining lifetime from the expiry claim; an already-expired
        // token needs no blacklist entry, the expiry check covers it.
        let expires_at = self.token_codec.decode_expiry(access_token)?;
        let remaining = (expires_at - Utc::now()).num_seconds();
        if remaining > 0 {
            self.session_store
                .blacklist(access_token, remaining as u64)
                .await?;
        }

        if let Some(refresh_token) = refresh_token {
            self.session_store.revoke_refresh(refresh_token).await?;
        }

        info!("session terminated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application_impl::{Argon2PasswordHasher, JwtHs256Codec};
    use crate::infra_memory::{MemoryMemberRepo, MemorySessionStore};

    const SECRET: &[u8] = b"auth-service-test-key";

    struct Fixture {
        service: RealAuthService,
        member_repo: Arc<MemoryMemberRepo>,
        session_store: Arc<MemorySessionStore>,
    }

    fn fixture() -> Fixture {
        fixture_with_ttls(Duration::from_secs(3600), Duration::from_secs(86400))
    }

    fn fixture_with_ttls(access_ttl: Duration, refresh_ttl: Duration) -> Fixture {
        let member_repo = Arc::new(MemoryMemberRepo::new());
        let session_store = Arc::new(MemorySessionStore::new());
        let service = RealAuthService::new(
            member_repo.clone(),
            Arc::new(Argon2PasswordHasher),
            Arc::new(JwtHs256Codec::new(SECRET)),
            session_store.clone(),
            TokenPolicy {
                access_ttl,
                refresh_ttl,
            },
        );
        Fixture {
            service,
            member_repo,
            session_store,
        }
    }

    async fn signed_up(fx: &Fixture) -> MemberId {
        fx.service
            .register(RegisterInput {
                email: "a@x.com".to_string(),
                username: "ada".to_string(),
                password: "secret".to_string(),
            })
            .await
            .unwrap()
    }

    fn login_input() -> LoginInput {
        LoginInput {
            email: "a@x.com".to_string(),
            password: "secret".to_string(),
        }
    }

    #[tokio::test]
    async fn login_roundtrip() {
        let fx = fixture();
        let member_id = signed_up(&fx).await;

        let result = fx.service.login(login_input()).await.unwrap();
        assert_eq!(result.member_id, member_id);

        let resolved = fx
            .service
            .validate_access(&result.tokens.access_token.0)
            .await
            .unwrap();
        assert_eq!(resolved, member_id);
    }

    #[tokio::test]
    async fn login_rejections() {
        let fx = fixture();
        signed_up(&fx).await;

        let unknown = fx
            .service
            .login(LoginInput {
                email: "nobody@x.com".to_string(),
                password: "secret".to_string(),
            })
            .await;
        assert!(matches!(unknown, Err(AuthError::PrincipalNotFound)));

        let wrong_password = fx
            .service
            .login(LoginInput {
                email: "a@x.com".to_string(),
                password: "not-the-secret".to_string(),
            })
            .await;
        assert!(matches!(wrong_password, Err(AuthError::InvalidCredential)));
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let fx = fixture();
        signed_up(&fx).await;

        let again = fx
            .service
            .register(RegisterInput {
                email: "a@x.com".to_string(),
                username: "other".to_string(),
                password: "secret2".to_string(),
            })
            .await;
        assert!(matches!(again, Err(AuthError::EmailTaken)));
    }

    #[tokio::test]
    async fn refresh_is_reusable_and_mints_distinct_tokens() {
        let fx = fixture();
        signed_up(&fx).await;
        let login = fx.service.login(login_input()).await.unwrap();
        let refresh_token = &login.tokens.refresh_token.0;

        let first = fx.service.refresh(refresh_token).await.unwrap();
        let second = fx.service.refresh(refresh_token).await.unwrap();
        assert_ne!(first.access_token.0, second.access_token.0);

        for grant in [&first, &second] {
            let resolved = fx
                .service
                .validate_access(&grant.access_token.0)
                .await
                .unwrap();
            assert_eq!(resolved, login.member_id);
        }
    }

    #[tokio::test]
    async fn logout_revokes_both_credentials() {
        let fx = fixture();
        signed_up(&fx).await;
        let login = fx.service.login(login_input()).await.unwrap();
        let access = login.tokens.access_token.0.clone();
        let refresh = login.tokens.refresh_token.0.clone();

        fx.service.validate_access(&access).await.unwrap();
        fx.service.logout(&access, Some(&refresh)).await.unwrap();

        // signature and expiry are still individually valid; only the
        // blacklist makes the token dead
        assert!(matches!(
            fx.service.validate_access(&access).await,
            Err(AuthError::Blacklisted)
        ));
        assert!(matches!(
            fx.service.refresh(&refresh).await,
            Err(AuthError::InvalidRefreshToken)
        ));

        // revoking an already-gone refresh entry stays idempotent
        fx.service.logout(&access, Some(&refresh)).await.unwrap();
    }

    #[tokio::test]
    async fn logout_of_expired_access_token_skips_blacklist() {
        let fx = fixture_with_ttls(Duration::from_secs(0), Duration::from_secs(86400));
        signed_up(&fx).await;
        let login = fx.service.login(login_input()).await.unwrap();
        let access = login.tokens.access_token.0.clone();

        fx.service.logout(&access, None).await.unwrap();
        assert!(!fx.session_store.is_blacklisted(&access).await.unwrap());
    }

    #[tokio::test]
    async fn blacklist_is_checked_before_the_signature() {
        let fx = fixture();
        fx.session_store
            .blacklist("not-even-a-jwt", 60)
            .await
            .unwrap();

        assert!(matches!(
            fx.service.validate_access("not-even-a-jwt").await,
            Err(AuthError::Blacklisted)
        ));
    }

    #[tokio::test]
    async fn inactive_account_cannot_login_but_outstanding_tokens_survive() {
        let fx = fixture();
        let member_id = signed_up(&fx).await;
        let login = fx.service.login(login_input()).await.unwrap();

        fx.member_repo.deactivate(member_id);

        assert!(matches!(
            fx.service.login(login_input()).await,
            Err(AuthError::InactiveAccount)
        ));

        // deactivation does not retroactively blacklist: the token itself
        // still validates until natural expiry...
        let resolved = fx
            .service
            .validate_access(&login.tokens.access_token.0)
            .await
            .unwrap();
        assert_eq!(resolved, member_id);

        // ...but the gate's principal resolution stops the member
        assert!(matches!(
            fx.service.authenticate(&login.tokens.access_token.0).await,
            Err(AuthError::InactiveAccount)
        ));
    }

    #[tokio::test]
    async fn authenticate_attaches_the_role() {
        let fx = fixture();
        let member_id = signed_up(&fx).await;
        let login = fx.service.login(login_input()).await.unwrap();

        let context = fx
            .service
            .authenticate(&login.tokens.access_token.0)
            .await
            .unwrap();
        assert_eq!(context.member_id, member_id);
        assert_eq!(context.role, Role::User);
    }

    #[tokio::test]
    async fn end_to_end_session_lifecycle() {
        let fx = fixture();
        signed_up(&fx).await;

        let login = fx.service.login(login_input()).await.unwrap();
        let access = login.tokens.access_token.0.clone();
        let refresh = login.tokens.refresh_token.0.clone();

        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(
            fx.service.validate_access(&access).await.unwrap(),
            login.member_id
        );

        fx.service.logout(&access, Some(&refresh)).await.unwrap();
        assert!(matches!(
            fx.service.validate_access(&access).await,
            Err(AuthError::Blacklisted)
        ));
        assert!(matches!(
            fx.service.refresh(&refresh).await,
            Err(AuthError::InvalidRefreshToken)
        ));
    }

    struct DownSessionStore;

    #[async_trait::async_trait]
    impl SessionStore for DownSessionStore {
        async fn register_refresh(
            &self,
            _token: &str,
            _member_id: MemberId,
            _ttl_secs: u64,
        ) -> Result<(), AuthError> {
            Err(AuthError::StoreUnavailable("connection refused".to_string()))
        }

        async fn lookup_refresh(&self, _token: &str) -> Result<Option<MemberId>, AuthError> {
            Err(AuthError::StoreUnavailable("connection refused".to_string()))
        }

        async fn revoke_refresh(&self, _token: &str) -> Result<(), AuthError> {
            Err(AuthError::StoreUnavailable("connection refused".to_string()))
        }

        async fn blacklist(&self, _token: &str, _ttl_secs: u64) -> Result<(), AuthError> {
            Err(AuthError::StoreUnavailable("connection refused".to_string()))
        }

        async fn is_blacklisted(&self, _token: &str) -> Result<bool, AuthError> {
            Err(AuthError::StoreUnavailable("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn store_outage_is_not_a_rejection() {
        let member_repo = Arc::new(MemoryMemberRepo::new());
        let service = RealAuthService::new(
            member_repo.clone(),
            Arc::new(Argon2PasswordHasher),
            Arc::new(JwtHs256Codec::new(SECRET)),
            Arc::new(DownSessionStore),
            TokenPolicy {
                access_ttl: Duration::from_secs(3600),
                refresh_ttl: Duration::from_secs(86400),
            },
        );

        service
            .register(RegisterInput {
                email: "a@x.com".to_string(),
                username: "ada".to_string(),
                password: "secret".to_string(),
            })
            .await
            .unwrap();

        // refresh registration fails after the access token was minted:
        // the member must not come out of login() holding a session
        assert!(matches!(
            service.login(login_input()).await,
            Err(AuthError::StoreUnavailable(_))
        ));

        // an outage is distinguishable from a rejected credential
        assert!(matches!(
            service.validate_access("whatever").await,
            Err(AuthError::StoreUnavailable(_))
        ));
    }
}
