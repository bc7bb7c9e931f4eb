use crate::api::v1::{CookieSettings, SameSite};
use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_port::*;
use crate::infra_memory::*;
use crate::infra_mysql::*;
use crate::infra_redis::*;
use crate::logger::*;
use crate::settings::Settings;
use anyhow::Context;
use sqlx::{MySql, Pool};
use std::sync::Arc;
use std::time::Duration;

pub struct Server {
    pub auth_service: Arc<dyn AuthService>,
    pub reset_service: Arc<dyn PasswordResetService>,
    pub cookie_settings: Arc<CookieSettings>,
    pool: Option<Pool<MySql>>,
}

impl Server {
    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        let cookie_settings = Arc::new(CookieSettings {
            http_only: settings.cookie.http_only,
            secure: settings.cookie.secure,
            same_site: settings
                .cookie
                .same_site
                .parse::<SameSite>()
                .context("cookie.same_site")?,
        });

        let signing_key = std::env::var("JWT_SIGNING_KEY")
            .unwrap_or_else(|_| settings.jwt.secret.clone())
            .into_bytes();
        let token_codec: Arc<dyn TokenCodec> = Arc::new(JwtHs256Codec::new(&signing_key));
        let policy = TokenPolicy {
            access_ttl: Duration::from_secs(settings.jwt.access_ttl_secs),
            refresh_ttl: Duration::from_secs(settings.jwt.refresh_ttl_secs),
        };
        let credential_hasher: Arc<dyn CredentialHasher> = Arc::new(Argon2PasswordHasher);

        let server = match settings.auth.backend.as_str() {
            "real" => {
                let redis_client = redis::Client::open(settings.redis.dsn.as_str())?;
                let redis_manager = redis_client.get_connection_manager().await?;
                let session_store: Arc<dyn SessionStore> =
                    Arc::new(RedisSessionStore::new(redis_manager.clone()));
                let reset_store: Arc<dyn ResetStore> =
                    Arc::new(RedisResetStore::new(redis_manager));

                let pool = Pool::<MySql>::connect(&settings.mysql.dsn).await?;
                let member_repo: Arc<dyn MemberRepo> =
                    Arc::new(MySqlMemberRepo::new(pool.clone()));

                let auth_service: Arc<dyn AuthService> = Arc::new(RealAuthService::new(
                    member_repo.clone(),
                    credential_hasher.clone(),
                    token_codec,
                    session_store,
                    policy,
                ));
                let reset_service: Arc<dyn PasswordResetService> = Arc::new(
                    RealPasswordResetService::new(member_repo, credential_hasher, reset_store),
                );

                Self {
                    auth_service,
                    reset_service,
                    cookie_settings,
                    pool: Some(pool),
                }
            }
            // no MySQL or Redis: state lives and dies with the process
            "memory" => {
                let member_repo: Arc<dyn MemberRepo> = Arc::new(MemoryMemberRepo::new());
                let session_store: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::new());
                let reset_store: Arc<dyn ResetStore> = Arc::new(MemoryResetStore::new());

                let auth_service: Arc<dyn AuthService> = Arc::new(RealAuthService::new(
                    member_repo.clone(),
                    credential_hasher.clone(),
                    token_codec,
                    session_store,
                    policy,
                ));
                let reset_service: Arc<dyn PasswordResetService> = Arc::new(
                    RealPasswordResetService::new(member_repo, credential_hasher, reset_store),
                );

                Self::from_parts(auth_service, reset_service, cookie_settings)
            }
            "fake" => {
                let member_repo: Arc<dyn MemberRepo> = Arc::new(MemoryMemberRepo::new());
                let reset_service: Arc<dyn PasswordResetService> =
                    Arc::new(RealPasswordResetService::new(
                        member_repo,
                        credential_hasher,
                        Arc::new(MemoryResetStore::new()),
                    ));
                Self::from_parts(
                    Arc::new(FakeAuthService::new()),
                    reset_service,
                    cookie_settings,
                )
            }
            other => return Err(anyhow::anyhow!("Unknown auth backend: {}", other)),
        };

        info!("server started");
        Ok(server)
    }

    pub fn from_parts(
        auth_service: Arc<dyn AuthService>,
        reset_service: Arc<dyn PasswordResetService>,
        cookie_settings: Arc<CookieSettings>,
    ) -> Self {
        Self {
            auth_service,
            reset_service,
            cookie_settings,
            pool: None,
        }
    }

    pub async fn shutdown(&self) {
        info!("server shutting down...");
        if let Some(pool) = &self.pool {
            pool.close().await;
        }
    }
}
