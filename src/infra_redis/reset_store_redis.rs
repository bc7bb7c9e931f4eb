use crate::application_port::AuthError;
use crate::domain_port::ResetStore;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Script};

// GET+DEL in one script so two racing reset calls can never both consume
// the same token.
const RESET_CONSUME: &str = include_str!("reset_consume.lua");

const RESET_PREFIX: &str = "reset";

pub struct RedisResetStore {
    conn: ConnectionManager,
}

impl RedisResetStore {
    pub fn new(conn: ConnectionManager) -> Self {
        RedisResetStore { conn }
    }

    fn key(token: &str) -> String {
        format!("{}:{}", RESET_PREFIX, token)
    }
}

#[async_trait::async_trait]
impl ResetStore for RedisResetStore {
    async fn save(&self, token: &str, email: &str, ttl_secs: u64) -> Result<(), AuthError> {
        let key = Self::key(token);
        let mut conn = self.conn.clone();
        let _: () = conn
            .set_ex(&key, email, ttl_secs.max(1))
            .await
            .map_err(|e| AuthError::StoreUnavailable(e.to_string()))?;
        Ok(())
    }

    async fn consume(&self, token: &str) -> Result<Option<String>, AuthError> {
        let key = Self::key(token);
        let mut conn = self.conn.clone();
        let email: Option<String> = Script::new(RESET_CONSUME)
            .key(&key)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| AuthError::StoreUnavailable(e.to_string()))?;
        Ok(email)
    }
}
