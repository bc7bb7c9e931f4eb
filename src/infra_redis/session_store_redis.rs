use crate::application_port::AuthError;
use crate::domain_model::MemberId;
use crate::domain_port::SessionStore;
use redis::aio::ConnectionManager;
use redis::{
    AsyncCommands, FromRedisValue, RedisError, RedisResult, RedisWrite, ToRedisArgs, Value,
};

// Key namespaces are shared with every instance of the service; the store
// is the single source of truth for revocation.
const REFRESH_PREFIX: &str = "refresh";
const BLACKLIST_PREFIX: &str = "blacklist";

const BLACKLIST_MARKER: &str = "logout";

pub struct RedisSessionStore {
    conn: ConnectionManager,
}

impl RedisSessionStore {
    pub fn new(conn: ConnectionManager) -> Self {
        RedisSessionStore { conn }
    }

    fn refresh_key(token: &str) -> String {
        format!("{}:{}", REFRESH_PREFIX, token)
    }

    fn blacklist_key(token: &str) -> String {
        format!("{}:{}", BLACKLIST_PREFIX, token)
    }
}

impl ToRedisArgs for MemberId {
    fn write_redis_args<W>(&self, out: &mut W)
    where
        W: ?Sized + RedisWrite,
    {
        out.write_arg(self.to_string().as_bytes())
    }
}

impl FromRedisValue for MemberId {
    fn from_redis_value(v: &Value) -> RedisResult<Self> {
        let s: String = redis::from_redis_value(v)?;
        let member_id = s.parse::<MemberId>().map_err(|e| {
            RedisError::from((
                redis::ErrorKind::TypeError,
                "invalid MemberId string",
                e.to_string(),
            ))
        })?;
        Ok(member_id)
    }
}

#[async_trait::async_trait]
impl SessionStore for RedisSessionStore {
    async fn register_refresh(
        &self,
        token: &str,
        member_id: MemberId,
        ttl_secs: u64,
    ) -> Result<(), AuthError> {
        let key = Self::refresh_key(token);
        let mut conn = self.conn.clone();
        let _: () = conn
            .set_ex(&key, &member_id, ttl_secs.max(1))
            .await
            .map_err(|e| AuthError::StoreUnavailable(e.to_string()))?;
        Ok(())
    }

    async fn lookup_refresh(&self, token: &str) -> Result<Option<MemberId>, AuthError> {
        let key = Self::refresh_key(token);
        let mut conn = self.conn.clone();
        let member_id: Option<MemberId> = conn
            .get(&key)
            .await
            .map_err(|e| AuthError::StoreUnavailable(e.to_string()))?;
        Ok(member_id)
    }

    async fn revoke_refresh(&self, token: &str) -> Result<(), AuthError> {
        let key = Self::refresh_key(token);
        let mut conn = self.conn.clone();
        let _: () = conn
            .del(&key)
            .await
            .map_err(|e| AuthError::StoreUnavailable(e.to_string()))?;
        Ok(())
    }

    async fn blacklist(&self, token: &str, ttl_secs: u64) -> Result<(), AuthError> {
        let key = Self::blacklist_key(token);
        let mut conn = self.conn.clone();
        let _: () = conn
            .set_ex(&key, BLACKLIST_MARKER, ttl_secs.max(1))
            .await
            .map_err(|e| AuthError::StoreUnavailable(e.to_string()))?;
        Ok(())
    }

    async fn is_blacklisted(&self, token: &str) -> Result<bool, AuthError> {
        let key = Self::blacklist_key(token);
        let mut conn = self.conn.clone();
        let present: bool = conn
            .exists(&key)
            .await
            .map_err(|e| AuthError::StoreUnavailable(e.to_string()))?;
        Ok(present)
    }
}
