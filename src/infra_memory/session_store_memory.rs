use crate::application_port::AuthError;
use crate::domain_model::MemberId;
use crate::domain_port::SessionStore;
use dashmap::DashMap;
use std::time::{Duration, Instant};

/// Process-local session store. Backs the `memory` backend and the test
/// suite; entries expire lazily on lookup.
pub struct MemorySessionStore {
    refresh: DashMap<String, (MemberId, Instant)>,
    blacklist: DashMap<String, Instant>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        MemorySessionStore {
            refresh: DashMap::new(),
            blacklist: DashMap::new(),
        }
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

fn deadline(ttl_secs: u64) -> Instant {
    Instant::now() + Duration::from_secs(ttl_secs)
}

#[async_trait::async_trait]
impl SessionStore for MemorySessionStore {
    async fn register_refresh(
        &self,
        token: &str,
        member_id: MemberId,
        ttl_secs: u64,
    ) -> Result<(), AuthError> {
        self.refresh
            .insert(token.to_string(), (member_id, deadline(ttl_secs)));
        Ok(())
    }

    async fn lookup_refresh(&self, token: &str) -> Result<Option<MemberId>, AuthError> {
        let expired = match self.refresh.get(token) {
            Some(entry) => {
                let (member_id, expires_at) = *entry.value();
                if Instant::now() < expires_at {
                    return Ok(Some(member_id));
                }
                true
            }
            None => false,
        };
        if expired {
            self.refresh.remove(token);
        }
        Ok(None)
    }

    async fn revoke_refresh(&self, token: &str) -> Result<(), AuthError> {
        self.refresh.remove(token);
        Ok(())
    }

    async fn blacklist(&self, token: &str, ttl_secs: u64) -> Result<(), AuthError> {
        self.blacklist.insert(token.to_string(), deadline(ttl_secs));
        Ok(())
    }

    async fn is_blacklisted(&self, token: &str) -> Result<bool, AuthError> {
        let expired = match self.blacklist.get(token) {
            Some(entry) => {
                if Instant::now() < *entry.value() {
                    return Ok(true);
                }
                true
            }
            None => false,
        };
        if expired {
            self.blacklist.remove(token);
        }
        Ok(false)
    }
}
