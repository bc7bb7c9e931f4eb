use crate::application_port::AuthError;
use crate::domain_port::ResetStore;
use dashmap::DashMap;
use std::time::{Duration, Instant};

pub struct MemoryResetStore {
    entries: DashMap<String, (String, Instant)>,
}

impl MemoryResetStore {
    pub fn new() -> Self {
        MemoryResetStore {
            entries: DashMap::new(),
        }
    }

    /// Rewind a token's deadline so TTL behavior is testable without
    /// sleeping through the real window.
    #[cfg(test)]
    pub fn force_expire(&self, token: &str) {
        if let Some(mut entry) = self.entries.get_mut(token) {
            entry.value_mut().1 = Instant::now();
        }
    }
}

impl Default for MemoryResetStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ResetStore for MemoryResetStore {
    async fn save(&self, token: &str, email: &str, ttl_secs: u64) -> Result<(), AuthError> {
        self.entries.insert(
            token.to_string(),
            (
                email.to_string(),
                Instant::now() + Duration::from_secs(ttl_secs),
            ),
        );
        Ok(())
    }

    async fn consume(&self, token: &str) -> Result<Option<String>, AuthError> {
        // remove() is the single atomic step; an expired entry is dropped
        // on the way out
        match self.entries.remove(token) {
            Some((_, (email, expires_at))) if Instant::now() < expires_at => Ok(Some(email)),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn consume_is_exactly_once() {
        let store = MemoryResetStore::new();
        store.save("tok", "a@x.com", 60).await.unwrap();

        assert_eq!(
            store.consume("tok").await.unwrap(),
            Some("a@x.com".to_string())
        );
        assert_eq!(store.consume("tok").await.unwrap(), None);
    }

    #[tokio::test]
    async fn expired_entries_do_not_consume() {
        let store = MemoryResetStore::new();
        store.save("tok", "a@x.com", 60).await.unwrap();
        store.force_expire("tok");

        assert_eq!(store.consume("tok").await.unwrap(), None);
    }
}
