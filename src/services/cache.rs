//! In-process response cache for public competition reads.
//!
//! Entries are JSON values keyed by string and expire after a fixed TTL.
//! Admin status changes invalidate the affected keys immediately.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Key for the public list of approved competitions.
pub const COMPETITION_LIST_KEY: &str = "competitions:list";

/// Key for a single public competition.
pub fn competition_key(id: Uuid) -> String {
    format!("competition:{}", id)
}

#[derive(Debug)]
struct CacheEntry {
    stored_at: Instant,
    value: serde_json::Value,
}

/// Shared TTL cache; cheap to clone.
#[derive(Debug, Clone)]
pub struct ResponseCache {
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
    ttl: Duration,
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Fresh value for `key`, if any. Expired entries are left for `insert`
    /// or `invalidate` to overwrite.
    pub async fn get(&self, key: &str) -> Option<serde_json::Value> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|entry| entry.stored_at.elapsed() < self.ttl)
            .map(|entry| entry.value.clone())
    }

    pub async fn insert(&self, key: impl Into<String>, value: serde_json::Value) {
        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| entry.stored_at.elapsed() < self.ttl);
        entries.insert(
            key.into(),
            CacheEntry {
                stored_at: Instant::now(),
                value,
            },
        );
    }

    pub async fn invalidate(&self, key: &str) {
        if self.entries.write().await.remove(key).is_some() {
            tracing::debug!("Invalidated cache entry '{}'", key);
        }
    }

    /// Drop the detail entry for a competition and the public list.
    pub async fn invalidate_competition(&self, id: Uuid) {
        self.invalidate(&competition_key(id)).await;
        self.invalidate(COMPETITION_LIST_KEY).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_insert_then_get() {
        tokio_test::block_on(async {
            let cache = ResponseCache::new(Duration::from_secs(60));
            cache.insert(COMPETITION_LIST_KEY, json!([1, 2])).await;
            assert_eq!(cache.get(COMPETITION_LIST_KEY).await, Some(json!([1, 2])));
            assert_eq!(cache.get("missing").await, None);
        });
    }

    #[test]
    fn test_zero_ttl_never_serves() {
        tokio_test::block_on(async {
            let cache = ResponseCache::new(Duration::ZERO);
            cache.insert("k", json!(true)).await;
            assert_eq!(cache.get("k").await, None);
        });
    }

    #[tokio::test]
    async fn test_invalidate_competition_drops_detail_and_list() {
        let cache = ResponseCache::new(Duration::from_secs(60));
        let id = Uuid::new_v4();
        let other = Uuid::new_v4();
        cache.insert(competition_key(id), json!({"id": id})).await;
        cache.insert(competition_key(other), json!({"id": other})).await;
        cache.insert(COMPETITION_LIST_KEY, json!([])).await;

        cache.invalidate_competition(id).await;

        assert_eq!(cache.get(&competition_key(id)).await, None);
        assert_eq!(cache.get(COMPETITION_LIST_KEY).await, None);
        assert!(cache.get(&competition_key(other)).await.is_some());
    }

    #[tokio::test]
    async fn test_clones_share_entries() {
        let cache = ResponseCache::new(Duration::from_secs(60));
        let clone = cache.clone();
        clone.insert("k", json!(1)).await;
        assert_eq!(cache.get("k").await, Some(json!(1)));
    }
}
