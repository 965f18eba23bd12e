//! Pluggable result cache (spec §3 "Cache", §4.3 "Caching"): TTL-aware,
//! with on-read decay so a value's advertised TTL always reflects how much
//! longer it's actually good for. Grounded in the teacher's `src/cache.rs`
//! (`DashMap`-backed store) and `src/cache/redis_backend.rs` (the
//! `CacheBackend` trait plus a Redis-backed implementation for multi-process
//! deployments).

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;

/// A cached answer plus the bookkeeping needed to decay its TTL on read.
#[derive(Clone, Debug)]
pub struct CachedEntry {
    pub payload: Value,
    inserted: Instant,
    ttl: Duration,
}

impl CachedEntry {
    pub fn new(payload: Value, ttl_seconds: u32) -> Self {
        Self {
            payload,
            inserted: Instant::now(),
            ttl: Duration::from_secs(ttl_seconds as u64),
        }
    }

    /// Seconds of TTL remaining as of now, or `None` if expired.
    pub fn remaining_ttl_seconds(&self) -> Option<u32> {
        let elapsed = self.inserted.elapsed();
        if elapsed >= self.ttl {
            return None;
        }
        Some((self.ttl - elapsed).as_secs() as u32)
    }
}

/// Wraps raw bytes (TXT segments, CERT/TLSA rdata blobs) in the
/// `{"type":"Buffer","data":[...]}` envelope so string-only cache
/// backends like Redis can round-trip them as plain JSON.
pub fn to_buffer_json(bytes: &[u8]) -> Value {
    serde_json::json!({ "type": "Buffer", "data": bytes })
}

pub fn from_buffer_json(value: &Value) -> Option<Vec<u8>> {
    let data = value.get("data")?.as_array()?;
    data.iter()
        .map(|n| n.as_u64().map(|b| b as u8))
        .collect()
}

#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> Option<CachedEntry>;
    async fn set(&self, key: &str, entry: CachedEntry, ttl_seconds: u32);
    async fn purge(&self, key: &str);
    async fn clear(&self);
}

/// The default, in-process backend. Expired entries are evicted lazily on
/// the next `get` that observes them rather than via a background sweep.
#[derive(Default)]
pub struct MemoryCache {
    entries: DashMap<String, CachedEntry>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheBackend for MemoryCache {
    async fn get(&self, key: &str) -> Option<CachedEntry> {
        let expired = match self.entries.get(key) {
            Some(entry) => entry.remaining_ttl_seconds().is_none(),
            None => return None,
        };
        if expired {
            self.entries.remove(key);
            return None;
        }
        self.entries.get(key).map(|e| e.clone())
    }

    async fn set(&self, key: &str, entry: CachedEntry, _ttl_seconds: u32) {
        self.entries.insert(key.to_string(), entry);
    }

    async fn purge(&self, key: &str) {
        self.entries.remove(key);
    }

    async fn clear(&self) {
        self.entries.clear();
    }
}

/// A Redis-backed cache for deployments sharing results across processes.
/// Values are stored as JSON strings with Redis's own `EX` expiry, so the
/// on-read decay `CachedEntry` otherwise provides is approximated by the
/// TTL Redis reports back to us.
pub struct RedisCache {
    conn: redis::aio::ConnectionManager,
}

impl RedisCache {
    pub async fn connect(url: &str) -> crate::error::Result<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| crate::error::DnsError::new(crate::error::ErrorCode::BadResp, e.to_string()))?;
        let conn = client
            .get_connection_manager()
            .await
            .map_err(|e| crate::error::DnsError::new(crate::error::ErrorCode::ConnRefused, e.to_string()))?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl CacheBackend for RedisCache {
    async fn get(&self, key: &str) -> Option<CachedEntry> {
        use redis::AsyncCommands;
        let mut conn = self.conn.clone();
        let (payload, ttl): (Option<String>, i64) = redis::pipe()
            .get(key)
            .ttl(key)
            .query_async(&mut conn)
            .await
            .ok()?;
        let payload = payload?;
        if ttl <= 0 {
            return None;
        }
        let value: Value = serde_json::from_str(&payload).ok()?;
        Some(CachedEntry::new(value, ttl as u32))
    }

    async fn set(&self, key: &str, entry: CachedEntry, ttl_seconds: u32) {
        use redis::AsyncCommands;
        let mut conn = self.conn.clone();
        if let Ok(serialized) = serde_json::to_string(&entry.payload) {
            let _: Result<(), redis::RedisError> =
                conn.set_ex(key, serialized, ttl_seconds.max(1) as u64).await;
        }
    }

    async fn purge(&self, key: &str) {
        use redis::AsyncCommands;
        let mut conn = self.conn.clone();
        let _: Result<(), redis::RedisError> = conn.del(key).await;
    }

    async fn clear(&self) {
        // Deliberately not implemented: a shared Redis instance may back
        // other keyspaces, so a blanket FLUSHDB would be destructive.
    }
}

/// Builds the cache key for `(name, rrtype[, ecsSubnet])`:
/// `rrtype.toLowerCase():[ecsSubnet:]name.toLowerCase()` (spec §4.3
/// "Caching"), so an external caller that knows the convention can
/// pre-seed (or spoof) an entry for a given name/rrtype pair.
pub fn cache_key(name: &str, rrtype: &str, ecs_subnet: Option<&str>) -> String {
    let name = name.to_ascii_lowercase();
    let name = name.trim_end_matches('.');
    match ecs_subnet {
        Some(ecs) => format!("{}:{}:{}", rrtype.to_ascii_lowercase(), ecs, name),
        None => format!("{}:{}", rrtype.to_ascii_lowercase(), name),
    }
}

pub type SharedCache = Arc<dyn CacheBackend>;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_cache_round_trips() {
        let cache = MemoryCache::new();
        let entry = CachedEntry::new(serde_json::json!(["1.2.3.4"]), 60);
        cache.set("example.com|A", entry, 60).await;
        let fetched = cache.get("example.com|A").await.unwrap();
        assert_eq!(fetched.payload, serde_json::json!(["1.2.3.4"]));
    }

    #[tokio::test]
    async fn memory_cache_expires_entries() {
        let cache = MemoryCache::new();
        let entry = CachedEntry::new(serde_json::json!(["1.2.3.4"]), 0);
        cache.set("example.com|A", entry, 0).await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(cache.get("example.com|A").await.is_none());
    }

    #[tokio::test]
    async fn purge_removes_entry() {
        let cache = MemoryCache::new();
        cache
            .set("example.com|A", CachedEntry::new(serde_json::json!([]), 60), 60)
            .await;
        cache.purge("example.com|A").await;
        assert!(cache.get("example.com|A").await.is_none());
    }

    #[test]
    fn buffer_envelope_round_trips() {
        let bytes = vec![1u8, 2, 3];
        let json = to_buffer_json(&bytes);
        assert_eq!(from_buffer_json(&json).unwrap(), bytes);
    }

    #[test]
    fn cache_key_is_case_and_trailing_dot_insensitive() {
        assert_eq!(
            cache_key("Example.com.", "A", None),
            cache_key("example.com", "A", None)
        );
    }

    #[test]
    fn cache_key_matches_the_spec_convention() {
        assert_eq!(cache_key("forwardemail.net", "TXT", None), "txt:forwardemail.net");
        assert_eq!(cache_key("forwardemail.net", "MX", None), "mx:forwardemail.net");
    }

    #[test]
    fn cache_key_inserts_ecs_subnet_between_rrtype_and_name() {
        assert_eq!(
            cache_key("example.com", "A", Some("1.2.3.0/24")),
            "a:1.2.3.0/24:example.com"
        );
    }
}
