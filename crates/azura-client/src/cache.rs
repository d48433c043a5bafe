//! Two storage tiers behind the provider.
//!
//! The ephemeral cache is a plain in-process map with a fixed TTL; the
//! fallback slot is one JSON file holding the whole last successful
//! [`HistoryResult`], overwritten wholesale. The file is the single
//! canonical persisted shape; anything unreadable in it reads as "nothing
//! persisted".

use crate::model::HistoryResult;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// How long a fetched result stays valid in the ephemeral cache.
pub const CACHE_TTL: Duration = Duration::from_secs(300);

/// Stable key over (normalized host, clamped count).
pub fn cache_key(host: &str, count: usize) -> u64 {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};
    let mut h = DefaultHasher::new();
    host.hash(&mut h);
    count.hash(&mut h);
    h.finish()
}

/// Short-TTL in-process cache, the fast path before any network call.
pub struct EphemeralCache {
    ttl: Duration,
    entries: HashMap<u64, (Instant, HistoryResult)>,
}

impl EphemeralCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    /// An expired entry is removed on lookup, not just skipped.
    pub fn get(&mut self, key: u64) -> Option<&HistoryResult> {
        let expired = match self.entries.get(&key) {
            Some((stored_at, _)) => stored_at.elapsed() >= self.ttl,
            None => return None,
        };
        if expired {
            self.entries.remove(&key);
            return None;
        }
        self.entries.get(&key).map(|(_, result)| result)
    }

    pub fn insert(&mut self, key: u64, result: HistoryResult) {
        self.entries.insert(key, (Instant::now(), result));
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Durable single-slot storage for the last successful fetch.
pub struct FallbackSlot {
    path: PathBuf,
}

impl FallbackSlot {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Never fails: a missing, unreadable, or legacy-format file all read
    /// as `None`.
    pub fn load(&self) -> Option<HistoryResult> {
        let content = std::fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&content) {
            Ok(result) => Some(result),
            Err(e) => {
                warn!("fallback slot at {} is unreadable: {}", self.path.display(), e);
                None
            }
        }
    }

    pub async fn store(&self, result: &HistoryResult) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string(result)?;
        tokio::fs::write(&self.path, content).await?;
        debug!("persisted fallback snapshot ({} songs)", result.count);
        Ok(())
    }

    /// Removing an absent file is a no-op, not an error.
    pub async fn clear(&self) -> anyhow::Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{normalize_song, HistoryResult};
    use serde_json::json;

    fn sample_result() -> HistoryResult {
        HistoryResult {
            station: json!({"name": "Test FM", "shortcode": "test_fm"}),
            live: Default::default(),
            now_playing: Some(normalize_song(&json!({"song": {"title": "A", "artist": "B"}}))),
            song_history: vec![normalize_song(&json!({"song": {"title": "A", "artist": "B"}}))],
            timestamp: 1700000000,
            count: 1,
        }
    }

    #[test]
    fn test_cache_key_stable_and_count_sensitive() {
        assert_eq!(cache_key("radio.example.com", 10), cache_key("radio.example.com", 10));
        assert_ne!(cache_key("radio.example.com", 10), cache_key("radio.example.com", 11));
        assert_ne!(cache_key("radio.example.com", 10), cache_key("other.example.com", 10));
    }

    #[test]
    fn test_cache_insert_get_clear() {
        let mut cache = EphemeralCache::new(CACHE_TTL);
        let key = cache_key("radio.example.com", 10);
        assert!(cache.get(key).is_none());

        cache.insert(key, sample_result());
        assert_eq!(cache.get(key).unwrap().count, 1);

        cache.clear();
        assert!(cache.get(key).is_none());
    }

    #[test]
    fn test_cache_zero_ttl_expires_immediately() {
        let mut cache = EphemeralCache::new(Duration::ZERO);
        let key = cache_key("radio.example.com", 10);
        cache.insert(key, sample_result());
        assert!(cache.get(key).is_none());
    }

    #[tokio::test]
    async fn test_fallback_slot_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let slot = FallbackSlot::new(dir.path().join("history.json"));

        assert!(slot.load().is_none());

        slot.store(&sample_result()).await.unwrap();
        let loaded = slot.load().unwrap();
        assert_eq!(loaded, sample_result());

        slot.clear().await.unwrap();
        assert!(slot.load().is_none());
        // clearing again is a no-op
        slot.clear().await.unwrap();
    }

    #[tokio::test]
    async fn test_fallback_slot_garbage_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        std::fs::write(&path, "not json at all").unwrap();
        assert!(FallbackSlot::new(path).load().is_none());
    }
}
