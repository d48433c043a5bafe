//! The fetch/normalize/cache/fallback pipeline.
//!
//! One provider per configured server. Every call is request-scoped and
//! sequential: check the ephemeral cache, else fetch, normalize, cache,
//! persist. Fetch failures surface as [`ProviderError`]; falling back to
//! the persisted snapshot is the caller's decision, via
//! [`SongDataProvider::get_cached_history`].
//!
//! Concurrent callers racing an expired cache entry each fetch redundantly.
//! There is no single-flight guard; request volume here does not justify one.

use crate::cache::{cache_key, EphemeralCache, FallbackSlot, CACHE_TTL};
use crate::config::Config;
use crate::error::ProviderError;
use crate::model::{normalize_song, HistoryResult, LiveStatus, Song};
use crate::transport::{HttpResponse, ReqwestTransport, Transport};
use serde_json::Value;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

pub const MIN_SONG_COUNT: usize = 1;
pub const MAX_SONG_COUNT: usize = 50;

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);
const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Clamp a requested history length into the supported range.
pub fn clamp_count(count: usize) -> usize {
    count.clamp(MIN_SONG_COUNT, MAX_SONG_COUNT)
}

pub struct SongDataProvider<T: Transport = ReqwestTransport> {
    config: Config,
    transport: T,
    cache: Mutex<EphemeralCache>,
    fallback: FallbackSlot,
}

impl SongDataProvider<ReqwestTransport> {
    pub fn new(config: Config) -> Self {
        Self::with_transport(config, ReqwestTransport::new())
    }
}

impl<T: Transport> SongDataProvider<T> {
    /// Construction seam for tests: any [`Transport`] impl slots in here.
    pub fn with_transport(config: Config, transport: T) -> Self {
        let fallback = FallbackSlot::new(config.paths.fallback_file.clone());
        Self {
            config,
            transport,
            cache: Mutex::new(EphemeralCache::new(CACHE_TTL)),
            fallback,
        }
    }

    /// Fetch the recent-song history, serving from the ephemeral cache when
    /// an unexpired entry exists for this (server, count) pair.
    ///
    /// On success the result is cached and the fallback slot overwritten.
    /// On failure the error propagates; this method never falls back on
    /// its own.
    pub async fn get_song_history(
        &self,
        count: Option<usize>,
    ) -> Result<HistoryResult, ProviderError> {
        let count = clamp_count(count.unwrap_or(self.config.server.song_count));
        let host = self.endpoint_host()?;
        let key = cache_key(&host, count);

        {
            let mut cache = self.cache.lock().await;
            if let Some(hit) = cache.get(key) {
                debug!("cache hit for {} (count={})", host, count);
                return Ok(hit.clone());
            }
        }

        let result = self.fetch_from_api(&host, count).await?;
        info!("fetched {} songs from {}", result.count, host);

        self.cache.lock().await.insert(key, result.clone());
        if let Err(e) = self.fallback.store(&result).await {
            warn!("could not persist fallback snapshot: {:#}", e);
        }

        Ok(result)
    }

    /// The currently airing song, if the station reports one.
    pub async fn get_now_playing(&self) -> Result<Option<Song>, ProviderError> {
        Ok(self.get_song_history(Some(1)).await?.now_playing)
    }

    /// Read the persisted fallback snapshot, ignoring the ephemeral cache.
    /// Never fails: with nothing persisted this is the empty shape.
    pub fn get_cached_history(&self, count: Option<usize>) -> HistoryResult {
        let count = clamp_count(count.unwrap_or(self.config.server.song_count));
        let Some(mut result) = self.fallback.load() else {
            return HistoryResult::empty();
        };
        if result.song_history.len() > count {
            result.song_history.truncate(count);
            result.count = result.song_history.len();
        }
        result
    }

    /// Probe the endpoint with a short timeout. Succeeds iff it answers
    /// HTTP 200; the body is not inspected.
    pub async fn test_connection(&self) -> Result<(), ProviderError> {
        let host = self.endpoint_host()?;
        let response = self.request_nowplaying(&host, TEST_TIMEOUT).await?;
        if response.status != 200 {
            return Err(ProviderError::Upstream {
                status: response.status,
            });
        }
        Ok(())
    }

    /// Drop every ephemeral entry and remove the fallback file. Idempotent.
    pub async fn clear_cache(&self) {
        self.cache.lock().await.clear();
        if let Err(e) = self.fallback.clear().await {
            warn!("could not clear fallback slot: {:#}", e);
        }
        info!("song caches cleared");
    }

    fn endpoint_host(&self) -> Result<String, ProviderError> {
        let host = self.config.server.normalized_host();
        if host.is_empty() {
            return Err(ProviderError::MissingConfiguration);
        }
        Ok(host)
    }

    /// GET `/api/nowplaying`, https first. A connection-level failure gets
    /// exactly one retry over plain http; an HTTP error status does not.
    async fn request_nowplaying(
        &self,
        host: &str,
        timeout: Duration,
    ) -> Result<HttpResponse, ProviderError> {
        let https_url = format!("https://{}/api/nowplaying", host);
        match self.transport.get(&https_url, timeout).await {
            Ok(response) => Ok(response),
            Err(e) => {
                warn!("https fetch failed ({}), retrying over plain http", e);
                let http_url = format!("http://{}/api/nowplaying", host);
                Ok(self.transport.get(&http_url, timeout).await?)
            }
        }
    }

    async fn fetch_from_api(
        &self,
        host: &str,
        count: usize,
    ) -> Result<HistoryResult, ProviderError> {
        let response = self.request_nowplaying(host, FETCH_TIMEOUT).await?;
        if response.status != 200 {
            return Err(ProviderError::Upstream {
                status: response.status,
            });
        }

        let data: Value = serde_json::from_str(&response.body)
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;
        let entries = data.as_array().ok_or_else(|| {
            ProviderError::MalformedResponse("expected a top-level array of station entries".into())
        })?;

        let entry = select_station(entries, self.config.server.station_shortcode.as_deref())
            .ok_or(ProviderError::NoStationData)?;
        let history = entry
            .get("song_history")
            .and_then(Value::as_array)
            .ok_or(ProviderError::NoStationData)?;

        // Upstream sends most-recent first; we keep that order as-is.
        let song_history: Vec<Song> = history.iter().take(count).map(normalize_song).collect();
        let now_playing = entry
            .get("now_playing")
            .filter(|v| !v.is_null())
            .map(normalize_song);

        Ok(HistoryResult {
            station: entry.get("station").cloned().unwrap_or(Value::Null),
            live: LiveStatus::from_entry(entry),
            now_playing,
            count: song_history.len(),
            song_history,
            timestamp: chrono::Utc::now().timestamp(),
        })
    }
}

/// Pick the entry whose `station.shortcode` matches, else the first entry.
fn select_station<'a>(entries: &'a [Value], shortcode: Option<&str>) -> Option<&'a Value> {
    if let Some(code) = shortcode {
        if let Some(entry) = entries
            .iter()
            .find(|e| e["station"]["shortcode"].as_str() == Some(code))
        {
            return Some(entry);
        }
        debug!("no station matches shortcode {:?}, using first entry", code);
    }
    entries.first()
}
