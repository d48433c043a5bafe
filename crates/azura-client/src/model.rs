//! Normalized data model for the `/api/nowplaying` payload.
//!
//! The upstream schema is inferred from observed responses, not a versioned
//! contract, so everything here reads `serde_json::Value` defensively. Song
//! fields may sit in a nested `song` object or at the top level of a history
//! entry; timing fields (`played_at`, `duration`, `playlist`) always live at
//! the entry level.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const UNKNOWN_TITLE: &str = "Unknown Title";
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// One normalized song, either the current track or a history entry.
///
/// A song with neither title nor artist upstream is kept and rendered with
/// the placeholder strings rather than dropped, so a history of N requested
/// entries stays N entries long.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
    pub title: String,
    pub artist: String,
    #[serde(default)]
    pub album: String,
    /// Cover art URL, empty when the station provides none.
    #[serde(default)]
    pub art: String,
    #[serde(default)]
    pub genre: String,
    #[serde(default)]
    pub playlist: String,
    /// Track length in seconds.
    #[serde(default)]
    pub duration: u32,
    /// Unix seconds at which the song aired. 0 when the upstream omitted it.
    #[serde(default)]
    pub played_at: i64,
}

impl Song {
    /// The stand-in for entries that carry no usable song data at all.
    pub fn placeholder() -> Self {
        Self {
            title: UNKNOWN_TITLE.to_string(),
            artist: UNKNOWN_ARTIST.to_string(),
            album: String::new(),
            art: String::new(),
            genre: String::new(),
            playlist: String::new(),
            duration: 0,
            played_at: 0,
        }
    }

    /// Relative play time for display: "just now", "N min ago", "N hr ago",
    /// or the date for anything older than a day. Empty when `played_at` is
    /// unknown.
    pub fn played_ago(&self, now: i64) -> String {
        if self.played_at <= 0 {
            return String::new();
        }
        let delta = now - self.played_at;
        if delta < 60 {
            "just now".to_string()
        } else if delta < 3600 {
            format!("{} min ago", delta / 60)
        } else if delta < 86400 {
            format!("{} hr ago", delta / 3600)
        } else {
            chrono::DateTime::from_timestamp(self.played_at, 0)
                .map(|dt| dt.format("%Y-%m-%d").to_string())
                .unwrap_or_default()
        }
    }
}

/// Live-broadcast status of the selected station.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LiveStatus {
    #[serde(default)]
    pub is_live: bool,
    #[serde(default)]
    pub streamer_name: String,
}

impl LiveStatus {
    /// Extract the live block from a station entry. Observed payloads carry
    /// it at the entry top level; some place it inside `station`. Missing or
    /// malformed blocks read as "not live".
    pub fn from_entry(entry: &Value) -> Self {
        let live = entry
            .get("live")
            .filter(|v| v.is_object())
            .or_else(|| entry.get("station").and_then(|s| s.get("live")).filter(|v| v.is_object()));
        match live {
            Some(v) => Self {
                is_live: v.get("is_live").and_then(Value::as_bool).unwrap_or(false),
                streamer_name: v
                    .get("streamer_name")
                    .and_then(Value::as_str)
                    .unwrap_or("")
                    .to_string(),
            },
            None => Self::default(),
        }
    }
}

/// The unit that is cached, persisted, and handed to presentation callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryResult {
    /// Station metadata exactly as the upstream sent it. Opaque pass-through.
    pub station: Value,
    #[serde(default)]
    pub live: LiveStatus,
    pub now_playing: Option<Song>,
    /// Most-recent first, already ordered by the upstream. Never re-sorted.
    pub song_history: Vec<Song>,
    /// Unix seconds at which this result was fetched.
    pub timestamp: i64,
    pub count: usize,
}

impl HistoryResult {
    /// The shape returned when nothing has ever been persisted.
    pub fn empty() -> Self {
        Self {
            station: Value::Null,
            live: LiveStatus::default(),
            now_playing: None,
            song_history: Vec::new(),
            timestamp: 0,
            count: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.song_history.is_empty() && self.now_playing.is_none()
    }

    /// Display name of the station, if the upstream blob carries one.
    pub fn station_name(&self) -> Option<&str> {
        self.station.get("name").and_then(Value::as_str)
    }
}

/// Normalize one raw history entry (or `now_playing` block) into a [`Song`].
///
/// Non-object input yields the full placeholder. Otherwise song fields are
/// read from the nested `song` object when present, else from the entry
/// itself. Values are passed through raw; HTML escaping is the renderer's
/// job, not ours.
pub fn normalize_song(raw: &Value) -> Song {
    if !raw.is_object() {
        return Song::placeholder();
    }
    let song = match raw.get("song") {
        Some(s) if s.is_object() => s,
        _ => raw,
    };
    Song {
        title: text_or(song, "title", UNKNOWN_TITLE),
        artist: text_or(song, "artist", UNKNOWN_ARTIST),
        album: text_or(song, "album", ""),
        art: text_or(song, "art", ""),
        genre: text_or(song, "genre", ""),
        playlist: text_or(raw, "playlist", ""),
        duration: raw
            .get("duration")
            .and_then(|v| v.as_u64().or_else(|| v.as_f64().map(|f| f as u64)))
            .unwrap_or(0) as u32,
        played_at: parse_played_at(raw.get("played_at")),
    }
}

fn text_or(v: &Value, key: &str, default: &str) -> String {
    v.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| default.to_string())
}

/// `played_at` arrives as unix seconds in current payloads, but older
/// servers send it as a string (either digits or an ISO timestamp).
fn parse_played_at(v: Option<&Value>) -> i64 {
    let Some(v) = v else { return 0 };
    if let Some(n) = v.as_i64() {
        return n;
    }
    if let Some(s) = v.as_str() {
        if let Ok(n) = s.trim().parse::<i64>() {
            return n;
        }
        if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s.trim()) {
            return dt.timestamp();
        }
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_nested_song() {
        let raw = json!({"song": {"title": "A", "artist": "B"}, "played_at": 1000});
        let song = normalize_song(&raw);
        assert_eq!(song.title, "A");
        assert_eq!(song.artist, "B");
        assert_eq!(song.played_at, 1000);
        assert_eq!(song.album, "");
        assert_eq!(song.art, "");
        assert_eq!(song.genre, "");
        assert_eq!(song.duration, 0);
        assert_eq!(song.playlist, "");
    }

    #[test]
    fn test_normalize_flat_entry() {
        let raw = json!({
            "title": "Flat", "artist": "Top Level",
            "duration": 187, "playlist": "rotation", "played_at": 42
        });
        let song = normalize_song(&raw);
        assert_eq!(song.title, "Flat");
        assert_eq!(song.artist, "Top Level");
        assert_eq!(song.duration, 187);
        assert_eq!(song.playlist, "rotation");
        assert_eq!(song.played_at, 42);
    }

    #[test]
    fn test_normalize_empty_object_is_placeholder() {
        let song = normalize_song(&json!({}));
        assert_eq!(song, Song::placeholder());
        assert_eq!(song.title, UNKNOWN_TITLE);
        assert_eq!(song.artist, UNKNOWN_ARTIST);
    }

    #[test]
    fn test_normalize_non_object_is_placeholder() {
        assert_eq!(normalize_song(&json!("just a string")), Song::placeholder());
        assert_eq!(normalize_song(&Value::Null), Song::placeholder());
    }

    #[test]
    fn test_blank_title_gets_placeholder() {
        let song = normalize_song(&json!({"song": {"title": "  ", "artist": "B"}}));
        assert_eq!(song.title, UNKNOWN_TITLE);
        assert_eq!(song.artist, "B");
    }

    #[test]
    fn test_played_at_string_forms() {
        assert_eq!(normalize_song(&json!({"played_at": "1700000000"})).played_at, 1700000000);
        assert_eq!(
            normalize_song(&json!({"played_at": "2023-11-14T22:13:20+00:00"})).played_at,
            1700000000
        );
        assert_eq!(normalize_song(&json!({"played_at": "garbage"})).played_at, 0);
    }

    #[test]
    fn test_played_ago_buckets() {
        let song = Song { played_at: 10_000, ..Song::placeholder() };
        assert_eq!(song.played_ago(10_030), "just now");
        assert_eq!(song.played_ago(10_000 + 180), "3 min ago");
        assert_eq!(song.played_ago(10_000 + 2 * 3600), "2 hr ago");
        assert_eq!(song.played_ago(10_000 + 3 * 86400), "1970-01-01");

        let unknown = Song::placeholder();
        assert_eq!(unknown.played_ago(10_030), "");
    }

    #[test]
    fn test_live_status_entry_level() {
        let entry = json!({"live": {"is_live": true, "streamer_name": "DJ Night"}});
        let live = LiveStatus::from_entry(&entry);
        assert!(live.is_live);
        assert_eq!(live.streamer_name, "DJ Night");
    }

    #[test]
    fn test_live_status_nested_in_station() {
        let entry = json!({"station": {"live": {"is_live": true, "streamer_name": "X"}}});
        assert!(LiveStatus::from_entry(&entry).is_live);
    }

    #[test]
    fn test_live_status_missing() {
        assert_eq!(LiveStatus::from_entry(&json!({})), LiveStatus::default());
    }

    #[test]
    fn test_empty_result_shape() {
        let empty = HistoryResult::empty();
        assert!(empty.is_empty());
        assert_eq!(empty.count, 0);
        assert!(empty.now_playing.is_none());
        assert!(empty.station_name().is_none());
    }
}
