use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub paths: PathsConfig,
}

/// Which AzuraCast installation and station to read from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host of the AzuraCast server. A scheme prefix is tolerated and
    /// stripped before the endpoint is built.
    #[serde(default)]
    pub url: String,
    /// Selects one station when the server hosts several. When unset, the
    /// first entry in the response is used.
    #[serde(default)]
    pub station_shortcode: Option<String>,
    /// Default number of history entries, used when the caller passes none.
    #[serde(default = "default_song_count")]
    pub song_count: usize,
}

impl ServerConfig {
    /// The bare host to build endpoints from: whitespace trimmed, any
    /// `http(s)://` prefix and trailing slashes removed.
    pub fn normalized_host(&self) -> String {
        let s = self.server_trimmed();
        let s = s
            .strip_prefix("https://")
            .or_else(|| s.strip_prefix("http://"))
            .unwrap_or(s);
        s.trim_end_matches('/').to_string()
    }

    fn server_trimmed(&self) -> &str {
        self.url.trim()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            station_shortcode: None,
            song_count: default_song_count(),
        }
    }
}

/// User-configurable storage locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// File holding the persisted fallback snapshot (a single serialized
    /// `HistoryResult`, overwritten on every successful fetch).
    #[serde(default = "default_fallback_file")]
    pub fallback_file: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            fallback_file: default_fallback_file(),
        }
    }
}

fn default_song_count() -> usize {
    10
}

fn default_fallback_file() -> PathBuf {
    data_dir().join("history.json")
}

pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("azura-history")
}

pub fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("azura-history")
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(&config_path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        config_dir().join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.url, "");
        assert!(config.server.station_shortcode.is_none());
        assert_eq!(config.server.song_count, 10);
        assert!(config.paths.fallback_file.ends_with("azura-history/history.json"));
    }

    #[test]
    fn test_normalized_host_strips_scheme() {
        let mut server = ServerConfig::default();
        server.url = "https://radio.example.com".into();
        assert_eq!(server.normalized_host(), "radio.example.com");

        server.url = "http://radio.example.com/".into();
        assert_eq!(server.normalized_host(), "radio.example.com");

        server.url = "  radio.example.com  ".into();
        assert_eq!(server.normalized_host(), "radio.example.com");
    }

    #[test]
    fn test_normalized_host_empty() {
        assert_eq!(ServerConfig::default().normalized_host(), "");
    }

    #[test]
    fn test_config_roundtrip_toml() {
        let mut config = Config::default();
        config.server.url = "radio.example.com".into();
        config.server.station_shortcode = Some("main_fm".into());
        let text = toml::to_string_pretty(&config).unwrap();
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back.server.url, "radio.example.com");
        assert_eq!(back.server.station_shortcode.as_deref(), Some("main_fm"));
    }
}
