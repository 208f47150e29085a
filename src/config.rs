//! Configuration for the story engine.
//!
//! The config file is optional — a missing file yields `Config::default()`.
//! Every field carries a serde default so any subset of keys can be
//! specified. The embedding application decides where the file lives.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;
use url::Url;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config file exceeds the maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),

    #[error("Invalid story service URL '{0}': {1}")]
    InvalidUrl(String, url::ParseError),

    /// The service URL must be HTTPS, except localhost for development.
    #[error("Insecure story service URL '{0}': HTTPS required (except localhost)")]
    InsecureUrl(String),
}

// ============================================================================
// Configuration
// ============================================================================

/// Engine configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the story service (the collection endpoint).
    pub store_url: String,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Upload/download cap for story images, in bytes. Matches the
    /// service's own 5 MB multipart limit.
    pub max_image_bytes: usize,

    /// Number of story images kept in the in-memory cache.
    pub image_cache_entries: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_url: "http://localhost:3000/api/stories".to_string(),
            request_timeout_secs: 30,
            max_image_bytes: 5 * 1024 * 1024,
            image_cache_entries: 64,
        }
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line info
    /// - Unknown keys → silently accepted (serde default behavior)
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        // Check the size before reading so a corrupted or hostile file
        // cannot exhaust memory.
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        tracing::debug!(path = %path.display(), "Config loaded");
        Ok(config)
    }

    /// Parse and validate the store URL: HTTPS is required except for
    /// localhost, so credentials-free development setups keep working while
    /// anything remote goes over TLS.
    pub fn validated_store_url(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(&self.store_url)
            .map_err(|e| ConfigError::InvalidUrl(self.store_url.clone(), e))?;

        match url.scheme() {
            "https" => Ok(url),
            "http" => {
                let host = url.host_str().unwrap_or("");
                if host == "localhost" || host == "127.0.0.1" || host == "[::1]" {
                    Ok(url)
                } else {
                    Err(ConfigError::InsecureUrl(self.store_url.clone()))
                }
            }
            _ => Err(ConfigError::InsecureUrl(self.store_url.clone())),
        }
    }
}
