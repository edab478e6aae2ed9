//! Configuration for dormstore components.

use serde::{Deserialize, Serialize};

/// Default payment request timeout in seconds.
const fn default_timeout_secs() -> u64 {
    5
}

/// Default blob cache capacity (entries).
const fn default_cache_capacity() -> usize {
    256
}

/// Default maximum blob fetch size (80 MiB).
const fn default_max_fetch_bytes() -> u64 {
    80 * 1024 * 1024
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_publishable_key() -> String {
    // Placeholder marker '#' keeps the gateway in the unconfigured-key
    // error path until an operator supplies a real key.
    "pk_test_#####".to_string()
}

/// Payment gateway configuration.
///
/// `base_url: None` selects fallback mode: every gateway operation runs
/// against local in-memory state instead of the payment backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Payment backend base URL. Absent ⇒ fallback mode.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Publishable API key. Must not contain the `#` placeholder marker.
    #[serde(default = "default_publishable_key")]
    pub publishable_key: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Blob store and cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlobConfig {
    /// Blob store base URL. Absent ⇒ demo mode with a static fetcher.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Number of blobs kept in the in-memory cache.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    /// Maximum size of a single remote fetch in bytes.
    #[serde(default = "default_max_fetch_bytes")]
    pub max_fetch_bytes: u64,
}

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Payment gateway settings.
    #[serde(default)]
    pub payment: GatewayConfig,

    /// Blob store settings.
    #[serde(default)]
    pub blob: BlobConfig,

    /// Log level filter for the composition root.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            publishable_key: default_publishable_key(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for BlobConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            cache_capacity: default_cache_capacity(),
            max_fetch_bytes: default_max_fetch_bytes(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            payment: GatewayConfig::default(),
            blob: BlobConfig::default(),
            log_level: default_log_level(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| crate::Error::Config(e.to_string()))
    }

    /// Save configuration to a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn to_file(&self, path: &std::path::Path) -> crate::Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert!(config.payment.base_url.is_none());
        assert!(config.payment.publishable_key.contains('#'));
        assert_eq!(config.payment.timeout_secs, 5);
        assert_eq!(config.blob.max_fetch_bytes, 80 * 1024 * 1024);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [payment]
            base_url = "https://pay.example.com"
            publishable_key = "pk_test_abc123"
            "#,
        )
        .unwrap();
        assert_eq!(
            config.payment.base_url.as_deref(),
            Some("https://pay.example.com")
        );
        assert_eq!(config.payment.timeout_secs, 5);
        assert_eq!(config.blob.cache_capacity, 256);
    }

    #[test]
    fn test_round_trip() {
        let config = AppConfig::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.payment.timeout_secs, config.payment.timeout_secs);
        assert_eq!(parsed.blob.cache_capacity, config.blob.cache_capacity);
    }
}
