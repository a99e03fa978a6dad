//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.reviewfeed/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::session::{
    DEFAULT_PAGE_SIZE, DEFAULT_POLL_INTERVAL, DEFAULT_PREFETCH_DEBOUNCE, SessionOptions,
};

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct FeedConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub feed: FeedTuning,
    #[serde(default)]
    pub site: SiteConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ApiConfig {
    pub base_url: Option<String>,
    pub use_mock_data: Option<bool>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct FeedTuning {
    pub page_size: Option<u32>,
    pub poll_interval_secs: Option<u64>,
    pub prefetch_debounce_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct SiteConfig {
    pub url: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub base_path: Option<String>,
    pub revalidate_secs: Option<u64>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_SITE_URL: &str = "http://localhost:3000";
pub const DEFAULT_SITE_NAME: &str = "Reviews";
pub const DEFAULT_SITE_DESCRIPTION: &str = "The latest product reviews";
pub const DEFAULT_BASE_PATH: &str = "/reviews";
pub const DEFAULT_REVALIDATE: Duration = Duration::from_secs(3600);
const MAX_PAGE_SIZE: u32 = 100;

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    /// None means the upstream is unavailable; feeds render empty.
    pub api_base_url: Option<String>,
    pub use_mock_data: bool,
    pub site_url: String,
    pub site_name: String,
    pub site_description: String,
    pub base_path: String,
    pub revalidate: Duration,
    pub session: SessionOptions,
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// Returns the path to `~/.reviewfeed/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".reviewfeed").join("config.toml"))
}

/// Load config from `~/.reviewfeed/config.toml`.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `FeedConfig::default()`. If it exists but is malformed,
/// returns `ConfigError::Parse`.
pub fn load_config() -> Result<FeedConfig, ConfigError> {
    match config_path() {
        Some(path) => load_config_from(&path),
        None => {
            warn!("Could not determine home directory, using default config");
            Ok(FeedConfig::default())
        }
    }
}

pub fn load_config_from(path: &Path) -> Result<FeedConfig, ConfigError> {
    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(path);
        return Ok(FeedConfig::default());
    }

    let contents = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: FeedConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

/// Generates a commented-out default config file at the given path.
fn generate_default_config(path: &Path) {
    let default_content = r#"# reviewfeed configuration
# All settings are optional — defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [api]
# base_url = "https://api.example.com/v1"   # Or set REVIEWFEED_API_URL
# use_mock_data = false                     # Or set REVIEWFEED_MOCK=1

# [feed]
# page_size = 20
# poll_interval_secs = 60
# prefetch_debounce_ms = 600

# [site]
# url = "https://reviews.example.com"       # Or set REVIEWFEED_SITE_URL
# name = "Reviews"
# description = "The latest product reviews"
# base_path = "/reviews"
# revalidate_secs = 3600
"#;

    if let Some(parent) = path.parent()
        && let Err(e) = fs::create_dir_all(parent)
    {
        warn!("Failed to create config directory: {}", e);
        return;
    }
    if let Err(e) = fs::write(path, default_content) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Overrides taken from command-line flags (None = not specified).
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub api_url: Option<String>,
    pub mock: bool,
    pub site_url: Option<String>,
}

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
pub fn resolve(config: &FeedConfig, cli: &CliOverrides) -> ResolvedConfig {
    resolve_with_env(config, cli, |key| std::env::var(key).ok())
}

fn resolve_with_env<F>(config: &FeedConfig, cli: &CliOverrides, env: F) -> ResolvedConfig
where
    F: Fn(&str) -> Option<String>,
{
    // API URL: CLI → env → config (no default: absent means unavailable)
    let api_base_url = cli
        .api_url
        .clone()
        .or_else(|| env("REVIEWFEED_API_URL"))
        .or_else(|| config.api.base_url.clone())
        .filter(|url| !url.trim().is_empty());

    // Mock data: CLI flag → env → config → off
    let use_mock_data = cli.mock
        || env("REVIEWFEED_MOCK")
            .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
            .or(config.api.use_mock_data)
            .unwrap_or(false);

    // Site URL: CLI → env → config → default
    let site_url = cli
        .site_url
        .clone()
        .or_else(|| env("REVIEWFEED_SITE_URL"))
        .or_else(|| config.site.url.clone())
        .unwrap_or_else(|| DEFAULT_SITE_URL.to_string())
        .trim_end_matches('/')
        .to_string();

    let page_size = config
        .feed
        .page_size
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);

    ResolvedConfig {
        api_base_url,
        use_mock_data,
        site_url,
        site_name: config
            .site
            .name
            .clone()
            .unwrap_or_else(|| DEFAULT_SITE_NAME.to_string()),
        site_description: config
            .site
            .description
            .clone()
            .unwrap_or_else(|| DEFAULT_SITE_DESCRIPTION.to_string()),
        base_path: config
            .site
            .base_path
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_PATH.to_string()),
        revalidate: config
            .site
            .revalidate_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_REVALIDATE),
        session: SessionOptions {
            page_size,
            poll_interval: config
                .feed
                .poll_interval_secs
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_POLL_INTERVAL),
            prefetch_debounce: config
                .feed
                .prefetch_debounce_ms
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_PREFETCH_DEBOUNCE),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_default_config_parses() {
        let config = FeedConfig::default();
        assert!(config.api.base_url.is_none());
        assert!(config.feed.page_size.is_none());
    }

    #[test]
    fn test_resolve_uses_defaults_when_empty() {
        let resolved = resolve_with_env(&FeedConfig::default(), &CliOverrides::default(), no_env);
        assert_eq!(resolved.api_base_url, None);
        assert!(!resolved.use_mock_data);
        assert_eq!(resolved.site_url, DEFAULT_SITE_URL);
        assert_eq!(resolved.base_path, DEFAULT_BASE_PATH);
        assert_eq!(resolved.revalidate, DEFAULT_REVALIDATE);
        assert_eq!(resolved.session, SessionOptions::default());
    }

    #[test]
    fn test_resolve_config_values_override_defaults() {
        let config = FeedConfig {
            api: ApiConfig {
                base_url: Some("https://api.test".to_string()),
                use_mock_data: Some(true),
            },
            feed: FeedTuning {
                page_size: Some(30),
                poll_interval_secs: Some(15),
                prefetch_debounce_ms: Some(250),
            },
            site: SiteConfig {
                url: Some("https://site.test/".to_string()),
                ..Default::default()
            },
        };
        let resolved = resolve_with_env(&config, &CliOverrides::default(), no_env);
        assert_eq!(resolved.api_base_url.as_deref(), Some("https://api.test"));
        assert!(resolved.use_mock_data);
        assert_eq!(resolved.site_url, "https://site.test");
        assert_eq!(resolved.session.page_size, 30);
        assert_eq!(resolved.session.poll_interval, Duration::from_secs(15));
        assert_eq!(resolved.session.prefetch_debounce, Duration::from_millis(250));
    }

    #[test]
    fn test_env_beats_config_and_cli_beats_env() {
        let config = FeedConfig {
            api: ApiConfig {
                base_url: Some("https://from-config".to_string()),
                use_mock_data: None,
            },
            ..Default::default()
        };
        let env = |key: &str| match key {
            "REVIEWFEED_API_URL" => Some("https://from-env".to_string()),
            "REVIEWFEED_MOCK" => Some("1".to_string()),
            _ => None,
        };
        let resolved = resolve_with_env(&config, &CliOverrides::default(), env);
        assert_eq!(resolved.api_base_url.as_deref(), Some("https://from-env"));
        assert!(resolved.use_mock_data);

        let cli = CliOverrides {
            api_url: Some("https://from-cli".to_string()),
            ..Default::default()
        };
        let resolved = resolve_with_env(&config, &cli, env);
        assert_eq!(resolved.api_base_url.as_deref(), Some("https://from-cli"));
    }

    #[test]
    fn test_out_of_range_values_are_normalized() {
        let config = FeedConfig {
            api: ApiConfig {
                base_url: Some("   ".to_string()),
                use_mock_data: None,
            },
            feed: FeedTuning {
                page_size: Some(0),
                poll_interval_secs: Some(0),
                prefetch_debounce_ms: None,
            },
            ..Default::default()
        };
        let resolved = resolve_with_env(&config, &CliOverrides::default(), no_env);
        assert_eq!(resolved.api_base_url, None);
        assert_eq!(resolved.session.page_size, 1);
        assert_eq!(resolved.session.poll_interval, DEFAULT_POLL_INTERVAL);
    }

    #[test]
    fn test_sparse_toml_parses() {
        // Only override one thing — everything else stays default
        let toml_str = r#"
[feed]
page_size = 50
"#;
        let config: FeedConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.feed.page_size, Some(50));
        assert!(config.api.base_url.is_none());
        assert!(config.site.url.is_none());
    }

    #[test]
    fn test_full_toml_parses() {
        let toml_str = r#"
[api]
base_url = "https://api.example.com/v1"
use_mock_data = false

[feed]
poll_interval_secs = 120
prefetch_debounce_ms = 800

[site]
url = "https://reviews.example.com"
name = "Example Reviews"
revalidate_secs = 600
"#;
        let config: FeedConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.api.use_mock_data, Some(false));
        assert_eq!(config.feed.prefetch_debounce_ms, Some(800));
        assert_eq!(config.site.name.as_deref(), Some("Example Reviews"));
        assert_eq!(config.site.revalidate_secs, Some(600));
    }

    #[test]
    fn test_missing_file_generates_commented_default() {
        let dir = std::env::temp_dir().join(format!("reviewfeed-test-{}", uuid::Uuid::new_v4()));
        let path = dir.join("config.toml");
        let config = load_config_from(&path).unwrap();
        assert!(config.api.base_url.is_none());

        // The generated file is all comments, so it parses back to defaults
        let reloaded = load_config_from(&path).unwrap();
        assert!(reloaded.feed.page_size.is_none());
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let dir = std::env::temp_dir().join(format!("reviewfeed-test-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        fs::write(&path, "[feed\npage_size = ").unwrap();
        assert!(matches!(load_config_from(&path), Err(ConfigError::Parse(_))));
        let _ = fs::remove_dir_all(dir);
    }
}
