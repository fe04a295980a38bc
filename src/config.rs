//! Client configuration.
//!
//! Values come from the process environment, with `.env` support. Every knob
//! but the API base URL has a default.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub const ENV_API_URL: &str = "EVENTSTAFF_API_URL";
pub const ENV_DATA_DIR: &str = "EVENTSTAFF_DATA_DIR";
pub const ENV_TIMEOUT_SECS: &str = "EVENTSTAFF_TIMEOUT_SECS";
pub const ENV_SEARCH_DELAY_MS: &str = "EVENTSTAFF_SEARCH_DELAY_MS";
pub const ENV_PAGE_SIZE: &str = "EVENTSTAFF_PAGE_SIZE";
pub const ENV_VIACEP_URL: &str = "EVENTSTAFF_VIACEP_URL";
pub const ENV_CACHE_TTL_SECS: &str = "EVENTSTAFF_CACHE_TTL_SECS";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_SEARCH_DELAY: Duration = Duration::from_millis(500);
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(30);
pub const DEFAULT_VIACEP_URL: &str = "https://viacep.com.br/ws";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the dashboard REST API, without a trailing slash.
    pub api_url: String,
    pub data_dir: PathBuf,
    pub request_timeout: Duration,
    /// Quiescence window for search inputs.
    pub search_delay: Duration,
    /// Sent as `per_page` on list requests when set.
    pub page_size: Option<u32>,
    pub viacep_url: String,
    pub cache_ttl: Duration,
}

impl ClientConfig {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into().trim().trim_end_matches('/').to_string(),
            data_dir: default_data_dir(),
            request_timeout: DEFAULT_TIMEOUT,
            search_delay: DEFAULT_SEARCH_DELAY,
            page_size: None,
            viacep_url: DEFAULT_VIACEP_URL.to_string(),
            cache_ttl: DEFAULT_CACHE_TTL,
        }
    }

    /// Load from the environment, reading `.env` first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                tracing::warn!("ignoring unreadable .env file: {e}");
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let api_url = get(ENV_API_URL).ok_or(ConfigError::Missing(ENV_API_URL))?;
        check_http_url(ENV_API_URL, &api_url)?;

        let mut config = Self::new(api_url);

        if let Some(dir) = get(ENV_DATA_DIR) {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(raw) = get(ENV_TIMEOUT_SECS) {
            config.request_timeout = Duration::from_secs(parse_positive(ENV_TIMEOUT_SECS, &raw)?);
        }
        if let Some(raw) = get(ENV_SEARCH_DELAY_MS) {
            config.search_delay =
                Duration::from_millis(parse_positive(ENV_SEARCH_DELAY_MS, &raw)?);
        }
        if let Some(raw) = get(ENV_PAGE_SIZE) {
            let size = parse_positive(ENV_PAGE_SIZE, &raw)?;
            config.page_size = Some(u32::try_from(size).map_err(|_| ConfigError::Invalid {
                key: ENV_PAGE_SIZE,
                reason: format!("{size} is too large"),
            })?);
        }
        if let Some(url) = get(ENV_VIACEP_URL) {
            check_http_url(ENV_VIACEP_URL, &url)?;
            config.viacep_url = url.trim_end_matches('/').to_string();
        }
        if let Some(raw) = get(ENV_CACHE_TTL_SECS) {
            // Zero is allowed here: it disables caching.
            let secs = raw.parse::<u64>().map_err(|e| ConfigError::Invalid {
                key: ENV_CACHE_TTL_SECS,
                reason: e.to_string(),
            })?;
            config.cache_ttl = Duration::from_secs(secs);
        }

        Ok(config)
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("eventstaff.db")
    }
}

/// Accept only absolute http(s) URLs with a host.
fn check_http_url(key: &'static str, raw: &str) -> Result<(), ConfigError> {
    let url = reqwest::Url::parse(raw).map_err(|error| ConfigError::Invalid {
        key,
        reason: format!("invalid URL {raw:?}: {error}"),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Invalid {
            key,
            reason: format!("expected an http(s) URL, got scheme {:?}", url.scheme()),
        });
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(ConfigError::Invalid {
            key,
            reason: format!("{raw:?} has no host"),
        });
    }
    Ok(())
}

fn parse_positive(key: &'static str, raw: &str) -> Result<u64, ConfigError> {
    let value = raw.parse::<u64>().map_err(|e| ConfigError::Invalid {
        key,
        reason: e.to_string(),
    })?;
    if value == 0 {
        return Err(ConfigError::Invalid {
            key,
            reason: "must be greater than 0".to_string(),
        });
    }
    Ok(value)
}

fn default_data_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Ok(app_data) = std::env::var("APPDATA") {
            return PathBuf::from(app_data).join("EventStaff");
        }
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".eventstaff");
    }

    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".eventstaff");
    }

    PathBuf::from(".eventstaff")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_apply_when_only_url_is_set() {
        let config =
            ClientConfig::from_lookup(lookup(&[(ENV_API_URL, "https://api.example.com/")]))
                .unwrap();
        assert_eq!(config.api_url, "https://api.example.com");
        assert_eq!(config.request_timeout, DEFAULT_TIMEOUT);
        assert_eq!(config.search_delay, DEFAULT_SEARCH_DELAY);
        assert_eq!(config.page_size, None);
        assert_eq!(config.viacep_url, DEFAULT_VIACEP_URL);
    }

    #[test]
    fn test_overrides_are_parsed() {
        let config = ClientConfig::from_lookup(lookup(&[
            (ENV_API_URL, "http://localhost:3333"),
            (ENV_DATA_DIR, "/tmp/eventstaff-test"),
            (ENV_TIMEOUT_SECS, "5"),
            (ENV_SEARCH_DELAY_MS, "400"),
            (ENV_PAGE_SIZE, "20"),
            (ENV_CACHE_TTL_SECS, "0"),
        ]))
        .unwrap();
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.search_delay, Duration::from_millis(400));
        assert_eq!(config.page_size, Some(20));
        assert_eq!(config.cache_ttl, Duration::ZERO);
        assert_eq!(
            config.db_path(),
            PathBuf::from("/tmp/eventstaff-test/eventstaff.db")
        );
    }

    #[test]
    fn test_missing_or_bad_values_are_rejected() {
        assert!(matches!(
            ClientConfig::from_lookup(lookup(&[])),
            Err(ConfigError::Missing(ENV_API_URL))
        ));
        assert!(matches!(
            ClientConfig::from_lookup(lookup(&[(ENV_API_URL, "api.example.com")])),
            Err(ConfigError::Invalid { key: ENV_API_URL, .. })
        ));
        for bad in ["http://", "https://exa mple.com", "ftp://files.example.com", "http:"] {
            assert!(
                matches!(
                    ClientConfig::from_lookup(lookup(&[(ENV_API_URL, bad)])),
                    Err(ConfigError::Invalid { key: ENV_API_URL, .. })
                ),
                "{bad:?} should be rejected"
            );
        }
        assert!(matches!(
            ClientConfig::from_lookup(lookup(&[
                (ENV_API_URL, "https://api.example.com"),
                (ENV_VIACEP_URL, "viacep.com.br/ws"),
            ])),
            Err(ConfigError::Invalid {
                key: ENV_VIACEP_URL,
                ..
            })
        ));
        assert!(matches!(
            ClientConfig::from_lookup(lookup(&[
                (ENV_API_URL, "https://api.example.com"),
                (ENV_SEARCH_DELAY_MS, "0"),
            ])),
            Err(ConfigError::Invalid {
                key: ENV_SEARCH_DELAY_MS,
                ..
            })
        ));
    }
}
