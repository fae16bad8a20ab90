//! Process-wide client configuration
//!
//! Configuration is resolved once at startup (defaults, then an optional
//! TOML file, then environment) and installed with [`init`]. The workflow
//! core never reads it; only service clients do when they are constructed.
//! [`set_api_base`] is the single runtime setter.
//!
//! ```toml
//! api_base = "https://redact.example.com"
//! timeout_secs = 600
//! theme = "midnight"
//! ```

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_API_BASE: &str = "http://localhost:8000";

pub const ENV_API_URL: &str = "REDACTO_API_URL";
pub const ENV_TIMEOUT_SECS: &str = "REDACTO_TIMEOUT_SECS";
pub const ENV_THEME: &str = "REDACTO_THEME";

/// Display preference carried alongside the endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Cyber,
    Midnight,
    Amber,
    Light,
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Theme::Cyber => write!(f, "cyber"),
            Theme::Midnight => write!(f, "midnight"),
            Theme::Amber => write!(f, "amber"),
            Theme::Light => write!(f, "light"),
        }
    }
}

impl FromStr for Theme {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cyber" => Ok(Theme::Cyber),
            "midnight" => Ok(Theme::Midnight),
            "amber" => Ok(Theme::Amber),
            "light" => Ok(Theme::Light),
            _ => Err(ConfigError::Invalid {
                key: "theme",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Base URL of the detection/redaction service
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Per-request timeout; `None` waits indefinitely
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub theme: Theme,
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            timeout_secs: None,
            theme: Theme::default(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validated()
    }

    /// Overlay values from `REDACTO_*` environment variables
    pub fn with_env(self) -> Result<Self, ConfigError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Overlay values from an arbitrary key lookup (environment-shaped)
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
            self.api_base = url;
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS).filter(|v| !v.trim().is_empty()) {
            let secs = raw.trim().parse().map_err(|_| ConfigError::Invalid {
                key: "timeout_secs",
                value: raw.clone(),
            })?;
            self.timeout_secs = Some(secs);
        }
        if let Some(raw) = lookup(ENV_THEME).filter(|v| !v.trim().is_empty()) {
            self.theme = raw.parse()?;
        }
        self.validated()
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// API base without a trailing slash, ready for path concatenation
    pub fn api_base_trimmed(&self) -> &str {
        self.api_base.trim_end_matches('/')
    }

    fn validated(mut self) -> Result<Self, ConfigError> {
        self.api_base = self.api_base.trim().to_string();
        let base = &self.api_base;
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                key: "api_base",
                value: self.api_base,
            });
        }
        if self.timeout_secs == Some(0) {
            return Err(ConfigError::Invalid {
                key: "timeout_secs",
                value: "0".to_string(),
            });
        }
        Ok(self)
    }
}

static GLOBAL: Lazy<RwLock<ClientConfig>> = Lazy::new(|| RwLock::new(ClientConfig::default()));

/// Install the startup configuration
pub fn init(config: ClientConfig) {
    let mut guard = GLOBAL.write().unwrap_or_else(PoisonError::into_inner);
    *guard = config;
    tracing::debug!(api_base = %guard.api_base, theme = %guard.theme, "client configuration installed");
}

/// Snapshot of the current configuration
pub fn current() -> ClientConfig {
    GLOBAL
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Point subsequent clients at a different service
pub fn set_api_base(url: impl Into<String>) -> Result<(), ConfigError> {
    let mut candidate = current();
    candidate.api_base = url.into();
    let candidate = candidate.validated()?;

    let mut guard = GLOBAL.write().unwrap_or_else(PoisonError::into_inner);
    guard.api_base = candidate.api_base;
    tracing::info!(api_base = %guard.api_base, "service endpoint changed");
    Ok(())
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
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.api_base, "http://localhost:8000");
        assert_eq!(config.timeout(), None);
        assert_eq!(config.theme, Theme::Cyber);
    }

    #[test]
    fn test_from_toml() {
        let config = ClientConfig::from_toml(
            r#"
            api_base = "https://redact.example.com/"
            timeout_secs = 600
            theme = "amber"
            "#,
        )
        .unwrap();

        assert_eq!(config.api_base_trimmed(), "https://redact.example.com");
        assert_eq!(config.timeout(), Some(Duration::from_secs(600)));
        assert_eq!(config.theme, Theme::Amber);
    }

    #[test]
    fn test_from_toml_partial_uses_defaults() {
        let config = ClientConfig::from_toml("theme = \"light\"").unwrap();
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert_eq!(config.theme, Theme::Light);
    }

    #[test]
    fn test_from_toml_rejects_unknown_keys() {
        assert!(ClientConfig::from_toml("api_url = \"http://x\"").is_err());
    }

    #[test]
    fn test_from_toml_rejects_bad_scheme() {
        let err = ClientConfig::from_toml("api_base = \"ftp://x\"").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "api_base", .. }));
    }

    #[test]
    fn test_api_base_is_stored_trimmed() {
        let config = ClientConfig::from_toml("api_base = \"  http://10.0.0.5:8000/ \"").unwrap();
        assert_eq!(config.api_base, "http://10.0.0.5:8000/");
        assert_eq!(config.api_base_trimmed(), "http://10.0.0.5:8000");

        let config = ClientConfig::default()
            .with_overrides(lookup(&[(ENV_API_URL, " https://redact.example.com\n")]))
            .unwrap();
        assert_eq!(config.api_base, "https://redact.example.com");
    }

    #[test]
    fn test_env_overrides() {
        let config = ClientConfig::default()
            .with_overrides(lookup(&[
                (ENV_API_URL, "http://10.0.0.5:9000"),
                (ENV_TIMEOUT_SECS, "30"),
                (ENV_THEME, "Midnight"),
            ]))
            .unwrap();

        assert_eq!(config.api_base, "http://10.0.0.5:9000");
        assert_eq!(config.timeout_secs, Some(30));
        assert_eq!(config.theme, Theme::Midnight);
    }

    #[test]
    fn test_env_blank_values_ignored() {
        let config = ClientConfig::default()
            .with_overrides(lookup(&[(ENV_API_URL, "  ")]))
            .unwrap();
        assert_eq!(config.api_base, DEFAULT_API_BASE);
    }

    #[test]
    fn test_env_invalid_timeout() {
        let err = ClientConfig::default()
            .with_overrides(lookup(&[(ENV_TIMEOUT_SECS, "soon")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "timeout_secs", .. }));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        assert!(ClientConfig::from_toml("timeout_secs = 0").is_err());
    }

    #[test]
    fn test_global_setter() {
        init(ClientConfig::default());
        set_api_base("https://other.example.com").unwrap();
        assert_eq!(current().api_base, "https://other.example.com");

        assert!(set_api_base("not a url").is_err());
        assert_eq!(current().api_base, "https://other.example.com");
        init(ClientConfig::default());
    }
}
