//! Provider configuration.
//!
//! Built-in defaults, then an optional YAML file, then `RANDOMINT_*`
//! environment overrides. A missing file is fine; a malformed one is not.

use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::provider::QuotaPolicy;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid YAML in {path}: {source}")]
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("invalid value for {key}: {value:?}")]
    Env { key: &'static str, value: String },

    #[error("invalid {key} in {path}: {reason}")]
    Invalid {
        path: PathBuf,
        key: &'static str,
        reason: String,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProviderConfig {
    pub quota_url: String,
    pub integers_url: String,
    /// Applied to every request. `0` disables the timeout.
    pub request_timeout_ms: u64,
    pub call_cooldown_ms: u64,
    pub quota_cooldown_ms: u64,
    pub quota_margin_factor: i64,
    /// Skip address discovery and report this address to the quota endpoint.
    pub public_address: Option<Ipv4Addr>,
    /// Refresh the quota in the background every N seconds.
    pub quota_poll_secs: Option<u64>,
    pub user_agent: String,
    pub log_json: bool,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        let policy = QuotaPolicy::default();
        Self {
            quota_url: "https://www.random.org/quota/".into(),
            integers_url: "http://www.random.org/integers/".into(),
            request_timeout_ms: 10_000,
            call_cooldown_ms: policy.call_cooldown.as_millis() as u64,
            quota_cooldown_ms: policy.quota_cooldown.as_millis() as u64,
            quota_margin_factor: policy.margin_factor,
            public_address: None,
            quota_poll_secs: None,
            user_agent: format!("randomint/{}", env!("CARGO_PKG_VERSION")),
            log_json: false,
        }
    }
}

impl ProviderConfig {
    /// Defaults → YAML file (if present) → process environment.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match Self::config_path() {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// `$RANDOMINT_CONFIG`, else `<config dir>/randomint/config.yaml`.
    pub fn config_path() -> Option<PathBuf> {
        std::env::var_os("RANDOMINT_CONFIG")
            .map(PathBuf::from)
            .or_else(|| dirs::config_dir().map(|d| d.join("randomint").join("config.yaml")))
    }

    /// Parse a YAML file. A missing file yields the defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(&raw).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })?;
        if config.quota_margin_factor < 1 {
            return Err(ConfigError::Invalid {
                path: path.to_path_buf(),
                key: "quota_margin_factor",
                reason: format!("must be at least 1, got {}", config.quota_margin_factor),
            });
        }
        Ok(config)
    }

    /// Overlay `RANDOMINT_*` variables read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("RANDOMINT_QUOTA_URL") {
            self.quota_url = v;
        }
        if let Some(v) = lookup("RANDOMINT_INTEGERS_URL") {
            self.integers_url = v;
        }
        if let Some(v) = lookup("RANDOMINT_TIMEOUT_MS") {
            self.request_timeout_ms = parse_env("RANDOMINT_TIMEOUT_MS", v)?;
        }
        if let Some(v) = lookup("RANDOMINT_CALL_COOLDOWN_MS") {
            self.call_cooldown_ms = parse_env("RANDOMINT_CALL_COOLDOWN_MS", v)?;
        }
        if let Some(v) = lookup("RANDOMINT_QUOTA_COOLDOWN_MS") {
            self.quota_cooldown_ms = parse_env("RANDOMINT_QUOTA_COOLDOWN_MS", v)?;
        }
        if let Some(v) = lookup("RANDOMINT_MARGIN_FACTOR") {
            let factor: i64 = parse_env("RANDOMINT_MARGIN_FACTOR", v.clone())?;
            if factor < 1 {
                return Err(ConfigError::Env {
                    key: "RANDOMINT_MARGIN_FACTOR",
                    value: v,
                });
            }
            self.quota_margin_factor = factor;
        }
        if let Some(v) = lookup("RANDOMINT_PUBLIC_ADDRESS") {
            self.public_address = Some(parse_env("RANDOMINT_PUBLIC_ADDRESS", v)?);
        }
        if let Some(v) = lookup("RANDOMINT_POLL_SECS") {
            self.quota_poll_secs = Some(parse_env("RANDOMINT_POLL_SECS", v)?);
        }
        if let Some(v) = lookup("RANDOMINT_LOG_JSON") {
            self.log_json = parse_env("RANDOMINT_LOG_JSON", v)?;
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_ms > 0).then(|| Duration::from_millis(self.request_timeout_ms))
    }

    pub fn policy(&self) -> QuotaPolicy {
        QuotaPolicy {
            call_cooldown: Duration::from_millis(self.call_cooldown_ms),
            quota_cooldown: Duration::from_millis(self.quota_cooldown_ms),
            margin_factor: self.quota_margin_factor,
        }
    }

    pub fn quota_poll_interval(&self) -> Option<Duration> {
        self.quota_poll_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

fn parse_env<T: std::str::FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Env { key, value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults_match_service_policy() {
        let config = ProviderConfig::default();
        let policy = config.policy();
        assert_eq!(policy.call_cooldown, Duration::from_millis(10));
        assert_eq!(policy.quota_cooldown, Duration::from_millis(60_000));
        assert_eq!(policy.margin_factor, 2);
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(10)));
        assert!(config.quota_poll_interval().is_none());
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = ProviderConfig::from_file(&dir.path().join("absent.yaml")).unwrap();
        assert_eq!(config.quota_url, "https://www.random.org/quota/");
    }

    #[test]
    fn test_yaml_file_overrides_some_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "request_timeout_ms: 0\npublic_address: 192.0.2.10\nquota_poll_secs: 300\n"
        )
        .unwrap();

        let config = ProviderConfig::from_file(file.path()).unwrap();
        assert_eq!(config.request_timeout(), None);
        assert_eq!(config.public_address, Some(Ipv4Addr::new(192, 0, 2, 10)));
        assert_eq!(config.quota_poll_interval(), Some(Duration::from_secs(300)));
        assert_eq!(config.call_cooldown_ms, 10);
    }

    #[test]
    fn test_malformed_yaml_is_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "request_timeout_ms: soon").unwrap();
        assert!(matches!(
            ProviderConfig::from_file(file.path()),
            Err(ConfigError::Yaml { .. })
        ));
    }

    #[test]
    fn test_unknown_key_is_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "qouta_url: https://example.test/").unwrap();
        assert!(ProviderConfig::from_file(file.path()).is_err());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("RANDOMINT_INTEGERS_URL", "http://localhost:8080/integers/"),
            ("RANDOMINT_MARGIN_FACTOR", "3"),
            ("RANDOMINT_LOG_JSON", "true"),
        ]
        .into_iter()
        .collect();

        let mut config = ProviderConfig::default();
        config
            .apply_env(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.integers_url, "http://localhost:8080/integers/");
        assert_eq!(config.policy().margin_factor, 3);
        assert!(config.log_json);
    }

    #[test]
    fn test_bad_env_value() {
        let mut config = ProviderConfig::default();
        let err = config
            .apply_env(|k| (k == "RANDOMINT_PUBLIC_ADDRESS").then(|| "::1".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("RANDOMINT_PUBLIC_ADDRESS"));
    }

    #[test]
    fn test_margin_factor_below_one_rejected() {
        let mut config = ProviderConfig::default();
        for bad in ["0", "-3"] {
            let err = config
                .apply_env(|k| (k == "RANDOMINT_MARGIN_FACTOR").then(|| bad.to_string()))
                .unwrap_err();
            assert!(matches!(err, ConfigError::Env { key: "RANDOMINT_MARGIN_FACTOR", .. }));
        }
        assert_eq!(config.quota_margin_factor, 2);

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "quota_margin_factor: -1").unwrap();
        assert!(matches!(
            ProviderConfig::from_file(file.path()),
            Err(ConfigError::Invalid { key: "quota_margin_factor", .. })
        ));
    }
}
