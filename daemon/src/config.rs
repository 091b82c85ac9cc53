//! Daemon configuration with TOML file support.

use blam_engine::{EngineConfig, RetryPolicy};
use blam_types::MemberId;
use blam_utils::LogFormat;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("missing required setting: {0}")]
    Missing(&'static str),

    #[error("invalid member id for {field}: '{value}'")]
    InvalidMember { field: &'static str, value: String },
}

/// Where policy state is kept.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Lmdb,
    /// Lost on restart. For local testing.
    Memory,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

/// Configuration for the daemon.
///
/// Loaded from a TOML file via [`DaemonConfig::from_toml_file`]; CLI flags
/// and environment variables are applied on top in `main`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Directory holding the LMDB environment.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default)]
    pub store: StoreBackend,

    /// LMDB map size in bytes.
    #[serde(default = "default_map_size")]
    pub lmdb_map_size: usize,

    #[serde(default = "default_rpc_port")]
    pub rpc_port: u16,

    /// Member id the bot acts as. Required.
    #[serde(default)]
    pub actor_id: Option<String>,

    /// Administrator invited alongside the bot and never removed.
    #[serde(default)]
    pub admin_id: Option<String>,

    #[serde(default = "default_idv_endpoint")]
    pub idv_endpoint: String,

    #[serde(default = "default_slack_api_base")]
    pub slack_api_base: String,

    /// Upper bound on any single external call.
    #[serde(default = "default_call_timeout_ms")]
    pub call_timeout_ms: u64,

    #[serde(default = "default_max_concurrent_removals")]
    pub max_concurrent_removals: usize,

    #[serde(default)]
    pub retry: RetryConfig,

    /// Seconds between background sweeps; 0 disables them.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_data_dir() -> PathBuf {
    PathBuf::from("./blam_data")
}

fn default_map_size() -> usize {
    blam_store_lmdb::environment::DEFAULT_MAP_SIZE
}

fn default_rpc_port() -> u16 {
    3000
}

fn default_idv_endpoint() -> String {
    blam_idv::client::DEFAULT_ENDPOINT.to_string()
}

fn default_slack_api_base() -> String {
    blam_roster::slack::DEFAULT_API_BASE.to_string()
}

fn default_call_timeout_ms() -> u64 {
    15_000
}

fn default_max_concurrent_removals() -> usize {
    4
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    10_000
}

fn default_sweep_interval_secs() -> u64 {
    3600
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(cfg: &RetryConfig) -> Self {
        RetryPolicy {
            max_attempts: cfg.max_attempts.max(1),
            base_delay: Duration::from_millis(cfg.base_delay_ms),
            max_delay: Duration::from_millis(cfg.max_delay_ms),
        }
    }
}

impl DaemonConfig {
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }

    pub fn sweep_interval(&self) -> Option<Duration> {
        (self.sweep_interval_secs > 0).then(|| Duration::from_secs(self.sweep_interval_secs))
    }

    /// Build the engine configuration, validating member ids.
    pub fn engine_config(&self) -> Result<EngineConfig, ConfigError> {
        let actor = self
            .actor_id
            .as_deref()
            .ok_or(ConfigError::Missing("actor_id"))?;
        let mut config = EngineConfig::new(parse_member("actor_id", actor)?);
        if let Some(admin) = self.admin_id.as_deref() {
            config = config.with_admin(parse_member("admin_id", admin)?);
        }
        config.call_timeout = self.call_timeout();
        config.max_concurrent_removals = self.max_concurrent_removals.max(1);
        config.retry = RetryPolicy::from(&self.retry);
        Ok(config)
    }
}

fn parse_member(field: &'static str, value: &str) -> Result<MemberId, ConfigError> {
    let id = MemberId::from(value.trim());
    if id.is_well_formed() {
        Ok(id)
    } else {
        Err(ConfigError::InvalidMember {
            field,
            value: value.to_string(),
        })
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            store: StoreBackend::default(),
            lmdb_map_size: default_map_size(),
            rpc_port: default_rpc_port(),
            actor_id: None,
            admin_id: None,
            idv_endpoint: default_idv_endpoint(),
            slack_api_base: default_slack_api_base(),
            call_timeout_ms: default_call_timeout_ms(),
            max_concurrent_removals: default_max_concurrent_removals(),
            retry: RetryConfig::default(),
            sweep_interval_secs: default_sweep_interval_secs(),
            log_format: LogFormat::default(),
            log_level: default_log_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_toml_uses_defaults() {
        let config = DaemonConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config, DaemonConfig::default());
        assert_eq!(config.store, StoreBackend::Lmdb);
        assert_eq!(config.sweep_interval(), Some(Duration::from_secs(3600)));
    }

    #[test]
    fn partial_toml_overrides() {
        let toml = r#"
            store = "memory"
            actor_id = "UBOT123"
            sweep_interval_secs = 0
            log_format = "json"

            [retry]
            max_attempts = 5
        "#;
        let config = DaemonConfig::from_toml_str(toml).expect("should parse");
        assert_eq!(config.store, StoreBackend::Memory);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.sweep_interval(), None);
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.base_delay_ms, 500);
    }

    #[test]
    fn engine_config_requires_a_valid_actor() {
        let mut config = DaemonConfig::default();
        assert!(matches!(config.engine_config(), Err(ConfigError::Missing("actor_id"))));

        config.actor_id = Some("UBOT123".to_string());
        config.admin_id = Some("not-an-id".to_string());
        assert!(matches!(
            config.engine_config(),
            Err(ConfigError::InvalidMember { field: "admin_id", .. })
        ));

        config.admin_id = Some("UADMIN1".to_string());
        let engine = config.engine_config().unwrap();
        assert_eq!(engine.actor_id, MemberId::from("UBOT123"));
        assert_eq!(engine.admin_id, Some(MemberId::from("UADMIN1")));
        assert_eq!(engine.retry, RetryPolicy::default());
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "rpc_port = 9999").unwrap();
        let config = DaemonConfig::from_toml_file(file.path()).unwrap();
        assert_eq!(config.rpc_port, 9999);
    }

    #[test]
    fn missing_file_returns_read_error() {
        let err = DaemonConfig::from_toml_file(Path::new("/nonexistent/blam.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
