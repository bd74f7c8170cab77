//! Configuration file handling for face-attendance.
//!
//! Loads configuration from `<config dir>/face-attendance/config.toml` or a custom path.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::api::{ApiError, AttendanceClient, API_BASE_URL_ENV, DEFAULT_API_BASE_URL};
use crate::capture::CaptureSettings;

/// Written by `config init`.
pub const DEFAULT_CONFIG_TOML: &str = r#"# face-attendance configuration

[api]
# Backend base URL. FACE_ATTENDANCE_API_BASE_URL and --api-url take precedence.
# base_url = "http://localhost:8000/api/v1"
timeout_secs = 30
connect_timeout_secs = 10

[capture]
# Sampling period
interval_ms = 250
# Consecutive face ticks before an automatic capture
stability_threshold = 8
# No automatic capture for this long after one completes
cooldown_ms = 5000

[dashboard]
# Attendance reload period while the camera is on
poll_interval_ms = 5000
"#;

/// Configuration file structure for face-attendance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureConfig {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    #[serde(default = "default_stability_threshold")]
    pub stability_threshold: u32,
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            stability_threshold: default_stability_threshold(),
            cooldown_ms: default_cooldown_ms(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_interval_ms() -> u64 {
    250
}

fn default_stability_threshold() -> u32 {
    8
}

fn default_cooldown_ms() -> u64 {
    5000
}

fn default_poll_interval_ms() -> u64 {
    5000
}

impl Config {
    /// Load configuration from a file path.
    ///
    /// A missing file at the default location yields the default config. A
    /// missing file at an explicit `path` is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (default_path(), false),
        };

        if !path.exists() {
            if explicit {
                return Err(ConfigError::NotFound(path));
            }
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::IoError {
            path: path.clone(),
            source: e,
        })?;
        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.clone(),
            source: e,
        })?;
        config.validate()?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capture.interval_ms == 0 {
            return Err(ConfigError::Invalid("capture.interval_ms must be > 0".into()));
        }
        if self.capture.stability_threshold == 0 {
            return Err(ConfigError::Invalid(
                "capture.stability_threshold must be >= 1".into(),
            ));
        }
        if self.dashboard.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "dashboard.poll_interval_ms must be > 0".into(),
            ));
        }
        Ok(())
    }

    /// Effective base URL: `cli` flag, then the environment, then the file.
    pub fn resolved_base_url(&self, cli: Option<&str>) -> String {
        let env = std::env::var(API_BASE_URL_ENV).ok();
        resolve_base_url(cli, env.as_deref(), self.api.base_url.as_deref())
    }

    pub fn capture_settings(&self) -> CaptureSettings {
        CaptureSettings {
            tick_interval: Duration::from_millis(self.capture.interval_ms),
            stability_threshold: self.capture.stability_threshold,
            cooldown: Duration::from_millis(self.capture.cooldown_ms),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.dashboard.poll_interval_ms)
    }

    /// Build the API client for these settings.
    pub fn client(&self, cli_base_url: Option<&str>) -> Result<AttendanceClient, ApiError> {
        AttendanceClient::with_timeouts(
            self.resolved_base_url(cli_base_url),
            Duration::from_secs(self.api.timeout_secs),
            Duration::from_secs(self.api.connect_timeout_secs),
        )
    }
}

/// Pick the first non-blank base URL.
pub fn resolve_base_url(cli: Option<&str>, env: Option<&str>, file: Option<&str>) -> String {
    [cli, env, file]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|s| !s.is_empty())
        .unwrap_or(DEFAULT_API_BASE_URL)
        .to_string()
}

/// Write [`DEFAULT_CONFIG_TOML`] to `path` (or the default location).
///
/// Refuses to overwrite an existing file.
pub fn write_default(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    let path = path.map(PathBuf::from).unwrap_or_else(default_path);
    if path.exists() {
        return Err(ConfigError::AlreadyExists(path));
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    std::fs::write(&path, DEFAULT_CONFIG_TOML).map_err(|e| ConfigError::IoError {
        path: path.clone(),
        source: e,
    })?;
    log::info!("Wrote default config to {}", path.display());
    Ok(path)
}

/// Errors that can occur when loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
    NotFound(PathBuf),
    AlreadyExists(PathBuf),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError { path, source } => {
                write!(
                    f,
                    "Failed to read config file '{}': {}",
                    path.display(),
                    source
                )
            }
            ConfigError::ParseError { path, source } => {
                write!(
                    f,
                    "Failed to parse config file '{}': {}",
                    path.display(),
                    source
                )
            }
            ConfigError::NotFound(path) => {
                write!(f, "Config file '{}' does not exist", path.display())
            }
            ConfigError::AlreadyExists(path) => {
                write!(f, "Config file '{}' already exists", path.display())
            }
            ConfigError::Invalid(msg) => write!(f, "Invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::IoError { source, .. } => Some(source),
            ConfigError::ParseError { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Get the default config file path.
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("face-attendance").join("config.toml"))
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config/face-attendance/config.toml")
        })
}
