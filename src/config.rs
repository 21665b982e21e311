//! Configuration module for filedrop.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::{FiledropError, Result};

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on. Required, there is no default.
    #[serde(default)]
    pub port: Option<u16>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: None,
        }
    }
}

/// Which storage backend the process serves files from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// An S3 bucket.
    S3,
    /// A local directory tree.
    Local,
}

impl std::str::FromStr for BackendKind {
    type Err = FiledropError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "s3" => Ok(BackendKind::S3),
            "local" => Ok(BackendKind::Local),
            other => Err(FiledropError::Config(format!(
                "unknown storage backend '{other}' (expected 's3' or 'local')"
            ))),
        }
    }
}

/// Storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Backend to use.
    #[serde(default = "default_backend")]
    pub backend: BackendKind,
    /// Bucket name (S3 backend).
    #[serde(default)]
    pub bucket: String,
    /// AWS region (S3 backend).
    #[serde(default = "default_region")]
    pub region: String,
    /// Custom endpoint for S3-compatible stores. Empty means AWS.
    #[serde(default)]
    pub endpoint_url: String,
    /// Root directory (local backend).
    #[serde(default)]
    pub root: String,
}

fn default_backend() -> BackendKind {
    BackendKind::S3
}

fn default_region() -> String {
    "us-east-1".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            bucket: String::new(),
            region: default_region(),
            endpoint_url: String::new(),
            root: String::new(),
        }
    }
}

/// Display configuration for listings.
#[derive(Debug, Clone, Deserialize)]
pub struct DisplayConfig {
    /// Timezone for displaying modification times (e.g., "UTC", "Asia/Tokyo").
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_timezone() -> String {
    "UTC".to_string()
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
        }
    }
}

/// Templates configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct TemplatesConfig {
    /// Path to the templates directory.
    #[serde(default = "default_templates_path")]
    pub path: String,
}

fn default_templates_path() -> String {
    "templates".to_string()
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            path: default_templates_path(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file. Empty disables file logging.
    #[serde(default)]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: String::new(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Display configuration.
    #[serde(default)]
    pub display: DisplayConfig,
    /// Templates configuration.
    #[serde(default)]
    pub templates: TemplatesConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(FiledropError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration and apply environment variable overrides.
    ///
    /// A missing file is not an error: defaults are used and the
    /// environment fills in the rest.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = if path.as_ref().exists() {
            Self::load(path)?
        } else {
            Self::default()
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| FiledropError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from a variable lookup.
    ///
    /// Supported variables:
    /// - `PORT`, `HOST`
    /// - `STORAGE_BACKEND` (`s3` / `local`)
    /// - `S3_BUCKET_NAME`, `AWS_REGION`, `S3_ENDPOINT_URL`
    /// - `FILES_DIR`
    /// - `DISPLAY_TIMEZONE`
    /// - `LOG_LEVEL`
    ///
    /// Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(port) = get("PORT") {
            let port = port
                .parse::<u16>()
                .map_err(|_| FiledropError::Config(format!("invalid PORT value '{port}'")))?;
            self.server.port = Some(port);
        }
        if let Some(host) = get("HOST") {
            self.server.host = host;
        }
        if let Some(backend) = get("STORAGE_BACKEND") {
            self.storage.backend = backend.parse()?;
        }
        if let Some(bucket) = get("S3_BUCKET_NAME") {
            self.storage.bucket = bucket;
        }
        if let Some(region) = get("AWS_REGION") {
            self.storage.region = region;
        }
        if let Some(endpoint) = get("S3_ENDPOINT_URL") {
            self.storage.endpoint_url = endpoint;
        }
        if let Some(root) = get("FILES_DIR") {
            self.storage.root = root;
        }
        if let Some(tz) = get("DISPLAY_TIMEZONE") {
            self.display.timezone = tz;
        }
        if let Some(level) = get("LOG_LEVEL") {
            self.logging.level = level;
        }

        Ok(())
    }

    /// Validate the configuration.
    ///
    /// Returns `ConfigMissing` if:
    /// - the port is not set
    /// - the S3 backend is selected without a bucket name
    /// - the local backend is selected without a root directory
    ///
    /// Returns `Config` if the local root is not an existing directory.
    pub fn validate(&self) -> Result<()> {
        if self.server.port.is_none() {
            return Err(FiledropError::ConfigMissing(
                "server port must be set (server.port or $PORT)".to_string(),
            ));
        }

        match self.storage.backend {
            BackendKind::S3 => {
                if self.storage.bucket.is_empty() {
                    return Err(FiledropError::ConfigMissing(
                        "bucket name must be set (storage.bucket or $S3_BUCKET_NAME)".to_string(),
                    ));
                }
            }
            BackendKind::Local => {
                if self.storage.root.is_empty() {
                    return Err(FiledropError::ConfigMissing(
                        "files directory must be set (storage.root or $FILES_DIR)".to_string(),
                    ));
                }
                if !self.root_path().is_dir() {
                    return Err(FiledropError::Config(format!(
                        "files directory '{}' is not a directory",
                        self.storage.root
                    )));
                }
            }
        }

        Ok(())
    }

    /// Address to bind, once validated.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port.unwrap_or(0))
    }

    /// Root directory of the local backend.
    pub fn root_path(&self) -> PathBuf {
        PathBuf::from(&self.storage.root)
    }
}
