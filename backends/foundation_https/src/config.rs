use crate::tls::TlsVerification;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default cap on the response body and on the header block scan.
pub const DEFAULT_RESPONSE_SIZE_LIMIT: usize = 1_048_576;

/// Errors raised while loading an [`HttpsCallConfig`].
#[derive(Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    IOError(std::io::Error),

    /// The document is not valid TOML or does not match the schema.
    DeserializationFailed(toml::de::Error),

    /// No `host` was configured.
    MissingHost,
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        Self::DeserializationFailed(value)
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        Self::IOError(value)
    }
}

impl std::error::Error for ConfigError {}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IOError(err) => write!(f, "Failed to read config: {err}"),
            Self::DeserializationFailed(err) => write!(f, "Invalid config: {err}"),
            Self::MissingHost => write!(f, "Config has no host"),
        }
    }
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Settings for an [`crate::HttpsCall`].
///
/// Loadable from TOML; missing keys take their defaults:
///
/// ```toml
/// host = "rpc.example.com"
/// port = 8443
/// response_size_limit = 65536
/// verification = "disabled"
/// connect_timeout_ms = 2000
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpsCallConfig {
    pub host: String,
    pub port: Option<u16>,
    pub response_size_limit: usize,
    pub verification: TlsVerification,
    pub connect_timeout_ms: Option<u64>,
    pub io_timeout_ms: Option<u64>,
}

impl Default for HttpsCallConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: None,
            response_size_limit: DEFAULT_RESPONSE_SIZE_LIMIT,
            verification: TlsVerification::default(),
            connect_timeout_ms: None,
            io_timeout_ms: None,
        }
    }
}

impl HttpsCallConfig {
    /// Defaults for `host`: port 443, 1 MiB limit, verified TLS, no timeouts.
    pub fn new<S: Into<String>>(host: S) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }

    /// Parses a TOML document.
    ///
    /// # Errors
    ///
    /// `DeserializationFailed` for invalid TOML and `MissingHost` when no
    /// host is set.
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(content)?;
        config.validated()
    }

    /// Reads and parses a TOML file.
    ///
    /// # Errors
    ///
    /// `IOError` if the file cannot be read, otherwise as
    /// [`HttpsCallConfig::from_toml_str`].
    pub fn from_path<V: Into<std::path::PathBuf>>(target: V) -> ConfigResult<Self> {
        let target_path = target.into();
        let content = std::fs::read_to_string(target_path)?;
        Self::from_toml_str(&content)
    }

    fn validated(self) -> ConfigResult<Self> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::MissingHost);
        }
        Ok(self)
    }

    /// Overrides the port of every resolved address.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Caps both the body and the header block scan.
    #[must_use]
    pub fn with_response_size_limit(mut self, limit: usize) -> Self {
        self.response_size_limit = limit;
        self
    }

    #[must_use]
    pub fn with_verification(mut self, verification: TlsVerification) -> Self {
        self.verification = verification;
        self
    }

    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout_ms = Some(duration_to_ms(timeout));
        self
    }

    #[must_use]
    pub fn with_io_timeout(mut self, timeout: Duration) -> Self {
        self.io_timeout_ms = Some(duration_to_ms(timeout));
        self
    }

    /// TCP connect timeout, if any.
    #[must_use]
    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_ms.map(Duration::from_millis)
    }

    /// Socket read and write timeout, if any.
    #[must_use]
    pub fn io_timeout(&self) -> Option<Duration> {
        self.io_timeout_ms.map(Duration::from_millis)
    }
}

fn duration_to_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
