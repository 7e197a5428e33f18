//! # Configuration Utilities
//!
//! Client configuration and its parsing. Configuration is read from a TOML file;
//! every field has a default so a missing file still yields a usable client.
//!
//! ## Base URL resolution
//!
//! The backend location is resolved in three tiers:
//! 1. An explicit override (`--api-url`, `PICKUP_API_URL`, or `api.base_url`)
//! 2. The configured host (`api.host`) at `api.port`
//! 3. The loopback default, [`DEFAULT_BASE_URL`]

use anyhow::Result;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Environment variable that overrides the backend base URL.
pub const API_URL_ENV: &str = "PICKUP_API_URL";

/// Port the backend listens on unless configured otherwise.
pub const DEFAULT_API_PORT: u16 = 5000;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";

/// Load a TOML configuration file and deserialize it into the specified type.
///
/// # Example
/// ```ignore
/// let config: ClientConfig = load_config("config/frontdesk.toml")?;
/// ```
pub fn load_config<T>(path: impl AsRef<Path>) -> Result<T>
where
    T: for<'de> Deserialize<'de>,
{
    let content = fs::read_to_string(path)?;
    let config: T = toml::from_str(&content)?;
    Ok(config)
}

/// Client configuration loaded from TOML file.
///
/// # Example TOML
///
/// ```toml
/// [api]
/// host = "frontdesk.school.local"
/// port = 5000
///
/// [capture]
/// width = 480
/// height = 480
/// jpeg_quality = 92
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
}

/// Where the backend lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Full base URL; takes precedence over `host`/`port`
    #[serde(default)]
    pub base_url: Option<String>,
    /// Host serving the front-end; the backend is assumed to run beside it
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            host: None,
            port: DEFAULT_API_PORT,
        }
    }
}

fn default_port() -> u16 {
    DEFAULT_API_PORT
}

/// Camera snapshot settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CaptureConfig {
    #[serde(default = "default_dimension")]
    pub width: u32,
    #[serde(default = "default_dimension")]
    pub height: u32,
    /// JPEG quality, 1-100
    #[serde(default = "default_quality")]
    pub jpeg_quality: u8,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            width: default_dimension(),
            height: default_dimension(),
            jpeg_quality: default_quality(),
        }
    }
}

fn default_dimension() -> u32 {
    480
}

fn default_quality() -> u8 {
    92
}

impl ClientConfig {
    /// Loads the configuration at `path`, or the defaults when there is no file.
    ///
    /// A file that exists but does not parse is still an error.
    pub fn from_file_or_default(path: Option<&str>) -> Result<Self> {
        match path {
            Some(path) if Path::new(path).exists() => load_config(path),
            Some(path) => {
                warn!("Config file {} not found, using defaults", path);
                Ok(Self::default())
            }
            None => Ok(Self::default()),
        }
    }

    /// Resolves the backend base URL, applying `override_url` first.
    pub fn base_url(&self, override_url: Option<&str>) -> String {
        let explicit = override_url.or(self.api.base_url.as_deref());
        let url = resolve_base_url(explicit, self.api.host.as_deref(), self.api.port);
        info!("Using backend at {}", url);
        url
    }
}

/// Three-tier base URL fallback. Blank values count as absent.
pub fn resolve_base_url(explicit: Option<&str>, host: Option<&str>, port: u16) -> String {
    let explicit = explicit.map(str::trim).filter(|s| !s.is_empty());
    let host = host.map(str::trim).filter(|s| !s.is_empty());

    let url = match (explicit, host) {
        (Some(url), _) => url.to_string(),
        (None, Some(host)) => format!("http://{}:{}", host, port),
        (None, None) => DEFAULT_BASE_URL.to_string(),
    };

    url.trim_end_matches('/').to_string()
}
