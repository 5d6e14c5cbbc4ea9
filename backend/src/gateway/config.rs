//! Gateway configuration.
//!
//! Settings come from a `gateway.toml` file or, for the upstream API, from
//! environment variables.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use super::error::GatewayError;
use super::factory::GatewayType;

/// Default upstream request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// Gateway configuration from file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub gateway: GatewaySettings,
    #[serde(default)]
    pub upstream: UpstreamSettings,
    #[serde(default)]
    pub local: LocalSettings,
}

/// Gateway type settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewaySettings {
    #[serde(rename = "type")]
    pub gateway_type: String,
}

/// Upstream estate API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamSettings {
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub api_token: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// In-memory gateway settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocalSettings {
    /// JSON seed with passes and visitor gate maps.
    #[serde(default)]
    pub seed_file: Option<PathBuf>,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for UpstreamSettings {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_token: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Resolved connection settings for the upstream estate API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamConfig {
    /// Base URL without trailing slash, e.g. `https://estate.example.com/api`
    pub base_url: String,
    /// Bearer token sent with every request
    pub api_token: Option<String>,
    pub timeout_secs: u64,
}

impl UpstreamConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_token: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Load upstream settings from environment variables.
    ///
    /// # Environment Variables
    /// - `ESTATE_API_BASE_URL` (required): upstream base URL
    /// - `ESTATE_API_TOKEN` (optional): bearer token
    /// - `ESTATE_API_TIMEOUT_SECS` (optional, default: 20)
    ///
    /// # Errors
    /// Returns an error if the base URL is missing or the timeout is not a number.
    pub fn from_env() -> Result<Self, String> {
        let base_url = env::var("ESTATE_API_BASE_URL")
            .map_err(|_| "ESTATE_API_BASE_URL environment variable not set".to_string())?;
        if base_url.trim().is_empty() {
            return Err("ESTATE_API_BASE_URL must not be empty".to_string());
        }
        let api_token = env::var("ESTATE_API_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty());
        let timeout_secs = match env::var("ESTATE_API_TIMEOUT_SECS") {
            Ok(v) => v
                .parse()
                .map_err(|_| "ESTATE_API_TIMEOUT_SECS must be a whole number of seconds".to_string())?,
            Err(_) => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            api_token,
            timeout_secs,
            ..Self::new(base_url.trim())
        })
    }
}

impl GatewayConfig {
    /// Load gateway configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, GatewayError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            GatewayError::configuration(format!("Failed to read config file: {}", e))
        })?;

        toml::from_str(&content).map_err(|e| {
            GatewayError::configuration(format!("Failed to parse config file: {}", e))
        })
    }

    /// Load gateway configuration from the default location.
    ///
    /// Searches for `gateway.toml` in:
    /// 1. Current directory
    /// 2. `backend/` directory
    /// 3. Parent directory
    pub fn from_default_location() -> Result<Self, GatewayError> {
        let search_paths = [
            PathBuf::from("gateway.toml"),
            PathBuf::from("backend/gateway.toml"),
            PathBuf::from("../gateway.toml"),
        ];

        for path in search_paths {
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        Err(GatewayError::configuration(
            "No gateway.toml found in standard locations",
        ))
    }

    /// Get the gateway type from configuration.
    pub fn gateway_type(&self) -> Result<GatewayType, String> {
        GatewayType::from_str(&self.gateway.gateway_type)
    }

    /// Upstream settings, when this configuration selects the HTTP gateway.
    pub fn to_upstream_config(&self) -> Result<Option<UpstreamConfig>, GatewayError> {
        let gateway_type = self.gateway_type().map_err(|e| {
            GatewayError::configuration(format!("Invalid gateway type: {}", e))
        })?;

        if gateway_type != GatewayType::Http {
            return Ok(None);
        }

        if self.upstream.base_url.trim().is_empty() {
            return Err(GatewayError::configuration(
                "HTTP gateway requires 'upstream.base_url' setting",
            ));
        }

        Ok(Some(UpstreamConfig {
            api_token: self.upstream.api_token.clone(),
            timeout_secs: self.upstream.timeout_secs,
            ..UpstreamConfig::new(self.upstream.base_url.trim())
        }))
    }
}
