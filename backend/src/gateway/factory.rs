//! Gateway factory for dependency injection.
//!
//! Picks and builds the gateway implementation from runtime configuration.

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use super::config::{GatewayConfig, UpstreamConfig};
use super::error::{GatewayError, GatewayResult};
#[cfg(feature = "http-gateway")]
use super::http::HttpGateway;
use super::local::LocalGateway;
use super::pass_gateway::PassGateway;

/// Gateway type configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayType {
    /// Upstream estate REST API
    Http,
    /// In-memory pass registry
    Local,
}

impl FromStr for GatewayType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "http" | "upstream" => Ok(Self::Http),
            "local" | "memory" => Ok(Self::Local),
            _ => Err(format!("Unknown gateway type: {}", s)),
        }
    }
}

impl GatewayType {
    /// Get gateway type from environment variable.
    ///
    /// Reads `GATEWAY_TYPE`. Defaults to Http when an upstream base URL is
    /// present, otherwise to the build's default backend.
    pub fn from_env() -> Self {
        if let Ok(val) = std::env::var("GATEWAY_TYPE") {
            return val.parse().unwrap_or_else(|_| Self::build_default());
        }

        if std::env::var("ESTATE_API_BASE_URL").is_ok() {
            Self::Http
        } else {
            Self::build_default()
        }
    }

    /// Local when the `local-gateway` feature is enabled, Http otherwise.
    pub fn build_default() -> Self {
        if cfg!(feature = "local-gateway") {
            Self::Local
        } else {
            Self::Http
        }
    }
}

/// Gateway factory for creating gateway instances.
pub struct GatewayFactory;

impl GatewayFactory {
    /// Create a gateway instance based on type.
    ///
    /// # Arguments
    /// * `gateway_type` - Type of gateway to create
    /// * `upstream` - Upstream settings (required for Http)
    pub fn create(
        gateway_type: GatewayType,
        upstream: Option<&UpstreamConfig>,
    ) -> GatewayResult<Arc<dyn PassGateway>> {
        match gateway_type {
            GatewayType::Http => {
                let config = upstream.ok_or_else(|| {
                    GatewayError::configuration("HTTP gateway requires upstream settings")
                })?;
                Self::create_http(config)
            }
            GatewayType::Local => Ok(Self::create_local()),
        }
    }

    /// Create an upstream HTTP gateway.
    #[cfg(feature = "http-gateway")]
    pub fn create_http(config: &UpstreamConfig) -> GatewayResult<Arc<dyn PassGateway>> {
        Ok(Arc::new(HttpGateway::new(config.clone())?))
    }

    /// Create an upstream HTTP gateway when the feature is disabled.
    #[cfg(not(feature = "http-gateway"))]
    pub fn create_http(_config: &UpstreamConfig) -> GatewayResult<Arc<dyn PassGateway>> {
        Err(GatewayError::configuration(
            "HTTP gateway feature not enabled",
        ))
    }

    /// Create an empty in-memory gateway.
    pub fn create_local() -> Arc<dyn PassGateway> {
        Arc::new(LocalGateway::new())
    }

    /// Create a gateway from environment configuration.
    pub fn from_env() -> GatewayResult<Arc<dyn PassGateway>> {
        match GatewayType::from_env() {
            GatewayType::Http => {
                let config = UpstreamConfig::from_env().map_err(GatewayError::configuration)?;
                Self::create_http(&config)
            }
            GatewayType::Local => Ok(Self::create_local()),
        }
    }

    /// Create a gateway from a TOML configuration file.
    pub fn from_config_file<P: AsRef<Path>>(config_path: P) -> GatewayResult<Arc<dyn PassGateway>> {
        let config = GatewayConfig::from_file(config_path)?;
        Self::from_gateway_config(&config)
    }

    /// Create a gateway from a parsed configuration.
    pub fn from_gateway_config(config: &GatewayConfig) -> GatewayResult<Arc<dyn PassGateway>> {
        let gateway_type = config
            .gateway_type()
            .map_err(GatewayError::configuration)?;

        match gateway_type {
            GatewayType::Http => {
                let upstream = config.to_upstream_config()?;
                Self::create(GatewayType::Http, upstream.as_ref())
            }
            GatewayType::Local => match &config.local.seed_file {
                Some(path) => Ok(Arc::new(LocalGateway::from_seed_file(path)?)),
                None => Ok(Self::create_local()),
            },
        }
    }
}
