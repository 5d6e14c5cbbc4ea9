//! Gateway module: the estate API calls the console depends on.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Console driver / HTTP handlers                         │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  PassGateway trait (pass_gateway.rs)                     │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//!     ┌───────────────┴──────────────────┐
//!     │  LocalGateway   │   HttpGateway   │
//!     │  (in-memory)    │   (reqwest)     │
//!     └──────────────────────────────────┘
//! ```
//!
//! Use [`GatewayFactory`] to build the implementation selected by
//! `gateway.toml` or the environment.

#[cfg(not(any(feature = "local-gateway", feature = "http-gateway")))]
compile_error!("Enable at least one gateway backend feature.");

pub mod config;
pub mod error;
pub mod factory;
#[cfg(feature = "http-gateway")]
pub mod http;
pub mod local;
pub mod pass_gateway;

pub use config::{GatewayConfig, UpstreamConfig};
pub use error::{ErrorContext, GatewayError, GatewayResult, GENERIC_FAILURE_MESSAGE};
pub use factory::{GatewayFactory, GatewayType};
#[cfg(feature = "http-gateway")]
pub use http::HttpGateway;
pub use local::{GatewayCall, LocalGateway, LocalPass, LocalSeed};
pub use pass_gateway::PassGateway;
