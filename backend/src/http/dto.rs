//! Data Transfer Objects for the HTTP API.
//!
//! Request bodies are defined here; response types that already derive
//! Serialize/Deserialize are re-exported from the core modules.

use serde::{Deserialize, Serialize};

pub use crate::models::{GatePassCheckinResponse, Visitor};
pub use crate::services::clearance::{ClearanceTimeline, TimelineBranch, TimelineNode};
pub use crate::services::console::{ConsoleView, ScanMode};
pub use crate::services::pass_code::DispatchDecision;

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// API version
    pub version: String,
    /// Upstream gateway status
    pub gateway: String,
}

/// Query parameters for resolving a pass code.
#[derive(Debug, Clone, Deserialize)]
pub struct ResolveQuery {
    #[serde(default)]
    pub code: String,
}

/// Classification of a pass code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveResponse {
    pub code: String,
    pub base_code: String,
    pub suffix: Option<String>,
    pub is_three_part: bool,
    pub decision: DispatchDecision,
}

/// Request body for a scan: the code as entered and the console mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanRequest {
    pub code: String,
    #[serde(default)]
    pub mode: ScanMode,
}

/// Request body for submitting on behalf of a visitor picked from the list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectRequest {
    /// Base code the visitor list was loaded for
    pub code: String,
    #[serde(default)]
    pub mode: ScanMode,
    pub visitor: Visitor,
}
