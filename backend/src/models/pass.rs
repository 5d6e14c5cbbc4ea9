//! Gate pass contract types consumed from the estate API.
//!
//! These mirror the upstream JSON field names exactly; the console only reads
//! them, it never owns or persists them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{PassId, ResidencyId, VisitorId};

/// Standard upstream envelope: `{ data, message?, success? }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub data: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            message: None,
            success: Some(true),
        }
    }

    pub fn into_data(self) -> T {
        self.data
    }
}

/// Outcome reported by a check-in or check-out call.
///
/// Anything outside the four accepted statuses is a business rejection
/// (`denied_expired`, `not_found`, ...) even when the transport succeeded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CheckinStatus {
    SelectVisitor,
    CheckedIn,
    CheckedOut,
    Active,
    Rejected(String),
}

impl CheckinStatus {
    pub fn as_str(&self) -> &str {
        match self {
            CheckinStatus::SelectVisitor => "select_visitor",
            CheckinStatus::CheckedIn => "checked_in",
            CheckinStatus::CheckedOut => "checked_out",
            CheckinStatus::Active => "active",
            CheckinStatus::Rejected(code) => code,
        }
    }

    /// True for every status that is not a rejection.
    pub fn is_accepted(&self) -> bool {
        !matches!(self, CheckinStatus::Rejected(_))
    }

    pub fn is_select_visitor(&self) -> bool {
        matches!(self, CheckinStatus::SelectVisitor)
    }
}

impl From<String> for CheckinStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "select_visitor" => CheckinStatus::SelectVisitor,
            "checked_in" => CheckinStatus::CheckedIn,
            "checked_out" => CheckinStatus::CheckedOut,
            "active" => CheckinStatus::Active,
            _ => CheckinStatus::Rejected(value),
        }
    }
}

impl From<&str> for CheckinStatus {
    fn from(value: &str) -> Self {
        CheckinStatus::from(value.to_string())
    }
}

impl From<CheckinStatus> for String {
    fn from(status: CheckinStatus) -> Self {
        match status {
            CheckinStatus::Rejected(code) => code,
            other => other.as_str().to_string(),
        }
    }
}

impl Default for CheckinStatus {
    fn default() -> Self {
        CheckinStatus::Rejected(String::new())
    }
}

impl std::fmt::Display for CheckinStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Residency the pass was issued under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResidencySnapshot {
    pub id: ResidencyId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub house_address: Option<String>,
}

/// Gate pass state at the time of the scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatePassSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<PassId>,
    pub code: String,
    #[serde(default)]
    pub max_uses: Option<u32>,
    #[serde(default)]
    pub valid_from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub valid_to: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub residency: Option<ResidencySnapshot>,
}

/// Person the pass belongs to.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OwnerSnapshot {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    /// `resident`, `visitor`, ...
    #[serde(default)]
    pub owner_type: Option<String>,
}

/// Response body of `POST /admin/passes/checkin` and `/admin/passes/checkout`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GatePassCheckinResponse {
    #[serde(default)]
    pub status: CheckinStatus,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub gate_pass: Option<GatePassSnapshot>,
    #[serde(default)]
    pub owner: Option<OwnerSnapshot>,
    #[serde(default)]
    pub uses_count: Option<u32>,
    #[serde(default)]
    pub max_uses: Option<u32>,
}

impl GatePassCheckinResponse {
    pub fn with_status(status: impl Into<CheckinStatus>, message: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            message: Some(message.into()),
            ..Default::default()
        }
    }

    /// Remaining uses, when the pass is capped.
    pub fn remaining_uses(&self) -> Option<u32> {
        let max = self
            .max_uses
            .or_else(|| self.gate_pass.as_ref().and_then(|p| p.max_uses))?;
        Some(max.saturating_sub(self.uses_count.unwrap_or(0)))
    }
}

/// Visitor attached to a gate pass (`GET /admin/passes/visitors/{code}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Visitor {
    pub id: VisitorId,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub pass_code_suffix: Option<String>,
    /// Full pass code, when the upstream embeds it on the visitor row.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pass_code: Option<String>,
}

impl Visitor {
    pub fn new(id: impl Into<VisitorId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: None,
            phone: None,
            pass_code_suffix: None,
            pass_code: None,
        }
    }

    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.pass_code_suffix = Some(suffix.into());
        self
    }

    /// Suffix with surrounding whitespace removed; blank suffixes count as absent.
    pub fn suffix(&self) -> Option<&str> {
        self.pass_code_suffix
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}
