use serde::{Deserialize, Serialize};

use crate::models::VisitorId;

// =========================================================
// Gate pass check-in / check-out
// =========================================================

/// Route for checking a pass in
pub const CHECKIN_PATH: &str = "/admin/passes/checkin";

/// Route for checking a pass out
pub const CHECKOUT_PATH: &str = "/admin/passes/checkout";

/// Route prefix for listing the visitors sharing a base code
pub const VISITORS_PATH: &str = "/admin/passes/visitors";

/// Body of a check-in or check-out call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckinRequest {
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visitor_id: Option<VisitorId>,
}

impl CheckinRequest {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            visitor_id: None,
        }
    }

    pub fn for_visitor(code: impl Into<String>, visitor_id: VisitorId) -> Self {
        Self {
            code: code.into(),
            visitor_id: Some(visitor_id),
        }
    }
}

/// `GET /admin/passes/visitors/{pass_code}`
pub fn visitors_path(pass_code: &str) -> String {
    format!("{}/{}", VISITORS_PATH, pass_code)
}
