//! Public API surface for the gate console backend.
//!
//! This file consolidates the DTO types exchanged with the estate API and with
//! a console frontend. All types derive Serialize/Deserialize for JSON
//! serialization.

pub use crate::models::ApiResponse;
pub use crate::models::CheckinStatus;
pub use crate::models::GateEvent;
pub use crate::models::GateId;
pub use crate::models::GatePassCheckinResponse;
pub use crate::models::GatePassSnapshot;
pub use crate::models::GateRef;
pub use crate::models::GateStatus;
pub use crate::models::GateStatusMap;
pub use crate::models::OwnerSnapshot;
pub use crate::models::PassId;
pub use crate::models::ResidencyId;
pub use crate::models::ResidencySnapshot;
pub use crate::models::Visitor;
pub use crate::models::VisitorGateStatus;
pub use crate::models::VisitorId;
pub use crate::routes::passes::CheckinRequest;
pub use crate::services::clearance::ClearanceState;
pub use crate::services::clearance::ClearanceTimeline;
pub use crate::services::clearance::GateClearancePath;
pub use crate::services::clearance::TimelineBranch;
pub use crate::services::clearance::TimelineNode;
pub use crate::services::console::ConsolePanel;
pub use crate::services::console::ConsolePhase;
pub use crate::services::console::ConsoleView;
pub use crate::services::console::ErrorResult;
pub use crate::services::console::InFlight;
pub use crate::services::console::ScanMode;
pub use crate::services::pass_code::DispatchDecision;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_with_checkin_response() {
        let body = json!({
            "data": {
                "status": "checked_out",
                "message": "Bye",
                "gate_pass": {"code": "RES-001", "max_uses": 3},
                "uses_count": 2
            },
            "success": true
        });
        let envelope: ApiResponse<GatePassCheckinResponse> = serde_json::from_value(body).unwrap();
        let data = envelope.into_data();
        assert_eq!(data.status, CheckinStatus::CheckedOut);
        assert_eq!(data.remaining_uses(), Some(1));
    }

    #[test]
    fn test_envelope_with_visitor_list() {
        let body = json!({
            "data": [
                {"id": 11, "name": "Ada", "email": null, "phone": "0800", "pass_code_suffix": "001"}
            ]
        });
        let envelope: ApiResponse<Vec<Visitor>> = serde_json::from_value(body).unwrap();
        let visitors = envelope.into_data();
        assert_eq!(visitors[0].id, VisitorId::new("11"));
        assert_eq!(visitors[0].suffix(), Some("001"));
    }

    #[test]
    fn test_scan_mode_wire_names() {
        assert_eq!(serde_json::to_value(ScanMode::CheckIn).unwrap(), "check_in");
        assert_eq!(serde_json::to_value(ScanMode::CheckOut).unwrap(), "check_out");
    }
}
