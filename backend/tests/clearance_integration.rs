use serde_json::json;

use estate_gate::gateway::{LocalGateway, LocalSeed, PassGateway};
use estate_gate::models::{GateStatus, GateStatusMap, VisitorId};
use estate_gate::services::{build_clearance_path, build_clearance_timeline, ClearanceState};

fn visitor_detail() -> serde_json::Value {
    json!({
        "data": {
            "id": 77,
            "name": "Kemi",
            "dependency_gate_map": {
                "1": {"gate": {"id": 1, "name": "Estate Entrance"}, "status": "checked_out",
                      "event": {"checkin_time": "2024-05-01T08:00:00Z", "checkout_time": "2024-05-01T08:02:00Z"},
                      "message": null},
                "2": {"gate": {"id": 2, "name": "Phase 2"}, "status": "checked_in",
                      "dependency_gate": {"id": 1}, "message": null},
                "3": {"gate": {"id": 3, "name": "Back Gate"}, "status": "unavailable",
                      "dependency_gate": {"id": 1}, "message": "Closed for repairs"},
                "4": {"gate": {"id": 4, "name": "Block C"}, "status": "pending",
                      "dependency_gate": {"id": 2}, "message": null},
                "5": {"gate": {"id": 5, "name": "Service Lane"}, "status": "locked",
                      "dependency_gate": {"id": 99}, "message": null},
                "6": null
            }
        }
    })
}

#[test]
fn test_detail_payload_to_clearance_path() {
    let map = GateStatusMap::from_visitor_payload(&visitor_detail())
        .unwrap()
        .unwrap();
    assert_eq!(map.len(), 6);

    let path = build_clearance_path(&map);
    let main: Vec<&str> = path.main_path.iter().map(|r| r.gate_id().as_str()).collect();
    // Live root first, dangling-dependency root after it.
    assert_eq!(main, vec!["1", "2", "4", "5"]);
    assert_eq!(path.branch("1").len(), 1);
    assert_eq!(path.branch("1")[0].status, GateStatus::Unavailable);
    assert_eq!(path.len(), 5);
}

#[test]
fn test_timeline_from_detail_payload() {
    let map = GateStatusMap::from_visitor_payload(&visitor_detail())
        .unwrap()
        .unwrap();
    let timeline = build_clearance_timeline(&map);

    let states: Vec<ClearanceState> = timeline.nodes.iter().map(|n| n.gate.state).collect();
    assert_eq!(
        states,
        vec![
            ClearanceState::Cleared,
            ClearanceState::Cleared,
            ClearanceState::Pending,
            ClearanceState::Locked,
        ]
    );
    assert_eq!(timeline.nodes[0].gate.gate_name.as_deref(), Some("Estate Entrance"));
    assert!(timeline.nodes[0].checkout_time.is_some());
    assert_eq!(
        timeline.nodes[0].branches[0].message.as_deref(),
        Some("Closed for repairs")
    );
}

#[tokio::test]
async fn test_gateway_fetch_feeds_builder() {
    let mut seed = LocalSeed::default();
    seed.visitor_details.insert("77".to_string(), visitor_detail());
    let gw = LocalGateway::from_seed(seed).unwrap();

    let map = gw.fetch_gate_statuses(&VisitorId::new("77")).await.unwrap();
    assert_eq!(build_clearance_path(&map).len(), 5);

    assert!(gw.fetch_gate_statuses(&VisitorId::new("78")).await.is_err());
}
