use std::collections::HashSet;

use proptest::prelude::*;
use serde_json::json;

use crate::models::{GateRef, GateStatus, GateStatusMap, VisitorGateStatus};
use crate::services::clearance::{
    build_clearance_path, build_clearance_timeline, ClearanceState, GateClearancePath, ROOT_BRANCH,
};

fn gate(id: &str, status: GateStatus) -> VisitorGateStatus {
    VisitorGateStatus::new(GateRef::new(id, format!("Gate {}", id)), status)
}

fn ids(records: &[VisitorGateStatus]) -> Vec<&str> {
    records.iter().map(|r| r.gate_id().as_str()).collect()
}

fn all_ids(path: &GateClearancePath) -> Vec<String> {
    path.main_path
        .iter()
        .chain(path.branches.values().flatten())
        .map(|r| r.gate_id().to_string())
        .collect()
}

#[test]
fn test_empty_map_builds_empty_path() {
    let path = build_clearance_path(&GateStatusMap::new());
    assert!(path.is_empty());
    assert!(path.branches.is_empty());
}

#[test]
fn test_linear_chain_follows_dependencies() {
    let map: GateStatusMap = vec![
        gate("c", GateStatus::Pending).depends_on("b"),
        gate("a", GateStatus::CheckedOut),
        gate("b", GateStatus::CheckedIn).depends_on("a"),
    ]
    .into_iter()
    .collect();

    let path = build_clearance_path(&map);
    assert_eq!(ids(&path.main_path), vec!["a", "b", "c"]);
    assert!(path.branches.is_empty());
}

#[test]
fn test_live_children_sort_before_dead_ends() {
    let map: GateStatusMap = vec![
        gate("main", GateStatus::CheckedIn),
        gate("locked", GateStatus::Locked).depends_on("main"),
        gate("next", GateStatus::Pending).depends_on("main"),
    ]
    .into_iter()
    .collect();

    let path = build_clearance_path(&map);
    assert_eq!(ids(&path.main_path), vec!["main", "next", "locked"]);
}

#[test]
fn test_sibling_order_is_stable_within_priority() {
    let map: GateStatusMap = vec![
        gate("root", GateStatus::CheckedIn),
        gate("x", GateStatus::Pending).depends_on("root"),
        gate("y", GateStatus::Pending).depends_on("root"),
        gate("z", GateStatus::CheckedOut).depends_on("root"),
    ]
    .into_iter()
    .collect();

    let path = build_clearance_path(&map);
    assert_eq!(ids(&path.main_path), vec!["root", "x", "y", "z"]);
}

#[test]
fn test_unavailable_gate_hangs_off_its_dependency() {
    let map: GateStatusMap = vec![
        gate("a", GateStatus::CheckedIn),
        gate("b", GateStatus::Pending).depends_on("a"),
        gate("alt", GateStatus::Unavailable).depends_on("b"),
    ]
    .into_iter()
    .collect();

    let path = build_clearance_path(&map);
    assert_eq!(ids(&path.main_path), vec!["a", "b"]);
    assert_eq!(ids(path.branch("b")), vec!["alt"]);
}

#[test]
fn test_unavailable_root_attaches_to_path_head() {
    // Roots are priority sorted, so the live root is walked first.
    let map: GateStatusMap = vec![
        gate("blocked", GateStatus::Unavailable),
        gate("entry", GateStatus::CheckedIn),
    ]
    .into_iter()
    .collect();

    let path = build_clearance_path(&map);
    assert_eq!(ids(&path.main_path), vec!["entry"]);
    assert_eq!(ids(path.branch("entry")), vec!["blocked"]);
}

#[test]
fn test_unavailable_with_nothing_visited_goes_to_root_bucket() {
    let map: GateStatusMap = vec![gate("only", GateStatus::Unavailable)].into_iter().collect();

    let path = build_clearance_path(&map);
    assert!(path.main_path.is_empty());
    assert_eq!(ids(path.branch(ROOT_BRANCH)), vec!["only"]);
}

#[test]
fn test_dangling_dependency_is_a_root() {
    let map: GateStatusMap = vec![gate("orphan", GateStatus::Pending).depends_on("ghost")]
        .into_iter()
        .collect();

    let path = build_clearance_path(&map);
    assert_eq!(ids(&path.main_path), vec!["orphan"]);
}

#[test]
fn test_cycle_is_swept_without_looping() {
    let map: GateStatusMap = vec![
        gate("p", GateStatus::Pending).depends_on("q"),
        gate("q", GateStatus::Pending).depends_on("p"),
    ]
    .into_iter()
    .collect();

    let path = build_clearance_path(&map);
    assert_eq!(ids(&path.main_path), vec!["p", "q"]);
}

#[test]
fn test_self_dependency_is_swept() {
    let map: GateStatusMap = vec![gate("loop", GateStatus::Locked).depends_on("loop")]
        .into_iter()
        .collect();

    let path = build_clearance_path(&map);
    assert_eq!(ids(&path.main_path), vec!["loop"]);
}

#[test]
fn test_children_of_unavailable_gate_are_not_lost() {
    let map: GateStatusMap = vec![
        gate("a", GateStatus::CheckedIn),
        gate("u", GateStatus::Unavailable).depends_on("a"),
        gate("under", GateStatus::Pending).depends_on("u"),
    ]
    .into_iter()
    .collect();

    let path = build_clearance_path(&map);
    assert_eq!(ids(&path.main_path), vec!["a", "under"]);
    assert_eq!(ids(path.branch("a")), vec!["u"]);
}

#[test]
fn test_null_entries_are_discarded() {
    let map: GateStatusMap = serde_json::from_value(json!({
        "g1": {"gate": {"id": "g1"}, "status": "checked_in"},
        "g2": null
    }))
    .unwrap();

    let path = build_clearance_path(&map);
    assert_eq!(path.len(), 1);
}

#[test]
fn test_dependency_without_id_is_a_root() {
    let map: GateStatusMap = serde_json::from_value(json!({
        "g1": {"gate": {"id": "g1"}, "status": "checked_in"},
        "g2": {"gate": {"id": "g2"}, "status": "pending", "dependency_gate": {"id": null}},
        "g3": {"gate": {"id": "g3"}, "status": "locked", "dependency_gate": {}},
        "g4": {"gate": {"id": "g4"}, "status": "pending", "dependency_gate": null}
    }))
    .unwrap();
    assert_eq!(map.records().count(), 4);
    assert!(map.records().all(|r| r.dependency_id().is_none()));

    let path = build_clearance_path(&map);
    assert_eq!(path.len(), 4);
    assert_eq!(ids(&path.main_path), vec!["g1", "g2", "g4", "g3"]);
}

#[test]
fn test_timeline_states_and_branches() {
    let mut checked_in = gate("a", GateStatus::CheckedIn);
    checked_in.event = Some(crate::models::GateEvent {
        checkin_time: Some("2024-05-01T08:00:00Z".parse().unwrap()),
        checkout_time: None,
    });
    let map: GateStatusMap = vec![
        checked_in,
        gate("b", GateStatus::Locked).depends_on("a"),
        gate("alt", GateStatus::Unavailable).depends_on("a").with_message("Closed"),
    ]
    .into_iter()
    .collect();

    let timeline = build_clearance_timeline(&map);
    assert_eq!(timeline.nodes.len(), 2);
    assert_eq!(timeline.nodes[0].gate.state, ClearanceState::Cleared);
    assert!(timeline.nodes[0].checkin_time.is_some());
    assert_eq!(timeline.nodes[0].branches.len(), 1);
    assert_eq!(timeline.nodes[0].branches[0].state, ClearanceState::Blocked);
    assert_eq!(timeline.nodes[0].branches[0].message.as_deref(), Some("Closed"));
    assert_eq!(timeline.nodes[1].gate.state, ClearanceState::Locked);
    assert!(timeline.detached.is_empty());
}

#[test]
fn test_timeline_detaches_root_bucket() {
    let map: GateStatusMap = vec![gate("x", GateStatus::Unavailable)].into_iter().collect();

    let timeline = build_clearance_timeline(&map);
    assert!(timeline.nodes.is_empty());
    assert_eq!(timeline.detached.len(), 1);
}

#[test]
fn test_timeline_serializes_flat_nodes() {
    let map: GateStatusMap = vec![gate("a", GateStatus::Pending)].into_iter().collect();

    let value = serde_json::to_value(build_clearance_timeline(&map)).unwrap();
    assert_eq!(value["nodes"][0]["gate_id"], "a");
    assert_eq!(value["nodes"][0]["state"], "pending");
}

// ---------------------------------------------------------------------------
// Property tests
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum Dep {
    None,
    Index(usize),
    Dangling,
}

fn status_strategy() -> impl Strategy<Value = GateStatus> {
    prop_oneof![
        Just(GateStatus::Pending),
        Just(GateStatus::CheckedIn),
        Just(GateStatus::CheckedOut),
        Just(GateStatus::Locked),
        Just(GateStatus::Unavailable),
    ]
}

fn dep_strategy() -> impl Strategy<Value = Dep> {
    prop_oneof![
        Just(Dep::None),
        (0usize..16).prop_map(Dep::Index),
        Just(Dep::Dangling),
    ]
}

/// Maps of 2..16 gates that always contain a two-node cycle and a dangling
/// dependency reference.
fn gate_map_strategy() -> impl Strategy<Value = GateStatusMap> {
    prop::collection::vec((status_strategy(), dep_strategy()), 2..16).prop_map(|entries| {
        let n = entries.len();
        entries
            .into_iter()
            .enumerate()
            .map(|(i, (status, dep))| {
                let dep = match i {
                    0 => Dep::Index(1),
                    1 => Dep::Index(0),
                    _ if i == n - 1 => Dep::Dangling,
                    _ => dep,
                };
                let record = gate(&format!("g{}", i), status);
                match dep {
                    Dep::None => record,
                    Dep::Index(j) => record.depends_on(format!("g{}", j % n)),
                    Dep::Dangling => record.depends_on(format!("missing{}", i)),
                }
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn prop_every_record_placed_exactly_once(map in gate_map_strategy()) {
        let path = build_clearance_path(&map);
        let placed = all_ids(&path);
        let unique: HashSet<&String> = placed.iter().collect();

        prop_assert_eq!(path.len(), map.records().count());
        prop_assert_eq!(unique.len(), placed.len());
        for key in map.keys() {
            prop_assert!(unique.contains(&key.to_string()));
        }
    }

    #[test]
    fn prop_unavailable_never_on_main_path(map in gate_map_strategy()) {
        let path = build_clearance_path(&map);
        prop_assert!(path.main_path.iter().all(|r| r.status != GateStatus::Unavailable));
        prop_assert!(path.branches.values().flatten().all(|r| r.status == GateStatus::Unavailable));
    }

    #[test]
    fn prop_timeline_covers_path(map in gate_map_strategy()) {
        let path = build_clearance_path(&map);
        let timeline = build_clearance_timeline(&map);
        let rendered = timeline.nodes.len()
            + timeline.nodes.iter().map(|n| n.branches.len()).sum::<usize>()
            + timeline.detached.len();
        prop_assert_eq!(rendered, path.len());
    }
}
