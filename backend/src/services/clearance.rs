//! Gate clearance path construction.
//!
//! A visitor's gate statuses form a forest: each record may name the gate
//! that must be cleared before it. [`build_clearance_path`] flattens that into
//! a main path (left-to-right timeline) plus branch lists hanging off it for
//! unavailable gates. Cycles and dangling dependency references are tolerated;
//! every record lands in exactly one place.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::models::{GateId, GateStatus, GateStatusMap, VisitorGateStatus};

/// Branch bucket used when an unavailable gate has nothing to attach to.
pub const ROOT_BRANCH: &str = "root";

/// Main path plus branch lists keyed by the gate they hang from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GateClearancePath {
    pub main_path: Vec<VisitorGateStatus>,
    pub branches: BTreeMap<String, Vec<VisitorGateStatus>>,
}

impl GateClearancePath {
    /// Number of records across the main path and all branches.
    pub fn len(&self) -> usize {
        self.main_path.len() + self.branches.values().map(Vec::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn branch(&self, anchor: &str) -> &[VisitorGateStatus] {
        self.branches.get(anchor).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Live progress sorts before dead ends.
fn priority(status: GateStatus) -> u8 {
    if status.is_live() {
        0
    } else {
        1
    }
}

struct PathBuilder<'a> {
    records: Vec<&'a VisitorGateStatus>,
    children: HashMap<&'a str, Vec<usize>>,
    visited: Vec<bool>,
    visited_gates: HashSet<&'a str>,
    path: GateClearancePath,
}

impl<'a> PathBuilder<'a> {
    fn new(records: Vec<&'a VisitorGateStatus>) -> Self {
        let mut children: HashMap<&'a str, Vec<usize>> = HashMap::new();
        for (idx, record) in records.iter().enumerate() {
            if let Some(parent) = record.dependency_id() {
                children.entry(parent.as_str()).or_default().push(idx);
            }
        }
        let n = records.len();
        Self {
            records,
            children,
            visited: vec![false; n],
            visited_gates: HashSet::new(),
            path: GateClearancePath::default(),
        }
    }

    fn sort_by_priority(&self, indices: &mut [usize]) {
        indices.sort_by_key(|&idx| priority(self.records[idx].status));
    }

    /// Depth-first walk from `start`, children in priority order.
    fn walk(&mut self, start: usize) {
        let mut stack = vec![start];
        while let Some(idx) = stack.pop() {
            if self.visited[idx] {
                continue;
            }
            let record = self.records[idx];

            if record.status == GateStatus::Unavailable {
                let anchor = self.branch_anchor(record);
                self.mark_visited(idx);
                self.path.branches.entry(anchor).or_default().push(record.clone());
                continue;
            }

            self.mark_visited(idx);
            self.path.main_path.push(record.clone());

            let mut next: Vec<usize> = self
                .children
                .get(record.gate_id().as_str())
                .map(|c| c.iter().copied().filter(|&i| !self.visited[i]).collect())
                .unwrap_or_default();
            self.sort_by_priority(&mut next);
            // Reversed so the highest-priority child is popped first.
            stack.extend(next.into_iter().rev());
        }
    }

    fn mark_visited(&mut self, idx: usize) {
        self.visited[idx] = true;
        self.visited_gates.insert(self.records[idx].gate_id().as_str());
    }

    /// Declared dependency if already visited, else the head of the main path,
    /// else the synthetic root bucket.
    fn branch_anchor(&self, record: &VisitorGateStatus) -> String {
        if let Some(dep) = record.dependency_id() {
            if self.visited_gates.contains(dep.as_str()) {
                return dep.to_string();
            }
        }
        self.path
            .main_path
            .first()
            .map(|head| head.gate_id().to_string())
            .unwrap_or_else(|| ROOT_BRANCH.to_string())
    }
}

/// Build the clearance path for a visitor's gate map.
pub fn build_clearance_path(map: &GateStatusMap) -> GateClearancePath {
    let records: Vec<&VisitorGateStatus> = map.records().collect();
    let mut builder = PathBuilder::new(records);

    let mut roots: Vec<usize> = builder
        .records
        .iter()
        .enumerate()
        .filter(|(_, r)| match r.dependency_id() {
            None => true,
            Some(dep) => !map.contains_key(dep.as_str()),
        })
        .map(|(idx, _)| idx)
        .collect();
    builder.sort_by_priority(&mut roots);

    for root in roots {
        builder.walk(root);
    }

    // Anything still unvisited sits on a cycle or hangs off an unavailable gate.
    for idx in 0..builder.records.len() {
        if !builder.visited[idx] {
            log::debug!(
                "clearance: gate {} unreachable from roots, processing directly",
                builder.records[idx].gate_id()
            );
            builder.walk(idx);
        }
    }

    builder.path
}

// =========================================================
// Timeline rendering contract
// =========================================================

/// Visual state of a gate node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClearanceState {
    Cleared,
    Pending,
    Locked,
    Blocked,
}

impl From<GateStatus> for ClearanceState {
    fn from(status: GateStatus) -> Self {
        match status {
            GateStatus::CheckedIn | GateStatus::CheckedOut => ClearanceState::Cleared,
            GateStatus::Pending => ClearanceState::Pending,
            GateStatus::Locked => ClearanceState::Locked,
            GateStatus::Unavailable | GateStatus::Unknown => ClearanceState::Blocked,
        }
    }
}

/// Secondary node stacked under a main path node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineBranch {
    pub gate_id: GateId,
    pub gate_name: Option<String>,
    pub status: GateStatus,
    pub state: ClearanceState,
    pub message: Option<String>,
}

impl From<&VisitorGateStatus> for TimelineBranch {
    fn from(record: &VisitorGateStatus) -> Self {
        Self {
            gate_id: record.gate.id.clone(),
            gate_name: record.gate.name.clone(),
            status: record.status,
            state: record.status.into(),
            message: record.message.clone(),
        }
    }
}

/// Main path node with its attached branches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineNode {
    #[serde(flatten)]
    pub gate: TimelineBranch,
    pub checkin_time: Option<chrono::DateTime<chrono::Utc>>,
    pub checkout_time: Option<chrono::DateTime<chrono::Utc>>,
    pub branches: Vec<TimelineBranch>,
}

/// Render-ready clearance path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClearanceTimeline {
    pub nodes: Vec<TimelineNode>,
    /// Branches whose anchor is not on the main path (the `root` bucket, or
    /// an unavailable gate that itself sits in a branch).
    pub detached: Vec<TimelineBranch>,
}

impl From<&GateClearancePath> for ClearanceTimeline {
    fn from(path: &GateClearancePath) -> Self {
        let on_path: HashSet<&str> = path.main_path.iter().map(|r| r.gate_id().as_str()).collect();

        let nodes = path
            .main_path
            .iter()
            .map(|record| {
                let event = record.event.as_ref();
                TimelineNode {
                    gate: TimelineBranch::from(record),
                    checkin_time: event.and_then(|e| e.checkin_time),
                    checkout_time: event.and_then(|e| e.checkout_time),
                    branches: path.branch(record.gate_id().as_str()).iter().map(Into::into).collect(),
                }
            })
            .collect();

        let detached = path
            .branches
            .iter()
            .filter(|(anchor, _)| !on_path.contains(anchor.as_str()))
            .flat_map(|(_, records)| records.iter().map(TimelineBranch::from))
            .collect();

        Self { nodes, detached }
    }
}

/// Build the render-ready timeline directly from a gate map.
pub fn build_clearance_timeline(map: &GateStatusMap) -> ClearanceTimeline {
    ClearanceTimeline::from(&build_clearance_path(map))
}
