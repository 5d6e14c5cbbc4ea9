//! In-memory gateway implementation.
//!
//! Answers check-in, check-out and visitor lookups the way the estate API
//! does, from a pass registry held in memory. Every call is recorded so tests
//! can assert exactly which requests a console action issued.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::Arc;

use super::error::{GatewayError, GatewayResult};
use super::pass_gateway::PassGateway;
use crate::models::{
    CheckinStatus, GatePassCheckinResponse, GatePassSnapshot, GateStatusMap, OwnerSnapshot,
    PassId, ResidencySnapshot, Visitor, VisitorId,
};
use crate::routes::passes::CheckinRequest;
use crate::services::pass_code::{normalize_code, parse_code};

/// A gate pass as held by the local registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalPass {
    pub id: PassId,
    /// `GATE-XXXXX` or `RES-XXX`, stored normalized.
    pub base_code: String,
    #[serde(default)]
    pub owner: OwnerSnapshot,
    #[serde(default)]
    pub residency: Option<ResidencySnapshot>,
    #[serde(default)]
    pub visitors: Vec<Visitor>,
    #[serde(default)]
    pub max_uses: Option<u32>,
    #[serde(default)]
    pub uses_count: u32,
    #[serde(default)]
    pub valid_from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub valid_to: Option<DateTime<Utc>>,
}

impl LocalPass {
    pub fn new(id: impl Into<PassId>, base_code: &str) -> Self {
        Self {
            id: id.into(),
            base_code: normalize_code(base_code),
            owner: OwnerSnapshot::default(),
            residency: None,
            visitors: Vec::new(),
            max_uses: None,
            uses_count: 0,
            valid_from: None,
            valid_to: None,
        }
    }

    pub fn with_owner(mut self, owner: OwnerSnapshot) -> Self {
        self.owner = owner;
        self
    }

    pub fn with_visitor(mut self, visitor: Visitor) -> Self {
        self.visitors.push(visitor);
        self
    }

    pub fn with_max_uses(mut self, max_uses: u32) -> Self {
        self.max_uses = Some(max_uses);
        self
    }

    pub fn valid_between(mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        self.valid_from = Some(from);
        self.valid_to = Some(to);
        self
    }

    fn snapshot(&self) -> GatePassSnapshot {
        GatePassSnapshot {
            id: Some(self.id.clone()),
            code: self.base_code.clone(),
            max_uses: self.max_uses,
            valid_from: self.valid_from,
            valid_to: self.valid_to,
            residency: self.residency.clone(),
        }
    }
}

/// Seed file layout: passes plus raw visitor detail payloads keyed by visitor id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocalSeed {
    #[serde(default)]
    pub passes: Vec<LocalPass>,
    #[serde(default)]
    pub visitor_details: HashMap<String, Value>,
}

/// A request the gateway received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    CheckIn(CheckinRequest),
    CheckOut(CheckinRequest),
    ListVisitors(String),
    FetchGateStatuses(VisitorId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    In,
    Out,
}

#[derive(Default)]
struct LocalData {
    passes: Vec<LocalPass>,
    gate_maps: HashMap<VisitorId, GateStatusMap>,
    /// Codes currently inside the estate.
    inside: BTreeSet<String>,
    /// Only populated by gateways built with [`LocalGateway::recording`].
    calls: Option<Vec<GatewayCall>>,
    /// When set, every call fails as if the upstream were down.
    outage: Option<(u16, Value)>,
}

/// In-memory gateway.
#[derive(Clone, Default)]
pub struct LocalGateway {
    data: Arc<RwLock<LocalData>>,
}

impl LocalGateway {
    /// Create an empty gateway.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty gateway that keeps a log of every call it receives.
    pub fn recording() -> Self {
        let gateway = Self::new();
        gateway.data.write().calls = Some(Vec::new());
        gateway
    }

    /// Create a gateway from a seed.
    pub fn from_seed(seed: LocalSeed) -> GatewayResult<Self> {
        let gateway = Self::new();
        for pass in seed.passes {
            gateway.add_pass(pass);
        }
        for (visitor_id, payload) in seed.visitor_details {
            let map = GateStatusMap::from_visitor_payload(&payload)?.ok_or_else(|| {
                GatewayError::decode(format!("Visitor {} has no gate map", visitor_id))
            })?;
            gateway.set_gate_map(VisitorId::new(visitor_id), map);
        }
        Ok(gateway)
    }

    /// Load a seed from a JSON file.
    pub fn from_seed_file<P: AsRef<Path>>(path: P) -> GatewayResult<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            GatewayError::configuration(format!("Failed to read seed file: {}", e))
        })?;
        let seed: LocalSeed = serde_json::from_str(&content)?;
        Self::from_seed(seed)
    }

    /// Register a pass, replacing any pass with the same base code.
    pub fn add_pass(&self, mut pass: LocalPass) {
        pass.base_code = normalize_code(&pass.base_code);
        let mut data = self.data.write();
        data.passes.retain(|p| p.base_code != pass.base_code);
        data.passes.push(pass);
    }

    pub fn set_gate_map(&self, visitor_id: VisitorId, map: GateStatusMap) {
        self.data.write().gate_maps.insert(visitor_id, map);
    }

    /// Simulate an upstream outage answering `status` with `body`, or clear it.
    pub fn set_outage(&self, outage: Option<(u16, Value)>) {
        self.data.write().outage = outage;
    }

    /// Every call received so far, oldest first. Empty unless recording.
    pub fn calls(&self) -> Vec<GatewayCall> {
        self.data.read().calls.clone().unwrap_or_default()
    }

    pub fn clear_calls(&self) {
        if let Some(calls) = self.data.write().calls.as_mut() {
            calls.clear();
        }
    }

    pub fn uses_count(&self, base_code: &str) -> Option<u32> {
        let base_code = normalize_code(base_code);
        self.data
            .read()
            .passes
            .iter()
            .find(|p| p.base_code == base_code)
            .map(|p| p.uses_count)
    }

    fn record(&self, call: GatewayCall) -> GatewayResult<()> {
        let mut data = self.data.write();
        if let Some(calls) = data.calls.as_mut() {
            calls.push(call);
        }
        match &data.outage {
            Some((status, body)) => Err(GatewayError::transport(
                format!("upstream answered {}", status),
                Some(*status),
                Some(body.clone()),
            )),
            None => Ok(()),
        }
    }

    fn process(&self, request: &CheckinRequest, direction: Direction) -> GatewayResult<GatePassCheckinResponse> {
        let code = match parse_code(&request.code) {
            Ok(code) => code,
            Err(e) => {
                return Err(GatewayError::transport(
                    "422 Unprocessable Entity",
                    Some(422),
                    Some(json!({ "detail": e.to_string() })),
                ))
            }
        };

        let mut data = self.data.write();
        let now = Utc::now();

        let pass_index = data
            .passes
            .iter()
            .position(|p| p.base_code == code.normalized)
            .or_else(|| data.passes.iter().position(|p| p.base_code == code.base_code));
        let Some(pass_index) = pass_index else {
            return Ok(GatePassCheckinResponse::with_status("not_found", "Pass not found"));
        };

        let pass = &data.passes[pass_index];
        // A suffix only identifies a visitor when the base code matched the pass.
        let suffix = if pass.base_code == code.normalized {
            None
        } else {
            code.suffix.as_deref()
        };

        let visitor = match (&request.visitor_id, suffix) {
            (Some(visitor_id), _) => match pass.visitors.iter().find(|v| &v.id == visitor_id) {
                Some(v) => Some(v.clone()),
                None => {
                    return Ok(GatePassCheckinResponse::with_status(
                        "visitor_not_found",
                        "Visitor is not on this pass",
                    ))
                }
            },
            (None, Some(suffix)) => match pass.visitors.iter().find(|v| v.suffix() == Some(suffix)) {
                Some(v) => Some(v.clone()),
                None => {
                    return Ok(GatePassCheckinResponse::with_status(
                        "visitor_not_found",
                        "Visitor is not on this pass",
                    ))
                }
            },
            (None, None) if pass.visitors.len() > 1 => {
                let mut response = GatePassCheckinResponse::with_status(
                    CheckinStatus::SelectVisitor,
                    "Multiple visitors share this pass; select one",
                );
                response.gate_pass = Some(pass.snapshot());
                response.max_uses = pass.max_uses;
                response.uses_count = Some(pass.uses_count);
                return Ok(response);
            }
            (None, None) => pass.visitors.first().cloned(),
        };

        if let Some(from) = pass.valid_from {
            if now < from {
                return Ok(rejection(pass, "denied_not_yet_valid", "Pass is not yet valid"));
            }
        }
        if let Some(to) = pass.valid_to {
            if now > to {
                return Ok(rejection(pass, "denied_expired", "Pass expired"));
            }
        }

        let presence_key = match visitor.as_ref().and_then(|v| v.suffix()) {
            Some(suffix) => format!("{}-{}", pass.base_code, suffix),
            None => pass.base_code.clone(),
        };
        let is_inside = data.inside.contains(&presence_key);

        let (status, message) = match direction {
            Direction::In if is_inside => (CheckinStatus::Active, "Already checked in"),
            Direction::In => {
                if let Some(max) = pass.max_uses {
                    if pass.uses_count >= max {
                        return Ok(rejection(
                            pass,
                            "denied_max_uses",
                            "Pass has reached its usage limit",
                        ));
                    }
                }
                data.passes[pass_index].uses_count += 1;
                data.inside.insert(presence_key);
                (CheckinStatus::CheckedIn, "Checked in")
            }
            Direction::Out if !is_inside => {
                return Ok(rejection(
                    &data.passes[pass_index],
                    "not_checked_in",
                    "Pass is not checked in",
                ))
            }
            Direction::Out => {
                data.inside.remove(&presence_key);
                (CheckinStatus::CheckedOut, "Checked out")
            }
        };

        let pass = &data.passes[pass_index];
        let owner = match &visitor {
            Some(v) => OwnerSnapshot {
                name: Some(v.name.clone()),
                email: v.email.clone(),
                phone: v.phone.clone(),
                owner_type: Some("visitor".to_string()),
            },
            None => pass.owner.clone(),
        };

        Ok(GatePassCheckinResponse {
            status,
            message: Some(message.to_string()),
            gate_pass: Some(pass.snapshot()),
            owner: Some(owner),
            uses_count: Some(pass.uses_count),
            max_uses: pass.max_uses,
        })
    }
}

fn rejection(pass: &LocalPass, status: &str, message: &str) -> GatePassCheckinResponse {
    let mut response = GatePassCheckinResponse::with_status(status, message);
    response.gate_pass = Some(pass.snapshot());
    response.uses_count = Some(pass.uses_count);
    response.max_uses = pass.max_uses;
    response
}

#[async_trait]
impl PassGateway for LocalGateway {
    async fn health_check(&self) -> GatewayResult<bool> {
        Ok(self.data.read().outage.is_none())
    }

    async fn check_in(&self, request: &CheckinRequest) -> GatewayResult<GatePassCheckinResponse> {
        self.record(GatewayCall::CheckIn(request.clone()))?;
        self.process(request, Direction::In)
    }

    async fn check_out(&self, request: &CheckinRequest) -> GatewayResult<GatePassCheckinResponse> {
        self.record(GatewayCall::CheckOut(request.clone()))?;
        self.process(request, Direction::Out)
    }

    async fn list_visitors(&self, base_code: &str) -> GatewayResult<Vec<Visitor>> {
        self.record(GatewayCall::ListVisitors(base_code.to_string()))?;
        let base_code = normalize_code(base_code);
        Ok(self
            .data
            .read()
            .passes
            .iter()
            .find(|p| p.base_code == base_code)
            .map(|p| p.visitors.clone())
            .unwrap_or_default())
    }

    async fn fetch_gate_statuses(&self, visitor_id: &VisitorId) -> GatewayResult<GateStatusMap> {
        self.record(GatewayCall::FetchGateStatuses(visitor_id.clone()))?;
        self.data
            .read()
            .gate_maps
            .get(visitor_id)
            .cloned()
            .ok_or_else(|| GatewayError::not_found(format!("No gate statuses for visitor {}", visitor_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn shared_pass() -> LocalPass {
        LocalPass::new("p1", "gate-9z001")
            .with_visitor(Visitor::new("v2", "Bola").with_suffix("002"))
            .with_visitor(Visitor::new("v3", "Chidi").with_suffix("003"))
    }

    #[tokio::test]
    async fn test_two_part_code_with_many_visitors_asks_for_selection() {
        let gw = LocalGateway::new();
        gw.add_pass(shared_pass());

        let resp = gw.check_in(&CheckinRequest::new("GATE-9Z001")).await.unwrap();
        assert_eq!(resp.status, CheckinStatus::SelectVisitor);
        assert_eq!(gw.uses_count("GATE-9Z001"), Some(0));
    }

    #[tokio::test]
    async fn test_three_part_code_checks_in_visitor() {
        let gw = LocalGateway::new();
        gw.add_pass(shared_pass());

        let resp = gw.check_in(&CheckinRequest::new("gate-9z001-003")).await.unwrap();
        assert_eq!(resp.status, CheckinStatus::CheckedIn);
        assert_eq!(resp.owner.unwrap().name.as_deref(), Some("Chidi"));
        assert_eq!(resp.uses_count, Some(1));
    }

    #[tokio::test]
    async fn test_check_in_twice_reports_active() {
        let gw = LocalGateway::new();
        gw.add_pass(shared_pass());
        let req = CheckinRequest::new("GATE-9Z001-002");

        gw.check_in(&req).await.unwrap();
        let again = gw.check_in(&req).await.unwrap();
        assert_eq!(again.status, CheckinStatus::Active);
        assert_eq!(gw.uses_count("GATE-9Z001"), Some(1));
    }

    #[tokio::test]
    async fn test_check_out_requires_check_in() {
        let gw = LocalGateway::new();
        gw.add_pass(shared_pass());
        let req = CheckinRequest::new("GATE-9Z001-002");

        let early = gw.check_out(&req).await.unwrap();
        assert_eq!(early.status.as_str(), "not_checked_in");

        gw.check_in(&req).await.unwrap();
        let out = gw.check_out(&req).await.unwrap();
        assert_eq!(out.status, CheckinStatus::CheckedOut);
    }

    #[tokio::test]
    async fn test_expired_pass_is_rejected() {
        let now = Utc::now();
        let gw = LocalGateway::new();
        gw.add_pass(
            LocalPass::new("p9", "RES-001").valid_between(now - Duration::days(10), now - Duration::days(1)),
        );

        let resp = gw.check_in(&CheckinRequest::new("RES-001")).await.unwrap();
        assert_eq!(resp.status.as_str(), "denied_expired");
        assert_eq!(resp.message.as_deref(), Some("Pass expired"));
    }

    #[tokio::test]
    async fn test_usage_cap() {
        let gw = LocalGateway::new();
        gw.add_pass(LocalPass::new("p1", "RES-001").with_max_uses(1));
        let req = CheckinRequest::new("RES-001");

        assert_eq!(gw.check_in(&req).await.unwrap().status, CheckinStatus::CheckedIn);
        gw.check_out(&req).await.unwrap();
        let capped = gw.check_in(&req).await.unwrap();
        assert_eq!(capped.status.as_str(), "denied_max_uses");
    }

    #[tokio::test]
    async fn test_unknown_pass() {
        let gw = LocalGateway::new();
        let resp = gw.check_in(&CheckinRequest::new("GATE-NOPE-001")).await.unwrap();
        assert_eq!(resp.status.as_str(), "not_found");
        assert!(gw.list_visitors("GATE-NOPE").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_outage_fails_every_call_and_is_recorded() {
        let gw = LocalGateway::recording();
        gw.set_outage(Some((503, json!({"detail": "Gate service unavailable"}))));

        let err = gw.check_in(&CheckinRequest::new("RES-001")).await.unwrap_err();
        assert_eq!(err.operator_message(), "Gate service unavailable");
        assert!(!gw.health_check().await.unwrap());
        assert_eq!(gw.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_calls_are_not_kept_unless_recording() {
        let gw = LocalGateway::new();
        gw.add_pass(LocalPass::new("p1", "RES-001"));
        for _ in 0..3 {
            gw.check_in(&CheckinRequest::new("RES-001")).await.unwrap();
        }
        assert!(gw.calls().is_empty());
        assert!(gw.data.read().calls.is_none());
    }

    #[tokio::test]
    async fn test_seed_with_legacy_gate_map_key() {
        let seed: LocalSeed = serde_json::from_value(json!({
            "passes": [{"id": "p1", "base_code": "gate-aa111", "visitors": [{"id": "v1", "name": "Ada", "pass_code_suffix": "001"}]}],
            "visitor_details": {
                "v1": {"dependancy_gate_map": {"g1": {"gate": {"id": "g1"}, "status": "pending"}}}
            }
        }))
        .unwrap();

        let gw = LocalGateway::from_seed(seed).unwrap();
        let visitors = gw.list_visitors("GATE-AA111").await.unwrap();
        assert_eq!(visitors.len(), 1);
        let map = gw.fetch_gate_statuses(&VisitorId::new("v1")).await.unwrap();
        assert_eq!(map.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_gate_map_is_not_found() {
        let gw = LocalGateway::new();
        let err = gw.fetch_gate_statuses(&VisitorId::new("ghost")).await.unwrap_err();
        assert!(matches!(err, GatewayError::NotFound { .. }));
    }
}
