//! Per-gate visitor status records and the gate map that carries them.
//!
//! The upstream visitor detail payload exposes the map under
//! `dependency_gate_map` or the legacy `dependancy_gate_map` key. It is
//! canonicalized into [`GateStatusMap`] right here so nothing downstream ever
//! sees the ambiguity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::GateId;

/// Key the gate map is published under.
pub const GATE_MAP_KEY: &str = "dependency_gate_map";

/// Older payloads carry the same map under this spelling.
pub const LEGACY_GATE_MAP_KEY: &str = "dependancy_gate_map";

/// Reference to a gate by id, with its display name when known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateRef {
    pub id: GateId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl GateRef {
    pub fn new(id: impl Into<GateId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: Some(name.into()),
        }
    }

    pub fn id_only(id: impl Into<GateId>) -> Self {
        Self {
            id: id.into(),
            name: None,
        }
    }
}

/// Visitor progress at one gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateStatus {
    Pending,
    CheckedIn,
    CheckedOut,
    Locked,
    Unavailable,
    #[serde(other)]
    Unknown,
}

impl GateStatus {
    /// Statuses that represent live progress through the clearance path.
    pub fn is_live(self) -> bool {
        matches!(
            self,
            GateStatus::CheckedOut | GateStatus::CheckedIn | GateStatus::Pending
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GateStatus::Pending => "pending",
            GateStatus::CheckedIn => "checked_in",
            GateStatus::CheckedOut => "checked_out",
            GateStatus::Locked => "locked",
            GateStatus::Unavailable => "unavailable",
            GateStatus::Unknown => "unknown",
        }
    }
}

/// Last gate event recorded for the visitor.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GateEvent {
    #[serde(default)]
    pub checkin_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub checkout_time: Option<DateTime<Utc>>,
}

/// One node of the clearance graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitorGateStatus {
    pub gate: GateRef,
    pub status: GateStatus,
    #[serde(
        default,
        deserialize_with = "dependency_ref",
        skip_serializing_if = "Option::is_none"
    )]
    pub dependency_gate: Option<GateRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<GateEvent>,
    #[serde(default)]
    pub message: Option<String>,
}

/// A dependency reference without a usable id means "no dependency".
fn dependency_ref<'de, D>(deserializer: D) -> Result<Option<GateRef>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct RawDependency {
        #[serde(default)]
        id: Option<GateId>,
        #[serde(default)]
        name: Option<String>,
    }

    let raw = Option::<RawDependency>::deserialize(deserializer)?;
    Ok(raw.and_then(|dep| dep.id.map(|id| GateRef { id, name: dep.name })))
}

impl VisitorGateStatus {
    pub fn new(gate: GateRef, status: GateStatus) -> Self {
        Self {
            gate,
            status,
            dependency_gate: None,
            event: None,
            message: None,
        }
    }

    pub fn depends_on(mut self, gate_id: impl Into<GateId>) -> Self {
        self.dependency_gate = Some(GateRef::id_only(gate_id));
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn gate_id(&self) -> &GateId {
        &self.gate.id
    }

    pub fn dependency_id(&self) -> Option<&GateId> {
        self.dependency_gate.as_ref().map(|g| &g.id)
    }
}

/// Gate id → status record, in payload order. Null entries are kept as `None`
/// so callers can see exactly what the server sent.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "serde_json::Map<String, Value>", into = "serde_json::Map<String, Value>")]
pub struct GateStatusMap {
    entries: Vec<(GateId, Option<VisitorGateStatus>)>,
}

impl GateStatusMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<GateId>, status: Option<VisitorGateStatus>) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = status,
            None => self.entries.push((key, status)),
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k.as_str() == key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &GateId> {
        self.entries.iter().map(|(k, _)| k)
    }

    /// Non-null records in payload order.
    pub fn records(&self) -> impl Iterator<Item = &VisitorGateStatus> {
        self.entries.iter().filter_map(|(_, v)| v.as_ref())
    }

    /// Extract the gate map from a visitor detail payload.
    ///
    /// Accepts the map at the top level of `payload` or nested under `data`
    /// (the API envelope), under either key spelling. The canonical key wins
    /// when both are present and non-null. Returns `Ok(None)` when no map is
    /// present at all.
    pub fn from_visitor_payload(payload: &Value) -> Result<Option<Self>, serde_json::Error> {
        let body = match payload.get("data") {
            Some(data) if data.is_object() => data,
            _ => payload,
        };

        let raw = [GATE_MAP_KEY, LEGACY_GATE_MAP_KEY]
            .iter()
            .filter_map(|key| body.get(*key))
            .find(|value| !value.is_null());

        match raw {
            Some(value) => serde_json::from_value(value.clone()).map(Some),
            None => Ok(None),
        }
    }
}

impl FromIterator<(GateId, Option<VisitorGateStatus>)> for GateStatusMap {
    fn from_iter<I: IntoIterator<Item = (GateId, Option<VisitorGateStatus>)>>(iter: I) -> Self {
        let mut map = GateStatusMap::new();
        for (key, status) in iter {
            map.insert(key, status);
        }
        map
    }
}

impl FromIterator<VisitorGateStatus> for GateStatusMap {
    fn from_iter<I: IntoIterator<Item = VisitorGateStatus>>(iter: I) -> Self {
        iter.into_iter()
            .map(|status| (status.gate.id.clone(), Some(status)))
            .collect()
    }
}

impl From<serde_json::Map<String, Value>> for GateStatusMap {
    fn from(map: serde_json::Map<String, Value>) -> Self {
        map.into_iter()
            .map(|(key, value)| {
                let status = match value {
                    Value::Null => None,
                    other => match serde_json::from_value::<VisitorGateStatus>(other) {
                        Ok(status) => Some(status),
                        Err(e) => {
                            log::warn!("Dropping unreadable gate status for gate {}: {}", key, e);
                            None
                        }
                    },
                };
                (GateId::new(key), status)
            })
            .collect()
    }
}

impl From<GateStatusMap> for serde_json::Map<String, Value> {
    fn from(map: GateStatusMap) -> Self {
        map.entries
            .into_iter()
            .map(|(key, status)| {
                let value = status
                    .and_then(|s| serde_json::to_value(s).ok())
                    .unwrap_or(Value::Null);
                (key.0, value)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_map() -> Value {
        json!({
            "g1": {"gate": {"id": "g1", "name": "Main"}, "status": "checked_in", "message": "ok"},
            "g2": {
                "gate": {"id": "g2", "name": "Block B"},
                "status": "pending",
                "dependency_gate": {"id": "g1"},
                "message": null
            },
            "g3": null
        })
    }

    #[test]
    fn test_reads_canonical_key() {
        let payload = json!({ "id": "v1", "dependency_gate_map": sample_map() });
        let map = GateStatusMap::from_visitor_payload(&payload).unwrap().unwrap();
        assert_eq!(map.len(), 3);
        assert_eq!(map.records().count(), 2);
        assert!(map.contains_key("g3"));
    }

    #[test]
    fn test_reads_legacy_key() {
        let payload = json!({ "id": "v1", "dependancy_gate_map": sample_map() });
        let map = GateStatusMap::from_visitor_payload(&payload).unwrap().unwrap();
        assert_eq!(map.records().count(), 2);
    }

    #[test]
    fn test_canonical_key_wins_over_legacy() {
        let payload = json!({
            "dependency_gate_map": {"a": {"gate": {"id": "a"}, "status": "pending"}},
            "dependancy_gate_map": sample_map()
        });
        let map = GateStatusMap::from_visitor_payload(&payload).unwrap().unwrap();
        assert_eq!(map.len(), 1);
        assert!(map.contains_key("a"));
    }

    #[test]
    fn test_null_canonical_falls_back_to_legacy() {
        let payload = json!({
            "dependency_gate_map": null,
            "dependancy_gate_map": sample_map()
        });
        let map = GateStatusMap::from_visitor_payload(&payload).unwrap().unwrap();
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn test_reads_inside_envelope() {
        let payload = json!({ "data": { "dependency_gate_map": sample_map() } });
        assert!(GateStatusMap::from_visitor_payload(&payload).unwrap().is_some());
    }

    #[test]
    fn test_missing_map_is_none() {
        let payload = json!({ "id": "v1" });
        assert!(GateStatusMap::from_visitor_payload(&payload).unwrap().is_none());
    }

    #[test]
    fn test_preserves_payload_order() {
        let payload = json!({ "dependency_gate_map": {
            "z": {"gate": {"id": "z"}, "status": "pending"},
            "a": {"gate": {"id": "a"}, "status": "pending"}
        }});
        let map = GateStatusMap::from_visitor_payload(&payload).unwrap().unwrap();
        let keys: Vec<&str> = map.keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["z", "a"]);
    }

    #[test]
    fn test_unknown_status_is_tolerated() {
        let status: VisitorGateStatus =
            serde_json::from_value(json!({"gate": {"id": 5}, "status": "quarantined"})).unwrap();
        assert_eq!(status.status, GateStatus::Unknown);
        assert_eq!(status.gate_id().as_str(), "5");
    }

    #[test]
    fn test_live_statuses() {
        assert!(GateStatus::Pending.is_live());
        assert!(GateStatus::CheckedOut.is_live());
        assert!(!GateStatus::Locked.is_live());
        assert!(!GateStatus::Unavailable.is_live());
    }
}
