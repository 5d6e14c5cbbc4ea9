#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use estate_gate::gateway::{LocalGateway, LocalPass, PassGateway};
use estate_gate::models::{OwnerSnapshot, Visitor};
use estate_gate::services::{GateConsole, MemoryUrlSync};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// Restores the previous values on unwind and serializes access to the
/// process environment, since the gateway config readers touch it globally.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

/// `GATE-9Z001` shared by three visitors with suffixes 001..003.
pub fn shared_pass() -> LocalPass {
    LocalPass::new("p-9z001", "GATE-9Z001")
        .with_owner(OwnerSnapshot {
            name: Some("Adaeze Okafor".to_string()),
            owner_type: Some("resident".to_string()),
            ..OwnerSnapshot::default()
        })
        .with_visitor(Visitor::new("v-1", "Bola").with_suffix("001"))
        .with_visitor(Visitor::new("v-2", "Chidi").with_suffix("002"))
        .with_visitor(Visitor::new("v-3", "Dayo").with_suffix("003"))
}

/// Resident pass `RES-001`, no visitors.
pub fn resident_pass() -> LocalPass {
    LocalPass::new("p-res-001", "RES-001").with_owner(OwnerSnapshot {
        name: Some("Emeka Obi".to_string()),
        owner_type: Some("resident".to_string()),
        ..OwnerSnapshot::default()
    })
}

/// Recording in-memory gateway holding [`shared_pass`] and [`resident_pass`].
pub fn seeded_gateway() -> LocalGateway {
    let gateway = LocalGateway::recording();
    gateway.add_pass(shared_pass());
    gateway.add_pass(resident_pass());
    gateway
}

/// Console over `gateway` whose URL writes can be inspected.
pub fn console(gateway: &LocalGateway) -> GateConsole<Arc<MemoryUrlSync>> {
    GateConsole::new(
        Arc::new(gateway.clone()) as Arc<dyn PassGateway>,
        Arc::new(MemoryUrlSync::new()),
    )
}
