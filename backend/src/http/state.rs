//! Application state for the HTTP server.

use std::sync::Arc;

use crate::gateway::PassGateway;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Estate API collaborator used by every console request
    pub gateway: Arc<dyn PassGateway>,
}

impl AppState {
    /// Create a new application state with the given gateway.
    pub fn new(gateway: Arc<dyn PassGateway>) -> Self {
        Self { gateway }
    }
}
