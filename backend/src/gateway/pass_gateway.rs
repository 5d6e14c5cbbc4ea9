//! Gateway trait for the estate API calls the console depends on.
//!
//! The console never talks HTTP directly; it goes through this trait so the
//! in-memory [`LocalGateway`](super::LocalGateway) and the upstream
//! [`HttpGateway`](super::HttpGateway) are interchangeable.

use async_trait::async_trait;

use super::error::GatewayResult;
use crate::models::{GatePassCheckinResponse, GateStatusMap, Visitor, VisitorId};
use crate::routes::passes::CheckinRequest;

/// Estate API operations consumed by the gate console.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait PassGateway: Send + Sync {
    /// Check whether the upstream is reachable.
    async fn health_check(&self) -> GatewayResult<bool>;

    /// `POST /admin/passes/checkin`
    ///
    /// A business rejection (expired pass, usage cap, ...) is `Ok` with a
    /// rejected status; `Err` is reserved for transport and decode failures.
    async fn check_in(&self, request: &CheckinRequest) -> GatewayResult<GatePassCheckinResponse>;

    /// `POST /admin/passes/checkout`, same contract as [`check_in`](Self::check_in).
    async fn check_out(&self, request: &CheckinRequest) -> GatewayResult<GatePassCheckinResponse>;

    /// `GET /admin/passes/visitors/{base_code}`
    ///
    /// Unknown codes yield an empty list rather than an error.
    async fn list_visitors(&self, base_code: &str) -> GatewayResult<Vec<Visitor>>;

    /// Gate map from the visitor detail payload, normalized from either key spelling.
    async fn fetch_gate_statuses(&self, visitor_id: &VisitorId) -> GatewayResult<GateStatusMap>;
}
