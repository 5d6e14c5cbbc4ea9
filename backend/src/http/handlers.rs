//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint and delegates to the service
//! layer. Console endpoints run a fresh scan session per request, so a
//! business rejection comes back as a normal view with a failure panel rather
//! than as an HTTP error.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::Value;

use super::dto::{
    ClearanceTimeline, ConsoleView, HealthResponse, ResolveQuery, ResolveResponse, ScanRequest,
    SelectRequest,
};
use super::error::AppError;
use super::state::AppState;
use crate::models::{GateStatusMap, VisitorId};
use crate::services::clearance::build_clearance_timeline;
use crate::services::console_driver::GateConsole;
use crate::services::pass_code::parse_code;

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
///
/// Health check endpoint to verify the service is running and the estate API
/// is reachable.
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let gateway_status = match state.gateway.health_check().await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: "v1".to_string(),
        gateway: gateway_status,
    }))
}

// =============================================================================
// Pass codes
// =============================================================================

/// GET /v1/passes/resolve?code=
///
/// Classify a pass code without contacting the estate API.
pub async fn resolve_pass(Query(query): Query<ResolveQuery>) -> HandlerResult<ResolveResponse> {
    let code = parse_code(&query.code)?;
    Ok(Json(ResolveResponse {
        decision: code.dispatch(),
        code: code.normalized,
        base_code: code.base_code,
        suffix: code.suffix,
        is_three_part: code.is_three_part,
    }))
}

// =============================================================================
// Console
// =============================================================================

/// POST /v1/console/scan
///
/// Enter a code and press Scan. Direct codes are checked in or out; shared
/// codes come back with the visitor list to pick from.
pub async fn scan(
    State(state): State<AppState>,
    Json(request): Json<ScanRequest>,
) -> HandlerResult<ConsoleView> {
    parse_code(&request.code)?;

    let mut console = GateConsole::detached(state.gateway.clone());
    console.set_mode(request.mode).await;
    console.input(&request.code).await;
    console.scan().await;

    Ok(Json(console.view()))
}

/// POST /v1/console/select
///
/// Submit for a visitor picked from the list returned by a scan.
pub async fn select_visitor(
    State(state): State<AppState>,
    Json(request): Json<SelectRequest>,
) -> HandlerResult<ConsoleView> {
    parse_code(&request.code)?;

    let mut console = GateConsole::detached(state.gateway.clone());
    console.input(&request.code).await;
    console.choose_visitor(request.visitor, request.mode).await;

    if console.session().outcome().is_none() {
        return Err(AppError::BadRequest(
            "Visitor has no usable pass code".to_string(),
        ));
    }
    Ok(Json(console.view()))
}

// =============================================================================
// Gate clearance
// =============================================================================

/// POST /v1/clearance
///
/// Build the clearance timeline for a visitor detail payload.
pub async fn build_clearance(Json(payload): Json<Value>) -> HandlerResult<ClearanceTimeline> {
    let map = GateStatusMap::from_visitor_payload(&payload)
        .map_err(|e| AppError::BadRequest(format!("Invalid gate map: {}", e)))?
        .ok_or_else(|| AppError::BadRequest("Payload carries no gate map".to_string()))?;

    Ok(Json(build_clearance_timeline(&map)))
}

/// GET /v1/visitors/{visitor_id}/clearance
///
/// Fetch a visitor's gate statuses from the estate API and build the timeline.
pub async fn get_visitor_clearance(
    State(state): State<AppState>,
    Path(visitor_id): Path<String>,
) -> HandlerResult<ClearanceTimeline> {
    let map = state
        .gateway
        .fetch_gate_statuses(&VisitorId::new(visitor_id))
        .await?;

    Ok(Json(build_clearance_timeline(&map)))
}
