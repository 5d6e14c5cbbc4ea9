//! Gate console state machine.
//!
//! A scan session is an explicit value advanced by [`transition`]: every
//! operator action or server reply is a [`ConsoleEvent`], and the transition
//! returns the side effects the host must run ([`ConsoleEffect`]). Nothing in
//! here performs I/O; see [`super::console_driver`] for the async executor.
//!
//! ```text
//! Idle ──input──▶ CodeEntered ──scan/DirectMutate──▶ Submitting ──reply──▶ Settled
//!                      │                                  ▲
//!                      └──scan/ResolveVisitor──▶ AwaitingVisitorSelection
//!                                                   (operator picks a row)
//! ```

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::gateway::GatewayError;
use crate::models::{GatePassCheckinResponse, Visitor};
use crate::routes::passes::CheckinRequest;
use crate::services::pass_code::{normalize_code, parse_code, DispatchDecision, PassCode};

/// Status recorded for failures that carry no server status.
pub const FALLBACK_ERROR_STATUS: &str = "error";

/// Message recorded for rejections that carry no server message.
pub const REJECTED_MESSAGE: &str = "Gate pass was rejected";

/// Which mutation the next submission issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanMode {
    #[default]
    CheckIn,
    CheckOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsolePhase {
    Idle,
    CodeEntered,
    AwaitingVisitorSelection,
    Submitting,
    Settled,
}

/// Where a code change came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSource {
    /// Typed into the input box.
    Keyboard,
    /// Read by the QR scanner; submits immediately.
    Scanner,
    /// Hydrated from the `code` query parameter on page load.
    Url,
}

/// Normalized failure shown in the red panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResult {
    pub message: String,
    pub status: String,
}

impl ErrorResult {
    /// Business rejection delivered in a successful response.
    pub fn from_response(response: &GatePassCheckinResponse) -> Self {
        let status = match response.status.as_str().trim() {
            "" => FALLBACK_ERROR_STATUS.to_string(),
            s => s.to_string(),
        };
        let message = response
            .message
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(REJECTED_MESSAGE)
            .to_string();
        Self { message, status }
    }

    /// Transport or decode failure.
    pub fn from_gateway_error(error: &GatewayError) -> Self {
        Self {
            message: error.operator_message(),
            status: FALLBACK_ERROR_STATUS.to_string(),
        }
    }
}

/// Last settled result. Success and failure are exclusive by construction.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    Success(GatePassCheckinResponse),
    Failure(ErrorResult),
}

/// Requests currently in flight; each action has its own spinner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InFlight {
    pub check_in: bool,
    pub check_out: bool,
    pub visitors: bool,
}

impl InFlight {
    fn submitting(&self, mode: ScanMode) -> bool {
        match mode {
            ScanMode::CheckIn => self.check_in,
            ScanMode::CheckOut => self.check_out,
        }
    }

    fn set_submitting(&mut self, mode: ScanMode, value: bool) {
        match mode {
            ScanMode::CheckIn => self.check_in = value,
            ScanMode::CheckOut => self.check_out = value,
        }
    }
}

/// Mutually exclusive panels the console can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsolePanel {
    /// Nothing to show yet.
    Empty,
    /// Green panel with pass, owner and usage details.
    Success,
    /// Red panel with the failure message.
    Failure,
    /// Server asked the operator to pick a visitor.
    SelectionRequired,
    /// Visitor table for the selected base code.
    VisitorTable,
}

/// Everything that can happen to a session.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleEvent {
    CodeChanged { code: String, source: InputSource },
    ModeChanged(ScanMode),
    /// Scan button or Enter.
    ScanRequested,
    VisitorsLoaded { base_code: String, visitors: Vec<Visitor> },
    VisitorsFailed { base_code: String, error: ErrorResult },
    VisitorChosen { visitor: Visitor, mode: ScanMode },
    SubmitSettled { mode: ScanMode, response: GatePassCheckinResponse },
    SubmitFailed { mode: ScanMode, error: ErrorResult },
}

/// Side effects a transition asks the host to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleEffect {
    /// Replace (not push) the `code` query parameter; `None` removes it.
    ReplaceUrlCode(Option<String>),
    FetchVisitors { base_code: String },
    Submit { mode: ScanMode, request: CheckinRequest },
}

/// One scan console visit.
#[derive(Debug, Clone)]
pub struct GateScanSession {
    id: Uuid,
    mode: ScanMode,
    raw_code: String,
    code: Option<PassCode>,
    selected_pass_code: Option<String>,
    visitors: Option<Vec<Visitor>>,
    outcome: Option<ScanOutcome>,
    phase: ConsolePhase,
    in_flight: InFlight,
}

impl Default for GateScanSession {
    fn default() -> Self {
        Self::new()
    }
}

impl GateScanSession {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            mode: ScanMode::default(),
            raw_code: String::new(),
            code: None,
            selected_pass_code: None,
            visitors: None,
            outcome: None,
            phase: ConsolePhase::Idle,
            in_flight: InFlight::default(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn mode(&self) -> ScanMode {
        self.mode
    }

    pub fn raw_code(&self) -> &str {
        &self.raw_code
    }

    pub fn pass_code(&self) -> Option<&PassCode> {
        self.code.as_ref()
    }

    /// Dispatch decision for the current input, recomputed on every change.
    pub fn decision(&self) -> Option<DispatchDecision> {
        self.code.as_ref().map(PassCode::dispatch)
    }

    pub fn selected_pass_code(&self) -> Option<&str> {
        self.selected_pass_code.as_deref()
    }

    pub fn visitors(&self) -> Option<&[Visitor]> {
        self.visitors.as_deref()
    }

    pub fn outcome(&self) -> Option<&ScanOutcome> {
        self.outcome.as_ref()
    }

    pub fn result(&self) -> Option<&GatePassCheckinResponse> {
        match &self.outcome {
            Some(ScanOutcome::Success(response)) => Some(response),
            _ => None,
        }
    }

    pub fn error_result(&self) -> Option<&ErrorResult> {
        match &self.outcome {
            Some(ScanOutcome::Failure(error)) => Some(error),
            _ => None,
        }
    }

    pub fn phase(&self) -> ConsolePhase {
        self.phase
    }

    pub fn in_flight(&self) -> InFlight {
        self.in_flight
    }

    /// Whether the submit control for `mode` is enabled.
    pub fn can_submit(&self, mode: ScanMode) -> bool {
        !self.in_flight.submitting(mode)
    }

    pub fn panel(&self) -> ConsolePanel {
        match &self.outcome {
            Some(ScanOutcome::Success(r)) if r.status.is_select_visitor() => {
                ConsolePanel::SelectionRequired
            }
            Some(ScanOutcome::Success(_)) => ConsolePanel::Success,
            Some(ScanOutcome::Failure(_)) => ConsolePanel::Failure,
            None if self.selected_pass_code.is_some() => ConsolePanel::VisitorTable,
            None => ConsolePanel::Empty,
        }
    }

    /// Apply `event` in place and return the effects to run.
    pub fn apply(&mut self, event: ConsoleEvent) -> Vec<ConsoleEffect> {
        log::debug!("console {} [{:?}] <- {:?}", self.id, self.phase, event);
        match event {
            ConsoleEvent::CodeChanged { code, source } => self.on_code_changed(code, source),
            ConsoleEvent::ModeChanged(mode) => {
                self.mode = mode;
                Vec::new()
            }
            ConsoleEvent::ScanRequested => self.on_scan(),
            ConsoleEvent::VisitorsLoaded { base_code, visitors } => {
                self.on_visitors_loaded(base_code, visitors)
            }
            ConsoleEvent::VisitorsFailed { base_code, error } => {
                self.on_visitors_failed(base_code, error)
            }
            ConsoleEvent::VisitorChosen { visitor, mode } => self.on_visitor_chosen(visitor, mode),
            ConsoleEvent::SubmitSettled { mode, response } => self.on_settled(mode, response),
            ConsoleEvent::SubmitFailed { mode, error } => self.on_submit_failed(mode, error),
        }
    }

    fn on_code_changed(&mut self, code: String, source: InputSource) -> Vec<ConsoleEffect> {
        self.outcome = None;
        // A lookup still in flight belongs to the old code; its reply is dropped as stale.
        self.selected_pass_code = None;
        self.in_flight.visitors = false;
        self.visitors = None;
        self.code = parse_code(&code).ok();
        self.raw_code = code;
        self.phase = if self.code.is_some() {
            ConsolePhase::CodeEntered
        } else {
            ConsolePhase::Idle
        };

        let mut effects = Vec::new();
        if source != InputSource::Url {
            effects.push(ConsoleEffect::ReplaceUrlCode(url_code(&self.raw_code)));
        }
        if source == InputSource::Scanner {
            effects.extend(self.on_scan());
        }
        effects
    }

    fn on_scan(&mut self) -> Vec<ConsoleEffect> {
        let Some(code) = self.code.clone() else {
            log::debug!("console {}: scan ignored, no code entered", self.id);
            return Vec::new();
        };

        match code.dispatch() {
            DispatchDecision::DirectMutate => {
                if !self.can_submit(self.mode) {
                    log::debug!("console {}: {:?} already in flight", self.id, self.mode);
                    return Vec::new();
                }
                self.begin_submit(self.mode, CheckinRequest::new(code.normalized))
            }
            DispatchDecision::ResolveVisitor => {
                if self.in_flight.visitors
                    && self.selected_pass_code.as_deref() == Some(code.base_code.as_str())
                {
                    return Vec::new();
                }
                self.selected_pass_code = Some(code.base_code.clone());
                self.visitors = None;
                self.in_flight.visitors = true;
                self.phase = ConsolePhase::AwaitingVisitorSelection;
                vec![ConsoleEffect::FetchVisitors {
                    base_code: code.base_code,
                }]
            }
        }
    }

    fn on_visitors_loaded(&mut self, base_code: String, visitors: Vec<Visitor>) -> Vec<ConsoleEffect> {
        if self.selected_pass_code.as_deref() != Some(base_code.as_str()) {
            log::debug!("console {}: dropping stale visitor list for {}", self.id, base_code);
            return Vec::new();
        }
        self.in_flight.visitors = false;
        self.visitors = Some(visitors);
        Vec::new()
    }

    fn on_visitors_failed(&mut self, base_code: String, error: ErrorResult) -> Vec<ConsoleEffect> {
        if self.selected_pass_code.as_deref() != Some(base_code.as_str()) {
            return Vec::new();
        }
        log::warn!("console {}: visitor lookup for {} failed: {}", self.id, base_code, error.message);
        self.in_flight.visitors = false;
        self.selected_pass_code = None;
        self.visitors = None;
        self.outcome = Some(ScanOutcome::Failure(error));
        self.phase = ConsolePhase::Settled;
        Vec::new()
    }

    fn on_visitor_chosen(&mut self, visitor: Visitor, mode: ScanMode) -> Vec<ConsoleEffect> {
        if !self.can_submit(mode) {
            return Vec::new();
        }
        let selected = self
            .selected_pass_code
            .clone()
            .or_else(|| self.code.as_ref().map(|c| c.base_code.clone()));
        let Some(code) = visitor_submission_code(selected.as_deref(), &visitor) else {
            log::warn!("console {}: visitor {} has no usable pass code", self.id, visitor.id);
            return Vec::new();
        };
        self.mode = mode;
        self.begin_submit(mode, CheckinRequest::for_visitor(code, visitor.id))
    }

    fn begin_submit(&mut self, mode: ScanMode, request: CheckinRequest) -> Vec<ConsoleEffect> {
        self.in_flight.set_submitting(mode, true);
        self.phase = ConsolePhase::Submitting;
        vec![ConsoleEffect::Submit { mode, request }]
    }

    fn on_settled(&mut self, mode: ScanMode, response: GatePassCheckinResponse) -> Vec<ConsoleEffect> {
        self.in_flight.set_submitting(mode, false);
        self.outcome = Some(if response.status.is_accepted() {
            ScanOutcome::Success(response)
        } else {
            let error = ErrorResult::from_response(&response);
            log::warn!("console {}: pass rejected with {}: {}", self.id, error.status, error.message);
            ScanOutcome::Failure(error)
        });
        self.raw_code.clear();
        self.code = None;
        self.selected_pass_code = None;
        self.visitors = None;
        self.phase = ConsolePhase::Settled;
        vec![ConsoleEffect::ReplaceUrlCode(None)]
    }

    fn on_submit_failed(&mut self, mode: ScanMode, error: ErrorResult) -> Vec<ConsoleEffect> {
        log::warn!("console {}: {:?} failed: {}", self.id, mode, error.message);
        self.in_flight.set_submitting(mode, false);
        self.outcome = Some(ScanOutcome::Failure(error));
        self.selected_pass_code = None;
        self.visitors = None;
        self.phase = ConsolePhase::Settled;
        Vec::new()
    }
}

/// Reducer form of [`GateScanSession::apply`].
pub fn transition(mut session: GateScanSession, event: ConsoleEvent) -> (GateScanSession, Vec<ConsoleEffect>) {
    let effects = session.apply(event);
    (session, effects)
}

/// Code submitted for a visitor picked from the table.
///
/// `{base}-{suffix}` when the visitor has a suffix; otherwise the visitor's
/// embedded pass code; otherwise the bare base code.
pub fn visitor_submission_code(selected_base: Option<&str>, visitor: &Visitor) -> Option<String> {
    let base = selected_base.map(normalize_code).filter(|b| !b.is_empty());
    let embedded = visitor
        .pass_code
        .as_deref()
        .map(normalize_code)
        .filter(|c| !c.is_empty());

    match (base, visitor.suffix(), embedded) {
        (Some(base), Some(suffix), _) => Some(format!("{}-{}", base, suffix.to_uppercase())),
        (_, _, Some(embedded)) => Some(embedded),
        (Some(base), None, None) => Some(base),
        (None, _, None) => None,
    }
}

/// Value written to the `code` query parameter.
fn url_code(raw: &str) -> Option<String> {
    Some(normalize_code(raw)).filter(|c| !c.is_empty())
}

/// Serializable snapshot of a session, as rendered by a console frontend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsoleView {
    pub session_id: Uuid,
    pub mode: ScanMode,
    pub phase: ConsolePhase,
    pub panel: ConsolePanel,
    pub code: String,
    pub decision: Option<DispatchDecision>,
    pub selected_pass_code: Option<String>,
    pub visitors: Option<Vec<Visitor>>,
    pub result: Option<GatePassCheckinResponse>,
    pub error_result: Option<ErrorResult>,
    pub loading: InFlight,
}

impl From<&GateScanSession> for ConsoleView {
    fn from(session: &GateScanSession) -> Self {
        Self {
            session_id: session.id,
            mode: session.mode,
            phase: session.phase,
            panel: session.panel(),
            code: session.raw_code.clone(),
            decision: session.decision(),
            selected_pass_code: session.selected_pass_code.clone(),
            visitors: session.visitors.clone(),
            result: session.result().cloned(),
            error_result: session.error_result().cloned(),
            loading: session.in_flight,
        }
    }
}
