//! Async driver for the gate console.
//!
//! [`GateConsole`] owns a [`GateScanSession`], feeds operator actions through
//! the state machine and runs the resulting effects against a
//! [`PassGateway`]. Gateway failures are folded back into the session as
//! events; no method on the console returns an error.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use super::console::{
    ConsoleEffect, ConsoleEvent, ConsoleView, ErrorResult, GateScanSession, InputSource, ScanMode,
};
use crate::gateway::PassGateway;
use crate::models::Visitor;
use crate::routes::console::code_query;

/// Subscriber that mirrors the session code into the page URL.
pub trait UrlSync: Send + Sync {
    /// Replace the `code` query parameter; `None` removes it.
    fn replace_code(&self, code: Option<&str>);
}

/// URL sync for hosts without an address bar.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopUrlSync;

impl UrlSync for NoopUrlSync {
    fn replace_code(&self, _code: Option<&str>) {}
}

/// URL sync that remembers the current value and every write.
#[derive(Debug, Default)]
pub struct MemoryUrlSync {
    state: Mutex<(Option<String>, Vec<Option<String>>)>,
}

impl MemoryUrlSync {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<String> {
        self.state.lock().0.clone()
    }

    /// All replacements in order.
    pub fn writes(&self) -> Vec<Option<String>> {
        self.state.lock().1.clone()
    }

    /// Query string the page URL would carry, e.g. `code=GATE-9Z001`.
    pub fn query_string(&self) -> Option<String> {
        self.current().as_deref().and_then(code_query)
    }
}

impl UrlSync for MemoryUrlSync {
    fn replace_code(&self, code: Option<&str>) {
        let current = code.map(str::to_string);
        let mut state = self.state.lock();
        state.0 = current.clone();
        state.1.push(current);
    }
}

impl<T: UrlSync + ?Sized> UrlSync for Arc<T> {
    fn replace_code(&self, code: Option<&str>) {
        (**self).replace_code(code)
    }
}

/// Scan console bound to a gateway.
pub struct GateConsole<U: UrlSync = NoopUrlSync> {
    session: GateScanSession,
    gateway: Arc<dyn PassGateway>,
    url: U,
}

impl GateConsole<NoopUrlSync> {
    /// Console without URL mirroring.
    pub fn detached(gateway: Arc<dyn PassGateway>) -> Self {
        Self::new(gateway, NoopUrlSync)
    }
}

impl<U: UrlSync> GateConsole<U> {
    pub fn new(gateway: Arc<dyn PassGateway>, url: U) -> Self {
        Self {
            session: GateScanSession::new(),
            gateway,
            url,
        }
    }

    /// Start a console from the page's `code` query parameter.
    pub async fn hydrate(gateway: Arc<dyn PassGateway>, url: U, code_param: Option<&str>) -> Self {
        let mut console = Self::new(gateway, url);
        if let Some(code) = code_param.filter(|c| !c.trim().is_empty()) {
            console
                .dispatch(ConsoleEvent::CodeChanged {
                    code: code.to_string(),
                    source: InputSource::Url,
                })
                .await;
        }
        console
    }

    pub fn session(&self) -> &GateScanSession {
        &self.session
    }

    pub fn view(&self) -> ConsoleView {
        ConsoleView::from(&self.session)
    }

    pub fn url_sync(&self) -> &U {
        &self.url
    }

    pub async fn set_mode(&mut self, mode: ScanMode) {
        self.dispatch(ConsoleEvent::ModeChanged(mode)).await;
    }

    /// Text typed into the code input.
    pub async fn input(&mut self, code: &str) {
        self.dispatch(ConsoleEvent::CodeChanged {
            code: code.to_string(),
            source: InputSource::Keyboard,
        })
        .await;
    }

    /// Scan button or Enter.
    pub async fn scan(&mut self) {
        self.dispatch(ConsoleEvent::ScanRequested).await;
    }

    /// QR scanner read a code; submits without waiting for the operator.
    pub async fn qr_scanned(&mut self, code: &str) {
        self.dispatch(ConsoleEvent::CodeChanged {
            code: code.to_string(),
            source: InputSource::Scanner,
        })
        .await;
    }

    /// Check-In / Check-Out clicked on a visitor row.
    pub async fn choose_visitor(&mut self, visitor: Visitor, mode: ScanMode) {
        self.dispatch(ConsoleEvent::VisitorChosen { visitor, mode }).await;
    }

    /// Apply `event` and run effects until the session is quiescent.
    pub async fn dispatch(&mut self, event: ConsoleEvent) {
        let mut effects: VecDeque<ConsoleEffect> = self.session.apply(event).into();
        while let Some(effect) = effects.pop_front() {
            if let Some(follow_up) = self.run(effect).await {
                effects.extend(self.session.apply(follow_up));
            }
        }
    }

    async fn run(&self, effect: ConsoleEffect) -> Option<ConsoleEvent> {
        match effect {
            ConsoleEffect::ReplaceUrlCode(code) => {
                self.url.replace_code(code.as_deref());
                None
            }
            ConsoleEffect::FetchVisitors { base_code } => {
                let event = match self.gateway.list_visitors(&base_code).await {
                    Ok(visitors) => ConsoleEvent::VisitorsLoaded { base_code, visitors },
                    Err(e) => ConsoleEvent::VisitorsFailed {
                        error: ErrorResult::from_gateway_error(&e),
                        base_code,
                    },
                };
                Some(event)
            }
            ConsoleEffect::Submit { mode, request } => {
                let reply = match mode {
                    ScanMode::CheckIn => self.gateway.check_in(&request).await,
                    ScanMode::CheckOut => self.gateway.check_out(&request).await,
                };
                let event = match reply {
                    Ok(response) => ConsoleEvent::SubmitSettled { mode, response },
                    Err(e) => ConsoleEvent::SubmitFailed {
                        mode,
                        error: ErrorResult::from_gateway_error(&e),
                    },
                };
                Some(event)
            }
        }
    }
}
