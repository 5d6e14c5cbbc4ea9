//! Service layer for the gate console.
//!
//! Pure decision logic lives here: pass code classification, the scan session
//! state machine and the clearance path builder. The only async piece is
//! [`console_driver::GateConsole`], which runs session effects against a
//! [`crate::gateway::PassGateway`].

pub mod clearance;
pub mod console;
pub mod console_driver;
pub mod pass_code;

#[cfg(test)]
#[path = "clearance_tests.rs"]
mod clearance_tests;


pub use clearance::{
    build_clearance_path, build_clearance_timeline, ClearanceState, ClearanceTimeline,
    GateClearancePath, TimelineBranch, TimelineNode, ROOT_BRANCH,
};
pub use console::{
    transition, visitor_submission_code, ConsoleEffect, ConsoleEvent, ConsolePanel, ConsolePhase,
    ConsoleView, ErrorResult, GateScanSession, InFlight, InputSource, ScanMode, ScanOutcome,
};
pub use console_driver::{GateConsole, MemoryUrlSync, NoopUrlSync, UrlSync};
pub use pass_code::{decide_dispatch, normalize_code, parse_code, DispatchDecision, PassCode, PassCodeError};
