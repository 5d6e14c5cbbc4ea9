//! Pass code resolution.
//!
//! Classifies whatever the operator typed or the scanner produced into a
//! [`PassCode`] and decides how the console should dispatch it. Everything in
//! here is pure: no I/O, no state.

use serde::{Deserialize, Serialize};

/// Prefix of resident self-passes, always checked in/out directly.
pub const RESIDENT_PREFIX: &str = "RES-";

/// Prefix of visitor gate passes.
pub const GATE_PREFIX: &str = "GATE-";

const SEGMENT_SEPARATOR: char = '-';

/// Rejected input shapes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PassCodeError {
    #[error("Pass code is empty")]
    Empty,
}

/// A normalized pass code split into its base and optional visitor suffix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PassCode {
    /// Trimmed, uppercased input.
    pub normalized: String,
    /// `PREFIX-TOKEN` portion shared by every visitor on the pass.
    pub base_code: String,
    /// Per-visitor disambiguator, present only on three-part codes.
    pub suffix: Option<String>,
    pub is_three_part: bool,
}

impl PassCode {
    /// Dispatch decision for this code.
    pub fn dispatch(&self) -> DispatchDecision {
        if is_direct_mutate(&self.normalized, self.is_three_part) {
            DispatchDecision::DirectMutate
        } else {
            DispatchDecision::ResolveVisitor
        }
    }

    /// Code for a specific visitor sharing this pass.
    pub fn with_suffix(&self, suffix: &str) -> String {
        format!("{}{}{}", self.base_code, SEGMENT_SEPARATOR, suffix)
    }
}

impl std::fmt::Display for PassCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.normalized)
    }
}

/// What the console does with a code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchDecision {
    /// Check in/out immediately.
    DirectMutate,
    /// Fetch the visitors on the base code and let the operator pick one.
    ResolveVisitor,
}

/// Trim and uppercase. Returns an empty string for blank input.
pub fn normalize_code(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Split a raw code into base code and suffix.
///
/// Malformed codes (no hyphen, empty segments) are not rejected here; they
/// parse as two-part codes and simply resolve to no visitors downstream.
pub fn parse_code(raw: &str) -> Result<PassCode, PassCodeError> {
    let normalized = normalize_code(raw);
    if normalized.is_empty() {
        return Err(PassCodeError::Empty);
    }

    let segments: Vec<&str> = normalized.split(SEGMENT_SEPARATOR).collect();
    let pass_code = if segments.len() >= 3 {
        let last = segments.len() - 1;
        PassCode {
            base_code: segments[..last].join("-"),
            suffix: Some(segments[last].to_string()),
            is_three_part: true,
            normalized,
        }
    } else {
        PassCode {
            base_code: normalized.clone(),
            suffix: None,
            is_three_part: false,
            normalized,
        }
    };

    Ok(pass_code)
}

/// Decide how to dispatch `raw`. Shares its predicate with [`PassCode::dispatch`].
pub fn decide_dispatch(raw: &str) -> Result<DispatchDecision, PassCodeError> {
    parse_code(raw).map(|code| code.dispatch())
}

fn is_direct_mutate(normalized: &str, is_three_part: bool) -> bool {
    normalized.starts_with(RESIDENT_PREFIX) || (normalized.starts_with(GATE_PREFIX) && is_three_part)
}
