// =========================================================
// Console page URL surface
// =========================================================

/// The only query parameter the scan console reads or writes.
pub const CODE_QUERY_PARAM: &str = "code";

/// Query string for a console URL carrying `code`, or `None` when the code is
/// blank and the parameter should be dropped entirely.
pub fn code_query(code: &str) -> Option<String> {
    let code = code.trim();
    if code.is_empty() {
        None
    } else {
        Some(format!("{}={}", CODE_QUERY_PARAM, code.to_uppercase()))
    }
}
