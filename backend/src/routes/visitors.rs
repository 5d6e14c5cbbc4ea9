// =========================================================
// Visitor detail (gate clearance source)
// =========================================================

/// Route prefix for a visitor's detail payload, which carries the gate map
pub const VISITOR_DETAIL_PATH: &str = "/admin/visitors";

/// `GET /admin/visitors/{visitor_id}`
pub fn visitor_detail_path(visitor_id: &str) -> String {
    format!("{}/{}", VISITOR_DETAIL_PATH, visitor_id)
}
