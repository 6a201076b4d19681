use crate::types::Timestamp;

/// Port appended to targets that do not name one.
pub const DEFAULT_PORT: u16 = 5001;
pub const STATUS_PATH: &str = "/api/status";
pub const HEALTH_PATH: &str = "/api/health";
pub const DEFAULT_USER_AGENT: &str = "status-widget-backend";

pub fn endpoint_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Coarse age of `then` relative to `now`, e.g. "5 min ago".
pub fn format_relative_time(then: &Timestamp, now: &Timestamp) -> String {
    let duration = now.signed_duration_since(*then);
    if duration.num_seconds() < 60 {
        "just now".to_string()
    } else if duration.num_minutes() < 60 {
        format!("{} min ago", duration.num_minutes())
    } else if duration.num_hours() < 24 {
        format!("{} h ago", duration.num_hours())
    } else {
        format!("{} d ago", duration.num_days())
    }
}
