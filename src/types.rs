use chrono::{DateTime, FixedOffset};
use thiserror::Error;

/// Wall-clock instant with the local UTC offset it was observed in.
pub type Timestamp = DateTime<FixedOffset>;

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("settings storage error: {0}")]
    Storage(String),

    #[error("no target address configured")]
    NotConfigured,

    #[error("status host error: {0}")]
    Remote(String),

    #[error("scheduler channel closed")]
    Channel,
}
