mod api_types;
mod client;
mod helpers;
mod outcome;
mod target;

pub use api_types::{HealthResponse, StatusResponse};
pub use client::{parse_status_body, HealthReport, StatusClient, StatusFetcher};
pub use helpers::{format_relative_time, DEFAULT_PORT, HEALTH_PATH, STATUS_PATH};
pub use outcome::{FetchErrorKind, FetchOutcome, Presence};
pub use target::{normalize, SyncTarget};
