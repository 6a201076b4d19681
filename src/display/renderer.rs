use crate::cache::CacheEntry;
use crate::scheduler::SchedulePolicy;
use crate::status_client::{format_relative_time, FetchOutcome, SyncTarget};
use crate::types::Timestamp;

use super::payload::{DisplayMode, DisplayPayload};
use super::style::DeviceStyleProfile;

pub const UNCONFIGURED_TITLE: &str = "Not configured";
pub const UNCONFIGURED_PROMPT: &str = "Open the app to set the host address";
pub const CONNECTING_LINE: &str = "Checking...";
pub const CONNECTION_FAILED_LINE: &str = "Connection failed";
pub const NO_STATUS_DETAIL: &str = "No status received yet";

/// Map cache contents to a display payload.
///
/// Pure: the same inputs always give the same payload. `policy` supplies the
/// interval after which a success counts as stale.
pub fn render(
    entry: &CacheEntry,
    target: &SyncTarget,
    in_flight: bool,
    profile: &DeviceStyleProfile,
    policy: &SchedulePolicy,
    now: &Timestamp,
) -> DisplayPayload {
    if target.is_empty() {
        return DisplayPayload {
            mode: DisplayMode::Unconfigured,
            headline: UNCONFIGURED_TITLE.to_string(),
            clock_text: String::new(),
            status_line: UNCONFIGURED_PROMPT.to_string(),
            item_count: None,
            presence: None,
            detail: None,
            style: *profile,
        };
    }

    let headline = now.format("%-m-%-d").to_string();
    let clock_text = now.format("%-H:%M").to_string();

    match &entry.last_outcome {
        None if in_flight => DisplayPayload {
            mode: DisplayMode::Connecting,
            headline,
            clock_text,
            status_line: CONNECTING_LINE.to_string(),
            item_count: None,
            presence: None,
            detail: None,
            style: *profile,
        },
        Some(FetchOutcome::Success {
            status,
            item_count,
            message,
            ..
        }) => {
            let stale = match entry.last_success_at {
                Some(at) => now.signed_duration_since(at) > policy.interval(),
                None => true,
            };
            let (mode, detail) = if stale {
                let age = entry
                    .last_success_at
                    .map(|at| format_relative_time(&at, now))
                    .unwrap_or_else(|| "unknown".to_string());
                (DisplayMode::StaleSuccess, Some(format!("Last success {age}")))
            } else {
                let detail = (!message.is_empty()).then(|| message.clone());
                (DisplayMode::Success, detail)
            };
            DisplayPayload {
                mode,
                headline,
                clock_text,
                status_line: count_line(*item_count),
                item_count: Some(*item_count),
                presence: Some(*status),
                detail,
                style: *profile,
            }
        }
        outcome => {
            let detail = outcome
                .as_ref()
                .and_then(FetchOutcome::failure_detail)
                .unwrap_or(NO_STATUS_DETAIL)
                .to_string();
            let status_line = match entry.last_successful_count {
                Some(count) => format!("{} (last known)", count_line(count)),
                None => CONNECTION_FAILED_LINE.to_string(),
            };
            DisplayPayload {
                mode: DisplayMode::Failure,
                headline,
                clock_text,
                status_line,
                item_count: entry.last_successful_count,
                presence: None,
                detail: Some(detail),
                style: *profile,
            }
        }
    }
}

fn count_line(count: u64) -> String {
    match count {
        1 => "1 item on host".to_string(),
        n => format!("{n} items on host"),
    }
}
