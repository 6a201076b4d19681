use serde::Serialize;

use crate::status_client::Presence;

use super::style::DeviceStyleProfile;

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    Unconfigured,
    Connecting,
    Success,
    StaleSuccess,
    Failure,
}

/// Everything the host surface needs to draw one frame.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct DisplayPayload {
    pub mode: DisplayMode,
    /// Date line, or the state title when there is no date to show.
    pub headline: String,
    pub clock_text: String,
    pub status_line: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence: Option<Presence>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub style: DeviceStyleProfile,
}
