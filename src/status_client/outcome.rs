use std::fmt;

use serde::{Deserialize, Serialize};

use super::api_types::StatusResponse;

/// Whether the host reported pending items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Presence {
    Present,
    Absent,
}

impl Presence {
    /// Maps the two recognised wire values; anything else is `None`.
    pub fn from_wire(value: &str) -> Option<Self> {
        match value {
            "has" => Some(Presence::Present),
            "none" => Some(Presence::Absent),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FetchErrorKind {
    Unreachable,
    Timeout,
    HttpError { code: u16 },
    ParseError,
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchErrorKind::Unreachable => f.write_str("unreachable"),
            FetchErrorKind::Timeout => f.write_str("timeout"),
            FetchErrorKind::HttpError { code } => write!(f, "http {code}"),
            FetchErrorKind::ParseError => f.write_str("invalid response"),
        }
    }
}

/// Result of a single status request. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FetchOutcome {
    Success {
        status: Presence,
        item_count: u64,
        message: String,
        remote_timestamp: String,
    },
    Failure {
        kind: FetchErrorKind,
        detail: String,
    },
}

impl FetchOutcome {
    pub fn failure(kind: FetchErrorKind, detail: impl Into<String>) -> Self {
        FetchOutcome::Failure {
            kind,
            detail: detail.into(),
        }
    }

    /// Unknown status values are reported as `Absent` and the raw value is
    /// kept in the message.
    pub fn from_response(response: StatusResponse) -> Self {
        let (status, message) = match Presence::from_wire(&response.status) {
            Some(status) => (status, response.message),
            None => {
                let note = format!("unexpected status \"{}\"", response.status);
                let message = if response.message.is_empty() {
                    note
                } else {
                    format!("{} ({note})", response.message)
                };
                (Presence::Absent, message)
            }
        };

        FetchOutcome::Success {
            status,
            item_count: response.total_count,
            message,
            remote_timestamp: response.timestamp,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Success { .. })
    }

    pub fn item_count(&self) -> Option<u64> {
        match self {
            FetchOutcome::Success { item_count, .. } => Some(*item_count),
            FetchOutcome::Failure { .. } => None,
        }
    }

    pub fn failure_detail(&self) -> Option<&str> {
        match self {
            FetchOutcome::Success { .. } => None,
            FetchOutcome::Failure { detail, .. } => Some(detail.as_str()),
        }
    }
}
