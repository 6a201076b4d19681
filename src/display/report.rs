use std::fmt::Write;

use crate::cache::CacheEntry;
use crate::status_client::{format_relative_time, FetchOutcome, Presence, SyncTarget};
use crate::types::Timestamp;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Multi-line status report for the settings screen and the `status` command.
pub fn describe(entry: &CacheEntry, target: &SyncTarget, now: &Timestamp) -> String {
    let mut out = String::new();
    if target.is_empty() {
        out.push_str("Server: not configured\n");
    } else {
        let _ = writeln!(out, "Server: {}", target.base_url());
    }

    match &entry.last_outcome {
        None => out.push_str("Status: no check yet\n"),
        Some(FetchOutcome::Success {
            status,
            item_count,
            message,
            remote_timestamp,
        }) => {
            let status = match status {
                Presence::Present => "items pending",
                Presence::Absent => "nothing pending",
            };
            let _ = writeln!(out, "Status: {status}");
            let _ = writeln!(out, "Count: {item_count}");
            if !message.is_empty() {
                let _ = writeln!(out, "Server message: {message}");
            }
            if !remote_timestamp.is_empty() {
                let _ = writeln!(out, "Server time: {remote_timestamp}");
            }
        }
        Some(FetchOutcome::Failure { kind, detail }) => {
            let _ = writeln!(out, "Status: failed ({kind})");
            let _ = writeln!(out, "Error: {detail}");
            if let Some(count) = entry.last_successful_count {
                let _ = writeln!(out, "Last known count: {count}");
            }
        }
    }

    if let Some(at) = entry.last_success_at {
        let _ = writeln!(
            out,
            "Last success: {} ({})",
            at.format(TIME_FORMAT),
            format_relative_time(&at, now)
        );
    }
    if let Some(at) = entry.last_attempt_at {
        let _ = writeln!(out, "Last attempt: {}", at.format(TIME_FORMAT));
    }
    let _ = write!(out, "Local time: {}", now.format(TIME_FORMAT));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status_client::FetchErrorKind;
    use chrono::{DateTime, TimeDelta};

    fn at(raw: &str) -> Timestamp {
        DateTime::parse_from_rfc3339(raw).unwrap()
    }

    #[test]
    fn describes_success() {
        let now = at("2024-01-01T10:10:00+08:00");
        let entry = CacheEntry::default().with_attempt(
            FetchOutcome::Success {
                status: Presence::Present,
                item_count: 4,
                message: "4 files waiting".to_string(),
                remote_timestamp: "2024-01-01T10:09:58".to_string(),
            },
            now,
        );
        let report = describe(&entry, &SyncTarget::new("10.0.0.2"), &now);
        assert!(report.starts_with("Server: http://10.0.0.2:5001\n"));
        assert!(report.contains("Status: items pending\n"));
        assert!(report.contains("Count: 4\n"));
        assert!(report.contains("Server message: 4 files waiting\n"));
        assert!(report.contains("Server time: 2024-01-01T10:09:58\n"));
        assert!(report.ends_with("Local time: 2024-01-01 10:10:00"));
    }

    #[test]
    fn describes_failure_with_last_known_count() {
        let first = at("2024-01-01T10:10:00+08:00");
        let now = first + TimeDelta::hours(2);
        let entry = CacheEntry::default()
            .with_attempt(
                FetchOutcome::Success {
                    status: Presence::Absent,
                    item_count: 0,
                    message: String::new(),
                    remote_timestamp: String::new(),
                },
                first,
            )
            .with_attempt(
                FetchOutcome::failure(FetchErrorKind::HttpError { code: 500 }, "boom"),
                now,
            );
        let report = describe(&entry, &SyncTarget::new("10.0.0.2"), &now);
        assert!(report.contains("Status: failed (http 500)\n"));
        assert!(report.contains("Error: boom\n"));
        assert!(report.contains("Last known count: 0\n"));
        assert!(report.contains("(2 h ago)"));
    }

    #[test]
    fn describes_unconfigured() {
        let now = at("2024-01-01T10:10:00+08:00");
        let report = describe(&CacheEntry::default(), &SyncTarget::default(), &now);
        assert!(report.starts_with("Server: not configured\nStatus: no check yet\n"));
    }
}
