use serde::{Deserialize, Serialize};

use crate::status_client::FetchOutcome;
use crate::types::Timestamp;

/// Last attempt and last known-good result. One slot, no history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub last_outcome: Option<FetchOutcome>,
    pub last_attempt_at: Option<Timestamp>,
    pub last_success_at: Option<Timestamp>,
    pub last_successful_count: Option<u64>,
}

impl CacheEntry {
    /// Fold one attempt into the entry. A failure only touches the attempt
    /// fields; last-good data stays in place.
    pub fn with_attempt(mut self, outcome: FetchOutcome, at: Timestamp) -> Self {
        if let Some(count) = outcome.item_count() {
            self.last_success_at = Some(at);
            self.last_successful_count = Some(count);
        }
        self.last_attempt_at = Some(at);
        self.last_outcome = Some(outcome);
        self
    }

    pub fn has_success(&self) -> bool {
        self.last_success_at.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status_client::{FetchErrorKind, Presence};
    use chrono::{DateTime, TimeDelta};

    fn at(raw: &str) -> Timestamp {
        DateTime::parse_from_rfc3339(raw).unwrap()
    }

    fn success(count: u64) -> FetchOutcome {
        FetchOutcome::Success {
            status: Presence::Present,
            item_count: count,
            message: "ok".to_string(),
            remote_timestamp: String::new(),
        }
    }

    #[test]
    fn failure_keeps_last_good_count() {
        let first = at("2024-01-01T10:10:00+08:00");
        let second = first + TimeDelta::hours(1);

        let entry = CacheEntry::default().with_attempt(success(3), first);
        let entry = entry.with_attempt(
            FetchOutcome::failure(FetchErrorKind::Unreachable, "Cannot connect"),
            second,
        );

        assert_eq!(entry.last_successful_count, Some(3));
        assert_eq!(entry.last_success_at, Some(first));
        assert_eq!(entry.last_attempt_at, Some(second));
        assert!(matches!(
            entry.last_outcome,
            Some(FetchOutcome::Failure { .. })
        ));
    }

    #[test]
    fn success_replaces_count_and_time() {
        let first = at("2024-01-01T10:10:00+08:00");
        let second = first + TimeDelta::hours(1);
        let entry = CacheEntry::default()
            .with_attempt(success(3), first)
            .with_attempt(success(0), second);
        assert_eq!(entry.last_successful_count, Some(0));
        assert_eq!(entry.last_success_at, Some(second));
    }
}
