use serde::Serialize;

use crate::status_client::FetchOutcome;
use crate::types::Timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerPhase {
    Idle,
    Armed,
    Firing,
}

/// The single recurring task. `next_wake_at` is `None` whenever nothing is
/// armed, including while a cycle is firing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScheduleState {
    pub next_wake_at: Option<Timestamp>,
    pub active: bool,
}

/// What one trigger of the cycle ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    Executed {
        outcome: FetchOutcome,
        /// False when the cache could not be written to settings.
        persisted: bool,
    },
    /// The wake fell outside the tolerance window.
    Skipped { distance_minutes: u32 },
    /// Stale or duplicate wake, or nothing armed.
    Ignored,
}

impl CycleOutcome {
    pub fn executed(&self) -> bool {
        matches!(self, CycleOutcome::Executed { .. })
    }
}
