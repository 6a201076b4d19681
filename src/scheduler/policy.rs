use std::fmt;
use std::time::Duration;

use chrono::{TimeDelta, Timelike};
use serde::{Deserialize, Serialize};

use crate::types::{MonitorError, Timestamp};

/// When the sync cycle should fire.
///
/// Without an alignment minute the cycle fires every `interval_minutes`,
/// measured from the start of the current minute. With one it fires once an
/// hour at that minute and accepts wakes up to `tolerance_minutes` away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulePolicy {
    pub interval_minutes: u32,
    #[serde(default)]
    pub alignment_minute_of_hour: Option<u32>,
    #[serde(default)]
    pub tolerance_minutes: u32,
}

/// Whether a wake close to `now` should run a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowDecision {
    Execute,
    Skip { distance_minutes: u32 },
}

impl Default for SchedulePolicy {
    fn default() -> Self {
        Self::hourly_at(10, 5)
    }
}

impl SchedulePolicy {
    pub fn every_minutes(minutes: u32) -> Self {
        Self {
            interval_minutes: minutes,
            alignment_minute_of_hour: None,
            tolerance_minutes: 0,
        }
    }

    pub fn hourly_at(minute: u32, tolerance_minutes: u32) -> Self {
        Self {
            interval_minutes: 60,
            alignment_minute_of_hour: Some(minute),
            tolerance_minutes,
        }
    }

    pub fn validate(&self) -> Result<(), MonitorError> {
        if self.interval_minutes == 0 {
            return Err(MonitorError::Config(
                "schedule interval must be at least one minute".to_string(),
            ));
        }
        if let Some(minute) = self.alignment_minute_of_hour {
            if minute >= 60 {
                return Err(MonitorError::Config(format!(
                    "alignment minute {minute} is outside 0..60"
                )));
            }
            if self.interval_minutes != 60 {
                return Err(MonitorError::Config(format!(
                    "aligned schedules run hourly, got interval of {} minutes",
                    self.interval_minutes
                )));
            }
            if self.tolerance_minutes >= 30 {
                return Err(MonitorError::Config(format!(
                    "tolerance of {} minutes covers the whole hour",
                    self.tolerance_minutes
                )));
            }
        }
        Ok(())
    }

    pub fn interval(&self) -> TimeDelta {
        TimeDelta::minutes(i64::from(self.interval_minutes))
    }

    /// Drift the timer service may apply to a requested wake.
    pub fn tolerance(&self) -> Duration {
        Duration::from_secs(u64::from(self.tolerance_minutes) * 60)
    }

    /// First wake instant strictly after `now`.
    pub fn next_wake_after(&self, now: &Timestamp) -> Timestamp {
        let minute_start = start_of_minute(now);
        match self.alignment_minute_of_hour {
            None => minute_start + self.interval(),
            Some(minute) => {
                let hour_start = minute_start - TimeDelta::minutes(i64::from(now.minute()));
                let candidate = hour_start + TimeDelta::minutes(i64::from(minute));
                if candidate > *now {
                    candidate
                } else {
                    candidate + TimeDelta::hours(1)
                }
            }
        }
    }

    /// Interval-only policies always execute; aligned ones only inside the
    /// tolerance window around the alignment minute.
    pub fn window(&self, now: &Timestamp) -> WindowDecision {
        let Some(alignment) = self.alignment_minute_of_hour else {
            return WindowDecision::Execute;
        };
        let distance_minutes = minute_distance(now.minute(), alignment);
        if distance_minutes <= self.tolerance_minutes {
            WindowDecision::Execute
        } else {
            WindowDecision::Skip { distance_minutes }
        }
    }
}

impl fmt::Display for SchedulePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.alignment_minute_of_hour {
            Some(minute) => write!(
                f,
                "hourly at :{minute:02} (±{} min)",
                self.tolerance_minutes
            ),
            None if self.interval_minutes == 1 => f.write_str("every minute"),
            None => write!(f, "every {} minutes", self.interval_minutes),
        }
    }
}

fn start_of_minute(at: &Timestamp) -> Timestamp {
    *at - TimeDelta::seconds(i64::from(at.second()))
        - TimeDelta::nanoseconds(i64::from(at.nanosecond()))
}

/// Distance between two minutes of the hour, wrapping at the hour.
fn minute_distance(a: u32, b: u32) -> u32 {
    let diff = a.abs_diff(b) % 60;
    diff.min(60 - diff)
}
