use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::display::DeviceIdentity;
use crate::scheduler::SchedulePolicy;

/// Seeds the target address when settings hold none.
pub const ENV_TARGET: &str = "STATUS_WIDGET_TARGET";
/// Overrides `settings_path`.
pub const ENV_SETTINGS_PATH: &str = "STATUS_WIDGET_SETTINGS";

/// Configuration for the status widget backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub schedule: SchedulePolicy,

    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,

    /// Relative paths resolve against the app root.
    #[serde(default)]
    pub settings_path: Option<PathBuf>,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub device: DeviceIdentity,

    #[serde(skip)]
    pub initial_target: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schedule: SchedulePolicy::default(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            settings_path: None,
            log_level: default_log_level(),
            device: DeviceIdentity::default(),
            initial_target: None,
        }
    }
}

impl Config {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

fn default_fetch_timeout_secs() -> u64 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}
