pub mod cache;
pub mod clock;
pub mod config;
pub mod display;
pub mod logging;
pub mod scheduler;
pub mod settings;
pub mod status_client;
pub mod types;

pub use cache::{CacheEntry, StatusCache};
pub use clock::{Clock, SystemClock};
pub use config::Config;
pub use display::{render, DisplayMode, DisplayPayload, DisplaySink};
pub use scheduler::{SchedulePolicy, SchedulerHandle, SyncScheduler};
pub use status_client::{FetchErrorKind, FetchOutcome, StatusClient, StatusFetcher, SyncTarget};
pub use types::{MonitorError, Timestamp};
