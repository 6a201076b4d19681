//! The single recurring sync task: when to poll, and what to do when a wake
//! arrives.

mod actor;
mod engine;
mod policy;
mod state;
mod timer;

pub use actor::SchedulerHandle;
pub use engine::{CycleStart, PendingFetch, SchedulerConfig, SyncScheduler};
pub use policy::{SchedulePolicy, WindowDecision};
pub use state::{CycleOutcome, ScheduleState, SchedulerPhase};
pub use timer::{TimerService, TokioTimer, WakeNotice, WakeSubscription};
