use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::clock::Clock;
use crate::types::Timestamp;

/// Handle for one requested wake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WakeSubscription {
    pub id: u64,
    pub at: Timestamp,
}

/// Delivered when a requested wake fires. `at` is the instant that was
/// requested, not the time of delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WakeNotice {
    pub at: Timestamp,
}

/// Wake/alarm service of the host platform.
///
/// `tolerance` is how far the service may move the wake to batch it with
/// other work. Fired wakes arrive on whatever channel the implementation was
/// built with.
pub trait TimerService: Send + Sync {
    fn request_wake_at(&self, at: Timestamp, tolerance: Duration) -> WakeSubscription;
    fn cancel(&self, subscription: &WakeSubscription);
}

/// `TimerService` on top of `tokio::time`. Each subscription is a sleeping
/// task; cancelling aborts it.
pub struct TokioTimer {
    wakes: mpsc::UnboundedSender<WakeNotice>,
    clock: Arc<dyn Clock>,
    next_id: AtomicU64,
    tasks: Mutex<HashMap<u64, JoinHandle<()>>>,
}

impl TokioTimer {
    /// Must be called inside a tokio runtime.
    pub fn new(clock: Arc<dyn Clock>) -> (Self, mpsc::UnboundedReceiver<WakeNotice>) {
        let (wakes, receiver) = mpsc::unbounded_channel();
        let timer = Self {
            wakes,
            clock,
            next_id: AtomicU64::new(1),
            tasks: Mutex::new(HashMap::new()),
        };
        (timer, receiver)
    }
}

impl TimerService for TokioTimer {
    fn request_wake_at(&self, at: Timestamp, tolerance: Duration) -> WakeSubscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let delay = (at - self.clock.now()).to_std().unwrap_or(Duration::ZERO);
        debug!(
            id,
            at = %at,
            delay_secs = delay.as_secs(),
            tolerance_secs = tolerance.as_secs(),
            "Scheduling wake"
        );

        let wakes = self.wakes.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if wakes.send(WakeNotice { at }).is_err() {
                trace!(id, "Wake receiver gone");
            }
        });

        match self.tasks.lock() {
            Ok(mut tasks) => {
                tasks.retain(|_, task| !task.is_finished());
                tasks.insert(id, task);
            }
            Err(_) => warn!(id, "Timer task table poisoned, wake cannot be cancelled"),
        }
        WakeSubscription { id, at }
    }

    fn cancel(&self, subscription: &WakeSubscription) {
        let task = match self.tasks.lock() {
            Ok(mut tasks) => tasks.remove(&subscription.id),
            Err(_) => None,
        };
        if let Some(task) = task {
            debug!(id = subscription.id, at = %subscription.at, "Cancelling wake");
            task.abort();
        }
    }
}
