//! Deterministic stand-ins for the platform collaborators, shared by the
//! integration tests.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::TimeDelta;
use tokio::sync::Notify;

use status_widget::display::{DisplayPayload, DisplaySink};
use status_widget::scheduler::{TimerService, WakeSubscription};
use status_widget::status_client::{FetchErrorKind, FetchOutcome, StatusFetcher, SyncTarget};
use status_widget::{Clock, Timestamp};

// Test doubles keep going after a panicking test poisoned a lock.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Timestamp>,
}

impl ManualClock {
    pub fn new(now: Timestamp) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: Timestamp) {
        *lock(&self.now) = now;
    }

    pub fn advance(&self, by: TimeDelta) {
        let mut now = lock(&self.now);
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *lock(&self.now)
    }
}

/// Records wake requests; wakes are delivered by the test itself.
#[derive(Debug, Default)]
pub struct FakeTimer {
    next_id: AtomicU64,
    requested: Mutex<Vec<WakeSubscription>>,
    cancelled: Mutex<Vec<u64>>,
}

impl FakeTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requested(&self) -> Vec<WakeSubscription> {
        lock(&self.requested).clone()
    }

    pub fn cancelled(&self) -> Vec<u64> {
        lock(&self.cancelled).clone()
    }

    /// Requested and neither cancelled nor superseded by the test.
    pub fn pending(&self) -> Vec<WakeSubscription> {
        let cancelled = self.cancelled();
        self.requested()
            .into_iter()
            .filter(|subscription| !cancelled.contains(&subscription.id))
            .collect()
    }

    pub fn last_requested(&self) -> Option<Timestamp> {
        lock(&self.requested).last().map(|subscription| subscription.at)
    }
}

impl TimerService for FakeTimer {
    fn request_wake_at(&self, at: Timestamp, _tolerance: Duration) -> WakeSubscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let subscription = WakeSubscription { id, at };
        lock(&self.requested).push(subscription.clone());
        subscription
    }

    fn cancel(&self, subscription: &WakeSubscription) {
        lock(&self.cancelled).push(subscription.id);
    }
}

/// Keeps every payload it is shown.
#[derive(Debug, Default)]
pub struct RecordingSink {
    payloads: Mutex<Vec<DisplayPayload>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn payloads(&self) -> Vec<DisplayPayload> {
        lock(&self.payloads).clone()
    }

    pub fn last(&self) -> Option<DisplayPayload> {
        lock(&self.payloads).last().cloned()
    }
}

impl DisplaySink for RecordingSink {
    fn show(&self, payload: &DisplayPayload) {
        lock(&self.payloads).push(payload.clone());
    }
}

/// Returns queued outcomes in order, then `Unreachable` once the queue is
/// empty. With a gate, each fetch waits for [`ScriptedFetcher::release`].
#[derive(Debug, Default)]
pub struct ScriptedFetcher {
    outcomes: Mutex<VecDeque<FetchOutcome>>,
    requests: Mutex<Vec<SyncTarget>>,
    calls: AtomicUsize,
    started: Notify,
    gate: Option<Notify>,
}

impl ScriptedFetcher {
    pub fn new(outcomes: impl IntoIterator<Item = FetchOutcome>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into_iter().collect()),
            ..Self::default()
        }
    }

    pub fn gated(outcomes: impl IntoIterator<Item = FetchOutcome>) -> Self {
        Self {
            gate: Some(Notify::new()),
            ..Self::new(outcomes)
        }
    }

    pub fn push(&self, outcome: FetchOutcome) {
        lock(&self.outcomes).push_back(outcome);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<SyncTarget> {
        lock(&self.requests).clone()
    }

    /// Resolves once a fetch has started.
    pub async fn wait_started(&self) {
        self.started.notified().await;
    }

    /// Let one gated fetch complete.
    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }
}

#[async_trait]
impl StatusFetcher for ScriptedFetcher {
    async fn fetch(&self, target: &SyncTarget, _timeout: Duration) -> FetchOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.requests).push(target.clone());
        self.started.notify_one();
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        lock(&self.outcomes).pop_front().unwrap_or_else(|| {
            FetchOutcome::failure(FetchErrorKind::Unreachable, "No scripted outcome left")
        })
    }
}
