use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::cache::{CacheEntry, StatusCache};
use crate::clock::Clock;
use crate::display::{describe, render, DeviceStyleProfile, DisplayPayload, DisplaySink};
use crate::settings::{SettingsStore, KEY_TARGET_ADDRESS};
use crate::status_client::{FetchOutcome, StatusFetcher, SyncTarget};
use crate::types::{MonitorError, Timestamp};

use super::policy::{SchedulePolicy, WindowDecision};
use super::state::{CycleOutcome, ScheduleState, SchedulerPhase};
use super::timer::{TimerService, WakeSubscription};

/// Knobs for one scheduler instance.
#[derive(Debug, Clone, Copy)]
pub struct SchedulerConfig {
    pub policy: SchedulePolicy,
    pub profile: DeviceStyleProfile,
    pub fetch_timeout: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            policy: SchedulePolicy::default(),
            profile: DeviceStyleProfile::default(),
            fetch_timeout: Duration::from_secs(10),
        }
    }
}

/// A fetch the scheduler has committed to. Owns everything it needs so the
/// caller can keep handling commands while it runs.
pub struct PendingFetch {
    fetcher: Arc<dyn StatusFetcher>,
    target: SyncTarget,
    timeout: Duration,
}

impl PendingFetch {
    pub fn target(&self) -> &SyncTarget {
        &self.target
    }

    pub async fn run(self) -> FetchOutcome {
        self.fetcher.fetch(&self.target, self.timeout).await
    }
}

/// First half of a cycle: either a fetch to run or an already final outcome.
pub enum CycleStart {
    Fetch(PendingFetch),
    Finished(CycleOutcome),
}

/// Drives fetch, cache update, render and re-arm for the one sync target.
pub struct SyncScheduler {
    settings: Arc<dyn SettingsStore>,
    cache: StatusCache,
    fetcher: Arc<dyn StatusFetcher>,
    timer: Arc<dyn TimerService>,
    sink: Arc<dyn DisplaySink>,
    clock: Arc<dyn Clock>,
    config: SchedulerConfig,
    target: SyncTarget,
    phase: SchedulerPhase,
    schedule: ScheduleState,
    subscription: Option<WakeSubscription>,
}

impl SyncScheduler {
    pub fn new(
        settings: Arc<dyn SettingsStore>,
        fetcher: Arc<dyn StatusFetcher>,
        timer: Arc<dyn TimerService>,
        sink: Arc<dyn DisplaySink>,
        clock: Arc<dyn Clock>,
        config: SchedulerConfig,
    ) -> Self {
        let cache = StatusCache::load(settings.clone());
        Self {
            settings,
            cache,
            fetcher,
            timer,
            sink,
            clock,
            config,
            target: SyncTarget::default(),
            phase: SchedulerPhase::Idle,
            schedule: ScheduleState::default(),
            subscription: None,
        }
    }

    pub fn phase(&self) -> SchedulerPhase {
        self.phase
    }

    pub fn schedule(&self) -> &ScheduleState {
        &self.schedule
    }

    pub fn target(&self) -> &SyncTarget {
        &self.target
    }

    pub fn policy(&self) -> &SchedulePolicy {
        &self.config.policy
    }

    pub fn cache_entry(&self) -> CacheEntry {
        self.cache.read()
    }

    pub fn subscribe(&self) -> watch::Receiver<CacheEntry> {
        self.cache.subscribe()
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    pub fn describe(&self) -> String {
        describe(&self.cache.read(), &self.target, &self.clock.now())
    }

    /// Startup and restart recovery. The next wake is always recomputed
    /// from the current time; persisted instants are not trusted.
    pub fn restore(&mut self) -> DisplayPayload {
        let stored = match self.settings.get_string(KEY_TARGET_ADDRESS) {
            Ok(value) => value.unwrap_or_default(),
            Err(err) => {
                warn!(error = %err, "Could not read stored target, starting unconfigured");
                String::new()
            }
        };
        self.target = SyncTarget::new(stored);

        if self.target.is_empty() {
            info!("No target configured, staying idle");
            self.disarm();
        } else {
            info!(host = %self.target, policy = %self.config.policy, "Restoring schedule");
            self.arm(self.clock.now());
        }
        self.refresh_display()
    }

    /// Store a new target. Empty clears and disarms; anything else starts an
    /// immediate forced cycle which arms the schedule when it completes.
    pub fn apply_target(&mut self, raw: &str) -> Result<CycleStart, MonitorError> {
        let target = SyncTarget::new(raw);
        if target.is_empty() {
            self.settings.remove(KEY_TARGET_ADDRESS)?;
        } else {
            self.settings
                .set_string(KEY_TARGET_ADDRESS, target.as_str())?;
        }
        info!(host = %target, "Target updated");
        self.target = target;

        if self.target.is_empty() {
            self.disarm();
            self.refresh_display();
            return Ok(CycleStart::Finished(CycleOutcome::Ignored));
        }
        self.start_forced()
    }

    /// Handle a wake delivered by the timer service. Only the exact instant
    /// currently armed is honoured.
    pub fn start_wake(&mut self, at: Timestamp) -> Result<CycleStart, MonitorError> {
        if self.phase != SchedulerPhase::Armed || self.schedule.next_wake_at != Some(at) {
            debug!(
                at = %at,
                armed = ?self.schedule.next_wake_at,
                phase = ?self.phase,
                "Ignoring wake that does not match the armed instant"
            );
            return Ok(CycleStart::Finished(CycleOutcome::Ignored));
        }
        self.subscription = None;

        let now = self.clock.now();
        match self.config.policy.window(&now) {
            WindowDecision::Execute => self.start_fetch(),
            WindowDecision::Skip { distance_minutes } => {
                info!(
                    now = %now,
                    distance_minutes,
                    tolerance_minutes = self.config.policy.tolerance_minutes,
                    "Wake outside tolerance window, skipping fetch"
                );
                self.arm(now);
                self.refresh_display();
                Ok(CycleStart::Finished(CycleOutcome::Skipped { distance_minutes }))
            }
        }
    }

    /// Cycle that bypasses the tolerance window, e.g. when the app resumes.
    pub fn start_forced(&mut self) -> Result<CycleStart, MonitorError> {
        if self.phase == SchedulerPhase::Firing {
            debug!("Cycle already in flight, ignoring forced refresh");
            return Ok(CycleStart::Finished(CycleOutcome::Ignored));
        }
        if self.target.is_empty() {
            return Err(MonitorError::NotConfigured);
        }
        self.cancel_wake();
        self.schedule.active = true;
        self.start_fetch()
    }

    /// Second half of an executed cycle. The attempt is always recorded; the
    /// schedule is re-armed unless it was disarmed while the fetch ran.
    pub fn finish_cycle(&mut self, outcome: FetchOutcome) -> CycleOutcome {
        let now = self.clock.now();
        let persisted = match self.cache.record_attempt(outcome.clone(), now) {
            Ok(_) => true,
            Err(err) => {
                warn!(error = %err, "Could not persist fetch result");
                false
            }
        };

        match &outcome {
            FetchOutcome::Success { item_count, .. } => {
                info!(host = %self.target, item_count, "Status fetched");
            }
            FetchOutcome::Failure { kind, detail } => {
                warn!(host = %self.target, kind = %kind, detail = %detail, "Status fetch failed");
            }
        }

        if self.schedule.active && !self.target.is_empty() {
            self.arm(now);
        } else {
            debug!("Schedule disarmed during fetch, not re-arming");
            self.phase = SchedulerPhase::Idle;
            self.schedule = ScheduleState::default();
        }
        self.refresh_display();
        CycleOutcome::Executed { outcome, persisted }
    }

    pub async fn configure_target(&mut self, raw: &str) -> Result<CycleOutcome, MonitorError> {
        let start = self.apply_target(raw)?;
        Ok(self.drive(start).await)
    }

    pub async fn on_wake(&mut self, at: Timestamp) -> Result<CycleOutcome, MonitorError> {
        let start = self.start_wake(at)?;
        Ok(self.drive(start).await)
    }

    pub async fn refresh_now(&mut self) -> Result<CycleOutcome, MonitorError> {
        let start = self.start_forced()?;
        Ok(self.drive(start).await)
    }

    /// Cancel any outstanding wake and go idle. While firing, the running
    /// cycle still records its result but will not re-arm.
    pub fn disarm(&mut self) {
        self.cancel_wake();
        self.schedule = ScheduleState::default();
        if self.phase != SchedulerPhase::Firing {
            self.phase = SchedulerPhase::Idle;
        }
        debug!(phase = ?self.phase, "Schedule disarmed");
    }

    /// A surface was placed: draw from the cache and make sure a configured
    /// target is being polled.
    pub fn surface_added(&mut self) -> DisplayPayload {
        if !self.target.is_empty() && self.phase == SchedulerPhase::Idle {
            self.arm(self.clock.now());
        }
        self.refresh_display()
    }

    pub fn surface_removed(&mut self) {
        info!("Last surface removed");
        self.disarm();
    }

    /// Render the current cache and hand it to the sink.
    pub fn refresh_display(&self) -> DisplayPayload {
        let payload = render(
            &self.cache.read(),
            &self.target,
            self.phase == SchedulerPhase::Firing,
            &self.config.profile,
            &self.config.policy,
            &self.clock.now(),
        );
        self.sink.show(&payload);
        payload
    }

    async fn drive(&mut self, start: CycleStart) -> CycleOutcome {
        match start {
            CycleStart::Finished(outcome) => outcome,
            CycleStart::Fetch(pending) => {
                let outcome = pending.run().await;
                self.finish_cycle(outcome)
            }
        }
    }

    fn start_fetch(&mut self) -> Result<CycleStart, MonitorError> {
        if self.target.is_empty() {
            return Err(MonitorError::NotConfigured);
        }
        self.phase = SchedulerPhase::Firing;
        self.schedule.next_wake_at = None;
        self.refresh_display();

        debug!(host = %self.target, "Starting fetch cycle");
        Ok(CycleStart::Fetch(PendingFetch {
            fetcher: self.fetcher.clone(),
            target: self.target.clone(),
            timeout: self.config.fetch_timeout,
        }))
    }

    fn arm(&mut self, now: Timestamp) {
        self.cancel_wake();
        let next = self.config.policy.next_wake_after(&now);
        let subscription = self
            .timer
            .request_wake_at(next, self.config.policy.tolerance());
        info!(next_wake_at = %next, "Schedule armed");
        self.subscription = Some(subscription);
        self.schedule = ScheduleState {
            next_wake_at: Some(next),
            active: true,
        };
        self.phase = SchedulerPhase::Armed;
    }

    fn cancel_wake(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            self.timer.cancel(&subscription);
        }
    }
}
