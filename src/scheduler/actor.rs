use std::collections::VecDeque;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::CacheEntry;
use crate::status_client::SyncTarget;
use crate::types::MonitorError;

use super::engine::{CycleStart, SyncScheduler};
use super::timer::WakeNotice;

enum Command {
    ConfigureTarget(String),
    RefreshNow,
    Disarm,
    SurfaceAdded,
    SurfaceRemoved,
    Describe(oneshot::Sender<String>),
    CurrentTarget(oneshot::Sender<SyncTarget>),
    Shutdown,
}

/// Cheap handle to the scheduler task. The task is the only writer of the
/// status cache; everything else reads through [`SchedulerHandle::cache`].
#[derive(Clone)]
pub struct SchedulerHandle {
    commands: mpsc::UnboundedSender<Command>,
    cache: watch::Receiver<CacheEntry>,
}

impl SchedulerHandle {
    /// Move the scheduler onto its own task. `wakes` is the receiving end of
    /// the timer service the scheduler was built with.
    pub fn spawn(
        scheduler: SyncScheduler,
        wakes: mpsc::UnboundedReceiver<WakeNotice>,
    ) -> (Self, JoinHandle<()>) {
        let (commands, receiver) = mpsc::unbounded_channel();
        let cache = scheduler.subscribe();
        let actor = SchedulerActor {
            scheduler,
            commands: receiver,
            wakes,
            deferred: VecDeque::new(),
            commands_open: true,
        };
        let task = tokio::spawn(actor.run());
        (Self { commands, cache }, task)
    }

    pub fn configure_target(&self, raw: impl Into<String>) -> Result<(), MonitorError> {
        self.send(Command::ConfigureTarget(raw.into()))
    }

    pub fn refresh_now(&self) -> Result<(), MonitorError> {
        self.send(Command::RefreshNow)
    }

    pub fn disarm(&self) -> Result<(), MonitorError> {
        self.send(Command::Disarm)
    }

    pub fn surface_added(&self) -> Result<(), MonitorError> {
        self.send(Command::SurfaceAdded)
    }

    pub fn surface_removed(&self) -> Result<(), MonitorError> {
        self.send(Command::SurfaceRemoved)
    }

    pub fn shutdown(&self) -> Result<(), MonitorError> {
        self.send(Command::Shutdown)
    }

    /// Status report. Answered once any in-flight cycle has completed.
    pub async fn describe(&self) -> Result<String, MonitorError> {
        let (reply, response) = oneshot::channel();
        self.send(Command::Describe(reply))?;
        response.await.map_err(|_| MonitorError::Channel)
    }

    pub async fn target(&self) -> Result<SyncTarget, MonitorError> {
        let (reply, response) = oneshot::channel();
        self.send(Command::CurrentTarget(reply))?;
        response.await.map_err(|_| MonitorError::Channel)
    }

    pub fn cache(&self) -> watch::Receiver<CacheEntry> {
        self.cache.clone()
    }

    fn send(&self, command: Command) -> Result<(), MonitorError> {
        self.commands.send(command).map_err(|_| MonitorError::Channel)
    }
}

struct SchedulerActor {
    scheduler: SyncScheduler,
    commands: mpsc::UnboundedReceiver<Command>,
    wakes: mpsc::UnboundedReceiver<WakeNotice>,
    deferred: VecDeque<Command>,
    commands_open: bool,
}

impl SchedulerActor {
    async fn run(mut self) {
        debug!("Scheduler task started");
        loop {
            let command = match self.deferred.pop_front() {
                Some(command) => command,
                None => {
                    if !self.commands_open {
                        break;
                    }
                    tokio::select! {
                        command = self.commands.recv() => match command {
                            Some(command) => command,
                            None => break,
                        },
                        Some(notice) = self.wakes.recv() => {
                            let start = self.scheduler.start_wake(notice.at);
                            if !self.drive(start).await {
                                break;
                            }
                            continue;
                        }
                    }
                }
            };
            if !self.handle(command).await {
                break;
            }
        }
        self.scheduler.disarm();
        info!("Scheduler task stopped");
    }

    /// Returns false once the task should stop.
    async fn handle(&mut self, command: Command) -> bool {
        let start = match command {
            Command::ConfigureTarget(raw) => self.scheduler.apply_target(&raw),
            Command::RefreshNow => self.scheduler.start_forced(),
            Command::Disarm => {
                self.scheduler.disarm();
                return true;
            }
            Command::SurfaceAdded => {
                self.scheduler.surface_added();
                return true;
            }
            Command::SurfaceRemoved => {
                self.scheduler.surface_removed();
                return true;
            }
            Command::Describe(reply) => {
                let _ = reply.send(self.scheduler.describe());
                return true;
            }
            Command::CurrentTarget(reply) => {
                let _ = reply.send(self.scheduler.target().clone());
                return true;
            }
            Command::Shutdown => return false,
        };
        self.drive(start).await
    }

    /// Run a started cycle to completion while still listening for commands.
    /// Wakes are dropped, disarming applies at once and everything else waits
    /// until the cycle is done.
    async fn drive(&mut self, start: Result<CycleStart, MonitorError>) -> bool {
        let pending = match start {
            Ok(CycleStart::Fetch(pending)) => pending,
            Ok(CycleStart::Finished(outcome)) => {
                debug!(?outcome, "Cycle finished without fetching");
                return true;
            }
            Err(err) => {
                warn!(error = %err, "Cycle not started");
                return true;
            }
        };

        let mut keep_running = true;
        let fetch = pending.run();
        tokio::pin!(fetch);
        let outcome = loop {
            tokio::select! {
                outcome = &mut fetch => break outcome,
                command = self.commands.recv(), if self.commands_open => match command {
                    Some(Command::Disarm) => self.scheduler.disarm(),
                    Some(Command::SurfaceRemoved) => self.scheduler.surface_removed(),
                    Some(Command::Shutdown) => {
                        self.scheduler.disarm();
                        keep_running = false;
                    }
                    Some(other) => self.deferred.push_back(other),
                    None => self.commands_open = false,
                },
                Some(notice) = self.wakes.recv() => {
                    debug!(at = %notice.at, "Dropping wake while a fetch is in flight");
                }
            }
        };

        let result = self.scheduler.finish_cycle(outcome);
        debug!(?result, "Cycle complete");
        keep_running
    }
}
