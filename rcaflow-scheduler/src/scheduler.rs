//! Interval-driven scheduler loop.
//!
//! Wraps a [`SchedulerTask`] and invokes it on a fixed cadence until shut
//! down. Shutdown is cooperative: a tick in flight always completes; the
//! loop exits before the next one starts.

use crate::task::SchedulerTask;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

/// Lifecycle state of the scheduler loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Created, not yet started.
    Idle,
    /// Ticking.
    Running,
    /// Shut down; will not tick again.
    Stopped,
}

/// Handle for stopping a running [`Scheduler`].
///
/// Dropping the handle also stops the scheduler after the current tick.
#[derive(Debug)]
pub struct SchedulerHandle {
    tx: watch::Sender<bool>,
}

impl SchedulerHandle {
    /// Request a cooperative shutdown.
    pub fn shutdown(&self) {
        let _ = self.tx.send(true);
    }
}

/// Periodic driver of a [`SchedulerTask`].
#[derive(Debug)]
pub struct Scheduler {
    task: SchedulerTask,
    period: Duration,
    state: SchedulerState,
    shutdown_rx: watch::Receiver<bool>,
}

impl Scheduler {
    /// Wrap a task, ticking every `period`.
    pub fn new(task: SchedulerTask, period: Duration) -> (Self, SchedulerHandle) {
        let (tx, rx) = watch::channel(false);
        (
            Self {
                task,
                period,
                state: SchedulerState::Idle,
                shutdown_rx: rx,
            },
            SchedulerHandle { tx },
        )
    }

    /// Wrap a task, taking the cadence from the host configuration.
    pub fn from_config(
        task: SchedulerTask,
        config: &rcaflow_core::HostConfig,
    ) -> (Self, SchedulerHandle) {
        Self::new(task, Duration::from_millis(config.tick_period_ms))
    }

    /// The loop's lifecycle state.
    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// The wrapped task.
    pub fn task(&self) -> &SchedulerTask {
        &self.task
    }

    /// Mutable access to the wrapped task (between ticks only).
    pub fn task_mut(&mut self) -> &mut SchedulerTask {
        &mut self.task
    }

    /// Run until shut down. The first tick fires immediately, subsequent
    /// ones every period; a period that overruns is not compensated for.
    pub async fn start(&mut self) {
        tracing::info!(period_ms = self.period.as_millis() as u64, "scheduler started");
        self.state = SchedulerState::Running;

        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => self.task.run().await,
                changed = self.shutdown_rx.changed() => {
                    if changed.is_err() || *self.shutdown_rx.borrow() {
                        break;
                    }
                }
            }
        }

        self.state = SchedulerState::Stopped;
        tracing::info!("scheduler stopped");
    }
}
