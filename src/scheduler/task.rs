/*!
 * Scheduler Task
 *
 * Background timer driving [`Scheduler::tick`] at the configured interval.
 * Control messages pause, resume, retune or stop the loop; a tick that
 * collides with an in-flight decision is dropped by the handle, never queued.
 */

use super::{Scheduler, TickOutcome};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval, Interval, MissedTickBehavior};
use tracing::{info, trace, warn};

/// Control messages for the scheduler task
#[derive(Debug, Clone)]
pub enum SchedulerCommand {
    /// Change the tick interval
    UpdateInterval(Duration),
    /// Pause automatic scheduling
    Pause,
    /// Resume automatic scheduling
    Resume,
    /// Run one tick now
    Trigger,
    /// Stop the loop
    Shutdown,
}

/// Handle to the scheduler background task
pub struct SchedulerTask {
    command_tx: mpsc::UnboundedSender<SchedulerCommand>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl SchedulerTask {
    /// Spawn the timer loop on the current tokio runtime
    pub fn spawn(scheduler: Scheduler, tick_interval: Duration) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(run_scheduler_loop(scheduler, tick_interval, command_rx));
        info!(interval_ms = tick_interval.as_millis() as u64, "Scheduler task spawned");

        Self {
            command_tx,
            handle: Some(handle),
        }
    }

    pub fn update_interval(&self, tick_interval: Duration) {
        let _ = self
            .command_tx
            .send(SchedulerCommand::UpdateInterval(tick_interval));
    }

    /// Pause automatic scheduling (lifecycle calls still reschedule)
    pub fn pause(&self) {
        let _ = self.command_tx.send(SchedulerCommand::Pause);
    }

    pub fn resume(&self) {
        let _ = self.command_tx.send(SchedulerCommand::Resume);
    }

    /// Trigger an immediate tick
    pub fn trigger(&self) {
        let _ = self.command_tx.send(SchedulerCommand::Trigger);
    }

    /// Stop the loop and wait for it to finish
    pub async fn shutdown(mut self) {
        let _ = self.command_tx.send(SchedulerCommand::Shutdown);

        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                warn!(error = %e, "Scheduler task shutdown error");
            } else {
                info!("Scheduler task shutdown complete");
            }
        }
    }
}

fn ticker(period: Duration) -> Interval {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker
}

fn run_tick(scheduler: &Scheduler) {
    match scheduler.tick() {
        Ok(TickOutcome::Dispatched(pid)) => trace!(pid, "Scheduler tick"),
        Ok(TickOutcome::Dropped) => trace!("Scheduler tick dropped"),
        Err(e) => warn!(error = %e, "Scheduler tick failed"),
    }
}

async fn run_scheduler_loop(
    scheduler: Scheduler,
    tick_interval: Duration,
    mut command_rx: mpsc::UnboundedReceiver<SchedulerCommand>,
) {
    let mut active = true;
    let mut timer = ticker(tick_interval);

    loop {
        tokio::select! {
            _ = timer.tick() => {
                if active {
                    run_tick(&scheduler);
                }
            }

            command = command_rx.recv() => {
                match command {
                    Some(SchedulerCommand::UpdateInterval(period)) => {
                        info!(interval_ms = period.as_millis() as u64, "Scheduler interval updated");
                        timer = ticker(period);
                    }
                    Some(SchedulerCommand::Pause) => {
                        info!("Scheduler task paused");
                        active = false;
                    }
                    Some(SchedulerCommand::Resume) => {
                        info!("Scheduler task resumed");
                        active = true;
                    }
                    Some(SchedulerCommand::Trigger) => run_tick(&scheduler),
                    Some(SchedulerCommand::Shutdown) | None => {
                        info!("Scheduler task shutting down");
                        break;
                    }
                }
            }
        }
    }
}

impl Drop for SchedulerTask {
    fn drop(&mut self) {
        if self.handle.is_some() {
            let _ = self.command_tx.send(SchedulerCommand::Shutdown);
        }
    }
}
