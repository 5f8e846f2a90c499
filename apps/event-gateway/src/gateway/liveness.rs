//! Periodic sweep that probes every connection and reaps the dead ones.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, Utf8Bytes};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::directory::ConnectionDirectory;
use super::events::EventPayload;

/// Outcome of one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Users visited.
    pub users: usize,
    /// Probes queued.
    pub probed: usize,
    /// Connections found dead and removed.
    pub reaped: usize,
    /// Users dropped because their last connection was reaped.
    pub users_removed: usize,
}

/// Owns the recurring sweep task. Overlapping sweeps are harmless: every
/// step is idempotent and they converge on the same live set.
pub struct LivenessSupervisor {
    directory: Arc<ConnectionDirectory>,
    interval: Duration,
    shutdown: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl LivenessSupervisor {
    pub fn new(directory: Arc<ConnectionDirectory>, interval: Duration) -> Self {
        Self {
            directory,
            interval,
            shutdown: CancellationToken::new(),
            task: Mutex::new(None),
        }
    }

    /// Spawn the recurring sweep. The first sweep runs immediately. Calling
    /// `start` on a running or stopped supervisor does nothing.
    pub fn start(&self) {
        let mut task = self.task.lock();
        if task.is_some() {
            return;
        }
        if self.shutdown.is_cancelled() {
            tracing::warn!("liveness supervisor already stopped; not restarting");
            return;
        }

        let directory = self.directory.clone();
        let shutdown = self.shutdown.clone();
        let period = self.interval;
        *task = Some(tokio::spawn(async move {
            let mut ticker = time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = ticker.tick() => {
                        sweep(&directory);
                    }
                }
            }
            tracing::debug!("liveness supervisor stopped");
        }));
        tracing::info!(interval_secs = period.as_secs(), "liveness supervisor started");
    }

    /// Stop the recurring sweep. A stopped supervisor cannot be restarted.
    pub fn stop(&self) {
        self.shutdown.cancel();
        self.task.lock().take();
    }

    pub fn is_running(&self) -> bool {
        !self.shutdown.is_cancelled() && self.task.lock().is_some()
    }

    /// Run one sweep now.
    pub fn sweep(&self) -> SweepReport {
        sweep(&self.directory)
    }
}

impl Drop for LivenessSupervisor {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Probe every open connection, settle and prune every closed one.
///
/// Probes are queued without waiting. A full queue skips the probe and
/// leaves the handle alone; a closed queue marks it failed, so the next
/// sweep reaps it.
pub fn sweep(directory: &ConnectionDirectory) -> SweepReport {
    let probe: Utf8Bytes = match serde_json::to_string(&EventPayload::probe()) {
        Ok(json) => json.into(),
        Err(err) => {
            tracing::error!(error = %err, "failed to serialize liveness probe");
            return SweepReport::default();
        }
    };

    let mut report = SweepReport::default();
    for user_id in directory.users() {
        report.users += 1;

        let mut dead = Vec::new();
        for handle in directory.lookup(&user_id) {
            if !handle.is_open() {
                handle.complete();
                dead.push(handle.id().to_string());
                continue;
            }
            match handle.try_send(Message::Text(probe.clone())) {
                Ok(()) => report.probed += 1,
                Err(err) => tracing::debug!(
                    %user_id,
                    connection_id = %handle.id(),
                    error = %err,
                    "liveness probe not queued"
                ),
            }
        }

        if !dead.is_empty() {
            let removed = directory.prune(&user_id, &dead);
            report.reaped += removed;
            if removed > 0 && !directory.contains(&user_id) {
                report.users_removed += 1;
            }
        }
    }

    if report.reaped > 0 {
        tracing::info!(
            reaped = report.reaped,
            users_removed = report.users_removed,
            "removed dead connections"
        );
    } else {
        tracing::debug!(users = report.users, probed = report.probed, "liveness sweep clean");
    }
    report
}
