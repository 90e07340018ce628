//! Fixed-interval cycle scheduling.
//!
//! Each tick spawns one cycle. A tick that arrives while the previous cycle
//! is still running is skipped, and missed ticks are not replayed. Cycle
//! errors are logged and the loop carries on; fatal errors and cycles that
//! die without reporting (panics) end the loop.

use std::future::Future;
use std::time::Duration;

use tokio::task::{JoinError, JoinHandle};
use tokio::time::MissedTickBehavior;

use crate::error::{AppError, Result};
use crate::pipeline::{CycleOutcome, Monitor};

type CycleHandle = JoinHandle<Result<CycleOutcome>>;

/// Drives a [`Monitor`] on a fixed interval.
pub struct Scheduler {
    monitor: Monitor,
    interval: Duration,
}

impl Scheduler {
    pub fn new(monitor: Monitor, interval: Duration) -> Self {
        Self { monitor, interval }
    }

    /// Build a scheduler using the monitor's configured interval.
    pub fn from_monitor(monitor: Monitor) -> Self {
        let interval = Duration::from_secs(monitor.settings().config.schedule.interval_secs);
        Self::new(monitor, interval)
    }

    /// Run cycles until `shutdown` resolves. The first cycle starts
    /// immediately. An in-flight cycle is allowed to finish on shutdown.
    pub async fn run<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        log::info!(
            "Checking {} every {}s",
            self.monitor.settings().config.source.url,
            self.interval.as_secs()
        );

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut in_flight: Option<CycleHandle> = None;
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if in_flight.is_some() {
                        log::warn!("Previous cycle still running, skipping this tick");
                        continue;
                    }
                    let monitor = self.monitor.clone();
                    in_flight = Some(tokio::spawn(async move { monitor.run_cycle().await }));
                }
                joined = async {
                    match in_flight.as_mut() {
                        Some(handle) => handle.await,
                        None => std::future::pending().await,
                    }
                }, if in_flight.is_some() => {
                    in_flight = None;
                    Self::handle_finished(joined)?;
                }
                _ = &mut shutdown => {
                    if let Some(handle) = in_flight.take() {
                        log::info!("Shutdown requested, waiting for the running cycle");
                        Self::handle_finished(handle.await)?;
                    }
                    log::info!("Scheduler stopped");
                    return Ok(());
                }
            }
        }
    }

    /// Log a finished cycle; fatal errors and aborted cycles end the loop.
    fn handle_finished(
        joined: std::result::Result<Result<CycleOutcome>, JoinError>,
    ) -> Result<()> {
        match joined {
            Ok(Ok(outcome)) => {
                log::info!("Cycle finished: {}", outcome);
                Ok(())
            }
            Ok(Err(e)) if e.is_fatal() => {
                log::error!("Cycle failed fatally: {}", e);
                Err(e)
            }
            Ok(Err(e)) => {
                log::error!("Cycle failed, will retry next tick: {}", e);
                Ok(())
            }
            Err(join_err) => {
                log::error!("Cycle task aborted: {}", join_err);
                Err(AppError::CycleAborted(join_err.to_string()))
            }
        }
    }
}
