use super::Tick;
use std::time::Duration;
use tokio::time::{
    sleep_until,
    Instant,
};
use tokio_util::sync::CancellationToken;
use tracing::{
    debug,
    warn,
};

/// Runs ticks back to back at a fixed interval measured from the start of each tick.
///
/// The gap after a tick that took `d` is `max(0, interval - d)`. Ticks never overlap: an
/// overrunning tick is followed immediately by the next one.
#[derive(Debug, Clone, Copy)]
pub struct Scheduler {
    interval: Duration,
}

impl Scheduler {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Time to wait after a tick that took `elapsed`.
    pub fn next_delay(&self, elapsed: Duration) -> Duration {
        self.interval.saturating_sub(elapsed)
    }

    /// Drives `tick` until `shutdown` is cancelled and returns the number of completed ticks.
    ///
    /// Cancellation is observed between ticks, a running tick is allowed to finish.
    pub async fn run(&self, tick: &dyn Tick, shutdown: CancellationToken) -> u64 {
        let mut completed = 0;
        while !shutdown.is_cancelled() {
            let started = Instant::now();
            tick.run_once().await;
            completed += 1;

            let elapsed = started.elapsed();
            if elapsed > self.interval {
                warn!(elapsed = ?elapsed, interval = ?self.interval, "Tick overran the interval, starting the next one now");
            } else {
                debug!(elapsed = ?elapsed, delay = ?self.next_delay(elapsed), "Waiting for the next tick");
            }

            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = sleep_until(started + self.interval) => {}
            }
        }
        completed
    }
}
