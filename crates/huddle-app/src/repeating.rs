//! Cancellable periodic task handle.
//!
//! The runtime owns one [`Repeating`] per timer. Cancelling is dropping the
//! handle; there is no global timer registry.

use std::time::Duration;

use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};

/// Periodic timer whose first tick fires one period after start.
#[derive(Debug)]
pub struct Repeating {
    interval: Interval,
    period: Duration,
}

impl Repeating {
    /// Schedule a repeating tick every `period`.
    pub fn start(period: Duration) -> Self {
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { interval, period }
    }

    /// Tick period.
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Wait for the next tick. Cancellation safe.
    pub async fn tick(&mut self) {
        self.interval.tick().await;
    }
}

/// Wait for the next tick of an optional timer; never resolves when `None`.
pub async fn next_tick(task: &mut Option<Repeating>) {
    match task {
        Some(task) => task.tick().await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn first_tick_waits_one_period() {
        let start = Instant::now();
        let mut task = Repeating::start(Duration::from_millis(2500));

        task.tick().await;
        assert_eq!(start.elapsed(), Duration::from_millis(2500));

        task.tick().await;
        assert_eq!(start.elapsed(), Duration::from_millis(5000));
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_task_never_ticks() {
        let mut task = Some(Repeating::start(Duration::from_secs(1)));
        drop(task.take());

        let fired =
            tokio::time::timeout(Duration::from_secs(10), next_tick(&mut task)).await.is_ok();
        assert!(!fired);
    }
}
