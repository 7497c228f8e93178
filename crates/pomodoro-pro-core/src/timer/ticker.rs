//! The one-second tick source.
//!
//! At most one interval exists at a time. It is armed when the timer enters
//! `Running`, re-armed when a new run begins, and dropped as soon as the
//! timer leaves `Running` for any reason.

use std::time::Duration;

use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

use super::SessionTimer;

const PERIOD: Duration = Duration::from_secs(1);

#[derive(Debug, Default)]
pub struct Ticker {
    interval: Option<Interval>,
    run_id: Option<u64>,
}

impl Ticker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm, re-arm or disarm to match the timer.
    pub fn sync(&mut self, timer: &SessionTimer) {
        if !timer.is_running() {
            self.interval = None;
            self.run_id = None;
            return;
        }
        if self.interval.is_none() || self.run_id != Some(timer.run_id()) {
            let mut interval = interval_at(Instant::now() + PERIOD, PERIOD);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            self.interval = Some(interval);
            self.run_id = Some(timer.run_id());
        }
    }

    pub fn is_armed(&self) -> bool {
        self.interval.is_some()
    }

    /// Wait for the next second. Never completes while disarmed.
    pub async fn tick(&mut self) {
        match self.interval.as_mut() {
            Some(interval) => {
                interval.tick().await;
            }
            None => std::future::pending::<()>().await,
        }
    }
}
