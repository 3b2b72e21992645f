//! The three periodic timers and delayed follow-ups.
//!
//! Each timer is a small task that sends a [`Tick`] into the bridge loop;
//! the loop itself does the work, so no timer ever touches the registry.
//! All tasks are owned here and cancelled together by
//! [`shutdown`](Supervisor::shutdown).

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use warema_bridge_domain::id::SerialNumber;

/// Work the bridge loop should do now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tick {
    /// Evaluate availability.
    AvailabilityCheck,
    /// Probe offline devices.
    WakeUp,
    /// Periodic reconciliation.
    Rescan,
    /// Follow up on a wake-up round with position requests.
    PositionProbe(Vec<SerialNumber>),
}

/// Periods of the three timers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    pub availability_check: Duration,
    pub wake_up: Duration,
    pub rescan: Duration,
}

/// Owns every timer task of the bridge.
pub struct Supervisor {
    tx: Option<mpsc::UnboundedSender<Tick>>,
    timers: Vec<JoinHandle<()>>,
    follow_ups: Vec<JoinHandle<()>>,
}

impl Supervisor {
    /// Create an idle supervisor and the receiver its ticks arrive on.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Tick>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let supervisor = Self {
            tx: Some(tx),
            timers: Vec::new(),
            follow_ups: Vec::new(),
        };
        (supervisor, rx)
    }

    /// Whether the periodic timers are running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.timers.is_empty()
    }

    /// Start the three timers. The first tick of each fires one full period
    /// after this call.
    ///
    /// Restarts them when already running (the stick re-initialised).
    pub fn start(&mut self, schedule: Schedule) {
        let Some(tx) = self.tx.clone() else {
            tracing::warn!("supervisor already shut down, not starting timers");
            return;
        };

        if self.is_running() {
            tracing::info!("restarting timers");
            abort_all(&mut self.timers);
        }

        self.timers = vec![
            spawn_timer(tx.clone(), schedule.availability_check, Tick::AvailabilityCheck),
            spawn_timer(tx.clone(), schedule.wake_up, Tick::WakeUp),
            spawn_timer(tx, schedule.rescan, Tick::Rescan),
        ];

        tracing::info!(
            availability_check_ms = schedule.availability_check.as_millis(),
            wake_up_ms = schedule.wake_up.as_millis(),
            rescan_ms = schedule.rescan.as_millis(),
            "timers started"
        );
    }

    /// Deliver [`Tick::PositionProbe`] for `probed` after `delay`.
    pub fn schedule_position_probe(&mut self, probed: Vec<SerialNumber>, delay: Duration) {
        if probed.is_empty() {
            return;
        }
        let Some(tx) = self.tx.clone() else {
            return;
        };

        self.follow_ups.retain(|handle| !handle.is_finished());
        self.follow_ups.push(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(Tick::PositionProbe(probed));
        }));
    }

    /// Cancel every timer and pending follow-up.
    ///
    /// Once every task has been dropped the tick receiver reports the channel
    /// closed.
    pub fn shutdown(&mut self) {
        abort_all(&mut self.timers);
        abort_all(&mut self.follow_ups);
        if self.tx.take().is_some() {
            tracing::debug!("timers cancelled");
        }
    }
}

impl Drop for Supervisor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn abort_all(handles: &mut Vec<JoinHandle<()>>) {
    for handle in handles.drain(..) {
        handle.abort();
    }
}

fn spawn_timer(tx: mpsc::UnboundedSender<Tick>, period: Duration, tick: Tick) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            if tx.send(tick.clone()).is_err() {
                break;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule() -> Schedule {
        Schedule {
            availability_check: Duration::from_millis(50),
            wake_up: Duration::from_millis(80),
            rescan: Duration::from_millis(200),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn should_tick_each_timer_at_its_own_period() {
        let (mut supervisor, mut rx) = Supervisor::new();
        let started = Instant::now();
        supervisor.start(schedule());

        let mut ticks = Vec::new();
        while ticks.len() < 6 {
            let tick = rx.recv().await.unwrap();
            ticks.push((tick, started.elapsed().as_millis()));
        }

        assert_eq!(
            ticks,
            vec![
                (Tick::AvailabilityCheck, 50),
                (Tick::WakeUp, 80),
                (Tick::AvailabilityCheck, 100),
                (Tick::AvailabilityCheck, 150),
                (Tick::WakeUp, 160),
                (Tick::Rescan, 200),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn should_not_tick_before_start() {
        let (_supervisor, mut rx) = Supervisor::new();
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn should_close_channel_after_shutdown() {
        let (mut supervisor, mut rx) = Supervisor::new();
        supervisor.start(schedule());
        assert!(supervisor.is_running());

        supervisor.shutdown();

        assert!(!supervisor.is_running());
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn should_deliver_position_probe_after_delay() {
        let (mut supervisor, mut rx) = Supervisor::new();
        let started = Instant::now();
        let probed = vec![SerialNumber::new("123").unwrap()];

        supervisor.schedule_position_probe(probed.clone(), Duration::from_secs(1));

        assert_eq!(rx.recv().await, Some(Tick::PositionProbe(probed)));
        assert_eq!(started.elapsed(), Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn should_cancel_pending_position_probe_on_shutdown() {
        let (mut supervisor, mut rx) = Supervisor::new();
        supervisor.schedule_position_probe(
            vec![SerialNumber::new("123").unwrap()],
            Duration::from_secs(1),
        );

        supervisor.shutdown();

        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn should_restart_timers_without_duplicating_them() {
        let (mut supervisor, mut rx) = Supervisor::new();
        let started = Instant::now();
        supervisor.start(schedule());
        supervisor.start(schedule());

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();

        assert_eq!(first, Tick::AvailabilityCheck);
        assert_eq!(second, Tick::WakeUp);
        assert_eq!(started.elapsed(), Duration::from_millis(80));
    }
}
