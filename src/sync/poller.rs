//! Live-mode ticker
//!
//! Sends [`Notification::PollTick`] every interval while live mode is on.
//! It never fetches; the dashboard turns a tick into a run-history poll.
//! Turning live mode off only silences future ticks.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::{Notification, NotificationSender};

pub struct LivePoller {
    live: Arc<AtomicBool>,
    stop: CancellationToken,
    task: JoinHandle<()>,
    interval: Duration,
}

impl LivePoller {
    /// Spawn the ticker. Must be called inside a tokio runtime.
    pub fn spawn(interval: Duration, live: bool, tx: NotificationSender) -> Self {
        let interval = interval.max(Duration::from_millis(1));
        let live = Arc::new(AtomicBool::new(live));
        let stop = CancellationToken::new();

        let task = {
            let live = Arc::clone(&live);
            let stop = stop.clone();
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(interval);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                // the first tick completes immediately
                ticker.tick().await;
                loop {
                    tokio::select! {
                        _ = stop.cancelled() => break,
                        _ = ticker.tick() => {
                            if !live.load(Ordering::Relaxed) {
                                continue;
                            }
                            if tx.send(Notification::PollTick).is_err() {
                                break;
                            }
                        }
                    }
                }
                tracing::debug!("Live poller stopped");
            })
        };

        Self {
            live,
            stop,
            task,
            interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::Relaxed)
    }

    pub fn set_live(&self, on: bool) {
        self.live.store(on, Ordering::Relaxed);
        tracing::info!(live = on, "Live mode changed");
    }

    /// Flip live mode, returning the new state
    pub fn toggle(&self) -> bool {
        let on = !self.live.fetch_xor(true, Ordering::Relaxed);
        tracing::info!(live = on, "Live mode changed");
        on
    }

    pub fn stop(&self) {
        self.stop.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for LivePoller {
    fn drop(&mut self) {
        self.stop.cancel();
        self.task.abort();
    }
}
