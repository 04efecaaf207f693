//! Scoped one-second timer for the call duration.

use crate::event::CallEvent;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Duration, Instant};
use tracing::debug;

/// Periodic tick source bound to one call attempt.
///
/// The first tick fires one period after [`start`](Self::start). The task is
/// aborted when the ticker is dropped, so replacing or clearing the owning
/// `Option` is enough to stop it.
#[derive(Debug)]
pub struct DurationTicker {
    attempt: u64,
    task: JoinHandle<()>,
}

impl DurationTicker {
    pub fn start(attempt: u64, period: Duration, events: mpsc::UnboundedSender<CallEvent>) -> Self {
        debug!(attempt, period_ms = period.as_millis() as u64, "starting duration ticker");
        let task = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            loop {
                interval.tick().await;
                if events.send(CallEvent::Tick { attempt }).is_err() {
                    break;
                }
            }
        });
        Self { attempt, task }
    }

    pub fn attempt(&self) -> u64 {
        self.attempt
    }
}

impl Drop for DurationTicker {
    fn drop(&mut self) {
        debug!(attempt = self.attempt, "stopping duration ticker");
        self.task.abort();
    }
}
