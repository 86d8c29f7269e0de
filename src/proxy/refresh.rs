//! Timed refresh and stale-response protection

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Monotonic request generation counter
///
/// Every reload takes a ticket; a response is applied only if its ticket
/// is still the latest one issued.
#[derive(Debug, Clone, Default)]
pub struct Generation {
    latest: Arc<AtomicU64>,
}

impl Generation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new ticket, invalidating every earlier one
    pub fn begin(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub fn is_current(&self, ticket: u64) -> bool {
        self.latest.load(Ordering::Acquire) == ticket
    }
}

/// Periodic timer that posts a message on every period
///
/// At most one timer runs at a time: starting again stops the previous
/// one first, and dropping the handle stops it too.
pub struct AutoRefresh {
    handle: Option<JoinHandle<()>>,
}

impl AutoRefresh {
    pub fn new() -> Self {
        Self { handle: None }
    }

    /// Post `message` every `interval`; the first post happens one full
    /// period after starting
    pub fn start<T>(&mut self, interval: Duration, tx: UnboundedSender<T>, message: T)
    where
        T: Clone + Send + 'static,
    {
        self.stop();
        log::debug!("Auto-refresh every {:?}", interval);
        self.handle = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if tx.send(message.clone()).is_err() {
                    break;
                }
            }
        }));
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().map_or(false, |h| !h.is_finished())
    }
}

impl Default for AutoRefresh {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for AutoRefresh {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[test]
    fn test_generation_tickets() {
        let generation = Generation::new();
        let first = generation.begin();
        assert!(generation.is_current(first));

        let second = generation.begin();
        assert!(second > first);
        assert!(!generation.is_current(first));
        assert!(generation.is_current(second));

        let shared = generation.clone();
        let third = shared.begin();
        assert!(!generation.is_current(second));
        assert!(generation.is_current(third));
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_refresh_ticks() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timer = AutoRefresh::new();
        timer.start(Duration::from_secs(60), tx, "tick");
        assert!(timer.is_running());

        // nothing before the first full period
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(rx.try_recv().is_err());

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(rx.recv().await, Some("tick"));
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(rx.recv().await, Some("tick"));

        timer.stop();
        assert!(!timer.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_replaces_previous_timer() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timer = AutoRefresh::new();
        timer.start(Duration::from_secs(10), tx.clone(), 1u32);
        timer.start(Duration::from_secs(10), tx, 2u32);

        tokio::time::sleep(Duration::from_secs(35)).await;
        let mut received = Vec::new();
        while let Ok(v) = rx.try_recv() {
            received.push(v);
        }
        assert_eq!(received, vec![2, 2, 2]);
    }
}
