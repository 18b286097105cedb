use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use exam_core::Clock;
use exam_core::model::AttemptId;

/// Tick delivered to the session that owns the timer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickEvent {
    pub attempt_id: AttemptId,
    pub at: DateTime<Utc>,
}

/// Periodic tick source for one attempt.
///
/// Each tick carries a fresh wall-clock reading, so a stalled or throttled
/// runtime produces fewer ticks but never a wrong remaining time. Dropping the
/// ticker cancels it; a ticker must be dropped before a session for a different
/// attempt starts.
#[derive(Debug)]
pub struct Ticker {
    attempt_id: AttemptId,
    handle: JoinHandle<()>,
}

impl Ticker {
    pub const DEFAULT_PERIOD: Duration = Duration::from_secs(1);

    /// Spawn the tick task on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime or with a zero `period`.
    #[must_use]
    pub fn spawn(
        attempt_id: AttemptId,
        clock: Clock,
        period: Duration,
    ) -> (Self, mpsc::Receiver<TickEvent>) {
        let (tx, rx) = mpsc::channel(4);
        let task_attempt = attempt_id.clone();
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                let event = TickEvent {
                    attempt_id: task_attempt.clone(),
                    at: clock.now(),
                };
                if tx.send(event).await.is_err() {
                    break;
                }
            }
        });
        (Self { attempt_id, handle }, rx)
    }

    #[must_use]
    pub fn attempt_id(&self) -> &AttemptId {
        &self.attempt_id
    }

    /// Stop ticking. Equivalent to dropping the ticker.
    pub fn cancel(self) {
        drop(self);
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exam_core::time::fixed_clock;

    #[tokio::test(start_paused = true)]
    async fn ticks_carry_attempt_id() {
        let (ticker, mut rx) =
            Ticker::spawn(AttemptId::new("A1"), fixed_clock(), Ticker::DEFAULT_PERIOD);

        for _ in 0..3 {
            let event = rx.recv().await.expect("tick");
            assert_eq!(event.attempt_id, AttemptId::new("A1"));
        }
        assert_eq!(ticker.attempt_id(), &AttemptId::new("A1"));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_closes_the_channel() {
        let (ticker, mut rx) =
            Ticker::spawn(AttemptId::new("A1"), fixed_clock(), Ticker::DEFAULT_PERIOD);
        rx.recv().await.expect("first tick");

        ticker.cancel();

        let drained = tokio::time::timeout(Duration::from_secs(30), async {
            while rx.recv().await.is_some() {}
        })
        .await;
        assert!(drained.is_ok(), "channel should close after cancel");
    }

    #[tokio::test(start_paused = true)]
    async fn receiver_drop_stops_task() {
        let (ticker, rx) =
            Ticker::spawn(AttemptId::new("A1"), fixed_clock(), Ticker::DEFAULT_PERIOD);
        drop(rx);
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(ticker.is_finished());
    }
}
