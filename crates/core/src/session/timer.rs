use chrono::{DateTime, Utc};
use std::fmt;

/// Seconds below which the timer is shown as running low.
const LOW_REMAINING_SECS: u32 = 300;

/// Fraction of the original limit (as 1/n) below which the timer is critical.
const CRITICAL_FRACTION_DIVISOR: u64 = 5;

/// Invoked once when the timer reaches zero.
pub type ExpireCallback = Box<dyn FnOnce() + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Running,
    Expired,
}

/// Presentation hint for the remaining time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerUrgency {
    Normal,
    Low,
    Critical,
}

/// Result of feeding one tick into the timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Running { remaining_secs: u32 },
    /// The timer crossed zero on this tick. Reported exactly once.
    Expired,
    /// The timer had already expired; the tick was ignored.
    Stopped,
}

/// Countdown for a timed attempt.
///
/// Remaining time is always `limit - (now - started_at)`, recomputed from the
/// wall clock on every call. There is no pause: time spent with the tab hidden
/// or the process suspended still counts against the limit.
pub struct ExamTimer {
    time_limit_secs: u32,
    started_at: DateTime<Utc>,
    state: TimerState,
    on_expire: Option<ExpireCallback>,
}

impl ExamTimer {
    #[must_use]
    pub fn new(time_limit_secs: u32, started_at: DateTime<Utc>) -> Self {
        Self {
            time_limit_secs,
            started_at,
            state: TimerState::Running,
            on_expire: None,
        }
    }

    #[must_use]
    pub fn with_on_expire(mut self, on_expire: impl FnOnce() + Send + 'static) -> Self {
        self.on_expire = Some(Box::new(on_expire));
        self
    }

    #[must_use]
    pub fn time_limit_secs(&self) -> u32 {
        self.time_limit_secs
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn state(&self) -> TimerState {
        self.state
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.state == TimerState::Expired
    }

    /// Seconds since `started_at`, clamped to zero for clocks behind the start.
    #[must_use]
    pub fn elapsed_seconds(&self, now: DateTime<Utc>) -> u64 {
        u64::try_from((now - self.started_at).num_seconds()).unwrap_or(0)
    }

    #[must_use]
    pub fn remaining_seconds(&self, now: DateTime<Utc>) -> u32 {
        if self.is_expired() {
            return 0;
        }
        let remaining = u64::from(self.time_limit_secs).saturating_sub(self.elapsed_seconds(now));
        u32::try_from(remaining).unwrap_or(0)
    }

    /// Recompute remaining time at `now`, expiring the timer when it reaches zero.
    pub fn tick(&mut self, now: DateTime<Utc>) -> TickOutcome {
        if self.is_expired() {
            return TickOutcome::Stopped;
        }
        let remaining_secs = self.remaining_seconds(now);
        if remaining_secs > 0 {
            return TickOutcome::Running { remaining_secs };
        }

        self.state = TimerState::Expired;
        if let Some(on_expire) = self.on_expire.take() {
            on_expire();
        }
        TickOutcome::Expired
    }

    /// Critical below 20% of the limit, low below five minutes.
    #[must_use]
    pub fn urgency(&self, now: DateTime<Utc>) -> TimerUrgency {
        let remaining = self.remaining_seconds(now);
        if u64::from(remaining) * CRITICAL_FRACTION_DIVISOR < u64::from(self.time_limit_secs) {
            TimerUrgency::Critical
        } else if remaining < LOW_REMAINING_SECS {
            TimerUrgency::Low
        } else {
            TimerUrgency::Normal
        }
    }
}

impl fmt::Debug for ExamTimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExamTimer")
            .field("time_limit_secs", &self.time_limit_secs)
            .field("started_at", &self.started_at)
            .field("state", &self.state)
            .field("has_on_expire", &self.on_expire.is_some())
            .finish()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
