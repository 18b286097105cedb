use chrono::{DateTime, Duration, Utc};

/// Source of wall-clock time for timers and services.
///
/// `Fixed` exists so tests can simulate suspension by jumping the clock forward.
#[derive(Debug, Clone, Copy, Default)]
pub enum Clock {
    #[default]
    System,
    Fixed(DateTime<Utc>),
}

impl Clock {
    #[must_use]
    pub fn system() -> Self {
        Self::System
    }

    #[must_use]
    pub fn fixed(at: DateTime<Utc>) -> Self {
        Self::Fixed(at)
    }

    /// Returns the current time according to the clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::System => Utc::now(),
            Clock::Fixed(t) => *t,
        }
    }

    /// Move a fixed clock forward. Has no effect on `Clock::System`.
    pub fn advance(&mut self, delta: Duration) {
        if let Clock::Fixed(t) = self {
            *t += delta;
        }
    }

    /// Whole seconds elapsed between `since` and now, never negative.
    #[must_use]
    pub fn seconds_since(&self, since: DateTime<Utc>) -> u64 {
        let secs = (self.now() - since).num_seconds();
        u64::try_from(secs).unwrap_or(0)
    }

    #[must_use]
    pub fn is_fixed(&self) -> bool {
        matches!(self, Clock::Fixed(_))
    }
}

/// Deterministic timestamp for tests (2023-11-14T22:13:20Z).
pub const FIXED_TEST_TIMESTAMP: i64 = 1_700_000_000;

/// Returns a deterministic `DateTime<Utc>` for tests.
///
/// # Panics
///
/// Panics if the fixed timestamp cannot be represented.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(FIXED_TEST_TIMESTAMP, 0)
        .expect("fixed timestamp should be valid")
}

/// Returns a `Clock` fixed at the deterministic test timestamp.
#[must_use]
pub fn fixed_clock() -> Clock {
    Clock::fixed(fixed_now())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_advances_and_reports_elapsed() {
        let start = fixed_now();
        let mut clock = Clock::fixed(start);
        clock.advance(Duration::seconds(90));

        assert_eq!(clock.now(), start + Duration::seconds(90));
        assert_eq!(clock.seconds_since(start), 90);
    }

    #[test]
    fn elapsed_is_clamped_when_start_is_in_the_future() {
        let clock = fixed_clock();
        assert_eq!(clock.seconds_since(fixed_now() + Duration::seconds(5)), 0);
    }

    #[test]
    fn system_clock_ignores_advance() {
        let mut clock = Clock::system();
        clock.advance(Duration::days(1));
        assert!(!clock.is_fixed());
    }
}
