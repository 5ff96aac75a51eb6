use chrono::{DateTime, NaiveDate, Utc};

/// Wall-clock source for leaderboard dates and persisted timestamps.
#[derive(Debug, Clone, Copy, Default)]
pub enum Clock {
    #[default]
    Default,
    Fixed(DateTime<Utc>),
}

impl Clock {
    /// System time; what the binary runs with.
    #[must_use]
    pub fn default_clock() -> Self {
        Self::Default
    }

    /// Always reports `at`.
    #[must_use]
    pub fn fixed(at: DateTime<Utc>) -> Self {
        Self::Fixed(at)
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::Default => Utc::now(),
            Clock::Fixed(t) => *t,
        }
    }

    /// Calendar day used to stamp leaderboard entries.
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        self.now().date_naive()
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

#[must_use]
pub fn fixed_clock() -> Clock {
    Clock::fixed(fixed_now())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_reports_calendar_day() {
        assert_eq!(fixed_clock().today().to_string(), "2023-11-14");
        let next = Clock::fixed(fixed_now() + chrono::Duration::days(1));
        assert_eq!(next.today().to_string(), "2023-11-15");
    }

    #[test]
    fn default_clock_follows_system_time() {
        let before = Utc::now();
        let now = Clock::default_clock().now();
        assert!(now >= before);
        assert!(matches!(Clock::default(), Clock::Default));
    }
}
