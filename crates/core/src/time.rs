use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

/// Source of "now" for generation timestamps, answer timing, and streaks.
///
/// Services hold a `Clock` instead of calling `Utc::now()` so tests can pin
/// and step time.
#[derive(Debug, Clone, Copy, Default)]
pub enum Clock {
    #[default]
    System,
    Fixed(DateTime<Utc>),
}

impl Clock {
    /// Returns a clock that uses the current system time.
    #[must_use]
    pub fn system() -> Self {
        Self::System
    }

    /// Returns a clock fixed at the given timestamp.
    #[must_use]
    pub fn fixed(at: DateTime<Utc>) -> Self {
        Self::Fixed(at)
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::System => Utc::now(),
            Clock::Fixed(t) => *t,
        }
    }

    /// Current time viewed in `tz`, used for calendar-day logic.
    #[must_use]
    pub fn now_in<Tz: TimeZone>(&self, tz: &Tz) -> DateTime<Tz> {
        self.now().with_timezone(tz)
    }

    /// Today's calendar date in `tz`.
    #[must_use]
    pub fn today_in<Tz: TimeZone>(&self, tz: &Tz) -> NaiveDate {
        self.now_in(tz).date_naive()
    }

    /// If this is a fixed clock, advance it by the given duration.
    ///
    /// Has no effect on `Clock::System`.
    pub fn advance(&mut self, delta: Duration) {
        if let Clock::Fixed(t) = self {
            *t += delta;
        }
    }
}

/// Deterministic timestamp for tests and examples (2023-11-14T22:13:20Z).
pub const FIXED_TEST_TIMESTAMP: i64 = 1_700_000_000;

/// Returns a deterministic `DateTime<Utc>` for tests and doc examples.
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
    use chrono::FixedOffset;

    #[test]
    fn fixed_clock_advances() {
        let mut clock = fixed_clock();
        clock.advance(Duration::seconds(90));
        assert_eq!(clock.now(), fixed_now() + Duration::seconds(90));
    }

    #[test]
    fn today_respects_the_time_zone() {
        // 22:13 UTC is already the next day at UTC+3.
        let clock = fixed_clock();
        let plus_three = FixedOffset::east_opt(3 * 3600).unwrap();
        assert_eq!(
            clock.today_in(&Utc),
            NaiveDate::from_ymd_opt(2023, 11, 14).unwrap()
        );
        assert_eq!(
            clock.today_in(&plus_three),
            NaiveDate::from_ymd_opt(2023, 11, 15).unwrap()
        );
    }
}
