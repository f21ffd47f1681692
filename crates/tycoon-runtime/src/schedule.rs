//! Wall-clock source and the timers a session polls.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct FixedClock {
    millis: AtomicI64,
}

impl FixedClock {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self {
            millis: AtomicI64::new(at.timestamp_millis()),
        }
    }

    pub fn set(&self, at: DateTime<Utc>) {
        self.millis.store(at.timestamp_millis(), Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        let ms = i64::try_from(by.as_millis()).unwrap_or(i64::MAX);
        self.millis.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.millis.load(Ordering::SeqCst))
            .single()
            .unwrap_or_default()
    }
}

/// Interval timers for autosave and special-event checks, plus the
/// once-per-calendar-day seasonal trigger.
#[derive(Clone, Debug)]
pub struct Schedule {
    autosave: Duration,
    event_check: Duration,
    last_autosave: DateTime<Utc>,
    last_event_check: DateTime<Utc>,
    last_seasonal: Option<NaiveDate>,
}

fn elapsed(since: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    (now - since).to_std().unwrap_or(Duration::ZERO)
}

impl Schedule {
    pub fn new(autosave: Duration, event_check: Duration, now: DateTime<Utc>) -> Self {
        Self {
            autosave,
            event_check,
            last_autosave: now,
            last_event_check: now,
            last_seasonal: None,
        }
    }

    /// True at most once per autosave interval.
    pub fn autosave_due(&mut self, now: DateTime<Utc>) -> bool {
        if elapsed(self.last_autosave, now) < self.autosave {
            return false;
        }
        self.last_autosave = now;
        true
    }

    pub fn event_check_due(&mut self, now: DateTime<Utc>) -> bool {
        if elapsed(self.last_event_check, now) < self.event_check {
            return false;
        }
        self.last_event_check = now;
        true
    }

    /// True on the first poll of each calendar day.
    pub fn seasonal_due(&mut self, now: DateTime<Utc>) -> bool {
        let today = now.date_naive();
        if self.last_seasonal == Some(today) {
            return false;
        }
        self.last_seasonal = Some(today);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, h, m, 0).unwrap()
    }

    #[test]
    fn intervals_fire_once_per_period() {
        let mut s = Schedule::new(Duration::from_secs(300), Duration::from_secs(60), at(10, 0));
        assert!(!s.autosave_due(at(10, 4)));
        assert!(s.event_check_due(at(10, 1)));
        assert!(!s.event_check_due(at(10, 1)));
        assert!(s.autosave_due(at(10, 5)));
        assert!(!s.autosave_due(at(10, 9)));
        assert!(s.autosave_due(at(10, 10)));
    }

    #[test]
    fn seasonal_fires_once_per_day() {
        let mut s = Schedule::new(Duration::from_secs(1), Duration::from_secs(1), at(0, 0));
        assert!(s.seasonal_due(at(8, 0)));
        assert!(!s.seasonal_due(at(23, 59)));
        assert!(s.seasonal_due(at(8, 0) + chrono::Duration::hours(24)));
    }

    #[test]
    fn clock_going_backwards_is_not_due() {
        let mut s = Schedule::new(Duration::from_secs(60), Duration::from_secs(60), at(10, 0));
        assert!(!s.autosave_due(at(9, 0)));
    }

    #[test]
    fn fixed_clock_advances() {
        let clock = FixedClock::new(at(10, 0));
        clock.advance(Duration::from_secs(90));
        assert_eq!(clock.now(), at(10, 1) + chrono::Duration::seconds(30));
        clock.set(at(12, 0));
        assert_eq!(clock.now(), at(12, 0));
    }
}
