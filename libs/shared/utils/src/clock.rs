use std::sync::RwLock;

use chrono::{Duration, Local, NaiveDate, NaiveDateTime, NaiveTime};

/// Source of "now" for slot generation and lifecycle timestamps.
///
/// Slots are stored as clinic-local date and time-of-day, so the clock hands out
/// naive local datetimes rather than UTC instants.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;

    fn today(&self) -> NaiveDate {
        self.now().date()
    }

    fn time_of_day(&self) -> NaiveTime {
        self.now().time()
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Clock pinned to a given instant; can be moved forward explicitly.
#[derive(Debug)]
pub struct FixedClock {
    now: RwLock<NaiveDateTime>,
}

impl FixedClock {
    pub fn new(now: NaiveDateTime) -> Self {
        Self { now: RwLock::new(now) }
    }

    pub fn at(date: NaiveDate, time: NaiveTime) -> Self {
        Self::new(date.and_time(time))
    }

    pub fn set(&self, now: NaiveDateTime) {
        match self.now.write() {
            Ok(mut guard) => *guard = now,
            Err(poisoned) => *poisoned.into_inner() = now,
        }
    }

    pub fn advance(&self, by: Duration) {
        let next = self.now() + by;
        self.set(next);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        match self.now.read() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_advances() {
        let start = NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        let clock = FixedClock::new(start);

        clock.advance(Duration::days(1));

        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2026, 10, 20).unwrap());
        assert_eq!(clock.time_of_day(), NaiveTime::from_hms_opt(8, 0, 0).unwrap());
    }
}
