//! Wall clock abstraction for rotation and history timestamps

use chrono::{DateTime, Local, NaiveDate, Utc};
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

/// Calendar date format stored in history entries
const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn date_string(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Source of "now"
pub trait Clock: Send + Sync {
    /// Epoch milliseconds
    fn now_ms(&self) -> i64;

    /// Today's calendar date
    fn today(&self) -> NaiveDate;
}

/// Real clock; dates are in the local time zone
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }

    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Settable clock; dates are derived from the timestamp in UTC
#[derive(Debug, Default)]
pub struct ManualClock {
    now_ms: AtomicI64,
}

impl ManualClock {
    pub fn new(now_ms: i64) -> Self {
        Self {
            now_ms: AtomicI64::new(now_ms),
        }
    }

    /// Clock set to midnight UTC of the given date
    pub fn at_date(date: NaiveDate) -> Self {
        let ms = date
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc().timestamp_millis())
            .unwrap_or_default();
        Self::new(ms)
    }

    pub fn set(&self, now_ms: i64) {
        self.now_ms.store(now_ms, Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        self.now_ms
            .fetch_add(by.as_millis() as i64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now_ms.load(Ordering::SeqCst)
    }

    fn today(&self) -> NaiveDate {
        DateTime::<Utc>::from_timestamp_millis(self.now_ms())
            .map(|dt| dt.date_naive())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_crosses_midnight() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 23).unwrap();
        let clock = ManualClock::at_date(date);
        assert_eq!(date_string(clock.today()), "2025-06-23");

        clock.advance(Duration::from_secs(23 * 3600));
        assert_eq!(date_string(clock.today()), "2025-06-23");

        clock.advance(Duration::from_secs(3600));
        assert_eq!(date_string(clock.today()), "2025-06-24");
    }

    #[test]
    fn test_system_clock_is_after_epoch() {
        assert!(SystemClock.now_ms() > 0);
    }
}
