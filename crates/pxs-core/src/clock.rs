//! Source of "today" for the daily reset.

use std::sync::RwLock;

use chrono::{Days, NaiveDate, Utc};

pub trait Clock: Send + Sync {
    /// Current calendar day.
    fn today(&self) -> NaiveDate;
}

/// UTC calendar date, the same day boundary the stored dates use.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }
}

/// Settable clock for tests and replays.
#[derive(Debug)]
pub struct FixedClock {
    today: RwLock<NaiveDate>,
}

impl FixedClock {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today: RwLock::new(today),
        }
    }

    pub fn set(&self, today: NaiveDate) {
        *self.today.write().unwrap_or_else(|e| e.into_inner()) = today;
    }

    pub fn advance_days(&self, days: u64) {
        let mut today = self.today.write().unwrap_or_else(|e| e.into_inner());
        if let Some(next) = today.checked_add_days(Days::new(days)) {
            *today = next;
        }
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        *self.today.read().unwrap_or_else(|e| e.into_inner())
    }
}
