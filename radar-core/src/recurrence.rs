//! Time-since-last-major-event model
//!
//! Expresses the time elapsed since the last major regional rupture as a
//! fraction of the mean recurrence interval of the fault system.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::TimeIndicator;

/// Mean Gregorian year in days
const DAYS_PER_YEAR: f64 = 365.2425;

/// Recurrence model configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecurrenceModel {
    /// Date of the last major event (Dead Sea, 1927)
    pub last_major: NaiveDate,
    /// Mean recurrence interval in years
    pub mean_recurrence_years: f64,
    /// Upper bound on the normalized reading
    pub cap: f64,
}

impl Default for RecurrenceModel {
    fn default() -> Self {
        Self {
            last_major: NaiveDate::from_ymd_opt(1927, 7, 11).unwrap_or(NaiveDate::MIN),
            mean_recurrence_years: 90.0,
            cap: 95.0,
        }
    }
}

impl RecurrenceModel {
    /// Elapsed time as a fraction of the recurrence interval
    pub fn cycle_fraction(&self, now: DateTime<Utc>) -> f64 {
        if self.mean_recurrence_years <= 0.0 {
            return 0.0;
        }
        let elapsed_days = (now.date_naive() - self.last_major).num_days() as f64;
        (elapsed_days / DAYS_PER_YEAR / self.mean_recurrence_years).max(0.0)
    }

    pub fn indicator(&self, now: DateTime<Utc>) -> TimeIndicator {
        let fraction = self.cycle_fraction(now);
        let normalized = (fraction * 100.0).min(self.cap).max(0.0);

        TimeIndicator {
            normalized,
            last_major_date: self.last_major.format("%d-%m-%Y").to_string(),
            cycle_percent: (fraction * 1000.0).round() / 10.0,
        }
    }
}
