use std::time::Duration;

use chrono::{DateTime, Datelike, TimeZone, Timelike, Weekday};
use serde::{Deserialize, Serialize};

/// When scheduled cycles may run, and how long to sleep between them.
///
/// ```toml
/// [schedule]
/// poll_interval_secs = 1800
/// days = ["Mon", "Tue", "Wed", "Thu", "Fri"]
/// hours = [8, 9, 10, 14, 15, 16]
/// ```
///
/// An empty `days` or `hours` list places no restriction on that axis.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScheduleConfig {
    pub poll_interval_secs: u64,
    pub days: Vec<Weekday>,
    /// Local-time hours, 0–23.
    pub hours: Vec<u32>,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 1800,
            days: Vec::new(),
            hours: Vec::new(),
        }
    }
}

impl ScheduleConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn is_open<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> bool {
        let day_ok = self.days.is_empty() || self.days.contains(&now.weekday());
        let hour_ok = self.hours.is_empty() || self.hours.contains(&now.hour());
        day_ok && hour_ok
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.poll_interval_secs == 0 {
            return Err("poll_interval_secs must be positive".into());
        }
        if let Some(bad) = self.hours.iter().find(|h| **h > 23) {
            return Err(format!("schedule hour out of range: {bad}"));
        }
        Ok(())
    }
}
