//! # Wait-Time Estimator
//!
//! A coarse "prediction": peak hours get a long wait, everything else a short
//! one. Peak hours are 08:00-10:59 and 17:00-20:59 local time.

use chrono::Timelike;
use serde::{Deserialize, Serialize};

/// The label attached to every station in a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WaitTime {
    #[serde(rename = "5 mins")]
    Short,
    #[serde(rename = "25 mins")]
    Peak,
}

impl WaitTime {
    pub fn as_str(self) -> &'static str {
        match self {
            WaitTime::Short => "5 mins",
            WaitTime::Peak => "25 mins",
        }
    }
}

impl std::fmt::Display for WaitTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps an hour of the day (0-23) to its wait label. Both ranges are inclusive.
pub fn wait_time_for_hour(hour: u32) -> WaitTime {
    match hour {
        8..=10 | 17..=20 => WaitTime::Peak,
        _ => WaitTime::Short,
    }
}

/// Wait label for the current local wall-clock hour.
pub fn current_wait_time() -> WaitTime {
    wait_time_for_hour(LocalClock.current_hour())
}

/// Where the estimator gets "now" from.
pub trait HourSource: Send + Sync {
    fn current_hour(&self) -> u32;

    fn wait_time(&self) -> WaitTime {
        wait_time_for_hour(self.current_hour())
    }
}

/// Local wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalClock;

impl HourSource for LocalClock {
    fn current_hour(&self) -> u32 {
        chrono::Local::now().hour()
    }
}

/// Always reports the same hour.
#[derive(Debug, Clone, Copy)]
pub struct FixedHour(pub u32);

impl HourSource for FixedHour {
    fn current_hour(&self) -> u32 {
        self.0
    }
}
