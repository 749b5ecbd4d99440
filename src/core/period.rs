//! Bimonthly accounting periods.
//!
//! A calendar year is split into six two-month blocks (Jan/Feb, Mar/Apr, ...). The
//! reference rate of a block is pinned to the first calendar day of the block.

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

const BIMONTH_NAMES: [&str; 6] = [
    "January/February",
    "March/April",
    "May/June",
    "July/August",
    "September/October",
    "November/December",
];

/// Date format used whenever a date is shown to a person.
pub const DISPLAY_DATE_FORMAT: &str = "%d/%m/%Y";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BimonthPeriod {
    year: i32,
    index: u32,
    start_date: NaiveDate,
}

impl BimonthPeriod {
    /// Returns the period that contains `date`.
    pub fn containing(date: NaiveDate) -> Self {
        let first_of_month = first_day_of_month(date);
        let start_date = if date.month0() % 2 == 0 {
            first_of_month
        } else {
            first_day_of_month(first_of_month - Days::new(1))
        };

        Self {
            year: date.year(),
            index: date.month0() / 2 + 1,
            start_date,
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// Position of the block within its year, 1 (Jan/Feb) to 6 (Nov/Dec).
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    /// Canonical identity of the period, e.g. `2026-B1`. Used as the cache key.
    pub fn key(&self) -> String {
        format!("{}-B{}", self.year, self.index)
    }

    pub fn display_name(&self) -> &'static str {
        BIMONTH_NAMES[(self.index - 1) as usize]
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        Self::containing(date) == *self
    }
}

impl Display for BimonthPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-B{}", self.year, self.index)
    }
}

fn first_day_of_month(date: NaiveDate) -> NaiveDate {
    date - Days::new(u64::from(date.day0()))
}

/// Read-only presentation of a period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodInfo {
    pub key: String,
    pub display_name: String,
    pub start_date_display: String,
    pub year: i32,
}

/// Computes the bimonth containing `reference_date`.
pub fn current_period(reference_date: NaiveDate) -> BimonthPeriod {
    BimonthPeriod::containing(reference_date)
}

pub fn describe(period: &BimonthPeriod) -> PeriodInfo {
    PeriodInfo {
        key: period.key(),
        display_name: period.display_name().to_string(),
        start_date_display: period.start_date().format(DISPLAY_DATE_FORMAT).to_string(),
        year: period.year(),
    }
}
