//! Time buckets for the order-volume trend.

use core::str::FromStr;

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Bucket width.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    #[default]
    Day,
    /// Monday to Sunday.
    Week,
    Month,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown period {0:?} (expected D, W, M, day, week or month)")]
pub struct PeriodParseError(pub String);

impl Period {
    /// First day of the bucket containing `date`.
    pub fn bucket_start(self, date: NaiveDate) -> NaiveDate {
        match self {
            Period::Day => date,
            Period::Week => {
                let offset = u64::from(date.weekday().num_days_from_monday());
                date.checked_sub_days(Days::new(offset)).unwrap_or(date)
            }
            Period::Month => date.with_day(1).unwrap_or(date),
        }
    }

    /// Start of the bucket following the one that starts at `start`.
    ///
    /// `None` past the end of the calendar.
    pub fn next_bucket(self, start: NaiveDate) -> Option<NaiveDate> {
        match self {
            Period::Day => start.checked_add_days(Days::new(1)),
            Period::Week => start.checked_add_days(Days::new(7)),
            Period::Month => start.checked_add_months(Months::new(1)),
        }
    }

    /// Plural noun used in chart titles.
    pub fn plural(self) -> &'static str {
        match self {
            Period::Day => "days",
            Period::Week => "weeks",
            Period::Month => "months",
        }
    }
}

impl FromStr for Period {
    type Err = PeriodParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "D" | "d" => Ok(Period::Day),
            "W" | "w" => Ok(Period::Week),
            "M" | "m" => Ok(Period::Month),
            other => match other.to_ascii_lowercase().as_str() {
                "day" => Ok(Period::Day),
                "week" => Ok(Period::Week),
                "month" => Ok(Period::Month),
                _ => Err(PeriodParseError(s.to_string())),
            },
        }
    }
}

impl core::fmt::Display for Period {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Period::Day => "day",
            Period::Week => "week",
            Period::Month => "month",
        })
    }
}
