//! Recurrence frequencies and due-date arithmetic.

use super::RecurrenceDomainError;
use chrono::{DateTime, Datelike, NaiveDate, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How often a recurrence definition spawns a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    /// Every 24 hours.
    Daily,
    /// Every 7 days.
    Weekly,
    /// Every calendar month on the anchor day, clamped to short months.
    Monthly,
}

impl Frequency {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }

    /// Returns the due instant one period after `from`.
    ///
    /// Monthly schedules land on `anchor_day`, or on the last day of the
    /// month when it is shorter, and keep the time of day of `from`. A
    /// schedule anchored on the 31st therefore goes Jan 31, Feb 28, Mar 31.
    /// Returns `None` past the representable date range.
    #[must_use]
    pub fn advance(self, from: DateTime<Utc>, anchor_day: u32) -> Option<DateTime<Utc>> {
        match self {
            Self::Daily => from.checked_add_signed(TimeDelta::days(1)),
            Self::Weekly => from.checked_add_signed(TimeDelta::weeks(1)),
            Self::Monthly => {
                let (year, month) = following_month(from.year(), from.month())?;
                let day = anchor_day.clamp(1, days_in_month(year, month)?);
                let date = NaiveDate::from_ymd_opt(year, month, day)?;
                Some(date.and_time(from.time()).and_utc())
            }
        }
    }
}

impl TryFrom<&str> for Frequency {
    type Error = RecurrenceDomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            _ => Err(RecurrenceDomainError::UnknownFrequency(value.to_owned())),
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const fn following_month(year: i32, month: u32) -> Option<(i32, u32)> {
    if month >= 12 {
        match year.checked_add(1) {
            Some(next_year) => Some((next_year, 1)),
            None => None,
        }
    } else {
        Some((year, month + 1))
    }
}

fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let (next_year, next_month) = following_month(year, month)?;
    let next_first = NaiveDate::from_ymd_opt(next_year, next_month, 1)?;
    u32::try_from(next_first.signed_duration_since(first).num_days()).ok()
}
