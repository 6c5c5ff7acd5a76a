//! Logical date handling: parsing `YYYY-MM-DD` and turning it into the
//! `dt` instant sent to the time machine endpoint.

use chrono::{Local, NaiveDate, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};

use crate::error::TaskError;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Zone in which a logical date's midnight is interpreted.
///
/// `Local` follows whatever timezone the process runs in, so the same date can
/// map to different instants on different hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimestampZone {
    #[default]
    Local,
    Utc,
}

impl TimestampZone {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimestampZone::Local => "local",
            TimestampZone::Utc => "utc",
        }
    }
}

impl std::fmt::Display for TimestampZone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn parse_date(date: &str) -> Result<NaiveDate, TaskError> {
    NaiveDate::parse_from_str(date.trim(), DATE_FORMAT).map_err(|source| TaskError::InvalidDate {
        date: date.to_string(),
        source,
    })
}

/// Render a logical date the way it is handed to a task.
pub fn ds(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Unix timestamp of midnight at the start of `date` in `zone`.
///
/// An ambiguous local midnight resolves to its earliest instant; a skipped one
/// is an error.
pub fn midnight_timestamp(date: NaiveDate, zone: TimestampZone) -> Result<i64, TaskError> {
    let midnight: NaiveDateTime = date.and_time(chrono::NaiveTime::MIN);

    match zone {
        TimestampZone::Utc => Ok(midnight.and_utc().timestamp()),
        TimestampZone::Local => Local
            .from_local_datetime(&midnight)
            .earliest()
            .map(|dt| dt.timestamp())
            .ok_or(TaskError::NonexistentMidnight(date)),
    }
}

/// The most recent logical date whose daily interval has fully elapsed.
pub fn latest_due_date(today: NaiveDate) -> NaiveDate {
    today.pred_opt().unwrap_or(today)
}
