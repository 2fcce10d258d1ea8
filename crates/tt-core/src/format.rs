//! Date/time formats and the timestamp helpers shared by the sheet and the report.
//!
//! All format strings use `strftime` syntax (see [`chrono::format::strftime`]).
//! Timestamps are naive local wall-clock values: no timezone is stored, and
//! parsing always yields local time.

use std::fmt::Write as _;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use thiserror::Error;

/// A point in local wall-clock time.
pub type Timestamp = NaiveDateTime;

/// Default format of the date keys in the data file.
pub const DEFAULT_KEY_DATE_FORMAT: &str = "%Y-%m-%d";
/// Default format of dates in the report.
pub const DEFAULT_DATE_FORMAT: &str = "%d.%m.%Y";
/// Default format of times everywhere.
pub const DEFAULT_TIME_FORMAT: &str = "%H:%M";

/// A format string that `chrono` cannot use.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid {field} format: {format:?}")]
pub struct FormatError {
    pub field: &'static str,
    pub format: String,
}

/// The validated set of formats used to read, write and display timestamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Formats {
    key_date: String,
    date: String,
    time: String,
}

impl Default for Formats {
    fn default() -> Self {
        Self {
            key_date: DEFAULT_KEY_DATE_FORMAT.to_string(),
            date: DEFAULT_DATE_FORMAT.to_string(),
            time: DEFAULT_TIME_FORMAT.to_string(),
        }
    }
}

impl Formats {
    /// Creates a set of formats after checking that each one is usable.
    pub fn new(
        key_date: impl Into<String>,
        date: impl Into<String>,
        time: impl Into<String>,
    ) -> Result<Self, FormatError> {
        let formats = Self {
            key_date: validate("key date", key_date.into())?,
            date: validate("date", date.into())?,
            time: validate("time", time.into())?,
        };
        formats.check_round_trip()?;
        Ok(formats)
    }

    /// Rejects file formats whose output cannot be parsed back, such as a key
    /// date without a year or a time without minutes.
    fn check_round_trip(&self) -> Result<(), FormatError> {
        let sample = NaiveDate::from_ymd_opt(2018, 9, 1)
            .and_then(|d| d.and_hms_opt(10, 42, 0))
            .unwrap_or_default();

        if self.parse_time(&self.format_time(&sample), sample.date()).is_err() {
            return Err(FormatError {
                field: "time",
                format: self.time.clone(),
            });
        }
        match self.normalize(sample) {
            Ok(ts) if ts.date() == sample.date() => Ok(()),
            _ => Err(FormatError {
                field: "key date",
                format: self.key_date.clone(),
            }),
        }
    }

    /// The time format, for messages about rejected input.
    pub fn time(&self) -> &str {
        &self.time
    }

    /// Formats the data file key for the timestamp's date.
    pub fn format_key(&self, ts: &Timestamp) -> String {
        ts.format(&self.key_date).to_string()
    }

    /// Formats a date for the report.
    pub fn format_date(&self, date: &NaiveDate) -> String {
        date.and_time(NaiveTime::MIN).format(&self.date).to_string()
    }

    /// Formats the time-of-day part of a timestamp.
    pub fn format_time(&self, ts: &Timestamp) -> String {
        ts.format(&self.time).to_string()
    }

    /// Parses one data file entry: a date key plus one of its time values.
    pub fn parse_entry(&self, date: &str, time: &str) -> Result<Timestamp, chrono::ParseError> {
        NaiveDateTime::parse_from_str(
            &format!("{date} {time}"),
            &format!("{} {}", self.key_date, self.time),
        )
    }

    /// Parses a time-of-day given on the command line and places it on `on`.
    pub fn parse_time(&self, value: &str, on: NaiveDate) -> Result<Timestamp, chrono::ParseError> {
        NaiveTime::parse_from_str(value, &self.time).map(|time| on.and_time(time))
    }

    /// Drops whatever precision the data file formats cannot hold.
    ///
    /// A normalized timestamp survives a save/load cycle unchanged.
    pub fn normalize(&self, ts: Timestamp) -> Result<Timestamp, chrono::ParseError> {
        self.parse_entry(&self.format_key(&ts), &self.format_time(&ts))
    }
}

/// Accepts a format only if it renders a plain local timestamp.
///
/// Unknown specifiers and offset specifiers such as `%z` fail here instead of
/// failing later while a report or the data file is being written.
fn validate(field: &'static str, format: String) -> Result<String, FormatError> {
    let mut sample = String::new();
    let broken = format.trim().is_empty()
        || write!(sample, "{}", NaiveDateTime::default().format(&format)).is_err();
    if broken {
        return Err(FormatError { field, format });
    }
    Ok(format)
}

/// Snaps a timestamp to the nearest multiple of `granularity`.
///
/// Multiples are counted from the Unix epoch of the wall clock, and a
/// timestamp exactly halfway between two multiples rounds up. A granularity
/// below one second leaves the timestamp untouched.
pub fn round(ts: Timestamp, granularity: Duration) -> Timestamp {
    let span = granularity.num_seconds();
    if span <= 0 {
        return ts;
    }

    let utc = ts.and_utc();
    let into_span = Duration::seconds(utc.timestamp().rem_euclid(span))
        + Duration::nanoseconds(i64::from(utc.timestamp_subsec_nanos()));
    if into_span.is_zero() {
        return ts;
    }

    let below = ts - into_span;
    let step = Duration::seconds(span);
    if into_span * 2 >= step {
        below + step
    } else {
        below
    }
}

/// Converts a duration to fractional hours.
#[allow(clippy::cast_precision_loss)]
pub fn hours(duration: Duration) -> f64 {
    duration.num_seconds() as f64 / 3600.0
}
