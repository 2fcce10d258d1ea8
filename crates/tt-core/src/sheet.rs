//! The interval store.
//!
//! A [`Sheet`] is a flat, append-only log of timestamps. For every calendar
//! day the timestamps of that day alternate start, end, start, end, ... in
//! the order they were appended, so an odd count means an interval is open.
//! Days and entries are derived views over the log and are never stored.

use std::fmt;

use chrono::{Datelike, Duration, Month, NaiveDate};
use thiserror::Error;

use crate::format::{Formats, Timestamp};
use crate::report::Report;

/// Rejected `start`/`end` calls. The sheet is left untouched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SheetError {
    /// An interval is already open on that day.
    #[error("already started at {}", .started.format("%Y-%m-%d %H:%M"))]
    AlreadyStarted { started: Timestamp },

    /// No interval is open on that day.
    #[error("not started on {date}")]
    NotStarted { date: NaiveDate },

    /// The new timestamp lies before the last one recorded for its day.
    #[error(
        "{kind} time {} is earlier than last recorded time {}",
        .time.format("%Y-%m-%d %H:%M"),
        .last.format("%H:%M")
    )]
    Chronology {
        kind: Mark,
        time: Timestamp,
        last: Timestamp,
    },
}

/// Which side of an interval a timestamp marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    Start,
    End,
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => f.write_str("start"),
            Self::End => f.write_str("end"),
        }
    }
}

/// Ordered log of interval boundaries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sheet {
    times: Vec<Timestamp>,
}

impl Sheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an already ordered sequence of timestamps.
    pub fn from_times(times: Vec<Timestamp>) -> Self {
        Self { times }
    }

    pub fn times(&self) -> &[Timestamp] {
        &self.times
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Records the start of an interval.
    pub fn start(&mut self, time: Timestamp) -> Result<(), SheetError> {
        self.append(Mark::Start, time)
    }

    /// Records the end of the open interval.
    pub fn end(&mut self, time: Timestamp) -> Result<(), SheetError> {
        self.append(Mark::End, time)
    }

    fn append(&mut self, kind: Mark, time: Timestamp) -> Result<(), SheetError> {
        let date = time.date();
        let mut count = 0_usize;
        let mut last = None;
        for t in self.times.iter().filter(|t| t.date() == date) {
            count += 1;
            last = Some(*t);
        }

        let open = count % 2 == 1;
        match (kind, last) {
            (Mark::Start, Some(started)) if open => {
                return Err(SheetError::AlreadyStarted { started });
            }
            (Mark::End, _) if !open => return Err(SheetError::NotStarted { date }),
            _ => {}
        }

        if let Some(last) = last {
            if time < last {
                return Err(SheetError::Chronology { kind, time, last });
            }
        }

        self.times.push(time);
        Ok(())
    }

    /// All timestamps recorded on `date`, ascending.
    pub fn times_for_date(&self, date: NaiveDate) -> Vec<Timestamp> {
        let mut times: Vec<_> = self
            .times
            .iter()
            .copied()
            .filter(|t| t.date() == date)
            .collect();
        times.sort();
        times
    }

    /// Distinct dates in order of first appearance.
    pub fn dates(&self) -> Vec<NaiveDate> {
        let mut dates = Vec::new();
        for date in self.times.iter().map(Timestamp::date) {
            if !dates.contains(&date) {
                dates.push(date);
            }
        }
        dates
    }

    /// Whether an interval is currently open on `date`.
    pub fn is_open(&self, date: NaiveDate) -> bool {
        self.times.iter().filter(|t| t.date() == date).count() % 2 == 1
    }

    /// Start of the interval open on `date`, if any.
    pub fn open_since(&self, date: NaiveDate) -> Option<Timestamp> {
        if self.is_open(date) {
            self.times.iter().rev().find(|t| t.date() == date).copied()
        } else {
            None
        }
    }

    /// Contiguous runs of same-date timestamps.
    pub fn days(&self) -> impl Iterator<Item = Day<'_>> {
        days(&self.times)
    }

    /// Report over the whole sheet.
    pub fn report(&self, round_to: Duration) -> Report {
        Report::build(&self.times, round_to)
    }

    /// Report over the timestamps that fall in `month` of any year.
    pub fn month_report(&self, month: Month, round_to: Duration) -> Report {
        let times: Vec<_> = self
            .times
            .iter()
            .copied()
            .filter(|t| t.month() == month.number_from_month())
            .collect();
        Report::build(&times, round_to)
    }

    /// Renders the whole sheet.
    pub fn print(&self, round_to: Duration, formats: &Formats) -> String {
        self.report(round_to).display(formats).to_string()
    }

    /// Renders a single month.
    pub fn print_month(&self, month: Month, round_to: Duration, formats: &Formats) -> String {
        self.month_report(month, round_to)
            .display(formats)
            .to_string()
    }
}

/// All timestamps of one day-group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Day<'a> {
    pub date: NaiveDate,
    pub times: &'a [Timestamp],
}

impl<'a> Day<'a> {
    /// Pairs the day's timestamps into entries.
    pub fn entries(self) -> impl Iterator<Item = Entry> + 'a {
        entries(self.times)
    }
}

/// One interval; `end` is `None` while it is still running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry {
    pub start: Timestamp,
    pub end: Option<Timestamp>,
}

impl Entry {
    /// Length of a closed entry.
    pub fn duration(&self) -> Option<Duration> {
        self.end.map(|end| end - self.start)
    }
}

/// Splits `times` into day-groups, starting a new one whenever the date changes.
pub(crate) fn days(times: &[Timestamp]) -> impl Iterator<Item = Day<'_>> {
    times.chunk_by(|a, b| a.date() == b.date()).map(|times| Day {
        date: times[0].date(),
        times,
    })
}

pub(crate) fn entries(times: &[Timestamp]) -> impl Iterator<Item = Entry> + '_ {
    times.chunks(2).map(|pair| Entry {
        start: pair[0],
        end: pair.get(1).copied(),
    })
}
