//! Day and week aggregation of a sheet, and its text layout.
//!
//! Timestamps are grouped into day-groups first, then every timestamp is
//! rounded, and only then are the rounded values paired into intervals. The
//! displayed boundaries and the displayed hours therefore always agree.
//!
//! A day-group is labelled with the date of its first rounded timestamp, so a
//! start at 23:55 rounded to 00:00 shows up on the following day.

use std::fmt;

use chrono::{Datelike, Duration, NaiveDate};

use crate::format::{Formats, Timestamp, hours, round};
use crate::sheet::{Entry, days, entries};

/// Worked time for one day-group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayReport {
    /// Date of the first rounded timestamp of the group.
    pub date: NaiveDate,
    pub worked: Duration,
    /// Rounded intervals in recorded order.
    pub entries: Vec<Entry>,
}

/// Worked time for a sequence of timestamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub days: Vec<DayReport>,
    pub total: Duration,
}

impl Report {
    /// Aggregates `times`, rounding each timestamp to `round_to`.
    pub fn build(times: &[Timestamp], round_to: Duration) -> Self {
        let days: Vec<_> = days(times)
            .map(|day| {
                let rounded: Vec<_> = day.times.iter().map(|t| round(*t, round_to)).collect();
                let entries: Vec<_> = entries(&rounded).collect();
                let worked = entries
                    .iter()
                    .filter_map(Entry::duration)
                    .fold(Duration::zero(), |sum, d| sum + d);
                DayReport {
                    date: rounded.first().map_or(day.date, Timestamp::date),
                    worked,
                    entries,
                }
            })
            .collect();

        let total = days
            .iter()
            .fold(Duration::zero(), |sum, day| sum + day.worked);

        Self { days, total }
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Text rendering of the report using `formats`.
    pub fn display<'a>(&'a self, formats: &'a Formats) -> ReportDisplay<'a> {
        ReportDisplay {
            report: self,
            formats,
        }
    }
}

/// [`fmt::Display`] adapter returned by [`Report::display`].
///
/// One line per day (`01.09.2018  1.75  10:00-11:45 14:00-`), a blank line
/// whenever the ISO week number changes, then a blank line and the grand total.
/// An empty report renders as nothing at all.
pub struct ReportDisplay<'a> {
    report: &'a Report,
    formats: &'a Formats,
}

impl fmt::Display for ReportDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.report.is_empty() {
            return Ok(());
        }

        let mut week = None;
        for day in &self.report.days {
            let this_week = day.date.iso_week().week();
            if week.is_some_and(|w| w != this_week) {
                writeln!(f)?;
            }
            week = Some(this_week);

            write!(
                f,
                "{}  {:.2} ",
                self.formats.format_date(&day.date),
                hours(day.worked)
            )?;
            for entry in &day.entries {
                write!(f, " {}-", self.formats.format_time(&entry.start))?;
                if let Some(end) = &entry.end {
                    write!(f, "{}", self.formats.format_time(end))?;
                }
            }
            writeln!(f)?;
        }

        write!(f, "\nTotal: {:.2}\n", hours(self.report.total))
    }
}
