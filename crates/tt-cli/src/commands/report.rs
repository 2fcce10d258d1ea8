//! Report command for printing the timesheet.
//!
//! This module implements `tt print` (also the default with no subcommand)
//! for a single month or the whole sheet, as text or JSON.

use std::io::Write;

use anyhow::{Context, Result, anyhow};
use chrono::{Datelike, Duration, Month, NaiveDate};
use serde::Serialize;
use tt_core::format::hours;
use tt_core::{Formats, Report, Sheet};
use tt_db::SheetFile;

/// Which part of the sheet to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// A single calendar month, in any year.
    Month(Month),
    /// Every recorded day.
    All,
}

/// How to build and print a report.
#[derive(Debug, Clone, Copy)]
pub struct ReportOptions {
    pub round_to: Duration,
    pub scope: Scope,
    pub json: bool,
}

/// Resolves the month to report: the requested one, or the month of `today`.
pub fn month(requested: Option<u8>, today: NaiveDate) -> Result<Month> {
    let number = match requested {
        Some(number) => number,
        None => u8::try_from(today.month()).context("month out of range")?,
    };
    Month::try_from(number).map_err(|_| anyhow!("invalid month: {number}"))
}

// ========== JSON Output ==========

/// JSON report structure.
#[derive(Debug, Serialize)]
pub struct JsonReport {
    pub days: Vec<JsonDay>,
    pub total_hours: f64,
}

#[derive(Debug, Serialize)]
pub struct JsonDay {
    pub date: String,
    pub hours: f64,
    pub intervals: Vec<JsonInterval>,
}

#[derive(Debug, Serialize)]
pub struct JsonInterval {
    pub start: String,
    pub end: Option<String>,
}

/// Formats a report as JSON. Dates are ISO 8601, times use the time format.
pub fn format_report_json(report: &Report, formats: &Formats) -> Result<String> {
    let json = JsonReport {
        days: report
            .days
            .iter()
            .map(|day| JsonDay {
                date: day.date.format("%Y-%m-%d").to_string(),
                hours: hours(day.worked),
                intervals: day
                    .entries
                    .iter()
                    .map(|entry| JsonInterval {
                        start: formats.format_time(&entry.start),
                        end: entry.end.as_ref().map(|end| formats.format_time(end)),
                    })
                    .collect(),
            })
            .collect(),
        total_hours: hours(report.total),
    };

    Ok(serde_json::to_string_pretty(&json)?)
}

// ========== Public Interface ==========

/// Writes the report for `sheet` to `writer`.
pub fn write_report<W: Write>(
    writer: &mut W,
    sheet: &Sheet,
    formats: &Formats,
    options: ReportOptions,
) -> Result<()> {
    let report = match options.scope {
        Scope::Month(month) => sheet.month_report(month, options.round_to),
        Scope::All => sheet.report(options.round_to),
    };

    if options.json {
        writeln!(writer, "{}", format_report_json(&report, formats)?)?;
    } else {
        write!(writer, "{}", report.display(formats))?;
    }

    Ok(())
}

/// Runs the report command.
pub fn run<W: Write>(writer: &mut W, file: &SheetFile, options: ReportOptions) -> Result<()> {
    let sheet = file
        .load()
        .with_context(|| format!("failed to load {}", file.path().display()))?;
    write_report(writer, &sheet, file.formats(), options)
}
