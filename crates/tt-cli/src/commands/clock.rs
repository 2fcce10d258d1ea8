//! Start and stop commands for recording interval boundaries.

use std::io::Write;

use anyhow::{Context, Result};
use tt_core::{Mark, Timestamp};
use tt_db::SheetFile;

use crate::commands::report::{self, ReportOptions};

/// Resolves the timestamp to record.
///
/// An explicit time is parsed with the configured time format and placed on
/// today's date. Without one, the current time is used, trimmed to what the
/// data file can store.
pub fn resolve_time(file: &SheetFile, time: Option<&str>, now: Timestamp) -> Result<Timestamp> {
    let formats = file.formats();
    match time {
        Some(value) => formats.parse_time(value, now.date()).with_context(|| {
            format!("invalid time {value:?}, expected format {:?}", formats.time())
        }),
        None => formats
            .normalize(now)
            .context("failed to truncate current time to the time format"),
    }
}

/// Records a start or end, saves the sheet and prints the report.
pub fn run<W: Write>(
    writer: &mut W,
    file: &SheetFile,
    mark: Mark,
    time: Option<&str>,
    now: Timestamp,
    options: ReportOptions,
) -> Result<()> {
    let at = resolve_time(file, time, now)?;

    let mut sheet = file
        .load()
        .with_context(|| format!("failed to load {}", file.path().display()))?;

    match mark {
        Mark::Start => sheet.start(at)?,
        Mark::End => sheet.end(at)?,
    }
    tracing::debug!(%mark, time = %at, "recorded time");

    file.save(&sheet)
        .with_context(|| format!("failed to save {}", file.path().display()))?;

    report::write_report(writer, &sheet, file.formats(), options)
}
