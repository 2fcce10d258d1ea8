//! Status command for showing whether an interval is open today.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::Duration;
use tt_core::{Sheet, Timestamp};
use tt_db::SheetFile;

/// Formats a duration as "Xh Ym", or "Ym" below one hour.
/// Negative durations are shown as 0m.
pub fn format_duration(duration: Duration) -> String {
    let total_minutes = duration.num_minutes().max(0);
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;

    if hours >= 1 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

/// Unrounded time worked on the date of `now`, counting an open interval up to `now`.
pub fn worked_today(sheet: &Sheet, now: Timestamp) -> Duration {
    let today = now.date();
    sheet
        .days()
        .filter(|day| day.date == today)
        .flat_map(|day| day.entries())
        .map(|entry| (entry.end.unwrap_or(now) - entry.start).max(Duration::zero()))
        .fold(Duration::zero(), |sum, d| sum + d)
}

pub fn run<W: Write>(writer: &mut W, file: &SheetFile, now: Timestamp) -> Result<()> {
    let sheet = file
        .load()
        .with_context(|| format!("failed to load {}", file.path().display()))?;

    writeln!(writer, "Data file: {}", file.path().display())?;

    match sheet.open_since(now.date()) {
        Some(start) => writeln!(
            writer,
            "Clocked in since {}",
            file.formats().format_time(&start)
        )?,
        None => writeln!(writer, "Clocked out")?,
    }
    writeln!(
        writer,
        "Worked today: {}",
        format_duration(worked_today(&sheet, now))
    )?;

    Ok(())
}
