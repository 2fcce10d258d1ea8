//! Core domain logic for the time tracker.
//!
//! This crate contains the fundamental types and logic for:
//! - The interval store: a flat log of start/end timestamps per day
//! - Reports: day and week aggregation with rounding and a text layout
//! - Formats: parsing and rendering of dates and times
//!
//! Nothing in here performs I/O or logs; callers supply timestamps and
//! receive values or text back.

pub mod format;
mod report;
mod sheet;

pub use format::{FormatError, Formats, Timestamp, round};
pub use report::{DayReport, Report, ReportDisplay};
pub use sheet::{Day, Entry, Mark, Sheet, SheetError};
