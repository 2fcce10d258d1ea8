//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::Overrides;

/// Command-line time tracker.
///
/// Records when work starts and stops each day and prints a timesheet
/// grouped by day and week.
#[derive(Debug, Parser)]
#[command(name = "tt", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the data file [default: $HOME/.tt.json].
    #[arg(short, long, global = true, value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Round times in the report to MINUTES [default: 15].
    #[arg(short, long, global = true, value_name = "MINUTES")]
    pub round_to: Option<u32>,

    /// Print report dates with FORMAT (strftime) [default: %d.%m.%Y].
    #[arg(short, long, global = true, value_name = "FORMAT")]
    pub date_format: Option<String>,

    /// Parse and write times with FORMAT (strftime) [default: %H:%M].
    #[arg(short, long, global = true, value_name = "FORMAT")]
    pub time_format: Option<String>,

    /// Report MONTH (1-12) [default: current month].
    #[arg(
        short,
        long,
        global = true,
        value_name = "MONTH",
        value_parser = clap::value_parser!(u8).range(1..=12)
    )]
    pub month: Option<u8>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Configuration values given on the command line.
    pub fn overrides(&self) -> Overrides {
        Overrides {
            data_path: self.file.clone(),
            date_format: self.date_format.clone(),
            time_format: self.time_format.clone(),
            round_to: self.round_to,
        }
    }
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the timesheet (the default when no subcommand is given).
    Print(PrintArgs),

    /// Start a new interval.
    Start {
        /// Time of day to record [default: now].
        time: Option<String>,
    },

    /// Stop the current interval.
    Stop {
        /// Time of day to record [default: now].
        time: Option<String>,
    },

    /// Show whether an interval is open today.
    Status,
}

#[derive(Debug, Default, Args)]
pub struct PrintArgs {
    /// Print every recorded day instead of a single month.
    #[arg(long)]
    pub all: bool,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}
