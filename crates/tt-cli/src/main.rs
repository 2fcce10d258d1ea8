use std::io::{self, Write};

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use tt_cli::commands::report::{self, ReportOptions, Scope};
use tt_cli::commands::{clock, status};
use tt_cli::{Cli, Commands, Config};
use tt_core::Mark;
use tt_db::SheetFile;

/// Load config and bind the data file with the configured formats.
fn open_sheet(cli: &Cli) -> Result<(SheetFile, Config)> {
    let config = Config::load_from(cli.config.as_deref(), &cli.overrides())
        .context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    let formats = config.formats().context("invalid configuration")?;
    Ok((SheetFile::open(&config.data_path, formats), config))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let (file, config) = open_sheet(&cli)?;
    let now = Local::now().naive_local();
    let month_options = ReportOptions {
        round_to: config.round_duration(),
        scope: Scope::Month(report::month(cli.month, now.date())?),
        json: false,
    };

    let mut out = io::stdout().lock();
    match &cli.command {
        None => report::run(&mut out, &file, month_options)?,
        Some(Commands::Print(args)) => {
            let options = ReportOptions {
                scope: if args.all {
                    Scope::All
                } else {
                    month_options.scope
                },
                json: args.json,
                ..month_options
            };
            report::run(&mut out, &file, options)?;
        }
        Some(Commands::Start { time }) => {
            clock::run(&mut out, &file, Mark::Start, time.as_deref(), now, month_options)?;
        }
        Some(Commands::Stop { time }) => {
            clock::run(&mut out, &file, Mark::End, time.as_deref(), now, month_options)?;
        }
        Some(Commands::Status) => status::run(&mut out, &file, now)?,
    }
    out.flush()?;

    Ok(())
}
