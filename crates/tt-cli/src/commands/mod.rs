//! CLI subcommand implementations.

pub mod clock;
pub mod report;
pub mod status;
