//! Configuration loading and management.

use std::path::{Path, PathBuf};

use chrono::Duration;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use tt_core::format::{DEFAULT_DATE_FORMAT, DEFAULT_KEY_DATE_FORMAT, DEFAULT_TIME_FORMAT};
use tt_core::{FormatError, Formats};

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the data file.
    pub data_path: PathBuf,

    /// Format of the date keys in the data file.
    pub key_date_format: String,

    /// Format of dates in the report.
    pub date_format: String,

    /// Format of times in the data file, the report and on the command line.
    pub time_format: String,

    /// Rounding granularity of the report, in minutes.
    pub round_to: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_path: default_data_path(),
            key_date_format: DEFAULT_KEY_DATE_FORMAT.to_string(),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            time_format: DEFAULT_TIME_FORMAT.to_string(),
            round_to: 15,
        }
    }
}

/// Values that take precedence over every configuration source.
///
/// Unset fields are not serialized, so they leave lower layers alone.
#[derive(Debug, Default, Clone, Serialize)]
pub struct Overrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub round_to: Option<u32>,
}

impl Config {
    /// Loads configuration, optionally from a specific file, then applies
    /// command-line overrides.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(
        config_path: Option<&Path>,
        overrides: &Overrides,
    ) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (TT_*)
        figment = figment.merge(Env::prefixed("TT_"));

        figment = figment.merge(Serialized::defaults(overrides));

        figment.extract()
    }

    /// The validated formats described by this configuration.
    pub fn formats(&self) -> Result<Formats, FormatError> {
        Formats::new(
            self.key_date_format.as_str(),
            self.date_format.as_str(),
            self.time_format.as_str(),
        )
    }

    /// Report rounding granularity.
    pub fn round_duration(&self) -> Duration {
        Duration::minutes(i64::from(self.round_to))
    }
}

/// Returns the platform-specific config directory for tt.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("tt"))
}

/// Returns the default data file, `~/.tt.json`.
pub fn default_data_path() -> PathBuf {
    dirs::home_dir().map_or_else(|| PathBuf::from(".tt.json"), |home| home.join(".tt.json"))
}
