use chrono::Duration;
use config::{builder::DefaultState, Config, ConfigBuilder, Environment, File};
use nutype::nutype;
use serde::Deserialize;

use crate::error::Result;

pub const DEFAULT_SNOOZE_HOURS: i64 = 24;
pub const MAX_SNOOZE_HOURS: i64 = 876_000;
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_LOG_FORMAT: &str = "pretty";

/// Length of a snooze declared without an explicit end, in hours
#[nutype(
    validate(greater = 0, less_or_equal = 876_000),
    derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, AsRef)
)]
pub struct SnoozeHours(i64);

impl Default for SnoozeHours {
    fn default() -> Self {
        Self::try_new(DEFAULT_SNOOZE_HOURS).expect("default snooze is within range")
    }
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub fixtures: FixtureSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct FixtureSettings {
    /// Hours added to "now" when a snooze is declared without a date
    pub default_snooze_hours: SnoozeHours,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    pub level: String,
    pub format: String,
}

impl Settings {
    /// Load settings from `config/fixtures.*` and `EVENT_FIXTURES__*`
    /// environment variables over the built-in defaults
    pub fn new() -> Result<Self> {
        let builder = Config::builder()
            .add_source(File::with_name("config/fixtures").required(false))
            .add_source(File::with_name("config/fixtures.local").required(false))
            .add_source(Environment::with_prefix("EVENT_FIXTURES").separator("__"));

        Self::from_builder(builder)
    }

    /// Fill in defaults beneath `builder`'s sources and deserialize
    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
        let config = builder
            .set_default("fixtures.default_snooze_hours", DEFAULT_SNOOZE_HOURS)?
            .set_default("logging.level", DEFAULT_LOG_LEVEL)?
            .set_default("logging.format", DEFAULT_LOG_FORMAT)?
            .build()?;

        Ok(config.try_deserialize()?)
    }
}

impl FixtureSettings {
    pub fn default_snooze(&self) -> Duration {
        Duration::hours(*self.default_snooze_hours.as_ref())
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            format: DEFAULT_LOG_FORMAT.to_string(),
        }
    }
}
