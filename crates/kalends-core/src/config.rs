use anyhow::Result;
use config::Config;
use serde::Deserialize;

use crate::error::{CoreError, CoreResult};

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub logging: LoggingConfig,
    pub calendar: CalendarConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CalendarConfig {
    /// Zone for floating times: `UTC` or an IANA name.
    pub floating_tz: String,
    /// Treat any parse diagnostic as a hard failure.
    pub strict: bool,
    /// Consecutive empty recurrence periods before a rule is abandoned.
    pub max_idle_periods: u32,
}

impl CalendarConfig {
    /// ## Summary
    /// Checks values the type system cannot.
    ///
    /// ## Errors
    /// Returns `CoreError::ConfigError` for an empty zone name or a zero
    /// idle-period bound.
    pub fn check(&self) -> CoreResult<()> {
        if self.floating_tz.trim().is_empty() {
            return Err(CoreError::ConfigError(
                "calendar.floating_tz must not be empty".to_string(),
            ));
        }
        if self.max_idle_periods == 0 {
            return Err(CoreError::ConfigError(
                "calendar.max_idle_periods must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Settings {
    /// ## Summary
    /// Loads configuration from environment variables and an optional
    /// `config.toml` into a `Settings`, on top of the built-in defaults.
    ///
    /// ## Errors
    /// Returns an error if building the configuration or deserializing it fails.
    pub fn load() -> Result<Self> {
        Self::from_builder(Config::builder())
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self> {
        let settings = builder
            .set_default("logging.level", "info")?
            .set_default("calendar.floating_tz", "UTC")?
            .set_default("calendar.strict", false)?
            .set_default("calendar.max_idle_periods", 50_000)?
            // Env file
            .add_source(
                config::Environment::default()
                    .convert_case(config::Case::Snake)
                    .separator("_")
                    .ignore_empty(true)
                    .try_parsing(true),
            )
            // TOML file
            .add_source(config::File::with_name("config.toml").required(false))
            .build()?
            .try_deserialize::<Settings>()?;
        settings.calendar.check()?;
        Ok(settings)
    }
}

/// ## Summary
/// Loads configuration from environment variables and `.env` file.
///
/// ## Errors
/// Returns an error if loading or deserializing the configuration fails.
pub fn load_config() -> Result<Settings> {
    dotenvy::dotenv().ok();

    Settings::load()
}
