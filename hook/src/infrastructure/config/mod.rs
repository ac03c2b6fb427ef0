//! Configuration management for the hook.
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! environment variables such as `DOLT_HOOK__DATABASE__NAME`.
//!
//! # Example
//!
//! ```
//! use dolt_hook::infrastructure::config::Settings;
//!
//! let settings = Settings::from_toml_str("[database]\nname = \"foo\"")
//!     .expect("Failed to load configuration");
//! assert_eq!(settings.database.port, 3306);
//! ```

pub mod database;
pub mod hook;
pub mod telemetry;

pub use database::DatabaseSettings;
pub use hook::HookSettings;
pub use telemetry::TelemetrySettings;

use std::path::Path;

use config::builder::{ConfigBuilder, DefaultState};
use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

/// Prefix of environment variables read as settings.
pub const ENV_PREFIX: &str = "DOLT_HOOK";

/// Base name of the settings file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "dolt-hook";

/// Top-level configuration for the hook.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    /// Database settings.
    pub database: DatabaseSettings,
    /// Lifecycle settings.
    pub hook: HookSettings,
    /// Telemetry settings.
    pub telemetry: TelemetrySettings,
}

impl Settings {
    /// Loads settings from defaults, `dolt-hook.toml` if present, and the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be built or deserialized.
    pub fn new() -> Result<Self, ConfigError> {
        Self::load(None)
    }

    /// Loads settings from defaults, the given file (or `dolt-hook.toml` if
    /// present), and the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly given file is missing, or if the
    /// configuration cannot be built or deserialized.
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match config_file {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        Self::defaults()?
            .add_source(file)
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?
            .try_deserialize()
    }

    /// Loads settings from defaults and a TOML document only.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is invalid or required keys are missing.
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        Self::defaults()?
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("database.host", "localhost")?
            .set_default("database.port", 3306)?
            .set_default("database.user", "root")?
            .set_default("database.password", "")?
            .set_default("hook.default_branch", "master")?
            .set_default("telemetry.service_name", "dolt-hook")?
            .set_default("telemetry.log_level", "info")?
            .set_default("telemetry.sampling_ratio", telemetry::default_sampling())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::io::Write;

    #[test]
    fn test_defaults_fill_everything_but_the_database_name() {
        let settings = Settings::from_toml_str("[database]\nname = \"foo\"").expect("valid");

        assert_eq!(settings.database.host, "localhost");
        assert_eq!(settings.database.port, 3306);
        assert_eq!(settings.database.user, "root");
        assert_eq!(settings.database.password.expose_secret(), "");
        assert_eq!(settings.database.name.as_str(), "foo");
        assert_eq!(settings.hook.default_branch, "master");
        assert_eq!(settings.telemetry.service_name, "dolt-hook");
        assert!(settings.telemetry.otlp_endpoint.is_none());
    }

    #[test]
    fn test_database_name_is_required() {
        assert!(Settings::from_toml_str("").is_err());
    }

    #[test]
    fn test_names_are_validated() {
        assert!(Settings::from_toml_str("[database]\nname = \"foo; DROP\"").is_err());
        assert!(
            Settings::from_toml_str("[database]\nname = \"foo\"\n[hook]\ndefault_branch = \"-b\"")
                .is_err()
        );
    }

    #[test]
    fn test_password_is_redacted() {
        let settings =
            Settings::from_toml_str("[database]\nname = \"foo\"\npassword = \"hunter2\"")
                .expect("valid");
        assert!(!format!("{settings:?}").contains("hunter2"));
        assert_eq!(settings.database.password.expose_secret(), "hunter2");
    }

    #[test]
    fn test_explicit_file_is_loaded() -> anyhow::Result<()> {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile()?;
        writeln!(
            file,
            "[database]\nname = \"warehouse\"\nhost = \"dolt.internal\"\nport = 13306\n\
             [hook]\ndefault_branch = \"main\""
        )?;

        let settings = Settings::load(Some(file.path()))?;
        let options = settings.database.connection_options();

        assert_eq!(options.target(), "dolt.internal:13306/warehouse");
        assert_eq!(settings.hook.default_branch, "main");
        Ok(())
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        assert!(Settings::load(Some(Path::new("/nonexistent/dolt-hook.toml"))).is_err());
    }
}
