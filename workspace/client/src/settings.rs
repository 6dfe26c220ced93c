use chrono::format::{Item, StrftimeItems};
use common::{Locale, NumberFormat};
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Prefix of the environment variables read by [`ClientSettings::load`].
pub const ENV_PREFIX: &str = "FINTRACK";

/// Client settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    /// Default log filter when `RUST_LOG` is not set
    pub log_level: String,

    /// Controls thousands and decimal separators of amounts
    pub locale: Locale,

    /// `strftime` pattern used for transaction dates
    pub date_format: String,

    /// Token of the current session
    pub session_token: Option<String>,

    /// JSON file holding the records of the in-memory store
    pub snapshot_path: Option<PathBuf>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            log_level: "fintrack=info,client=info".to_string(),
            locale: Locale::Ru,
            date_format: "%d.%m.%Y".to_string(),
            session_token: None,
            snapshot_path: None,
        }
    }
}

impl ClientSettings {
    /// Loads settings from defaults, an optional file and `FINTRACK_*` variables.
    ///
    /// Without `path`, `fintrack.toml` in the working directory is used when present.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name("fintrack").required(false),
        };
        let settings: ClientSettings = Config::builder()
            .add_source(file)
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()?
            .try_deserialize()?;
        settings.check()?;
        debug!(locale = ?settings.locale, date_format = %settings.date_format, "Settings loaded");
        Ok(settings)
    }

    /// Rejects a date format chrono cannot render.
    pub fn check(&self) -> Result<(), ConfigError> {
        if StrftimeItems::new(&self.date_format).any(|item| matches!(item, Item::Error)) {
            return Err(ConfigError::Message(format!(
                "invalid date_format '{}'",
                self.date_format
            )));
        }
        Ok(())
    }

    pub fn number_format(&self) -> NumberFormat {
        self.locale.number_format()
    }
}
