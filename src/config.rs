use anyhow::{Context, Result};
use client::ClientSettings;

use crate::cli::Cli;

/// Loads settings from file and environment, then applies command line overrides.
pub fn load_settings(cli: &Cli) -> Result<ClientSettings> {
    let settings = ClientSettings::load(cli.config.as_deref())
        .context("Failed to load settings")?;
    Ok(apply_overrides(cli, settings))
}

pub fn apply_overrides(cli: &Cli, mut settings: ClientSettings) -> ClientSettings {
    if let Some(token) = &cli.token {
        settings.session_token = Some(token.clone());
    }
    if let Some(path) = &cli.snapshot {
        settings.snapshot_path = Some(path.clone());
    }
    settings
}
