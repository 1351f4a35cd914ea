use std::env;
use std::path::{Path, PathBuf};

use ::config::{Config, Environment, File};

use super::schema::Settings;
use crate::error::SettingsError;

const ENV_PREFIX: &str = "GROOVE";
const CONFIG_PATH_VAR: &str = "GROOVE_CONFIG_PATH";
const APP_DIR: &str = "groove";

impl Settings {
    /// Load and validate settings from the file at [`resolve_config_path`] and the environment.
    pub fn load() -> Result<Self, SettingsError> {
        Self::load_from(resolve_config_path().as_deref())
    }

    /// Layer struct defaults, then `path` (a missing file is skipped), then
    /// `GROOVE__SECTION__KEY` variables, and validate the result.
    pub fn load_from(path: Option<&Path>) -> Result<Self, SettingsError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(false));
        }

        let settings: Settings = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    /// Reject values the catalog cannot run with.
    pub fn validate(&self) -> Result<(), SettingsError> {
        let search = &self.search;
        if search.max_results == 0 {
            return Err(SettingsError::Invalid("search.max_results must be >= 1".into()));
        }

        let zero_weight = [
            ("title_weight", search.title_weight),
            ("filename_weight", search.filename_weight),
            ("artist_weight", search.artist_weight),
            ("album_weight", search.album_weight),
        ]
        .into_iter()
        .find(|&(_, weight)| weight == 0);
        if let Some((name, _)) = zero_weight {
            return Err(SettingsError::Invalid(format!("search.{name} must be >= 1")));
        }

        if self.sync.progress_interval_ms == 0 {
            return Err(SettingsError::Invalid(
                "sync.progress_interval_ms must be >= 1".into(),
            ));
        }
        Ok(())
    }
}

/// `GROOVE_CONFIG_PATH` when set, otherwise [`default_config_path`].
pub fn resolve_config_path() -> Option<PathBuf> {
    env::var_os(CONFIG_PATH_VAR)
        .map(PathBuf::from)
        .or_else(default_config_path)
}

/// `$XDG_CONFIG_HOME/groove/config.toml`, falling back to `~/.config/groove/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))
        .map(|dir| dir.join(APP_DIR).join("config.toml"))
}
