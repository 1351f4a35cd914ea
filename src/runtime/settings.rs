use tracing::{debug, warn};

use groove::config::{self, Settings};

/// Settings for this run. Configuration is optional, so any failure falls back to defaults.
pub fn load_settings() -> Settings {
    let path = config::resolve_config_path();
    debug!(path = ?path, "loading settings");

    Settings::load_from(path.as_deref()).unwrap_or_else(|err| {
        warn!(error = %err, "using default settings");
        Settings::default()
    })
}
