//! Settings I/O: load and save.

use std::path::{Path, PathBuf};
use tracing::warn;

use super::settings::WidgetSettings;

pub const APP_DIR_NAME: &str = "SonarGlassWidget";

// ============================================================================
// SETTINGS PATH
// ============================================================================

/// Get the settings file path
pub fn get_settings_path() -> PathBuf {
    let config_dir = dirs::config_dir().unwrap_or_default().join(APP_DIR_NAME);
    let _ = std::fs::create_dir_all(&config_dir);
    config_dir.join("widget-settings.json")
}

// ============================================================================
// LOADING
// ============================================================================

/// Missing or unreadable settings fall back to defaults.
pub fn load_settings_from(path: &Path) -> WidgetSettings {
    if !path.exists() {
        return WidgetSettings::default();
    }

    let data = match std::fs::read_to_string(path) {
        Ok(d) => d,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read settings");
            return WidgetSettings::default();
        }
    };

    serde_json::from_str(&data).unwrap_or_else(|e| {
        warn!(path = %path.display(), error = %e, "Corrupt settings file, using defaults");
        WidgetSettings::default()
    })
}

// ============================================================================
// SAVING
// ============================================================================

pub fn save_settings_to(path: &Path, settings: &WidgetSettings) {
    let result = serde_json::to_string_pretty(settings)
        .map_err(anyhow::Error::from)
        .and_then(|data| std::fs::write(path, data).map_err(anyhow::Error::from));
    if let Err(e) = result {
        warn!(path = %path.display(), error = %e, "Failed to save settings");
    }
}
