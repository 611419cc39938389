//! Widget configuration.
//!
//! - `settings`: the persisted settings struct
//! - `io`: settings path, loading and saving

mod io;
mod settings;

pub use io::{get_settings_path, load_settings_from, save_settings_to, APP_DIR_NAME};
pub use settings::WidgetSettings;
