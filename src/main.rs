#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod api;
mod autostart;
mod config;
mod logging;
mod occlusion;
mod visibility;
mod widget;

use std::panic;
use std::path::PathBuf;
use tracing::{error, info};

use config::WidgetSettings;

fn main() -> anyhow::Result<()> {
    let _log_guard = logging::init();

    panic::set_hook(Box::new(|info| {
        error!("panic: {}", info);
    }));

    info!(version = env!("CARGO_PKG_VERSION"), "Sonar Glass Widget starting");

    let settings_path = config::get_settings_path();
    let settings = config::load_settings_from(&settings_path);
    run_widget(settings, settings_path)
}

#[cfg(windows)]
fn run_widget(mut settings: WidgetSettings, settings_path: PathBuf) -> anyhow::Result<()> {
    match autostart::SystemStartup::for_current_exe() {
        Ok(startup) => {
            autostart::ensure_first_run(&mut settings, &settings_path, &startup);
        }
        Err(e) => error!(error = %e, "Auto-launch unavailable"),
    }

    widget::window::run(settings, settings_path)
}

#[cfg(not(windows))]
fn run_widget(_settings: WidgetSettings, _settings_path: PathBuf) -> anyhow::Result<()> {
    error!("The widget needs a Windows desktop; nothing to do on this platform");
    anyhow::bail!("unsupported platform")
}
