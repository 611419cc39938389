//! Launch-at-login registration, done once on the first release run.

use std::path::Path;

use anyhow::{anyhow, Result};
use auto_launch::AutoLaunch;
use tracing::{info, warn};

use crate::config::{save_settings_to, WidgetSettings};

pub const AUTO_LAUNCH_NAME: &str = "SonarGlassWidget";

/// Something that can register the widget to start with the session.
pub trait StartupRegistration {
    fn enable(&self) -> Result<()>;
}

pub struct SystemStartup {
    auto: AutoLaunch,
}

impl SystemStartup {
    pub fn for_current_exe() -> Result<Self> {
        let app_path = std::env::current_exe()?;
        let app_path = app_path
            .to_str()
            .ok_or_else(|| anyhow!("executable path is not valid UTF-8"))?;
        let args: &[&str] = &[];
        Ok(Self {
            auto: AutoLaunch::new(AUTO_LAUNCH_NAME, app_path, args),
        })
    }
}

impl StartupRegistration for SystemStartup {
    fn enable(&self) -> Result<()> {
        if self.auto.is_enabled().unwrap_or(false) {
            return Ok(());
        }
        self.auto.enable().map_err(|e| anyhow!("{}", e))
    }
}

/// Register once and remember it in the settings. Returns whether a
/// registration was attempted.
pub fn ensure_first_run(
    settings: &mut WidgetSettings,
    settings_path: &Path,
    registration: &dyn StartupRegistration,
) -> bool {
    if settings.auto_launch_set {
        return false;
    }
    match registration.enable() {
        Ok(()) => info!("Auto-launch enabled"),
        Err(e) => warn!(error = %e, "Failed to enable auto-launch"),
    }
    settings.auto_launch_set = true;
    save_settings_to(settings_path, settings);
    true
}
