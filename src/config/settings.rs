use serde::{Deserialize, Serialize};

/// Persisted widget settings (`widget-settings.json`).
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WidgetSettings {
    /// Last position of the widget while it was visible.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<i32>,
    /// Auto-launch is registered once, on the very first run.
    #[serde(default)]
    pub auto_launch_set: bool,
}

impl WidgetSettings {
    pub fn position(&self) -> Option<(i32, i32)> {
        Some((self.x?, self.y?))
    }

    pub fn set_position(&mut self, x: i32, y: i32) {
        self.x = Some(x);
        self.y = Some(y);
    }
}
