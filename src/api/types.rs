use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::channel::{ApiPath, Channel};

// --- DISCOVERY ---

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CoreProps {
    pub gg_encrypted_address: String,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct SubAppsResponse {
    #[serde(default)]
    pub sub_apps: SubApps,
}

#[derive(Deserialize, Debug, Default)]
pub struct SubApps {
    #[serde(default)]
    pub sonar: Option<SubApp>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct SubApp {
    #[serde(default)]
    pub is_enabled: bool,
    #[serde(default)]
    pub is_running: bool,
    #[serde(default)]
    pub metadata: Option<SubAppMetadata>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct SubAppMetadata {
    #[serde(default)]
    pub web_server_address: Option<String>,
}

// --- VOLUME SETTINGS ---

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct ClassicVolume {
    /// Normalized 0.0..=1.0
    pub volume: f64,
    pub muted: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct VolumeBlock {
    pub classic: Option<ClassicVolume>,
}

/// Snapshot of `GET /volumeSettings/classic`.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct VolumeSettings {
    #[serde(default)]
    pub masters: Option<VolumeBlock>,
    #[serde(default)]
    pub devices: HashMap<String, VolumeBlock>,
}

/// Per-channel view of a snapshot.
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VolumeState {
    pub volume_percent: u8,
    pub muted: bool,
}

pub fn to_percent(normalized: f64) -> u8 {
    (normalized * 100.0).round().clamp(0.0, 100.0) as u8
}

impl VolumeSettings {
    pub fn classic(&self, channel: Channel) -> Option<ClassicVolume> {
        let block = match channel.api_path() {
            ApiPath::Masters => self.masters.as_ref(),
            ApiPath::Devices => self.devices.get(channel.device_role()?),
        };
        block?.classic
    }

    pub fn state(&self, channel: Channel) -> Option<VolumeState> {
        self.classic(channel).map(|c| VolumeState {
            volume_percent: to_percent(c.volume),
            muted: c.muted,
        })
    }
}

// --- CHAT MIX ---

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ChatMix {
    /// -1.0 (all game) ..= 1.0 (all chat)
    pub balance: f64,
    #[serde(default)]
    pub state: Option<String>,
}

// --- DEVICES ---

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub friendly_name: String,
}

/// Result of the combined sync request. Either half may be missing.
#[derive(Serialize, Clone, Debug, Default, PartialEq)]
pub struct FullState {
    pub volumes: Option<VolumeSettings>,
    pub devices: Vec<DeviceInfo>,
}
