//! Mixer channels and their mapping onto the Sonar volume API.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::SonarError;

/// Which branch of the volume settings document a channel lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiPath {
    Masters,
    Devices,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Master,
    Game,
    Chat,
    Media,
    Aux,
    Mic,
}

struct ChannelMapping {
    channel: Channel,
    id: &'static str,
    path: ApiPath,
    /// Role name used by Sonar for device channels.
    role: Option<&'static str>,
}

const CHANNEL_TABLE: [ChannelMapping; 6] = [
    ChannelMapping { channel: Channel::Master, id: "master", path: ApiPath::Masters, role: None },
    ChannelMapping { channel: Channel::Game, id: "game", path: ApiPath::Devices, role: Some("game") },
    ChannelMapping { channel: Channel::Chat, id: "chat", path: ApiPath::Devices, role: Some("chatRender") },
    ChannelMapping { channel: Channel::Media, id: "media", path: ApiPath::Devices, role: Some("media") },
    ChannelMapping { channel: Channel::Aux, id: "aux", path: ApiPath::Devices, role: Some("aux") },
    ChannelMapping { channel: Channel::Mic, id: "mic", path: ApiPath::Devices, role: Some("chatCapture") },
];

impl Channel {
    pub const ALL: [Channel; 6] = [
        Channel::Master,
        Channel::Game,
        Channel::Chat,
        Channel::Media,
        Channel::Aux,
        Channel::Mic,
    ];

    fn mapping(self) -> &'static ChannelMapping {
        // The table is indexed in declaration order.
        &CHANNEL_TABLE[self as usize]
    }

    pub fn id(self) -> &'static str {
        self.mapping().id
    }

    pub fn api_path(self) -> ApiPath {
        self.mapping().path
    }

    pub fn device_role(self) -> Option<&'static str> {
        self.mapping().role
    }

    /// Path segment used in `volumeSettings/classic/<scope>/...` update URLs.
    pub fn scope(self) -> &'static str {
        self.device_role().unwrap_or("master")
    }

    /// Inverse of [`Channel::device_role`].
    pub fn from_role(role: &str) -> Option<Channel> {
        CHANNEL_TABLE
            .iter()
            .find(|m| m.role == Some(role))
            .map(|m| m.channel)
    }
}

impl FromStr for Channel {
    type Err = SonarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CHANNEL_TABLE
            .iter()
            .find(|m| m.id == s)
            .map(|m| m.channel)
            .ok_or_else(|| SonarError::UnknownChannel(s.to_string()))
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}
