//! Request/response messages exchanged with the widget page over IPC.
//!
//! The page posts `{"id": 7, "cmd": "set-volume", "channel": "game", "volume": 40}`
//! and receives `{"id": 7, "success": true}` back through
//! `window.onCommandResponse`.

use serde::{Deserialize, Serialize};

use crate::api::{Channel, ChatMix, FullState, SonarClient, SonarError, VolumeSettings};

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Request {
    #[serde(default)]
    pub id: u64,
    #[serde(flatten)]
    pub command: Command,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "cmd", rename_all = "kebab-case")]
pub enum Command {
    SetVolume { channel: Channel, volume: i32 },
    GetVolume { channel: Channel },
    SetMute { channel: Channel, muted: bool },
    GetMute { channel: Channel },
    CheckAvailability,
    GetVolumeData,
    GetFullState,
    GetChatMix,
    SetChatMix { balance: f64 },
    DragStart,
    DragEnd,
    StartMove,
}

impl Command {
    /// Handled on the UI thread without touching the network.
    pub fn is_local(&self) -> bool {
        matches!(self, Command::DragStart | Command::DragEnd | Command::StartMove)
    }
}

#[derive(Serialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CommandResponse {
    pub id: u64,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub muted: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<VolumeSettings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<FullState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_mix: Option<ChatMix>,
}

impl CommandResponse {
    pub fn ok(id: u64) -> Self {
        Self {
            id,
            success: true,
            ..Default::default()
        }
    }

    pub fn failed(id: u64, error: impl Into<String>) -> Self {
        Self {
            id,
            success: false,
            error: Some(error.into()),
            ..Default::default()
        }
    }

    fn from_result<T>(id: u64, result: Result<T, SonarError>, fill: impl FnOnce(&mut Self, T)) -> Self {
        match result {
            Ok(value) => {
                let mut resp = Self::ok(id);
                fill(&mut resp, value);
                resp
            }
            Err(e) => Self::failed(id, e.to_string()),
        }
    }

    /// JavaScript that hands this response to the page.
    pub fn to_script(&self) -> String {
        let json = serde_json::to_string(self)
            .unwrap_or_else(|_| format!(r#"{{"id":{},"success":false}}"#, self.id));
        format!("window.onCommandResponse && window.onCommandResponse({});", json)
    }
}

/// Parse one IPC message. A message that is JSON but not a known command
/// still yields its `id` so the page gets a failure response.
pub fn parse_request(raw: &str) -> Result<Request, CommandResponse> {
    match serde_json::from_str::<Request>(raw) {
        Ok(request) => Ok(request),
        Err(e) => {
            let id = serde_json::from_str::<serde_json::Value>(raw)
                .ok()
                .and_then(|v| v.get("id").and_then(|id| id.as_u64()))
                .unwrap_or(0);
            Err(CommandResponse::failed(id, format!("Invalid command: {}", e)))
        }
    }
}

/// Run a network-bound command. Blocks for up to one request timeout
/// (two, for chained reads), so callers keep this off the UI thread.
pub fn execute(client: &SonarClient, request: &Request) -> CommandResponse {
    let id = request.id;
    match &request.command {
        Command::SetVolume { channel, volume } => {
            CommandResponse::from_result(id, client.set_volume(*channel, *volume), |_, _| {})
        }
        Command::GetVolume { channel } => {
            CommandResponse::from_result(id, client.get_volume(*channel), |r, v| r.volume = Some(v))
        }
        Command::SetMute { channel, muted } => {
            CommandResponse::from_result(id, client.set_mute(*channel, *muted), |_, _| {})
        }
        Command::GetMute { channel } => {
            CommandResponse::from_result(id, client.get_mute(*channel), |r, m| r.muted = Some(m))
        }
        Command::CheckAvailability => CommandResponse {
            available: Some(client.check_availability()),
            ..CommandResponse::ok(id)
        },
        Command::GetVolumeData => {
            CommandResponse::from_result(id, client.get_volume_data(), |r, d| r.data = Some(d))
        }
        Command::GetFullState => {
            CommandResponse::from_result(id, client.get_full_state(), |r, s| r.state = Some(s))
        }
        Command::GetChatMix => {
            CommandResponse::from_result(id, client.get_chat_mix(), |r, c| r.chat_mix = Some(c))
        }
        Command::SetChatMix { balance } => {
            CommandResponse::from_result(id, client.set_chat_mix(*balance), |_, _| {})
        }
        Command::DragStart | Command::DragEnd | Command::StartMove => CommandResponse::ok(id),
    }
}
