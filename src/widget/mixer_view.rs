//! What the mixer strips currently display, and the minimal set of updates
//! needed to bring them in line with a fresh Sonar snapshot.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use crate::api::{Channel, DeviceInfo, FullState};

/// Strips shown by the widget, left to right. Master has no strip.
pub const MIXER_CHANNELS: [Channel; 5] = [
    Channel::Game,
    Channel::Chat,
    Channel::Media,
    Channel::Aux,
    Channel::Mic,
];

const MAX_LABEL_CHARS: usize = 20;
const TRUNCATED_LABEL_CHARS: usize = 18;

lazy_static! {
    static ref VIRTUAL_SUFFIX: Regex = Regex::new(r"(?i)\s*\([^)]*Virtual[^)]*\)").unwrap();
    static ref AUDIO_SUFFIX: Regex = Regex::new(r"(?i)\s*\([^)]*Audio[^)]*\)").unwrap();
}

/// "Headphones (SteelSeries Sonar Virtual Audio Device)" -> "Headphones".
pub fn shorten_device_name(name: &str) -> String {
    let short = VIRTUAL_SUFFIX.replace_all(name, "");
    let short = AUDIO_SUFFIX.replace_all(&short, "");
    let short = short.trim();

    if short.is_empty() {
        let head: String = name.chars().take(TRUNCATED_LABEL_CHARS).collect();
        return format!("{}...", head);
    }
    if short.chars().count() > MAX_LABEL_CHARS {
        let head: String = short.chars().take(TRUNCATED_LABEL_CHARS).collect();
        return format!("{}...", head);
    }
    short.to_string()
}

/// One update for the HTML surface.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ViewPatch {
    Volume {
        channel: Channel,
        percent: u8,
    },
    Muted {
        channel: Channel,
        muted: bool,
    },
    #[serde(rename_all = "camelCase")]
    DeviceName {
        channel: Channel,
        short_name: String,
        full_name: String,
    },
}

#[derive(Debug, Default, Clone)]
struct Strip {
    volume: Option<u8>,
    muted: Option<bool>,
    label: Option<String>,
}

#[derive(Debug, Default)]
pub struct MixerView {
    strips: [Strip; 5],
    dragging: bool,
}

fn strip_index(channel: Channel) -> Option<usize> {
    MIXER_CHANNELS.iter().position(|&c| c == channel)
}

impl MixerView {
    pub fn new() -> Self {
        Self::default()
    }

    fn strip_mut(&mut self, channel: Channel) -> Option<&mut Strip> {
        strip_index(channel).map(|i| &mut self.strips[i])
    }

    pub fn begin_drag(&mut self) {
        self.dragging = true;
    }

    pub fn end_drag(&mut self) {
        self.dragging = false;
    }

    /// While true, sync polls are neither started nor applied.
    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    #[cfg(test)]
    pub fn volume(&self, channel: Channel) -> Option<u8> {
        strip_index(channel).and_then(|i| self.strips[i].volume)
    }

    pub fn muted(&self, channel: Channel) -> Option<bool> {
        strip_index(channel).and_then(|i| self.strips[i].muted)
    }

    /// The user moved a slider; the HTML already shows the value.
    pub fn set_local_volume(&mut self, channel: Channel, percent: i32) {
        if let Some(strip) = self.strip_mut(channel) {
            strip.volume = Some(percent.clamp(0, 100) as u8);
        }
    }

    /// Record a mute state chosen locally (optimistic click or a revert).
    pub fn set_local_mute(&mut self, channel: Channel, muted: bool) -> Option<ViewPatch> {
        let strip = self.strip_mut(channel)?;
        strip.muted = Some(muted);
        Some(ViewPatch::Muted { channel, muted })
    }

    /// Sonar refused a mute toggle. Flip the button back unless a sync has
    /// already replaced the optimistic value.
    pub fn mute_rejected(&mut self, channel: Channel, attempted: bool) -> Option<ViewPatch> {
        if self.muted(channel) != Some(attempted) {
            return None;
        }
        self.set_local_mute(channel, !attempted)
    }

    /// Diff a snapshot against what is displayed. Only changed fields produce
    /// patches. Missing halves of the snapshot leave the display untouched,
    /// as does any snapshot that arrives while a slider is held.
    pub fn reconcile(&mut self, state: &FullState) -> Vec<ViewPatch> {
        let mut patches = Vec::new();
        if self.dragging {
            return patches;
        }

        if let Some(volumes) = &state.volumes {
            for (i, &channel) in MIXER_CHANNELS.iter().enumerate() {
                let Some(current) = volumes.state(channel) else {
                    continue;
                };
                let strip = &mut self.strips[i];
                if strip.volume != Some(current.volume_percent) {
                    strip.volume = Some(current.volume_percent);
                    patches.push(ViewPatch::Volume {
                        channel,
                        percent: current.volume_percent,
                    });
                }
                if strip.muted != Some(current.muted) {
                    strip.muted = Some(current.muted);
                    patches.push(ViewPatch::Muted {
                        channel,
                        muted: current.muted,
                    });
                }
            }
        }

        for device in &state.devices {
            if let Some(patch) = self.apply_device(device) {
                patches.push(patch);
            }
        }

        patches
    }

    fn apply_device(&mut self, device: &DeviceInfo) -> Option<ViewPatch> {
        if device.friendly_name.is_empty() {
            return None;
        }
        let channel = Channel::from_role(&device.role)?;
        let strip = self.strip_mut(channel)?;
        let short_name = shorten_device_name(&device.friendly_name);
        if strip.label.as_deref() == Some(short_name.as_str()) {
            return None;
        }
        strip.label = Some(short_name.clone());
        Some(ViewPatch::DeviceName {
            channel,
            short_name,
            full_name: device.friendly_name.clone(),
        })
    }
}

impl ViewPatch {
    /// JavaScript that applies this patch in the widget page.
    pub fn to_script(&self) -> String {
        let json = serde_json::to_string(self).unwrap_or_else(|_| "null".to_string());
        format!("window.applyPatch({});", json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::VolumeSettings;

    fn snapshot(game: (f64, bool), mic: (f64, bool)) -> VolumeSettings {
        serde_json::from_value(serde_json::json!({
            "masters": { "classic": { "volume": 1.0, "muted": false } },
            "devices": {
                "game": { "classic": { "volume": game.0, "muted": game.1 } },
                "chatCapture": { "classic": { "volume": mic.0, "muted": mic.1 } }
            }
        }))
        .unwrap()
    }

    fn device(role: &str, name: &str) -> DeviceInfo {
        DeviceInfo {
            role: role.to_string(),
            friendly_name: name.to_string(),
        }
    }

    #[test]
    fn first_sync_patches_everything_then_nothing() {
        let mut view = MixerView::new();
        let state = FullState {
            volumes: Some(snapshot((0.42, false), (0.9, true))),
            devices: vec![device("game", "Arctis Nova Pro")],
        };
        let patches = view.reconcile(&state);
        assert_eq!(patches.len(), 5);
        assert!(patches.contains(&ViewPatch::Volume { channel: Channel::Game, percent: 42 }));
        assert!(patches.contains(&ViewPatch::Muted { channel: Channel::Mic, muted: true }));
        assert!(view.reconcile(&state).is_empty());
    }

    #[test]
    fn only_changed_fields_are_patched() {
        let mut view = MixerView::new();
        view.reconcile(&FullState {
            volumes: Some(snapshot((0.42, false), (0.9, true))),
            devices: vec![],
        });
        let patches = view.reconcile(&FullState {
            volumes: Some(snapshot((0.42, true), (0.9, true))),
            devices: vec![],
        });
        assert_eq!(patches, vec![ViewPatch::Muted { channel: Channel::Game, muted: true }]);
    }

    #[test]
    fn local_volume_suppresses_redundant_patch() {
        let mut view = MixerView::new();
        view.set_local_volume(Channel::Game, 42);
        let patches = view.reconcile(&FullState {
            volumes: Some(snapshot((0.42, false), (0.9, true))),
            devices: vec![],
        });
        assert!(!patches.iter().any(|p| matches!(p, ViewPatch::Volume { channel: Channel::Game, .. })));
    }

    #[test]
    fn missing_volumes_keep_display() {
        let mut view = MixerView::new();
        view.set_local_volume(Channel::Aux, 30);
        let patches = view.reconcile(&FullState::default());
        assert!(patches.is_empty());
        assert_eq!(view.volume(Channel::Aux), Some(30));
    }

    #[test]
    fn device_names_map_through_roles() {
        let mut view = MixerView::new();
        let patches = view.reconcile(&FullState {
            volumes: None,
            devices: vec![
                device("chatRender", "Headset Earphone (SteelSeries Sonar Virtual Audio Device)"),
                device("none", "Line In"),
                device("media", ""),
            ],
        });
        assert_eq!(
            patches,
            vec![ViewPatch::DeviceName {
                channel: Channel::Chat,
                short_name: "Headset Earphone".into(),
                full_name: "Headset Earphone (SteelSeries Sonar Virtual Audio Device)".into(),
            }]
        );
    }

    #[test]
    fn shortens_long_and_empty_names() {
        assert_eq!(shorten_device_name("Speakers (Realtek(R) Audio)"), "Speakers (Realtek(...");
        assert_eq!(shorten_device_name("Microphone (USB Audio Device)"), "Microphone");
        assert_eq!(
            shorten_device_name("Some Extremely Long Output Name"),
            "Some Extremely Lon..."
        );
        assert_eq!(shorten_device_name("(Virtual Cable)"), "(Virtual Cable)...");
        assert_eq!(shorten_device_name("Short"), "Short");
    }

    #[test]
    fn drag_flag_round_trip() {
        let mut view = MixerView::new();
        assert!(!view.is_dragging());
        view.begin_drag();
        assert!(view.is_dragging());
        view.end_drag();
        assert!(!view.is_dragging());
    }

    #[test]
    fn sync_during_drag_is_ignored_until_release() {
        let mut view = MixerView::new();
        view.reconcile(&FullState {
            volumes: Some(snapshot((0.42, false), (0.9, true))),
            devices: vec![],
        });
        let moved = FullState {
            volumes: Some(snapshot((0.10, false), (0.9, true))),
            devices: vec![device("game", "Arctis Nova Pro")],
        };

        view.begin_drag();
        assert!(view.reconcile(&moved).is_empty());
        assert_eq!(view.volume(Channel::Game), Some(42));

        view.end_drag();
        let patches = view.reconcile(&moved);
        assert!(patches.contains(&ViewPatch::Volume { channel: Channel::Game, percent: 10 }));
        assert_eq!(patches.len(), 2);
        assert_eq!(view.volume(Channel::Game), Some(10));
    }

    #[test]
    fn rejected_mute_reverts_button() {
        let mut view = MixerView::new();
        view.reconcile(&FullState {
            volumes: Some(snapshot((0.42, false), (0.9, true))),
            devices: vec![],
        });

        view.set_local_mute(Channel::Game, true);
        assert_eq!(
            view.mute_rejected(Channel::Game, true),
            Some(ViewPatch::Muted { channel: Channel::Game, muted: false })
        );
        assert_eq!(view.muted(Channel::Game), Some(false));
        // Sonar still reports unmuted, so the next sync has nothing to fix.
        assert!(view
            .reconcile(&FullState {
                volumes: Some(snapshot((0.42, false), (0.9, true))),
                devices: vec![],
            })
            .is_empty());
    }

    #[test]
    fn rejected_mute_after_sync_is_left_alone() {
        let mut view = MixerView::new();
        view.set_local_mute(Channel::Mic, false);
        view.reconcile(&FullState {
            volumes: Some(snapshot((0.42, false), (0.9, true))),
            devices: vec![],
        });
        assert_eq!(view.mute_rejected(Channel::Mic, false), None);
        assert_eq!(view.muted(Channel::Mic), Some(true));
        assert_eq!(view.mute_rejected(Channel::Master, true), None);
    }

    #[test]
    fn patch_script_is_json() {
        let script = ViewPatch::DeviceName {
            channel: Channel::Mic,
            short_name: "Mic \"Pro\"".into(),
            full_name: "Mic \"Pro\"".into(),
        }
        .to_script();
        assert_eq!(
            script,
            r#"window.applyPatch({"kind":"deviceName","channel":"mic","shortName":"Mic \"Pro\"","fullName":"Mic \"Pro\""});"#
        );
    }
}
