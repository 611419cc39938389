//! Typed client for the SteelSeries Sonar local web service.
//!
//! Discovery goes through the GG engine: its `coreProps.json` names an HTTPS
//! address whose `/subApps` endpoint reports where Sonar's own web server lives.
//! The discovered address is cached for the lifetime of the client.
//!
//! Every public operation logs its failure before returning it; nothing here
//! panics or retries. The periodic sync retries naturally on its next tick.

use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

use super::channel::Channel;
use super::client::{HttpResponse, Transport, UreqTransport};
use super::error::{SonarError, SonarResult};
use super::types::{
    ChatMix, CoreProps, DeviceInfo, FullState, SubAppsResponse, VolumeSettings, VolumeState,
};

const VOLUME_SETTINGS_PATH: &str = "/volumeSettings/classic";
const AUDIO_DEVICES_PATH: &str = "/audioDevices";
const CHAT_MIX_PATH: &str = "/chatMix";

/// `%ProgramData%\SteelSeries\SteelSeries Engine 3\coreProps.json`
pub fn default_core_props_path() -> PathBuf {
    let program_data =
        std::env::var_os("ProgramData").unwrap_or_else(|| "C:\\ProgramData".into());
    PathBuf::from(program_data)
        .join("SteelSeries")
        .join("SteelSeries Engine 3")
        .join("coreProps.json")
}

pub struct SonarClient {
    transport: Arc<dyn Transport>,
    core_props_path: PathBuf,
    web_server_address: Mutex<Option<String>>,
    /// Set after a failed discovery has been logged at warn.
    unavailable_reported: AtomicBool,
}

impl SonarClient {
    pub fn new() -> Self {
        Self::with_transport(Arc::new(UreqTransport::new()), default_core_props_path())
    }

    pub fn with_transport(transport: Arc<dyn Transport>, core_props_path: PathBuf) -> Self {
        Self {
            transport,
            core_props_path,
            web_server_address: Mutex::new(None),
            unavailable_reported: AtomicBool::new(false),
        }
    }

    // ========================================================================
    // DISCOVERY
    // ========================================================================

    /// Resolve Sonar's web server address, hitting the network only until the
    /// first success. Repeated failures are logged at warn once, then at debug.
    pub fn initialize(&self) -> SonarResult<String> {
        let mut cached = self
            .web_server_address
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(address) = cached.as_ref() {
            return Ok(address.clone());
        }

        match self.discover() {
            Ok(address) => {
                info!(address = %address, "Sonar API initialized");
                self.unavailable_reported.store(false, Ordering::Relaxed);
                *cached = Some(address.clone());
                Ok(address)
            }
            Err(e) => {
                if self.unavailable_reported.swap(true, Ordering::Relaxed) {
                    debug!(error = %e, kind = ?e.kind(), "Sonar API still unavailable");
                } else {
                    warn!(error = %e, kind = ?e.kind(), "Failed to initialize Sonar API");
                }
                Err(e)
            }
        }
    }

    pub fn check_availability(&self) -> bool {
        self.initialize().is_ok()
    }

    fn discover(&self) -> SonarResult<String> {
        let core_props = read_core_props(&self.core_props_path)?;
        let url = format!("https://{}/subApps", core_props.gg_encrypted_address);
        let sub_apps: SubAppsResponse = parse_json(&self.ok(self.transport.get(&url)?, &url)?)?;

        let sonar = sub_apps.sub_apps.sonar.unwrap_or_default();
        if !sonar.is_enabled || !sonar.is_running {
            return Err(SonarError::SonarNotRunning);
        }

        sonar
            .metadata
            .and_then(|m| m.web_server_address)
            .filter(|a| !a.is_empty())
            .ok_or(SonarError::MissingWebServerAddress)
    }

    // ========================================================================
    // VOLUME / MUTE
    // ========================================================================

    pub fn get_volume_data(&self) -> SonarResult<VolumeSettings> {
        let base = self.initialize()?;
        self.fetch_json(&format!("{}{}", base, VOLUME_SETTINGS_PATH))
            .inspect_err(|e| debug!(error = %e, kind = ?e.kind(), "Failed to get volume data"))
    }

    pub fn get_channel_state(&self, channel: Channel) -> SonarResult<VolumeState> {
        self.get_volume_data()?
            .state(channel)
            .ok_or_else(|| SonarError::Malformed(format!("no classic volume for {}", channel)))
    }

    pub fn get_volume(&self, channel: Channel) -> SonarResult<u8> {
        self.get_channel_state(channel).map(|s| s.volume_percent)
    }

    pub fn get_mute(&self, channel: Channel) -> SonarResult<bool> {
        self.get_channel_state(channel).map(|s| s.muted)
    }

    /// `percent` is clamped to 0..=100 before normalizing.
    pub fn set_volume(&self, channel: Channel, percent: i32) -> SonarResult<()> {
        let base = self.initialize()?;
        let normalized = percent.clamp(0, 100) as f64 / 100.0;
        let url = format!(
            "{}{}/{}/Volume/{}",
            base,
            VOLUME_SETTINGS_PATH,
            channel.scope(),
            normalized
        );
        self.put_ack(&url)
            .inspect_err(|e| warn!(channel = %channel, error = %e, kind = ?e.kind(), "Failed to set volume"))
    }

    pub fn set_mute(&self, channel: Channel, muted: bool) -> SonarResult<()> {
        let base = self.initialize()?;
        let url = format!(
            "{}{}/{}/Mute/{}",
            base,
            VOLUME_SETTINGS_PATH,
            channel.scope(),
            muted
        );
        self.put_ack(&url)
            .inspect_err(|e| warn!(channel = %channel, error = %e, kind = ?e.kind(), "Failed to set mute"))
    }

    // ========================================================================
    // CHAT MIX
    // ========================================================================

    pub fn get_chat_mix(&self) -> SonarResult<ChatMix> {
        let base = self.initialize()?;
        self.fetch_json(&format!("{}{}", base, CHAT_MIX_PATH))
            .inspect_err(|e| debug!(error = %e, kind = ?e.kind(), "Failed to get chat mix"))
    }

    /// `balance` is clamped to -1.0..=1.0.
    pub fn set_chat_mix(&self, balance: f64) -> SonarResult<()> {
        let base = self.initialize()?;
        let balance = if balance.is_nan() { 0.0 } else { balance.clamp(-1.0, 1.0) };
        let url = format!("{}{}?balance={}", base, CHAT_MIX_PATH, balance);
        self.put_ack(&url)
            .inspect_err(|e| warn!(error = %e, kind = ?e.kind(), "Failed to set chat mix"))
    }

    // ========================================================================
    // DEVICES / FULL STATE
    // ========================================================================

    /// Empty means "no information", never an error.
    pub fn get_audio_devices(&self) -> Vec<DeviceInfo> {
        let Ok(base) = self.initialize() else {
            return Vec::new();
        };
        self.fetch_json(&format!("{}{}", base, AUDIO_DEVICES_PATH))
            .unwrap_or_else(|e| {
                debug!(error = %e, kind = ?e.kind(), "Failed to get audio devices");
                Vec::new()
            })
    }

    /// Volume and device list fetched concurrently. Each half fails on its
    /// own: a broken device list still returns the volumes and vice versa.
    pub fn get_full_state(&self) -> SonarResult<FullState> {
        let base = self.initialize()?;
        let volume_url = format!("{}{}", base, VOLUME_SETTINGS_PATH);
        let devices_url = format!("{}{}", base, AUDIO_DEVICES_PATH);

        let (volumes, devices) = std::thread::scope(|s| {
            let volumes = s.spawn(|| self.fetch_json::<VolumeSettings>(&volume_url));
            let devices = s.spawn(|| self.fetch_json::<Vec<DeviceInfo>>(&devices_url));
            (join_request(volumes), join_request(devices))
        });

        let volumes = volumes
            .inspect_err(|e| debug!(error = %e, kind = ?e.kind(), "Full state: volume request failed"))
            .ok();
        let devices = devices
            .inspect_err(|e| debug!(error = %e, kind = ?e.kind(), "Full state: device request failed"))
            .unwrap_or_default();

        Ok(FullState { volumes, devices })
    }

    // ========================================================================
    // HELPERS
    // ========================================================================

    fn ok(&self, resp: HttpResponse, url: &str) -> SonarResult<String> {
        if resp.is_ok() {
            Ok(resp.body)
        } else {
            Err(SonarError::Status {
                url: url.to_string(),
                status: resp.status,
            })
        }
    }

    fn fetch_json<T: DeserializeOwned>(&self, url: &str) -> SonarResult<T> {
        let resp = self.transport.get(url)?;
        parse_json(&self.ok(resp, url)?)
    }

    fn put_ack(&self, url: &str) -> SonarResult<()> {
        let resp = self.transport.put(url)?;
        self.ok(resp, url).map(|_| ())
    }
}

impl Default for SonarClient {
    fn default() -> Self {
        Self::new()
    }
}

fn read_core_props(path: &Path) -> SonarResult<CoreProps> {
    if !path.exists() {
        return Err(SonarError::CorePropsMissing(path.to_path_buf()));
    }
    let data = std::fs::read_to_string(path)
        .map_err(|e| SonarError::CorePropsUnreadable(e.to_string()))?;
    serde_json::from_str(&data).map_err(|e| SonarError::CorePropsUnreadable(e.to_string()))
}

fn parse_json<T: DeserializeOwned>(body: &str) -> SonarResult<T> {
    Ok(serde_json::from_str(body)?)
}

fn join_request<T>(handle: std::thread::ScopedJoinHandle<'_, SonarResult<T>>) -> SonarResult<T> {
    handle
        .join()
        .unwrap_or_else(|_| Err(SonarError::Malformed("request thread panicked".into())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::error::ErrorKind;
    use std::collections::HashMap;
    use std::sync::atomic::AtomicUsize;

    const GG_ADDRESS: &str = "127.0.0.1:6327";
    const SONAR: &str = "http://127.0.0.1:51000";

    /// Stateful in-memory stand-in for the GG discovery endpoint and Sonar.
    struct FakeSonar {
        running: bool,
        fail_devices: bool,
        fail_volumes: bool,
        discovery_calls: AtomicUsize,
        puts: Mutex<Vec<String>>,
        volumes: Mutex<HashMap<String, (f64, bool)>>,
        chat_mix: Mutex<f64>,
    }

    impl FakeSonar {
        fn new() -> Self {
            let volumes = ["master", "game", "chatRender", "media", "aux", "chatCapture"]
                .iter()
                .map(|scope| (scope.to_string(), (0.5, false)))
                .collect();
            Self {
                running: true,
                fail_devices: false,
                fail_volumes: false,
                discovery_calls: AtomicUsize::new(0),
                puts: Mutex::new(Vec::new()),
                volumes: Mutex::new(volumes),
                chat_mix: Mutex::new(0.0),
            }
        }

        fn volume_json(&self) -> String {
            let volumes = self.volumes.lock().unwrap();
            let block = |scope: &str| {
                let (v, m) = volumes[scope];
                serde_json::json!({ "classic": { "volume": v, "muted": m } })
            };
            let mut devices = serde_json::Map::new();
            for scope in ["game", "chatRender", "media", "aux", "chatCapture"] {
                devices.insert(scope.to_string(), block(scope));
            }
            serde_json::json!({ "masters": block("master"), "devices": devices }).to_string()
        }

        fn reply(status: u16, body: impl Into<String>) -> SonarResult<HttpResponse> {
            Ok(HttpResponse {
                status,
                body: body.into(),
            })
        }
    }

    impl Transport for FakeSonar {
        fn get(&self, url: &str) -> SonarResult<HttpResponse> {
            if url == format!("https://{}/subApps", GG_ADDRESS) {
                self.discovery_calls.fetch_add(1, Ordering::SeqCst);
                let body = serde_json::json!({
                    "subApps": { "sonar": {
                        "isEnabled": true,
                        "isRunning": self.running,
                        "metadata": { "webServerAddress": SONAR }
                    }}
                });
                return Self::reply(200, body.to_string());
            }
            match url.strip_prefix(SONAR) {
                Some("/volumeSettings/classic") if self.fail_volumes => Self::reply(500, ""),
                Some("/volumeSettings/classic") => Self::reply(200, self.volume_json()),
                Some("/audioDevices") if self.fail_devices => Err(SonarError::Timeout {
                    url: url.to_string(),
                }),
                Some("/audioDevices") => Self::reply(
                    200,
                    r#"[{"role":"game","friendlyName":"Speakers (SteelSeries Sonar Virtual Audio Device)"}]"#,
                ),
                Some("/chatMix") => Self::reply(
                    200,
                    format!(r#"{{"balance":{},"state":"enabled"}}"#, self.chat_mix.lock().unwrap()),
                ),
                _ => Self::reply(404, ""),
            }
        }

        fn put(&self, url: &str) -> SonarResult<HttpResponse> {
            self.puts.lock().unwrap().push(url.to_string());
            let path = url.strip_prefix(SONAR).unwrap_or_default();
            if let Some(balance) = path.strip_prefix("/chatMix?balance=") {
                *self.chat_mix.lock().unwrap() = balance.parse().unwrap();
                return Self::reply(200, "");
            }
            let parts: Vec<&str> = path
                .trim_start_matches("/volumeSettings/classic/")
                .split('/')
                .collect();
            let mut volumes = self.volumes.lock().unwrap();
            match parts.as_slice() {
                [scope, "Volume", v] if volumes.contains_key(*scope) => {
                    volumes.get_mut(*scope).unwrap().0 = v.parse().unwrap();
                }
                [scope, "Mute", m] if volumes.contains_key(*scope) => {
                    volumes.get_mut(*scope).unwrap().1 = m.parse().unwrap();
                }
                _ => return Self::reply(400, ""),
            }
            Self::reply(200, "")
        }
    }

    fn core_props_fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("coreProps.json"),
            format!(r#"{{"address":"127.0.0.1:6328","ggEncryptedAddress":"{}"}}"#, GG_ADDRESS),
        )
        .unwrap();
        dir
    }

    fn client_with(fake: FakeSonar) -> (SonarClient, Arc<FakeSonar>, tempfile::TempDir) {
        let dir = core_props_fixture();
        let fake = Arc::new(fake);
        let client = SonarClient::with_transport(fake.clone(), dir.path().join("coreProps.json"));
        (client, fake, dir)
    }

    #[test]
    fn initialize_discovers_once() {
        let (client, fake, _dir) = client_with(FakeSonar::new());
        assert_eq!(client.initialize().unwrap(), SONAR);
        assert_eq!(client.initialize().unwrap(), SONAR);
        assert_eq!(fake.discovery_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn initialize_fails_without_core_props() {
        let fake = Arc::new(FakeSonar::new());
        let client = SonarClient::with_transport(fake.clone(), PathBuf::from("/nonexistent/coreProps.json"));
        let err = client.initialize().unwrap_err();
        assert!(matches!(err, SonarError::CorePropsMissing(_)));
        assert_eq!(err.kind(), ErrorKind::ServiceUnavailable);
        assert!(!client.check_availability());
        assert_eq!(fake.discovery_calls.load(Ordering::SeqCst), 0);
    }

    /// Shared buffer the fmt subscriber writes into.
    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn warn_lines(logs: &LogBuffer) -> usize {
        String::from_utf8_lossy(&logs.0.lock().unwrap())
            .lines()
            .filter(|line| line.contains("WARN"))
            .count()
    }

    #[test]
    fn unavailable_service_warns_once_across_polls() {
        let logs = LogBuffer::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .finish();

        let fake = Arc::new(FakeSonar::new());
        let missing = SonarClient::with_transport(fake.clone(), PathBuf::from("/nonexistent/coreProps.json"));
        let mut stopped = FakeSonar::new();
        stopped.running = false;
        let (stopped, _fake, _dir) = client_with(stopped);

        tracing::subscriber::with_default(subscriber, || {
            for _ in 0..10 {
                assert!(missing.get_full_state().is_err());
                assert!(missing.get_volume_data().is_err());
                assert!(stopped.get_full_state().is_err());
            }
        });

        assert_eq!(warn_lines(&logs), 2);
        let output = String::from_utf8_lossy(&logs.0.lock().unwrap()).into_owned();
        assert!(output.contains("still unavailable"));
        assert!(output.contains("kind=ServiceUnavailable"));
    }

    #[test]
    fn stopped_sonar_is_unavailable_and_retried_later() {
        let mut fake = FakeSonar::new();
        fake.running = false;
        let (client, fake, _dir) = client_with(fake);
        assert!(matches!(client.initialize(), Err(SonarError::SonarNotRunning)));
        assert!(client.get_audio_devices().is_empty());
        // Failures are not cached.
        assert_eq!(fake.discovery_calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn set_then_get_volume_round_trips_for_every_channel() {
        let (client, _fake, _dir) = client_with(FakeSonar::new());
        for (i, channel) in Channel::ALL.into_iter().enumerate() {
            let percent = 13 * i as i32 + 7;
            client.set_volume(channel, percent).unwrap();
            let read = client.get_volume(channel).unwrap() as i32;
            assert!((read - percent).abs() <= 1, "{channel}: {read} vs {percent}");
        }
    }

    #[test]
    fn set_volume_clamps_before_normalizing() {
        let (client, fake, _dir) = client_with(FakeSonar::new());
        client.set_volume(Channel::Game, -10).unwrap();
        client.set_volume(Channel::Master, 150).unwrap();
        let puts = fake.puts.lock().unwrap();
        assert_eq!(puts[0], format!("{}/volumeSettings/classic/game/Volume/0", SONAR));
        assert_eq!(puts[1], format!("{}/volumeSettings/classic/master/Volume/1", SONAR));
        drop(puts);
        assert_eq!(client.get_volume(Channel::Game).unwrap(), 0);
        assert_eq!(client.get_volume(Channel::Master).unwrap(), 100);
    }

    #[test]
    fn mute_uses_role_scope() {
        let (client, fake, _dir) = client_with(FakeSonar::new());
        client.set_mute(Channel::Mic, true).unwrap();
        assert_eq!(
            fake.puts.lock().unwrap()[0],
            format!("{}/volumeSettings/classic/chatCapture/Mute/true", SONAR)
        );
        assert!(client.get_mute(Channel::Mic).unwrap());
        assert!(!client.get_mute(Channel::Chat).unwrap());
    }

    #[test]
    fn chat_mix_is_clamped() {
        let (client, fake, _dir) = client_with(FakeSonar::new());
        client.set_chat_mix(-2.0).unwrap();
        assert_eq!(client.get_chat_mix().unwrap().balance, -1.0);
        client.set_chat_mix(2.0).unwrap();
        assert_eq!(client.get_chat_mix().unwrap().balance, 1.0);
        assert!(fake.puts.lock().unwrap()[1].ends_with("/chatMix?balance=1"));
    }

    #[test]
    fn full_state_survives_device_failure() {
        let mut fake = FakeSonar::new();
        fake.fail_devices = true;
        let (client, _fake, _dir) = client_with(fake);
        let state = client.get_full_state().unwrap();
        assert!(state.volumes.is_some());
        assert!(state.devices.is_empty());
    }

    #[test]
    fn full_state_survives_volume_failure() {
        let mut fake = FakeSonar::new();
        fake.fail_volumes = true;
        let (client, _fake, _dir) = client_with(fake);
        let state = client.get_full_state().unwrap();
        assert_eq!(state.volumes, None);
        assert_eq!(state.devices.len(), 1);
        let err = client.get_volume(Channel::Game).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TransientNetwork);
    }

    #[test]
    fn malformed_volume_document_is_reported() {
        struct Garbage;
        impl Transport for Garbage {
            fn get(&self, url: &str) -> SonarResult<HttpResponse> {
                let body = if url.ends_with("/subApps") {
                    format!(
                        r#"{{"subApps":{{"sonar":{{"isEnabled":true,"isRunning":true,"metadata":{{"webServerAddress":"{}"}}}}}}}}"#,
                        SONAR
                    )
                } else {
                    "not json".to_string()
                };
                Ok(HttpResponse { status: 200, body })
            }
            fn put(&self, _url: &str) -> SonarResult<HttpResponse> {
                Ok(HttpResponse { status: 503, body: String::new() })
            }
        }

        let dir = core_props_fixture();
        let client = SonarClient::with_transport(Arc::new(Garbage), dir.path().join("coreProps.json"));
        assert_eq!(client.get_volume_data().unwrap_err().kind(), ErrorKind::MalformedResponse);
        assert!(matches!(
            client.set_mute(Channel::Game, true),
            Err(SonarError::Status { status: 503, .. })
        ));
    }
}
