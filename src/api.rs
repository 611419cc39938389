pub mod channel;
pub mod client;
pub mod error;
pub mod sonar;
pub mod types;

pub use channel::Channel;
pub use error::{ErrorKind, SonarError, SonarResult};
pub use sonar::SonarClient;
pub use types::{ChatMix, DeviceInfo, FullState, VolumeSettings, VolumeState};
