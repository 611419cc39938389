use std::path::PathBuf;
use thiserror::Error;

/// Broad failure categories, used for logging and by tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Config file missing, Sonar disabled or not running, discovery failed.
    ServiceUnavailable,
    /// Timeout, connection refused, non-200 status.
    TransientNetwork,
    /// JSON missing the fields we need.
    MalformedResponse,
    /// Caller asked for something that does not exist (unknown channel).
    InvalidInput,
}

#[derive(Debug, Error)]
pub enum SonarError {
    #[error("coreProps.json not found at {}", .0.display())]
    CorePropsMissing(PathBuf),

    #[error("failed to read coreProps.json: {0}")]
    CorePropsUnreadable(String),

    #[error("Sonar is not enabled or not running")]
    SonarNotRunning,

    #[error("Sonar did not report a web server address")]
    MissingWebServerAddress,

    #[error("request timed out: {url}")]
    Timeout { url: String },

    #[error("request to {url} failed: {message}")]
    Network { url: String, message: String },

    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("unknown channel: {0}")]
    UnknownChannel(String),
}

impl SonarError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::CorePropsMissing(_)
            | Self::CorePropsUnreadable(_)
            | Self::SonarNotRunning
            | Self::MissingWebServerAddress => ErrorKind::ServiceUnavailable,
            Self::Timeout { .. } | Self::Network { .. } | Self::Status { .. } => {
                ErrorKind::TransientNetwork
            }
            Self::Malformed(_) => ErrorKind::MalformedResponse,
            Self::UnknownChannel(_) => ErrorKind::InvalidInput,
        }
    }
}

impl From<serde_json::Error> for SonarError {
    fn from(err: serde_json::Error) -> Self {
        Self::Malformed(err.to_string())
    }
}

pub type SonarResult<T> = Result<T, SonarError>;
