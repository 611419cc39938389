use std::time::Duration;

use super::error::{SonarError, SonarResult};

/// Every outbound call is abandoned after this long.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// The two verbs the Sonar API needs. Implementations must be usable from
/// several threads at once because the sync request fans out.
pub trait Transport: Send + Sync {
    fn get(&self, url: &str) -> SonarResult<HttpResponse>;
    fn put(&self, url: &str) -> SonarResult<HttpResponse>;
}

/// ureq-backed transport. Sonar serves a self-signed certificate on loopback,
/// so certificate verification is turned off.
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        let tls = ureq::tls::TlsConfig::builder()
            .disable_verification(true)
            .build();
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(REQUEST_TIMEOUT))
            .http_status_as_error(false)
            .tls_config(tls)
            .build();
        Self {
            agent: config.into(),
        }
    }

    fn finish(
        url: &str,
        result: Result<ureq::http::Response<ureq::Body>, ureq::Error>,
    ) -> SonarResult<HttpResponse> {
        let mut resp = result.map_err(|e| map_ureq_error(url, e))?;
        let status = resp.status().as_u16();
        let body = resp
            .body_mut()
            .read_to_string()
            .map_err(|e| map_ureq_error(url, e))?;
        Ok(HttpResponse { status, body })
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn get(&self, url: &str) -> SonarResult<HttpResponse> {
        Self::finish(url, self.agent.get(url).call())
    }

    fn put(&self, url: &str) -> SonarResult<HttpResponse> {
        Self::finish(url, self.agent.put(url).send_empty())
    }
}

fn map_ureq_error(url: &str, err: ureq::Error) -> SonarError {
    match err {
        ureq::Error::Timeout(_) => SonarError::Timeout {
            url: url.to_string(),
        },
        other => SonarError::Network {
            url: url.to_string(),
            message: other.to_string(),
        },
    }
}
