//! Single-port HTTP probe against the language server's quota API.

use std::time::Duration;

use serde_json::json;
use thiserror::Error;
use tracing::trace;

use super::types::{ConfigsResponse, QuotaRecord};

/// Fixed service path of the model-config endpoint on the local server
const SERVICE_PATH: &str =
    "/exa.language_server_pb.LanguageServerService/GetClientModelConfigs";

/// Header carrying the CSRF token extracted from the server's command line
const CSRF_HEADER: &str = "x-csrf-token";

const PROTOCOL_HEADER: &str = "connect-protocol-version";
const PROTOCOL_VERSION: &str = "1";

/// Error from a single probe attempt.
///
/// Probe errors are never surfaced individually; the caller moves on to the
/// next candidate port.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Connection failure, timeout, or any other transport-level error
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// The server answered with a non-2xx status
    #[error("unexpected status: {0}")]
    Status(reqwest::StatusCode),

    /// The response body did not match the expected shape
    #[error("malformed response: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Issues authenticated quota requests against candidate ports.
pub struct QuotaProber {
    client: reqwest::Client,
    timeout: Duration,
}

impl QuotaProber {
    /// Create a prober with the given per-request timeout.
    ///
    /// The timeout bounds each individual probe so one unresponsive port
    /// cannot stall a whole refresh interval.
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout,
        }
    }

    /// Probe one candidate port.
    ///
    /// Success is strictly HTTP 2xx with a parseable body. A response with
    /// a missing or null model-config list parses to an empty record list,
    /// distinguishing "server is up, no quota data" from a failed probe.
    /// An empty CSRF token is sent as-is; the server rejects it naturally.
    pub async fn probe(&self, port: u16, csrf_token: &str) -> Result<Vec<QuotaRecord>, ProbeError> {
        let url = format!("http://127.0.0.1:{}{}", port, SERVICE_PATH);

        // Metadata identifies the client for server-side attribution only;
        // it does not affect the response shape.
        let metadata = json!({
            "metadata": {
                "ideName": "antigravity",
                "extensionName": "gravimon",
                "locale": "en",
            }
        });

        trace!(port, "probing quota endpoint");

        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .header(CSRF_HEADER, csrf_token)
            .header(PROTOCOL_HEADER, PROTOCOL_VERSION)
            .json(&metadata)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProbeError::Status(status));
        }

        let body = response.text().await?;
        let parsed: ConfigsResponse = serde_json::from_str(&body)?;
        Ok(parsed.into_records())
    }
}
