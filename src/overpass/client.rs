//! Blocking Overpass query client.

use reqwest::blocking::Client;
use reqwest::StatusCode;
use thiserror::Error;
use tracing::debug;

use super::model::OverpassResponse;

#[derive(Debug, Error)]
pub enum OverpassError {
    /// The service gave up on the query (HTTP 504). Transient.
    #[error("overpass gateway timeout")]
    GatewayTimeout,
    /// The service is shedding load (HTTP 429). Transient.
    #[error("overpass rate limited")]
    RateLimited,
    #[error("overpass returned status {0}")]
    Status(StatusCode),
    #[error("overpass request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("gave up after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: Box<OverpassError>,
    },
}

impl OverpassError {
    /// Transient overload conditions are the only errors worth retrying;
    /// everything else aborts the run.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::GatewayTimeout | Self::RateLimited)
    }
}

/// Issues Overpass QL queries against a single endpoint. No state is kept
/// between calls beyond the connection pool inside the HTTP client.
pub struct OverpassClient {
    http: Client,
    endpoint: String,
}

impl OverpassClient {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, OverpassError> {
        // No client-side timeout: long queries carry their own [timeout:...]
        // directive and the service enforces it.
        let http = Client::builder()
            .user_agent(concat!("anschrift/", env!("CARGO_PKG_VERSION")))
            .timeout(None)
            .build()?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }

    /// Run a single Overpass QL query and parse the JSON response.
    pub fn query(&self, query: &str) -> Result<OverpassResponse, OverpassError> {
        debug!(endpoint = %self.endpoint, "issuing overpass query");
        let response = self
            .http
            .post(&self.endpoint)
            .form(&[("data", query)])
            .send()?;

        match response.status() {
            StatusCode::GATEWAY_TIMEOUT => Err(OverpassError::GatewayTimeout),
            StatusCode::TOO_MANY_REQUESTS => Err(OverpassError::RateLimited),
            status if !status.is_success() => Err(OverpassError::Status(status)),
            _ => Ok(response.json()?),
        }
    }
}
