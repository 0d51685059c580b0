//! HTTP client with tracing and a bounded request timeout.
//!
//! Wraps a reqwest [`Client`] so that every request:
//! - carries the crate user agent and `Accept: application/json`
//! - is bounded by the client's timeout
//! - maps transport failures into [`ClientError`]

use reqwest::{header, Client, Response};
use std::time::Duration;
use tracing::{debug, instrument};

use crate::error::ClientError;

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// User agent string for keepstat.
const USER_AGENT: &str = concat!("keepstat/", env!("CARGO_PKG_VERSION"));

// ============================================================================
// HTTP Client
// ============================================================================

/// HTTP client wrapper with tracing and timeout classification.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: Client,
    timeout: Duration,
}

impl HttpClient {
    /// Creates a new HTTP client with the default timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Connection`] if the TLS backend cannot be
    /// initialized.
    pub fn new() -> Result<Self, ClientError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Creates a new HTTP client with a custom timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Connection`] if the TLS backend cannot be
    /// initialized.
    pub fn with_timeout(timeout: Duration) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ClientError::Connection(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            inner: client,
            timeout,
        })
    }

    /// The per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Performs a GET request with a bearer token.
    ///
    /// Any HTTP status is returned as a response; only transport failures
    /// become errors.
    #[instrument(skip(self, token), fields(url = %url))]
    pub async fn get_with_bearer(&self, url: &str, token: &str) -> Result<Response, ClientError> {
        debug!("GET request with bearer auth");

        let response = self
            .inner
            .get(url)
            .bearer_auth(token)
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| self.classify(&e))?;

        debug!(status = %response.status(), "Response received");
        Ok(response)
    }

    /// Reads a response body as text.
    ///
    /// The body read shares the request's timeout, so a server that stalls
    /// mid-body yields [`ClientError::Timeout`].
    pub async fn read_text(&self, response: Response) -> Result<String, ClientError> {
        response.text().await.map_err(|e| self.classify(&e))
    }

    fn classify(&self, err: &reqwest::Error) -> ClientError {
        let classified = ClientError::from_transport(err, self.timeout);
        debug!(error = %err, kind = %classified.kind(), "Request failed");
        classified
    }
}
