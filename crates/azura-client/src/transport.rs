//! HTTP seam between the provider and the network.
//!
//! The provider only ever needs "GET this URL, give me status and body", so
//! that is the whole trait. Tests script it with a canned stub; production
//! uses reqwest.

use crate::error::TransportError;
use std::future::Future;
use std::time::Duration;

/// Identifies this client to the upstream server.
pub const USER_AGENT: &str = "azura-history/0.1";

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

pub trait Transport {
    /// Perform a GET with a per-request timeout. Errors only for
    /// connection-level failures; HTTP error statuses come back as a
    /// normal [`HttpResponse`].
    fn get(
        &self,
        url: &str,
        timeout: Duration,
    ) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send;
}

/// Production transport backed by a shared [`reqwest::Client`].
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Transport for ReqwestTransport {
    async fn get(&self, url: &str, timeout: Duration) -> Result<HttpResponse, TransportError> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| TransportError(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError(e.to_string()))?;

        Ok(HttpResponse { status, body })
    }
}
