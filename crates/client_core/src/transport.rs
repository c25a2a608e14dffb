use async_trait::async_trait;
use reqwest::{header, Client};
use shared::protocol::SubmissionPayload;
use thiserror::Error;
use tracing::debug;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("transport unavailable: {0}")]
    Unavailable(String),
    #[error("request failed: {0}")]
    Request(String),
}

/// Status and raw body of an endpoint reply on the JSON path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteReply {
    pub status: u16,
    pub body: String,
}

impl RemoteReply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait PrimaryTransport: Send + Sync {
    /// One JSON POST. Any HTTP status is a reply; only failing to get one is an error.
    async fn send_json(
        &self,
        endpoint: &Url,
        payload: &SubmissionPayload,
    ) -> Result<RemoteReply, TransportError>;
}

#[async_trait]
pub trait FallbackTransport: Send + Sync {
    /// Conventional form post. Returns where the server sent the visitor.
    async fn post_form(
        &self,
        endpoint: &Url,
        payload: &SubmissionPayload,
    ) -> Result<Url, TransportError>;
}

pub struct MissingPrimaryTransport;

#[async_trait]
impl PrimaryTransport for MissingPrimaryTransport {
    async fn send_json(
        &self,
        _endpoint: &Url,
        _payload: &SubmissionPayload,
    ) -> Result<RemoteReply, TransportError> {
        Err(TransportError::Unavailable(
            "asynchronous requests are not supported here".to_string(),
        ))
    }
}

pub struct MissingFallbackTransport;

#[async_trait]
impl FallbackTransport for MissingFallbackTransport {
    async fn post_form(
        &self,
        _endpoint: &Url,
        _payload: &SubmissionPayload,
    ) -> Result<Url, TransportError> {
        Err(TransportError::Unavailable(
            "form post fallback is unavailable".to_string(),
        ))
    }
}

/// Both delivery paths over one reqwest client.
#[derive(Clone)]
pub struct HttpTransport {
    http: Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, TransportError> {
        let http = Client::builder()
            .build()
            .map_err(|err| TransportError::Unavailable(err.to_string()))?;
        Ok(Self { http })
    }

    pub fn with_client(http: Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl PrimaryTransport for HttpTransport {
    async fn send_json(
        &self,
        endpoint: &Url,
        payload: &SubmissionPayload,
    ) -> Result<RemoteReply, TransportError> {
        let res = self
            .http
            .post(endpoint.clone())
            .header(header::ACCEPT, "application/json")
            .json(payload)
            .send()
            .await
            .map_err(|err| TransportError::Request(err.to_string()))?;

        let status = res.status().as_u16();
        // A body we cannot read still leaves a usable status.
        let body = match res.text().await {
            Ok(body) => body,
            Err(err) => {
                debug!(status, error = %err, "contact: reply body unreadable");
                String::new()
            }
        };
        Ok(RemoteReply { status, body })
    }
}

#[async_trait]
impl FallbackTransport for HttpTransport {
    async fn post_form(
        &self,
        endpoint: &Url,
        payload: &SubmissionPayload,
    ) -> Result<Url, TransportError> {
        let res = self
            .http
            .post(endpoint.clone())
            .header(header::ACCEPT, "text/html,application/xhtml+xml")
            .form(payload)
            .send()
            .await
            .map_err(|err| TransportError::Request(err.to_string()))?;
        debug!(
            status = res.status().as_u16(),
            "contact: form post answered"
        );
        Ok(res.url().clone())
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
