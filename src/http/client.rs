//! HTTP client for the data endpoint.

use reqwest::StatusCode;
use thiserror::Error;

use crate::codec::{encode, DataPayload, EncodeError};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("failed to encode payload: {0}")]
    Encode(#[from] EncodeError),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Status and text body of a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientReply {
    pub status: StatusCode,
    pub body: String,
}

/// Posts [`DataPayload`]s to `{base_url}/data`.
#[derive(Debug, Clone)]
pub struct DataClient {
    http: reqwest::Client,
    base_url: String,
}

impl DataClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/data", self.base_url)
    }

    /// Encode `payload` and POST it. Non-2xx statuses are returned, not raised.
    pub async fn post(&self, payload: &DataPayload) -> Result<ClientReply, ClientError> {
        let body = encode(payload)?;
        let response = self
            .http
            .post(self.endpoint())
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        tracing::debug!(status = status.as_u16(), "Data posted");
        Ok(ClientReply { status, body })
    }
}
