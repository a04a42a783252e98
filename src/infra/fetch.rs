//! Outbound HTTP for export documents.

use crate::app::error::SyncError;
use serde_json::Value as JsonValue;
use std::time::Duration;

#[derive(Clone)]
pub struct ExportClient {
    http: reqwest::Client,
}

impl ExportClient {
    /// `timeout = None` waits on a stalled source indefinitely.
    pub fn new(timeout: Option<Duration>) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
        })
    }

    /// GETs `url` and decodes the body as JSON. Any non-2xx status is an error.
    pub async fn fetch_json(&self, url: &str) -> Result<JsonValue, SyncError> {
        let transport = |source| SyncError::Transport {
            url: url.to_string(),
            source,
        };
        let response = self
            .http
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(transport)?;
        serde_json::from_slice(&body).map_err(|e| SyncError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}
