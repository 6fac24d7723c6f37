//! `reqwest` transport for page fetches.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use pager_cache::PageFetcher;
use pager_core::{FetchFailure, FetchResponse};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Invalid header {name}: {reason}")]
    InvalidHeader { name: String, reason: String },
    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpConfig {
    pub request_timeout_ms: u64,
    /// Extra headers sent with every page request (auth tokens, accept, ...).
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: 10_000,
            headers: BTreeMap::new(),
        }
    }
}

impl HttpConfig {
    pub fn with_timeout_ms(mut self, request_timeout_ms: u64) -> Self {
        self.request_timeout_ms = request_timeout_ms;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn validate(&self) -> Result<(), HttpError> {
        if self.request_timeout_ms == 0 {
            return Err(HttpError::InvalidValue {
                field: "request_timeout_ms",
                reason: "must be > 0".to_string(),
            });
        }
        Ok(())
    }
}

/// Fetches page URLs with a shared `reqwest::Client`.
///
/// Any HTTP status is returned as a response; only transport-level problems
/// (DNS, connect, timeout, body read) become a [`FetchFailure`].
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    headers: HeaderMap,
}

impl HttpFetcher {
    pub fn new(config: &HttpConfig) -> Result<Self, HttpError> {
        config.validate()?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;
        let headers = build_headers(&config.headers)?;
        Ok(Self { client, headers })
    }
}

fn build_headers(headers: &BTreeMap<String, String>) -> Result<HeaderMap, HttpError> {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| HttpError::InvalidHeader {
                name: name.clone(),
                reason: e.to_string(),
            })?;
        let header_value = HeaderValue::from_str(value).map_err(|e| HttpError::InvalidHeader {
            name: name.clone(),
            reason: e.to_string(),
        })?;
        map.insert(header_name, header_value);
    }
    Ok(map)
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResponse, FetchFailure> {
        tracing::debug!(url, "Fetching page");
        let response = self
            .client
            .get(url)
            .headers(self.headers.clone())
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(url, error = %e, "Page request failed");
                FetchFailure::transport(e.to_string())
            })?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| FetchFailure::transport(format!("failed to read body: {}", e)))?;

        tracing::debug!(url, status, bytes = body.len(), "Page response received");
        Ok(FetchResponse {
            status,
            headers,
            body: body.to_vec(),
        })
    }
}
