//! Wire transport
//!
//! Clients hand a fully resolved [`PreparedRequest`] to a [`Transport`] and get
//! back whatever the server said, without status classification. The default
//! transport wraps `reqwest`.

use crate::error::{ApiError, ApiResult};
use crate::types::{Headers, HttpMethod, TransportResponse};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// User agent sent by the default transport
const USER_AGENT: &str = concat!("orval-forge/", env!("CARGO_PKG_VERSION"));

/// A request with URL, headers and timeout fully resolved
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRequest {
    /// HTTP method
    pub method: HttpMethod,
    /// Absolute URL without the query string
    pub url: String,
    /// Query string pairs in encoding order
    pub query: Vec<(String, String)>,
    /// Client defaults merged with the request overrides
    pub headers: Headers,
    /// JSON body
    pub body: Option<Value>,
    /// Effective timeout
    pub timeout: Duration,
}

impl PreparedRequest {
    /// Look up a header by name, ignoring case
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Sends prepared requests over the wire
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one request; any received response is `Ok`, whatever its status
    async fn send(&self, request: PreparedRequest) -> ApiResult<TransportResponse>;
}

/// `reqwest`-backed transport
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    inner: Client,
}

impl ReqwestTransport {
    /// Create a transport with a fresh connection pool
    pub fn new() -> ApiResult<Self> {
        let inner = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(ApiError::from)?;
        Ok(Self { inner })
    }

    /// Wrap an existing `reqwest` client
    pub fn from_client(inner: Client) -> Self {
        Self { inner }
    }
}

fn is_json(request: &PreparedRequest) -> bool {
    request
        .header("content-type")
        .is_none_or(|value| value.contains("json"))
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: PreparedRequest) -> ApiResult<TransportResponse> {
        let json_body = is_json(&request);
        let mut builder = self
            .inner
            .request(request.method.into(), &request.url)
            .timeout(request.timeout);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder = match request.body {
            Some(Value::String(text)) if !json_body => builder.body(text),
            Some(body) => builder.json(&body),
            None => builder,
        };

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::timeout(request.timeout).with_source(e)
            } else {
                ApiError::from(e)
            }
        })?;

        let status = response.status();
        let url = response.url().to_string();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::timeout(request.timeout).with_source(e)
            } else {
                ApiError::from(e)
            }
        })?;

        debug!(status = status.as_u16(), bytes = body.len(), "Received response");

        Ok(TransportResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            url,
            body: body.to_vec(),
        })
    }
}
