//! Request and response shapes shared by every client variant

use crate::error::{ApiError, ApiResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Query parameters, keyed by name
pub type Params = BTreeMap<String, Value>;

/// Header map, keyed by header name
pub type Headers = BTreeMap<String, String>;

/// HTTP method for a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `DELETE`
    Delete,
    /// `PATCH`
    Patch,
    /// `HEAD`
    Head,
    /// `OPTIONS`
    Options,
}

impl HttpMethod {
    /// Wire name of the method
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => Self::GET,
            HttpMethod::Post => Self::POST,
            HttpMethod::Put => Self::PUT,
            HttpMethod::Delete => Self::DELETE,
            HttpMethod::Patch => Self::PATCH,
            HttpMethod::Head => Self::HEAD,
            HttpMethod::Options => Self::OPTIONS,
        }
    }
}

/// Insert headers into `target`, replacing existing names case-insensitively
pub(crate) fn merge_headers(target: &mut Headers, headers: Headers) {
    for (name, value) in headers {
        target.retain(|existing, _| !existing.eq_ignore_ascii_case(&name));
        target.insert(name, value);
    }
}

/// One outgoing call
///
/// Fields are read-only; interceptors derive new descriptors through the
/// consuming `with_*` methods.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestDescriptor {
    url: String,
    method: HttpMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    params: Option<Params>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    headers: Option<Headers>,
    #[serde(skip_serializing_if = "Option::is_none")]
    timeout: Option<Duration>,
    #[serde(rename = "baseURL", skip_serializing_if = "Option::is_none")]
    base_url: Option<String>,
}

impl RequestDescriptor {
    /// Create a descriptor for `method url`
    pub fn new(url: impl Into<String>, method: HttpMethod) -> Self {
        Self {
            url: url.into(),
            method,
            params: None,
            data: None,
            headers: None,
            timeout: None,
            base_url: None,
        }
    }

    /// Request URL, absolute or relative to the base URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// HTTP method
    pub fn method(&self) -> HttpMethod {
        self.method
    }

    /// Query parameters
    pub fn params(&self) -> Option<&Params> {
        self.params.as_ref()
    }

    /// JSON body payload
    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    /// Per-request header overrides
    pub fn headers(&self) -> Option<&Headers> {
        self.headers.as_ref()
    }

    /// Per-request timeout override
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Per-request base URL override
    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    /// Replace the query parameters
    #[must_use]
    pub fn with_params(mut self, params: Params) -> Self {
        self.params = Some(params);
        self
    }

    /// Replace the body payload
    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Set a single header override, keeping the others
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let headers = self.headers.get_or_insert_with(Headers::new);
        merge_headers(headers, Headers::from([(name.into(), value.into())]));
        self
    }

    /// Set the timeout override
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the base URL override
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Apply partial overrides; every field set in `overrides` wins
    #[must_use]
    pub fn apply(mut self, overrides: Option<RequestOverrides>) -> Self {
        let Some(overrides) = overrides else {
            return self;
        };
        if let Some(url) = overrides.url {
            self.url = url;
        }
        if let Some(method) = overrides.method {
            self.method = method;
        }
        if overrides.params.is_some() {
            self.params = overrides.params;
        }
        if overrides.data.is_some() {
            self.data = overrides.data;
        }
        if overrides.headers.is_some() {
            self.headers = overrides.headers;
        }
        if overrides.timeout.is_some() {
            self.timeout = overrides.timeout;
        }
        if overrides.base_url.is_some() {
            self.base_url = overrides.base_url;
        }
        self
    }
}

/// Partial request settings accepted by the verb helpers
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOverrides {
    /// Replacement URL
    pub url: Option<String>,
    /// Replacement method
    pub method: Option<HttpMethod>,
    /// Replacement query parameters
    pub params: Option<Params>,
    /// Replacement body
    pub data: Option<Value>,
    /// Header overrides, merged over the client defaults at dispatch
    pub headers: Option<Headers>,
    /// Timeout for this request only
    pub timeout: Option<Duration>,
    /// Base URL for this request only
    pub base_url: Option<String>,
}

impl RequestOverrides {
    /// Builder-style method to override headers
    #[must_use]
    pub fn headers(mut self, headers: Headers) -> Self {
        self.headers = Some(headers);
        self
    }

    /// Builder-style method to override the timeout
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builder-style method to override the base URL
    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }
}

/// What the transport received, kept for advanced inspection
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    /// HTTP status code
    pub status: u16,
    /// Canonical reason phrase, possibly empty
    pub status_text: String,
    /// Response headers
    pub headers: Headers,
    /// Final URL after redirects
    pub url: String,
    /// Raw body bytes
    pub body: Vec<u8>,
}

impl TransportResponse {
    /// Body as JSON; empty bodies are `null`, non-JSON bodies a string
    pub fn body_value(&self) -> Value {
        if self.body.iter().all(u8::is_ascii_whitespace) {
            return Value::Null;
        }
        serde_json::from_slice(&self.body)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&self.body).into_owned()))
    }

    /// Check for a 2xx status
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A completed call
#[derive(Debug, Clone)]
pub struct ResponseEnvelope<T> {
    data: T,
    status: u16,
    status_text: String,
    headers: Headers,
    raw: Option<Arc<TransportResponse>>,
}

impl<T> ResponseEnvelope<T> {
    /// Envelope without an underlying transport response
    pub fn new(data: T, status: u16, status_text: impl Into<String>, headers: Headers) -> Self {
        Self {
            data,
            status,
            status_text: status_text.into(),
            headers,
            raw: None,
        }
    }

    /// Decoded body
    pub fn data(&self) -> &T {
        &self.data
    }

    /// HTTP status code
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Reason phrase
    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    /// Response headers
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Look up a response header by name, ignoring case
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// The transport response this envelope was built from
    pub fn raw(&self) -> Option<&TransportResponse> {
        self.raw.as_deref()
    }

    /// Take the decoded body
    pub fn into_data(self) -> T {
        self.data
    }

    /// Derive an envelope with a different body
    #[must_use]
    pub fn with_data<U>(self, data: U) -> ResponseEnvelope<U> {
        ResponseEnvelope {
            data,
            status: self.status,
            status_text: self.status_text,
            headers: self.headers,
            raw: self.raw,
        }
    }

    /// Derive an envelope with an added or replaced header
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        merge_headers(&mut self.headers, Headers::from([(name.into(), value.into())]));
        self
    }
}

impl ResponseEnvelope<Value> {
    /// Build the untyped envelope for a transport response
    pub fn from_transport(response: TransportResponse) -> Self {
        Self {
            data: response.body_value(),
            status: response.status,
            status_text: response.status_text.clone(),
            headers: response.headers.clone(),
            raw: Some(Arc::new(response)),
        }
    }

    /// Decode the body into `T`
    pub fn decode<T: DeserializeOwned>(self) -> ApiResult<ResponseEnvelope<T>> {
        let data = serde_json::from_value(self.data.clone()).map_err(ApiError::decode)?;
        Ok(self.with_data(data))
    }
}
