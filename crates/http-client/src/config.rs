//! Client configuration
//!
//! [`HttpClientConfig`] is the declarative shape read from configuration files;
//! [`ClientOptions`] is the runtime state each client instance owns.

use crate::error::{ApiError, ApiResult};
use crate::factory::ClientType;
use crate::types::{merge_headers, Headers};
use forge_core::retry::RetryConfig;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

/// Default timeout of the rich client
pub const RICH_DEFAULT_TIMEOUT: Duration = Duration::from_millis(10_000);

/// Default timeout of the minimal client
pub const MINIMAL_DEFAULT_TIMEOUT: Duration = Duration::from_millis(5_000);

/// Default number of retries of the rich client
pub const DEFAULT_RETRY_COUNT: u32 = 3;

/// Default delay between retries of the rich client
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1_000);

/// Runtime options owned by one client instance
#[derive(Debug, Clone, PartialEq)]
pub struct ClientOptions {
    /// Base URL prepended to relative request URLs
    pub base_url: Option<String>,
    /// Request timeout
    pub timeout: Duration,
    /// Default request headers
    pub headers: Headers,
}

impl ClientOptions {
    /// Options with the given timeout and a JSON content type
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            base_url: None,
            timeout,
            headers: default_headers(),
        }
    }

    /// Merge headers: new names overwrite, others are preserved
    pub fn merge_headers(&mut self, headers: Headers) {
        merge_headers(&mut self.headers, headers);
    }
}

fn default_headers() -> Headers {
    Headers::from([("Content-Type".to_string(), "application/json".to_string())])
}

/// Interceptor toggles, accepted for compatibility with existing config files
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterceptorToggles {
    /// Request interceptors enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<bool>,
    /// Response interceptors enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<bool>,
}

/// Retry settings of the rich client
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorHandlingConfig {
    /// Retry failed dispatches
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry: Option<bool>,
    /// Retries after the first attempt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_count: Option<u32>,
    /// Delay between retries in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_delay: Option<u64>,
}

/// Declarative client configuration
///
/// `type` stays a plain string so that unknown variants are reported by the
/// factory rather than failing deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpClientConfig {
    /// Client variant name
    #[serde(rename = "type")]
    pub client_type: String,
    /// Base URL, `http://` or `https://`
    #[serde(rename = "baseURL", default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Timeout in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    /// Default request headers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<Headers>,
    /// Interceptor toggles
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interceptors: Option<InterceptorToggles>,
    /// Retry policy of the rich client
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_handling: Option<ErrorHandlingConfig>,
    /// Free-form settings passed through untouched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_config: Option<Map<String, Value>>,
}

impl HttpClientConfig {
    /// Minimal configuration naming only the variant
    pub fn new(client_type: impl Into<String>) -> Self {
        Self {
            client_type: client_type.into(),
            base_url: None,
            timeout: None,
            headers: None,
            interceptors: None,
            error_handling: None,
            custom_config: None,
        }
    }

    /// Fully populated configuration used when scaffolding a project
    pub fn recommended(client_type: ClientType) -> Self {
        Self {
            client_type: client_type.as_str().to_string(),
            base_url: Some("https://api.example.com".to_string()),
            timeout: Some(10_000),
            headers: Some(default_headers()),
            interceptors: Some(InterceptorToggles {
                request: Some(true),
                response: Some(true),
            }),
            error_handling: Some(ErrorHandlingConfig {
                retry: Some(true),
                retry_count: Some(DEFAULT_RETRY_COUNT),
                retry_delay: Some(1_000),
            }),
            custom_config: None,
        }
    }

    /// Builder-style method to set base URL
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Builder-style method to set the timeout in milliseconds
    #[must_use]
    pub fn with_timeout_ms(mut self, timeout: u64) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builder-style method to add a header
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let headers = self.headers.get_or_insert_with(Headers::new);
        merge_headers(headers, Headers::from([(name.into(), value.into())]));
        self
    }

    /// Builder-style method to set retry behavior
    #[must_use]
    pub fn with_retry(mut self, enabled: bool, count: u32, delay_ms: u64) -> Self {
        self.error_handling = Some(ErrorHandlingConfig {
            retry: Some(enabled),
            retry_count: Some(count),
            retry_delay: Some(delay_ms),
        });
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> ApiResult<()> {
        if let Some(url) = &self.base_url {
            if !url.is_empty() && !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ApiError::configuration(
                    "baseURL must start with http:// or https://",
                ));
            }
        }

        if self.timeout == Some(0) {
            return Err(ApiError::configuration("timeout cannot be zero"));
        }

        Ok(())
    }

    /// Runtime options for the given variant, starting from its defaults
    pub fn client_options(&self, default_timeout: Duration) -> ClientOptions {
        let mut options = ClientOptions::with_timeout(default_timeout);
        options.base_url = self.base_url.clone().filter(|url| !url.is_empty());
        if let Some(timeout) = self.timeout {
            options.timeout = Duration::from_millis(timeout);
        }
        if let Some(headers) = &self.headers {
            options.merge_headers(headers.clone());
        }
        options
    }

    /// Retry policy of the rich client, starting from its defaults
    pub fn retry_config(&self) -> RetryConfig {
        let handling = self.error_handling.clone().unwrap_or_default();
        RetryConfig {
            enabled: handling.retry.unwrap_or(true),
            retry_count: handling.retry_count.unwrap_or(DEFAULT_RETRY_COUNT),
            retry_delay: handling
                .retry_delay
                .map_or(DEFAULT_RETRY_DELAY, Duration::from_millis),
            ..RetryConfig::default()
        }
    }
}
