//! Client selection from declarative configuration

use crate::client::{HttpClient, MinimalClient, RichClient};
use crate::config::{ClientOptions, HttpClientConfig};
use crate::error::{ApiError, ApiResult};
use crate::interceptor::Interceptors;
use crate::transport::{ReqwestTransport, Transport};
use crate::types::{Headers, RequestDescriptor, ResponseEnvelope};
use serde::de::DeserializeOwned;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Available client variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientType {
    /// Interceptors, retry with backoff
    Rich,
    /// Single attempt, interceptors acknowledged only
    Minimal,
}

impl ClientType {
    /// Every supported variant
    pub fn all() -> &'static [ClientType] {
        &[Self::Rich, Self::Minimal]
    }

    /// Canonical name
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rich => "Rich",
            Self::Minimal => "Minimal",
        }
    }

    /// One-line description for help output
    pub fn description(self) -> &'static str {
        match self {
            Self::Rich => "interceptors, automatic retry, 10s default timeout",
            Self::Minimal => "single attempt, no interceptors, 5s default timeout",
        }
    }

    /// File name of the generator adapter for this variant
    pub fn adapter_file(self) -> &'static str {
        match self {
            Self::Rich => "rich-client.ts",
            Self::Minimal => "minimal-client.ts",
        }
    }
}

impl fmt::Display for ClientType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClientType {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Rich" | "MyRequest" => Ok(Self::Rich),
            "Minimal" | "MyMiniRequest" => Ok(Self::Minimal),
            other => Err(ApiError::unsupported_client_type(other)),
        }
    }
}

/// Canonical names of every supported variant
pub fn available_client_types() -> Vec<&'static str> {
    ClientType::all().iter().map(|t| t.as_str()).collect()
}

/// Check whether a variant name is supported, legacy names included
pub fn is_client_type_supported(client_type: &str) -> bool {
    client_type.parse::<ClientType>().is_ok()
}

/// A client of either variant
pub enum Client {
    /// See [`RichClient`]
    Rich(RichClient),
    /// See [`MinimalClient`]
    Minimal(MinimalClient),
}

impl Client {
    /// Variant of this client
    pub fn client_type(&self) -> ClientType {
        match self {
            Self::Rich(_) => ClientType::Rich,
            Self::Minimal(_) => ClientType::Minimal,
        }
    }
}

impl HttpClient for Client {
    async fn request<T: DeserializeOwned>(
        &self,
        descriptor: RequestDescriptor,
    ) -> ApiResult<ResponseEnvelope<T>> {
        match self {
            Self::Rich(client) => client.request(descriptor).await,
            Self::Minimal(client) => client.request(descriptor).await,
        }
    }

    fn set_base_url(&self, base_url: &str) {
        match self {
            Self::Rich(client) => client.set_base_url(base_url),
            Self::Minimal(client) => client.set_base_url(base_url),
        }
    }

    fn set_default_headers(&self, headers: Headers) {
        match self {
            Self::Rich(client) => client.set_default_headers(headers),
            Self::Minimal(client) => client.set_default_headers(headers),
        }
    }

    fn set_timeout(&self, timeout: Duration) {
        match self {
            Self::Rich(client) => client.set_timeout(timeout),
            Self::Minimal(client) => client.set_timeout(timeout),
        }
    }

    fn config(&self) -> ClientOptions {
        match self {
            Self::Rich(client) => client.config(),
            Self::Minimal(client) => client.config(),
        }
    }

    fn interceptors(&self) -> Interceptors<'_> {
        match self {
            Self::Rich(client) => client.interceptors(),
            Self::Minimal(client) => client.interceptors(),
        }
    }
}

/// Build the client named by `config.type`, sending with `reqwest`
pub fn create_client(config: &HttpClientConfig) -> ApiResult<Client> {
    let client_type = config.client_type.parse::<ClientType>()?;
    let transport = ReqwestTransport::new()?;
    build(client_type, config, Arc::new(transport))
}

/// Build the client named by `config.type` on top of a custom transport
pub fn create_client_with_transport(
    config: &HttpClientConfig,
    transport: Arc<dyn Transport>,
) -> ApiResult<Client> {
    let client_type = config.client_type.parse::<ClientType>()?;
    build(client_type, config, transport)
}

fn build(
    client_type: ClientType,
    config: &HttpClientConfig,
    transport: Arc<dyn Transport>,
) -> ApiResult<Client> {
    info!(client = %client_type, "Creating HTTP client");
    match client_type {
        ClientType::Rich => RichClient::with_transport(config, transport).map(Client::Rich),
        ClientType::Minimal => MinimalClient::with_transport(config, transport).map(Client::Minimal),
    }
}
