//! Lightweight client: single attempt, no interceptor pipeline

use super::HttpClient;
use crate::config::{ClientOptions, HttpClientConfig, MINIMAL_DEFAULT_TIMEOUT};
use crate::dispatch::dispatch;
use crate::error::ApiResult;
use crate::interceptor::Interceptors;
use crate::transport::{ReqwestTransport, Transport};
use crate::types::{Headers, RequestDescriptor, ResponseEnvelope};
use serde::de::DeserializeOwned;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tracing::{debug, instrument};

const CLIENT_NAME: &str = "Minimal";

/// HTTP client that sends each request exactly once
///
/// Interceptor registrations are accepted and logged but never invoked.
pub struct MinimalClient {
    options: RwLock<ClientOptions>,
    transport: Arc<dyn Transport>,
}

impl MinimalClient {
    /// Create a client that sends requests with `reqwest`
    pub fn new(config: HttpClientConfig) -> ApiResult<Self> {
        let transport = ReqwestTransport::new()?;
        Self::with_transport(&config, Arc::new(transport))
    }

    /// Create a client on top of a custom transport
    pub fn with_transport(
        config: &HttpClientConfig,
        transport: Arc<dyn Transport>,
    ) -> ApiResult<Self> {
        config.validate()?;
        let options = config.client_options(MINIMAL_DEFAULT_TIMEOUT);
        debug!(
            base_url = options.base_url.as_deref().unwrap_or_default(),
            timeout_ms = options.timeout.as_millis(),
            "Created minimal client"
        );
        Ok(Self {
            options: RwLock::new(options),
            transport,
        })
    }

    fn update_options(&self, update: impl FnOnce(&mut ClientOptions)) {
        let mut options = self.options.write().unwrap_or_else(PoisonError::into_inner);
        update(&mut *options);
    }
}

impl HttpClient for MinimalClient {
    #[instrument(skip(self, descriptor), fields(method = %descriptor.method(), url = %descriptor.url()))]
    async fn request<T: DeserializeOwned>(
        &self,
        descriptor: RequestDescriptor,
    ) -> ApiResult<ResponseEnvelope<T>> {
        let options = self.config();
        dispatch(self.transport.as_ref(), &options, &descriptor)
            .await?
            .decode()
    }

    fn set_base_url(&self, base_url: &str) {
        let base_url = Some(base_url.to_string()).filter(|url| !url.is_empty());
        self.update_options(|options| options.base_url = base_url);
    }

    fn set_default_headers(&self, headers: Headers) {
        self.update_options(|options| options.merge_headers(headers));
    }

    fn set_timeout(&self, timeout: Duration) {
        self.update_options(|options| options.timeout = timeout);
    }

    fn config(&self) -> ClientOptions {
        self.options
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn interceptors(&self) -> Interceptors<'_> {
        Interceptors::acknowledged(CLIENT_NAME)
    }
}
