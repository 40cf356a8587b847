//! Interceptor pipeline
//!
//! Three ordered chains per client:
//!
//! | Chain | Runs | Receives |
//! |-------|------|----------|
//! | request | before every dispatch attempt | the output of the previous interceptor |
//! | response | once, after a successful dispatch | the output of the previous interceptor |
//! | error | once, after the final failure | the error left by the previous handler |
//!
//! Any async closure with the right signature is an interceptor. Registrations
//! are permanent for the lifetime of the client.

use crate::error::{ApiError, ApiResult, ErrorKind};
use crate::types::{RequestDescriptor, ResponseEnvelope};
use async_trait::async_trait;
use serde_json::Value;
use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info};

/// Transforms a request before dispatch
#[async_trait]
pub trait RequestInterceptor: Send + Sync {
    /// Return the request to send, or an error to abort it
    async fn on_request(&self, request: RequestDescriptor) -> ApiResult<RequestDescriptor>;
}

/// Transforms a response after a successful dispatch
#[async_trait]
pub trait ResponseInterceptor: Send + Sync {
    /// Return the response handed to the caller, or an error
    async fn on_response(
        &self,
        response: ResponseEnvelope<Value>,
    ) -> ApiResult<ResponseEnvelope<Value>>;
}

/// Handles a failed request
#[async_trait]
pub trait ErrorInterceptor: Send + Sync {
    /// Recover with a response, or pass an error on to the next handler
    async fn on_error(&self, error: ApiError) -> ApiResult<ResponseEnvelope<Value>>;
}

#[async_trait]
impl<F, Fut> RequestInterceptor for F
where
    F: Fn(RequestDescriptor) -> Fut + Send + Sync,
    Fut: Future<Output = ApiResult<RequestDescriptor>> + Send + 'static,
{
    async fn on_request(&self, request: RequestDescriptor) -> ApiResult<RequestDescriptor> {
        self(request).await
    }
}

#[async_trait]
impl<F, Fut> ResponseInterceptor for F
where
    F: Fn(ResponseEnvelope<Value>) -> Fut + Send + Sync,
    Fut: Future<Output = ApiResult<ResponseEnvelope<Value>>> + Send + 'static,
{
    async fn on_response(
        &self,
        response: ResponseEnvelope<Value>,
    ) -> ApiResult<ResponseEnvelope<Value>> {
        self(response).await
    }
}

#[async_trait]
impl<F, Fut> ErrorInterceptor for F
where
    F: Fn(ApiError) -> Fut + Send + Sync,
    Fut: Future<Output = ApiResult<ResponseEnvelope<Value>>> + Send + 'static,
{
    async fn on_error(&self, error: ApiError) -> ApiResult<ResponseEnvelope<Value>> {
        self(error).await
    }
}

/// Registered interceptors of one client instance
#[derive(Default)]
pub(crate) struct InterceptorChain {
    request: RwLock<Vec<Arc<dyn RequestInterceptor>>>,
    response: RwLock<Vec<Arc<dyn ResponseInterceptor>>>,
    error: RwLock<Vec<Arc<dyn ErrorInterceptor>>>,
}

fn snapshot<T: ?Sized>(list: &RwLock<Vec<Arc<T>>>) -> Vec<Arc<T>> {
    list.read().unwrap_or_else(PoisonError::into_inner).clone()
}

fn append<T: ?Sized>(list: &RwLock<Vec<Arc<T>>>, item: Arc<T>) {
    list.write().unwrap_or_else(PoisonError::into_inner).push(item);
}

impl InterceptorChain {
    /// Run request interceptors in registration order
    pub(crate) async fn run_request(
        &self,
        mut request: RequestDescriptor,
    ) -> ApiResult<RequestDescriptor> {
        for interceptor in snapshot(&self.request) {
            let original = request.clone();
            request = interceptor.on_request(request).await.map_err(|e| {
                let error = if e.kind == ErrorKind::Interceptor {
                    e
                } else {
                    ApiError::interceptor(format!("Request interceptor rejected: {}", e.message))
                        .with_source(e)
                };
                if error.request.is_some() {
                    error
                } else {
                    error.with_request(original)
                }
            })?;
        }
        Ok(request)
    }

    /// Run response interceptors in registration order
    pub(crate) async fn run_response(
        &self,
        mut response: ResponseEnvelope<Value>,
    ) -> ApiResult<ResponseEnvelope<Value>> {
        for interceptor in snapshot(&self.response) {
            response = interceptor.on_response(response).await?;
        }
        Ok(response)
    }

    /// Run error handlers in registration order until one recovers
    pub(crate) async fn run_error(&self, mut error: ApiError) -> ApiResult<ResponseEnvelope<Value>> {
        for handler in snapshot(&self.error) {
            match handler.on_error(error).await {
                Ok(response) => {
                    debug!(status = response.status(), "Error interceptor recovered the request");
                    return Ok(response);
                }
                Err(next) => error = next,
            }
        }
        Err(error)
    }

    #[cfg(test)]
    pub(crate) fn counts(&self) -> (usize, usize, usize) {
        (
            snapshot(&self.request).len(),
            snapshot(&self.response).len(),
            snapshot(&self.error).len(),
        )
    }
}

/// Where registrations go
#[derive(Clone, Copy)]
enum Registry<'a> {
    /// Stored and run on every request
    Enforced(&'a InterceptorChain),
    /// Acknowledged with a log event only
    Acknowledged { client: &'static str },
}

/// Interceptor registration surface of a client
pub struct Interceptors<'a> {
    /// Request interceptor registration
    pub request: RequestInterceptors<'a>,
    /// Response interceptor registration
    pub response: ResponseInterceptors<'a>,
}

impl<'a> Interceptors<'a> {
    pub(crate) fn enforced(chain: &'a InterceptorChain) -> Self {
        Self::with_registry(Registry::Enforced(chain))
    }

    pub(crate) fn acknowledged(client: &'static str) -> Self {
        Self::with_registry(Registry::Acknowledged { client })
    }

    fn with_registry(registry: Registry<'a>) -> Self {
        Self {
            request: RequestInterceptors { registry },
            response: ResponseInterceptors { registry },
        }
    }
}

fn register_error(registry: Registry<'_>, handler: Arc<dyn ErrorInterceptor>) {
    match registry {
        Registry::Enforced(chain) => append(&chain.error, handler),
        Registry::Acknowledged { client } => {
            info!(client, "Error interceptor registered (not enforced by this client)");
        }
    }
}

/// Registers request interceptors
pub struct RequestInterceptors<'a> {
    registry: Registry<'a>,
}

impl RequestInterceptors<'_> {
    /// Append a request interceptor
    pub fn register(&self, on_fulfilled: impl RequestInterceptor + 'static) {
        match self.registry {
            Registry::Enforced(chain) => append(&chain.request, Arc::new(on_fulfilled)),
            Registry::Acknowledged { client } => {
                info!(client, "Request interceptor registered (not enforced by this client)");
            }
        }
    }

    /// Append a request interceptor and an error handler
    pub fn register_with_rejection(
        &self,
        on_fulfilled: impl RequestInterceptor + 'static,
        on_rejected: impl ErrorInterceptor + 'static,
    ) {
        self.register(on_fulfilled);
        self.on_rejected(on_rejected);
    }

    /// Append an error handler only
    pub fn on_rejected(&self, on_rejected: impl ErrorInterceptor + 'static) {
        register_error(self.registry, Arc::new(on_rejected));
    }
}

/// Registers response interceptors
pub struct ResponseInterceptors<'a> {
    registry: Registry<'a>,
}

impl ResponseInterceptors<'_> {
    /// Append a response interceptor
    pub fn register(&self, on_fulfilled: impl ResponseInterceptor + 'static) {
        match self.registry {
            Registry::Enforced(chain) => append(&chain.response, Arc::new(on_fulfilled)),
            Registry::Acknowledged { client } => {
                info!(client, "Response interceptor registered (not enforced by this client)");
            }
        }
    }

    /// Append a response interceptor and an error handler
    pub fn register_with_rejection(
        &self,
        on_fulfilled: impl ResponseInterceptor + 'static,
        on_rejected: impl ErrorInterceptor + 'static,
    ) {
        self.register(on_fulfilled);
        self.on_rejected(on_rejected);
    }

    /// Append an error handler only
    pub fn on_rejected(&self, on_rejected: impl ErrorInterceptor + 'static) {
        register_error(self.registry, Arc::new(on_rejected));
    }
}
