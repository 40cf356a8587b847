//! The client contract shared by every variant

mod minimal;
mod rich;

pub use minimal::MinimalClient;
pub use rich::{RichClient, RichClientConfig};

use crate::config::ClientOptions;
use crate::error::ApiResult;
use crate::interceptor::Interceptors;
use crate::types::{Headers, HttpMethod, Params, RequestDescriptor, RequestOverrides, ResponseEnvelope};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

/// Request/response contract of an HTTP client variant
///
/// Every verb helper builds a [`RequestDescriptor`], applies the optional
/// overrides on top of it and routes it through [`HttpClient::request`].
///
/// # Example
///
/// ```rust,no_run
/// use forge_http::prelude::*;
/// use serde_json::{json, Value};
///
/// # async fn demo() -> ApiResult<()> {
/// let client = RichClient::new(HttpClientConfig::new("Rich").with_base_url("https://api.example.com"))?;
/// let params = Params::from([("limit".to_string(), json!(10))]);
/// let users = client.get::<Value>("/users", Some(params), None).await?;
/// println!("{}", users.status());
/// # Ok(())
/// # }
/// ```
#[allow(async_fn_in_trait)]
pub trait HttpClient {
    /// Send a request and decode the response body into `T`
    async fn request<T: DeserializeOwned>(
        &self,
        descriptor: RequestDescriptor,
    ) -> ApiResult<ResponseEnvelope<T>>;

    /// `GET url` with optional query parameters
    async fn get<T: DeserializeOwned>(
        &self,
        url: &str,
        params: Option<Params>,
        overrides: Option<RequestOverrides>,
    ) -> ApiResult<ResponseEnvelope<T>> {
        let mut descriptor = RequestDescriptor::new(url, HttpMethod::Get);
        if let Some(params) = params {
            descriptor = descriptor.with_params(params);
        }
        self.request(descriptor.apply(overrides)).await
    }

    /// `POST url` with an optional body
    async fn post<T: DeserializeOwned>(
        &self,
        url: &str,
        data: Option<Value>,
        overrides: Option<RequestOverrides>,
    ) -> ApiResult<ResponseEnvelope<T>> {
        self.request(with_body(url, HttpMethod::Post, data).apply(overrides))
            .await
    }

    /// `PUT url` with an optional body
    async fn put<T: DeserializeOwned>(
        &self,
        url: &str,
        data: Option<Value>,
        overrides: Option<RequestOverrides>,
    ) -> ApiResult<ResponseEnvelope<T>> {
        self.request(with_body(url, HttpMethod::Put, data).apply(overrides))
            .await
    }

    /// `DELETE url`
    async fn delete<T: DeserializeOwned>(
        &self,
        url: &str,
        overrides: Option<RequestOverrides>,
    ) -> ApiResult<ResponseEnvelope<T>> {
        self.request(RequestDescriptor::new(url, HttpMethod::Delete).apply(overrides))
            .await
    }

    /// `PATCH url` with an optional body
    async fn patch<T: DeserializeOwned>(
        &self,
        url: &str,
        data: Option<Value>,
        overrides: Option<RequestOverrides>,
    ) -> ApiResult<ResponseEnvelope<T>> {
        self.request(with_body(url, HttpMethod::Patch, data).apply(overrides))
            .await
    }

    /// Replace the base URL for subsequent requests
    fn set_base_url(&self, base_url: &str);

    /// Merge default headers; new names overwrite, others are kept
    fn set_default_headers(&self, headers: Headers);

    /// Replace the timeout for subsequent requests
    fn set_timeout(&self, timeout: Duration);

    /// Copy of the current runtime options
    fn config(&self) -> ClientOptions;

    /// Interceptor registration surface
    fn interceptors(&self) -> Interceptors<'_>;
}

fn with_body(url: &str, method: HttpMethod, data: Option<Value>) -> RequestDescriptor {
    let descriptor = RequestDescriptor::new(url, method);
    match data {
        Some(data) => descriptor.with_data(data),
        None => descriptor,
    }
}
