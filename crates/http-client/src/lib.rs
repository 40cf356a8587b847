//! Configuration-driven HTTP clients for orval-forge
//!
//! Generated API code calls into one of two interchangeable client variants
//! selected by configuration:
//!
//! - **Rich**: request/response/error interceptors and automatic retry of
//!   every dispatch failure (transport errors, timeouts, non-2xx responses)
//! - **Minimal**: a single attempt per request; interceptor registrations are
//!   acknowledged but not run
//!
//! Both implement [`HttpClient`] and dispatch through a [`Transport`], backed by
//! `reqwest` unless a custom one is injected.
//!
//! # Example
//!
//! ```rust,no_run
//! use forge_http::prelude::*;
//! use serde_json::{json, Value};
//!
//! #[tokio::main]
//! async fn main() -> ApiResult<()> {
//!     let config = HttpClientConfig::new("Rich").with_base_url("https://api.example.com");
//!     let client = create_client(&config)?;
//!
//!     client.interceptors().request.register(|req: RequestDescriptor| async move {
//!         Ok::<_, ApiError>(req.with_header("Authorization", "Bearer token"))
//!     });
//!
//!     let created = client
//!         .post::<Value>("/users", Some(json!({ "name": "Alice" })), None)
//!         .await?;
//!     println!("{}", created.status());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod factory;
pub mod interceptor;
pub mod transport;
pub mod types;

pub use client::{HttpClient, MinimalClient, RichClient, RichClientConfig};
pub use config::{ClientOptions, HttpClientConfig};
pub use error::{ApiError, ApiResult, ErrorKind};
pub use factory::{
    available_client_types, create_client, create_client_with_transport,
    is_client_type_supported, Client, ClientType,
};
pub use transport::{ReqwestTransport, Transport};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::client::{HttpClient, MinimalClient, RichClient};
    pub use crate::config::{ClientOptions, HttpClientConfig};
    pub use crate::error::{ApiError, ApiResult, ErrorKind};
    pub use crate::factory::{create_client, Client, ClientType};
    pub use crate::types::{
        Headers, HttpMethod, Params, RequestDescriptor, RequestOverrides, ResponseEnvelope,
    };
}
