//! Request preparation and dispatch shared by both client variants

use crate::config::ClientOptions;
use crate::error::{ApiError, ApiResult};
use crate::transport::{PreparedRequest, Transport};
use crate::types::{merge_headers, Params, RequestDescriptor, ResponseEnvelope};
use serde_json::Value;
use std::time::Instant;
use tracing::debug;
use uuid::Uuid;

/// Request correlation ID header
pub const X_REQUEST_ID: &str = "X-Request-ID";

/// Join a request URL onto a base URL; absolute URLs are kept as-is
pub fn resolve_url(base_url: Option<&str>, url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        return url.to_string();
    }
    match base_url.filter(|base| !base.is_empty()) {
        Some(base) if url.is_empty() => base.to_string(),
        Some(base) => format!(
            "{}/{}",
            base.trim_end_matches('/'),
            url.trim_start_matches('/')
        ),
        None => url.to_string(),
    }
}

/// Flatten query parameters into name/value pairs
///
/// Arrays repeat the name, `null` values are dropped, and objects are sent as
/// JSON text.
fn query_pairs(params: Option<&Params>) -> Vec<(String, String)> {
    let Some(params) = params else {
        return Vec::new();
    };

    let mut pairs = Vec::new();
    for (name, value) in params {
        match value {
            Value::Null => {}
            Value::Array(items) => {
                pairs.extend(items.iter().filter_map(|item| {
                    scalar_to_string(item).map(|text| (name.clone(), text))
                }));
            }
            other => {
                if let Some(text) = scalar_to_string(other) {
                    pairs.push((name.clone(), text));
                }
            }
        }
    }
    pairs
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

/// Resolve a descriptor against a snapshot of the client options
pub(crate) fn prepare(options: &ClientOptions, descriptor: &RequestDescriptor) -> PreparedRequest {
    let base_url = descriptor.base_url().or(options.base_url.as_deref());

    let mut headers = options.headers.clone();
    if let Some(overrides) = descriptor.headers() {
        merge_headers(&mut headers, overrides.clone());
    }
    if !headers.keys().any(|name| name.eq_ignore_ascii_case(X_REQUEST_ID)) {
        headers.insert(X_REQUEST_ID.to_string(), Uuid::new_v4().to_string());
    }

    PreparedRequest {
        method: descriptor.method(),
        url: resolve_url(base_url, descriptor.url()),
        query: query_pairs(descriptor.params()),
        headers,
        body: descriptor.data().cloned(),
        timeout: descriptor.timeout().unwrap_or(options.timeout),
    }
}

/// Send one request and classify the outcome by status
pub(crate) async fn dispatch(
    transport: &dyn Transport,
    options: &ClientOptions,
    descriptor: &RequestDescriptor,
) -> ApiResult<ResponseEnvelope<Value>> {
    let prepared = prepare(options, descriptor);
    let request_id = prepared.header(X_REQUEST_ID).unwrap_or_default().to_string();
    let start = Instant::now();

    debug!(
        request_id = %request_id,
        method = %prepared.method,
        url = %prepared.url,
        "Dispatching request"
    );

    let response = transport
        .send(prepared)
        .await
        .map_err(|e| e.with_request(descriptor.clone()))?;

    debug!(
        request_id = %request_id,
        status = response.status,
        elapsed_ms = start.elapsed().as_millis(),
        "Request completed"
    );

    let success = response.is_success();
    let envelope = ResponseEnvelope::from_transport(response);
    if success {
        Ok(envelope)
    } else {
        Err(ApiError::status(envelope).with_request(descriptor.clone()))
    }
}
