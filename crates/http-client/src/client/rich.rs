//! Full-featured client: interceptor pipeline and retry with backoff

use super::HttpClient;
use crate::config::{ClientOptions, HttpClientConfig, RICH_DEFAULT_TIMEOUT};
use crate::dispatch::dispatch;
use crate::error::{ApiError, ApiResult};
use crate::interceptor::{InterceptorChain, Interceptors};
use crate::transport::{ReqwestTransport, Transport};
use crate::types::{Headers, RequestDescriptor, ResponseEnvelope};
use forge_core::retry::{retry, RetryConfig};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Complete runtime configuration of a [`RichClient`]
#[derive(Debug, Clone, PartialEq)]
pub struct RichClientConfig {
    /// Base URL, timeout and default headers
    pub options: ClientOptions,
    /// Retry policy applied to retryable failures
    pub retry: RetryConfig,
}

impl Default for RichClientConfig {
    fn default() -> Self {
        Self {
            options: ClientOptions::with_timeout(RICH_DEFAULT_TIMEOUT),
            retry: RetryConfig::default(),
        }
    }
}

/// HTTP client with interceptors and automatic retry
///
/// Request interceptors run before every attempt. Every dispatch failure,
/// non-2xx responses included, is retried according to the retry policy.
/// Response interceptors run once on the final successful response; error
/// interceptors run once on the final failure and may recover it.
pub struct RichClient {
    settings: RwLock<RichClientConfig>,
    interceptors: InterceptorChain,
    transport: Arc<dyn Transport>,
}

impl RichClient {
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
        let settings = RichClientConfig {
            options: config.client_options(RICH_DEFAULT_TIMEOUT),
            retry: config.retry_config(),
        };
        debug!(
            base_url = settings.options.base_url.as_deref().unwrap_or_default(),
            timeout_ms = settings.options.timeout.as_millis(),
            retry = settings.retry.enabled,
            "Created rich client"
        );
        Ok(Self {
            settings: RwLock::new(settings),
            interceptors: InterceptorChain::default(),
            transport,
        })
    }

    /// Copy of the full configuration
    pub fn settings(&self) -> RichClientConfig {
        self.settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the full configuration; in-flight requests keep their snapshot
    pub fn reset_config(&self, config: RichClientConfig) {
        *self.settings.write().unwrap_or_else(PoisonError::into_inner) = config;
    }

    /// Copy of the retry policy
    pub fn retry_config(&self) -> RetryConfig {
        self.settings().retry
    }

    /// Replace the retry policy
    pub fn set_retry(&self, retry: RetryConfig) {
        self.settings
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retry = retry;
    }

    fn update_options(&self, update: impl FnOnce(&mut ClientOptions)) {
        let mut settings = self.settings.write().unwrap_or_else(PoisonError::into_inner);
        update(&mut settings.options);
    }

    /// One attempt: request interceptors, then dispatch
    async fn attempt(&self, descriptor: &RequestDescriptor) -> ApiResult<ResponseEnvelope<Value>> {
        let options = self.config();
        let request = self.interceptors.run_request(descriptor.clone()).await?;
        dispatch(self.transport.as_ref(), &options, &request).await
    }

    async fn execute(&self, descriptor: RequestDescriptor) -> ApiResult<ResponseEnvelope<Value>> {
        let policy = self.retry_config();
        let outcome = match retry(&policy, ApiError::is_retryable, |_| self.attempt(&descriptor)).await {
            Ok(result) => {
                if result.attempts > 1 {
                    debug!(
                        attempts = result.attempts,
                        elapsed_ms = result.total_duration.as_millis(),
                        "Request succeeded after retry"
                    );
                }
                self.interceptors.run_response(result.value).await
            }
            Err(e) => Err(e),
        };

        match outcome {
            Ok(response) => Ok(response),
            Err(error) => {
                warn!(kind = %error.kind, status = ?error.status, "Request failed: {}", error);
                self.interceptors.run_error(error).await
            }
        }
    }
}

impl HttpClient for RichClient {
    #[instrument(skip(self, descriptor), fields(method = %descriptor.method(), url = %descriptor.url()))]
    async fn request<T: DeserializeOwned>(
        &self,
        descriptor: RequestDescriptor,
    ) -> ApiResult<ResponseEnvelope<T>> {
        self.execute(descriptor).await?.decode()
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
        self.settings().options
    }

    fn interceptors(&self) -> Interceptors<'_> {
        Interceptors::enforced(&self.interceptors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::transport::PreparedRequest;
    use crate::types::{HttpMethod, Params, TransportResponse};
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Replays a fixed list of outcomes and records what it was sent
    struct ScriptedTransport {
        script: Mutex<VecDeque<ApiResult<TransportResponse>>>,
        sent: Mutex<Vec<PreparedRequest>>,
    }

    impl ScriptedTransport {
        fn new(script: Vec<ApiResult<TransportResponse>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                sent: Mutex::new(Vec::new()),
            })
        }

        fn sent(&self) -> Vec<PreparedRequest> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn send(&self, request: PreparedRequest) -> ApiResult<TransportResponse> {
            self.sent.lock().unwrap().push(request);
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ApiError::transport("script exhausted")))
        }
    }

    fn reply(status: u16, body: &str) -> ApiResult<TransportResponse> {
        Ok(TransportResponse {
            status,
            status_text: String::new(),
            headers: Headers::from([("content-type".to_string(), "application/json".to_string())]),
            url: "https://api.test".to_string(),
            body: body.as_bytes().to_vec(),
        })
    }

    fn client(transport: Arc<ScriptedTransport>) -> RichClient {
        let config = HttpClientConfig::new("Rich")
            .with_base_url("https://api.test")
            .with_retry(true, 3, 1);
        RichClient::with_transport(&config, transport).unwrap()
    }

    #[tokio::test]
    async fn test_get_sends_params_and_decodes() {
        let transport = ScriptedTransport::new(vec![reply(200, r#"[{"id":1}]"#)]);
        let client = client(transport.clone());
        let params = Params::from([("limit".to_string(), json!(10))]);

        let response = client.get::<Vec<Value>>("/users", Some(params), None).await.unwrap();

        assert_eq!(response.status(), 200);
        assert_eq!(response.data().len(), 1);
        let sent = transport.sent();
        assert_eq!(sent[0].url, "https://api.test/users");
        assert_eq!(sent[0].query, vec![("limit".to_string(), "10".to_string())]);
        assert_eq!(sent[0].timeout, RICH_DEFAULT_TIMEOUT);
    }

    #[tokio::test]
    async fn test_always_failing_request_makes_count_plus_one_attempts() {
        let transport = ScriptedTransport::new(vec![
            Err(ApiError::transport("down")),
            Err(ApiError::transport("down")),
            Err(ApiError::transport("down")),
            Err(ApiError::transport("down")),
        ]);
        let client = client(transport.clone());

        let err = client.get::<Value>("/flaky", None, None).await.unwrap_err();

        assert_eq!(err.kind, ErrorKind::Transport);
        assert_eq!(transport.sent().len(), 4);
    }

    #[tokio::test]
    async fn test_retry_disabled_makes_one_attempt() {
        let transport = ScriptedTransport::new(vec![reply(503, "{}"), reply(200, "{}")]);
        let client = client(transport.clone());
        client.set_retry(RetryConfig::no_retry());

        let err = client.get::<Value>("/", None, None).await.unwrap_err();

        assert_eq!(err.status, Some(503));
        assert_eq!(transport.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_client_errors_are_retried_until_exhausted() {
        let transport = ScriptedTransport::new(
            (0..4).map(|_| reply(404, r#"{"error":"missing"}"#)).collect(),
        );
        let client = client(transport.clone());

        let err = client.get::<Value>("/missing", None, None).await.unwrap_err();

        assert_eq!(err.kind, ErrorKind::Status);
        assert_eq!(err.status, Some(404));
        assert_eq!(err.request.as_ref().map(|r| r.url()), Some("/missing"));
        assert_eq!(transport.sent().len(), 4);
    }

    #[tokio::test]
    async fn test_client_error_then_success() {
        let transport = ScriptedTransport::new(vec![reply(409, "{}"), reply(200, r#"{"id":7}"#)]);
        let client = client(transport.clone());

        let response = client.put::<Value>("/users/7", Some(json!({})), None).await.unwrap();

        assert_eq!(response.data()["id"], 7);
        assert_eq!(transport.sent().len(), 2);
    }

    #[tokio::test]
    async fn test_success_on_second_attempt_runs_response_interceptors_once() {
        let transport = ScriptedTransport::new(vec![reply(500, "{}"), reply(200, r#"{"ok":true}"#)]);
        let client = client(transport.clone());
        let request_runs = Arc::new(AtomicUsize::new(0));
        let response_runs = Arc::new(AtomicUsize::new(0));

        let counter = request_runs.clone();
        client.interceptors().request.register(move |req: RequestDescriptor| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, ApiError>(req)
            }
        });
        let counter = response_runs.clone();
        client.interceptors().response.register(move |res: ResponseEnvelope<Value>| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, ApiError>(res)
            }
        });

        let response = client.get::<Value>("/", None, None).await.unwrap();

        assert_eq!(response.data()["ok"], true);
        assert_eq!(request_runs.load(Ordering::SeqCst), 2);
        assert_eq!(response_runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_request_interceptor_output_is_dispatched() {
        let transport = ScriptedTransport::new(vec![reply(200, "{}")]);
        let client = client(transport.clone());
        client.interceptors().request.register(|req: RequestDescriptor| async move {
            Ok::<_, ApiError>(req.with_header("Authorization", "Bearer token"))
        });

        client.post::<Value>("/users", Some(json!({ "name": "Alice" })), None).await.unwrap();

        let sent = transport.sent();
        assert_eq!(sent[0].method, HttpMethod::Post);
        assert_eq!(sent[0].header("authorization"), Some("Bearer token"));
        assert_eq!(sent[0].body, Some(json!({ "name": "Alice" })));
    }

    #[tokio::test]
    async fn test_request_interceptor_failure_skips_dispatch() {
        let transport = ScriptedTransport::new(vec![reply(200, "{}")]);
        let client = client(transport.clone());
        client.interceptors().request.register(|_req: RequestDescriptor| async move {
            Err::<RequestDescriptor, _>(ApiError::configuration("no token"))
        });

        let err = client.get::<Value>("/", None, None).await.unwrap_err();

        assert_eq!(err.kind, ErrorKind::Interceptor);
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn test_error_interceptor_recovers() {
        let transport = ScriptedTransport::new((0..4).map(|_| reply(401, "{}")).collect());
        let client = client(transport.clone());
        client.interceptors().response.on_rejected(|e: ApiError| async move {
            if e.status == Some(401) {
                Ok(ResponseEnvelope::new(json!({ "guest": true }), 200, "OK", Headers::new()))
            } else {
                Err(e)
            }
        });

        let response = client.get::<Value>("/me", None, None).await.unwrap();

        assert_eq!(response.data()["guest"], true);
        assert_eq!(transport.sent().len(), 4);
    }

    #[tokio::test]
    async fn test_decode_failure() {
        let transport = ScriptedTransport::new(vec![reply(200, r#"{"id":"not-a-number"}"#)]);
        let client = client(transport);

        #[derive(Debug, serde::Deserialize)]
        struct User {
            #[allow(dead_code)]
            id: u64,
        }

        let err = client.get::<User>("/users/1", None, None).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Decode);
    }

    #[tokio::test]
    async fn test_config_mutators_and_defensive_copy() {
        let transport = ScriptedTransport::new(vec![reply(200, "{}")]);
        let client = client(transport.clone());

        let mut copy = client.config();
        copy.timeout = Duration::from_secs(99);
        assert_eq!(client.config().timeout, RICH_DEFAULT_TIMEOUT);

        client.set_base_url("https://other.test");
        client.set_timeout(Duration::from_millis(1500));
        client.set_default_headers(Headers::from([("X-Api-Key".to_string(), "k".to_string())]));

        let config = client.config();
        assert_eq!(config.base_url.as_deref(), Some("https://other.test"));
        assert_eq!(config.timeout, Duration::from_millis(1500));
        assert_eq!(config.headers.get("X-Api-Key").map(String::as_str), Some("k"));
        assert_eq!(config.headers.get("Content-Type").map(String::as_str), Some("application/json"));

        client.get::<Value>("/ping", None, None).await.unwrap();
        let sent = transport.sent();
        assert_eq!(sent[0].url, "https://other.test/ping");
        assert_eq!(sent[0].timeout, Duration::from_millis(1500));
    }

    #[tokio::test]
    async fn test_clients_from_one_config_are_independent() {
        let config = HttpClientConfig::new("Rich")
            .with_base_url("https://api.test")
            .with_retry(true, 3, 1);
        let first_transport = ScriptedTransport::new(vec![reply(200, "{}")]);
        let second_transport = ScriptedTransport::new(vec![reply(200, "{}")]);
        let first = RichClient::with_transport(&config, first_transport.clone()).unwrap();
        let second = RichClient::with_transport(&config, second_transport.clone()).unwrap();
        let before = second.config();

        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();
        first.interceptors().request.register(move |req: RequestDescriptor| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, ApiError>(req.with_header("X-First", "1"))
            }
        });
        first.set_base_url("https://first.test");
        first.set_timeout(Duration::from_secs(3));
        first.set_default_headers(Headers::from([("X-Tenant".to_string(), "a".to_string())]));

        assert_eq!(second.config(), before);
        second.get::<Value>("/ping", None, None).await.unwrap();

        assert_eq!(runs.load(Ordering::SeqCst), 0);
        let sent = second_transport.sent();
        assert_eq!(sent[0].url, "https://api.test/ping");
        assert_eq!(sent[0].timeout, RICH_DEFAULT_TIMEOUT);
        assert_eq!(sent[0].header("x-first"), None);
        assert_eq!(sent[0].header("x-tenant"), None);
        assert!(first_transport.sent().is_empty());
    }

    /// Holds the first request inside `send` until released
    #[derive(Default)]
    struct GatedTransport {
        entered: tokio::sync::Notify,
        release: tokio::sync::Notify,
        urls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Transport for GatedTransport {
        async fn send(&self, request: PreparedRequest) -> ApiResult<TransportResponse> {
            let first = {
                let mut urls = self.urls.lock().unwrap();
                urls.push(request.url.clone());
                urls.len() == 1
            };
            if first {
                self.entered.notify_one();
                self.release.notified().await;
            }
            reply(200, "{}")
        }
    }

    #[tokio::test]
    async fn test_in_flight_request_keeps_its_base_url() {
        let transport = Arc::new(GatedTransport::default());
        let config = HttpClientConfig::new("Rich").with_base_url("https://old.test");
        let client = RichClient::with_transport(&config, transport.clone()).unwrap();

        let in_flight = client.get::<Value>("/first", None, None);
        let reconfigure = async {
            transport.entered.notified().await;
            client.set_base_url("https://new.test");
            transport.release.notify_one();
            client.get::<Value>("/second", None, None).await
        };
        let (first, second) = tokio::join!(in_flight, reconfigure);

        assert_eq!(first.unwrap().status(), 200);
        assert_eq!(second.unwrap().status(), 200);
        assert_eq!(
            *transport.urls.lock().unwrap(),
            vec!["https://old.test/first".to_string(), "https://new.test/second".to_string()]
        );
    }

    #[test]
    fn test_reset_config_replaces_everything() {
        let client = client(ScriptedTransport::new(Vec::new()));
        client.reset_config(RichClientConfig::default());

        let settings = client.settings();
        assert!(settings.options.base_url.is_none());
        assert_eq!(settings.retry.retry_delay, Duration::from_millis(1000));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = HttpClientConfig::new("Rich").with_base_url("api.test");
        let result = RichClient::with_transport(&config, ScriptedTransport::new(Vec::new()));
        assert!(result.is_err());
    }
}
