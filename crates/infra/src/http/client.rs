//! HTTP transport with timeout and transient-failure retry.
//!
//! Retries cover transport-level failures only (connect errors,
//! timeouts, 5xx). Protocol-level handling such as 401 refresh and 429
//! backoff lives in the remote client, which understands the remote
//! service's semantics.

use std::time::Duration;

use ledgersync_domain::{LedgerSyncError, Result};
use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response};
use tracing::debug;

/// Knobs for the transport layer. The defaults suit production; tests
/// shrink the backoff and attempt budget.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Per-request timeout.
    pub timeout: Duration,
    /// Total attempts per `send`, the initial try included.
    pub max_attempts: usize,
    /// Delay before the first re-attempt; doubles per retry.
    pub base_backoff: Duration,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_attempts: 3,
            base_backoff: Duration::from_millis(200),
        }
    }
}

/// Thin retrying wrapper around a shared reqwest client.
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
    config: HttpClientConfig,
}

impl HttpClient {
    pub fn new(config: HttpClientConfig) -> Result<Self> {
        let client = ReqwestClient::builder()
            .timeout(config.timeout)
            .no_proxy()
            .build()
            .map_err(|err| LedgerSyncError::Network(format!("http client build failed: {err}")))?;
        Ok(Self { client, config })
    }

    /// Create a request builder using the underlying reqwest client.
    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.client.request(method, url)
    }

    /// Execute the request, re-attempting transient failures.
    ///
    /// The builder's body must be cloneable (buffered, not streamed) so
    /// the request can be replayed.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let budget = self.config.max_attempts.max(1);
        let mut attempt = 1usize;

        loop {
            let request = builder
                .try_clone()
                .ok_or_else(|| {
                    LedgerSyncError::Internal(
                        "request body cannot be cloned; buffer the body to enable retries".into(),
                    )
                })?
                .build()
                .map_err(|err| LedgerSyncError::Network(format!("invalid request: {err}")))?;
            let url = request.url().clone();

            let outcome = self.client.execute(request).await;
            match outcome {
                Ok(response) if response.status().is_server_error() && attempt < budget => {
                    debug!(attempt, %url, status = %response.status(), "server error, retrying");
                }
                Ok(response) => {
                    debug!(attempt, %url, status = %response.status(), "request completed");
                    return Ok(response);
                }
                Err(err) if attempt < budget && is_transient(&err) => {
                    debug!(attempt, %url, error = %err, "transient failure, retrying");
                }
                Err(err) => {
                    return Err(LedgerSyncError::Network(format!("http request failed: {err}")));
                }
            }

            tokio::time::sleep(self.backoff(attempt)).await;
            attempt += 1;
        }
    }

    /// Exponential backoff for the nth retry, shift clamped against
    /// overflow.
    fn backoff(&self, retry_number: usize) -> Duration {
        let shift = retry_number.saturating_sub(1).min(8) as u32;
        self.config.base_backoff.saturating_mul(1 << shift)
    }
}

fn is_transient(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_request() || err.is_connect()
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use reqwest::{Method, StatusCode};
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn test_client(max_attempts: usize) -> HttpClient {
        HttpClient::new(HttpClientConfig {
            max_attempts,
            base_backoff: Duration::from_millis(10),
            ..HttpClientConfig::default()
        })
        .expect("http client")
    }

    #[tokio::test]
    async fn returns_successful_response_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(3);
        let response =
            client.send(client.request(Method::GET, server.uri())).await.expect("response");

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn retries_server_errors_until_success() {
        let server = MockServer::start().await;
        let attempts = Arc::new(AtomicUsize::new(0));
        let attempts_clone = attempts.clone();
        Mock::given(method("GET"))
            .respond_with(move |_req: &wiremock::Request| -> ResponseTemplate {
                let current = attempts_clone.fetch_add(1, Ordering::SeqCst);
                if current < 2 {
                    ResponseTemplate::new(500)
                } else {
                    ResponseTemplate::new(200)
                }
            })
            .expect(3)
            .mount(&server)
            .await;

        let client = test_client(3);
        let response =
            client.send(client.request(Method::GET, server.uri())).await.expect("response");

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn does_not_retry_client_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(3);
        let response =
            client.send(client.request(Method::GET, server.uri())).await.expect("response");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn maps_connection_failure_to_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener); // release the port so requests fail with ECONNREFUSED
        let url = format!("http://{addr}");

        let client = test_client(2);
        let result = client.send(client.request(Method::GET, &url)).await;
        match result {
            Err(LedgerSyncError::Network(msg)) => {
                assert!(msg.to_lowercase().contains("http"));
            }
            other => panic!("expected network error, got {other:?}"),
        }
    }
}
