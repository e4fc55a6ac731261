//! Retrying HTTP GET client shared by the crawler and the source adapters.

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use magedocs_shared::{DocsError, HttpConfig, Result};

/// Per-request retry policy and extra headers.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Extra attempts after the first failure.
    pub retries: u32,
    /// Linear backoff base: attempt `n` waits `backoff * n`.
    pub backoff: Duration,
    pub headers: Vec<(String, String)>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            retries: 3,
            backoff: Duration::from_millis(500),
            headers: Vec::new(),
        }
    }
}

impl FetchOptions {
    pub fn from_config(config: &HttpConfig) -> Self {
        Self {
            retries: config.retries,
            backoff: Duration::from_millis(config.backoff_ms),
            headers: Vec::new(),
        }
    }

    /// Add a header to every request made with these options.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

// ---------------------------------------------------------------------------
// HttpClient
// ---------------------------------------------------------------------------

/// Thin wrapper over a shared `reqwest::Client` with retry semantics.
///
/// Transport failures and 5xx responses are retried; any other non-success
/// status fails immediately with [`DocsError::HttpStatus`].
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(timeout)
            .build()
            .map_err(|e| DocsError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }

    pub fn from_config(config: &HttpConfig) -> Result<Self> {
        Self::new(&config.user_agent, Duration::from_secs(config.timeout_secs))
    }

    /// GET `url` and return the response body as text.
    pub async fn get(&self, url: &str, opts: &FetchOptions) -> Result<String> {
        let mut attempt = 0;
        loop {
            match self.try_get(url, opts).await {
                Ok(body) => return Ok(body),
                Err(err) if err.is_transient() && attempt < opts.retries => {
                    attempt += 1;
                    let wait = opts.backoff * attempt;
                    warn!(
                        url,
                        attempt,
                        wait_ms = wait.as_millis() as u64,
                        error = %err,
                        "GET failed, retrying"
                    );
                    tokio::time::sleep(wait).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// GET `url` and decode the body as JSON.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str, opts: &FetchOptions) -> Result<T> {
        let body = self.get(url, opts).await?;
        serde_json::from_str(&body)
            .map_err(|e| DocsError::parse(format!("invalid JSON from {url}: {e}")))
    }

    async fn try_get(&self, url: &str, opts: &FetchOptions) -> Result<String> {
        debug!(url, "GET");

        let mut request = self.client.get(url);
        for (name, value) in &opts.headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request
            .send()
            .await
            .map_err(|e| DocsError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DocsError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| DocsError::Network(format!("{url}: body read failed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fast_options(retries: u32) -> FetchOptions {
        FetchOptions {
            retries,
            backoff: Duration::from_millis(1),
            headers: Vec::new(),
        }
    }

    fn client() -> HttpClient {
        HttpClient::new("magedocs-test/1.0", Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn sends_user_agent_and_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tree"))
            .and(header("user-agent", "magedocs-test/1.0"))
            .and(header("authorization", "Bearer secret"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&server)
            .await;

        let opts = fast_options(0).with_header("authorization", "Bearer secret");
        let body = client()
            .get(&format!("{}/tree", server.uri()), &opts)
            .await
            .unwrap();
        assert_eq!(body, "ok");
    }

    #[tokio::test]
    async fn retries_server_errors_then_succeeds() {
        let server = MockServer::start().await;
        Mock::given(path("/flaky"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(path("/flaky"))
            .respond_with(ResponseTemplate::new(200).set_body_string("recovered"))
            .expect(1)
            .mount(&server)
            .await;

        let body = client()
            .get(&format!("{}/flaky", server.uri()), &fast_options(3))
            .await
            .unwrap();
        assert_eq!(body, "recovered");
    }

    #[tokio::test]
    async fn client_errors_are_not_retried() {
        let server = MockServer::start().await;
        Mock::given(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let err = client()
            .get(&format!("{}/missing", server.uri()), &fast_options(3))
            .await
            .unwrap_err();
        assert!(matches!(err, DocsError::HttpStatus { status: 404, .. }));
    }

    #[tokio::test]
    async fn gives_up_after_retries() {
        let server = MockServer::start().await;
        Mock::given(path("/down"))
            .respond_with(ResponseTemplate::new(500))
            .expect(3)
            .mount(&server)
            .await;

        let err = client()
            .get(&format!("{}/down", server.uri()), &fast_options(2))
            .await
            .unwrap_err();
        assert!(matches!(err, DocsError::HttpStatus { status: 500, .. }));
    }

    #[tokio::test]
    async fn invalid_json_is_a_parse_error() {
        let server = MockServer::start().await;
        Mock::given(path("/json"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
            .mount(&server)
            .await;

        let err = client()
            .get_json::<serde_json::Value>(&format!("{}/json", server.uri()), &fast_options(0))
            .await
            .unwrap_err();
        assert!(matches!(err, DocsError::Parse { .. }));
    }
}
