use std::time::Duration;

use pslang_domain::constants::{DEFAULT_HTTP_TIMEOUT_SECS, USER_AGENT};
use pslang_domain::PsLangError;
use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::errors::InfraError;

/// Longest response-body excerpt carried in error messages.
const MAX_ERROR_BODY_CHARS: usize = 200;

/// HTTP client with timeout support and bounded retry for idempotent reads.
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
    max_attempts: usize,
    base_backoff: Duration,
}

impl HttpClient {
    /// Start building a new HTTP client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Convenience constructor with default configuration.
    pub fn new() -> Result<Self, PsLangError> {
        Self::builder().build()
    }

    /// Create a request builder using the underlying reqwest client.
    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.client.request(method, url)
    }

    /// Execute a request.
    ///
    /// `GET` and `HEAD` requests are retried on transport errors and 5xx
    /// responses; every other method is sent exactly once.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, PsLangError> {
        let request = builder.build().map_err(into_domain)?;
        let retryable = matches!(*request.method(), Method::GET | Method::HEAD);
        let attempts = if retryable { self.max_attempts.max(1) } else { 1 };

        let method = request.method().clone();
        let url = request.url().clone();
        let mut pending = Some(request);

        for attempt in 0..attempts {
            let request = match pending.take() {
                Some(request) => request,
                None => continue,
            };
            let has_next = attempt + 1 < attempts;
            // Keep a copy for the next attempt; GET/HEAD bodies are empty.
            if has_next {
                pending = request.try_clone();
            }

            debug!(attempt = attempt + 1, %method, %url, "sending HTTP request");

            match self.client.execute(request).await {
                Ok(response) => {
                    let status = response.status();
                    debug!(attempt = attempt + 1, %method, %url, %status, "received HTTP response");

                    if status.is_server_error() && has_next && pending.is_some() {
                        self.sleep_with_backoff(attempt + 1).await;
                        continue;
                    }

                    return Ok(response);
                }
                Err(err) => {
                    debug!(attempt = attempt + 1, %method, %url, error = %err, "HTTP request failed");

                    if has_next && pending.is_some() && should_retry_error(&err) {
                        self.sleep_with_backoff(attempt + 1).await;
                        continue;
                    }

                    return Err(into_domain(err));
                }
            }
        }

        Err(PsLangError::Internal("http client exhausted retries without producing a result".into()))
    }

    fn backoff_delay(&self, retry_number: usize) -> Duration {
        let shift = retry_number.saturating_sub(1).min(8) as u32;
        let multiplier = 1u32 << shift;
        self.base_backoff.saturating_mul(multiplier)
    }

    async fn sleep_with_backoff(&self, retry_number: usize) {
        let delay = self.backoff_delay(retry_number);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    max_attempts: usize,
    base_backoff: Duration,
    user_agent: String,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            max_attempts: 3,
            base_backoff: Duration::from_millis(200),
            user_agent: USER_AGENT.to_string(),
        }
    }
}

impl HttpClientBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Configure the total number of attempts (initial try + retries).
    pub fn max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn base_backoff(mut self, backoff: Duration) -> Self {
        self.base_backoff = backoff;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    pub fn build(self) -> Result<HttpClient, PsLangError> {
        let client = ReqwestClient::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent)
            .no_proxy()
            .build()
            .map_err(into_domain)?;

        Ok(HttpClient {
            client,
            max_attempts: self.max_attempts.max(1),
            base_backoff: self.base_backoff,
        })
    }
}

/// Default mapping of a non-success response to a domain error.
pub fn status_error(status: StatusCode, body: &str) -> PsLangError {
    let excerpt: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
    let message = format!("HTTP {}: {}", status.as_u16(), excerpt.trim());
    match status {
        StatusCode::UNAUTHORIZED => PsLangError::Unauthorized(message),
        StatusCode::NOT_FOUND => PsLangError::NotFound(message),
        _ => PsLangError::Upstream(message),
    }
}

/// Decode a successful JSON response, mapping other statuses with
/// [`status_error`].
pub async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, PsLangError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(status_error(status, &body));
    }
    response.json::<T>().await.map_err(into_domain)
}

fn into_domain(err: reqwest::Error) -> PsLangError {
    let infra: InfraError = err.into();
    PsLangError::from(infra)
}

fn should_retry_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_request() || err.is_connect()
}
