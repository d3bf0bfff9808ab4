//! Paced, retrying HTTP transport.
//!
//! Every outbound call, GraphQL and REST alike, goes through
//! [`ThrottledTransport`]: a minimum wall-clock interval between calls,
//! Retry-After-driven handling of 429s, exponential backoff on 5xx and
//! network failures, and a shared attempt budget. REST backoff sleeps carry
//! ±25% jitter; GraphQL keeps the exact schedule. All waiting goes through
//! `tokio::time` so tests can drive the clock.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use rand::Rng;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use thiserror::Error;
use tokio::time::{self, Instant};

/// Per-attempt timeout applied by the production sender.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Wait applied to a 429 without a usable Retry-After header.
const DEFAULT_RETRY_AFTER: f64 = 1.0;

/// Backoff ceiling for server errors and network failures.
const MAX_BACKOFF: Duration = Duration::from_secs(8);

/// Call-limit ratio above which a short breather is inserted.
const CALL_LIMIT_SOFT_CEILING: f64 = 0.85;

/// One outbound request, independent of the sending backend.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl HttpRequest {
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self { method: Method::GET, url: url.into(), query: Vec::new(), body: None }
    }

    #[must_use]
    pub fn post(url: impl Into<String>, body: Value) -> Self {
        Self { method: Method::POST, url: url.into(), query: Vec::new(), body: Some(body) }
    }

    #[must_use]
    pub fn delete(url: impl Into<String>) -> Self {
        Self { method: Method::DELETE, url: url.into(), query: Vec::new(), body: None }
    }

    /// Append one query pair.
    #[must_use]
    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }
}

/// The slice of a response the retry policy and the client need.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    /// Parsed `Retry-After` header, in seconds.
    pub retry_after: Option<f64>,
    /// Parsed `X-Shopify-Shop-Api-Call-Limit` header as `(used, cap)`.
    pub call_limit: Option<(u32, u32)>,
    pub body: String,
}

/// Failure before any HTTP status was obtained.
#[derive(Debug, Error)]
pub enum SendError {
    #[error("request timed out")]
    Timeout,

    #[error("connection error: {0}")]
    Connection(String),
}

/// Sending backend seam. Production uses [`ReqwestSend`]; tests swap in a
/// scripted fake.
#[allow(async_fn_in_trait)] // engine futures never leave the driver task
pub trait HttpSend {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, SendError>;
}

/// [`HttpSend`] over a shared [`reqwest::Client`].
#[derive(Debug, Clone)]
pub struct ReqwestSend {
    client: reqwest::Client,
    access_token: SecretString,
}

impl ReqwestSend {
    /// Build the production sender with the given per-attempt timeout.
    pub fn new(access_token: SecretString, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, access_token })
    }
}

impl HttpSend for ReqwestSend {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, SendError> {
        let mut builder = self
            .client
            .request(request.method.clone(), &request.url)
            .header("X-Shopify-Access-Token", self.access_token.expose_secret());
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(classify_reqwest_error)?;
        let status = response.status();
        let retry_after = parse_retry_after(response.headers());
        let call_limit = parse_call_limit(response.headers());
        let body = response
            .text()
            .await
            .map_err(|err| SendError::Connection(err.to_string()))?;

        Ok(HttpResponse { status, retry_after, call_limit, body })
    }
}

fn classify_reqwest_error(err: reqwest::Error) -> SendError {
    if err.is_timeout() {
        SendError::Timeout
    } else {
        SendError::Connection(err.to_string())
    }
}

fn parse_retry_after(headers: &HeaderMap) -> Option<f64> {
    headers.get(RETRY_AFTER)?.to_str().ok()?.trim().parse().ok()
}

fn parse_call_limit(headers: &HeaderMap) -> Option<(u32, u32)> {
    let raw = headers.get("X-Shopify-Shop-Api-Call-Limit")?.to_str().ok()?;
    let (used, cap) = raw.split_once('/')?;
    Some((used.trim().parse().ok()?, cap.trim().parse().ok()?))
}

/// Which Admin API surface a request targets.
///
/// REST retry sleeps are jittered to spread bursts of parallel scripts;
/// GraphQL keeps the deterministic schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Graphql,
    Rest,
}

impl Channel {
    fn pad(self, base: Duration) -> Duration {
        match self {
            Self::Rest => jittered(base),
            Self::Graphql => base,
        }
    }
}

/// Terminal transport failure: the attempt budget is spent.
#[derive(Debug, Error)]
#[error("retry budget exhausted after {attempts} attempts, last error: {last}")]
pub struct TransportError {
    pub attempts: u32,
    pub last: String,
}

/// Minimum-interval pacing plus bounded retries around an [`HttpSend`].
///
/// The pacing clock is shared by every caller of one transport instance;
/// the interval is measured from the completion of the previous attempt,
/// regardless of which logical operation issued it.
#[derive(Debug)]
pub struct ThrottledTransport<S> {
    sender: S,
    min_interval: Duration,
    max_attempts: u32,
    last_call: Mutex<Option<Instant>>,
}

impl<S: HttpSend> ThrottledTransport<S> {
    #[must_use]
    pub const fn new(sender: S, min_interval: Duration, max_attempts: u32) -> Self {
        Self { sender, min_interval, max_attempts, last_call: Mutex::new(None) }
    }

    /// Send with pacing and retries.
    ///
    /// A 429 sleeps the server's Retry-After hint (1s fallback); 5xx and
    /// network failures back off exponentially, 1s doubling to an 8s cap.
    /// On the REST channel the fallback and backoff sleeps are jittered.
    /// Both consume the shared attempt budget. Any other status, including
    /// non-429 4xx, is returned to the caller untouched.
    pub async fn send(
        &self,
        request: &HttpRequest,
        channel: Channel,
    ) -> Result<HttpResponse, TransportError> {
        let mut last_failure = String::new();

        for attempt in 1..=self.max_attempts {
            self.pace().await;
            let outcome = self.sender.send(request).await;
            self.mark_call_done();

            match outcome {
                Ok(response) => {
                    self.breathe_if_near_limit(&response).await;

                    if response.status == StatusCode::TOO_MANY_REQUESTS {
                        let wait = response.retry_after.unwrap_or(DEFAULT_RETRY_AFTER);
                        last_failure = format!("HTTP 429 (retry hint {wait}s)");
                        tracing::warn!(
                            url = %request.url,
                            attempt,
                            max_attempts = self.max_attempts,
                            wait_secs = wait,
                            "rate limited, honoring retry hint"
                        );
                        if attempt == self.max_attempts {
                            break;
                        }
                        // an explicit server hint is honored as-is; only
                        // the fallback gets jitter
                        let pause = if response.retry_after.is_some() {
                            Duration::from_secs_f64(wait)
                        } else {
                            channel.pad(Duration::from_secs_f64(wait))
                        };
                        time::sleep(pause).await;
                        continue;
                    }

                    if response.status.is_server_error() {
                        last_failure = format!("HTTP {}", response.status.as_u16());
                        let backoff = channel.pad(backoff_delay(attempt));
                        tracing::warn!(
                            url = %request.url,
                            status = response.status.as_u16(),
                            attempt,
                            max_attempts = self.max_attempts,
                            backoff_secs = backoff.as_secs_f64(),
                            "server error, backing off"
                        );
                        if attempt == self.max_attempts {
                            break;
                        }
                        time::sleep(backoff).await;
                        continue;
                    }

                    return Ok(response);
                }
                Err(err) => {
                    last_failure = err.to_string();
                    let backoff = channel.pad(backoff_delay(attempt));
                    tracing::warn!(
                        url = %request.url,
                        error = %err,
                        attempt,
                        max_attempts = self.max_attempts,
                        backoff_secs = backoff.as_secs_f64(),
                        "network failure, backing off"
                    );
                    if attempt == self.max_attempts {
                        break;
                    }
                    time::sleep(backoff).await;
                }
            }
        }

        Err(TransportError { attempts: self.max_attempts, last: last_failure })
    }

    async fn pace(&self) {
        let last = *self.last_call.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(last) = last {
            let elapsed = last.elapsed();
            if elapsed < self.min_interval {
                time::sleep(self.min_interval - elapsed).await;
            }
        }
    }

    fn mark_call_done(&self) {
        *self.last_call.lock().unwrap_or_else(PoisonError::into_inner) = Some(Instant::now());
    }

    #[cfg(test)]
    pub(crate) fn sender(&self) -> &S {
        &self.sender
    }

    /// Above 85% of the shop's call budget, insert a short jittered pause.
    async fn breathe_if_near_limit(&self, response: &HttpResponse) {
        if let Some((used, cap)) = response.call_limit
            && cap > 0
            && f64::from(used) / f64::from(cap) > CALL_LIMIT_SOFT_CEILING
        {
            time::sleep(jittered(Duration::from_millis(400))).await;
        }
    }
}

/// `min(2^(attempt-1), 8)` seconds.
fn backoff_delay(attempt: u32) -> Duration {
    let exp = attempt.saturating_sub(1);
    if exp >= 3 {
        MAX_BACKOFF
    } else {
        Duration::from_secs(1u64 << exp)
    }
}

/// Scale a base delay by a random factor in `[0.75, 1.25)`.
fn jittered(base: Duration) -> Duration {
    let factor: f64 = rand::rng().random_range(0.75..1.25);
    base.mul_f64(factor)
}
