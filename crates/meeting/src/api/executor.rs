//! Request executor for the meeting-platform API
//!
//! Issues one logical request: builds the URL, merges headers, injects the
//! auth credential, measures wall-clock duration, classifies failures, and
//! retries retryable ones with exponential backoff. Every executor owns its
//! own [`RequestStats`].

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use log::{error, info};
use serde_json::Value;

use super::error::ApiError;
use super::stats::{RequestStats, RequestStatsReport};
use super::transport::{Method, Transport, TransportRequest, UreqTransport};

/// User agent sent with every request
const USER_AGENT: &str = "vela-meeting-client/0.1";

/// Exponential backoff saturates at this many seconds
const BACKOFF_CAP_SECS: u64 = 30;

/// Retry behavior for one logical request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Remaining-attempts budget for retries; 0 disables retrying
    pub max_retries: u32,
    /// Overall deadline for the logical request, retries and backoff included
    pub timeout_secs: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            timeout_secs: 60,
        }
    }
}

impl RetryPolicy {
    /// Backoff before the next retry, `completed` retries in:
    /// min(30, 2^completed) seconds.
    pub fn backoff(&self, completed: u32) -> Duration {
        let secs = 2u64
            .saturating_pow(completed.min(u32::from(u8::MAX)))
            .min(BACKOFF_CAP_SECS);
        Duration::from_secs(secs)
    }
}

/// Auth credential injected as an `Authorization: <scheme> <token>` header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub scheme: String,
    pub token: String,
}

impl Credential {
    pub fn bearer(token: impl Into<String>) -> Self {
        Self {
            scheme: "Bearer".to_string(),
            token: token.into(),
        }
    }

    fn header_value(&self) -> Option<String> {
        if self.token.is_empty() {
            return None;
        }
        Some(format!("{} {}", self.scheme, self.token))
    }
}

/// Structured result of one logical request
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub success: bool,
    pub status: u16,
    pub body: Value,
}

/// Executes requests against one base URL
pub struct RequestExecutor {
    transport: Arc<dyn Transport>,
    base_url: String,
    policy: RetryPolicy,
    default_policy: RetryPolicy,
    headers: Vec<(String, String)>,
    credential: Option<Credential>,
    stats: Mutex<RequestStats>,
}

impl RequestExecutor {
    /// Create an executor over the production ureq transport
    pub fn new(base_url: impl Into<String>, policy: RetryPolicy) -> Self {
        Self::with_transport(base_url, policy, Arc::new(UreqTransport))
    }

    /// Create an executor over an arbitrary transport (tests, custom stacks)
    pub fn with_transport(
        base_url: impl Into<String>,
        policy: RetryPolicy,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            transport,
            base_url,
            policy,
            default_policy: policy,
            headers: Self::default_headers(),
            credential: None,
            stats: Mutex::new(RequestStats::default()),
        }
    }

    fn default_headers() -> Vec<(String, String)> {
        vec![
            ("Content-Type".to_string(), "application/json".to_string()),
            ("Accept".to_string(), "application/json".to_string()),
            ("User-Agent".to_string(), USER_AGENT.to_string()),
        ]
    }

    /// Set or override a header sent with every request
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        if let Some(existing) = self
            .headers
            .iter_mut()
            .find(|(n, _)| n.eq_ignore_ascii_case(&name))
        {
            existing.1 = value;
        } else {
            self.headers.push((name, value));
        }
    }

    /// Set or clear the auth credential
    pub fn set_credential(&mut self, credential: Option<Credential>) {
        self.credential = credential;
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Restore headers, retry policy and credential to construction-time
    /// defaults and zero the counters. Idempotent.
    pub fn reset(&mut self) {
        self.headers = Self::default_headers();
        self.credential = None;
        self.policy = self.default_policy;
        self.stats_guard().reset();
    }

    /// Snapshot of the counters plus derived metrics
    pub fn stats(&self) -> RequestStatsReport {
        self.stats_guard().report()
    }

    pub fn success_rate(&self) -> f64 {
        self.stats_guard().success_rate()
    }

    pub fn average_response_time_ms(&self) -> f64 {
        self.stats_guard().average_response_time_ms()
    }

    fn stats_guard(&self) -> MutexGuard<'_, RequestStats> {
        self.stats.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn build_request(&self, method: Method, url: &str, body: Option<Value>) -> TransportRequest {
        let mut headers = self.headers.clone();
        if let Some(value) = self.credential.as_ref().and_then(Credential::header_value) {
            headers.push(("Authorization".to_string(), value));
        }
        TransportRequest {
            method,
            url: url.to_string(),
            headers,
            body,
            timeout: Duration::from_secs(self.policy.timeout_secs),
        }
    }

    /// Execute one logical request, retrying retryable transport failures
    /// with exponential backoff until the budget or deadline is exhausted.
    pub fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<ApiResponse, ApiError> {
        let url = self.url_for(path);
        let deadline = Instant::now() + Duration::from_secs(self.policy.timeout_secs);
        let mut remaining = self.policy.max_retries;
        let mut completed = 0u32;

        loop {
            let request = self.build_request(method, &url, body.clone());
            let summary = match &request.body {
                Some(value) => format!("{} byte payload", value.to_string().len()),
                None => "no payload".to_string(),
            };
            info!("{method} {url} ({summary})");

            let started = Instant::now();
            let outcome = self.transport.send(&request);
            let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

            match outcome {
                Ok(response) => {
                    if response.success {
                        self.stats_guard().record_success(elapsed_ms);
                        info!("{method} {url} -> {} in {elapsed_ms:.0}ms", response.status);
                    } else {
                        self.stats_guard().record_failure(elapsed_ms);
                        error!("{method} {url} -> {} in {elapsed_ms:.0}ms", response.status);
                    }
                    if response.status == 401 || response.status == 403 {
                        return Err(ApiError::Authentication(format!(
                            "platform rejected credential (status {})",
                            response.status
                        )));
                    }
                    return Ok(ApiResponse {
                        success: response.success,
                        status: response.status,
                        body: response.body,
                    });
                }
                Err(err) => {
                    self.stats_guard().record_failure(elapsed_ms);
                    error!("{method} {url} failed after {elapsed_ms:.0}ms: {err}");

                    if err.is_retryable() && remaining > 0 {
                        let backoff = self.policy.backoff(completed);
                        if Instant::now() + backoff >= deadline {
                            return Err(ApiError::Timeout(format!(
                                "deadline exhausted after {completed} retries: {err}"
                            )));
                        }
                        remaining -= 1;
                        completed += 1;
                        self.stats_guard().record_retry();
                        info!(
                            "retrying {method} {url} in {}s ({remaining} retries left)",
                            backoff.as_secs()
                        );
                        std::thread::sleep(backoff);
                        continue;
                    }

                    return Err(ApiError::from(err));
                }
            }
        }
    }
}
