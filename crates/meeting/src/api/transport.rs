//! Transport boundary for the meeting-platform API
//!
//! The request executor is agnostic to the concrete HTTP stack: everything
//! it needs from the network is the narrow [`Transport`] trait.
//! [`UreqTransport`] is the production implementation (synchronous HTTP via
//! ureq); [`MockTransport`] replays scripted outcomes for tests.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Mutex;
use std::time::Duration;

use serde_json::Value;

/// HTTP methods used against the platform API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One outgoing request as the transport sees it
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
    pub timeout: Duration,
}

/// Structured result of a completed HTTP exchange
///
/// 4xx responses come back here with `success = false`; they are the
/// platform telling the caller something, not a network failure.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub success: bool,
    pub status: u16,
    pub body: Value,
}

impl TransportResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self {
            success: (200..300).contains(&status),
            status,
            body,
        }
    }
}

/// Network-layer failure, classified for retry decisions
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("connection failed: {0}")]
    Connection(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("server returned status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Whether a retry of the same request could plausibly succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            TransportError::Timeout(_)
            | TransportError::Connection(_)
            | TransportError::Network(_) => true,
            TransportError::Status { status, .. } => *status >= 500,
            TransportError::InvalidRequest(_) | TransportError::Other(_) => false,
        }
    }
}

/// Narrow seam between the executor and the HTTP stack
pub trait Transport: Send + Sync {
    fn send(&self, request: &TransportRequest) -> Result<TransportResponse, TransportError>;
}

/// Production transport backed by ureq
///
/// Server errors (>= 500) surface as [`TransportError::Status`] so the
/// executor can retry them; everything else is returned structured.
pub struct UreqTransport;

impl Transport for UreqTransport {
    fn send(&self, request: &TransportRequest) -> Result<TransportResponse, TransportError> {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(request.timeout))
            .http_status_as_error(false)
            .build()
            .into();

        let result = match request.method {
            Method::Get | Method::Delete => {
                let mut req = match request.method {
                    Method::Get => agent.get(&request.url),
                    _ => agent.delete(&request.url),
                };
                for (name, value) in &request.headers {
                    req = req.header(name.as_str(), value.as_str());
                }
                req.call()
            }
            Method::Post | Method::Put => {
                let mut req = match request.method {
                    Method::Post => agent.post(&request.url),
                    _ => agent.put(&request.url),
                };
                for (name, value) in &request.headers {
                    req = req.header(name.as_str(), value.as_str());
                }
                req.send_json(request.body.clone().unwrap_or(Value::Null))
            }
        };

        match result {
            Ok(mut response) => {
                let status = response.status().as_u16();
                if status >= 500 {
                    return Err(TransportError::Status {
                        status,
                        message: format!("{} {}", request.method, request.url),
                    });
                }
                // Bodies are best-effort JSON; an empty or non-JSON body is Null
                let body = response
                    .body_mut()
                    .read_json::<Value>()
                    .unwrap_or(Value::Null);
                Ok(TransportResponse::new(status, body))
            }
            Err(ureq::Error::StatusCode(status)) if status >= 500 => Err(TransportError::Status {
                status,
                message: format!("{} {}", request.method, request.url),
            }),
            Err(ureq::Error::StatusCode(status)) => {
                Ok(TransportResponse::new(status, Value::Null))
            }
            Err(ureq::Error::Timeout(reason)) => Err(TransportError::Timeout(reason.to_string())),
            Err(ureq::Error::ConnectionFailed) => {
                Err(TransportError::Connection(format!("{}", request.url)))
            }
            Err(ureq::Error::HostNotFound) => {
                Err(TransportError::Network(format!("host not found: {}", request.url)))
            }
            Err(ureq::Error::Io(err)) => Err(TransportError::Connection(err.to_string())),
            Err(ureq::Error::BadUri(uri)) => {
                Err(TransportError::InvalidRequest(format!("bad uri: {uri}")))
            }
            Err(err) => Err(TransportError::Other(err.to_string())),
        }
    }
}

/// Scripted transport for tests
///
/// Replays queued outcomes in FIFO order and records every request it
/// receives so tests can assert on what went over the wire.
#[derive(Default)]
pub struct MockTransport {
    script: Mutex<VecDeque<Result<TransportResponse, TransportError>>>,
    requests: Mutex<Vec<TransportRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a structured response
    pub fn push_response(&self, status: u16, body: Value) {
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(Ok(TransportResponse::new(status, body)));
    }

    /// Queue a transport-level failure
    pub fn push_error(&self, error: TransportError) {
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(Err(error));
    }

    /// Requests seen so far, oldest first
    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }
}

impl Transport for MockTransport {
    fn send(&self, request: &TransportRequest) -> Result<TransportResponse, TransportError> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.clone());
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Other("mock script exhausted".to_string())))
    }
}
