//! Typed API errors surfaced by the request executor
//!
//! Once retries are exhausted (or the failure was never retryable), the
//! executor converts the transport error into one of these terminal
//! variants. Callers handle them explicitly; nothing is swallowed.

use thiserror::Error;

use super::transport::TransportError;

/// Terminal, non-retryable failure of one logical request
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The caller supplied a request the platform cannot accept (400)
    #[error("bad request: {0}")]
    BadRequest(String),
    /// The request, retries included, exceeded its deadline (408)
    #[error("network timeout: {0}")]
    Timeout(String),
    /// The platform could not be reached (503)
    #[error("network unavailable: {0}")]
    Unavailable(String),
    /// The platform rejected the credential (401)
    #[error("authentication failed: {0}")]
    Authentication(String),
    /// Anything else, wrapping the original message (500)
    #[error("request failed: {0}")]
    Internal(String),
}

impl ApiError {
    /// HTTP-style status code for the failure class
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::Timeout(_) => 408,
            ApiError::Unavailable(_) => 503,
            ApiError::Authentication(_) => 401,
            ApiError::Internal(_) => 500,
        }
    }
}

impl From<TransportError> for ApiError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::InvalidRequest(msg) => ApiError::BadRequest(msg),
            TransportError::Timeout(msg) => ApiError::Timeout(msg),
            TransportError::Connection(msg) | TransportError::Network(msg) => {
                ApiError::Unavailable(msg)
            }
            TransportError::Status { status, message } => {
                ApiError::Internal(format!("status {status}: {message}"))
            }
            TransportError::Other(msg) => ApiError::Internal(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::BadRequest("x".into()).status_code(), 400);
        assert_eq!(ApiError::Timeout("x".into()).status_code(), 408);
        assert_eq!(ApiError::Unavailable("x".into()).status_code(), 503);
        assert_eq!(ApiError::Authentication("x".into()).status_code(), 401);
        assert_eq!(ApiError::Internal("x".into()).status_code(), 500);
    }

    #[test]
    fn test_conversion_from_transport() {
        let err: ApiError = TransportError::InvalidRequest("no body".into()).into();
        assert!(matches!(err, ApiError::BadRequest(_)));

        let err: ApiError = TransportError::Timeout("slow".into()).into();
        assert!(matches!(err, ApiError::Timeout(_)));

        let err: ApiError = TransportError::Connection("refused".into()).into();
        assert!(matches!(err, ApiError::Unavailable(_)));

        let err: ApiError = TransportError::Network("down".into()).into();
        assert!(matches!(err, ApiError::Unavailable(_)));

        let err: ApiError = TransportError::Other("weird".into()).into();
        assert!(matches!(err, ApiError::Internal(_)));
    }
}
