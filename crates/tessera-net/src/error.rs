use thiserror::Error;

/// Centralized error type for tessera-net
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NetError {
    #[error("HTTP request failed: {0}")]
    Http(String),
    #[error("Timeout")]
    Timeout,
    #[error("Request failed after {max_retries} retries: {source}")]
    RetryExhausted {
        max_retries: u32,
        source: Box<NetError>,
    },
    #[error("HTTP {status} for URL: {url}")]
    HttpStatus { status: u16, url: String },
}

impl NetError {
    /// Creates an HTTP status error
    pub fn http_status(status: u16, url: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            url: url.into(),
        }
    }

    /// Creates a timeout error
    pub fn timeout() -> Self {
        Self::Timeout
    }

    /// Creates an HTTP error from a generic string
    pub fn http<S: Into<String>>(msg: S) -> Self {
        Self::Http(msg.into())
    }

    /// Checks if this error is considered retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            NetError::Http(msg) => {
                let msg = msg.to_ascii_lowercase();
                msg.contains("timeout") || msg.contains("connection") || msg.contains("network")
            }
            NetError::Timeout => true,
            NetError::RetryExhausted { .. } => false,
            NetError::HttpStatus { status, .. } => {
                // 5xx, Too Many Requests, Request Timeout
                *status >= 500 || *status == 429 || *status == 408
            }
        }
    }

    /// Checks if this error indicates a timeout
    pub fn is_timeout(&self) -> bool {
        match self {
            NetError::Timeout => true,
            NetError::RetryExhausted { source, .. } => source.is_timeout(),
            _ => false,
        }
    }

    /// Gets the HTTP status code if this is an HTTP status error
    pub fn status_code(&self) -> Option<u16> {
        match self {
            NetError::HttpStatus { status, .. } => Some(*status),
            NetError::RetryExhausted { source, .. } => source.status_code(),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for NetError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            return Self::Timeout;
        }
        if let Some(status) = error.status() {
            let url = error.url().map(ToString::to_string).unwrap_or_default();
            return Self::http_status(status.as_u16(), url);
        }
        Self::Http(error.to_string())
    }
}

pub type NetResult<T> = Result<T, NetError>;

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(NetError::Timeout, true)]
    #[case(NetError::http_status(500, "u"), true)]
    #[case(NetError::http_status(503, "u"), true)]
    #[case(NetError::http_status(429, "u"), true)]
    #[case(NetError::http_status(408, "u"), true)]
    #[case(NetError::http_status(404, "u"), false)]
    #[case(NetError::http_status(403, "u"), false)]
    #[case(NetError::http("connection reset by peer"), true)]
    #[case(NetError::http("invalid header value"), false)]
    #[case(NetError::RetryExhausted { max_retries: 3, source: Box::new(NetError::Timeout) }, false)]
    fn retryable_classification(#[case] error: NetError, #[case] expected: bool) {
        assert_eq!(error.is_retryable(), expected);
    }

    #[test]
    fn exhausted_exposes_inner_status_and_timeout() {
        let err = NetError::RetryExhausted {
            max_retries: 2,
            source: Box::new(NetError::http_status(502, "http://x/0.webm")),
        };
        assert_eq!(err.status_code(), Some(502));
        assert!(!err.is_timeout());

        let err = NetError::RetryExhausted {
            max_retries: 2,
            source: Box::new(NetError::Timeout),
        };
        assert!(err.is_timeout());
    }
}
