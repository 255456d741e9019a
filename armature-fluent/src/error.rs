//! Error types for request building and dispatch.

use crate::Response;
use http::StatusCode;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Result type for request building and dispatch.
pub type Result<T> = std::result::Result<T, HttpClientError>;

/// Errors raised while building, dispatching or decoding a request.
#[derive(Debug, Error)]
pub enum HttpClientError {
    /// The request URI could not be parsed.
    #[error("Invalid URI: {0}")]
    InvalidUri(String),

    /// The URI has no `host:port` authority to sign against.
    #[error("URI has no usable host:port authority: {0}")]
    MissingAuthority(String),

    /// Invalid header, unencodable parameters or body.
    #[error("Invalid request: {0}")]
    RequestBuild(String),

    /// No response within the deadline of a timeout filter or the transport.
    #[error("No response within {0:?}")]
    Timeout(Duration),

    #[error("Connection failed: {0}")]
    Connection(String),

    /// Non-2xx response translated by the transport.
    #[error("{0}")]
    Status(StatusError),

    /// A response body could not be decoded into the requested type.
    #[error("Decode error: {0}")]
    Decode(String),

    /// A filter rejected the request.
    #[error("Filter error: {0}")]
    Filter(String),

    /// Failure reported by reqwest.
    #[error("Transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),

    /// A blocking call was made on a current-thread tokio runtime, which
    /// cannot block in place.
    #[error("Blocking dispatch is unavailable on a current-thread runtime; use `fetch`")]
    BlockingUnsupported,

    /// Starting the private runtime for a blocking call failed.
    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),
}

impl HttpClientError {
    /// Check if this error was raised before any I/O took place.
    pub fn is_construction(&self) -> bool {
        matches!(
            self,
            Self::InvalidUri(_)
                | Self::MissingAuthority(_)
                | Self::RequestBuild(_)
                | Self::UrlParse(_)
                | Self::BlockingUnsupported
        )
    }

    /// True for filter and transport timeouts.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_)) || matches!(self, Self::Http(e) if e.is_timeout())
    }

    /// True when no connection could be made.
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_)) || matches!(self, Self::Http(e) if e.is_connect())
    }

    /// Get the HTTP status code if this is a status error.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status(e) => Some(e.status.as_u16()),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

impl From<StatusError> for HttpClientError {
    fn from(err: StatusError) -> Self {
        Self::Status(err)
    }
}

/// A non-2xx response, carried as an error.
///
/// The optional label names the client that produced it, so callers talking
/// to several services can tell failures apart.
#[derive(Debug)]
pub struct StatusError {
    /// HTTP status code.
    pub status: StatusCode,
    /// Reason phrase.
    pub reason: String,
    /// The full response, body included.
    pub response: Response,
    /// Label of the client that received the response.
    pub label: Option<String>,
}

impl StatusError {
    /// Wrap a response.
    pub fn new(response: Response) -> Self {
        Self {
            status: response.status(),
            reason: response.reason().to_string(),
            response,
            label: None,
        }
    }

    /// Attach a client label.
    pub fn with_label(mut self, label: Option<String>) -> Self {
        self.label = label;
        self
    }
}

impl fmt::Display for StatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(label) = &self.label {
            write!(f, "{}: ", label)?;
        }
        write!(f, "HTTP {} {}", self.status.as_u16(), self.reason)
    }
}

impl std::error::Error for StatusError {}
