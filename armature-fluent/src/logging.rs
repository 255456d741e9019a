//! Debug logging filter.

use crate::filter::{Filter, Next, Request};
use crate::{Response, Result};
use async_trait::async_trait;
use std::time::Instant;
use tracing::{debug, warn};

/// Logs each request before dispatch and each response after receipt.
///
/// Installing it more than once on the same builder nests the log pairs.
#[derive(Debug, Clone)]
pub struct DebugLoggingFilter {
    log_headers: bool,
    log_body: bool,
}

impl DebugLoggingFilter {
    /// Log method, URI, headers and non-empty bodies.
    pub fn new() -> Self {
        Self {
            log_headers: true,
            log_body: true,
        }
    }

    /// Skip headers.
    pub fn without_headers(mut self) -> Self {
        self.log_headers = false;
        self
    }

    /// Skip bodies.
    pub fn without_body(mut self) -> Self {
        self.log_body = false;
        self
    }
}

impl Default for DebugLoggingFilter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Filter for DebugLoggingFilter {
    async fn call(&self, request: Request, next: Next<'_>) -> Result<Response> {
        debug!(
            method = %request.method(),
            uri = %request.uri(),
            "Sending HTTP request"
        );

        if self.log_headers {
            for (name, value) in request.headers() {
                debug!(header = %name, value = ?value, "Request header");
            }
        }
        if self.log_body && !request.body().is_empty() {
            debug!(body = %String::from_utf8_lossy(request.body()), "Request body");
        }

        let started = Instant::now();
        let result = next.run(request).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match &result {
            Ok(response) => {
                debug!(status = %response.status(), elapsed_ms, "Received HTTP response");
                if self.log_headers {
                    for (name, value) in response.headers() {
                        debug!(header = %name, value = ?value, "Response header");
                    }
                }
                if self.log_body && !response.bytes().is_empty() {
                    debug!(body = %String::from_utf8_lossy(response.bytes()), "Response body");
                }
            }
            Err(e) => warn!(error = %e, elapsed_ms, "HTTP request failed"),
        }

        result
    }
}
