//! Filter chain for outgoing requests.
//!
//! A [`FilterChain`] is an ordered list of filters in front of a
//! [`Transport`]. Filters are stored outermost-first: the filter installed
//! last on a builder sits at index 0, sees the request first and the
//! response last.
//!
//! ```text
//! with_filter(F1).with_filter(F2)
//!
//!   F2 pre -> F1 pre -> transport -> F1 post -> F2 post
//! ```

use crate::transport::Transport;
use crate::{HttpClientError, Response, Result};
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;

/// Request type flowing through filters and into the transport.
///
/// Its URI holds only the path and query.
pub type Request = http::Request<Bytes>;

/// A request/response interceptor.
#[async_trait]
pub trait Filter: Send + Sync {
    /// Process the request, calling `next` to continue down the chain.
    async fn call(&self, request: Request, next: Next<'_>) -> Result<Response>;
}

/// The remainder of a chain, handed to each filter.
#[derive(Clone, Copy)]
pub struct Next<'a> {
    filters: &'a [Arc<dyn Filter>],
    transport: &'a dyn Transport,
}

impl<'a> Next<'a> {
    /// Continue to the next filter, or the transport past the last one.
    pub async fn run(self, request: Request) -> Result<Response> {
        match self.filters.split_first() {
            Some((filter, rest)) => {
                let next = Next {
                    filters: rest,
                    transport: self.transport,
                };
                filter.call(request, next).await
            }
            None => self.transport.send(request).await,
        }
    }
}

/// Ordered filters wrapped around a shared transport.
#[derive(Clone)]
pub struct FilterChain {
    filters: Vec<Arc<dyn Filter>>,
    transport: Arc<dyn Transport>,
}

impl FilterChain {
    /// Create an empty chain in front of `transport`.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            filters: Vec::new(),
            transport,
        }
    }

    /// Return a new chain with `filter` wrapped around this one.
    pub fn wrap(&self, filter: Arc<dyn Filter>) -> Self {
        let mut filters = Vec::with_capacity(self.filters.len() + 1);
        filters.push(filter);
        filters.extend(self.filters.iter().cloned());
        Self {
            filters,
            transport: Arc::clone(&self.transport),
        }
    }

    /// Number of installed filters.
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// True when no filters are installed.
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// The shared transport.
    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Send a request through every filter and then the transport.
    pub async fn run(&self, request: Request) -> Result<Response> {
        let next = Next {
            filters: &self.filters,
            transport: self.transport.as_ref(),
        };
        next.run(request).await
    }
}

/// Fails the request with [`HttpClientError::Timeout`] when the rest of the
/// chain takes too long.
#[derive(Debug, Clone, Copy)]
pub struct TimeoutFilter {
    timeout: Duration,
}

impl TimeoutFilter {
    /// Create a new timeout filter.
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl Filter for TimeoutFilter {
    async fn call(&self, request: Request, next: Next<'_>) -> Result<Response> {
        match tokio::time::timeout(self.timeout, next.run(request)).await {
            Ok(result) => result,
            Err(_) => Err(HttpClientError::Timeout(self.timeout)),
        }
    }
}

/// Adapts a closure that edits the request before it continues.
pub struct FnFilter<F> {
    f: F,
}

impl<F> FnFilter<F>
where
    F: Fn(&mut Request) -> Result<()> + Send + Sync,
{
    /// Wrap a request-editing closure.
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F> Filter for FnFilter<F>
where
    F: Fn(&mut Request) -> Result<()> + Send + Sync,
{
    async fn call(&self, mut request: Request, next: Next<'_>) -> Result<Response> {
        (self.f)(&mut request)?;
        next.run(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::transport_fn;
    use http::{HeaderMap, HeaderValue, StatusCode};
    use std::sync::Mutex;

    /// Records when it sees the request and the response.
    struct Recorder {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Filter for Recorder {
        async fn call(&self, request: Request, next: Next<'_>) -> Result<Response> {
            self.log.lock().unwrap().push(format!("{} pre", self.name));
            let response = next.run(request).await;
            self.log.lock().unwrap().push(format!("{} post", self.name));
            response
        }
    }

    fn ok_transport(log: Arc<Mutex<Vec<String>>>) -> Arc<dyn Transport> {
        transport_fn(move |_request| {
            let log = Arc::clone(&log);
            async move {
                log.lock().unwrap().push("transport".to_string());
                Ok(Response::new(StatusCode::OK, HeaderMap::new(), "ok"))
            }
        })
    }

    #[tokio::test]
    async fn test_last_wrapped_runs_outermost() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let chain = FilterChain::new(ok_transport(Arc::clone(&log)))
            .wrap(Arc::new(Recorder {
                name: "F1",
                log: Arc::clone(&log),
            }))
            .wrap(Arc::new(Recorder {
                name: "F2",
                log: Arc::clone(&log),
            }));

        chain.run(Request::new(Bytes::new())).await.unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            vec!["F2 pre", "F1 pre", "transport", "F1 post", "F2 post"]
        );
    }

    #[tokio::test]
    async fn test_wrap_leaves_original_chain_untouched() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let base = FilterChain::new(ok_transport(Arc::clone(&log)));
        let wrapped = base.wrap(Arc::new(Recorder {
            name: "F",
            log: Arc::clone(&log),
        }));

        assert!(base.is_empty());
        assert_eq!(wrapped.len(), 1);

        base.run(Request::new(Bytes::new())).await.unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["transport"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_filter() {
        let slow = transport_fn(|_request| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(Response::new(StatusCode::OK, HeaderMap::new(), ""))
        });
        let chain = FilterChain::new(slow).wrap(Arc::new(TimeoutFilter::new(
            Duration::from_millis(100),
        )));

        let err = chain.run(Request::new(Bytes::new())).await.unwrap_err();
        assert!(err.is_timeout());
    }

    #[tokio::test]
    async fn test_fn_filter_edits_request() {
        let echo = transport_fn(|request: Request| async move {
            let mut headers = HeaderMap::new();
            if let Some(value) = request.headers().get("x-trace") {
                headers.insert("x-trace", value.clone());
            }
            Ok(Response::new(StatusCode::OK, headers, ""))
        });
        let chain = FilterChain::new(echo).wrap(Arc::new(FnFilter::new(|request: &mut Request| {
            request
                .headers_mut()
                .insert("x-trace", HeaderValue::from_static("abc"));
            Ok(())
        })));

        let response = chain.run(Request::new(Bytes::new())).await.unwrap();
        assert_eq!(response.header("x-trace"), Some("abc"));
    }

    #[tokio::test]
    async fn test_fn_filter_can_reject() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let chain = FilterChain::new(ok_transport(Arc::clone(&log))).wrap(Arc::new(
            FnFilter::new(|_request: &mut Request| Err(HttpClientError::Filter("denied".into()))),
        ));

        let err = chain.run(Request::new(Bytes::new())).await.unwrap_err();
        assert!(matches!(err, HttpClientError::Filter(_)));
        assert!(log.lock().unwrap().is_empty());
    }
}
