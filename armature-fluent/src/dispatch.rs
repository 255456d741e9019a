//! Retrieval modes built on [`RequestBuilder::process`].
//!
//! | Mode              | Method          | On failure                     |
//! |-------------------|-----------------|--------------------------------|
//! | async             | `fetch`         | failed future                  |
//! | blocking optional | `fetch_option`  | `None`, cause discarded        |
//! | blocking throwing | `fetch_or_fail` | the original error             |
//!
//! The blocking modes wait on the calling thread. Without a timeout filter
//! the wait is unbounded. Inside a multi-thread tokio runtime they block in
//! place; outside any runtime, a private current-thread runtime is started
//! for the call. A current-thread runtime cannot block in place, so there
//! they fail with [`HttpClientError::BlockingUnsupported`] without sending.

use crate::extract;
use crate::{HttpClientError, RequestBuilder, Response, Result};
use futures::FutureExt;
use futures::future::BoxFuture;
use std::future::Future;
use tokio::runtime::RuntimeFlavor;
use tracing::Instrument;

/// Outcome of a blocking dispatch: a value or the error that prevented it.
#[derive(Debug)]
pub enum ResponseOrError<T> {
    /// The mapped response.
    Response(T),
    /// Transport, status, construction or extraction failure.
    Error(HttpClientError),
}

impl<T> ResponseOrError<T> {
    /// Convert into a `Result`.
    pub fn into_result(self) -> Result<T> {
        match self {
            Self::Response(value) => Ok(value),
            Self::Error(e) => Err(e),
        }
    }

    /// The value, dropping any error.
    pub fn ok(self) -> Option<T> {
        match self {
            Self::Response(value) => Some(value),
            Self::Error(_) => None,
        }
    }

    /// True if this holds an error.
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

impl<T> From<Result<T>> for ResponseOrError<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(value) => Self::Response(value),
            Err(e) => Self::Error(e),
        }
    }
}

/// Drive `future` to completion on the calling thread.
fn block_on<F: Future>(future: F) -> Result<F::Output> {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::CurrentThread => {
            Err(HttpClientError::BlockingUnsupported)
        }
        Ok(handle) => Ok(tokio::task::block_in_place(|| handle.block_on(future))),
        Err(_) => {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            Ok(runtime.block_on(future))
        }
    }
}

impl RequestBuilder {
    /// Materialize the request, run it through the filter chain and map the
    /// response with `extract`.
    pub async fn process<T, F>(&self, extract: F) -> Result<T>
    where
        F: FnOnce(Response) -> Result<T>,
    {
        let request = self.materialize()?;
        let span = tracing::debug_span!(
            "http_request",
            trace_name = %self.trace_name(),
            method = %request.method(),
            uri = %request.uri(),
        );
        let response = self.chain().run(request).instrument(span).await?;
        extract(response)
    }

    /// Send the request and return the raw response.
    pub async fn send(&self) -> Result<Response> {
        self.process(extract::as_response).await
    }

    /// Async mode: a detached future of the mapped response.
    ///
    /// The future owns a copy of the builder and never blocks.
    pub fn fetch<T, F>(&self, extract: F) -> BoxFuture<'static, Result<T>>
    where
        T: Send + 'static,
        F: FnOnce(Response) -> Result<T> + Send + 'static,
    {
        let builder = self.clone();
        async move { builder.process(extract).await }.boxed()
    }

    /// Async mode with the default string extractor.
    pub fn fetch_text(&self) -> BoxFuture<'static, Result<String>> {
        self.fetch(extract::as_string)
    }

    /// Block until the request settles and report either outcome.
    pub fn settle<T, F>(&self, extract: F) -> ResponseOrError<T>
    where
        F: FnOnce(Response) -> Result<T>,
    {
        block_on(self.process(extract)).and_then(|r| r).into()
    }

    /// Blocking optional mode: `Some` on success, `None` on any failure.
    ///
    /// Transport, status and extraction failures all collapse to `None`;
    /// use [`fetch_or_fail`](Self::fetch_or_fail) to see the cause.
    pub fn fetch_option<T, F>(&self, extract: F) -> Option<T>
    where
        F: FnOnce(Response) -> Result<T>,
    {
        self.settle(extract).ok()
    }

    /// Blocking throwing mode: the mapped value, or the original error.
    pub fn fetch_or_fail<T, F>(&self, extract: F) -> Result<T>
    where
        F: FnOnce(Response) -> Result<T>,
    {
        self.settle(extract).into_result()
    }

    /// Blocking optional mode with the default string extractor.
    pub fn text_option(&self) -> Option<String> {
        self.fetch_option(extract::as_string)
    }

    /// Blocking throwing mode with the default string extractor.
    pub fn text_or_fail(&self) -> Result<String> {
        self.fetch_or_fail(extract::as_string)
    }
}
