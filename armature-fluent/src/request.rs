//! Immutable fluent request builder.
//!
//! Every `with_*` call and every verb returns a new [`RequestBuilder`]; the
//! receiver is never modified, so one base builder can be shared and forked
//! freely across tasks and threads.
//!
//! Header and body edits are not applied directly. They are recorded as
//! [`RequestOption`]s and replayed, in call order, onto a fresh request when
//! the builder is dispatched.

use crate::filter::{Filter, FilterChain, Request, TimeoutFilter};
use crate::logging::DebugLoggingFilter;
use crate::multipart::{self, MultiPart};
use crate::oauth::{OAuthFilter, OAuthSigner, Token};
use crate::options::{self, RequestOption};
use crate::params::{self, FORM_CONTENT_TYPE};
use crate::transport::Transport;
use crate::{HttpClientError, Result};
use base64::Engine;
use bytes::Bytes;
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::{HeaderName, HeaderValue, Method};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Immutable description of an HTTP request.
#[derive(Clone)]
pub struct RequestBuilder {
    method: Method,
    uri: String,
    trace_name: String,
    chain: FilterChain,
    options: Vec<RequestOption>,
    defect: Option<String>,
}

impl fmt::Debug for RequestBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestBuilder")
            .field("method", &self.method)
            .field("uri", &self.uri)
            .field("trace_name", &self.trace_name)
            .field("options", &self.options)
            .field("filters", &self.chain.len())
            .finish()
    }
}

impl RequestBuilder {
    /// Start a GET request for `uri` on `transport`.
    pub fn new(transport: Arc<dyn Transport>, uri: impl Into<String>) -> Self {
        let uri = uri.into();
        Self {
            method: Method::GET,
            trace_name: uri.clone(),
            uri,
            chain: FilterChain::new(transport),
            options: Vec::new(),
            defect: None,
        }
    }

    /// The HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The URI, including any query string.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Label used in logs and spans.
    pub fn trace_name(&self) -> &str {
        &self.trace_name
    }

    /// Recorded options, in application order.
    pub fn options(&self) -> &[RequestOption] {
        &self.options
    }

    /// The filter chain, outermost filter first.
    pub fn chain(&self) -> &FilterChain {
        &self.chain
    }

    /// The first construction problem recorded, if any.
    pub fn defect(&self) -> Option<&str> {
        self.defect.as_deref()
    }

    fn with_option(&self, option: RequestOption) -> Self {
        let mut next = self.clone();
        next.options.push(option);
        next
    }

    fn with_defect(&self, defect: String) -> Self {
        warn!(uri = %self.uri, defect = %defect, "Rejected request option");
        let mut next = self.clone();
        next.defect.get_or_insert(defect);
        next
    }

    fn with_uri(&self, uri: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.uri = uri.into();
        next
    }

    fn header_option<N, V>(
        &self,
        name: N,
        value: V,
        make: fn(HeaderName, HeaderValue) -> RequestOption,
    ) -> Self
    where
        N: AsRef<str>,
        V: AsRef<str>,
    {
        let name = name.as_ref();
        match (
            HeaderName::try_from(name),
            HeaderValue::try_from(value.as_ref()),
        ) {
            (Ok(name), Ok(value)) => self.with_option(make(name, value)),
            (Err(e), _) => self.with_defect(format!("invalid header name {:?}: {}", name, e)),
            (_, Err(e)) => self.with_defect(format!("invalid value for header {}: {}", name, e)),
        }
    }

    /// Append query parameters, preserving existing ones and repeated keys.
    pub fn with_params<I, K, V>(&self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let extra: Vec<(String, String)> = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        match params::append_params(&self.uri, &extra) {
            Ok(uri) => self.with_uri(uri),
            Err(e) => self.with_defect(e.to_string()),
        }
    }

    /// Append a single query parameter.
    pub fn with_param(&self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.with_params([(key.into(), value.into())])
    }

    /// Set the HTTP method.
    pub fn with_method(&self, method: Method) -> Self {
        let mut next = self.clone();
        next.method = method;
        next
    }

    /// Add a header; earlier values of the same name are kept.
    pub fn with_header(&self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.header_option(name, value, RequestOption::AddHeader)
    }

    /// Add several headers.
    pub fn with_headers<I, K, V>(&self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        pairs
            .into_iter()
            .fold(self.clone(), |builder, (k, v)| builder.with_header(k, v))
    }

    /// Set the `Content-Type` header.
    pub fn with_content_type(&self, content_type: impl AsRef<str>) -> Self {
        self.header_option(CONTENT_TYPE, content_type, RequestOption::SetHeader)
    }

    /// Set HTTP basic authentication.
    pub fn with_basic_auth(&self, username: impl AsRef<str>, password: impl AsRef<str>) -> Self {
        let credentials = base64::engine::general_purpose::STANDARD
            .encode(format!("{}:{}", username.as_ref(), password.as_ref()));
        self.header_option(
            AUTHORIZATION,
            format!("Basic {}", credentials),
            RequestOption::SetHeader,
        )
    }

    /// Set bearer token authentication.
    pub fn with_bearer_auth(&self, token: impl AsRef<str>) -> Self {
        self.header_option(
            AUTHORIZATION,
            format!("Bearer {}", token.as_ref()),
            RequestOption::SetHeader,
        )
    }

    /// Replace the body.
    pub fn with_body(&self, body: impl Into<Bytes>) -> Self {
        self.with_option(RequestOption::SetBody(body.into()))
    }

    /// Set the label used in logs and spans.
    pub fn with_trace_name(&self, name: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.trace_name = name.into();
        next
    }

    /// Wrap a filter around the current chain; it runs before every
    /// previously installed filter.
    pub fn with_filter<F: Filter + 'static>(&self, filter: F) -> Self {
        self.with_shared_filter(Arc::new(filter))
    }

    /// Like [`with_filter`](Self::with_filter) for an already shared filter.
    pub fn with_shared_filter(&self, filter: Arc<dyn Filter>) -> Self {
        let mut next = self.clone();
        next.chain = self.chain.wrap(filter);
        next
    }

    /// Fail the request if it does not complete within `timeout`.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_filter(TimeoutFilter::new(timeout))
    }

    /// Log the request and response at debug level.
    pub fn with_debug_logging(&self) -> Self {
        self.with_filter(DebugLoggingFilter::new())
    }

    /// Sign requests with an OAuth consumer token only.
    ///
    /// Fails immediately if the URI has no `host:port` authority.
    pub fn with_oauth(&self, consumer: Token) -> Result<Self> {
        self.with_oauth_signer(OAuthSigner::new(&self.uri, consumer)?)
    }

    /// Sign requests with a consumer and an access token.
    pub fn with_oauth_token(&self, consumer: Token, token: Token) -> Result<Self> {
        self.with_oauth_signer(OAuthSigner::new(&self.uri, consumer)?.with_token(token))
    }

    /// Sign requests with a consumer token, request token and verifier.
    pub fn with_oauth_verifier(
        &self,
        consumer: Token,
        token: Token,
        verifier: impl Into<String>,
    ) -> Result<Self> {
        self.with_oauth_signer(
            OAuthSigner::new(&self.uri, consumer)?
                .with_token(token)
                .with_verifier(verifier),
        )
    }

    fn with_oauth_signer(&self, signer: OAuthSigner) -> Result<Self> {
        Ok(self.with_filter(OAuthFilter::new(signer)))
    }

    /// GET.
    pub fn get(&self) -> Self {
        self.with_method(Method::GET)
    }

    /// DELETE.
    pub fn delete(&self) -> Self {
        self.with_method(Method::DELETE)
    }

    /// HEAD.
    pub fn head(&self) -> Self {
        self.with_method(Method::HEAD)
    }

    /// OPTIONS.
    pub fn options_request(&self) -> Self {
        self.with_method(Method::OPTIONS)
    }

    /// POST with `body`.
    ///
    /// An empty body on a URI with a query string turns the query into a
    /// form-encoded body and strips it from the URI.
    pub fn post(&self, body: impl Into<Bytes>) -> Self {
        self.prep_post(body.into())
    }

    /// PUT with `body`.
    pub fn put(&self, body: impl Into<Bytes>) -> Self {
        self.with_method(Method::PUT).with_body(body)
    }

    /// PATCH with `body`.
    pub fn patch(&self, body: impl Into<Bytes>) -> Self {
        self.with_method(Method::PATCH).with_body(body)
    }

    /// POST a form-encoded body.
    pub fn post_form<I, K, V>(&self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let pairs: Vec<(String, String)> = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        match params::encode(&pairs) {
            Ok(body) => self
                .with_method(Method::POST)
                .with_content_type(FORM_CONTENT_TYPE)
                .with_body(body),
            Err(e) => self.with_defect(e.to_string()),
        }
    }

    /// POST a JSON body.
    pub fn post_json<T: Serialize + ?Sized>(&self, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => self
                .with_method(Method::POST)
                .with_content_type("application/json")
                .with_body(body),
            Err(e) => self.with_defect(format!("failed to serialize JSON body: {}", e)),
        }
    }

    /// POST a multipart body; query parameters become leading text parts.
    pub fn post_multipart(&self, parts: Vec<MultiPart>) -> Self {
        self.multipart(Method::POST, parts)
    }

    /// PUT a multipart body; query parameters become leading text parts.
    pub fn put_multipart(&self, parts: Vec<MultiPart>) -> Self {
        self.multipart(Method::PUT, parts)
    }

    fn prep_post(&self, body: Bytes) -> Self {
        let next = self.with_method(Method::POST);
        if !body.is_empty() || !params::has_query(&self.uri) {
            return next.with_body(body);
        }

        let (path, _) = params::split_uri(&self.uri);
        let encoded = params::query_params(&self.uri).and_then(|query| params::encode(&query));
        match encoded {
            Ok(form) => next
                .with_uri(path)
                .with_content_type(FORM_CONTENT_TYPE)
                .with_body(form),
            Err(e) => next.with_defect(e.to_string()),
        }
    }

    fn multipart(&self, method: Method, parts: Vec<MultiPart>) -> Self {
        let (path, _) = params::split_uri(&self.uri);
        let query = match params::query_params(&self.uri) {
            Ok(query) => query,
            Err(e) => return self.with_defect(e.to_string()),
        };

        let all: Vec<MultiPart> = query
            .into_iter()
            .map(|(name, value)| MultiPart::text(name, value))
            .chain(parts)
            .collect();

        self.with_uri(path)
            .with_method(method)
            .with_content_type(multipart::content_type())
            .header_option("MIME-Version", "1.0", RequestOption::SetHeader)
            .with_body(multipart::encode(&all))
    }

    /// Build the request that dispatch would send, without sending it.
    pub fn materialize(&self) -> Result<Request> {
        if let Some(defect) = &self.defect {
            return Err(HttpClientError::RequestBuild(defect.clone()));
        }
        options::materialize(&self.method, &self.uri, &self.options)
    }
}
