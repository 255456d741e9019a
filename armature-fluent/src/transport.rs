//! Transport seam: the service that actually performs HTTP exchanges.

use crate::filter::Request;
use crate::{ClientConfig, HttpClientError, Response, Result, StatusError};
use async_trait::async_trait;
use http::{HeaderMap, HeaderName, HeaderValue};
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

/// Sends a fully built request and yields its response.
///
/// Requests arrive with only a path and query in their URI; the transport
/// supplies scheme and authority.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform the exchange.
    async fn send(&self, request: Request) -> Result<Response>;
}

/// Transport backed by a closure. Handy for tests and in-process services.
pub struct TransportFn<F> {
    f: F,
}

#[async_trait]
impl<F, Fut> Transport for TransportFn<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Response>> + Send + 'static,
{
    async fn send(&self, request: Request) -> Result<Response> {
        (self.f)(request).await
    }
}

/// Wrap a closure as a shared transport.
pub fn transport_fn<F, Fut>(f: F) -> Arc<dyn Transport>
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response>> + Send + 'static,
{
    Arc::new(TransportFn { f })
}

/// Transport over a pooled `reqwest` client bound to one base URL.
#[derive(Clone)]
pub struct ReqwestTransport {
    inner: reqwest::Client,
    base_url: url::Url,
    config: Arc<ClientConfig>,
}

impl ReqwestTransport {
    /// Create a transport from configuration.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let base_url = url::Url::parse(&config.base_url)?;
        if base_url.cannot_be_a_base() || base_url.host_str().is_none() {
            return Err(HttpClientError::InvalidUri(config.base_url.clone()));
        }

        let builder = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(config.pool.idle_timeout)
            .pool_max_idle_per_host(config.pool.max_idle_per_host)
            .user_agent(&config.user_agent)
            .default_headers(default_headers(&config.default_headers)?)
            .gzip(config.decompress)
            .brotli(config.decompress)
            .redirect(match config.redirect_limit {
                0 => reqwest::redirect::Policy::none(),
                limit => reqwest::redirect::Policy::limited(limit),
            });

        Ok(Self {
            inner: builder.build()?,
            base_url,
            config: Arc::new(config),
        })
    }

    /// Get the underlying reqwest client.
    pub fn inner(&self) -> &reqwest::Client {
        &self.inner
    }

    /// Get the transport configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

fn default_headers(headers: &[(String, String)]) -> Result<HeaderMap> {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        let name = HeaderName::try_from(name.as_str())
            .map_err(|e| HttpClientError::RequestBuild(e.to_string()))?;
        let value = HeaderValue::try_from(value.as_str())
            .map_err(|e| HttpClientError::RequestBuild(e.to_string()))?;
        map.append(name, value);
    }
    Ok(map)
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: Request) -> Result<Response> {
        let (parts, body) = request.into_parts();
        let target = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        let url = self.base_url.join(target)?;

        debug!(method = %parts.method, url = %url, "Dispatching HTTP request");

        let response = self
            .inner
            .request(parts.method, url)
            .headers(parts.headers)
            .body(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    HttpClientError::Timeout(self.config.timeout)
                } else {
                    HttpClientError::Http(e)
                }
            })?;
        let response = Response::from_reqwest(response).await?;

        if self.config.error_for_status && !response.is_success() {
            return Err(StatusError::new(response)
                .with_label(self.config.label.clone())
                .into());
        }
        Ok(response)
    }
}
