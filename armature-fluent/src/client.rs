//! Client handle that hands out request builders.

use crate::transport::{ReqwestTransport, Transport};
use crate::{ClientConfig, RequestBuilder, Result};
use std::sync::Arc;

/// Shares one transport among any number of request builders.
#[derive(Clone)]
pub struct HttpClient {
    transport: Arc<dyn Transport>,
    base_url: Option<String>,
}

impl HttpClient {
    /// Create a client over a reqwest transport built from `config`.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        Ok(Self {
            transport: Arc::new(ReqwestTransport::new(config)?),
            base_url: Some(base_url),
        })
    }

    /// Create a client over any transport.
    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            base_url: None,
        }
    }

    /// The shared transport.
    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Start a GET request builder.
    ///
    /// A path starting with `/` is made absolute against the configured base
    /// URL, so OAuth signing sees the real authority.
    pub fn request(&self, uri: impl Into<String>) -> RequestBuilder {
        let uri = uri.into();
        let uri = match &self.base_url {
            Some(base) if uri.starts_with('/') => format!("{}{}", base, uri),
            _ => uri,
        };
        RequestBuilder::new(Arc::clone(&self.transport), uri)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::transport_fn;
    use crate::Response;
    use http::{HeaderMap, StatusCode};

    #[test]
    fn test_request_is_absolute_against_base_url() {
        let config = ClientConfig::builder()
            .base_url("https://api.example.com:8443/")
            .build();
        let client = HttpClient::new(config).unwrap();

        assert_eq!(
            client.request("/v1/users").uri(),
            "https://api.example.com:8443/v1/users"
        );
        assert_eq!(
            client.request("http://other.example.com/x").uri(),
            "http://other.example.com/x"
        );
    }

    #[test]
    fn test_custom_transport_keeps_uri() {
        let transport = transport_fn(|_request| async {
            Ok(Response::new(StatusCode::OK, HeaderMap::new(), ""))
        });
        let client = HttpClient::with_transport(transport);
        assert_eq!(client.request("/v1/users").uri(), "/v1/users");
    }
}
