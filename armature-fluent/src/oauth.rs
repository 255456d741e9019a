//! OAuth 1.0a request signing (HMAC-SHA1).
//!
//! Only signing lives here; obtaining tokens is left to the caller. The
//! signer captures the endpoint's scheme, host and port when it is created,
//! so a URI without an authority is rejected before any request is sent.
//!
//! ```
//! use armature_fluent::oauth::{OAuthSigner, Token};
//! use http::Method;
//!
//! let signer = OAuthSigner::new("https://api.example.com/statuses", Token::new("key", "secret"))
//!     .unwrap()
//!     .with_token(Token::new("token", "token-secret"));
//!
//! let header = signer
//!     .authorization_with(&Method::GET, "/statuses?count=5", &[], "nonce", 1_700_000_000)
//!     .unwrap();
//! assert!(header.starts_with("OAuth "));
//! ```

use crate::filter::{Filter, Next, Request};
use crate::params::{self, FORM_CONTENT_TYPE};
use crate::{HttpClientError, Response, Result};
use async_trait::async_trait;
use base64::Engine;
use hmac::{Hmac, Mac};
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::{HeaderValue, Method};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use sha1::Sha1;
use tracing::trace;

type HmacSha1 = Hmac<Sha1>;

/// Everything but RFC 3986 unreserved characters.
const OAUTH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Percent-encode a string the way OAuth 1.0 requires.
pub fn percent_encode(input: &str) -> String {
    utf8_percent_encode(input, OAUTH_ENCODE_SET).to_string()
}

/// An OAuth key/secret pair, used for both consumer and access tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Public key.
    pub key: String,
    /// Shared secret.
    pub secret: String,
}

impl Token {
    /// Create a token.
    pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            secret: secret.into(),
        }
    }
}

/// Scheme, host and port of the endpoint being signed for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    scheme: String,
    host: String,
    port: u16,
}

impl Endpoint {
    /// Derive the endpoint from an absolute URI.
    pub fn from_uri(uri: &str) -> Result<Self> {
        let url = url::Url::parse(uri)
            .map_err(|e| HttpClientError::MissingAuthority(format!("{}: {}", uri, e)))?;
        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| HttpClientError::MissingAuthority(uri.to_string()))?;
        let port = url
            .port_or_known_default()
            .ok_or_else(|| HttpClientError::MissingAuthority(uri.to_string()))?;

        Ok(Self {
            scheme: url.scheme().to_ascii_lowercase(),
            host: host.to_ascii_lowercase(),
            port,
        })
    }

    /// Host name.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Port, explicit or the scheme default.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// The normalized base URL for `path`; default ports are omitted.
    pub fn base_url(&self, path: &str) -> String {
        let path = if path.is_empty() { "/" } else { path };
        let default_port = matches!(
            (self.scheme.as_str(), self.port),
            ("http", 80) | ("https", 443)
        );
        if default_port {
            format!("{}://{}{}", self.scheme, self.host, path)
        } else {
            format!("{}://{}:{}{}", self.scheme, self.host, self.port, path)
        }
    }
}

/// Computes OAuth 1.0a `Authorization` headers.
#[derive(Debug, Clone)]
pub struct OAuthSigner {
    endpoint: Endpoint,
    consumer: Token,
    token: Option<Token>,
    verifier: Option<String>,
}

impl OAuthSigner {
    /// Create a signer for the endpoint named by `uri`.
    pub fn new(uri: &str, consumer: Token) -> Result<Self> {
        Ok(Self {
            endpoint: Endpoint::from_uri(uri)?,
            consumer,
            token: None,
            verifier: None,
        })
    }

    /// Sign with an access (or request) token.
    pub fn with_token(mut self, token: Token) -> Self {
        self.token = Some(token);
        self
    }

    /// Include an `oauth_verifier`.
    pub fn with_verifier(mut self, verifier: impl Into<String>) -> Self {
        self.verifier = Some(verifier.into());
        self
    }

    /// The endpoint this signer was created for.
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    fn protocol_params(&self, nonce: &str, timestamp: i64) -> Vec<(String, String)> {
        let mut protocol = vec![
            ("oauth_consumer_key".to_string(), self.consumer.key.clone()),
            ("oauth_nonce".to_string(), nonce.to_string()),
            ("oauth_signature_method".to_string(), "HMAC-SHA1".to_string()),
            ("oauth_timestamp".to_string(), timestamp.to_string()),
            ("oauth_version".to_string(), "1.0".to_string()),
        ];
        if let Some(token) = &self.token {
            protocol.push(("oauth_token".to_string(), token.key.clone()));
        }
        if let Some(verifier) = &self.verifier {
            protocol.push(("oauth_verifier".to_string(), verifier.clone()));
        }
        protocol
    }

    /// Build the signature base string.
    ///
    /// `path_and_query` is the request target; `form` holds decoded
    /// form-body parameters, which are signed alongside the query.
    pub fn base_string(
        &self,
        method: &Method,
        path_and_query: &str,
        form: &[(String, String)],
        nonce: &str,
        timestamp: i64,
    ) -> Result<String> {
        self.base_string_for(method, path_and_query, form, &self.protocol_params(nonce, timestamp))
    }

    fn base_string_for(
        &self,
        method: &Method,
        path_and_query: &str,
        form: &[(String, String)],
        protocol: &[(String, String)],
    ) -> Result<String> {
        let (path, _) = params::split_uri(path_and_query);

        let mut signed: Vec<(String, String)> = protocol
            .iter()
            .chain(params::query_params(path_and_query)?.iter())
            .chain(form.iter())
            .map(|(k, v)| (percent_encode(k), percent_encode(v)))
            .collect();
        // Sort by encoded key, then encoded value.
        signed.sort();

        let normalized = signed
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");

        Ok(format!(
            "{}&{}&{}",
            method.as_str().to_ascii_uppercase(),
            percent_encode(&self.endpoint.base_url(path)),
            percent_encode(&normalized)
        ))
    }

    /// The HMAC key: encoded consumer secret and encoded token secret.
    pub fn signing_key(&self) -> String {
        let token_secret = self.token.as_ref().map(|t| t.secret.as_str()).unwrap_or("");
        format!(
            "{}&{}",
            percent_encode(&self.consumer.secret),
            percent_encode(token_secret)
        )
    }

    /// HMAC-SHA1 of a base string, base64 encoded.
    pub fn sign_base_string(&self, base_string: &str) -> Result<String> {
        let mut mac = HmacSha1::new_from_slice(self.signing_key().as_bytes())
            .map_err(|e| HttpClientError::RequestBuild(e.to_string()))?;
        mac.update(base_string.as_bytes());
        Ok(base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes()))
    }

    /// Compute the `Authorization` header for a fixed nonce and timestamp.
    pub fn authorization_with(
        &self,
        method: &Method,
        path_and_query: &str,
        form: &[(String, String)],
        nonce: &str,
        timestamp: i64,
    ) -> Result<String> {
        let mut protocol = self.protocol_params(nonce, timestamp);
        let base_string = self.base_string_for(method, path_and_query, form, &protocol)?;
        trace!(base_string = %base_string, "OAuth signature base string");

        protocol.push(("oauth_signature".to_string(), self.sign_base_string(&base_string)?));
        protocol.sort();

        let fields = protocol
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", percent_encode(k), percent_encode(v)))
            .collect::<Vec<_>>()
            .join(", ");
        Ok(format!("OAuth {}", fields))
    }

    /// Compute the `Authorization` header with a fresh nonce and the current time.
    pub fn authorization(
        &self,
        method: &Method,
        path_and_query: &str,
        form: &[(String, String)],
    ) -> Result<String> {
        let nonce = uuid::Uuid::new_v4().simple().to_string();
        let timestamp = chrono::Utc::now().timestamp();
        self.authorization_with(method, path_and_query, form, &nonce, timestamp)
    }
}

/// Filter that signs each request it sees.
#[derive(Debug, Clone)]
pub struct OAuthFilter {
    signer: OAuthSigner,
}

impl OAuthFilter {
    /// Create a signing filter.
    pub fn new(signer: OAuthSigner) -> Self {
        Self { signer }
    }
}

/// Decoded parameters of a form-encoded body, empty for any other body.
fn form_params(request: &Request) -> Result<Vec<(String, String)>> {
    let is_form = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with(FORM_CONTENT_TYPE));
    if !is_form || request.body().is_empty() {
        return Ok(Vec::new());
    }
    let body = std::str::from_utf8(request.body())
        .map_err(|e| HttpClientError::RequestBuild(format!("form body is not UTF-8: {}", e)))?;
    params::decode(body)
}

#[async_trait]
impl Filter for OAuthFilter {
    async fn call(&self, mut request: Request, next: Next<'_>) -> Result<Response> {
        let target = request
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| "/".to_string());
        let form = form_params(&request)?;
        let header = self.signer.authorization(request.method(), &target, &form)?;

        let value = HeaderValue::try_from(header)
            .map_err(|e| HttpClientError::RequestBuild(e.to_string()))?;
        request.headers_mut().insert(AUTHORIZATION, value);

        next.run(request).await
    }
}
