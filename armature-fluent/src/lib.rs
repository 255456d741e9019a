//! # Armature Fluent
//!
//! An immutable, fluent HTTP request builder with composable filters,
//! multipart bodies and OAuth 1.0a request signing.
//!
//! ## Features
//!
//! - **Immutable builders**: every call returns a new value; share and fork freely
//! - **Filters**: request/response interceptors composed around a transport
//! - **OAuth 1.0a**: HMAC-SHA1 signing of query and form parameters
//! - **Multipart**: `multipart/form-data` bodies with a fixed boundary
//! - **Retrieval modes**: async, blocking-optional and blocking-throwing
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use armature_fluent::{extract, ClientConfig, HttpClient};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = HttpClient::new(
//!         ClientConfig::builder()
//!             .base_url("https://api.example.com")
//!             .label("example")
//!             .build(),
//!     )?;
//!
//!     let users = client
//!         .request("/users")
//!         .with_param("page", "2")
//!         .with_timeout(Duration::from_secs(5))
//!         .fetch(extract::as_string)
//!         .await?;
//!
//!     println!("{}", users);
//!     Ok(())
//! }
//! ```
//!
//! ## OAuth 1.0a
//!
//! ```rust,no_run
//! use armature_fluent::{extract, ClientConfig, HttpClient, Token};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::builder().base_url("https://api.example.com").build();
//! let client = HttpClient::new(config)?;
//!
//! let token = client
//!     .request("/oauth/access_token")
//!     .with_oauth_verifier(
//!         Token::new("consumer-key", "consumer-secret"),
//!         Token::new("request-token", "request-secret"),
//!         "verifier",
//!     )?
//!     .post("")
//!     .fetch_or_fail(extract::as_token)?;
//!
//! println!("access token: {}", token.key);
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod dispatch;
mod error;
pub mod extract;
pub mod filter;
mod logging;
pub mod multipart;
pub mod oauth;
pub mod options;
pub mod params;
mod request;
mod response;
pub mod transport;

pub use client::HttpClient;
pub use config::{ClientConfig, ClientConfigBuilder, PoolSettings};
pub use dispatch::ResponseOrError;
pub use error::{HttpClientError, Result, StatusError};
pub use filter::{Filter, FilterChain, FnFilter, Next, Request, TimeoutFilter};
pub use logging::DebugLoggingFilter;
pub use multipart::MultiPart;
pub use oauth::{OAuthFilter, OAuthSigner, Token};
pub use options::RequestOption;
pub use request::RequestBuilder;
pub use response::Response;
pub use transport::{ReqwestTransport, Transport, transport_fn};

// Re-export common types
pub use bytes::Bytes;
pub use http::{HeaderMap, HeaderValue, Method, StatusCode, header};

/// Prelude for common imports.
///
/// ```
/// use armature_fluent::prelude::*;
/// ```
pub mod prelude {
    pub use crate::client::HttpClient;
    pub use crate::config::{ClientConfig, ClientConfigBuilder};
    pub use crate::dispatch::ResponseOrError;
    pub use crate::error::{HttpClientError, Result, StatusError};
    pub use crate::extract;
    pub use crate::filter::{Filter, Next, Request};
    pub use crate::multipart::MultiPart;
    pub use crate::oauth::Token;
    pub use crate::request::RequestBuilder;
    pub use crate::response::Response;
    pub use crate::transport::Transport;
    pub use http::{Method, StatusCode, header};
}
