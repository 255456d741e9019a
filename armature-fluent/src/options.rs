//! Deferred request mutations recorded by the builder.

use crate::filter::Request;
use crate::params;
use crate::{HttpClientError, Result};
use bytes::Bytes;
use http::{HeaderName, HeaderValue, Method};

/// One recorded mutation, replayed onto a fresh request at dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOption {
    /// Append a header, keeping earlier values of the same name.
    AddHeader(HeaderName, HeaderValue),
    /// Replace every value of a header.
    SetHeader(HeaderName, HeaderValue),
    /// Replace the body.
    SetBody(Bytes),
}

impl RequestOption {
    /// Apply this mutation.
    pub fn apply(&self, request: &mut Request) {
        match self {
            Self::AddHeader(name, value) => {
                request.headers_mut().append(name.clone(), value.clone());
            }
            Self::SetHeader(name, value) => {
                request.headers_mut().insert(name.clone(), value.clone());
            }
            Self::SetBody(body) => *request.body_mut() = body.clone(),
        }
    }
}

/// Build the request for `method` and `uri` and replay `options` in order.
pub fn materialize(method: &Method, uri: &str, options: &[RequestOption]) -> Result<Request> {
    let target = params::request_target(uri)?;
    let mut request = http::Request::builder()
        .method(method.clone())
        .uri(target.as_str())
        .body(Bytes::new())
        .map_err(|e| HttpClientError::InvalidUri(format!("{}: {}", target, e)))?;

    for option in options {
        option.apply(&mut request);
    }
    Ok(request)
}
