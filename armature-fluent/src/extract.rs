//! Response extractors.
//!
//! Each extractor is a plain function from a [`Response`] to a typed value,
//! suitable for passing to [`RequestBuilder::fetch`](crate::RequestBuilder::fetch)
//! and friends. None of them look at the status code, so they work equally
//! on the response carried by a [`StatusError`](crate::StatusError).
//! [`as_string`] is the default used by the `text` helpers.

use crate::oauth::Token;
use crate::params;
use crate::{HttpClientError, Response, Result};
use bytes::{Buf, Bytes};
use http::StatusCode;
use serde::de::DeserializeOwned;
use std::collections::HashMap;

/// The response itself.
pub fn as_response(response: Response) -> Result<Response> {
    Ok(response)
}

/// The status code only.
pub fn as_status(response: Response) -> Result<StatusCode> {
    Ok(response.status())
}

/// The raw body buffer.
pub fn as_buffer(response: Response) -> Result<Bytes> {
    Ok(response.into_bytes())
}

/// The body as a UTF-8 string.
pub fn as_string(response: Response) -> Result<String> {
    String::from_utf8(response.into_bytes().to_vec())
        .map_err(|e| HttpClientError::Decode(format!("body is not UTF-8: {}", e)))
}

/// The body as an owned byte vector.
pub fn as_bytes(response: Response) -> Result<Vec<u8>> {
    Ok(response.into_bytes().to_vec())
}

/// The body as a blocking reader.
pub fn as_reader(response: Response) -> Result<bytes::buf::Reader<Bytes>> {
    Ok(response.into_bytes().reader())
}

/// The body parsed as XML into `T`.
pub fn as_xml<T: DeserializeOwned>(response: Response) -> Result<T> {
    let text = as_string(response)?;
    quick_xml::de::from_str(&text).map_err(|e| HttpClientError::Decode(format!("XML: {}", e)))
}

/// The body parsed as JSON into `T`.
pub fn as_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    serde_json::from_slice(response.bytes())
        .map_err(|e| HttpClientError::Decode(format!("JSON: {}", e)))
}

/// The body decoded as `key=value` pairs, in order.
pub fn as_param_list(response: Response) -> Result<Vec<(String, String)>> {
    let text = as_string(response)?;
    params::decode(text.trim())
}

/// The body decoded as `key=value` pairs, grouped by key.
pub fn as_param_map(response: Response) -> Result<HashMap<String, Vec<String>>> {
    let mut map: HashMap<String, Vec<String>> = HashMap::new();
    for (key, value) in as_param_list(response)? {
        map.entry(key).or_default().push(value);
    }
    Ok(map)
}

/// An OAuth token from `oauth_token` and `oauth_token_secret` parameters.
pub fn as_token(response: Response) -> Result<Token> {
    let params = as_param_map(response)?;
    let first = |name: &str| {
        params
            .get(name)
            .and_then(|values| values.first())
            .cloned()
            .ok_or_else(|| HttpClientError::Decode(format!("response has no {}", name)))
    };
    Ok(Token::new(first("oauth_token")?, first("oauth_token_secret")?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderMap;
    use serde::Deserialize;
    use std::io::Read;

    fn response(status: StatusCode, body: &'static str) -> Response {
        Response::new(status, HeaderMap::new(), Bytes::from_static(body.as_bytes()))
    }

    #[test]
    fn test_token_from_body() {
        let token = as_token(response(
            StatusCode::OK,
            "oauth_token=abc&oauth_token_secret=xyz",
        ))
        .unwrap();
        assert_eq!(token, Token::new("abc", "xyz"));
    }

    #[test]
    fn test_token_requires_both_fields() {
        let err = as_token(response(StatusCode::OK, "oauth_token=abc")).unwrap_err();
        assert!(matches!(err, HttpClientError::Decode(_)));
    }

    #[test]
    fn test_param_map_groups_repeats() {
        let map = as_param_map(response(StatusCode::OK, "a=1&b=2&a=3\n")).unwrap();
        assert_eq!(map["a"], vec!["1", "3"]);
        assert_eq!(map["b"], vec!["2"]);

        let list = as_param_list(response(StatusCode::OK, "a=1&b=2&a=3")).unwrap();
        assert_eq!(list.len(), 3);
        assert_eq!(list[2], ("a".to_string(), "3".to_string()));
    }

    #[test]
    fn test_string_and_bytes() {
        assert_eq!(as_string(response(StatusCode::OK, "héllo")).unwrap(), "héllo");
        assert_eq!(as_bytes(response(StatusCode::OK, "ab")).unwrap(), b"ab".to_vec());
        assert_eq!(
            as_buffer(response(StatusCode::OK, "ab")).unwrap(),
            Bytes::from_static(b"ab")
        );

        let invalid = Response::new(StatusCode::OK, HeaderMap::new(), vec![0xff, 0xfe]);
        assert!(as_string(invalid).is_err());
    }

    #[test]
    fn test_reader() {
        let mut out = String::new();
        as_reader(response(StatusCode::OK, "streamed"))
            .unwrap()
            .read_to_string(&mut out)
            .unwrap();
        assert_eq!(out, "streamed");
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Album {
        title: String,
        #[serde(rename = "track")]
        tracks: Vec<String>,
    }

    #[test]
    fn test_xml() {
        let album: Album = as_xml(response(
            StatusCode::OK,
            "<album><title>Blue</title><track>One</track><track>Two</track></album>",
        ))
        .unwrap();
        assert_eq!(
            album,
            Album {
                title: "Blue".to_string(),
                tracks: vec!["One".to_string(), "Two".to_string()],
            }
        );
    }

    #[test]
    fn test_json() {
        let value: serde_json::Value = as_json(response(StatusCode::OK, r#"{"id":7}"#)).unwrap();
        assert_eq!(value["id"], 7);
    }

    #[test]
    fn test_extractors_tolerate_error_status() {
        let body = "error=denied";
        assert_eq!(
            as_string(response(StatusCode::FORBIDDEN, body)).unwrap(),
            body
        );
        assert_eq!(
            as_status(response(StatusCode::FORBIDDEN, body)).unwrap(),
            StatusCode::FORBIDDEN
        );
        let map = as_param_map(response(StatusCode::INTERNAL_SERVER_ERROR, body)).unwrap();
        assert_eq!(map["error"], vec!["denied"]);
    }
}
