//! Query string and `application/x-www-form-urlencoded` codec.

use crate::{HttpClientError, Result};
use percent_encoding::percent_decode_str;

/// Content type of form-encoded bodies.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Encode parameter pairs, keeping their order and repeated keys.
pub fn encode<K, V>(params: &[(K, V)]) -> Result<String>
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let pairs: Vec<(&str, &str)> = params
        .iter()
        .map(|(k, v)| (k.as_ref(), v.as_ref()))
        .collect();
    serde_urlencoded::to_string(&pairs).map_err(|e| HttpClientError::RequestBuild(e.to_string()))
}

/// Decode a query string or form body into ordered pairs.
///
/// A leading `?` is ignored. Percent-escapes that do not form valid UTF-8
/// are rejected rather than replaced with U+FFFD.
pub fn decode(input: &str) -> Result<Vec<(String, String)>> {
    let input = input.strip_prefix('?').unwrap_or(input);
    // `&` and `=` are ASCII, so the whole input decodes to UTF-8 iff every
    // key and value does.
    percent_decode_str(input).decode_utf8().map_err(|e| {
        HttpClientError::Decode(format!("percent-escapes are not UTF-8 in {:?}: {}", input, e))
    })?;
    serde_urlencoded::from_str(input).map_err(|e| HttpClientError::Decode(e.to_string()))
}

/// True iff the URI carries a query string.
pub fn has_query(uri: &str) -> bool {
    uri.contains('?')
}

/// Split a URI into everything before the `?` and the raw query.
pub fn split_uri(uri: &str) -> (&str, Option<&str>) {
    match uri.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (uri, None),
    }
}

/// Decode the query string of a URI, empty if there is none.
pub fn query_params(uri: &str) -> Result<Vec<(String, String)>> {
    match split_uri(uri).1 {
        Some(query) => decode(query),
        None => Ok(Vec::new()),
    }
}

/// Append parameters to a URI.
///
/// The existing query is decoded first and the path re-derived from the
/// split, so a pre-encoded query is never double-encoded. The query is
/// re-encoded in canonical form (`%20` becomes `+`); an existing query whose
/// escapes are not UTF-8 cannot be carried over and fails with
/// [`HttpClientError::Decode`].
pub fn append_params<K, V>(uri: &str, extra: &[(K, V)]) -> Result<String>
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let (path, _) = split_uri(uri);
    let mut params = query_params(uri)?;
    params.extend(
        extra
            .iter()
            .map(|(k, v)| (k.as_ref().to_string(), v.as_ref().to_string())),
    );

    if params.is_empty() {
        return Ok(path.to_string());
    }
    Ok(format!("{}?{}", path, encode(&params)?))
}

/// The request target (path and query) the transport puts on the request line.
///
/// Absolute URIs lose their scheme and authority; relative ones get a leading
/// slash if they lack it.
pub fn request_target(uri: &str) -> Result<String> {
    match url::Url::parse(uri) {
        Ok(url) => {
            if url.cannot_be_a_base() {
                return Err(HttpClientError::InvalidUri(uri.to_string()));
            }
            Ok(match url.query() {
                Some(query) => format!("{}?{}", url.path(), query),
                None => url.path().to_string(),
            })
        }
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            if uri.starts_with('/') {
                Ok(uri.to_string())
            } else {
                Ok(format!("/{}", uri))
            }
        }
        Err(e) => Err(HttpClientError::InvalidUri(format!("{}: {}", uri, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_decode_inverts_encode() {
        let cases = [
            pairs(&[("a", "1"), ("b", "2")]),
            pairs(&[("tag", "x"), ("tag", "y"), ("tag", "x")]),
            pairs(&[("q", "hello world"), ("sym", "a+b=c&d"), ("empty", "")]),
            pairs(&[("ünï", "çødé"), ("slash", "/path/to?x")]),
        ];

        for params in cases {
            let encoded = encode(&params).unwrap();
            assert_eq!(decode(&encoded).unwrap(), params, "encoded: {}", encoded);
        }
    }

    #[test]
    fn test_non_utf8_escapes_are_rejected() {
        assert!(matches!(decode("x=%FF"), Err(HttpClientError::Decode(_))));
        assert!(matches!(decode("%C3=ok"), Err(HttpClientError::Decode(_))));
        assert!(append_params("/a?x=%FF", &[("y", "1")]).is_err());
        assert_eq!(decode("x=%C3%A9").unwrap(), pairs(&[("x", "é")]));
    }

    #[test]
    fn test_decode_bare_key() {
        assert_eq!(decode("?flag&a=1").unwrap(), pairs(&[("flag", ""), ("a", "1")]));
    }

    #[test]
    fn test_has_query() {
        assert!(has_query("/search?q=1"));
        assert!(has_query("http://example.com/?"));
        assert!(!has_query("/search"));
    }

    #[test]
    fn test_append_params_keeps_duplicates() {
        let uri = append_params("/items?tag=a", &[("tag", "b"), ("page", "2")]).unwrap();
        assert_eq!(uri, "/items?tag=a&tag=b&page=2");
    }

    #[test]
    fn test_append_params_reencodes_existing_query() {
        let uri = append_params("/s?q=hello%20world", &[("n", "1")]).unwrap();
        assert_eq!(uri, "/s?q=hello+world&n=1");
    }

    #[test]
    fn test_append_nothing_to_bare_path() {
        let empty: [(&str, &str); 0] = [];
        assert_eq!(append_params("/plain", &empty).unwrap(), "/plain");
    }

    #[test]
    fn test_request_target() {
        assert_eq!(
            request_target("https://api.example.com:8443/v1/users?id=7").unwrap(),
            "/v1/users?id=7"
        );
        assert_eq!(request_target("http://example.com").unwrap(), "/");
        assert_eq!(request_target("/v1/users").unwrap(), "/v1/users");
        assert_eq!(request_target("v1/users?x=1").unwrap(), "/v1/users?x=1");
        assert!(request_target("mailto:someone@example.com").is_err());
    }
}
