//! `multipart/form-data` bodies with a fixed boundary.

use crate::{HttpClientError, Result};
use bytes::{BufMut, Bytes, BytesMut};

/// Boundary shared by every multipart body this crate produces.
pub const BOUNDARY: &str = "----ArmatureFluentBoundary7MA4YWxkTrZu0gW";

/// Content type used for text parts.
pub const TEXT_MIME: &str = "text/plain; charset=utf-8";

/// `Content-Type` header value for multipart bodies.
pub fn content_type() -> String {
    format!("multipart/form-data; boundary={}", BOUNDARY)
}

/// One section of a multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiPart {
    /// Form field name.
    pub name: String,
    /// File name; empty for plain text fields.
    pub filename: String,
    /// MIME type of the data.
    pub mime_type: String,
    /// Raw content.
    pub data: Bytes,
}

impl MultiPart {
    /// A text field, UTF-8 encoded.
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            filename: String::new(),
            mime_type: TEXT_MIME.to_string(),
            data: Bytes::from(value.into()),
        }
    }

    /// A file field.
    pub fn file(
        name: impl Into<String>,
        filename: impl Into<String>,
        mime_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        Self {
            name: name.into(),
            filename: filename.into(),
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// True if the part carries a file name.
    pub fn is_file(&self) -> bool {
        !self.filename.is_empty()
    }

    /// The data as text, if it is valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.data).ok()
    }
}

fn escape_quoted(value: &str) -> String {
    value
        .replace('"', "%22")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Serialize parts in order.
pub fn encode(parts: &[MultiPart]) -> Bytes {
    let mut buf = BytesMut::new();

    for part in parts {
        buf.put_slice(b"--");
        buf.put_slice(BOUNDARY.as_bytes());
        buf.put_slice(b"\r\n");

        let mut disposition = format!(
            "Content-Disposition: form-data; name=\"{}\"",
            escape_quoted(&part.name)
        );
        if part.is_file() {
            disposition.push_str(&format!("; filename=\"{}\"", escape_quoted(&part.filename)));
        }
        buf.put_slice(disposition.as_bytes());
        buf.put_slice(b"\r\n");

        if part.is_file() {
            buf.put_slice(format!("Content-Type: {}\r\n", part.mime_type).as_bytes());
        }

        buf.put_slice(b"\r\n");
        buf.put_slice(&part.data);
        buf.put_slice(b"\r\n");
    }

    buf.put_slice(b"--");
    buf.put_slice(BOUNDARY.as_bytes());
    buf.put_slice(b"--\r\n");

    buf.freeze()
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn malformed(reason: &str) -> HttpClientError {
    HttpClientError::Decode(format!("malformed multipart body: {}", reason))
}

/// Parse a body produced with [`BOUNDARY`] back into parts.
pub fn decode(body: &[u8]) -> Result<Vec<MultiPart>> {
    let delimiter = format!("--{}", BOUNDARY);
    let separator = format!("\r\n--{}", BOUNDARY);

    let start = find(body, delimiter.as_bytes()).ok_or_else(|| malformed("no boundary"))?;
    let mut rest = &body[start + delimiter.len()..];
    let mut parts = Vec::new();

    loop {
        if rest.starts_with(b"--") {
            return Ok(parts);
        }
        rest = rest
            .strip_prefix(b"\r\n")
            .ok_or_else(|| malformed("missing line break after boundary"))?;

        let end = find(rest, separator.as_bytes()).ok_or_else(|| malformed("unterminated part"))?;
        parts.push(decode_part(&rest[..end])?);
        rest = &rest[end + separator.len()..];
    }
}

fn decode_part(section: &[u8]) -> Result<MultiPart> {
    let header_end = find(section, b"\r\n\r\n").ok_or_else(|| malformed("part without headers"))?;
    let headers = std::str::from_utf8(&section[..header_end])
        .map_err(|_| malformed("part headers are not UTF-8"))?;

    let mut part = MultiPart {
        name: String::new(),
        filename: String::new(),
        mime_type: TEXT_MIME.to_string(),
        data: Bytes::copy_from_slice(&section[header_end + 4..]),
    };
    let mut has_name = false;

    for line in headers.split("\r\n") {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        if name.eq_ignore_ascii_case("content-disposition") {
            for attr in value.split(';').map(str::trim) {
                match attr.split_once('=') {
                    Some(("name", v)) => {
                        part.name = v.trim_matches('"').to_string();
                        has_name = true;
                    }
                    Some(("filename", v)) => part.filename = v.trim_matches('"').to_string(),
                    _ => {}
                }
            }
        } else if name.eq_ignore_ascii_case("content-type") {
            part.mime_type = value.to_string();
        }
    }

    if !has_name {
        return Err(malformed("part without a name"));
    }
    Ok(part)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<MultiPart> {
        vec![
            MultiPart::text("a", "1"),
            MultiPart::file("b", "f.txt", "text/plain", "hi"),
        ]
    }

    #[test]
    fn test_encode_layout() {
        let body = encode(&sample());
        let text = std::str::from_utf8(&body).unwrap();

        let expected = format!(
            "--{b}\r\n\
             Content-Disposition: form-data; name=\"a\"\r\n\
             \r\n\
             1\r\n\
             --{b}\r\n\
             Content-Disposition: form-data; name=\"b\"; filename=\"f.txt\"\r\n\
             Content-Type: text/plain\r\n\
             \r\n\
             hi\r\n\
             --{b}--\r\n",
            b = BOUNDARY
        );
        assert_eq!(text, expected);
        assert_eq!(text.matches(&format!("--{}\r\n", BOUNDARY)).count(), 2);
    }

    #[test]
    fn test_decode_recovers_parts() {
        let decoded = decode(&encode(&sample())).unwrap();
        assert_eq!(decoded, sample());
        assert_eq!(decoded[0].as_str(), Some("1"));
        assert!(decoded[1].is_file());
    }

    #[test]
    fn test_binary_data_survives() {
        let data: Vec<u8> = (0u8..=255).collect();
        let parts = vec![MultiPart::file(
            "blob",
            "raw.bin",
            "application/octet-stream",
            data.clone(),
        )];
        let decoded = decode(&encode(&parts)).unwrap();
        assert_eq!(decoded[0].data.as_ref(), data.as_slice());
    }

    #[test]
    fn test_empty_part_list() {
        let body = encode(&[]);
        assert_eq!(body, Bytes::from(format!("--{}--\r\n", BOUNDARY)));
        assert!(decode(&body).unwrap().is_empty());
    }

    #[test]
    fn test_quotes_in_names_are_escaped() {
        let body = encode(&[MultiPart::text("we\"ird", "x")]);
        let text = std::str::from_utf8(&body).unwrap();
        assert!(text.contains("name=\"we%22ird\""));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode(b"not multipart at all").is_err());
        let truncated = format!(
            "--{}\r\nContent-Disposition: form-data; name=\"a\"\r\n\r\n1",
            BOUNDARY
        );
        assert!(decode(truncated.as_bytes()).is_err());
    }
}
