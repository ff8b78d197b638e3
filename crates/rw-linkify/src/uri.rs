//! URI decoding and encoding for link labels and targets.
//!
//! Failures never escape this module's public helpers: a malformed URI is
//! shown and linked exactly as the user typed it.

use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};

use crate::patterns::strip_http_prefix;

/// Characters escaped when encoding a full URI.
///
/// Reserved characters (`;/?:@&=+$,#`) and unreserved marks (`-_.!~*'()`)
/// are kept so an already valid URI round-trips unchanged.
const URI_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// Error while decoding a percent-encoded URI.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum UriError {
    /// A `%` not followed by two hex digits.
    #[error("malformed percent escape at byte {0}")]
    MalformedEscape(usize),

    /// The decoded bytes are not UTF-8.
    #[error("decoded URI is not valid UTF-8")]
    InvalidUtf8(#[from] std::str::Utf8Error),
}

/// Decode every percent escape in `s`.
///
/// # Errors
///
/// Returns [`UriError::MalformedEscape`] for a truncated or non-hex escape and
/// [`UriError::InvalidUtf8`] when the decoded bytes are not UTF-8.
pub fn decode_uri_component(s: &str) -> Result<String, UriError> {
    let bytes = s.as_bytes();
    for (index, _) in s.match_indices('%') {
        let well_formed = bytes
            .get(index + 1..index + 3)
            .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit));
        if !well_formed {
            return Err(UriError::MalformedEscape(index));
        }
    }
    Ok(percent_decode_str(s).decode_utf8()?.into_owned())
}

/// Percent-encode characters that are not allowed anywhere in a URI.
#[must_use]
pub fn encode_uri(s: &str) -> String {
    utf8_percent_encode(s, URI_ENCODE_SET).to_string()
}

/// Human-readable form of a URL: decoded, without scheme or `www.`.
///
/// Falls back to `url` unchanged when it cannot be decoded.
///
/// # Examples
///
/// ```
/// use rw_linkify::format_url_for_display;
///
/// assert_eq!(format_url_for_display("https://www.example.com/a%20b"), "example.com/a b");
/// assert_eq!(format_url_for_display("https://example.com/%zz"), "https://example.com/%zz");
/// ```
#[must_use]
pub fn format_url_for_display(url: &str) -> String {
    match decode_uri_component(url) {
        Ok(decoded) => strip_http_prefix(&decoded).to_owned(),
        Err(e) => {
            tracing::debug!(url, error = %e, "Keeping undecodable URL as display text");
            url.to_owned()
        }
    }
}

/// Normalize a link target by decoding then re-encoding it.
///
/// Falls back to `url` unchanged when it cannot be decoded.
#[must_use]
pub fn normalize_href(url: &str) -> String {
    match decode_uri_component(url) {
        Ok(decoded) => encode_uri(&decoded),
        Err(e) => {
            tracing::debug!(url, error = %e, "Keeping undecodable URL as link target");
            url.to_owned()
        }
    }
}
