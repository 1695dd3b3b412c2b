//! `encodeURIComponent`-compatible percent-encoding for page state.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use std::str::Utf8Error;

/// Everything but ASCII alphanumerics and `- _ . ! ~ * ' ( )`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

pub fn percent_encode(input: &str) -> String {
    utf8_percent_encode(input, COMPONENT).to_string()
}

/// Decode `%XX` escapes. A `%` not followed by two hex digits is kept
/// literally, as `URLSearchParams` does; the decoded bytes must be UTF-8.
pub fn percent_decode(input: &str) -> Result<String, Utf8Error> {
    percent_decode_str(input)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
}
