//! Page state codec: `Page` ⇄ percent-encoded JSON.
//!
//! The transport (query parameter, file, clipboard) is the caller's
//! business; this module only fixes the string shape and validates on the
//! way in. Decoding never partially succeeds: a page either matches the
//! schema entirely or is rejected.

use crate::model::Page;
use crate::percent::{percent_decode, percent_encode};
use serde_json::error::Category;

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("percent-decoded page data is not UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("page data is not valid JSON: {0}")]
    Malformed(serde_json::Error),

    #[error("page data does not match the page schema: {0}")]
    Schema(serde_json::Error),

    #[error("block stored under key `{key}` carries id `{id}`")]
    IdMismatch { key: String, id: String },
}

impl From<serde_json::Error> for DecodeError {
    fn from(e: serde_json::Error) -> Self {
        match e.classify() {
            Category::Data => DecodeError::Schema(e),
            Category::Syntax | Category::Eof | Category::Io => DecodeError::Malformed(e),
        }
    }
}

/// Serialise a page to JSON text (no percent-encoding).
pub fn page_to_json(page: &Page) -> serde_json::Result<String> {
    serde_json::to_string(page)
}

/// Parse and validate JSON text as a page.
pub fn page_from_json(json: &str) -> Result<Page, DecodeError> {
    let page: Page = serde_json::from_str(json)?;
    for (key, block) in &page.blocks {
        if *key != block.id {
            return Err(DecodeError::IdMismatch {
                key: key.as_str().to_string(),
                id: block.id.as_str().to_string(),
            });
        }
    }
    Ok(page)
}

/// Encode a page as a transport-safe string.
pub fn encode_page(page: &Page) -> String {
    match page_to_json(page) {
        Ok(json) => percent_encode(&json),
        Err(e) => {
            log::error!("page `{}` could not be serialised: {e}", page.name);
            String::new()
        }
    }
}

/// Decode and validate a transport string.
pub fn decode_page(encoded: &str) -> Result<Page, DecodeError> {
    let json = percent_decode(encoded)?;
    page_from_json(&json)
}

/// Decode, or log the failure and return `fallback`.
pub fn decode_page_or(encoded: &str, fallback: Page) -> Page {
    match decode_page(encoded) {
        Ok(page) => page,
        Err(e) => {
            log::warn!("discarding saved page state: {e}");
            fallback
        }
    }
}
