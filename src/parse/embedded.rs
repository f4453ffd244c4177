// src/parse/embedded.rs

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::{instrument, trace, warn};

use crate::error::{Error, Result};

static RESPONSE_DIV: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<div id="responseDiv" style="display:none">(.*?)</div>"#)
        .expect("responseDiv pattern should compile")
});

/// Pull the JSON payload out of the hidden `responseDiv` of a quote page.
#[instrument(level = "debug", skip(html), fields(len = html.len()))]
pub fn extract_embedded_json(html: &str) -> Result<Value> {
    let body: String = html.chars().filter(|c| *c != '\r' && *c != '\n').collect();

    let payload = RESPONSE_DIV
        .captures(&body)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| {
            warn!("responseDiv marker not found");
            Error::invalid("responseDiv marker not found")
        })?;
    trace!(payload_len = payload.len(), "captured responseDiv");

    serde_json::from_str(payload.trim())
        .map_err(|e| Error::invalid(format!("responseDiv is not JSON: {}", e)))
}
