//! Field validation shared by the JSON and multipart endpoints.

use oneul_core::{Error, Result};

/// A non-blank string field, returned as sent.
pub fn required(value: Option<String>, field: &str) -> Result<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| Error::invalid_request(format!("{} is required", field)))
}

/// An absolute http(s) URL with a host.
pub fn required_url(value: Option<String>, field: &str) -> Result<String> {
    let raw = required(value, field)?.trim().to_string();
    let parsed = url::Url::parse(&raw)
        .map_err(|e| Error::invalid_request(format!("{} is not a valid URL: {}", field, e)))?;

    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(Error::invalid_request(format!(
            "{} must be an http(s) URL",
            field
        )));
    }
    Ok(raw)
}

/// A JSON-encoded question/answer mapping, returned unmodified.
pub fn conversation(value: Option<String>) -> Result<String> {
    let raw = value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| Error::invalid_request("conversation is required"))?;

    let parsed: serde_json::Value = serde_json::from_str(&raw).map_err(|e| {
        Error::invalid_request(format!("conversation must be a JSON-encoded object: {}", e))
    })?;
    if !parsed.is_object() {
        return Err(Error::invalid_request(
            "conversation must be a JSON-encoded object",
        ));
    }
    Ok(raw)
}
