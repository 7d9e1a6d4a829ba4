//! Strict parsing of vision model replies.

use serde::Deserialize;
use serde_json::{Map, Value};

use oneul_core::{
    types::{BaseEmotion, EmotionResult, ExtendedEmotion, WarningSign},
    Error, Result,
};

/// Subset of the Responses API reply body that carries text.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponsesReply {
    #[serde(default)]
    pub output_text: Option<String>,
    #[serde(default)]
    pub output: Vec<OutputItem>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputItem {
    #[serde(default)]
    pub content: Vec<ContentBlock>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

/// Pull the model's text out of a Responses API reply.
///
/// Prefers the aggregated `output_text`; otherwise concatenates every
/// `output_text` content block.
pub fn extract_output_text(reply: &ResponsesReply) -> Result<String> {
    if let Some(text) = reply.output_text.as_deref().map(str::trim) {
        if !text.is_empty() {
            return Ok(text.to_string());
        }
    }

    let joined: String = reply
        .output
        .iter()
        .flat_map(|item| item.content.iter())
        .filter(|block| block.kind.as_deref() == Some("output_text"))
        .filter_map(|block| block.text.as_deref())
        .collect();

    let joined = joined.trim();
    if joined.is_empty() {
        return Err(Error::upstream_format("model returned no text output"));
    }
    Ok(joined.to_string())
}

/// Validate the model's JSON reply against the closed taxonomies.
pub fn parse_emotion_reply(text: &str) -> Result<EmotionResult> {
    let value: Value = serde_json::from_str(strip_code_fence(text))
        .map_err(|e| Error::upstream_format(format!("model reply is not valid JSON: {}", e)))?;

    let fields = value
        .as_object()
        .ok_or_else(|| Error::upstream_format("model reply is not a JSON object"))?;

    let base_emotion = label_field(fields, "base_emotion", BaseEmotion::from_label)?;
    let extended_emotion = label_field(fields, "extended_emotion", ExtendedEmotion::from_label)?;

    let warning_signs = match fields.get("warning_signs") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => {
            let mut signs = Vec::with_capacity(items.len());
            for item in items {
                let label = item.as_str().ok_or_else(|| {
                    Error::upstream_format(format!("warning sign is not a string: {}", item))
                })?;
                let sign = WarningSign::from_label(label).ok_or_else(|| {
                    Error::upstream_format(format!("unsupported warning sign: {}", label))
                })?;
                if !signs.contains(&sign) {
                    signs.push(sign);
                }
            }
            signs
        }
        Some(other) => {
            return Err(Error::upstream_format(format!(
                "warning_signs must be an array, got {}",
                other
            )))
        }
    };

    let confidence = fields
        .get("confidence")
        .and_then(Value::as_f64)
        .ok_or_else(|| Error::upstream_format("confidence must be a number"))?;
    if !(0.0..=100.0).contains(&confidence) {
        return Err(Error::upstream_format(format!(
            "confidence out of range: {}",
            confidence
        )));
    }

    let summary = match fields.get("summary") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(other) => {
            return Err(Error::upstream_format(format!(
                "summary must be a string, got {}",
                other
            )))
        }
    };

    Ok(EmotionResult {
        base_emotion,
        extended_emotion,
        warning_signs,
        confidence: confidence.round() as u8,
        summary,
    })
}

fn label_field<T>(
    fields: &Map<String, Value>,
    name: &str,
    lookup: impl Fn(&str) -> Option<T>,
) -> Result<T> {
    let raw = fields
        .get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| Error::upstream_format(format!("{} is missing", name)))?;
    lookup(raw).ok_or_else(|| Error::upstream_format(format!("{} is not a known label: {}", name, raw)))
}

/// Drop a surrounding Markdown code fence, if any.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Skip the info string (e.g. "json") on the opening line.
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    body.trim_end().trim_end_matches("```").trim()
}
