//! OpenAI Responses API client for emotion classification.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::Engine;
use secrecy::{ExposeSecret, Secret};
use serde_json::{json, Value};

use oneul_core::{
    config::VisionConfig,
    traits::EmotionClassifier,
    types::{EmotionResult, ImageSource},
    Error, Result,
};

use crate::prompt::{classification_prompt, SYSTEM_PROMPT};
use crate::reply::{extract_output_text, parse_emotion_reply, ResponsesReply};

/// Longest slice of a provider error body kept in logs.
const MAX_LOGGED_BODY: usize = 512;

/// Vision classifier backed by the OpenAI Responses API.
pub struct OpenAiVisionClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: Secret<String>,
    model: String,
    temperature: f32,
    top_p: f32,
}

impl OpenAiVisionClient {
    /// Create a client from configuration. Requires `vision.api_key`.
    pub fn from_config(config: &VisionConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| Error::config("vision.api_key (OPENAI_API_KEY) is required"))?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
            top_p: config.top_p,
        })
    }

    /// Model identifier sent with every request.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Build the Responses API request body for an image.
    pub fn build_request(&self, image: &ImageSource) -> Value {
        json!({
            "model": self.model,
            "input": [
                {
                    "role": "system",
                    "content": [
                        { "type": "input_text", "text": SYSTEM_PROMPT }
                    ]
                },
                {
                    "role": "user",
                    "content": [
                        { "type": "input_text", "text": classification_prompt() },
                        { "type": "input_image", "image_url": image_url(image) }
                    ]
                }
            ],
            "temperature": self.temperature,
            "top_p": self.top_p,
        })
    }

    async fn request_classification(&self, image: &ImageSource) -> Result<EmotionResult> {
        let payload = self.build_request(image);

        tracing::info!(model = %self.model, image = %image.describe(), "Requesting emotion classification");

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(self.api_key.expose_secret())
            .json(&payload)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                status = %status,
                body = %truncate(&body, MAX_LOGGED_BODY),
                "Vision provider rejected the request"
            );
            return Err(Error::upstream(format!(
                "vision provider rejected the request ({})",
                status
            )));
        }

        let reply: ResponsesReply = response.json().await.map_err(|e| {
            if e.is_timeout() {
                Error::upstream_timeout("vision provider timed out while sending the reply")
            } else {
                Error::upstream_format(format!("unreadable provider reply: {}", e))
            }
        })?;

        let text = extract_output_text(&reply)?;
        tracing::debug!(raw = %text, "Vision model raw reply");

        parse_emotion_reply(&text)
    }
}

#[async_trait]
impl EmotionClassifier for OpenAiVisionClient {
    async fn classify(&self, image: &ImageSource) -> Result<EmotionResult> {
        let started = Instant::now();
        let result = self.request_classification(image).await;

        metrics::histogram!(
            "vision_request_duration_seconds",
            "model" => self.model.clone(),
            "outcome" => outcome(&result)
        )
        .record(started.elapsed().as_secs_f64());

        match &result {
            Ok(analysis) => {
                metrics::counter!(
                    "emotion_classifications_total",
                    "base_emotion" => analysis.base_emotion.label()
                )
                .increment(1);
            }
            Err(e) => {
                tracing::warn!(error = %e, code = e.code(), "Emotion classification failed");
            }
        }

        result
    }
}

/// Metric label for a classification attempt.
fn outcome(result: &Result<EmotionResult>) -> &'static str {
    match result {
        Ok(_) => "ok",
        Err(e) => e.code(),
    }
}

fn image_url(image: &ImageSource) -> String {
    match image {
        ImageSource::Url(url) => url.clone(),
        ImageSource::Inline { data, mime_type } => format!(
            "data:{};base64,{}",
            mime_type,
            base64::engine::general_purpose::STANDARD.encode(data)
        ),
    }
}

fn transport_error(err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::upstream_timeout("vision provider timed out")
    } else {
        Error::upstream(format!("vision provider unreachable: {}", err))
    }
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
