//! Audio shout-detection endpoints.

use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartRejection, rejection::JsonRejection, Multipart, State},
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use oneul_core::{
    types::{MediaKind, MediaUpload, ShoutDetection},
    Error,
};

use crate::form::read_form;
use crate::response::ApiError;
use crate::server::AppState;
use crate::validation::{conversation, required, required_url};

/// Multipart field carrying the audio clip.
pub const AUDIO_FIELD: &str = "audio_file";

/// Audio analysis request.
#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub session_id: Option<String>,
    pub user_id: Option<String>,
    /// JSON-encoded question/answer mapping, echoed back untouched.
    pub conversation: Option<String>,
    pub audio_url: Option<String>,
}

/// Audio analysis response.
#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub success: bool,
    pub session_id: String,
    pub user_id: String,
    pub conversation: String,
    pub audio_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_key: Option<String>,
    pub shout_detection: ShoutDetection,
    /// Set when the clip could not be analyzed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
}

impl AnalyzeResponse {
    fn new(session_id: String, user_id: String, conversation: String, audio_url: String) -> Self {
        Self {
            success: true,
            session_id,
            user_id,
            conversation,
            audio_url,
            object_key: None,
            shout_detection: ShoutDetection::absent(),
            error: None,
            code: None,
        }
    }
}

/// `POST /analyze/`
pub async fn analyze_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let Json(request) = payload?;
    let session_id = required(request.session_id, "session_id")?;
    let user_id = required(request.user_id, "user_id")?;
    let conversation = conversation(request.conversation)?;
    let audio_url = required_url(request.audio_url, "audio_url")?;

    let audio = state.audio.fetch(&audio_url).await?;
    let response = AnalyzeResponse::new(session_id, user_id, conversation, audio_url);

    Ok(Json(run_detection(&state, response, audio).await?))
}

/// `POST /analyze/upload`
pub async fn analyze_upload_handler(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let mut form = read_form(multipart?, AUDIO_FIELD).await?;
    let session_id = required(form.take_text("session_id"), "session_id")?;
    let user_id = required(form.take_text("user_id"), "user_id")?;
    let conversation = conversation(form.take_text("conversation"))?;
    let file = form.take_file(AUDIO_FIELD)?;

    let audio = file.data.clone();
    let stored = state
        .audio
        .store_audio(MediaUpload {
            kind: MediaKind::Audio,
            session_id: session_id.clone(),
            filename: file.filename,
            content_type: file.content_type,
            data: file.data,
        })
        .await?;
    tracing::info!(session_id = %session_id, key = %stored.key, "Audio stored");

    let mut response = AnalyzeResponse::new(session_id, user_id, conversation, stored.url);
    response.object_key = Some(stored.key);

    Ok(Json(run_detection(&state, response, audio).await?))
}

/// Undecodable audio degrades to `success: false` with the absent shape;
/// every other failure is an error response.
async fn run_detection(
    state: &AppState,
    mut response: AnalyzeResponse,
    audio: Bytes,
) -> Result<AnalyzeResponse, ApiError> {
    match state.audio.detect(audio).await {
        Ok(shout) => response.shout_detection = shout,
        Err(err @ Error::Detection(_)) => {
            response.success = false;
            response.code = Some(err.code());
            response.error = Some(err.to_string());
        }
        Err(err) => return Err(err.into()),
    }
    Ok(response)
}
