//! Image emotion endpoints.

use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartRejection, rejection::JsonRejection, Multipart, State},
    Json,
};
use serde::{Deserialize, Serialize};

use oneul_core::types::{EmotionCategories, EmotionResult, MediaKind, MediaUpload};

use crate::form::read_form;
use crate::response::ApiError;
use crate::server::AppState;
use crate::validation::{required, required_url};

/// Multipart field carrying the image.
pub const IMAGE_FIELD: &str = "image_file";

/// Context analysis request.
#[derive(Debug, Deserialize)]
pub struct ContextRequest {
    pub session_id: Option<String>,
    pub user_id: Option<String>,
    pub photo_url: Option<String>,
}

/// Context analysis response.
#[derive(Debug, Serialize)]
pub struct ContextResponse {
    pub success: bool,
    pub session_id: String,
    pub user_id: String,
    pub photo_url: String,
    /// Storage key of an uploaded image.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_key: Option<String>,
    pub analysis: EmotionResult,
    /// Label sets the analysis was drawn from.
    pub categories: EmotionCategories,
}

/// `POST /context/`
pub async fn context_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ContextRequest>, JsonRejection>,
) -> Result<Json<ContextResponse>, ApiError> {
    let Json(request) = payload?;
    let session_id = required(request.session_id, "session_id")?;
    let user_id = required(request.user_id, "user_id")?;
    let photo_url = required_url(request.photo_url, "photo_url")?;

    tracing::info!(session_id = %session_id, user_id = %user_id, "Classifying photo by URL");
    let analysis = state.vision.analyze_url(&photo_url).await?;

    Ok(Json(ContextResponse {
        success: true,
        session_id,
        user_id,
        photo_url,
        object_key: None,
        analysis,
        categories: EmotionCategories::new(),
    }))
}

/// `POST /context/upload`
pub async fn context_upload_handler(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ContextResponse>, ApiError> {
    let mut form = read_form(multipart?, IMAGE_FIELD).await?;
    let session_id = required(form.take_text("session_id"), "session_id")?;
    let user_id = required(form.take_text("user_id"), "user_id")?;
    let file = form.take_file(IMAGE_FIELD)?;

    tracing::info!(
        session_id = %session_id,
        user_id = %user_id,
        size = file.data.len(),
        "Classifying uploaded photo"
    );

    let (stored, analysis) = state
        .vision
        .analyze_upload(MediaUpload {
            kind: MediaKind::Image,
            session_id: session_id.clone(),
            filename: file.filename,
            content_type: file.content_type,
            data: file.data,
        })
        .await?;

    Ok(Json(ContextResponse {
        success: true,
        session_id,
        user_id,
        photo_url: stored.url,
        object_key: Some(stored.key),
        analysis,
        categories: EmotionCategories::new(),
    }))
}
