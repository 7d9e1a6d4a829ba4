//! Multipart form collection.

use std::collections::HashMap;

use axum::extract::{multipart::MultipartError, Multipart};
use bytes::Bytes;

use oneul_core::{Error, Result};

use crate::response::body_error;

/// A file part of a multipart form.
#[derive(Debug, Clone)]
pub struct FilePart {
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// Text fields plus at most one file field.
#[derive(Debug, Default)]
pub struct UploadForm {
    fields: HashMap<String, String>,
    pub file: Option<FilePart>,
}

impl UploadForm {
    /// Remove and return a text field.
    pub fn take_text(&mut self, name: &str) -> Option<String> {
        self.fields.remove(name)
    }

    /// The file part, which must be present and non-empty.
    pub fn take_file(&mut self, name: &str) -> Result<FilePart> {
        self.file
            .take()
            .filter(|file| !file.data.is_empty())
            .ok_or_else(|| Error::invalid_request(format!("{} is required", name)))
    }
}

/// Read every part of a multipart body; `file_field` is read as bytes.
pub async fn read_form(mut multipart: Multipart, file_field: &str) -> Result<UploadForm> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| field_error("malformed multipart body", e))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if name == file_field {
            let filename = field.file_name().map(str::to_string);
            let content_type = field.content_type().map(str::to_string);
            let data = field
                .bytes()
                .await
                .map_err(|e| field_error(&format!("failed to read {}", name), e))?;
            form.file = Some(FilePart {
                filename,
                content_type,
                data,
            });
        } else {
            let text = field
                .text()
                .await
                .map_err(|e| field_error(&format!("failed to read {}", name), e))?;
            form.fields.insert(name, text);
        }
    }

    Ok(form)
}

fn field_error(context: &str, err: MultipartError) -> Error {
    body_error(err.status(), format!("{}: {}", context, err))
}
