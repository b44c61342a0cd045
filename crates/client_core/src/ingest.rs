use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use shared::error::WorkflowError;

pub const NOT_AN_IMAGE: &str = "not an image";
pub const EMPTY_FILE: &str = "empty file";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub name: String,
    pub declared_type: String,
    pub bytes: Vec<u8>,
}

/// Decoded, previewable photo. Only produced by [`decode_preview`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserImage {
    source_name: String,
    mime_type: String,
    byte_len: usize,
    preview: String,
}

impl UserImage {
    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn byte_len(&self) -> usize {
        self.byte_len
    }

    pub fn preview(&self) -> &str {
        &self.preview
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, String> {
        let (_, payload) = self
            .preview
            .strip_prefix("data:")
            .and_then(|rest| rest.split_once(";base64,"))
            .ok_or_else(|| "preview is not a base64 data uri".to_string())?;
        STANDARD
            .decode(payload)
            .map_err(|err| format!("preview payload is not valid base64: {err}"))
    }
}

pub fn is_image_type(declared_type: &str) -> bool {
    declared_type
        .trim()
        .to_ascii_lowercase()
        .starts_with("image/")
}

pub fn validate(file: &ImageFile, max_bytes: usize) -> Result<(), WorkflowError> {
    if !is_image_type(&file.declared_type) {
        return Err(WorkflowError::validation(NOT_AN_IMAGE));
    }
    if file.bytes.is_empty() {
        return Err(WorkflowError::validation(EMPTY_FILE));
    }
    if file.bytes.len() > max_bytes {
        return Err(WorkflowError::validation(format!(
            "image is {} bytes, limit is {max_bytes}",
            file.bytes.len()
        )));
    }
    Ok(())
}

pub async fn decode_preview(file: ImageFile) -> Result<UserImage, WorkflowError> {
    tokio::task::spawn_blocking(move || {
        let mime_type = file.declared_type.trim().to_ascii_lowercase();
        let preview = format!("data:{mime_type};base64,{}", STANDARD.encode(&file.bytes));
        UserImage {
            source_name: file.name,
            mime_type,
            byte_len: file.bytes.len(),
            preview,
        }
    })
    .await
    .map_err(|err| WorkflowError::validation(format!("image decode aborted: {err}")))
}

#[cfg(test)]
#[path = "tests/ingest_tests.rs"]
mod tests;
