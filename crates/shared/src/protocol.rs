use serde::{Deserialize, Serialize};

pub const TEMPLATES_PATH: &str = "/gif-templates";
pub const SWAP_PATH: &str = "/simple-swap";
pub const CREATE_DEMOS_PATH: &str = "/create-demos";
pub const HEALTH_PATH: &str = "/health";

pub const USER_FACE_FIELD: &str = "user_face";
pub const TEMPLATE_FIELD: &str = "gif_template";

/// The backend stores every uploaded face under this name regardless of the source file.
pub const CANONICAL_FACE_FILENAME: &str = "user_face.jpg";
pub const CANONICAL_FACE_MIME: &str = "image/jpeg";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemoTemplate {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemoCreationResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub templates: Vec<DemoTemplate>,
}

impl DemoCreationResponse {
    pub fn summary(&self) -> String {
        if self.success {
            self.message
                .clone()
                .unwrap_or_else(|| format!("{} demo templates created", self.templates.len()))
        } else {
            format!(
                "demo creation failed: {}",
                self.error.as_deref().unwrap_or("unknown error")
            )
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub detail: serde_json::Value,
}

impl ErrorDetail {
    pub fn into_text(self) -> String {
        match self.detail {
            serde_json::Value::String(text) => text,
            other => other.to_string(),
        }
    }
}
