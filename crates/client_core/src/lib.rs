use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client, Response,
};
use serde::de::DeserializeOwned;
use shared::{
    error::WorkflowError,
    protocol::{
        DemoCreationResponse, ErrorDetail, HealthResponse, SwapResponse, CREATE_DEMOS_PATH,
        HEALTH_PATH, SWAP_PATH, TEMPLATES_PATH, TEMPLATE_FIELD, USER_FACE_FIELD,
    },
};
use tracing::{debug, info, warn};
use url::Url;

pub mod catalog;
pub mod config;
pub mod driver;
pub mod ingest;
pub mod presenter;
pub mod workflow;

pub use config::{ClientSettings, Endpoints};
pub use driver::WorkflowDriver;
pub use workflow::{SwapRequest, WorkflowContext, WorkflowEvent, WorkflowState};

/// Resolves a backend-relative resource path against the client origin.
/// Absolute and scheme-relative paths are refused; the result never leaves the origin.
pub fn resolve_resource(origin: &Url, path: &str) -> Option<Url> {
    let path = path.trim();
    if path.is_empty() || path.starts_with("//") || path.starts_with('\\') || Url::parse(path).is_ok()
    {
        return None;
    }
    origin
        .join(path)
        .ok()
        .filter(|resolved| resolved.origin() == origin.origin())
}

#[async_trait]
pub trait SwapBackend: Send + Sync {
    async fn fetch_catalog(&self) -> std::result::Result<serde_json::Value, WorkflowError>;
    async fn submit_swap(
        &self,
        request: SwapRequest,
    ) -> std::result::Result<SwapResponse, WorkflowError>;
}

pub struct SwapClient {
    http: Client,
    api_base: String,
}

impl SwapClient {
    pub fn new(api_base: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_endpoints(endpoints: &Endpoints) -> Self {
        Self::new(endpoints.api_base.clone())
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    pub async fn create_demos(&self) -> Result<DemoCreationResponse> {
        let url = format!("{}{CREATE_DEMOS_PATH}", self.api_base);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("failed to reach {url}"))?;
        let body = read_json(response).await?;
        Ok(body)
    }

    pub async fn health(&self) -> Result<HealthResponse> {
        let url = format!("{}{HEALTH_PATH}", self.api_base);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("failed to reach {url}"))?;
        let body = read_json(response).await?;
        Ok(body)
    }

    pub async fn download_artifact(&self, url: &str) -> Result<Vec<u8>> {
        let bytes = self
            .http
            .get(url)
            .send()
            .await
            .with_context(|| format!("failed to reach {url}"))?
            .error_for_status()?
            .bytes()
            .await?;
        info!(%url, bytes = bytes.len(), "artifact downloaded");
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl SwapBackend for SwapClient {
    async fn fetch_catalog(&self) -> std::result::Result<serde_json::Value, WorkflowError> {
        let url = format!("{}{TEMPLATES_PATH}", self.api_base);
        debug!(%url, "fetching template catalog");
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(WorkflowError::network)?;
        read_json(response).await
    }

    async fn submit_swap(
        &self,
        request: SwapRequest,
    ) -> std::result::Result<SwapResponse, WorkflowError> {
        let url = format!("{}{SWAP_PATH}", self.api_base);
        let face = Part::bytes(request.image_bytes().to_vec())
            .file_name(request.file_name())
            .mime_str(request.image_mime_type())
            .map_err(WorkflowError::network)?;
        let form = Form::new()
            .part(USER_FACE_FIELD, face)
            .text(TEMPLATE_FIELD, request.template_id().to_string());

        debug!(
            %url,
            submission_id = request.submission_id().0,
            "posting swap request"
        );
        let response = self
            .http
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(WorkflowError::network)?;
        read_json(response).await
    }
}

async fn read_json<T: DeserializeOwned>(
    response: Response,
) -> std::result::Result<T, WorkflowError> {
    let status = response.status();
    if !status.is_success() {
        let detail = response
            .json::<ErrorDetail>()
            .await
            .ok()
            .map(ErrorDetail::into_text);
        warn!(status = status.as_u16(), detail = ?detail, "backend returned error status");
        return Err(WorkflowError::server(status.as_u16(), detail));
    }

    response
        .json::<T>()
        .await
        .map_err(|err| WorkflowError::network(format!("malformed response body: {err}")))
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
