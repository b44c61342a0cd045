use std::{fs, path::Path};

use anyhow::{anyhow, Context, Result};
use url::Url;

pub const SETTINGS_FILE: &str = "gifswap.toml";
pub const DEFAULT_ORIGIN: &str = "http://localhost:3000";
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;
pub const DEFAULT_DOWNLOAD_NAME: &str = "custom_swap.gif";
const LOOPBACK_API_BASE: &str = "http://localhost:3000/api";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    /// Origin the client considers its own; relative backend paths resolve against it.
    pub origin: String,
    pub api_base_url: Option<String>,
    pub max_image_bytes: usize,
    pub download_name: String,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            origin: DEFAULT_ORIGIN.into(),
            api_base_url: None,
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
            download_name: DEFAULT_DOWNLOAD_NAME.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub origin: Url,
    pub api_base: String,
}

impl ClientSettings {
    pub fn endpoints(&self) -> Result<Endpoints> {
        let origin = Url::parse(self.origin.trim())
            .with_context(|| format!("invalid origin '{}'", self.origin))?;
        if origin.cannot_be_a_base() {
            return Err(anyhow!("origin '{}' cannot be used as a base url", self.origin));
        }

        let api_base = match self.api_base_url.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => {
                let parsed = Url::parse(raw)
                    .with_context(|| format!("invalid api base url '{raw}'"))?;
                parsed.as_str().trim_end_matches('/').to_string()
            }
            _ => resolve_api_base(&origin),
        };

        Ok(Endpoints { origin, api_base })
    }
}

/// Loopback origins talk to the local dev backend; everything else serves the API under `/api`.
pub fn resolve_api_base(origin: &Url) -> String {
    match origin.host_str() {
        Some("localhost") | Some("127.0.0.1") => LOOPBACK_API_BASE.to_string(),
        _ => format!("{}/api", origin.origin().ascii_serialization()),
    }
}

pub fn load_settings() -> ClientSettings {
    load_settings_from(Path::new(SETTINGS_FILE), |key| std::env::var(key).ok())
}

pub fn load_settings_from(path: &Path, env: impl Fn(&str) -> Option<String>) -> ClientSettings {
    let mut settings = ClientSettings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        match toml::from_str::<toml::Table>(&raw) {
            Ok(file_cfg) => apply_file_settings(&mut settings, &file_cfg),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "ignoring unreadable settings file");
            }
        }
    }

    if let Some(v) = env("GIFSWAP_ORIGIN") {
        settings.origin = v;
    }
    if let Some(v) = env("APP__ORIGIN") {
        settings.origin = v;
    }

    if let Some(v) = env("GIFSWAP_API_BASE_URL") {
        settings.api_base_url = Some(v);
    }
    if let Some(v) = env("APP__API_BASE_URL") {
        settings.api_base_url = Some(v);
    }

    if let Some(v) = env("APP__MAX_IMAGE_BYTES") {
        if let Ok(parsed) = v.parse::<usize>() {
            settings.max_image_bytes = parsed;
        }
    }

    if let Some(v) = env("APP__DOWNLOAD_NAME") {
        settings.download_name = v;
    }

    settings
}

fn apply_file_settings(settings: &mut ClientSettings, file_cfg: &toml::Table) {
    if let Some(v) = file_cfg.get("origin").and_then(|v| v.as_str()) {
        settings.origin = v.to_string();
    }
    if let Some(v) = file_cfg.get("api_base_url").and_then(|v| v.as_str()) {
        settings.api_base_url = Some(v.to_string());
    }
    if let Some(v) = file_cfg
        .get("max_image_bytes")
        .and_then(|v| v.as_integer())
        .and_then(|v| usize::try_from(v).ok())
    {
        settings.max_image_bytes = v;
    }
    if let Some(v) = file_cfg.get("download_name").and_then(|v| v.as_str()) {
        settings.download_name = v.to_string();
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
