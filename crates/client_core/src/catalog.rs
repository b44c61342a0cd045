use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::{
    domain::{Template, TemplateId},
    error::WorkflowError,
};
use tracing::{debug, info, warn};
use url::Url;

use crate::resolve_resource;

pub const PLACEHOLDER_THUMBNAIL: &str =
    "https://via.placeholder.com/150x150/667eea/white?text=GIF+Template";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "templates", rename_all = "snake_case")]
pub enum Catalog {
    #[default]
    NotLoaded,
    Loaded(Vec<Template>),
    Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    Reload,
    CreateDemos,
}

impl Catalog {
    pub fn templates(&self) -> &[Template] {
        match self {
            Self::Loaded(templates) => templates,
            Self::NotLoaded | Self::Unavailable => &[],
        }
    }

    pub fn count(&self) -> Option<usize> {
        match self {
            Self::Loaded(templates) => Some(templates.len()),
            Self::NotLoaded | Self::Unavailable => None,
        }
    }

    pub fn find(&self, id: &TemplateId) -> Option<&Template> {
        self.templates().iter().find(|template| &template.id == id)
    }

    pub fn recovery_actions(&self) -> Vec<RecoveryAction> {
        if self.templates().is_empty() {
            vec![RecoveryAction::Reload, RecoveryAction::CreateDemos]
        } else {
            Vec::new()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogUpdate {
    pub catalog: Option<Catalog>,
    pub status: String,
}

pub fn apply_catalog_response(result: Result<Value, WorkflowError>) -> CatalogUpdate {
    match result {
        Ok(payload) => match parse_catalog(payload) {
            Ok(ParsedCatalog { templates, skipped }) => {
                info!(count = templates.len(), skipped, "template catalog loaded");
                let status = if skipped == 0 {
                    format!("{} templates loaded", templates.len())
                } else {
                    format!("{} templates loaded ({skipped} skipped)", templates.len())
                };
                CatalogUpdate {
                    status,
                    catalog: Some(Catalog::Loaded(templates)),
                }
            }
            Err(reason) => {
                warn!(%reason, "template catalog payload rejected");
                CatalogUpdate {
                    catalog: Some(Catalog::Unavailable),
                    status: format!("Error loading templates: {reason}"),
                }
            }
        },
        Err(err) => {
            warn!(kind = ?err.kind(), error = %err, "template catalog request failed");
            CatalogUpdate {
                catalog: None,
                status: format!("Error loading templates: {err}"),
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCatalog {
    pub templates: Vec<Template>,
    pub skipped: usize,
}

/// Only a non-list payload is an error. Entries without a usable id are skipped and counted.
pub fn parse_catalog(payload: Value) -> Result<ParsedCatalog, String> {
    let entries = match payload {
        Value::Array(entries) => entries,
        other => return Err(format!("expected a template list, got {}", json_kind(&other))),
    };

    let mut parsed = ParsedCatalog {
        templates: Vec::with_capacity(entries.len()),
        skipped: 0,
    };
    for (index, entry) in entries.into_iter().enumerate() {
        match serde_json::from_value::<Template>(entry) {
            Ok(mut template) => {
                if template.name.trim().is_empty() {
                    template.name = template.id.to_string();
                }
                parsed.templates.push(template);
            }
            Err(err) => {
                debug!(index, error = %err, "skipping catalog entry");
                parsed.skipped += 1;
            }
        }
    }
    Ok(parsed)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateCard {
    pub id: TemplateId,
    pub name: String,
    pub thumbnail_url: String,
    pub selected: bool,
}

pub fn template_cards(
    catalog: &Catalog,
    selected: Option<&TemplateId>,
    origin: &Url,
) -> Vec<TemplateCard> {
    catalog
        .templates()
        .iter()
        .map(|template| TemplateCard {
            id: template.id.clone(),
            name: template.name.clone(),
            thumbnail_url: thumbnail_url(origin, &template.thumbnail),
            selected: selected == Some(&template.id),
        })
        .collect()
}

pub fn thumbnail_url(origin: &Url, thumbnail: &str) -> String {
    resolve_resource(origin, thumbnail)
        .map(String::from)
        .unwrap_or_else(|| PLACEHOLDER_THUMBNAIL.to_string())
}

#[cfg(test)]
#[path = "tests/catalog_tests.rs"]
mod tests;
