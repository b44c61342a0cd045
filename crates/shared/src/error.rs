use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Message used when the backend rejects a swap without saying why.
pub const GENERIC_FAILURE_MESSAGE: &str = "unknown error";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Precondition,
    Validation,
    Network,
    Server,
    Application,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(rename_all = "snake_case")]
pub enum PreconditionError {
    #[error("no template selected")]
    NoTemplateSelected,
    #[error("no image")]
    NoImage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WorkflowError {
    #[error("{missing}")]
    Precondition { missing: PreconditionError },
    #[error("invalid image: {reason}")]
    Validation { reason: String },
    #[error("connection error: {cause}")]
    Network { cause: String },
    #[error("server returned HTTP {status}{}", detail_suffix(.detail))]
    Server {
        status: u16,
        detail: Option<String>,
    },
    #[error("{message}")]
    Application { message: String },
}

fn detail_suffix(detail: &Option<String>) -> String {
    match detail {
        Some(detail) if !detail.is_empty() => format!(" ({detail})"),
        _ => String::new(),
    }
}

impl WorkflowError {
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
        }
    }

    pub fn network(cause: impl std::fmt::Display) -> Self {
        Self::Network {
            cause: cause.to_string(),
        }
    }

    pub fn server(status: u16, detail: Option<String>) -> Self {
        Self::Server { status, detail }
    }

    /// Falls back to [`GENERIC_FAILURE_MESSAGE`] when the server gave no usable message.
    pub fn application(message: Option<String>) -> Self {
        let message = message
            .filter(|message| !message.trim().is_empty())
            .unwrap_or_else(|| GENERIC_FAILURE_MESSAGE.to_string());
        Self::Application { message }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Precondition { .. } => ErrorKind::Precondition,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Network { .. } => ErrorKind::Network,
            Self::Server { .. } => ErrorKind::Server,
            Self::Application { .. } => ErrorKind::Application,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Network
    }
}

impl From<PreconditionError> for WorkflowError {
    fn from(missing: PreconditionError) -> Self {
        Self::Precondition { missing }
    }
}
