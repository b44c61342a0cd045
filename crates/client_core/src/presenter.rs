use std::fmt;

use shared::{domain::TemplateId, error::WorkflowError};

use crate::workflow::{SwapResult, WorkflowEvent, WorkflowState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultAction {
    /// Fetch the artifact from its own URL; no workflow transition.
    Download,
    Reset,
}

impl ResultAction {
    pub fn event(self) -> Option<WorkflowEvent> {
        match self {
            Self::Download => None,
            Self::Reset => Some(WorkflowEvent::ResultReset),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadLink {
    pub url: String,
    pub file_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultView {
    pub result_url: String,
    pub download: DownloadLink,
    pub actions: [ResultAction; 2],
}

pub fn present_result(state: &WorkflowState, download_name: &str) -> Option<ResultView> {
    match &state.result {
        SwapResult::Success { result_url } => Some(ResultView {
            result_url: result_url.clone(),
            download: DownloadLink {
                url: result_url.clone(),
                file_name: download_name.to_string(),
            },
            actions: [ResultAction::Download, ResultAction::Reset],
        }),
        SwapResult::Empty | SwapResult::Failure { .. } => None,
    }
}

pub fn present_failure(state: &WorkflowState) -> Option<&WorkflowError> {
    match &state.result {
        SwapResult::Failure { error } => Some(error),
        SwapResult::Empty | SwapResult::Success { .. } => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitControl {
    pub enabled: bool,
    pub label: &'static str,
}

pub fn submit_control(state: &WorkflowState) -> SubmitControl {
    SubmitControl {
        enabled: state.can_submit(),
        label: if state.phase.is_in_flight() {
            "Processing..."
        } else {
            "Create my swap"
        },
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugInfo {
    pub api_base: String,
    pub template_count: Option<usize>,
    pub selected: Option<TemplateId>,
}

impl DebugInfo {
    pub fn from_state(state: &WorkflowState, api_base: &str) -> Self {
        Self {
            api_base: api_base.to_string(),
            template_count: state.catalog.count(),
            selected: state.selected_template.clone(),
        }
    }
}

impl fmt::Display for DebugInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "API URL: {}", self.api_base)?;
        match self.template_count {
            Some(count) => writeln!(f, "Templates: {count}")?,
            None => writeln!(f, "Templates: unavailable")?,
        }
        match &self.selected {
            Some(id) => write!(f, "Selected: {id}"),
            None => write!(f, "Selected: none"),
        }
    }
}

#[cfg(test)]
#[path = "tests/presenter_tests.rs"]
mod tests;
