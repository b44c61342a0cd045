//! Swap workflow state machine.

use serde::{Deserialize, Serialize};
use shared::{
    domain::{CatalogTicket, IngestTicket, SubmissionId, TemplateId},
    error::{PreconditionError, WorkflowError},
    protocol::{SwapResponse, CANONICAL_FACE_FILENAME, CANONICAL_FACE_MIME},
};
use tracing::{debug, info, warn};
use url::Url;

use crate::{
    catalog::{apply_catalog_response, Catalog},
    ingest::{self, ImageFile, UserImage},
    resolve_resource,
};

pub const STATUS_SUBMITTING: &str = "Processing your swap...";
pub const STATUS_SUCCEEDED: &str = "Your swap is ready!";
pub const STATUS_READY_AGAIN: &str = "Ready to create another swap";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowContext {
    origin: Url,
    max_image_bytes: usize,
}

impl WorkflowContext {
    pub fn new(origin: &Url, max_image_bytes: usize) -> Self {
        let mut origin = origin.clone();
        origin.set_path("/");
        origin.set_query(None);
        origin.set_fragment(None);
        Self {
            origin,
            max_image_bytes,
        }
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    pub fn max_image_bytes(&self) -> usize {
        self.max_image_bytes
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionPhase {
    #[default]
    Idle,
    Validating,
    Submitting,
    AwaitingResponse(SubmissionId),
    Succeeded,
    Failed,
}

impl SubmissionPhase {
    pub fn is_in_flight(self) -> bool {
        matches!(self, Self::Submitting | Self::AwaitingResponse(_))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SwapResult {
    #[default]
    Empty,
    Success {
        result_url: String,
    },
    Failure {
        error: WorkflowError,
    },
}

/// Outbound swap payload. Only the workflow can build one, and only when a
/// template is selected and a photo is loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapRequest {
    submission_id: SubmissionId,
    template_id: TemplateId,
    image_bytes: Vec<u8>,
}

impl SwapRequest {
    fn build(
        submission_id: SubmissionId,
        template_id: TemplateId,
        image: &UserImage,
    ) -> Result<Self, WorkflowError> {
        let image_bytes = image
            .to_bytes()
            .map_err(|err| WorkflowError::network(format!("could not read back photo: {err}")))?;
        if image_bytes.is_empty() {
            return Err(PreconditionError::NoImage.into());
        }
        Ok(Self {
            submission_id,
            template_id,
            image_bytes,
        })
    }

    pub fn submission_id(&self) -> SubmissionId {
        self.submission_id
    }

    pub fn template_id(&self) -> &TemplateId {
        &self.template_id
    }

    pub fn image_bytes(&self) -> &[u8] {
        &self.image_bytes
    }

    pub fn image_mime_type(&self) -> &'static str {
        CANONICAL_FACE_MIME
    }

    pub fn file_name(&self) -> &'static str {
        CANONICAL_FACE_FILENAME
    }
}

#[derive(Debug, Clone)]
pub enum WorkflowEvent {
    CatalogRequested,
    CatalogSettled {
        ticket: CatalogTicket,
        result: Result<serde_json::Value, WorkflowError>,
    },
    TemplateSelected(TemplateId),
    FileSelected(ImageFile),
    ImageDecoded {
        ticket: IngestTicket,
        result: Result<UserImage, WorkflowError>,
    },
    ImageCleared,
    SubmitRequested,
    SwapSettled {
        submission_id: SubmissionId,
        result: Result<SwapResponse, WorkflowError>,
    },
    ResultReset,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    FetchCatalog(CatalogTicket),
    DecodeImage { ticket: IngestTicket, file: ImageFile },
    SubmitSwap(SwapRequest),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowState {
    pub catalog: Catalog,
    pub selected_template: Option<TemplateId>,
    pub user_image: Option<UserImage>,
    pub phase: SubmissionPhase,
    pub result: SwapResult,
    pub status: String,
    last_catalog_ticket: CatalogTicket,
    pending_catalog: Option<CatalogTicket>,
    last_ingest_ticket: IngestTicket,
    pending_ingest: Option<IngestTicket>,
    last_submission: SubmissionId,
}

impl WorkflowState {
    pub fn apply(mut self, event: WorkflowEvent, ctx: &WorkflowContext) -> (Self, Vec<Effect>) {
        let effects = match event {
            WorkflowEvent::CatalogRequested => self.request_catalog(),
            WorkflowEvent::CatalogSettled { ticket, result } => {
                self.settle_catalog(ticket, result);
                Vec::new()
            }
            WorkflowEvent::TemplateSelected(id) => {
                self.select_template(id);
                Vec::new()
            }
            WorkflowEvent::FileSelected(file) => self.accept_file(file, ctx),
            WorkflowEvent::ImageDecoded { ticket, result } => {
                self.settle_decode(ticket, result);
                Vec::new()
            }
            WorkflowEvent::ImageCleared => {
                self.user_image = None;
                self.pending_ingest = None;
                self.status = "Photo removed".to_string();
                Vec::new()
            }
            WorkflowEvent::SubmitRequested => self.submit(),
            WorkflowEvent::SwapSettled {
                submission_id,
                result,
            } => {
                self.settle_swap(submission_id, result, ctx);
                Vec::new()
            }
            WorkflowEvent::ResultReset => {
                self.reset_result();
                Vec::new()
            }
        };
        (self, effects)
    }

    pub fn can_submit(&self) -> bool {
        self.selected_template.is_some() && self.user_image.is_some() && !self.phase.is_in_flight()
    }

    pub fn is_loading_image(&self) -> bool {
        self.pending_ingest.is_some()
    }

    pub fn is_loading_catalog(&self) -> bool {
        self.pending_catalog.is_some()
    }

    fn request_catalog(&mut self) -> Vec<Effect> {
        let ticket = self.last_catalog_ticket.next();
        self.last_catalog_ticket = ticket;
        self.pending_catalog = Some(ticket);
        debug!(ticket = ticket.0, "template catalog requested");
        vec![Effect::FetchCatalog(ticket)]
    }

    fn settle_catalog(
        &mut self,
        ticket: CatalogTicket,
        result: Result<serde_json::Value, WorkflowError>,
    ) {
        if self.pending_catalog != Some(ticket) {
            debug!(ticket = ticket.0, "dropping superseded catalog response");
            return;
        }
        self.pending_catalog = None;

        let update = apply_catalog_response(result);
        if let Some(catalog) = update.catalog {
            self.catalog = catalog;
        }
        self.status = update.status;
    }

    fn select_template(&mut self, id: TemplateId) {
        match self.catalog.find(&id) {
            Some(template) => {
                self.status = format!("Selected: {}", template.name);
                self.selected_template = Some(id);
            }
            None => {
                warn!(template_id = %id, "selection of unknown template ignored");
                self.status = format!("Unknown template '{id}'");
            }
        }
    }

    fn accept_file(&mut self, file: ImageFile, ctx: &WorkflowContext) -> Vec<Effect> {
        if let Err(err) = ingest::validate(&file, ctx.max_image_bytes) {
            warn!(file = %file.name, declared_type = %file.declared_type, error = %err, "photo rejected");
            self.status = format!("Upload rejected: {err}");
            return Vec::new();
        }

        let ticket = self.last_ingest_ticket.next();
        self.last_ingest_ticket = ticket;
        self.pending_ingest = Some(ticket);
        self.status = "Loading photo...".to_string();
        debug!(ticket = ticket.0, file = %file.name, bytes = file.bytes.len(), "photo decode started");
        vec![Effect::DecodeImage { ticket, file }]
    }

    fn settle_decode(&mut self, ticket: IngestTicket, result: Result<UserImage, WorkflowError>) {
        if self.pending_ingest != Some(ticket) {
            debug!(ticket = ticket.0, "dropping superseded photo decode");
            return;
        }
        self.pending_ingest = None;

        match result {
            Ok(image) => {
                info!(file = %image.source_name(), bytes = image.byte_len(), "photo loaded");
                self.user_image = Some(image);
                self.status = "Photo loaded".to_string();
            }
            Err(err) => {
                warn!(error = %err, "photo decode failed");
                self.status = format!("Upload rejected: {err}");
            }
        }
    }

    fn submit(&mut self) -> Vec<Effect> {
        if self.phase.is_in_flight() {
            debug!(phase = ?self.phase, "submit ignored while a swap is in flight");
            return Vec::new();
        }

        self.phase = SubmissionPhase::Validating;
        let template_id = match self.selected_template.clone() {
            Some(id) => id,
            None => return self.reject_submission(PreconditionError::NoTemplateSelected),
        };
        let Some(image) = self.user_image.as_ref() else {
            return self.reject_submission(PreconditionError::NoImage);
        };

        self.phase = SubmissionPhase::Submitting;
        let submission_id = self.last_submission.next();
        self.last_submission = submission_id;
        self.result = SwapResult::Empty;

        let request = match SwapRequest::build(submission_id, template_id, image) {
            Ok(request) => request,
            Err(err) => {
                self.fail_submission(submission_id, err);
                return Vec::new();
            }
        };

        info!(
            submission_id = submission_id.0,
            template_id = %request.template_id,
            bytes = request.image_bytes.len(),
            "swap submitted"
        );
        self.phase = SubmissionPhase::AwaitingResponse(submission_id);
        self.status = STATUS_SUBMITTING.to_string();
        vec![Effect::SubmitSwap(request)]
    }

    fn reject_submission(&mut self, missing: PreconditionError) -> Vec<Effect> {
        debug!(%missing, "submit blocked before reaching the network");
        self.phase = SubmissionPhase::Idle;
        self.status = format!("Cannot submit: {missing}");
        Vec::new()
    }

    fn settle_swap(
        &mut self,
        submission_id: SubmissionId,
        result: Result<SwapResponse, WorkflowError>,
        ctx: &WorkflowContext,
    ) {
        if self.phase != SubmissionPhase::AwaitingResponse(submission_id) {
            warn!(submission_id = submission_id.0, phase = ?self.phase, "dropping response for a submission that is not in flight");
            return;
        }

        match result.and_then(|response| interpret_swap_response(response, ctx.origin())) {
            Ok(result_url) => {
                info!(submission_id = submission_id.0, %result_url, "swap succeeded");
                self.phase = SubmissionPhase::Succeeded;
                self.result = SwapResult::Success { result_url };
                self.status = STATUS_SUCCEEDED.to_string();
            }
            Err(err) => self.fail_submission(submission_id, err),
        }
    }

    fn fail_submission(&mut self, submission_id: SubmissionId, error: WorkflowError) {
        warn!(submission_id = submission_id.0, kind = ?error.kind(), %error, "swap failed");
        self.phase = SubmissionPhase::Failed;
        self.status = format!("Swap failed: {error}");
        self.result = SwapResult::Failure { error };
    }

    fn reset_result(&mut self) {
        self.result = SwapResult::Empty;
        if !self.phase.is_in_flight() {
            self.phase = SubmissionPhase::Idle;
        }
        self.status = STATUS_READY_AGAIN.to_string();
    }
}

pub fn interpret_swap_response(
    response: SwapResponse,
    origin: &Url,
) -> Result<String, WorkflowError> {
    if !response.success {
        return Err(WorkflowError::application(response.message));
    }

    let path = response
        .result_url
        .filter(|path| !path.trim().is_empty())
        .ok_or_else(|| WorkflowError::network("malformed response: missing result_url"))?;

    resolve_resource(origin, &path)
        .map(String::from)
        .ok_or_else(|| WorkflowError::network(format!("malformed result_url '{path}'")))
}

#[cfg(test)]
#[path = "tests/workflow_tests.rs"]
mod tests;
