//! RFP workspace: project list, details, documents and AI analysis.

use std::time::Duration;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::api::{AnalysisOutcome, ApiClient};
use crate::error::ActionError;
use crate::models::{
    AiAnalysis, Document, KnowledgeBaseInit, KnowledgeBaseStatus, MemberMatching, NewRfp,
    RfpForm, RfpRecord, UploadFile, MIME_DOC, MIME_DOCX, MIME_PDF,
};
use crate::render::rfp as view;
use crate::ui::{Control, Level, Modal, Notice, Region, Ui};

pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
pub const ALLOWED_UPLOAD_TYPES: [&str; 3] = [MIME_PDF, MIME_DOC, MIME_DOCX];

const PROGRESS_TICK: Duration = Duration::from_millis(200);
const PROGRESS_STEP: u8 = 10;
const PROGRESS_CAP: u8 = 90;

#[derive(Clone, Debug, Default)]
pub struct RfpState {
    pub rfps: Vec<RfpRecord>,
    pub selected: Option<RfpRecord>,
    /// RFP whose edit form is open.
    pub editing: Option<i64>,
    /// RFP the upload dialog targets.
    pub uploading: Option<i64>,
    /// Markup currently shown in the AI analysis panel.
    pub ai_panel: String,
}

impl RfpState {
    pub fn selected_id(&self) -> Option<i64> {
        self.selected.as_ref().map(|r| r.id)
    }

    pub fn find(&self, id: i64) -> Option<&RfpRecord> {
        self.rfps.iter().find(|r| r.id == id)
    }
}

/// Checks a picked file before anything is sent.
pub fn validate_upload(file: Option<&UploadFile>) -> Result<&UploadFile, String> {
    let file = file.ok_or_else(|| "Please select a file to upload".to_string())?;
    if file.size() > MAX_UPLOAD_BYTES {
        return Err("File size must be less than 10MB".to_string());
    }
    if !ALLOWED_UPLOAD_TYPES.contains(&file.mime.as_str()) {
        return Err("Please upload a PDF, DOC, or DOCX file".to_string());
    }
    Ok(file)
}

pub struct RfpWorkspace {
    api: ApiClient,
    state: RfpState,
}

impl RfpWorkspace {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            state: RfpState::default(),
        }
    }

    pub fn state(&self) -> &RfpState {
        &self.state
    }

    pub async fn load_list(&mut self, ui: &mut impl Ui) -> Result<usize, ActionError> {
        match self.api.list_rfps().await {
            Ok(rfps) => {
                debug!(count = rfps.len(), "loaded RFP list");
                self.state.rfps = rfps;
                self.render_list(ui);
                Ok(self.state.rfps.len())
            }
            Err(err) => {
                error!(error = %err, "failed to load RFP list");
                Err(err.into())
            }
        }
    }

    /// Reload used after a mutation; its failure is already logged.
    async fn refresh_list(&mut self, ui: &mut impl Ui) {
        let _ = self.load_list(ui).await;
    }

    fn render_list(&self, ui: &mut impl Ui) {
        if self.state.rfps.is_empty() {
            ui.show(Region::RfpList, false);
            ui.show(Region::NoRfpsMessage, true);
            return;
        }
        ui.show(Region::NoRfpsMessage, false);
        ui.render(
            Region::RfpList,
            view::render_rfp_list(&self.state.rfps, self.state.selected_id(), Utc::now()),
        );
        ui.show(Region::RfpList, true);
    }

    fn set_ai_panel(&mut self, ui: &mut impl Ui, html: String) {
        self.state.ai_panel = html.clone();
        ui.render(Region::AiAnalysis, html);
    }

    fn render_details(&mut self, rfp: &RfpRecord, ui: &mut impl Ui) {
        ui.render(Region::RfpDetails, view::render_details(rfp, Utc::now()));
        ui.render(Region::DocumentsList, view::documents_loading());
        self.set_ai_panel(ui, view::ai_panel_for(rfp));
    }

    pub async fn select(&mut self, id: i64, ui: &mut impl Ui) -> Result<(), ActionError> {
        let rfp = self
            .state
            .find(id)
            .cloned()
            .ok_or(ActionError::UnknownRfp(id))?;
        self.select_record(rfp, ui).await;
        Ok(())
    }

    async fn select_record(&mut self, rfp: RfpRecord, ui: &mut impl Ui) {
        let id = rfp.id;
        debug!(id, "selecting RFP");
        self.render_details(&rfp, ui);
        self.state.selected = Some(rfp);
        self.render_list(ui);
        self.load_documents(id, ui).await;
    }

    /// Fetches the documents of `rfp_id`. They are only cached and drawn
    /// while that RFP is still the selected one.
    pub async fn load_documents(&mut self, rfp_id: i64, ui: &mut impl Ui) {
        let documents = match self.api.documents(rfp_id).await {
            Ok(documents) => documents,
            Err(err) => {
                error!(rfp_id, error = %err, "failed to load documents");
                Vec::new()
            }
        };
        match self.state.selected.as_mut() {
            Some(selected) if selected.id == rfp_id => {
                ui.render(Region::DocumentsList, view::render_documents(&documents));
                selected.documents = Some(documents);
            }
            _ => debug!(rfp_id, "dropping documents of an RFP that is no longer selected"),
        }
    }

    pub fn open_create(&mut self, ui: &mut impl Ui) {
        ui.open_modal(Modal::AddRfp);
    }

    pub async fn save_new(
        &mut self,
        project_name: &str,
        link: &str,
        ui: &mut impl Ui,
    ) -> Result<RfpRecord, ActionError> {
        let project_name = project_name.trim();
        if project_name.is_empty() {
            ui.alert("Please enter a project name.");
            return Err(ActionError::Validation(
                "Please enter a project name.".to_string(),
            ));
        }
        let new = NewRfp {
            project_name: project_name.to_string(),
            link: link.trim().to_string(),
        };

        ui.set_control(Control::SaveRfpButton, false, "Saving...");
        let outcome = self.api.create_rfp(&new).await;
        ui.reset_control(Control::SaveRfpButton);

        match outcome {
            Ok(rfp) => {
                info!(id = rfp.id, name = rfp.name(), "created RFP");
                ui.close_modal(Modal::AddRfp);
                self.refresh_list(ui).await;
                self.select_record(rfp.clone(), ui).await;
                Ok(rfp)
            }
            Err(err) if err.is_server() => {
                warn!(error = %err, "RFP creation rejected");
                ui.alert(&format!("Error creating RFP: {}", err.reason("Unknown error")));
                Err(err.into())
            }
            Err(err) => {
                error!(error = %err, "RFP creation failed");
                ui.alert("An error occurred while saving the RFP. Please try again.");
                Err(err.into())
            }
        }
    }

    /// Opens the edit dialog prefilled from the cached record.
    pub fn begin_edit(&mut self, id: i64, ui: &mut impl Ui) -> Result<RfpForm, ActionError> {
        let Some(rfp) = self.state.find(id) else {
            error!(id, "RFP not found");
            return Err(ActionError::UnknownRfp(id));
        };
        let form = RfpForm::from_record(rfp);
        self.state.editing = Some(id);
        ui.open_modal(Modal::EditRfp);
        Ok(form)
    }

    pub async fn save_edit(
        &mut self,
        form: &RfpForm,
        ui: &mut impl Ui,
    ) -> Result<RfpRecord, ActionError> {
        let Some(id) = self.state.editing else {
            return Err(ActionError::Validation(
                "No RFP is being edited".to_string(),
            ));
        };

        ui.set_control(Control::SaveEditButton, false, "Saving...");
        let outcome = self.api.update_rfp(id, form).await;
        ui.reset_control(Control::SaveEditButton);

        match outcome {
            Ok(rfp) => {
                info!(id, "updated RFP");
                match self.state.rfps.iter_mut().find(|r| r.id == id) {
                    Some(slot) => *slot = rfp.clone(),
                    None => self.state.rfps.push(rfp.clone()),
                }
                self.render_details(&rfp, ui);
                self.state.selected = Some(rfp.clone());
                self.render_list(ui);
                self.load_documents(id, ui).await;
                ui.close_modal(Modal::EditRfp);
                self.state.editing = None;
                ui.notify(Notice::success("RFP updated successfully!"));
                Ok(rfp)
            }
            Err(err) => {
                error!(id, error = %err, "RFP update failed");
                ui.notify(Notice::error(err.user_message(
                    "Failed to update RFP",
                    "An error occurred while updating the RFP",
                )));
                Err(err.into())
            }
        }
    }

    pub async fn delete_rfp(
        &mut self,
        id: i64,
        name: &str,
        ui: &mut impl Ui,
    ) -> Result<(), ActionError> {
        let question = format!(
            "Are you sure you want to delete the RFP project \"{name}\"?\n\n\
             This will permanently delete:\n\
             - The RFP project\n\
             - All uploaded documents\n\
             - All AI analysis results\n\n\
             This action cannot be undone."
        );
        if !ui.confirm(&question) {
            return Err(ActionError::Declined);
        }

        match self.api.delete_rfp(id).await {
            Ok(_) => {
                info!(id, "deleted RFP");
                self.state.rfps.retain(|r| r.id != id);
                if self.state.selected_id() == Some(id) {
                    self.state.selected = None;
                    ui.render(Region::RfpDetails, view::empty_details());
                }
                self.render_list(ui);
                ui.notify(Notice::success("RFP project deleted successfully!"));
                Ok(())
            }
            Err(err) => {
                error!(id, error = %err, "RFP deletion failed");
                ui.notify(Notice::error(err.user_message(
                    "Failed to delete RFP",
                    "An error occurred while deleting the RFP",
                )));
                Err(err.into())
            }
        }
    }

    pub fn open_upload(&mut self, rfp_id: i64, ui: &mut impl Ui) {
        self.state.uploading = Some(rfp_id);
        ui.hide_upload_progress();
        ui.open_modal(Modal::UploadDocument);
    }

    /// Uploads `file` to the RFP chosen with [`RfpWorkspace::open_upload`].
    ///
    /// Progress creeps up to 90% while the request is in flight and jumps to
    /// 100% once the server answers.
    pub async fn upload_document(
        &mut self,
        file: Option<UploadFile>,
        ui: &mut impl Ui,
    ) -> Result<Document, ActionError> {
        let file = match validate_upload(file.as_ref()) {
            Ok(file) => file,
            Err(message) => {
                ui.notify(Notice::error(message.clone()));
                return Err(ActionError::Validation(message));
            }
        };
        let Some(rfp_id) = self.state.uploading else {
            return Err(ActionError::Validation(
                "No RFP selected for upload".to_string(),
            ));
        };

        debug!(rfp_id, name = %file.name, size = file.size(), "uploading document");
        ui.upload_progress(0, "Uploading...");
        ui.set_control(Control::UploadButton, false, "Uploading...");

        let outcome = {
            let request = self.api.upload_document(rfp_id, file);
            tokio::pin!(request);
            let mut ticker = tokio::time::interval(PROGRESS_TICK);
            ticker.tick().await;
            let mut progress = 0u8;
            loop {
                tokio::select! {
                    result = &mut request => break result,
                    _ = ticker.tick(), if progress < PROGRESS_CAP => {
                        progress = (progress + PROGRESS_STEP).min(PROGRESS_CAP);
                        ui.upload_progress(progress, "Uploading...");
                    }
                }
            }
        };
        ui.upload_progress(100, "Complete!");

        let result = match outcome {
            Ok(document) => {
                info!(rfp_id, name = %document.document_name, "document uploaded");
                ui.close_modal(Modal::UploadDocument);
                ui.notify(Notice::success(format!(
                    "Document \"{}\" uploaded successfully!",
                    document.document_name
                )));
                self.load_documents(rfp_id, ui).await;
                Ok(document)
            }
            Err(err) => {
                error!(rfp_id, error = %err, "upload failed");
                ui.notify(Notice::error(err.user_message(
                    "Failed to upload document",
                    "An error occurred while uploading the document",
                )));
                Err(err.into())
            }
        };
        ui.reset_control(Control::UploadButton);
        ui.hide_upload_progress();
        result
    }

    pub async fn delete_document(
        &mut self,
        document_id: i64,
        name: &str,
        ui: &mut impl Ui,
    ) -> Result<(), ActionError> {
        let question = format!(
            "Are you sure you want to delete the document \"{name}\"?\n\nThis action cannot be undone."
        );
        if !ui.confirm(&question) {
            return Err(ActionError::Declined);
        }

        match self.api.delete_document(document_id).await {
            Ok(deleted) => {
                info!(document_id, rfp_id = ?deleted.rfp_id, "document deleted");
                ui.notify(Notice::success(
                    deleted
                        .message
                        .unwrap_or_else(|| "Document deleted successfully!".to_string()),
                ));
                if let Some(rfp_id) = deleted.rfp_id {
                    self.load_documents(rfp_id, ui).await;
                }
                Ok(())
            }
            Err(err) => {
                error!(document_id, error = %err, "document deletion failed");
                ui.notify(Notice::error(err.user_message(
                    "Failed to delete document",
                    "An error occurred while deleting the document",
                )));
                Err(err.into())
            }
        }
    }

    /// Runs the AI analysis for the selected RFP, which needs at least one
    /// uploaded document.
    pub async fn generate_analysis(
        &mut self,
        ui: &mut impl Ui,
    ) -> Result<AnalysisOutcome, ActionError> {
        let Some(selected) = self.state.selected.as_ref() else {
            ui.alert("Please select an RFP first.");
            return Err(ActionError::Validation(
                "Please select an RFP first.".to_string(),
            ));
        };
        if selected.document_count() == 0 {
            let message = "You must first upload documents to run the analysis.";
            ui.alert(message);
            return Err(ActionError::Validation(message.to_string()));
        }
        let id = selected.id;

        self.set_ai_panel(
            ui,
            view::ai_spinner(
                "Analyzing RFP against company knowledge base...",
                "This may take a few moments",
            ),
        );

        match self.api.analyze(id).await {
            Ok(outcome) => {
                let fields = outcome.analysis.populated_metadata_fields();
                info!(id, populated = fields.len(), "analysis finished");
                let message = if fields.is_empty() {
                    "AI Analysis completed successfully!".to_string()
                } else {
                    format!(
                        "AI Analysis completed! Automatically populated {} metadata fields: {}",
                        fields.len(),
                        fields.join(", ")
                    )
                };
                ui.notify(Notice::success(message));
                self.set_ai_panel(
                    ui,
                    view::render_analysis(&outcome.analysis, outcome.member_matching.as_ref()),
                );

                self.refresh_list(ui).await;
                if let Some(updated) = self.state.find(id).cloned() {
                    self.render_details(&updated, ui);
                    self.state.selected = Some(updated);
                    self.render_list(ui);
                    self.load_documents(id, ui).await;
                }
                Ok(outcome)
            }
            Err(err) => {
                error!(id, error = %err, "analysis failed");
                ui.notify(Notice::error(err.user_message(
                    "AI analysis failed",
                    "An error occurred during AI analysis",
                )));
                self.set_ai_panel(ui, view::ai_generate_only());
                Err(err.into())
            }
        }
    }

    pub async fn find_members(&mut self, ui: &mut impl Ui) -> Result<MemberMatching, ActionError> {
        let Some(selected) = self.state.selected.as_ref() else {
            ui.notify(Notice::error("Please select an RFP first."));
            return Err(ActionError::Validation(
                "Please select an RFP first.".to_string(),
            ));
        };
        let id = selected.id;
        let analysis = AiAnalysis::from_record(selected);
        let previous = self.state.ai_panel.clone();

        self.set_ai_panel(
            ui,
            view::ai_spinner("Finding relevant team members...", "This may take a few moments"),
        );

        match self.api.find_members(id).await {
            Ok(matching) => {
                info!(id, members = matching.members.len(), "member matching finished");
                ui.notify(Notice::success("Team member matching completed!"));
                self.set_ai_panel(ui, view::render_analysis(&analysis, Some(&matching)));
                Ok(matching)
            }
            Err(err) => {
                error!(id, error = %err, "member matching failed");
                ui.notify(Notice::error(err.user_message(
                    "Failed to find relevant team members",
                    "An error occurred while finding team members",
                )));
                self.set_ai_panel(ui, previous);
                Err(err.into())
            }
        }
    }

    pub async fn init_knowledge_base(
        &mut self,
        ui: &mut impl Ui,
    ) -> Result<KnowledgeBaseInit, ActionError> {
        self.set_ai_panel(
            ui,
            view::ai_spinner("Initializing knowledge base...", "This may take a few minutes"),
        );

        let outcome = self.api.init_knowledge_base().await;
        let result = match outcome {
            Ok(kb) => {
                info!(already = kb.already_initialized, "knowledge base initialized");
                let message = kb.message.clone().unwrap_or_else(|| {
                    if kb.already_initialized {
                        "Knowledge base already initialized".to_string()
                    } else {
                        "Knowledge base initialized successfully".to_string()
                    }
                });
                ui.notify(Notice::success(message));
                Ok(kb)
            }
            Err(err) => {
                error!(error = %err, "knowledge base initialization failed");
                ui.notify(Notice::error(err.user_message(
                    "Failed to initialize knowledge base",
                    "An error occurred during knowledge base initialization",
                )));
                Err(err.into())
            }
        };
        self.set_ai_panel(ui, view::ai_default_actions());
        result
    }

    pub async fn knowledge_base_status(
        &mut self,
        ui: &mut impl Ui,
    ) -> Result<KnowledgeBaseStatus, ActionError> {
        match self.api.knowledge_base_status().await {
            Ok(status) => {
                if status.is_initialized() {
                    ui.notify(Notice::notification(
                        Level::Success,
                        format!(
                            "Knowledge base is ready with {} document chunks",
                            status.document_count
                        ),
                    ));
                } else {
                    ui.notify(Notice::error("Knowledge base is not initialized"));
                }
                Ok(status)
            }
            Err(err) => {
                error!(error = %err, "knowledge base status check failed");
                ui.notify(Notice::error(err.user_message(
                    "Failed to check knowledge base status",
                    "An error occurred while checking knowledge base status",
                )));
                Err(err.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_validation_order() {
        assert_eq!(
            validate_upload(None).unwrap_err(),
            "Please select a file to upload"
        );

        let big = UploadFile::new("huge.txt", vec![0; MAX_UPLOAD_BYTES + 1]);
        assert_eq!(
            validate_upload(Some(&big)).unwrap_err(),
            "File size must be less than 10MB"
        );

        let text = UploadFile::new("notes.txt", b"hello".to_vec());
        assert_eq!(
            validate_upload(Some(&text)).unwrap_err(),
            "Please upload a PDF, DOC, or DOCX file"
        );

        let pdf = UploadFile::new("brief.PDF", b"%PDF-1.4".to_vec());
        assert!(validate_upload(Some(&pdf)).is_ok());
    }

    #[test]
    fn exactly_ten_mib_is_accepted() {
        let file = UploadFile::new("tor.docx", vec![0; MAX_UPLOAD_BYTES]);
        assert!(validate_upload(Some(&file)).is_ok());
    }
}
