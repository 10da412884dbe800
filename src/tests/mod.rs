use std::collections::HashMap;

use chrono::NaiveDate;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::api::{ApiClient, ApiConfig};
use crate::error::ActionError;
use crate::filters::FilterCategory;
use crate::models::{RfpForm, TenderSource, UploadFile};
use crate::render::rfp::ai_default_actions;
use crate::rfp::RfpWorkspace;
use crate::search::SearchController;
use crate::session::{Session, Tab};
use crate::tenders::TenderBrowser;
use crate::ui::{Action, Control, Level, Modal, Notice, Region, StatSlot, Ui};

/// Ui that remembers everything a controller asked of it.
#[derive(Default)]
struct RecordingUi {
    regions: HashMap<Region, String>,
    visible: HashMap<Region, bool>,
    notices: Vec<Notice>,
    alerts: Vec<String>,
    confirms: Vec<String>,
    answer: bool,
    controls: Vec<(Control, bool, String)>,
    opened: Vec<Modal>,
    closed: Vec<Modal>,
    progress: Vec<(u8, String)>,
    progress_hidden: usize,
    stats: HashMap<StatSlot, String>,
    downloads: Vec<(String, Vec<u8>)>,
    /// Stat slots the view does not have.
    missing_stats: Vec<StatSlot>,
}

impl RecordingUi {
    fn answering(answer: bool) -> Self {
        Self {
            answer,
            ..Default::default()
        }
    }

    fn region(&self, region: Region) -> &str {
        self.regions.get(&region).map(String::as_str).unwrap_or("")
    }

    fn banners(&self) -> Vec<&str> {
        self.notices
            .iter()
            .filter(|n| matches!(n, Notice::Banner(_)))
            .map(Notice::message)
            .collect()
    }

    fn toasts(&self) -> Vec<&str> {
        self.notices
            .iter()
            .filter(|n| matches!(n, Notice::Toast { .. }))
            .map(Notice::message)
            .collect()
    }
}

impl Ui for RecordingUi {
    fn render(&mut self, region: Region, html: String) {
        self.regions.insert(region, html);
    }

    fn show(&mut self, region: Region, visible: bool) {
        self.visible.insert(region, visible);
    }

    fn notify(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    fn clear_banner(&mut self) {
        self.notices.retain(|n| !matches!(n, Notice::Banner(_)));
    }

    fn alert(&mut self, message: &str) {
        self.alerts.push(message.to_string());
    }

    fn confirm(&mut self, message: &str) -> bool {
        self.confirms.push(message.to_string());
        self.answer
    }

    fn set_control(&mut self, control: Control, enabled: bool, label: &str) {
        self.controls.push((control, enabled, label.to_string()));
    }

    fn open_modal(&mut self, modal: Modal) {
        self.opened.push(modal);
    }

    fn close_modal(&mut self, modal: Modal) {
        self.closed.push(modal);
    }

    fn upload_progress(&mut self, percent: u8, label: &str) {
        self.progress.push((percent, label.to_string()));
    }

    fn hide_upload_progress(&mut self) {
        self.progress_hidden += 1;
    }

    fn set_stat(&mut self, slot: StatSlot, value: String) {
        self.stats.insert(slot, value);
    }

    fn has_stat(&self, slot: StatSlot) -> bool {
        !self.missing_stats.contains(&slot)
    }

    fn download(&mut self, filename: &str, contents: &[u8]) -> std::io::Result<()> {
        self.downloads.push((filename.to_string(), contents.to_vec()));
        Ok(())
    }
}

fn client(server: &MockServer) -> ApiClient {
    ApiClient::new(ApiConfig {
        base_url: server.uri(),
        timeout_seconds: 5,
        ..Default::default()
    })
    .unwrap()
}

fn ok(body: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(body)
}

async fn mount_rfps(server: &MockServer, rfps: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/api/rfp-list"))
        .respond_with(ok(json!({ "success": true, "rfps": rfps })))
        .mount(server)
        .await;
}

fn two_rfps() -> serde_json::Value {
    json!([
        { "id": 1, "project_name": "Solar mini-grids", "country": "Kenya", "region": "Africa" },
        { "id": 2, "project_name": "Water audit", "country": "Peru", "region": "LATAM" }
    ])
}

#[tokio::test]
async fn search_with_no_hits_shows_the_empty_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .and(body_partial_json(json!({ "keyword": "water", "sectors_filters": ["Energy"] })))
        .respond_with(ok(json!({ "results": [], "count": 0, "keyword": "water" })))
        .expect(1)
        .mount(&server)
        .await;

    let mut search = SearchController::new(client(&server));
    let mut ui = RecordingUi::default();
    search.set_filter(FilterCategory::Sectors, "Energy", true);
    search.apply_filters(&mut ui);

    let count = search.perform_search("  water ", &mut ui).await.unwrap();

    assert_eq!(count, 0);
    assert!(ui.region(Region::ResultsTitle).contains("Found 0 results for \"water\""));
    assert!(ui.region(Region::ResultsList).contains("No results found for \"water\""));
    assert_eq!(ui.visible.get(&Region::ResultsContainer), Some(&true));
    assert_eq!(ui.visible.get(&Region::LoadingSpinner), Some(&false));
    assert_eq!(ui.visible.get(&Region::ClearFiltersButton), Some(&true));
    assert_eq!(
        ui.controls.last(),
        Some(&(Control::SearchButton, true, "Search".to_string()))
    );
}

#[tokio::test]
async fn failed_search_raises_the_generic_banner() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "success": false })))
        .mount(&server)
        .await;

    let mut search = SearchController::new(client(&server));
    let mut ui = RecordingUi::default();
    let err = search.perform_search("energy", &mut ui).await.unwrap_err();

    assert!(matches!(err, ActionError::Api(_)));
    assert_eq!(
        ui.banners(),
        vec!["An error occurred while searching. Please try again."]
    );
    assert!(!search.state().has_results());
    assert_eq!(ui.visible.get(&Region::LoadingSpinner), Some(&false));
}

#[tokio::test]
async fn export_writes_the_current_results() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ok(json!({
            "results": [{ "first_name": "Ada", "last_name": "Okafor", "email": "ada@example.org" }],
            "count": 1,
            "keyword": "solar"
        })))
        .mount(&server)
        .await;

    let mut search = SearchController::new(client(&server));
    let mut ui = RecordingUi::default();
    let today = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();

    assert!(search.export_csv(&mut ui, today).is_err());
    assert_eq!(ui.banners(), vec!["No results to export"]);
    assert!(ui.downloads.is_empty());

    search.perform_search("solar", &mut ui).await.unwrap();
    let filename = search.export_csv(&mut ui, today).unwrap();

    assert_eq!(filename, "opfa_search_results_solar_2024-03-05.csv");
    let (name, bytes) = &ui.downloads[0];
    assert_eq!(name, &filename);
    let csv = String::from_utf8(bytes.clone()).unwrap();
    assert!(csv.starts_with("First Name,Last Name,Email"));
    assert!(csv.contains("Okafor"));
    assert!(ui.toasts().contains(&"Exported 1 results to CSV"));
}

#[tokio::test]
async fn text_files_are_rejected_before_any_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex(r"^/api/document-upload/\d+$"))
        .respond_with(ok(json!({ "success": true })))
        .expect(0)
        .mount(&server)
        .await;

    let mut rfp = RfpWorkspace::new(client(&server));
    let mut ui = RecordingUi::default();
    rfp.open_upload(1, &mut ui);

    let err = rfp
        .upload_document(Some(UploadFile::new("notes.txt", b"plain".to_vec())), &mut ui)
        .await
        .unwrap_err();

    assert!(matches!(err, ActionError::Validation(_)));
    assert_eq!(ui.banners(), vec!["Please upload a PDF, DOC, or DOCX file"]);
    assert!(ui.progress.is_empty());
}

#[tokio::test]
async fn upload_reports_progress_and_refreshes_documents() {
    let server = MockServer::start().await;
    mount_rfps(&server, two_rfps()).await;
    Mock::given(method("POST"))
        .and(path("/api/document-upload/1"))
        .respond_with(ok(json!({
            "success": true,
            "document": { "id": 11, "rfp_id": 1, "document_name": "brief.pdf" }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/documents/1"))
        .respond_with(ok(json!({
            "success": true,
            "documents": [{ "id": 11, "rfp_id": 1, "document_name": "brief.pdf" }]
        })))
        .mount(&server)
        .await;

    let mut rfp = RfpWorkspace::new(client(&server));
    let mut ui = RecordingUi::default();
    rfp.load_list(&mut ui).await.unwrap();
    rfp.select(1, &mut ui).await.unwrap();
    rfp.open_upload(1, &mut ui);

    let doc = rfp
        .upload_document(Some(UploadFile::new("brief.pdf", b"%PDF-1.4".to_vec())), &mut ui)
        .await
        .unwrap();

    assert_eq!(doc.document_name, "brief.pdf");
    assert_eq!(ui.progress.first(), Some(&(0, "Uploading...".to_string())));
    assert_eq!(ui.progress.last(), Some(&(100, "Complete!".to_string())));
    assert!(ui.progress.iter().all(|(p, _)| *p <= 100));
    assert_eq!(ui.closed, vec![Modal::UploadDocument]);
    assert!(ui.progress_hidden >= 2);
    assert_eq!(
        ui.controls.last(),
        Some(&(Control::UploadButton, true, "Upload".to_string()))
    );
    assert!(ui.toasts().contains(&"Document \"brief.pdf\" uploaded successfully!"));
    assert!(ui.region(Region::DocumentsList).contains("brief.pdf"));
}

#[tokio::test]
async fn analysis_needs_an_uploaded_document() {
    let server = MockServer::start().await;
    mount_rfps(&server, two_rfps()).await;
    Mock::given(method("GET"))
        .and(path("/api/documents/2"))
        .respond_with(ok(json!({ "success": true, "documents": [] })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path_regex(r"^/api/ai-analyze/\d+$"))
        .respond_with(ok(json!({ "success": true })))
        .expect(0)
        .mount(&server)
        .await;

    let mut rfp = RfpWorkspace::new(client(&server));
    let mut ui = RecordingUi::default();

    assert!(rfp.generate_analysis(&mut ui).await.is_err());
    assert_eq!(ui.alerts, vec!["Please select an RFP first."]);

    rfp.load_list(&mut ui).await.unwrap();
    rfp.select(2, &mut ui).await.unwrap();
    assert!(rfp.generate_analysis(&mut ui).await.is_err());
    assert_eq!(
        ui.alerts.last().map(String::as_str),
        Some("You must first upload documents to run the analysis.")
    );
}

#[tokio::test]
async fn selecting_fetches_only_that_rfps_documents() {
    let server = MockServer::start().await;
    mount_rfps(&server, two_rfps()).await;
    Mock::given(method("GET"))
        .and(path("/api/documents/1"))
        .respond_with(ok(json!({
            "success": true,
            "documents": [{ "id": 10, "rfp_id": 1, "document_name": "tor.docx" }]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/documents/2"))
        .respond_with(ok(json!({ "success": true, "documents": [] })))
        .expect(0)
        .mount(&server)
        .await;

    let mut rfp = RfpWorkspace::new(client(&server));
    let mut ui = RecordingUi::default();
    rfp.load_list(&mut ui).await.unwrap();
    rfp.select(1, &mut ui).await.unwrap();

    assert_eq!(rfp.state().selected_id(), Some(1));
    assert_eq!(rfp.state().selected.as_ref().map(|r| r.document_count()), Some(1));
    assert!(ui.region(Region::DocumentsList).contains("tor.docx"));
    assert!(ui.region(Region::RfpDetails).contains("Solar mini-grids"));
    assert!(matches!(
        rfp.select(99, &mut ui).await,
        Err(ActionError::UnknownRfp(99))
    ));
}

#[tokio::test]
async fn documents_of_a_deselected_rfp_are_not_drawn() {
    let server = MockServer::start().await;
    mount_rfps(&server, two_rfps()).await;
    Mock::given(method("GET"))
        .and(path("/api/documents/1"))
        .respond_with(ok(json!({
            "success": true,
            "documents": [{ "id": 10, "rfp_id": 1, "document_name": "tor.docx" }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/documents/2"))
        .respond_with(ok(json!({
            "success": true,
            "documents": [{ "id": 20, "rfp_id": 2, "document_name": "stale.pdf" }]
        })))
        .mount(&server)
        .await;

    let mut rfp = RfpWorkspace::new(client(&server));
    let mut ui = RecordingUi::default();
    rfp.load_list(&mut ui).await.unwrap();
    rfp.select(1, &mut ui).await.unwrap();

    rfp.load_documents(2, &mut ui).await;

    assert!(ui.region(Region::DocumentsList).contains("tor.docx"));
    assert!(!ui.region(Region::DocumentsList).contains("stale.pdf"));
    let docs = rfp.state().selected.as_ref().and_then(|r| r.documents.clone());
    assert_eq!(docs.map(|d| d[0].id), Some(10));
}

#[tokio::test]
async fn deleting_a_document_refreshes_its_owner() {
    let server = MockServer::start().await;
    mount_rfps(&server, two_rfps()).await;
    Mock::given(method("GET"))
        .and(path("/api/documents/1"))
        .respond_with(ok(json!({ "success": true, "documents": [] })))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/documents/2"))
        .respond_with(ok(json!({ "success": true, "documents": [] })))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/document-delete/10"))
        .respond_with(ok(json!({ "success": true, "message": "Document deleted", "rfp_id": 1 })))
        .expect(1)
        .mount(&server)
        .await;

    let mut session = Session::new(client(&server));
    let mut ui = RecordingUi::answering(true);
    session.switch_tab(Tab::Rfp, &mut ui).await.unwrap();
    session
        .dispatch(Action::SelectRfp { rfp_id: 1 }, &mut ui)
        .await
        .unwrap();
    session
        .dispatch(
            Action::DeleteDocument {
                document_id: 10,
                name: "tor.docx".to_string(),
            },
            &mut ui,
        )
        .await
        .unwrap();

    assert!(ui.confirms[0].contains("\"tor.docx\""));
    assert!(ui.toasts().contains(&"Document deleted"));
    assert!(ui.region(Region::DocumentsList).contains("No documents uploaded yet"));
}

#[tokio::test]
async fn declined_delete_sends_nothing() {
    let server = MockServer::start().await;
    mount_rfps(&server, two_rfps()).await;
    Mock::given(method("DELETE"))
        .and(path_regex(r"^/api/rfp-delete/\d+$"))
        .respond_with(ok(json!({ "success": true })))
        .expect(0)
        .mount(&server)
        .await;

    let mut rfp = RfpWorkspace::new(client(&server));
    let mut ui = RecordingUi::answering(false);
    rfp.load_list(&mut ui).await.unwrap();

    let err = rfp.delete_rfp(1, "Solar mini-grids", &mut ui).await.unwrap_err();

    assert!(err.is_declined());
    assert!(ui.confirms[0].contains("Solar mini-grids"));
    assert_eq!(rfp.state().rfps.len(), 2);
    assert!(ui.notices.is_empty());
}

#[tokio::test]
async fn blank_project_name_is_not_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/rfp-create"))
        .respond_with(ok(json!({ "success": true })))
        .expect(0)
        .mount(&server)
        .await;

    let mut rfp = RfpWorkspace::new(client(&server));
    let mut ui = RecordingUi::default();
    rfp.open_create(&mut ui);

    assert!(rfp.save_new("   ", "https://x.org", &mut ui).await.is_err());
    assert_eq!(ui.alerts, vec!["Please enter a project name."]);
    assert_eq!(ui.opened, vec![Modal::AddRfp]);
    assert!(ui.closed.is_empty());
}

#[tokio::test]
async fn new_rfp_is_listed_and_selected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/rfp-create"))
        .and(body_partial_json(json!({ "project_name": "Grid study", "link": "https://x.org" })))
        .respond_with(ok(json!({
            "success": true,
            "rfp": { "id": 3, "project_name": "Grid study", "link": "https://x.org" }
        })))
        .expect(1)
        .mount(&server)
        .await;
    mount_rfps(
        &server,
        json!([
            { "id": 1, "project_name": "Solar mini-grids" },
            { "id": 3, "project_name": "Grid study" }
        ]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/api/documents/3"))
        .respond_with(ok(json!({ "success": true, "documents": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let mut rfp = RfpWorkspace::new(client(&server));
    let mut ui = RecordingUi::default();
    rfp.open_create(&mut ui);

    let created = rfp.save_new(" Grid study ", " https://x.org ", &mut ui).await.unwrap();

    assert_eq!(created.id, 3);
    assert_eq!(ui.closed, vec![Modal::AddRfp]);
    assert_eq!(rfp.state().rfps.len(), 2);
    assert_eq!(rfp.state().selected_id(), Some(3));
    assert!(ui.region(Region::RfpList).contains("Grid study"));
    assert!(ui.region(Region::RfpDetails).contains("Grid study"));
    assert!(ui.region(Region::DocumentsList).contains("No documents uploaded yet"));
    assert!(ui.controls.contains(&(Control::SaveRfpButton, false, "Saving...".to_string())));
    assert_eq!(
        ui.controls.last(),
        Some(&(Control::SaveRfpButton, true, "Save RFP".to_string()))
    );
}

#[tokio::test]
async fn edited_rfp_replaces_its_list_entry() {
    let server = MockServer::start().await;
    mount_rfps(&server, two_rfps()).await;
    Mock::given(method("PUT"))
        .and(path("/api/rfp-update/2"))
        .and(body_partial_json(json!({ "project_name": "Water audit", "country": "Chile" })))
        .respond_with(ok(json!({
            "success": true,
            "rfp": { "id": 2, "project_name": "Water audit", "country": "Chile", "region": "LATAM" }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/documents/2"))
        .respond_with(ok(json!({
            "success": true,
            "documents": [{ "id": 20, "rfp_id": 2, "document_name": "scope.pdf" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut rfp = RfpWorkspace::new(client(&server));
    let mut ui = RecordingUi::default();
    rfp.load_list(&mut ui).await.unwrap();

    let mut form: RfpForm = rfp.begin_edit(2, &mut ui).unwrap();
    assert_eq!(form.country, "Peru");
    form.country = "Chile".to_string();
    rfp.save_edit(&form, &mut ui).await.unwrap();

    let state = rfp.state();
    assert_eq!(state.rfps.len(), 2);
    assert_eq!(state.find(2).and_then(|r| r.country.as_deref()), Some("Chile"));
    assert_eq!(state.find(1).and_then(|r| r.country.as_deref()), Some("Kenya"));
    assert_eq!(state.selected_id(), Some(2));
    assert_eq!(state.editing, None);
    assert_eq!(state.selected.as_ref().map(|r| r.document_count()), Some(1));
    assert!(ui.region(Region::RfpDetails).contains("Chile"));
    assert!(ui.region(Region::DocumentsList).contains("scope.pdf"));
    assert_eq!(ui.opened, vec![Modal::EditRfp]);
    assert_eq!(ui.closed, vec![Modal::EditRfp]);
    assert!(ui.toasts().contains(&"RFP updated successfully!"));
}

#[tokio::test]
async fn analysis_reports_filled_metadata_and_reselects() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/rfp-list"))
        .respond_with(ok(json!({
            "success": true,
            "rfps": [{ "id": 1, "project_name": "Solar mini-grids" }]
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/documents/1"))
        .respond_with(ok(json!({
            "success": true,
            "documents": [{ "id": 10, "rfp_id": 1, "document_name": "tor.docx" }]
        })))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/ai-analyze/1"))
        .respond_with(ok(json!({
            "success": true,
            "analysis": {
                "fit_assessment": "Strong fit",
                "extracted_metadata": { "country": "Kenya", "industry": "Energy", "region": null }
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut rfp = RfpWorkspace::new(client(&server));
    let mut ui = RecordingUi::default();
    rfp.load_list(&mut ui).await.unwrap();
    rfp.select(1, &mut ui).await.unwrap();

    Mock::given(method("GET"))
        .and(path("/api/rfp-list"))
        .respond_with(ok(json!({
            "success": true,
            "rfps": [{
                "id": 1,
                "project_name": "Solar mini-grids",
                "country": "Kenya",
                "industry": "Energy",
                "ai_fit_assessment": "Strong fit",
                "ai_analysis_date": "2024-02-01T10:00:00"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = rfp.generate_analysis(&mut ui).await.unwrap();

    assert_eq!(outcome.analysis.populated_metadata_fields(), vec!["country", "industry"]);
    assert_eq!(
        ui.toasts(),
        vec!["AI Analysis completed! Automatically populated 2 metadata fields: country, industry"]
    );
    let selected = rfp.state().selected.as_ref().unwrap();
    assert_eq!(selected.ai_fit_assessment.as_deref(), Some("Strong fit"));
    assert_eq!(selected.country.as_deref(), Some("Kenya"));
    assert_eq!(selected.document_count(), 1);
    assert!(ui.region(Region::RfpDetails).contains("Kenya"));
    assert!(ui.region(Region::AiAnalysis).contains("Strong fit"));
    assert!(ui.region(Region::DocumentsList).contains("tor.docx"));
}

#[tokio::test]
async fn knowledge_base_init_restores_default_actions() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/init-knowledge-base"))
        .respond_with(ok(json!({ "success": true, "already_initialized": true })))
        .expect(1)
        .mount(&server)
        .await;

    let mut rfp = RfpWorkspace::new(client(&server));
    let mut ui = RecordingUi::default();
    let kb = rfp.init_knowledge_base(&mut ui).await.unwrap();

    assert!(kb.already_initialized);
    assert_eq!(ui.toasts(), vec!["Knowledge base already initialized"]);
    assert_eq!(ui.region(Region::AiAnalysis), ai_default_actions());
    assert_eq!(rfp.state().ai_panel, ai_default_actions());
}

#[tokio::test]
async fn failed_knowledge_base_init_restores_default_actions() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/init-knowledge-base"))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_json(json!({ "success": false, "error": "Vector store offline" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut rfp = RfpWorkspace::new(client(&server));
    let mut ui = RecordingUi::default();

    assert!(rfp.init_knowledge_base(&mut ui).await.is_err());
    assert_eq!(ui.banners(), vec!["Vector store offline"]);
    assert_eq!(ui.region(Region::AiAnalysis), ai_default_actions());
}

#[tokio::test]
async fn failed_member_matching_restores_the_panel() {
    let server = MockServer::start().await;
    mount_rfps(
        &server,
        json!([{
            "id": 4,
            "project_name": "Grid study",
            "ai_fit_assessment": "Strong fit",
            "ai_analysis_date": "2024-02-01T10:00:00"
        }]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/api/documents/4"))
        .respond_with(ok(json!({ "success": true, "documents": [] })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/rfp/4/find-members"))
        .respond_with(ok(json!({ "success": false, "error": "No analysis found" })))
        .expect(1)
        .mount(&server)
        .await;

    let mut rfp = RfpWorkspace::new(client(&server));
    let mut ui = RecordingUi::default();
    rfp.load_list(&mut ui).await.unwrap();
    rfp.select(4, &mut ui).await.unwrap();
    let before = ui.region(Region::AiAnalysis).to_string();
    assert!(before.contains("Strong fit"));

    assert!(rfp.find_members(&mut ui).await.is_err());

    assert_eq!(ui.region(Region::AiAnalysis), before);
    assert_eq!(ui.banners(), vec!["No analysis found"]);
}

#[tokio::test]
async fn toggling_a_tender_reloads_the_active_source() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/tenders/mark-processed"))
        .and(body_partial_json(json!({ "tender_id": 5, "processed": true })))
        .respond_with(ok(json!({ "success": true, "message": "Tender marked as processed" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/tenders/list"))
        .and(query_param("source", TenderSource::Giz.label()))
        .respond_with(ok(json!({
            "success": true,
            "tenders": [{ "id": 5, "title": "Water audit", "processed": true }]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/tenders/stats"))
        .respond_with(ok(json!({
            "success": true,
            "total_tenders": 12,
            "total_unprocessed": 7,
            "recent_activity": []
        })))
        .mount(&server)
        .await;

    let mut tenders = TenderBrowser::new(client(&server));
    let mut ui = RecordingUi::default();
    tenders.set_active(Some(TenderSource::Giz));

    tenders.toggle_processed(5, true, &mut ui).await.unwrap();

    assert_eq!(
        ui.notices.first(),
        Some(&Notice::notification(Level::Success, "Tender marked as processed"))
    );
    assert_eq!(tenders.state().lists[&TenderSource::Giz].len(), 1);
    assert!(ui.region(Region::TenderList(TenderSource::Giz)).contains("Water audit"));
    assert_eq!(ui.stats.get(&StatSlot::TotalTenders).map(String::as_str), Some("12"));
    assert_eq!(ui.stats.get(&StatSlot::Unprocessed).map(String::as_str), Some("7"));
}

#[tokio::test]
async fn scrape_failure_names_the_source() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/tenders/scrape-undp"))
        .respond_with(ok(json!({ "success": false, "error": "portal unreachable" })))
        .expect(1)
        .mount(&server)
        .await;

    let mut tenders = TenderBrowser::new(client(&server));
    let mut ui = RecordingUi::default();

    assert!(tenders.scrape(TenderSource::Undp, &mut ui).await.is_err());

    assert_eq!(
        ui.notices,
        vec![Notice::notification(
            Level::Error,
            "UNDP scraping failed: portal unreachable"
        )]
    );
    assert_eq!(
        ui.controls.last(),
        Some(&(Control::ScrapeButton(TenderSource::Undp), true, "Scrape UNDP".to_string()))
    );
}

#[tokio::test]
async fn scrape_without_error_counts_as_done() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/tenders/scrape-giz"))
        .respond_with(ok(json!({ "success": false })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/tenders/list"))
        .and(query_param("source", TenderSource::Giz.label()))
        .respond_with(ok(json!({
            "success": true,
            "tenders": [{ "id": 8, "title": "Grid study", "processed": false }]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/tenders/stats"))
        .respond_with(ok(json!({ "success": true, "total_tenders": 1, "total_unprocessed": 1 })))
        .expect(1)
        .mount(&server)
        .await;

    let mut tenders = TenderBrowser::new(client(&server));
    let mut ui = RecordingUi::default();

    assert_eq!(tenders.scrape(TenderSource::Giz, &mut ui).await.unwrap(), None);

    assert_eq!(
        ui.notices.first(),
        Some(&Notice::notification(Level::Success, "GIZ tenders scraped successfully!"))
    );
    assert!(ui.region(Region::TenderList(TenderSource::Giz)).contains("Grid study"));
    assert_eq!(ui.stats.get(&StatSlot::TotalTenders).map(String::as_str), Some("1"));
}

#[tokio::test]
async fn scrape_response_without_success_flag_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/tenders/scrape-aus"))
        .respond_with(ok(json!({ "message": "queued" })))
        .mount(&server)
        .await;

    let mut tenders = TenderBrowser::new(client(&server));
    let mut ui = RecordingUi::default();

    assert!(tenders.scrape(TenderSource::Australian, &mut ui).await.is_err());
    assert_eq!(
        ui.notices,
        vec![Notice::notification(
            Level::Error,
            "Australian scraping failed: Scraping failed"
        )]
    );
}

#[tokio::test]
async fn stats_fill_only_the_slots_the_view_has() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tenders/stats"))
        .respond_with(ok(json!({
            "success": true,
            "total_tenders": 40,
            "total_unprocessed": 9,
            "recent_activity": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut tenders = TenderBrowser::new(client(&server));
    let mut ui = RecordingUi {
        missing_stats: vec![StatSlot::Unprocessed],
        ..Default::default()
    };

    let stats = tenders.load_stats(&mut ui).await.unwrap();

    assert_eq!(stats.total_unprocessed, 9);
    assert_eq!(ui.stats.get(&StatSlot::TotalTenders).map(String::as_str), Some("40"));
    assert_eq!(ui.stats.get(&StatSlot::Unprocessed), None);
    assert_eq!(ui.stats.get(&StatSlot::LastScraped).map(String::as_str), Some("Never"));
    assert_eq!(tenders.state().stats.as_ref(), Some(&stats));
}

#[tokio::test]
async fn switching_to_rfps_hides_search_results() {
    let server = MockServer::start().await;
    mount_rfps(&server, json!([])).await;

    let mut session = Session::new(client(&server));
    let mut ui = RecordingUi::default();
    session.switch_tab(Tab::Rfp, &mut ui).await.unwrap();

    assert_eq!(session.tab(), Tab::Rfp);
    assert_eq!(ui.visible.get(&Region::ResultsContainer), Some(&false));
    assert_eq!(ui.visible.get(&Region::NoRfpsMessage), Some(&true));
    assert_eq!(ui.visible.get(&Region::RfpList), Some(&false));
}

#[test]
fn rendered_actions_dispatch_back() {
    let action = Action::DeleteDocument {
        document_id: 3,
        name: "Terms \"v2\".pdf".to_string(),
    };
    let attrs = action.to_attrs();
    assert!(attrs.contains("data-action"));
    assert!(!attrs.contains("\"v2\""));
}
