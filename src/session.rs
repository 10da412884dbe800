//! One browser tab worth of state: the three controllers plus the tab strip.

use tracing::debug;

use crate::api::ApiClient;
use crate::error::ActionError;
use crate::models::TenderSource;
use crate::rfp::RfpWorkspace;
use crate::search::SearchController;
use crate::tenders::TenderBrowser;
use crate::ui::{Action, Ui};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Tab {
    #[default]
    Keyword,
    Rfp,
    Tenders(TenderSource),
}

pub struct Session {
    pub search: SearchController,
    pub rfp: RfpWorkspace,
    pub tenders: TenderBrowser,
    tab: Tab,
}

impl Session {
    pub fn new(api: ApiClient) -> Self {
        Self {
            search: SearchController::new(api.clone()),
            rfp: RfpWorkspace::new(api.clone()),
            tenders: TenderBrowser::new(api),
            tab: Tab::default(),
        }
    }

    pub fn tab(&self) -> Tab {
        self.tab
    }

    pub async fn switch_tab(&mut self, tab: Tab, ui: &mut impl Ui) -> Result<(), ActionError> {
        debug!(?tab, "switching tab");
        self.tab = tab;
        match tab {
            Tab::Keyword => {
                self.tenders.set_active(None);
                if self.search.state().has_results() {
                    self.search.set_visible(ui, true);
                }
                Ok(())
            }
            Tab::Rfp => {
                self.tenders.set_active(None);
                self.search.set_visible(ui, false);
                self.rfp.load_list(ui).await.map(|_| ())
            }
            Tab::Tenders(source) => {
                self.tenders.set_active(Some(source));
                self.search.set_visible(ui, false);
                self.tenders.load(source, ui).await.map(|_| ())
            }
        }
    }

    /// Runs the action carried by a rendered element.
    ///
    /// Edit and upload only open their dialogs; the dialog's submit calls
    /// [`RfpWorkspace::save_edit`] or [`RfpWorkspace::upload_document`].
    pub async fn dispatch(&mut self, action: Action, ui: &mut impl Ui) -> Result<(), ActionError> {
        debug!(action = action.name(), "dispatching");
        match action {
            Action::SelectRfp { rfp_id } => self.rfp.select(rfp_id, ui).await,
            Action::EditRfp { rfp_id } => self.rfp.begin_edit(rfp_id, ui).map(|_| ()),
            Action::DeleteRfp { rfp_id, name } => self.rfp.delete_rfp(rfp_id, &name, ui).await,
            Action::UploadDocument { rfp_id } => {
                self.rfp.open_upload(rfp_id, ui);
                Ok(())
            }
            Action::DeleteDocument { document_id, name } => {
                self.rfp.delete_document(document_id, &name, ui).await
            }
            Action::GenerateAnalysis => self.rfp.generate_analysis(ui).await.map(|_| ()),
            Action::FindMembers => self.rfp.find_members(ui).await.map(|_| ()),
            Action::InitKnowledgeBase => self.rfp.init_knowledge_base(ui).await.map(|_| ()),
            Action::ToggleTender {
                tender_id,
                processed,
            } => self.tenders.toggle_processed(tender_id, processed, ui).await,
        }
    }
}
