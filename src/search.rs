//! Keyword search over the community directory.

use chrono::NaiveDate;
use tracing::{debug, error, info, warn};

use crate::api::{ApiClient, ApiError};
use crate::error::ActionError;
use crate::filters::{FilterCategory, FilterState};
use crate::models::{SearchRequest, SearchResult, SiteStats};
use crate::output::csv::{export_filename, render_csv};
use crate::render::cards;
use crate::ui::{Control, Notice, Region, Ui};

const SEARCH_FAILED: &str = "An error occurred while searching. Please try again.";

#[derive(Clone, Debug, Default)]
pub struct SearchState {
    pub keyword: String,
    pub results: Vec<SearchResult>,
    pub count: usize,
    pub filters: FilterState,
    pub stats: Option<SiteStats>,
    /// Whether the results container is on screen.
    pub visible: bool,
}

impl SearchState {
    pub fn has_results(&self) -> bool {
        !self.results.is_empty()
    }
}

pub struct SearchController {
    api: ApiClient,
    state: SearchState,
}

impl SearchController {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            state: SearchState::default(),
        }
    }

    pub fn state(&self) -> &SearchState {
        &self.state
    }

    /// Runs a search with the currently applied filters.
    ///
    /// On failure the previous results stay in place.
    pub async fn perform_search(
        &mut self,
        keyword: &str,
        ui: &mut impl Ui,
    ) -> Result<usize, ActionError> {
        let keyword = keyword.trim().to_string();
        self.set_loading(ui, true);
        ui.clear_banner();

        let request = SearchRequest {
            keyword: keyword.clone(),
            filters: self.state.filters.applied().clone(),
        };
        debug!(%keyword, filters = request.filters.len(), "searching");
        let outcome = self.api.search(&request).await;
        self.set_loading(ui, false);

        match outcome {
            Ok(response) => {
                let count = response.count();
                info!(%keyword, count, "search finished");
                self.state.keyword = if response.keyword.is_empty() {
                    keyword
                } else {
                    response.keyword
                };
                self.state.results = response.results;
                self.state.count = count;
                self.render(ui);
                Ok(count)
            }
            Err(err) => {
                match &err {
                    ApiError::Server { .. } => warn!(error = %err, "search rejected"),
                    _ => error!(error = %err, "search request failed"),
                }
                ui.notify(Notice::error(err.user_message(SEARCH_FAILED, SEARCH_FAILED)));
                Err(err.into())
            }
        }
    }

    fn set_loading(&self, ui: &mut impl Ui, loading: bool) {
        ui.show(Region::LoadingSpinner, loading);
        if loading {
            ui.set_control(Control::SearchButton, false, "Searching...");
        } else {
            ui.reset_control(Control::SearchButton);
        }
    }

    /// Draws the current results into the results container.
    pub fn render(&mut self, ui: &mut impl Ui) {
        let keyword = &self.state.keyword;
        ui.render(
            Region::ResultsTitle,
            cards::results_title(self.state.count, keyword),
        );
        let list = if self.state.count == 0 {
            cards::no_results(keyword)
        } else {
            cards::render_results(&self.state.results, keyword)
        };
        ui.render(Region::ResultsList, list);
        self.set_visible(ui, true);
        ui.scroll_to(Region::ResultsContainer);
    }

    pub fn set_visible(&mut self, ui: &mut impl Ui, visible: bool) {
        self.state.visible = visible;
        ui.show(Region::ResultsContainer, visible);
    }

    pub fn clear_results(&mut self, ui: &mut impl Ui) {
        self.set_visible(ui, false);
        self.state.results.clear();
        self.state.count = 0;
        self.state.keyword.clear();
    }

    /// Header figures. Failures are only logged.
    pub async fn load_stats(&mut self, ui: &mut impl Ui) -> Result<SiteStats, ActionError> {
        match self.api.stats().await {
            Ok(stats) => {
                ui.render(Region::Stats, cards::render_site_stats(&stats));
                self.state.stats = Some(stats.clone());
                Ok(stats)
            }
            Err(err) => {
                error!(error = %err, "failed to load stats");
                Err(err.into())
            }
        }
    }

    /// Hands the current results to the user as a CSV file; returns its name.
    pub fn export_csv(&self, ui: &mut impl Ui, today: NaiveDate) -> Result<String, ActionError> {
        if self.state.results.is_empty() {
            ui.notify(Notice::error("No results to export"));
            return Err(ActionError::Validation("No results to export".to_string()));
        }
        let filename = export_filename(&self.state.keyword, today);
        let csv = render_csv(&self.state.results);
        if let Err(err) = ui.download(&filename, csv.as_bytes()) {
            error!(%filename, error = %err, "export failed");
            ui.notify(Notice::error(format!("Could not save {filename}: {err}")));
            return Err(err.into());
        }
        info!(%filename, rows = self.state.results.len(), "exported results");
        ui.notify(Notice::success(format!(
            "Exported {} results to CSV",
            self.state.results.len()
        )));
        Ok(filename)
    }

    pub fn toggle_filter_panel(&mut self, ui: &mut impl Ui) {
        let open = !self.state.filters.is_panel_open();
        self.state.filters.set_panel_open(open);
        ui.show(Region::FilterOptions, open);
    }

    pub fn set_filter(&mut self, category: FilterCategory, value: &str, checked: bool) {
        self.state.filters.set_checked(category, value, checked);
    }

    /// Commits the ticked boxes. The next search sends them.
    pub fn apply_filters(&mut self, ui: &mut impl Ui) {
        let active = !self.state.filters.apply().is_empty();
        debug!(active, "filters applied");
        ui.show(Region::ClearFiltersButton, active);
    }

    pub fn clear_filters(&mut self, ui: &mut impl Ui) {
        self.state.filters.clear();
        ui.show(Region::ClearFiltersButton, false);
    }
}
