//! Procurement tenders scraped from the three public sources.

use std::collections::BTreeMap;

use tracing::{debug, error, info};

use crate::api::ApiClient;
use crate::error::ActionError;
use crate::models::{Tender, TenderFilter, TenderSource, TenderStats};
use crate::render::tenders as view;
use crate::ui::{Control, Level, Notice, Region, StatSlot, Ui};

#[derive(Clone, Debug, Default)]
pub struct TenderState {
    pub lists: BTreeMap<TenderSource, Vec<Tender>>,
    /// Source whose tab is on screen, if any.
    pub active: Option<TenderSource>,
    pub filter: TenderFilter,
    pub stats: Option<TenderStats>,
}

pub struct TenderBrowser {
    api: ApiClient,
    state: TenderState,
}

impl TenderBrowser {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            state: TenderState::default(),
        }
    }

    pub fn state(&self) -> &TenderState {
        &self.state
    }

    pub fn set_active(&mut self, source: Option<TenderSource>) {
        self.state.active = source;
    }

    pub fn set_filter(&mut self, filter: TenderFilter) {
        self.state.filter = filter;
    }

    /// Asks the server to scrape `source`, then refreshes that list and the
    /// stats.
    pub async fn scrape(
        &mut self,
        source: TenderSource,
        ui: &mut impl Ui,
    ) -> Result<Option<String>, ActionError> {
        let button = Control::ScrapeButton(source);
        ui.set_control(button, false, "Scraping...");

        let result = match self.api.scrape(source).await {
            Ok(message) => {
                info!(source = source.short_name(), "scrape finished");
                let text = message.clone().unwrap_or_else(|| {
                    format!("{} tenders scraped successfully!", source.short_name())
                });
                ui.notify(Notice::notification(Level::Success, text));
                if let Err(err) = self.load(source, ui).await {
                    debug!(error = %err, "list refresh after scrape failed");
                }
                if let Err(err) = self.load_stats(ui).await {
                    debug!(error = %err, "stats refresh after scrape failed");
                }
                Ok(message)
            }
            Err(err) => {
                error!(source = source.short_name(), error = %err, "scrape failed");
                ui.notify(Notice::notification(
                    Level::Error,
                    format!(
                        "{} scraping failed: {}",
                        source.short_name(),
                        err.reason("Scraping failed")
                    ),
                ));
                Err(err.into())
            }
        };
        ui.reset_control(button);
        result
    }

    /// Loads one source's tenders using the current processed filter.
    pub async fn load(
        &mut self,
        source: TenderSource,
        ui: &mut impl Ui,
    ) -> Result<usize, ActionError> {
        ui.show(Region::TenderList(source), false);
        ui.show(Region::NoTendersMessage(source), false);
        ui.show(Region::TenderLoading(source), true);

        let outcome = self.api.list_tenders(Some(source), self.state.filter).await;
        let result = match outcome {
            Ok(tenders) => {
                debug!(source = source.short_name(), count = tenders.len(), "loaded tenders");
                if tenders.is_empty() {
                    ui.show(Region::NoTendersMessage(source), true);
                } else {
                    ui.render(Region::TenderList(source), view::render_tender_list(&tenders));
                    ui.show(Region::TenderList(source), true);
                }
                let count = tenders.len();
                self.state.lists.insert(source, tenders);
                Ok(count)
            }
            Err(err) => {
                error!(source = source.short_name(), error = %err, "failed to load tenders");
                ui.notify(Notice::notification(
                    Level::Error,
                    format!(
                        "Failed to load tenders: {}",
                        err.reason("Failed to load tenders")
                    ),
                ));
                Err(err.into())
            }
        };
        ui.show(Region::TenderLoading(source), false);
        result
    }

    pub async fn toggle_processed(
        &mut self,
        tender_id: i64,
        processed: bool,
        ui: &mut impl Ui,
    ) -> Result<(), ActionError> {
        match self.api.mark_processed(tender_id, processed).await {
            Ok(message) => {
                info!(tender_id, processed, "tender updated");
                let text = message.unwrap_or_else(|| {
                    if processed {
                        "Tender marked as processed".to_string()
                    } else {
                        "Tender marked as unprocessed".to_string()
                    }
                });
                ui.notify(Notice::notification(Level::Success, text));
                if let Some(source) = self.state.active {
                    if let Err(err) = self.load(source, ui).await {
                        debug!(error = %err, "list refresh after toggle failed");
                    }
                }
                if let Err(err) = self.load_stats(ui).await {
                    debug!(error = %err, "stats refresh after toggle failed");
                }
                Ok(())
            }
            Err(err) => {
                error!(tender_id, error = %err, "tender update failed");
                ui.notify(Notice::notification(
                    Level::Error,
                    format!(
                        "Failed to update tender: {}",
                        err.reason("Failed to update tender")
                    ),
                ));
                Err(err.into())
            }
        }
    }

    /// Fills whichever stat slots the view has. Failures are only logged.
    pub async fn load_stats(&mut self, ui: &mut impl Ui) -> Result<TenderStats, ActionError> {
        let stats = match self.api.tender_stats().await {
            Ok(stats) => stats,
            Err(err) => {
                error!(error = %err, "failed to load tender stats");
                return Err(err.into());
            }
        };
        if ui.has_stat(StatSlot::TotalTenders) {
            ui.set_stat(StatSlot::TotalTenders, stats.total_tenders.to_string());
        }
        if ui.has_stat(StatSlot::Unprocessed) {
            ui.set_stat(StatSlot::Unprocessed, stats.total_unprocessed.to_string());
        }
        if ui.has_stat(StatSlot::LastScraped) {
            ui.set_stat(StatSlot::LastScraped, view::last_scraped(&stats));
        }
        self.state.stats = Some(stats.clone());
        Ok(stats)
    }
}
