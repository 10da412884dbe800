//! The surface controllers draw on.
//!
//! Controllers never touch a document directly. They hand finished HTML
//! fragments to named [`Region`]s, flip [`Control`]s, open [`Modal`]s and
//! raise [`Notice`]s through the [`Ui`] trait, so the same controller code can
//! drive a page, a terminal or a test recorder.

pub mod console;

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use crate::models::TenderSource;
use crate::render::escape_attr;

pub use console::ConsoleUi;

pub const SUCCESS_TTL: Duration = Duration::from_secs(3);
pub const NOTIFICATION_TTL: Duration = Duration::from_secs(5);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Region {
    Stats,
    ResultsContainer,
    ResultsTitle,
    ResultsList,
    LoadingSpinner,
    FilterOptions,
    ClearFiltersButton,
    RfpList,
    NoRfpsMessage,
    RfpDetails,
    DocumentsList,
    AiAnalysis,
    TenderList(TenderSource),
    NoTendersMessage(TenderSource),
    TenderLoading(TenderSource),
}

impl Region {
    pub fn dom_id(self) -> String {
        match self {
            Region::Stats => "stats".to_string(),
            Region::ResultsContainer => "resultsContainer".to_string(),
            Region::ResultsTitle => "resultsTitle".to_string(),
            Region::ResultsList => "resultsList".to_string(),
            Region::LoadingSpinner => "loadingSpinner".to_string(),
            Region::FilterOptions => "filterOptions".to_string(),
            Region::ClearFiltersButton => "clearFiltersBtn".to_string(),
            Region::RfpList => "rfpList".to_string(),
            Region::NoRfpsMessage => "noRfpsMessage".to_string(),
            Region::RfpDetails => "rfpDetails".to_string(),
            Region::DocumentsList => "documentsList".to_string(),
            Region::AiAnalysis => "aiAnalysisContent".to_string(),
            Region::TenderList(s) => format!("tendersList-{}", s.slug()),
            Region::NoTendersMessage(s) => format!("noTendersMessage-{}", s.slug()),
            Region::TenderLoading(s) => format!("tendersLoading-{}", s.slug()),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Control {
    SearchButton,
    UploadButton,
    SaveRfpButton,
    SaveEditButton,
    ScrapeButton(TenderSource),
}

impl Control {
    /// Label shown while the control is idle.
    pub fn idle_label(self) -> String {
        match self {
            Control::SearchButton => "Search".to_string(),
            Control::UploadButton => "Upload".to_string(),
            Control::SaveRfpButton => "Save RFP".to_string(),
            Control::SaveEditButton => "Save Changes".to_string(),
            Control::ScrapeButton(s) => format!("Scrape {}", s.short_name()),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Modal {
    AddRfp,
    EditRfp,
    UploadDocument,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StatSlot {
    TotalTenders,
    Unprocessed,
    LastScraped,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    Success,
    Error,
    Warning,
    Info,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Level::Success => "success",
            Level::Error => "error",
            Level::Warning => "warning",
            Level::Info => "info",
        };
        f.write_str(s)
    }
}

/// A user-facing message.
///
/// `Banner` is the persistent error line of the page. `Toast` disappears on
/// its own after `ttl`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notice {
    Banner(String),
    Toast {
        level: Level,
        message: String,
        ttl: Duration,
    },
}

impl Notice {
    pub fn error(message: impl Into<String>) -> Self {
        Notice::Banner(message.into())
    }

    pub fn success(message: impl Into<String>) -> Self {
        Notice::Toast {
            level: Level::Success,
            message: message.into(),
            ttl: SUCCESS_TTL,
        }
    }

    pub fn notification(level: Level, message: impl Into<String>) -> Self {
        Notice::Toast {
            level,
            message: message.into(),
            ttl: NOTIFICATION_TTL,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Notice::Banner(m) => m,
            Notice::Toast { message, .. } => message,
        }
    }

    pub fn level(&self) -> Level {
        match self {
            Notice::Banner(_) => Level::Error,
            Notice::Toast { level, .. } => *level,
        }
    }
}

pub trait Ui {
    fn render(&mut self, region: Region, html: String);
    fn show(&mut self, region: Region, visible: bool);
    fn notify(&mut self, notice: Notice);
    fn clear_banner(&mut self);
    /// Blocking message the user must acknowledge.
    fn alert(&mut self, message: &str);
    fn confirm(&mut self, message: &str) -> bool;
    fn set_control(&mut self, control: Control, enabled: bool, label: &str);
    fn open_modal(&mut self, modal: Modal);
    fn close_modal(&mut self, modal: Modal);
    fn upload_progress(&mut self, percent: u8, label: &str);
    fn hide_upload_progress(&mut self);
    fn set_stat(&mut self, slot: StatSlot, value: String);
    fn download(&mut self, filename: &str, contents: &[u8]) -> std::io::Result<()>;

    fn scroll_to(&mut self, _region: Region) {}

    /// Whether the view shows this stat at all; some views omit them.
    fn has_stat(&self, _slot: StatSlot) -> bool {
        true
    }

    fn reset_control(&mut self, control: Control) {
        let label = control.idle_label();
        self.set_control(control, true, &label);
    }
}

/// User intents carried by rendered markup as `data-action` / `data-*`
/// attributes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    SelectRfp { rfp_id: i64 },
    EditRfp { rfp_id: i64 },
    DeleteRfp { rfp_id: i64, name: String },
    UploadDocument { rfp_id: i64 },
    DeleteDocument { document_id: i64, name: String },
    GenerateAnalysis,
    FindMembers,
    InitKnowledgeBase,
    ToggleTender { tender_id: i64, processed: bool },
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::SelectRfp { .. } => "select-rfp",
            Action::EditRfp { .. } => "edit-rfp",
            Action::DeleteRfp { .. } => "delete-rfp",
            Action::UploadDocument { .. } => "upload-document",
            Action::DeleteDocument { .. } => "delete-document",
            Action::GenerateAnalysis => "generate-analysis",
            Action::FindMembers => "find-members",
            Action::InitKnowledgeBase => "init-knowledge-base",
            Action::ToggleTender { .. } => "toggle-tender",
        }
    }

    /// Attribute string for an element, e.g. `data-action="edit-rfp" data-rfp-id="4"`.
    pub fn to_attrs(&self) -> String {
        let mut out = format!(r#"data-action="{}""#, self.name());
        let mut push = |key: &str, value: String| {
            out.push_str(&format!(r#" data-{key}="{}""#, escape_attr(&value)));
        };
        match self {
            Action::SelectRfp { rfp_id }
            | Action::EditRfp { rfp_id }
            | Action::UploadDocument { rfp_id } => push("rfp-id", rfp_id.to_string()),
            Action::DeleteRfp { rfp_id, name } => {
                push("rfp-id", rfp_id.to_string());
                push("name", name.clone());
            }
            Action::DeleteDocument { document_id, name } => {
                push("document-id", document_id.to_string());
                push("name", name.clone());
            }
            Action::ToggleTender {
                tender_id,
                processed,
            } => {
                push("tender-id", tender_id.to_string());
                push("processed", processed.to_string());
            }
            Action::GenerateAnalysis | Action::FindMembers | Action::InitKnowledgeBase => {}
        }
        out
    }

    /// Rebuilds an action from an element's (unescaped) `data-*` attributes.
    /// Keys may be given with or without the `data-` prefix.
    pub fn from_attrs<'a, I>(attrs: I) -> Option<Action>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let attrs: HashMap<&str, &str> = attrs
            .into_iter()
            .map(|(k, v)| (k.strip_prefix("data-").unwrap_or(k), v))
            .collect();
        let id = |key: &str| attrs.get(key).and_then(|v| v.trim().parse::<i64>().ok());
        let name = || attrs.get("name").map(|v| v.to_string()).unwrap_or_default();

        let action = match *attrs.get("action")? {
            "select-rfp" => Action::SelectRfp {
                rfp_id: id("rfp-id")?,
            },
            "edit-rfp" => Action::EditRfp {
                rfp_id: id("rfp-id")?,
            },
            "delete-rfp" => Action::DeleteRfp {
                rfp_id: id("rfp-id")?,
                name: name(),
            },
            "upload-document" => Action::UploadDocument {
                rfp_id: id("rfp-id")?,
            },
            "delete-document" => Action::DeleteDocument {
                document_id: id("document-id")?,
                name: name(),
            },
            "generate-analysis" => Action::GenerateAnalysis,
            "find-members" => Action::FindMembers,
            "init-knowledge-base" => Action::InitKnowledgeBase,
            "toggle-tender" => Action::ToggleTender {
                tender_id: id("tender-id")?,
                processed: attrs.get("processed")?.parse().ok()?,
            },
            _ => return None,
        };
        Some(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notice_constructors_pick_ttl() {
        let ok = Notice::success("RFP updated successfully!");
        assert_eq!(ok.level(), Level::Success);
        assert!(matches!(ok, Notice::Toast { ttl, .. } if ttl == SUCCESS_TTL));

        let n = Notice::notification(Level::Error, "Failed to load tenders: timeout");
        assert!(matches!(n, Notice::Toast { ttl, .. } if ttl == NOTIFICATION_TTL));
        assert_eq!(Notice::error("x").level(), Level::Error);
    }

    #[test]
    fn action_attrs_escape_names() {
        let attrs = Action::DeleteRfp {
            rfp_id: 7,
            name: r#"Bob's "Solar""#.to_string(),
        }
        .to_attrs();
        assert_eq!(
            attrs,
            r#"data-action="delete-rfp" data-rfp-id="7" data-name="Bob&#39;s &quot;Solar&quot;""#
        );
    }

    #[test]
    fn action_from_attrs() {
        assert_eq!(
            Action::from_attrs([
                ("data-action", "toggle-tender"),
                ("data-tender-id", "12"),
                ("data-processed", "true"),
            ]),
            Some(Action::ToggleTender {
                tender_id: 12,
                processed: true
            })
        );
        assert_eq!(
            Action::from_attrs([("action", "find-members")]),
            Some(Action::FindMembers)
        );
        assert_eq!(Action::from_attrs([("action", "select-rfp")]), None);
        assert_eq!(Action::from_attrs([("action", "launch")]), None);
    }

    #[test]
    fn region_ids_are_per_source() {
        assert_eq!(
            Region::TenderList(TenderSource::Giz).dom_id(),
            "tendersList-giz"
        );
        assert_eq!(Region::AiAnalysis.dom_id(), "aiAnalysisContent");
    }
}
