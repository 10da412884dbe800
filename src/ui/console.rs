//! Terminal rendition of the page.
//!
//! Regions are kept as HTML so the report writer can assemble a snapshot;
//! notices, alerts and prompts go to stderr so stdout stays clean for
//! results.

use std::collections::BTreeMap;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use colored::Colorize;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tracing::{debug, warn};

use super::{Control, Level, Modal, Notice, Region, StatSlot, Ui};

pub struct ConsoleUi {
    regions: BTreeMap<Region, String>,
    visibility: BTreeMap<Region, bool>,
    stats: BTreeMap<StatSlot, String>,
    notices: Vec<Notice>,
    downloads: Vec<PathBuf>,
    export_dir: PathBuf,
    assume_yes: bool,
    progress: Option<ProgressBar>,
}

impl ConsoleUi {
    pub fn new(export_dir: impl Into<PathBuf>, assume_yes: bool) -> Self {
        Self {
            regions: BTreeMap::new(),
            visibility: BTreeMap::new(),
            stats: BTreeMap::new(),
            notices: Vec::new(),
            downloads: Vec::new(),
            export_dir: export_dir.into(),
            assume_yes,
            progress: None,
        }
    }

    pub fn region(&self, region: Region) -> Option<&str> {
        self.regions.get(&region).map(String::as_str)
    }

    /// A rendered region counts as visible until something hides it.
    pub fn is_visible(&self, region: Region) -> bool {
        self.visibility
            .get(&region)
            .copied()
            .unwrap_or_else(|| self.regions.contains_key(&region))
    }

    /// Rendered regions that are currently on screen, in page order.
    pub fn visible_regions(&self) -> impl Iterator<Item = (Region, &str)> {
        self.regions
            .iter()
            .filter(|(r, _)| self.is_visible(**r))
            .map(|(r, html)| (*r, html.as_str()))
    }

    pub fn stats(&self) -> &BTreeMap<StatSlot, String> {
        &self.stats
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn downloads(&self) -> &[PathBuf] {
        &self.downloads
    }

    pub fn export_dir(&self) -> &Path {
        &self.export_dir
    }

    pub fn set_export_dir(&mut self, dir: impl Into<PathBuf>) {
        self.export_dir = dir.into();
    }

    fn progress_bar(&mut self) -> &ProgressBar {
        self.progress.get_or_insert_with(|| {
            let pb = ProgressBar::new(100);
            pb.set_draw_target(ProgressDrawTarget::stderr());
            if let Ok(style) = ProgressStyle::with_template(":: {msg} [{bar:30}] {pos}%") {
                pb.set_style(style.progress_chars("#>-"));
            }
            pb.enable_steady_tick(Duration::from_millis(200));
            pb
        })
    }
}

fn print_notice(notice: &Notice) {
    let line = match notice.level() {
        Level::Success => format!("{} {}", "[+]".bold().green(), notice.message().green()),
        Level::Error => format!("{} {}", "[!]".bold().red(), notice.message().red()),
        Level::Warning => format!("{} {}", "[~]".bold().yellow(), notice.message().yellow()),
        Level::Info => format!("{} {}", "[*]".bold().cyan(), notice.message()),
    };
    eprintln!("{line}");
}

impl Ui for ConsoleUi {
    fn render(&mut self, region: Region, html: String) {
        debug!(region = %region.dom_id(), bytes = html.len(), "render");
        self.regions.insert(region, html);
    }

    fn show(&mut self, region: Region, visible: bool) {
        self.visibility.insert(region, visible);
    }

    fn notify(&mut self, notice: Notice) {
        print_notice(&notice);
        self.notices.push(notice);
    }

    fn clear_banner(&mut self) {
        self.notices.retain(|n| !matches!(n, Notice::Banner(_)));
    }

    fn alert(&mut self, message: &str) {
        eprintln!("{} {}", "[!]".bold().yellow(), message.bold());
    }

    fn confirm(&mut self, message: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        eprint!("{}\n{} ", message, "Continue? [y/N]".bold());
        if io::stderr().flush().is_err() {
            return false;
        }
        let mut answer = String::new();
        match io::stdin().lock().read_line(&mut answer) {
            Ok(_) => matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"),
            Err(e) => {
                warn!(error = %e, "could not read confirmation");
                false
            }
        }
    }

    fn set_control(&mut self, control: Control, enabled: bool, label: &str) {
        debug!(?control, enabled, label, "control");
    }

    fn open_modal(&mut self, modal: Modal) {
        debug!(?modal, "open modal");
    }

    fn close_modal(&mut self, modal: Modal) {
        debug!(?modal, "close modal");
    }

    fn upload_progress(&mut self, percent: u8, label: &str) {
        let label = label.to_string();
        let pb = self.progress_bar();
        pb.set_position(u64::from(percent.min(100)));
        pb.set_message(label);
    }

    fn hide_upload_progress(&mut self) {
        if let Some(pb) = self.progress.take() {
            pb.finish_and_clear();
        }
    }

    fn set_stat(&mut self, slot: StatSlot, value: String) {
        self.stats.insert(slot, value);
    }

    fn download(&mut self, filename: &str, contents: &[u8]) -> io::Result<()> {
        std::fs::create_dir_all(&self.export_dir)?;
        let path = self.export_dir.join(filename);
        std::fs::write(&path, contents)?;
        debug!(path = %path.display(), "saved download");
        self.downloads.push(path);
        Ok(())
    }
}
