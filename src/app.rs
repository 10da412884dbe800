use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;
use clap::{error::ErrorKind, CommandFactory, Parser};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use serde_json::json;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::api::{ApiClient, ApiConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
use crate::cli::args::{CliArgs, Command, RfpCommand, SearchArgs, TenderCommand};
use crate::cli::validation;
use crate::config::{self, ConfigFile};
use crate::error::ActionError;
use crate::filters::FilterCategory;
use crate::models::{RfpRecord, TenderFilter, UploadFile};
use crate::output::csv::render_csv;
use crate::output::{self, CommandOutput, OutputFormat};
use crate::render::{cards, format_date, is_overdue, tenders::last_scraped};
use crate::session::{Session, Tab};
use crate::ui::{Action, ConsoleUi, Region, StatSlot, Ui};

fn print_banner(base_url: &str) {
    eprintln!(
        "{} {} {}",
        format!("opfa v{}", env!("CARGO_PKG_VERSION")).bold().blue(),
        "::".bold().white(),
        base_url.white()
    );
}

fn format_kv_line(label: &str, value: &str) -> String {
    format!(":: {:<18}: {}", label, value)
}

/// Finds the (sub)command the user asked help for, e.g. `opfa rfp edit -h`.
fn help_target(argv: &[String]) -> (Vec<String>, clap::Command) {
    let mut cmd = CliArgs::command();
    let mut path = vec![cmd.get_name().to_string()];
    for word in argv.iter().skip(1).filter(|a| !a.starts_with('-')) {
        match cmd.find_subcommand(word).cloned() {
            Some(sub) => {
                path.push(sub.get_name().to_string());
                cmd = sub;
            }
            None => break,
        }
    }
    (path, cmd)
}

fn render_custom_help(path: &[String], cmd: &clap::Command) -> String {
    let mut out = String::new();

    out.push_str(&path.join(" "));
    if let Some(version) = cmd.get_version() {
        out.push(' ');
        out.push_str(version);
    }
    out.push('\n');

    if let Some(about) = cmd.get_about() {
        out.push_str(&about.to_string());
        out.push('\n');
    }

    if let Some(long_about) = cmd.get_long_about() {
        out.push('\n');
        out.push_str(&long_about.to_string());
        out.push('\n');
    }

    let positionals: Vec<String> = cmd
        .get_positionals()
        .map(|arg| {
            let name = arg
                .get_value_names()
                .and_then(|names| names.first())
                .map(|name| name.to_string())
                .unwrap_or_else(|| arg.get_id().to_string().to_uppercase());
            if arg.is_required_set() {
                format!("<{name}>")
            } else {
                format!("[{name}]")
            }
        })
        .collect();

    out.push('\n');
    out.push_str("Usage: ");
    out.push_str(&path.join(" "));
    out.push_str(" [OPTIONS]");
    if cmd.has_subcommands() {
        out.push_str(" <COMMAND>");
    }
    for p in &positionals {
        out.push(' ');
        out.push_str(p);
    }
    out.push_str("\n\n");

    if cmd.has_subcommands() {
        out.push_str("Commands:\n");
        for sub in cmd.get_subcommands() {
            let about = sub.get_about().map(|a| a.to_string()).unwrap_or_default();
            out.push_str(&format!("  {:<14}{}\n", sub.get_name(), about));
        }
        out.push('\n');
    }

    let mut sections: Vec<(String, Vec<&clap::Arg>)> = Vec::new();
    let mut section_idx: HashMap<String, usize> = HashMap::new();

    for arg in cmd.get_arguments() {
        if arg.is_hide_set() || arg.is_positional() {
            continue;
        }

        let heading = arg.get_help_heading().unwrap_or("Options").to_string();

        let idx = match section_idx.get(&heading).copied() {
            Some(i) => i,
            None => {
                sections.push((heading.clone(), Vec::new()));
                let i = sections.len() - 1;
                section_idx.insert(heading, i);
                i
            }
        };

        sections[idx].1.push(arg);
    }

    for (heading, args) in sections {
        out.push_str(&heading);
        out.push_str(":\n");

        for arg in args {
            let mut parts: Vec<String> = Vec::new();

            if let Some(short) = arg.get_short() {
                parts.push(format!("-{short}"));
            }

            if let Some(long) = arg.get_long() {
                parts.push(format!("--{long}"));
            }

            if let Some(aliases) = arg.get_visible_aliases() {
                for alias in aliases {
                    let rendered = format!("--{alias}");
                    if !parts.iter().any(|p| p == &rendered) {
                        parts.push(rendered);
                    }
                }
            }

            let mut flags = parts.join(", ");

            if arg.get_action().takes_values() {
                let value_name = arg
                    .get_value_names()
                    .and_then(|names| names.first())
                    .map(|name| name.as_str())
                    .unwrap_or("VALUE");
                let placeholder = format!("<{value_name}>");
                let min_values = arg.get_num_args().map(|r| r.min_values()).unwrap_or(1);

                if min_values == 0 {
                    flags.push_str(&format!(" [{placeholder}]"));
                } else {
                    flags.push(' ');
                    flags.push_str(&placeholder);
                }
            }

            if let Some(env) = arg.get_env() {
                flags.push_str(&format!(" [env: {}]", env.to_string_lossy()));
            }

            out.push_str("  ");
            out.push_str(&flags);
            out.push('\n');

            if let Some(help) = arg.get_help() {
                let help = help.to_string();
                if !help.trim().is_empty() {
                    out.push_str("          ");
                    out.push_str(help.trim());
                    out.push('\n');
                }
            }

            out.push('\n');
        }
    }

    out
}

/// Installs the stderr log subscriber. `RUST_LOG` wins over `-v`.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,opfa={level}")));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init();
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_draw_target(ProgressDrawTarget::stderr());
    if let Ok(style) = ProgressStyle::with_template(":: {spinner} {msg} [{elapsed}]") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

async fn with_spinner<T>(message: &str, fut: impl Future<Output = T>) -> T {
    let pb = spinner(message);
    let out = fut.await;
    pb.finish_and_clear();
    out
}

struct RunConfig {
    base_url: String,
    session_cookie: Option<String>,
    timeout: u64,
    export_dir: PathBuf,
    no_color: bool,
    assume_yes: bool,
    output: Option<String>,
    output_format: OutputFormat,
    command: Command,
}

fn build_run_config(args: CliArgs, cfg: ConfigFile) -> Result<RunConfig, String> {
    validation::validate(&args)?;

    let base_url = args
        .base_url
        .or(cfg.base_url)
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    let session_cookie = args
        .session
        .or(cfg.session_cookie)
        .filter(|s| !s.trim().is_empty());
    let timeout = args
        .timeout
        .or(cfg.timeout)
        .unwrap_or(DEFAULT_TIMEOUT_SECS);
    if timeout == 0 {
        return Err("invalid timeout, expected positive integer".to_string());
    }
    let export_dir = cfg
        .export_dir
        .as_deref()
        .map(config::expand_tilde)
        .unwrap_or_else(|| PathBuf::from("."));

    let no_color = args.no_color || cfg.no_color.unwrap_or(false);
    let assume_yes = args.yes || cfg.assume_yes.unwrap_or(false);

    let output_format = match args.format.as_deref() {
        Some(raw) => OutputFormat::parse(raw).ok_or_else(|| format!("invalid --format '{raw}'"))?,
        None => args
            .output
            .as_deref()
            .and_then(output::infer_format_from_path)
            .unwrap_or(OutputFormat::Text),
    };

    Ok(RunConfig {
        base_url,
        session_cookie,
        timeout,
        export_dir,
        no_color,
        assume_yes,
        output: args.output,
        output_format,
        command: args.command,
    })
}

fn action_failed(err: ActionError) -> String {
    err.to_string()
}

fn rfp_line(rfp: &RfpRecord) -> String {
    let now = Utc::now();
    let due = rfp
        .due_date
        .as_deref()
        .filter(|d| !d.is_empty())
        .map(format_date)
        .unwrap_or_else(|| "No due date".to_string());
    let overdue = if is_overdue(rfp.due_date.as_deref(), now) {
        " [Overdue]"
    } else {
        ""
    };
    let org = rfp.organization_group.as_deref().unwrap_or_default();
    let place = [rfp.country.as_deref(), rfp.region.as_deref()]
        .into_iter()
        .flatten()
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" • ");
    format!(
        "#{:<5} {} | {} | {} | {}{}",
        rfp.id,
        rfp.name(),
        org,
        place,
        due,
        overdue
    )
}

async fn run_search(
    search: &SearchArgs,
    session: &mut Session,
    ui: &mut ConsoleUi,
) -> Result<CommandOutput, String> {
    let picks = [
        (FilterCategory::Source, &search.source),
        (FilterCategory::Experience, &search.experience),
        (FilterCategory::SustainabilityExperience, &search.sustainability),
        (FilterCategory::Competencies, &search.competency),
        (FilterCategory::Sectors, &search.sector),
    ];
    let mut any = false;
    for (category, values) in picks {
        for value in values.iter().map(|v| v.trim()).filter(|v| !v.is_empty()) {
            session.search.set_filter(category, value, true);
            any = true;
        }
    }
    if any {
        session.search.apply_filters(ui);
    }

    let count = session
        .search
        .perform_search(&search.keyword, ui)
        .await
        .map_err(action_failed)?;
    let state = session.search.state();

    let mut out = CommandOutput::new("search")
        .line(if state.keyword.is_empty() {
            format!("Found {count} results")
        } else {
            format!("Found {count} results for \"{}\"", state.keyword)
        })
        .lines(state.results.iter().map(|r| {
            let email = r.email.as_deref().unwrap_or_default();
            format!("{} <{}> | {}", r.full_name(), email, r.location())
        }))
        .data(&json!({
            "keyword": state.keyword,
            "count": count,
            "filters": state.filters.applied(),
            "results": state.results,
        }))
        .csv(render_csv(&state.results));

    if let Some(dir) = &search.export {
        if let Some(dir) = dir {
            ui.set_export_dir(dir.clone());
        }
        let filename = session
            .search
            .export_csv(ui, Utc::now().date_naive())
            .map_err(action_failed)?;
        let saved = ui.export_dir().join(filename);
        out = out.line(format_kv_line("Saved", &saved.display().to_string()));
    }
    Ok(out)
}

async fn load_and_select(
    id: i64,
    session: &mut Session,
    ui: &mut ConsoleUi,
) -> Result<(), String> {
    session.switch_tab(Tab::Rfp, ui).await.map_err(action_failed)?;
    session
        .dispatch(Action::SelectRfp { rfp_id: id }, ui)
        .await
        .map_err(action_failed)
}

fn selected_output(title: &str, session: &Session) -> CommandOutput {
    let state = session.rfp.state();
    let Some(rfp) = state.selected.as_ref() else {
        return CommandOutput::new(title);
    };
    let documents = rfp.documents.clone().unwrap_or_default();
    let mut out = CommandOutput::new(title).line(rfp_line(rfp));
    for (label, value) in [
        ("Link", &rfp.link),
        ("Project Focus", &rfp.project_focus),
        ("Industry", &rfp.industry),
        ("OPF Gap Size", &rfp.opf_gap_size),
        ("Posting Contact", &rfp.posting_contact),
        ("OPF Gaps", &rfp.opf_gaps),
        ("Deliverables", &rfp.deliverables),
        ("Potential Experts", &rfp.potential_experts),
        ("Staffing Needs", &rfp.specific_staffing_needs),
    ] {
        if let Some(v) = value.as_deref().filter(|v| !v.trim().is_empty()) {
            out = out.line(format_kv_line(label, v));
        }
    }
    if let Some(cost) = rfp.project_cost.as_deref().filter(|c| !c.is_empty()) {
        let currency = rfp.currency.as_deref().unwrap_or_default();
        out = out.line(format_kv_line("Project Cost", format!("{currency} {cost}").trim()));
    }
    out = out.line(format_kv_line("Documents", &documents.len().to_string()));
    out = out.lines(documents.iter().map(|d| {
        let uploaded = d
            .created_at
            .as_deref()
            .map(format_date)
            .unwrap_or_else(|| "Unknown date".to_string());
        format!("   - #{} {} ({}, uploaded {})", d.id, d.document_name, d.extension_label(), uploaded)
    }));
    if rfp.has_analysis() {
        let analyzed = rfp
            .ai_analysis_date
            .as_deref()
            .map(format_date)
            .unwrap_or_else(|| "Unknown".to_string());
        out = out.line(format_kv_line("Last analyzed", &analyzed));
        if let Some(fit) = rfp.ai_fit_assessment.as_deref() {
            out = out.line(format_kv_line("Fit Assessment", fit));
        }
    }
    out.data(&json!({ "rfp": rfp, "documents": documents }))
}

async fn run_rfp(
    command: &RfpCommand,
    session: &mut Session,
    ui: &mut ConsoleUi,
) -> Result<CommandOutput, String> {
    match command {
        RfpCommand::List => {
            session.switch_tab(Tab::Rfp, ui).await.map_err(action_failed)?;
            let rfps = &session.rfp.state().rfps;
            let out = if rfps.is_empty() {
                CommandOutput::new("rfp list").line("No RFP projects yet")
            } else {
                CommandOutput::new("rfp list").lines(rfps.iter().map(rfp_line))
            };
            Ok(out.data(rfps))
        }
        RfpCommand::Show { id } => {
            load_and_select(*id, session, ui).await?;
            Ok(selected_output("rfp show", session))
        }
        RfpCommand::Create { name, link } => {
            session.switch_tab(Tab::Rfp, ui).await.map_err(action_failed)?;
            session.rfp.open_create(ui);
            let rfp = session
                .rfp
                .save_new(name, link.as_deref().unwrap_or_default(), ui)
                .await
                .map_err(action_failed)?;
            Ok(CommandOutput::new("rfp create")
                .line(format!("Created RFP #{} {}", rfp.id, rfp.name()))
                .data(&rfp))
        }
        RfpCommand::Edit { id, set } => {
            load_and_select(*id, session, ui).await?;
            let mut form = session.rfp.begin_edit(*id, ui).map_err(action_failed)?;
            for raw in set {
                let (field, value) = validation::parse_assignment(raw)?;
                form.set(&field, value);
            }
            let rfp = session
                .rfp
                .save_edit(&form, ui)
                .await
                .map_err(action_failed)?;
            Ok(CommandOutput::new("rfp edit")
                .line(format!("Updated RFP #{} {}", rfp.id, rfp.name()))
                .data(&rfp))
        }
        RfpCommand::Delete { id } => {
            session.switch_tab(Tab::Rfp, ui).await.map_err(action_failed)?;
            let name = session
                .rfp
                .state()
                .find(*id)
                .map(|r| r.name().to_string())
                .ok_or_else(|| action_failed(ActionError::UnknownRfp(*id)))?;
            match session
                .dispatch(Action::DeleteRfp { rfp_id: *id, name: name.clone() }, ui)
                .await
            {
                Ok(()) => Ok(CommandOutput::new("rfp delete").line(format!("Deleted RFP #{id} {name}"))),
                Err(e) if e.is_declined() => Ok(CommandOutput::new("rfp delete").line("Cancelled")),
                Err(e) => Err(action_failed(e)),
            }
        }
        RfpCommand::Upload { id, file } => {
            let picked = UploadFile::from_path(file)
                .map_err(|e| format!("failed to read '{}': {e}", file.display()))?;
            load_and_select(*id, session, ui).await?;
            session
                .dispatch(Action::UploadDocument { rfp_id: *id }, ui)
                .await
                .map_err(action_failed)?;
            let document = session
                .rfp
                .upload_document(Some(picked), ui)
                .await
                .map_err(action_failed)?;
            let mut out = selected_output("rfp upload", session);
            out.lines
                .insert(0, format!("Uploaded {}", document.document_name));
            Ok(out)
        }
        RfpCommand::DeleteDoc { document_id, rfp } => {
            let mut name = format!("#{document_id}");
            if let Some(rfp_id) = rfp {
                load_and_select(*rfp_id, session, ui).await?;
                if let Some(doc) = session
                    .rfp
                    .state()
                    .selected
                    .as_ref()
                    .and_then(|r| r.documents.as_ref())
                    .and_then(|docs| docs.iter().find(|d| d.id == *document_id))
                {
                    name = doc.document_name.clone();
                }
            }
            let action = Action::DeleteDocument {
                document_id: *document_id,
                name: name.clone(),
            };
            match session.dispatch(action, ui).await {
                Ok(()) => Ok(CommandOutput::new("rfp delete-doc").line(format!("Deleted document {name}"))),
                Err(e) if e.is_declined() => Ok(CommandOutput::new("rfp delete-doc").line("Cancelled")),
                Err(e) => Err(action_failed(e)),
            }
        }
        RfpCommand::Analyze { id } => {
            load_and_select(*id, session, ui).await?;
            let outcome = with_spinner(
                "Analyzing RFP against company knowledge base...",
                session.rfp.generate_analysis(ui),
            )
            .await
            .map_err(action_failed)?;
            let a = &outcome.analysis;
            let mut out = CommandOutput::new("rfp analyze");
            for (label, value) in [
                ("Fit Assessment", &a.fit_assessment),
                ("Competitive Position", &a.competitive_position),
                ("Key Strengths", &a.key_strengths),
                ("Gaps & Challenges", &a.gaps_challenges),
                ("Resource Requirements", &a.resource_requirements),
                ("Risk Assessment", &a.risk_assessment),
                ("Recommendations", &a.recommendations),
            ] {
                out = out.line(format!("{label}:")).line(format!(
                    "  {}",
                    value.as_deref().filter(|v| !v.is_empty()).unwrap_or("N/A")
                ));
            }
            let fields = a.populated_metadata_fields();
            if !fields.is_empty() {
                out = out.line(format_kv_line("Populated fields", &fields.join(", ")));
            }
            Ok(out.data(&outcome))
        }
        RfpCommand::Members { id } => {
            load_and_select(*id, session, ui).await?;
            let matching = with_spinner(
                "Finding relevant team members...",
                session.rfp.find_members(ui),
            )
            .await
            .map_err(action_failed)?;
            let mut out = CommandOutput::new("rfp members");
            if !matching.keywords.is_empty() {
                out = out.line(format_kv_line("Keywords", &matching.keywords.join(", ")));
            }
            if matching.members.is_empty() {
                out = out.line("No relevant team members found");
            }
            out = out.lines(matching.members.iter().map(|m| {
                format!(
                    "{:>4}/10 {} | {}",
                    format!("{:.1}", m.score()),
                    m.name.as_deref().unwrap_or("N/A"),
                    m.key_skills.join(", ")
                )
            }));
            Ok(out.data(&matching))
        }
        RfpCommand::KbInit => {
            let kb = with_spinner(
                "Initializing knowledge base...",
                session.rfp.init_knowledge_base(ui),
            )
            .await
            .map_err(action_failed)?;
            let line = if kb.already_initialized {
                "Knowledge base already initialized"
            } else {
                "Knowledge base initialized"
            };
            Ok(CommandOutput::new("rfp kb-init").line(line).data(&kb))
        }
        RfpCommand::KbStatus => {
            let status = session
                .rfp
                .knowledge_base_status(ui)
                .await
                .map_err(action_failed)?;
            let line = if status.is_initialized() {
                format!("initialized ({} document chunks)", status.document_count)
            } else {
                "not initialized".to_string()
            };
            Ok(CommandOutput::new("rfp kb-status")
                .line(format_kv_line("Knowledge base", &line))
                .data(&status))
        }
    }
}

fn tender_stat_lines(ui: &ConsoleUi) -> Vec<String> {
    ui.stats()
        .iter()
        .map(|(slot, value)| {
            let label = match slot {
                StatSlot::TotalTenders => "Total Tenders",
                StatSlot::Unprocessed => "Unprocessed",
                StatSlot::LastScraped => "Last Scraped",
            };
            format_kv_line(label, value)
        })
        .collect()
}

async fn run_tenders(
    command: &TenderCommand,
    session: &mut Session,
    ui: &mut ConsoleUi,
) -> Result<CommandOutput, String> {
    match command {
        TenderCommand::List { source, filter } => {
            let sources = match source.as_deref() {
                Some(raw) => validation::parse_sources(raw)?,
                None => validation::parse_sources("all")?,
            };
            let filter = TenderFilter::parse(filter).unwrap_or_default();
            session.tenders.set_filter(filter);
            for s in &sources {
                session
                    .switch_tab(Tab::Tenders(*s), ui)
                    .await
                    .map_err(action_failed)?;
            }
            let lists = &session.tenders.state().lists;
            let mut out = CommandOutput::new("tenders list");
            let mut data = serde_json::Map::new();
            for s in &sources {
                let tenders = lists.get(s).cloned().unwrap_or_default();
                out = out.line(format!("{} ({})", s.label(), tenders.len()));
                out = out.lines(tenders.iter().map(|t| {
                    format!(
                        "   #{:<5} {} | {} | {} | {}",
                        t.id,
                        t.title,
                        t.organization.as_deref().unwrap_or_default(),
                        t.closing_date
                            .as_deref()
                            .filter(|d| !d.is_empty())
                            .unwrap_or("No deadline"),
                        if t.processed { "Processed" } else { "Unprocessed" }
                    )
                }));
                data.insert(s.slug().to_string(), json!(tenders));
            }
            Ok(out.data(&data))
        }
        TenderCommand::Scrape { source } => {
            let sources = validation::parse_sources(source)?;
            let mut out = CommandOutput::new("tenders scrape");
            for s in sources {
                session.tenders.set_active(Some(s));
                let message = with_spinner(
                    &format!("Scraping {} tenders...", s.short_name()),
                    session.tenders.scrape(s, ui),
                )
                .await
                .map_err(action_failed)?;
                let count = session.tenders.state().lists.get(&s).map(Vec::len).unwrap_or(0);
                out = out.line(format!(
                    "{}: {} ({} listed)",
                    s.short_name(),
                    message.unwrap_or_else(|| "scraped".to_string()),
                    count
                ));
            }
            let stats = session.tenders.state().stats.clone();
            Ok(out.lines(tender_stat_lines(ui)).data(&stats))
        }
        TenderCommand::Mark {
            tender_id,
            undo,
            source,
        } => {
            if let Some(raw) = source.as_deref() {
                session
                    .tenders
                    .set_active(Some(validation::parse_source(raw)?));
            }
            let processed = !*undo;
            session
                .dispatch(
                    Action::ToggleTender {
                        tender_id: *tender_id,
                        processed,
                    },
                    ui,
                )
                .await
                .map_err(action_failed)?;
            let state = if processed { "processed" } else { "unprocessed" };
            Ok(CommandOutput::new("tenders mark")
                .line(format!("Tender #{tender_id} marked {state}"))
                .lines(tender_stat_lines(ui)))
        }
        TenderCommand::Stats => {
            let stats = session
                .tenders
                .load_stats(ui)
                .await
                .map_err(action_failed)?;
            Ok(CommandOutput::new("tenders stats")
                .lines(tender_stat_lines(ui))
                .data(&stats))
        }
    }
}

/// Hits the three stats endpoints at once.
async fn run_status(api: &ApiClient, ui: &mut ConsoleUi) -> CommandOutput {
    let (site, kb, tenders) = with_spinner("Checking server...", async {
        futures::join!(api.stats(), api.knowledge_base_status(), api.tender_stats())
    })
    .await;

    let mut out = CommandOutput::new("status");
    let mut data = serde_json::Map::new();
    match site {
        Ok(stats) => {
            ui.render(Region::Stats, cards::render_site_stats(&stats));
            out = out.lines(cards::site_stats_lines(&stats));
            data.insert("directory".to_string(), json!(stats));
        }
        Err(e) => out = out.line(format_kv_line("Directory", &format!("unavailable ({e})"))),
    }
    match kb {
        Ok(status) if status.is_initialized() => {
            out = out.line(format_kv_line(
                "Knowledge base",
                &format!("initialized ({} document chunks)", status.document_count),
            ));
            data.insert("knowledge_base".to_string(), json!(status));
        }
        Ok(status) => {
            out = out.line(format_kv_line("Knowledge base", "not initialized"));
            data.insert("knowledge_base".to_string(), json!(status));
        }
        Err(e) => out = out.line(format_kv_line("Knowledge base", &format!("unavailable ({e})"))),
    }
    match tenders {
        Ok(stats) => {
            ui.set_stat(StatSlot::TotalTenders, stats.total_tenders.to_string());
            ui.set_stat(StatSlot::Unprocessed, stats.total_unprocessed.to_string());
            ui.set_stat(StatSlot::LastScraped, last_scraped(&stats));
            out = out.lines(tender_stat_lines(ui));
            data.insert("tenders".to_string(), json!(stats));
        }
        Err(e) => out = out.line(format_kv_line("Tenders", &format!("unavailable ({e})"))),
    }
    out.data(&data)
}

async fn execute(
    command: &Command,
    api: &ApiClient,
    session: &mut Session,
    ui: &mut ConsoleUi,
) -> Result<CommandOutput, String> {
    match command {
        Command::Stats => {
            let stats = session.search.load_stats(ui).await.map_err(action_failed)?;
            Ok(CommandOutput::new("stats")
                .lines(cards::site_stats_lines(&stats))
                .data(&stats))
        }
        Command::Status => Ok(run_status(api, ui).await),
        Command::Search(search) => run_search(search, session, ui).await,
        Command::Rfp(rfp) => run_rfp(rfp, session, ui).await,
        Command::Tenders(tenders) => run_tenders(tenders, session, ui).await,
        Command::InitConfig => Err("init-config runs before connecting".to_string()),
    }
}

async fn write_output(path: &str, rendered: &[u8]) -> Result<(), String> {
    let mut outfile = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
        .await
        .map_err(|e| format!("failed to open output file: {e}"))?;
    outfile
        .write_all(rendered)
        .await
        .map_err(|e| format!("failed to write output file: {e}"))?;
    Ok(())
}

async fn run_async(run: RunConfig) -> Result<(), String> {
    if run.no_color {
        colored::control::set_override(false);
    }
    print_banner(&run.base_url);

    let api = ApiClient::new(ApiConfig {
        base_url: run.base_url.clone(),
        session_cookie: run.session_cookie.clone(),
        timeout_seconds: run.timeout,
    })
    .map_err(|e| e.to_string())?;
    debug!(base_url = %api.base_url(), timeout = run.timeout, "client ready");

    let mut ui = ConsoleUi::new(run.export_dir.clone(), run.assume_yes);
    let mut session = Session::new(api.clone());

    let output = execute(&run.command, &api, &mut session, &mut ui).await?;
    for line in &output.lines {
        println!("{line}");
    }

    if let Some(path) = run.output.as_deref() {
        let rendered = output::render(run.output_format, &output, &ui, api.base_url())?;
        write_output(path, &rendered).await?;
        info!(path, "wrote output");
        eprintln!("{}", format_kv_line("Output", path));
    }
    Ok(())
}

fn init_config(args: &CliArgs) -> Result<(), String> {
    let path = match args.config.as_deref() {
        Some(p) => config::expand_tilde(p),
        None => config::default_config_path()
            .ok_or_else(|| "could not determine home directory".to_string())?,
    };
    if config::ensure_default_config_file(&path)? {
        println!("{}", format_kv_line("Created config", &path.display().to_string()));
    } else {
        println!("{}", format_kv_line("Config exists", &path.display().to_string()));
    }
    Ok(())
}

pub fn run_cli() -> Result<(), String> {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp => {
                let argv: Vec<String> = std::env::args().collect();
                let (path, cmd) = help_target(&argv);
                print!("{}", render_custom_help(&path, &cmd));
                return Ok(());
            }
            ErrorKind::DisplayVersion => {
                let cmd = CliArgs::command();
                print!("{}", cmd.render_version());
                return Ok(());
            }
            _ => return Err(e.to_string()),
        },
    };

    init_tracing(args.verbose);

    if matches!(args.command, Command::InitConfig) {
        return init_config(&args);
    }

    let cfg = match args.config.as_deref() {
        Some(path) => config::load_config(&config::expand_tilde(path), false)?,
        None => match config::default_config_path() {
            Some(path) => config::load_config(&path, true)?,
            None => ConfigFile::default(),
        },
    };

    let run = build_run_config(args, cfg)?;

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to build runtime: {e}"))?;

    rt.block_on(run_async(run))
}

#[cfg(test)]
mod cli_tests {
    use super::*;
    use clap::Parser;

    fn parse(argv: &[&str]) -> CliArgs {
        CliArgs::parse_from(argv)
    }

    #[test]
    fn flag_beats_config_file() {
        let args = parse(&["opfa", "--base-url", "http://flag.local", "-T", "5", "stats"]);
        let cfg = ConfigFile {
            base_url: Some("http://file.local".to_string()),
            timeout: Some(30),
            ..Default::default()
        };
        let run = build_run_config(args, cfg).unwrap();
        assert_eq!(run.base_url, "http://flag.local");
        assert_eq!(run.timeout, 5);
    }

    #[test]
    fn config_file_fills_gaps() {
        let args = parse(&["opfa", "stats"]);
        let cfg = ConfigFile {
            session_cookie: Some("abc".to_string()),
            export_dir: Some("/tmp/exports".to_string()),
            assume_yes: Some(true),
            ..Default::default()
        };
        let run = build_run_config(args, cfg).unwrap();
        assert_eq!(run.session_cookie.as_deref(), Some("abc"));
        assert_eq!(run.export_dir, PathBuf::from("/tmp/exports"));
        assert!(run.assume_yes);
        assert_eq!(run.timeout, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn output_format_follows_extension_unless_forced() {
        let run = build_run_config(
            parse(&["opfa", "-o", "page.html", "rfp", "list"]),
            ConfigFile::default(),
        )
        .unwrap();
        assert_eq!(run.output_format, OutputFormat::Html);

        let run = build_run_config(
            parse(&["opfa", "-o", "page.html", "--format", "json", "rfp", "list"]),
            ConfigFile::default(),
        )
        .unwrap();
        assert_eq!(run.output_format, OutputFormat::Json);
    }

    #[test]
    fn search_export_takes_optional_dir() {
        let args = parse(&["opfa", "search", "water", "--sector", "Energy,Water", "--export"]);
        match args.command {
            Command::Search(s) => {
                assert_eq!(s.keyword, "water");
                assert_eq!(s.sector, vec!["Energy".to_string(), "Water".to_string()]);
                assert_eq!(s.export, Some(None));
            }
            other => panic!("unexpected command {other:?}"),
        }
        let args = parse(&["opfa", "search", "--export", "out"]);
        match args.command {
            Command::Search(s) => {
                assert_eq!(s.keyword, "");
                assert_eq!(s.export, Some(Some(PathBuf::from("out"))));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn help_is_rendered_for_the_named_subcommand() {
        let argv: Vec<String> = ["opfa", "rfp", "edit", "--help"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let (path, cmd) = help_target(&argv);
        assert_eq!(path, vec!["opfa", "rfp", "edit"]);
        let help = render_custom_help(&path, &cmd);
        assert!(help.contains("Usage: opfa rfp edit [OPTIONS] <ID>"));
        assert!(help.contains("--set <FIELD=VALUE>"));
    }

    #[test]
    fn top_level_help_lists_commands() {
        let (path, cmd) = help_target(&["opfa".to_string()]);
        let help = render_custom_help(&path, &cmd);
        assert!(help.contains("Commands:"));
        assert!(help.contains("tenders"));
        assert!(help.contains("--base-url"));
        assert!(help.contains("[env: OPFA_BASE_URL]"));
    }
}
