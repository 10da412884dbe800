use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "opfa",
    version,
    about = "OPFA community directory, RFP workspace and tender browser client",
    long_about = "opfa drives an OPFA community-directory server from the terminal: keyword search with filters and CSV export, the RFP workspace (documents, AI analysis, member matching) and the procurement tender browser.\n\nExamples:\n  opfa search water --sector Energy --export\n  opfa rfp upload 12 ./terms-of-reference.pdf\n  opfa tenders scrape giz -o giz.html\n  opfa --config ~/.opfa/config.yml status\n\nTip: run `opfa init-config` once and keep the session cookie there."
)]
pub struct CliArgs {
    #[arg(
        short = 'v',
        long = "verbose",
        action = ArgAction::Count,
        global = true,
        help_heading = "Output",
        help = "Increase log verbosity (-v, -vv). RUST_LOG overrides."
    )]
    pub verbose: u8,

    #[arg(
        short = 'n',
        long = "no-color",
        global = true,
        help_heading = "Output",
        help = "Disable colored output."
    )]
    pub no_color: bool,

    #[arg(
        short = 'o',
        long = "output",
        visible_alias = "out",
        value_name = "FILE",
        global = true,
        help_heading = "Output",
        help = "Also write the result to a file (.html page snapshot, .json, .csv or .txt)."
    )]
    pub output: Option<String>,

    #[arg(
        short = 'f',
        long = "format",
        visible_alias = "output-format",
        value_name = "FORMAT",
        global = true,
        help_heading = "Output",
        help = "Output file format (text, json, csv, html); inferred from --output when omitted."
    )]
    pub format: Option<String>,

    #[arg(
        short = 'u',
        long = "base-url",
        visible_alias = "url",
        value_name = "URL",
        env = "OPFA_BASE_URL",
        global = true,
        help_heading = "Server",
        help = "Server base URL (default http://127.0.0.1:5000)."
    )]
    pub base_url: Option<String>,

    #[arg(
        short = 's',
        long = "session",
        value_name = "COOKIE",
        env = "OPFA_SESSION",
        hide_env_values = true,
        global = true,
        help_heading = "Server",
        help = "Session cookie of a logged-in user (value or name=value)."
    )]
    pub session: Option<String>,

    #[arg(
        short = 'T',
        long = "timeout",
        value_name = "SECONDS",
        global = true,
        help_heading = "Server",
        help = "Per-request timeout in seconds (default 120)."
    )]
    pub timeout: Option<u64>,

    #[arg(
        short = 'C',
        long = "config",
        visible_alias = "cfg",
        value_name = "FILE",
        global = true,
        help_heading = "Input",
        help = "Path to config file (defaults to ~/.opfa/config.yml)."
    )]
    pub config: Option<String>,

    #[arg(
        short = 'y',
        long = "yes",
        visible_alias = "assume-yes",
        global = true,
        help_heading = "Input",
        help = "Answer yes to delete confirmations."
    )]
    pub yes: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Directory record counts.
    Stats,
    /// Directory, knowledge base and tender figures in one go.
    Status,
    /// Keyword search over the community directory.
    Search(SearchArgs),
    /// RFP workspace.
    #[command(subcommand)]
    Rfp(RfpCommand),
    /// Procurement tenders.
    #[command(subcommand)]
    Tenders(TenderCommand),
    /// Write the default config file if it does not exist yet.
    InitConfig,
}

#[derive(Args, Debug, Clone, Default)]
pub struct SearchArgs {
    /// Keyword or phrase; comma-separate several to highlight each.
    #[arg(value_name = "KEYWORD", default_value = "")]
    pub keyword: String,

    #[arg(
        long = "source",
        value_name = "VALUE",
        action = ArgAction::Append,
        value_delimiter = ',',
        help_heading = "Filters",
        help = "Only records from this source (repeatable)."
    )]
    pub source: Vec<String>,

    #[arg(
        long = "experience",
        value_name = "VALUE",
        action = ArgAction::Append,
        value_delimiter = ',',
        help_heading = "Filters",
        help = "Years of experience bucket (repeatable)."
    )]
    pub experience: Vec<String>,

    #[arg(
        long = "sustainability",
        visible_alias = "sustainability-experience",
        value_name = "VALUE",
        action = ArgAction::Append,
        value_delimiter = ',',
        help_heading = "Filters",
        help = "Years of sustainability experience bucket (repeatable)."
    )]
    pub sustainability: Vec<String>,

    #[arg(
        long = "competency",
        visible_alias = "competencies",
        value_name = "VALUE",
        action = ArgAction::Append,
        value_delimiter = ',',
        help_heading = "Filters",
        help = "Key competency (repeatable)."
    )]
    pub competency: Vec<String>,

    #[arg(
        long = "sector",
        visible_alias = "sectors",
        value_name = "VALUE",
        action = ArgAction::Append,
        value_delimiter = ',',
        help_heading = "Filters",
        help = "Key sector (repeatable)."
    )]
    pub sector: Vec<String>,

    #[arg(
        short = 'e',
        long = "export",
        value_name = "DIR",
        num_args = 0..=1,
        help_heading = "Export",
        help = "Save the results as CSV, optionally into DIR (defaults to export_dir)."
    )]
    pub export: Option<Option<PathBuf>>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum RfpCommand {
    /// List RFP projects.
    List,
    /// Details, documents and analysis of one RFP.
    Show { id: i64 },
    /// Create an RFP project.
    Create {
        name: String,
        #[arg(long, value_name = "URL")]
        link: Option<String>,
    },
    /// Change fields of an RFP, e.g. --set country=Kenya --set due_date=2025-06-30.
    Edit {
        id: i64,
        #[arg(
            long = "set",
            value_name = "FIELD=VALUE",
            action = ArgAction::Append,
            required = true
        )]
        set: Vec<String>,
    },
    /// Delete an RFP with its documents and analysis.
    Delete { id: i64 },
    /// Upload a PDF, DOC or DOCX document to an RFP.
    Upload { id: i64, file: PathBuf },
    /// Delete one uploaded document.
    DeleteDoc {
        document_id: i64,
        /// RFP owning the document; its document list is shown afterwards.
        #[arg(long = "rfp", value_name = "ID")]
        rfp: Option<i64>,
    },
    /// Run the AI analysis of an RFP against the knowledge base.
    Analyze { id: i64 },
    /// Rank community members for an analyzed RFP.
    Members { id: i64 },
    /// Build the company knowledge base.
    KbInit,
    /// Check whether the knowledge base is ready.
    KbStatus,
}

#[derive(Subcommand, Debug, Clone)]
pub enum TenderCommand {
    /// List tenders of one source, or of all three.
    List {
        #[arg(value_name = "SOURCE", help = "aus, giz or undp; all sources when omitted.")]
        source: Option<String>,
        #[arg(
            long = "filter",
            value_name = "FILTER",
            default_value = "all",
            help = "all, processed or unprocessed."
        )]
        filter: String,
    },
    /// Ask the server to scrape a source (aus, giz, undp or all).
    Scrape { source: String },
    /// Mark a tender processed, or unprocessed with --undo.
    Mark {
        tender_id: i64,
        #[arg(long)]
        undo: bool,
        /// Source list to refresh afterwards.
        #[arg(long = "source", value_name = "SOURCE")]
        source: Option<String>,
    },
    /// Tender totals and last scrape date.
    Stats,
}
