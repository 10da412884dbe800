pub mod csv;
pub mod report;

use serde::Serialize;
use serde_json::Value;

use crate::ui::ConsoleUi;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Html,
    Csv,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "text" | "txt" => Some(Self::Text),
            "json" => Some(Self::Json),
            "html" | "htm" => Some(Self::Html),
            "csv" => Some(Self::Csv),
            _ => None,
        }
    }
}

pub fn infer_format_from_path(path: &str) -> Option<OutputFormat> {
    let lower = path.trim().to_lowercase();
    if lower.ends_with(".json") {
        return Some(OutputFormat::Json);
    }
    if lower.ends_with(".html") || lower.ends_with(".htm") {
        return Some(OutputFormat::Html);
    }
    if lower.ends_with(".csv") {
        return Some(OutputFormat::Csv);
    }
    if lower.ends_with(".txt") {
        return Some(OutputFormat::Text);
    }
    None
}

/// What one command produced, in every shape `--output` can write.
#[derive(Clone, Debug, Default)]
pub struct CommandOutput {
    pub title: String,
    /// Plain lines, also echoed to stdout.
    pub lines: Vec<String>,
    pub data: Value,
    /// Only commands with a tabular result have one.
    pub csv: Option<String>,
}

impl CommandOutput {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            data: Value::Null,
            ..Default::default()
        }
    }

    pub fn line(mut self, line: impl Into<String>) -> Self {
        self.lines.push(line.into());
        self
    }

    pub fn lines<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lines.extend(lines.into_iter().map(Into::into));
        self
    }

    pub fn data<T: Serialize>(mut self, value: &T) -> Self {
        self.data = serde_json::to_value(value).unwrap_or(Value::Null);
        self
    }

    pub fn csv(mut self, csv: String) -> Self {
        self.csv = Some(csv);
        self
    }
}

pub fn render_text(output: &CommandOutput) -> Vec<u8> {
    let mut out = String::new();
    for line in &output.lines {
        out.push_str(line);
        out.push('\n');
    }
    out.into_bytes()
}

pub fn render_json(output: &CommandOutput) -> Vec<u8> {
    serde_json::to_vec_pretty(&output.data).unwrap_or_else(|_| b"null\n".to_vec())
}

pub fn render_csv(output: &CommandOutput) -> Result<Vec<u8>, String> {
    output
        .csv
        .as_ref()
        .map(|csv| csv.clone().into_bytes())
        .ok_or_else(|| format!("'{}' has no CSV form, use text, json or html", output.title))
}

pub fn render(
    format: OutputFormat,
    output: &CommandOutput,
    ui: &ConsoleUi,
    base_url: &str,
) -> Result<Vec<u8>, String> {
    match format {
        OutputFormat::Text => Ok(render_text(output)),
        OutputFormat::Json => Ok(render_json(output)),
        OutputFormat::Csv => render_csv(output),
        OutputFormat::Html => Ok(report::render_html(output, ui, base_url)),
    }
}
