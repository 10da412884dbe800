use crate::cli::args::{CliArgs, Command, RfpCommand, TenderCommand};
use crate::models::{RfpForm, TenderFilter, TenderSource};
use crate::output::OutputFormat;

pub fn parse_source(raw: &str) -> Result<TenderSource, String> {
    TenderSource::parse(raw)
        .ok_or_else(|| format!("invalid tender source '{raw}', expected aus, giz or undp"))
}

/// `all` expands to every source.
pub fn parse_sources(raw: &str) -> Result<Vec<TenderSource>, String> {
    if raw.trim().eq_ignore_ascii_case("all") {
        return Ok(TenderSource::ALL.to_vec());
    }
    parse_source(raw).map(|s| vec![s])
}

/// Splits `field=value`, checking the field is editable.
pub fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    let (field, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("invalid --set '{raw}', expected FIELD=VALUE"))?;
    let field = field.trim();
    if !RfpForm::FIELDS.contains(&field) {
        return Err(format!(
            "unknown RFP field '{field}', expected one of: {}",
            RfpForm::FIELDS.join(", ")
        ));
    }
    Ok((field.to_string(), value.to_string()))
}

pub fn validate(args: &CliArgs) -> Result<(), String> {
    if let Some(url) = args.base_url.as_deref() {
        let parsed = reqwest::Url::parse(url.trim())
            .map_err(|e| format!("invalid --base-url '{url}': {e}"))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(format!("invalid --base-url '{url}', expected http or https"));
        }
    }
    if args.timeout == Some(0) {
        return Err("invalid timeout, expected positive integer".to_string());
    }
    if let Some(raw) = args.format.as_deref() {
        OutputFormat::parse(raw).ok_or_else(|| {
            format!("invalid --format '{raw}', expected text, json, csv or html")
        })?;
    }

    match &args.command {
        Command::Rfp(RfpCommand::Edit { set, .. }) => {
            for raw in set {
                parse_assignment(raw)?;
            }
        }
        Command::Tenders(TenderCommand::List { source, filter }) => {
            if let Some(raw) = source.as_deref() {
                parse_sources(raw)?;
            }
            TenderFilter::parse(filter).ok_or_else(|| {
                format!("invalid --filter '{filter}', expected all, processed or unprocessed")
            })?;
        }
        Command::Tenders(TenderCommand::Scrape { source }) => {
            parse_sources(source)?;
        }
        Command::Tenders(TenderCommand::Mark {
            source: Some(raw), ..
        }) => {
            parse_source(raw)?;
        }
        _ => {}
    }
    Ok(())
}
