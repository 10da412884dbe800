use std::sync::OnceLock;

use chrono::NaiveDate;
use itertools::Itertools;
use regex::Regex;

use crate::models::SearchResult;

pub const CSV_HEADERS: [&str; 20] = [
    "First Name",
    "Last Name",
    "Email",
    "Other Email",
    "City",
    "Country",
    "Current Job",
    "Current Company",
    "LinkedIn",
    "LinkedIn Summary",
    "Years Experience",
    "Sustainability Experience",
    "LinkedIn Skills",
    "Key Competencies",
    "Key Sectors",
    "Executive Summary",
    "Gender Identity",
    "Race/Ethnicity",
    "LGBTQIA+",
    "Source",
];

type Column = fn(&SearchResult) -> Option<&str>;

const CSV_COLUMNS: [Column; 20] = [
    |r| r.first_name.as_deref(),
    |r| r.last_name.as_deref(),
    |r| r.email.as_deref(),
    |r| r.email_other.as_deref(),
    |r| r.city.as_deref(),
    |r| r.country.as_deref(),
    |r| r.current_job.as_deref(),
    |r| r.current_company.as_deref(),
    |r| r.linkedin.as_deref(),
    |r| r.linkedin_summary.as_deref(),
    |r| r.years_xp.as_deref(),
    |r| r.years_sustainability_xp.as_deref(),
    |r| r.linkedin_skills.as_deref(),
    |r| r.key_competencies.as_deref(),
    |r| r.key_sectors.as_deref(),
    |r| r.executive_summary.as_deref(),
    |r| r.gender_identity.as_deref(),
    |r| r.race_ethnicity.as_deref(),
    |r| r.lgbtqia.as_deref(),
    |r| r.source.as_deref(),
];

fn whitespace_run() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").ok()).as_ref()
}

/// Flattens a value onto one line and quotes it.
pub fn csv_cell(value: &str) -> String {
    let flat = value.replace(['\n', '\r'], " ");
    let flat = match whitespace_run() {
        Some(re) => re.replace_all(&flat, " ").into_owned(),
        None => flat.split_whitespace().join(" "),
    };
    format!("\"{}\"", flat.trim().replace('"', "\"\""))
}

/// Header line plus one line per result, `\n`-separated, no trailing newline.
pub fn render_csv(results: &[SearchResult]) -> String {
    let header = CSV_HEADERS.join(",");
    let rows = results.iter().map(|r| {
        CSV_COLUMNS
            .iter()
            .map(|column| csv_cell(column(r).unwrap_or_default()))
            .join(",")
    });
    std::iter::once(header).chain(rows).join("\n")
}

/// Keyword characters that are unsafe in a file name become `_`.
pub fn export_filename(keyword: &str, date: NaiveDate) -> String {
    let keyword: String = if keyword.is_empty() {
        "all".to_string()
    } else {
        keyword
            .chars()
            .map(|c| match c {
                '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
                c if c.is_control() => '_',
                c => c,
            })
            .collect()
    };
    format!(
        "opfa_search_results_{keyword}_{}.csv",
        date.format("%Y-%m-%d")
    )
}
