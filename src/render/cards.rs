use itertools::Itertools;

use crate::models::{SearchResult, SiteStats};
use crate::render::text::{escape_attr, escape_html, format_resume_text, highlight_keyword};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Email,
    Link,
    Resume,
    Tags,
    Text,
}

pub struct FieldSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub icon: &'static str,
    pub kind: FieldKind,
    pub value: fn(&SearchResult) -> Option<&str>,
}

/// Card rows, in display order.
pub const RESULT_FIELDS: [FieldSpec; 17] = [
    FieldSpec {
        key: "email",
        label: "Email",
        icon: "fas fa-envelope",
        kind: FieldKind::Email,
        value: |r| r.email.as_deref(),
    },
    FieldSpec {
        key: "email_other",
        label: "Other Email",
        icon: "fas fa-envelope",
        kind: FieldKind::Email,
        value: |r| r.email_other.as_deref(),
    },
    FieldSpec {
        key: "linkedin",
        label: "LinkedIn",
        icon: "fab fa-linkedin",
        kind: FieldKind::Link,
        value: |r| r.linkedin.as_deref(),
    },
    FieldSpec {
        key: "current_job",
        label: "Current Job",
        icon: "fas fa-briefcase",
        kind: FieldKind::Text,
        value: |r| r.current_job.as_deref(),
    },
    FieldSpec {
        key: "current_company",
        label: "Current Company",
        icon: "fas fa-building",
        kind: FieldKind::Text,
        value: |r| r.current_company.as_deref(),
    },
    FieldSpec {
        key: "linkedin_summary",
        label: "LinkedIn Summary",
        icon: "fas fa-file-alt",
        kind: FieldKind::Text,
        value: |r| r.linkedin_summary.as_deref(),
    },
    FieldSpec {
        key: "resume",
        label: "Resume",
        icon: "fas fa-file-pdf",
        kind: FieldKind::Resume,
        value: |r| r.resume.as_deref(),
    },
    FieldSpec {
        key: "years_xp",
        label: "Years Experience",
        icon: "fas fa-clock",
        kind: FieldKind::Text,
        value: |r| r.years_xp.as_deref(),
    },
    FieldSpec {
        key: "years_sustainability_xp",
        label: "Sustainability Experience",
        icon: "fas fa-leaf",
        kind: FieldKind::Text,
        value: |r| r.years_sustainability_xp.as_deref(),
    },
    FieldSpec {
        key: "linkedin_skills",
        label: "LinkedIn Skills",
        icon: "fas fa-tools",
        kind: FieldKind::Tags,
        value: |r| r.linkedin_skills.as_deref(),
    },
    FieldSpec {
        key: "key_competencies",
        label: "Key Competencies",
        icon: "fas fa-star",
        kind: FieldKind::Tags,
        value: |r| r.key_competencies.as_deref(),
    },
    FieldSpec {
        key: "key_sectors",
        label: "Key Sectors",
        icon: "fas fa-industry",
        kind: FieldKind::Tags,
        value: |r| r.key_sectors.as_deref(),
    },
    FieldSpec {
        key: "executive_summary",
        label: "Executive Summary",
        icon: "fas fa-user-tie",
        kind: FieldKind::Text,
        value: |r| r.executive_summary.as_deref(),
    },
    FieldSpec {
        key: "gender_identity",
        label: "Gender Identity",
        icon: "fas fa-user",
        kind: FieldKind::Text,
        value: |r| r.gender_identity.as_deref(),
    },
    FieldSpec {
        key: "race_ethnicity",
        label: "Race/Ethnicity",
        icon: "fas fa-users",
        kind: FieldKind::Text,
        value: |r| r.race_ethnicity.as_deref(),
    },
    FieldSpec {
        key: "lgbtqia",
        label: "LGBTQIA+",
        icon: "fas fa-heart",
        kind: FieldKind::Text,
        value: |r| r.lgbtqia.as_deref(),
    },
    FieldSpec {
        key: "source",
        label: "Source",
        icon: "fas fa-info-circle",
        kind: FieldKind::Text,
        value: |r| r.source.as_deref(),
    },
];

pub fn results_title(count: usize, keyword: &str) -> String {
    let plural = if count == 1 { "" } else { "s" };
    let keyword_text = if keyword.is_empty() {
        String::new()
    } else {
        format!(" for \"{}\"", escape_html(keyword))
    };
    format!(
        r#"<i class="fas fa-search me-2"></i><span class="results-count">Found {count} result{plural}{keyword_text}</span>"#
    )
}

pub fn no_results(keyword: &str) -> String {
    format!(
        r#"<div class="col-12"><div class="alert alert-info text-center"><i class="fas fa-info-circle me-2"></i>No results found for "{}". Try a different keyword or phrase.</div></div>"#,
        escape_html(keyword)
    )
}

pub fn render_results(results: &[SearchResult], keyword: &str) -> String {
    results
        .iter()
        .enumerate()
        .map(|(index, result)| render_card(result, keyword, index))
        .collect()
}

pub fn render_card(result: &SearchResult, keyword: &str, index: usize) -> String {
    let name = highlight_keyword(&escape_html(&result.full_name()), keyword);
    let name = match result.email.as_deref().filter(|e| !e.is_empty()) {
        Some(email) => format!(
            r#"<a href="/user/{}" target="_blank" class="person-link">{name}</a>"#,
            urlencoding::encode(email)
        ),
        None => name,
    };

    let fields: String = RESULT_FIELDS
        .iter()
        .filter_map(|spec| {
            let value = (spec.value)(result)?;
            if value.trim().is_empty() {
                return None;
            }
            Some(render_field(spec, value, keyword, index))
        })
        .collect();

    format!(
        r#"<div class="col-md-6 col-lg-4 mb-4"><div class="card result-card h-100"><div class="card-header"><h5 class="person-name mb-1">{name}</h5><small class="location text-muted"><i class="fas fa-map-marker-alt me-1"></i>{location}</small></div><div class="card-body result-fields">{fields}</div></div></div>"#,
        location = escape_html(&result.location()),
    )
}

fn render_field(spec: &FieldSpec, value: &str, keyword: &str, index: usize) -> String {
    let escaped = escape_html(value);
    let body = match spec.kind {
        FieldKind::Email => format!(
            r#"<a href="mailto:{}" target="_blank">{}</a>"#,
            escape_attr(value),
            highlight_keyword(&escaped, keyword)
        ),
        FieldKind::Link => format!(
            r#"<a href="{}" target="_blank">{}</a>"#,
            escape_attr(value),
            highlight_keyword(&escaped, keyword)
        ),
        FieldKind::Resume => format!(
            r#"<details class="resume-toggle"><summary class="btn btn-sm btn-outline-secondary"><i class="fas fa-eye me-1"></i>View Resume</summary><div id="resume-{index}" class="resume-content"><div class="resume-text">{}</div></div></details>"#,
            highlight_keyword(&format_resume_text(&escaped), keyword)
        ),
        FieldKind::Tags => {
            let tags = value
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(|t| {
                    format!(
                        r#"<span class="skill-tag">{}</span>"#,
                        highlight_keyword(&escape_html(t), keyword)
                    )
                })
                .join("");
            format!(r#"<div class="skills-tags">{tags}</div>"#)
        }
        FieldKind::Text => highlight_keyword(&escaped, keyword),
    };
    format!(
        r#"<div class="field-group" data-field="{key}"><div class="field-label"><i class="{icon} field-icon"></i>{label}</div><div class="field-value">{body}</div></div>"#,
        key = spec.key,
        icon = spec.icon,
        label = escape_html(spec.label),
    )
}

/// Header stats, one line per figure.
pub fn site_stats_lines(stats: &SiteStats) -> [String; 3] {
    [
        format!("{} Total Records", stats.total_records),
        format!("{} With LinkedIn", stats.records_with_linkedins),
        format!("{} With Resumes", stats.records_with_resumes),
    ]
}

pub fn render_site_stats(stats: &SiteStats) -> String {
    site_stats_lines(stats)
        .iter()
        .map(|line| format!(r#"<div class="stat-line">{}</div>"#, escape_html(line)))
        .join("")
}
