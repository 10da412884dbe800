use chrono::{DateTime, Utc};
use itertools::Itertools;

use crate::models::{AiAnalysis, Document, MemberMatching, RfpRecord};
use crate::render::{escape_attr, escape_html, format_date, is_overdue, parse_date};
use crate::ui::Action;

pub const EMPTY_DETAILS: &str = "Choose an RFP from the list to view details and upload documents";

fn text(value: &Option<String>) -> String {
    escape_html(value.as_deref().unwrap_or_default())
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

pub fn empty_details() -> String {
    format!(r#"<div class="text-center text-muted"><p>{EMPTY_DETAILS}</p></div>"#)
}

pub fn render_rfp_list(rfps: &[RfpRecord], selected: Option<i64>, now: DateTime<Utc>) -> String {
    rfps.iter()
        .map(|rfp| render_rfp_item(rfp, selected == Some(rfp.id), now))
        .collect()
}

pub fn render_rfp_item(rfp: &RfpRecord, active: bool, now: DateTime<Utc>) -> String {
    let due = match present(&rfp.due_date) {
        Some(d) => format_date(d),
        None => "No due date".to_string(),
    };
    let overdue = if is_overdue(rfp.due_date.as_deref(), now) {
        r#"<br><span class="badge bg-danger">Overdue</span>"#
    } else {
        ""
    };
    let class = if active {
        "list-group-item list-group-item-action active"
    } else {
        "list-group-item list-group-item-action"
    };
    let delete = Action::DeleteRfp {
        rfp_id: rfp.id,
        name: rfp.name().to_string(),
    };
    format!(
        r#"<div class="{class}" {select}><div class="d-flex justify-content-between align-items-start"><div class="flex-grow-1"><h6 class="mb-1">{name}</h6><small class="text-muted">{org}</small><br><small class="text-muted"><i class="fas fa-map-marker-alt me-1"></i>{country} • {region}</small></div><div class="text-end"><small class="text-muted">{due}</small>{overdue}<br><button class="btn btn-outline-danger btn-sm mt-1" {delete} title="Delete RFP"><i class="fas fa-trash"></i></button></div></div></div>"#,
        select = Action::SelectRfp { rfp_id: rfp.id }.to_attrs(),
        name = text(&rfp.project_name),
        org = text(&rfp.organization_group),
        country = text(&rfp.country),
        region = text(&rfp.region),
        due = escape_html(&due),
        delete = delete.to_attrs(),
    )
}

fn cell(value: Option<String>) -> String {
    match value {
        Some(v) => format!(r#"<td><span class="text-muted mono">{v}</span></td>"#),
        None => "<td></td>".to_string(),
    }
}

fn table(headers: &[&str], cells: Vec<String>) -> String {
    let head = headers
        .iter()
        .map(|h| format!("<th>{}</th>", escape_html(h)))
        .join("");
    format!(
        r#"<table class="table rfp-metadata"><thead><tr>{head}</tr></thead><tbody><tr>{}</tr></tbody></table>"#,
        cells.join("")
    )
}

/// Header and the two metadata tables of the selected RFP.
pub fn render_details(rfp: &RfpRecord, now: DateTime<Utc>) -> String {
    let overdue = is_overdue(rfp.due_date.as_deref(), now);
    let escaped = |v: &Option<String>| present(v).map(escape_html);

    let due_cell = match present(&rfp.due_date) {
        Some(d) => {
            let class = if overdue { "text-danger" } else { "text-muted" };
            let badge = if overdue {
                r#" <span class="badge bg-danger">Overdue</span>"#
            } else {
                ""
            };
            format!(
                r#"<td><span class="{class} mono">{}</span>{badge}</td>"#,
                escape_html(&format_date(d))
            )
        }
        None => "<td></td>".to_string(),
    };

    let mut first = vec![
        cell(escaped(&rfp.organization_group)),
        cell(escaped(&rfp.country)),
        cell(escaped(&rfp.region)),
        cell(escaped(&rfp.industry)),
        cell(escaped(&rfp.project_focus)),
        cell(escaped(&rfp.opf_gap_size)),
        cell(escaped(&rfp.opf_gaps)),
    ];
    first.push(due_cell);

    let cost = present(&rfp.project_cost).map(|cost| {
        let currency = rfp.currency.as_deref().unwrap_or_default();
        escape_html(&format!("{currency} {cost}"))
    });
    let link = match present(&rfp.link) {
        Some(l) => format!(
            r#"<td><a href="{}" target="_blank" class="text-primary mono">{}</a></td>"#,
            escape_attr(l),
            escape_html(l)
        ),
        None => "<td></td>".to_string(),
    };
    let second = vec![
        cell(cost),
        cell(escaped(&rfp.posting_contact)),
        cell(escaped(&rfp.deliverables)),
        cell(escaped(&rfp.potential_experts)),
        cell(escaped(&rfp.specific_staffing_needs)),
        link,
        cell(present(&rfp.created_at).map(|d| escape_html(&format_date(d)))),
    ];

    format!(
        r#"<div class="row mb-3"><div class="col-12"><div class="d-flex justify-content-between align-items-center"><h4 class="mb-0">{name}</h4><div><button class="btn btn-primary btn-sm me-2" {upload} title="Upload Document"><i class="fas fa-upload"></i></button><button class="btn btn-outline-secondary btn-sm" {edit} title="Edit RFP"><i class="fas fa-edit"></i></button></div></div></div></div><div class="row mb-4"><div class="col-12"><div class="card"><div class="card-body"><div class="table-responsive">{t1}{t2}</div></div></div></div></div>"#,
        name = text(&rfp.project_name),
        upload = Action::UploadDocument { rfp_id: rfp.id }.to_attrs(),
        edit = Action::EditRfp { rfp_id: rfp.id }.to_attrs(),
        t1 = table(
            &[
                "Org. / Group",
                "Country",
                "Region",
                "Industry",
                "Project Focus",
                "OPF Gap Size",
                "OPF Gaps",
                "Due Date",
            ],
            first
        ),
        t2 = table(
            &[
                "Project Cost",
                "Posting Contact",
                "Deliverables",
                "Potential Experts",
                "Specific Staffing Needs",
                "Link",
                "Uploaded At",
            ],
            second
        ),
    )
}

pub fn documents_loading() -> String {
    r#"<div class="text-center text-muted"><i class="fas fa-spinner fa-spin"></i><p class="mt-2">Loading documents...</p></div>"#.to_string()
}

pub fn render_documents(documents: &[Document]) -> String {
    if documents.is_empty() {
        return r#"<div class="text-center text-muted"><i class="fas fa-file-alt fa-2x mb-3"></i><p>No documents uploaded yet</p><small>Upload documents to see them here</small></div>"#.to_string();
    }
    documents.iter().map(render_document).collect()
}

fn render_document(doc: &Document) -> String {
    let uploaded = match present(&doc.created_at) {
        Some(d) => format_date(d),
        None => "Unknown date".to_string(),
    };
    let delete = Action::DeleteDocument {
        document_id: doc.id,
        name: doc.document_name.clone(),
    };
    format!(
        r#"<div class="card mb-3"><div class="card-body"><div class="d-flex justify-content-between align-items-start"><div class="flex-grow-1"><div class="d-flex align-items-center mb-2"><span class="badge bg-secondary me-2">{ext}</span><h6 class="mb-0">{name}</h6></div><small class="text-muted"><i class="fas fa-calendar me-1"></i>Uploaded {uploaded}</small><div class="mt-2"><small class="text-muted"><i class="fas fa-file-text me-1"></i>Text preview:</small><p class="mt-1 mb-0 mono document-preview">{preview}</p></div></div><div class="ms-3"><button class="btn btn-outline-danger btn-sm" {delete} title="Delete Document"><i class="fas fa-trash"></i></button></div></div></div></div>"#,
        ext = escape_html(&doc.extension_label()),
        name = escape_html(&doc.document_name),
        uploaded = escape_html(&uploaded),
        preview = text(&doc.text_preview),
        delete = delete.to_attrs(),
    )
}

fn generate_button(label: &str) -> String {
    format!(
        r#"<button class="btn btn-primary" {}><i class="fas fa-robot me-2"></i>{label}</button>"#,
        Action::GenerateAnalysis.to_attrs()
    )
}

/// Panel content when there is no analysis yet.
pub fn ai_default_actions() -> String {
    format!(
        r#"<div class="text-center">{}<div class="mt-2"><button class="btn btn-outline-secondary btn-sm" {}><i class="fas fa-database me-2"></i>Initialize Knowledge Base</button></div></div>"#,
        generate_button("Generate AI Analysis"),
        Action::InitKnowledgeBase.to_attrs()
    )
}

/// Panel content after a failed analysis run.
pub fn ai_generate_only() -> String {
    format!(
        r#"<div class="text-center">{}</div>"#,
        generate_button("Generate AI Analysis")
    )
}

pub fn ai_spinner(message: &str, detail: &str) -> String {
    format!(
        r#"<div class="text-center"><div class="spinner-border text-primary" role="status"><span class="visually-hidden">Loading...</span></div><p class="mt-3">{}</p><small class="text-muted">{}</small></div>"#,
        escape_html(message),
        escape_html(detail)
    )
}

/// Initial analysis panel for a freshly selected RFP.
pub fn ai_panel_for(rfp: &RfpRecord) -> String {
    if rfp.has_analysis() {
        render_existing_analysis(rfp)
    } else {
        ai_default_actions()
    }
}

const SECTIONS: [(&str, &str, &str); 7] = [
    ("Fit Assessment", "fas fa-chart-line", "bg-primary text-white"),
    ("Competitive Position", "fas fa-users", "bg-info text-white"),
    ("Key Strengths", "fas fa-star", "bg-success text-white"),
    (
        "Gaps & Challenges",
        "fas fa-exclamation-triangle",
        "bg-warning text-dark",
    ),
    (
        "Resource Requirements",
        "fas fa-tools",
        "bg-secondary text-white",
    ),
    ("Risk Assessment", "fas fa-shield-alt", "bg-danger text-white"),
    ("Recommendations", "fas fa-lightbulb", "bg-light text-dark"),
];

fn analysis_cards(analysis: &AiAnalysis) -> String {
    let values = [
        &analysis.fit_assessment,
        &analysis.competitive_position,
        &analysis.key_strengths,
        &analysis.gaps_challenges,
        &analysis.resource_requirements,
        &analysis.risk_assessment,
        &analysis.recommendations,
    ];
    SECTIONS
        .iter()
        .zip(values)
        .enumerate()
        .map(|(i, ((title, icon, header), value))| {
            let body = present(value)
                .map(escape_html)
                .unwrap_or_else(|| "N/A".to_string());
            let width = if i == SECTIONS.len() - 1 {
                "col-12"
            } else {
                "col-md-6"
            };
            format!(
                r#"<div class="{width}"><div class="card mb-3"><div class="card-header {header}"><h6 class="mb-0"><i class="{icon} me-2"></i>{}</h6></div><div class="card-body"><p class="mb-0">{body}</p></div></div></div>"#,
                escape_html(title)
            )
        })
        .join("")
}

/// Two decimals at most, without trailing zeros.
fn format_score(score: f64) -> String {
    let rounded = (score * 100.0).round() / 100.0;
    format!("{rounded}")
}

pub fn render_member_matching(matching: &MemberMatching) -> String {
    if !matching.success {
        let reason = matching
            .error
            .as_deref()
            .unwrap_or("Failed to find relevant team members");
        return format!(
            r#"<div class="row mt-4"><div class="col-12"><div class="alert alert-warning"><i class="fas fa-exclamation-triangle me-2"></i><strong>Member Matching Issue:</strong> {}</div></div></div>"#,
            escape_html(reason)
        );
    }

    let keywords = if matching.keywords.is_empty() {
        String::new()
    } else {
        let badges = matching
            .keywords
            .iter()
            .map(|k| {
                format!(
                    r#"<span class="badge bg-primary me-2 mb-2">{}</span>"#,
                    escape_html(k)
                )
            })
            .join("");
        format!(
            r#"<div class="mb-3"><strong>Expertise Keywords Identified:</strong><div class="mt-2">{badges}</div></div>"#
        )
    };

    let members = if matching.members.is_empty() {
        let message = matching.message.as_deref().unwrap_or(
            "No relevant team members found for the identified expertise requirements.",
        );
        format!(
            r#"<div class="alert alert-info"><i class="fas fa-info-circle me-2"></i>{}</div>"#,
            escape_html(message)
        )
    } else {
        let rows = matching
            .members
            .iter()
            .map(|m| {
                let score = m.score();
                let id = m
                    .member_id
                    .as_deref()
                    .filter(|id| !id.is_empty())
                    .map(|id| format!(r#"<br><small class="text-muted">ID: {}</small>"#, escape_html(id)))
                    .unwrap_or_default();
                let skills = m
                    .key_skills
                    .iter()
                    .map(|s| format!(r#"<span class="badge bg-info me-1 mb-1">{}</span>"#, escape_html(s)))
                    .join("");
                format!(
                    r#"<tr><td><strong>{name}</strong>{id}</td><td><div class="d-flex align-items-center"><div class="progress me-2"><div class="progress-bar bg-success" style="width: {width}%"></div></div><span class="badge bg-secondary">{score}/10</span></div></td><td>{skills}</td><td><small>{explanation}</small></td></tr>"#,
                    name = escape_html(m.name.as_deref().filter(|n| !n.is_empty()).unwrap_or("N/A")),
                    width = format_score(score * 10.0),
                    score = format_score(score),
                    explanation = escape_html(
                        m.explanation
                            .as_deref()
                            .filter(|e| !e.is_empty())
                            .unwrap_or("Member matched by keyword search")
                    ),
                )
            })
            .join("");
        format!(
            r#"<div class="table-responsive"><table class="table table-striped"><thead><tr><th>Name</th><th>Relevance Score</th><th>Key Skills</th><th>Explanation</th></tr></thead><tbody>{rows}</tbody></table></div>"#
        )
    };

    format!(
        r#"<div class="row mt-4"><div class="col-12"><div class="card"><div class="card-header bg-dark text-white"><h6 class="mb-0"><i class="fas fa-user-friends me-2"></i>Recommended Team Members</h6></div><div class="card-body">{keywords}{members}</div></div></div></div>"#
    )
}

/// Result of a fresh analysis run, optionally with matched members.
pub fn render_analysis(analysis: &AiAnalysis, matching: Option<&MemberMatching>) -> String {
    format!(
        r#"<div class="ai-analysis-results"><div class="row">{cards}</div>{members}<div class="text-center mt-3"><button class="btn btn-outline-primary" {rerun}><i class="fas fa-refresh me-2"></i>Re-run Analysis</button></div></div>"#,
        cards = analysis_cards(analysis),
        members = matching.map(render_member_matching).unwrap_or_default(),
        rerun = Action::GenerateAnalysis.to_attrs(),
    )
}

/// Analysis persisted on the record, with the member search entry point.
pub fn render_existing_analysis(rfp: &RfpRecord) -> String {
    let analyzed = match present(&rfp.ai_analysis_date) {
        Some(d) if parse_date(d).is_some() => format_date(d),
        _ => "Unknown".to_string(),
    };
    format!(
        r#"<div class="ai-analysis-results"><div class="d-flex justify-content-between align-items-center mb-3"><small class="text-muted">Last analyzed: {analyzed}</small><div><button class="btn btn-outline-success btn-sm me-2" {find}><i class="fas fa-user-friends me-2"></i>Find Team Members</button><button class="btn btn-outline-primary btn-sm" {rerun}><i class="fas fa-refresh me-2"></i>Re-run Analysis</button></div></div><div class="row">{cards}</div></div>"#,
        analyzed = escape_html(&analyzed),
        find = Action::FindMembers.to_attrs(),
        rerun = Action::GenerateAnalysis.to_attrs(),
        cards = analysis_cards(&AiAnalysis::from_record(rfp)),
    )
}
