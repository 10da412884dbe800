use crate::models::{Tender, TenderStats};
use crate::render::{escape_html, format_date};
use crate::ui::Action;

pub fn render_tender_list(tenders: &[Tender]) -> String {
    tenders.iter().map(render_tender).collect()
}

pub fn render_tender(tender: &Tender) -> String {
    let (badge_class, badge) = if tender.processed {
        ("bg-success", "Processed")
    } else {
        ("bg-warning", "Unprocessed")
    };
    let icon = if tender.processed { "undo" } else { "check" };
    let closing = tender
        .closing_date
        .as_deref()
        .filter(|d| !d.is_empty())
        .unwrap_or("No deadline");
    let toggle = Action::ToggleTender {
        tender_id: tender.id,
        processed: !tender.processed,
    };
    let link = tender
        .link
        .as_deref()
        .filter(|l| !l.is_empty())
        .map(|l| {
            format!(
                r#"<a href="{}" target="_blank" class="btn btn-outline-primary btn-sm"><i class="fas fa-external-link-alt"></i></a>"#,
                crate::render::escape_attr(l)
            )
        })
        .unwrap_or_default();
    format!(
        r#"<div class="list-group-item list-group-item-action"><div class="d-flex w-100 justify-content-between align-items-start"><div class="flex-grow-1"><h6 class="mb-1">{title}</h6><p class="mb-1 text-muted small">{description}</p><div class="d-flex align-items-center gap-3"><small class="text-muted"><i class="fas fa-building me-1"></i>{organization}</small><small class="text-muted"><i class="fas fa-calendar me-1"></i>{closing}</small><small class="text-muted"><i class="fas fa-globe me-1"></i>{source}</small><span class="badge {badge_class}">{badge}</span></div></div><div class="ms-3"><div class="btn-group-vertical btn-group-sm"><button class="btn btn-outline-secondary btn-sm" {toggle}><i class="fas fa-{icon}"></i></button>{link}</div></div></div></div>"#,
        title = escape_html(&tender.title),
        description = escape_html(tender.description.as_deref().unwrap_or_default()),
        organization = escape_html(tender.organization.as_deref().unwrap_or_default()),
        closing = escape_html(closing),
        source = escape_html(tender.source.as_deref().unwrap_or_default()),
        toggle = toggle.to_attrs(),
    )
}

/// Date of the most recent scrape run, or `Never`.
pub fn last_scraped(stats: &TenderStats) -> String {
    stats
        .recent_activity
        .first()
        .and_then(|a| a.date.as_deref())
        .filter(|d| !d.is_empty())
        .map(format_date)
        .unwrap_or_else(|| "Never".to_string())
}
