use itertools::Itertools;

use super::CommandOutput;
use crate::render::{escape_attr, escape_html};
use crate::ui::{ConsoleUi, Level, Notice, Region, StatSlot};

fn json_for_script_tag(value: &str) -> String {
    value.replace("</", "<\\/")
}

fn region_title(region: Region) -> Option<String> {
    let title = match region {
        Region::Stats => return None,
        Region::ResultsTitle | Region::ResultsContainer | Region::LoadingSpinner => return None,
        Region::ResultsList => "Search Results".to_string(),
        Region::FilterOptions | Region::ClearFiltersButton => return None,
        Region::RfpList => "RFP Projects".to_string(),
        Region::NoRfpsMessage => return None,
        Region::RfpDetails => "RFP Details".to_string(),
        Region::DocumentsList => "Document Management".to_string(),
        Region::AiAnalysis => "AI Analysis".to_string(),
        Region::TenderList(s) => format!("{} Tenders", s.short_name()),
        Region::NoTendersMessage(_) | Region::TenderLoading(_) => return None,
    };
    Some(title)
}

fn stat_label(slot: StatSlot) -> &'static str {
    match slot {
        StatSlot::TotalTenders => "Total Tenders",
        StatSlot::Unprocessed => "Unprocessed",
        StatSlot::LastScraped => "Last Scraped",
    }
}

fn notice_class(notice: &Notice) -> &'static str {
    match notice.level() {
        Level::Success => "alert-success",
        Level::Error => "alert-danger",
        Level::Warning => "alert-warning",
        Level::Info => "alert-info",
    }
}

/// Static snapshot of the page: every visible region in its card.
///
/// `<base href>` points at the server so relative links such as
/// `/user/<email>` still resolve when the file is opened locally.
pub fn render_html(output: &CommandOutput, ui: &ConsoleUi, base_url: &str) -> Vec<u8> {
    let json = serde_json::to_string(&output.data).unwrap_or_else(|_| "null".to_string());
    let json = json_for_script_tag(&json);

    let header_stats = ui
        .region(Region::Stats)
        .filter(|_| ui.is_visible(Region::Stats))
        .unwrap_or_default();
    let tender_stats = ui
        .stats()
        .iter()
        .map(|(slot, value)| {
            format!(
                r#"<div class="col"><div class="card text-center"><div class="card-body"><h5>{}</h5><small class="text-muted">{}</small></div></div></div>"#,
                escape_html(value),
                stat_label(*slot)
            )
        })
        .join("");
    let tender_stats = if tender_stats.is_empty() {
        String::new()
    } else {
        format!(r#"<div class="row mb-4">{tender_stats}</div>"#)
    };

    let notices = ui
        .notices()
        .iter()
        .map(|n| {
            format!(
                r#"<div class="alert {}">{}</div>"#,
                notice_class(n),
                escape_html(n.message())
            )
        })
        .join("");

    let results_title = ui
        .region(Region::ResultsTitle)
        .filter(|_| ui.is_visible(Region::ResultsContainer))
        .map(|t| format!(r#"<h4 class="mb-3">{t}</h4>"#))
        .unwrap_or_default();

    let sections = ui
        .visible_regions()
        .filter_map(|(region, html)| {
            if matches!(region, Region::ResultsList) && !ui.is_visible(Region::ResultsContainer) {
                return None;
            }
            let title = region_title(region)?;
            let body = if matches!(region, Region::ResultsList) {
                format!(r#"{results_title}<div class="row">{html}</div>"#)
            } else {
                html.to_string()
            };
            Some(format!(
                r#"<section id="{id}" class="card mb-4"><div class="card-header"><h5 class="mb-0">{title}</h5></div><div class="card-body">{body}</div></section>"#,
                id = escape_attr(&region.dom_id()),
                title = escape_html(&title),
            ))
        })
        .join("\n");

    let html = format!(
        r####"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8"/>
  <meta content="width=device-width, initial-scale=1.0" name="viewport"/>
  <base href="{base}"/>
  <title>OPFA :: {title}</title>
  <link href="https://cdn.jsdelivr.net/npm/bootstrap@5.3.0/dist/css/bootstrap.min.css" rel="stylesheet"/>
  <link href="https://cdnjs.cloudflare.com/ajax/libs/font-awesome/6.4.0/css/all.min.css" rel="stylesheet"/>
  <style>
    .highlight {{ background: #fff3a3; }}
    .highlight-2 {{ background: #c8f7c5; }}
    .highlight-3 {{ background: #c5e3f7; }}
    .highlight-4 {{ background: #f7d2c5; }}
    .skill-tag {{ display: inline-block; background: #eef2f7; border-radius: 0.75rem; padding: 0 0.5rem; margin: 0 0.25rem 0.25rem 0; font-size: 0.85em; }}
    .field-label {{ font-weight: 600; font-size: 0.85em; color: #555; }}
    .field-group {{ margin-bottom: 0.5rem; }}
    .resume-text {{ white-space: normal; max-height: 24rem; overflow: auto; }}
    .stat-line {{ display: inline-block; margin-right: 1.5rem; }}
  </style>
</head>
<body class="bg-light">
  <script type="application/json" id="opfa-data">{json}</script>
  <nav class="navbar navbar-dark bg-primary mb-4">
    <div class="container"><span class="navbar-brand">OPFA Community Directory</span><span class="text-white small">{stats}</span></div>
  </nav>
  <main class="container">
    {notices}
    {tender_stats}
    {sections}
  </main>
</body>
</html>
"####,
        base = escape_attr(base_url.trim_end_matches('/')),
        title = escape_html(&output.title),
        stats = header_stats,
    );
    html.into_bytes()
}
