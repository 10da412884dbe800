use std::sync::OnceLock;

use regex::{Captures, Regex};

/// Escapes text for element content (`&`, `<`, `>`).
pub fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escapes text for a double- or single-quoted attribute value.
pub fn escape_attr(value: &str) -> String {
    escape_html(value)
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn highlight_class(index: usize) -> String {
    if index == 0 {
        "highlight".to_string()
    } else {
        format!("highlight-{}", index + 1)
    }
}

/// Wraps every case-insensitive occurrence of each comma-separated keyword in
/// a highlight span.
///
/// `text` is HTML-escaped already, so each keyword is escaped the same way
/// before matching, and matches falling inside an entity such as `&amp;` are
/// left alone.
///
/// Keywords are applied one after another to the already-rewritten string, so
/// a later keyword can match inside markup produced for an earlier one.
pub fn highlight_keyword(text: &str, keywords: &str) -> String {
    let mut out = text.to_string();
    let keywords = keywords
        .split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty());

    for (index, keyword) in keywords.enumerate() {
        // keyword first: at the same offset it wins over a bare entity
        let pattern = format!(
            "(?i)({})|(&#?[A-Za-z0-9]+;)",
            regex::escape(&escape_html(keyword))
        );
        let Ok(re) = Regex::new(&pattern) else {
            continue;
        };
        let class = highlight_class(index);
        out = re
            .replace_all(&out, |caps: &Captures| match caps.get(1) {
                Some(m) => format!(r#"<span class="{class}">{}</span>"#, m.as_str()),
                None => caps[0].to_string(),
            })
            .into_owned();
    }
    out
}

struct Rule {
    re: Regex,
    replacement: &'static str,
}

fn resume_rules() -> &'static [Rule] {
    static RULES: OnceLock<Vec<Rule>> = OnceLock::new();
    RULES.get_or_init(|| {
        [
            (r"\n", "<br>"),
            (r"  ", "&nbsp;&nbsp;"),
            (r"\*\*(.*?)\*\*", "<strong>${1}</strong>"),
            (
                r"(?m)^([A-Z\s]{3,}):?$",
                r#"<h6 class="resume-section">${1}</h6>"#,
            ),
            (
                r"(?m)^[\s]*•[\s]*(.*)$",
                r#"<div class="resume-bullet">• ${1}</div>"#,
            ),
            (
                r"(?m)^[\s]*[-*][\s]*(.*)$",
                r#"<div class="resume-bullet">• ${1}</div>"#,
            ),
            (
                r"(?m)^[\s]*(\d+\.)[\s]*(.*)$",
                r#"<div class="resume-numbered">${1} ${2}</div>"#,
            ),
            (
                r"([A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,})",
                r#"<span class="resume-email">${1}</span>"#,
            ),
            (
                r"(\d{3}[-.\s]?\d{3}[-.\s]?\d{4})",
                r#"<span class="resume-phone">${1}</span>"#,
            ),
            (
                r"(linkedin\.com/in/[^\s]+)",
                r#"<a href="https://${1}" target="_blank" class="resume-link">${1}</a>"#,
            ),
            (
                r"(https?://[^\s]+)",
                r#"<a href="${1}" target="_blank" class="resume-link">${1}</a>"#,
            ),
            (r"\*(.*?)\*", "<em>${1}</em>"),
        ]
        .into_iter()
        .filter_map(|(pattern, replacement)| {
            Regex::new(pattern).ok().map(|re| Rule { re, replacement })
        })
        .collect()
    })
}

/// Turns plain resume text into lightly structured HTML: line breaks,
/// emphasis, section headings, bullets, numbered items, contact details and
/// links.
///
/// Rules run in a fixed order over the output of the previous rule. Line
/// anchors therefore see the whole text as a single line once newlines have
/// become `<br>`. The input is expected to be HTML-escaped already.
pub fn format_resume_text(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    resume_rules().iter().fold(text.to_string(), |acc, rule| {
        rule.re.replace_all(&acc, rule.replacement).into_owned()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_html_matches_text_content_escaping() {
        assert_eq!(escape_html("<b>R&D</b> \"q\""), "&lt;b&gt;R&amp;D&lt;/b&gt; \"q\"");
        assert_eq!(escape_attr("O'Neil \"x\""), "O&#39;Neil &quot;x&quot;");
    }

    #[test]
    fn highlight_wraps_case_insensitive_matches() {
        assert_eq!(
            highlight_keyword("Water and wastewater", "water"),
            r#"<span class="highlight">Water</span> and waste<span class="highlight">water</span>"#
        );
    }

    #[test]
    fn highlight_uses_numbered_classes_per_keyword() {
        let out = highlight_keyword("solar wind", "solar, wind");
        assert_eq!(
            out,
            r#"<span class="highlight">solar</span> <span class="highlight-2">wind</span>"#
        );
    }

    #[test]
    fn highlight_without_match_or_keyword_is_identity() {
        assert_eq!(highlight_keyword("energy policy", "water"), "energy policy");
        assert_eq!(highlight_keyword("energy policy", ""), "energy policy");
        assert_eq!(highlight_keyword("energy policy", " , ,"), "energy policy");
    }

    #[test]
    fn highlight_escapes_regex_metacharacters() {
        assert_eq!(
            highlight_keyword("C++ and C", "c++"),
            r#"<span class="highlight">C++</span> and C"#
        );
    }

    #[test]
    fn highlight_matches_keywords_with_markup_characters() {
        assert_eq!(
            highlight_keyword(&escape_html("Head of R&D"), "r&d"),
            r#"Head of <span class="highlight">R&amp;D</span>"#
        );
        assert_eq!(
            highlight_keyword(&escape_html("a <b> tag"), "<b>"),
            r#"a <span class="highlight">&lt;b&gt;</span> tag"#
        );
    }

    #[test]
    fn highlight_never_splits_an_entity() {
        let escaped = escape_html("Head of R&D");
        assert_eq!(highlight_keyword(&escaped, "amp"), escaped);
        assert_eq!(highlight_keyword("1&nbsp;&nbsp;2 &lt;3", "nbsp, lt"), "1&nbsp;&nbsp;2 &lt;3");
        assert_eq!(
            highlight_keyword("camp &amp; ramp", "amp"),
            r#"c<span class="highlight">amp</span> &amp; r<span class="highlight">amp</span>"#
        );
    }

    #[test]
    fn highlight_applies_later_keywords_to_rewritten_text() {
        let out = highlight_keyword("high", "high, class");
        assert!(out.contains(r#"<span <span class="highlight-2">class</span>="#));
    }

    #[test]
    fn resume_empty_is_empty() {
        assert_eq!(format_resume_text(""), "");
    }

    #[test]
    fn resume_breaks_lines_and_bolds() {
        assert_eq!(
            format_resume_text("**Lead** engineer\nKenya"),
            "<strong>Lead</strong> engineer<br>Kenya"
        );
    }

    #[test]
    fn resume_uppercase_text_becomes_heading() {
        assert_eq!(
            format_resume_text("EXPERIENCE:"),
            r#"<h6 class="resume-section">EXPERIENCE</h6>"#
        );
    }

    #[test]
    fn resume_bullets_and_numbers_on_single_line() {
        assert_eq!(
            format_resume_text("• Managed budgets"),
            r#"<div class="resume-bullet">• Managed budgets</div>"#
        );
        assert_eq!(
            format_resume_text("- Managed budgets"),
            r#"<div class="resume-bullet">• Managed budgets</div>"#
        );
        assert_eq!(
            format_resume_text("1. Managed budgets"),
            r#"<div class="resume-numbered">1. Managed budgets</div>"#
        );
    }

    #[test]
    fn resume_marks_contact_details() {
        let out = format_resume_text("Reach ada@example.org or 555-123-4567");
        assert!(out.contains(r#"<span class="resume-email">ada@example.org</span>"#));
        assert!(out.contains(r#"<span class="resume-phone">555-123-4567</span>"#));
    }

    #[test]
    fn resume_links_urls_and_emphasis() {
        assert_eq!(
            format_resume_text("see https://opfa.org now"),
            r#"see <a href="https://opfa.org" target="_blank" class="resume-link">https://opfa.org</a> now"#
        );
        assert_eq!(
            format_resume_text("Speaks *fluent* French"),
            "Speaks <em>fluent</em> French"
        );
        // a leading asterisk reads as a list marker first
        assert_eq!(
            format_resume_text("*fluent* French"),
            r#"<div class="resume-bullet">• fluent* French</div>"#
        );
    }

    #[test]
    fn resume_formatting_is_idempotent_on_plain_prose() {
        for text in [
            "Experienced engineer working on water projects",
            "SUMMARY\nLed teams across three regions  since 2015",
            "Policy advisor\nGrid planning",
        ] {
            let once = format_resume_text(text);
            assert_eq!(format_resume_text(&once), once, "input: {text:?}");
        }
    }
}
