//! Shared text cleanup for scraped content
//!
//! Remote sources deliver summaries and biographies with HTML markup and
//! entities. These helpers turn them into plain text.

use once_cell::sync::Lazy;
use regex::Regex;

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());
static SPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]+").unwrap());

/// Decode the handful of entities remote sources actually emit
pub fn html_unescape(text: &str) -> String {
    text.replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

/// Remove HTML tags and decode entities.
///
/// Paragraph and line breaks become newlines so multi-paragraph
/// biographies keep their structure.
pub fn strip_html(html: &str) -> String {
    let text = html
        .replace("</p>", "\n")
        .replace("<br>", "\n")
        .replace("<br/>", "\n")
        .replace("<br />", "\n");
    let text = TAG_RE.replace_all(&text, "");
    let text = html_unescape(&text);

    text.lines()
        .map(|line| SPACE_RE.replace_all(line.trim(), " ").into_owned())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// `strip_html` for optional content; empty results become `None`
pub fn clean_optional(html: Option<&str>) -> Option<String> {
    html.map(strip_html).filter(|s| !s.is_empty())
}
