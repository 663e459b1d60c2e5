//! Minimal HTML text extraction.
//!
//! Release pages are scraped with a handful of regexes rather than a full
//! DOM. This is enough to pull the text of the first element carrying a
//! class, the visible text of a page, and its anchor targets.

use regex::Regex;
use std::sync::LazyLock;

static SCRIPT_OR_STYLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b.*?</script\s*>|<style\b.*?</style\s*>").expect("valid regex")
});

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid regex"));

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

static ANCHOR_HREF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<a\b[^>]*?\bhref\s*=\s*["']([^"']+)["']"#).expect("valid regex")
});

/// Returns the text content of the first element whose `class` attribute
/// contains `class` as a whole token.
///
/// Nested elements of the same tag are balanced, so the text of
/// `<div class="x"><div>a</div>b</div>` is `a b`. Returns `None` if no
/// such element exists or its text is empty.
pub fn element_text(html: &str, class: &str) -> Option<String> {
    let open = Regex::new(&format!(
        r#"(?i)<([a-z][a-z0-9]*)\b[^>]*?\bclass\s*=\s*["'](?:[^"']*\s)?{}(?:\s[^"']*)?["'][^>]*>"#,
        regex::escape(class)
    ))
    .ok()?;

    let caps = open.captures(html)?;
    let opening = caps.get(0)?;
    if opening.as_str().ends_with("/>") {
        return None;
    }

    let start = opening.end();
    let end = closing_tag_offset(&html[start..], &caps[1])
        .map(|offset| start + offset)
        .unwrap_or(html.len());

    let text = visible_text(&html[start..end]);
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Offset of the tag that closes an element whose body begins at `body`.
fn closing_tag_offset(body: &str, tag: &str) -> Option<usize> {
    let tags = Regex::new(&format!(r"(?i)<(/?){}\b[^>]*>", regex::escape(tag))).ok()?;
    let mut depth = 1usize;

    for caps in tags.captures_iter(body) {
        let m = caps.get(0)?;
        if &caps[1] == "/" {
            depth -= 1;
            if depth == 0 {
                return Some(m.start());
            }
        } else if !m.as_str().ends_with("/>") {
            depth += 1;
        }
    }

    None
}

/// Strips markup and returns whitespace-collapsed visible text.
pub fn visible_text(html: &str) -> String {
    let without_code = SCRIPT_OR_STYLE.replace_all(html, " ");
    let without_tags = TAG.replace_all(&without_code, " ");
    let decoded = decode_entities(&without_tags);
    WHITESPACE.replace_all(&decoded, " ").trim().to_string()
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Every `href` of an anchor element, in document order.
pub fn links(html: &str) -> Vec<String> {
    ANCHOR_HREF
        .captures_iter(html)
        .map(|caps| decode_entities(&caps[1]))
        .collect()
}
