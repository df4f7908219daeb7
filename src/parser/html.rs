//! Tag handling for captured field values.
//!
//! Plain fields lose all markup. Rich-text fields keep a small inline
//! vocabulary (`b`, `i`, `a`, ...) and turn block boundaries into `<br>`.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use url::Url;

use super::entities;

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(/?)([A-Za-z][A-Za-z0-9]*)\b([^>]*)>").unwrap());
static ANY_TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());
static DANGLING_TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*$").unwrap());
static SPAN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<span\b([^>]*)>(.*?)</span\s*>").unwrap());
static BOLD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)font-weight\s*:\s*(bold|[6-9]00)").unwrap());
static ITALIC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)font-style\s*:\s*italic").unwrap());
static HREF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)href\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap());
static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static BR_WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*<br>\s*").unwrap());
static BR_RUN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?:<br>){3,}").unwrap());

const BLOCK_TAGS: &[&str] = &[
    "p", "div", "li", "ul", "ol", "h1", "h2", "h3", "h4", "h5", "h6", "blockquote", "table", "tr",
    "td", "th", "tbody", "thead", "hr",
];
const INLINE_TAGS: &[&str] = &["b", "strong", "i", "em", "u", "s", "sup", "sub"];

/// Remove every tag, decode entities and collapse whitespace.
pub fn strip_tags(input: &str) -> String {
    let spaced = TAG_RE.replace_all(input, |caps: &Captures| {
        let name = caps[2].to_ascii_lowercase();
        if name == "br" || BLOCK_TAGS.contains(&name.as_str()) {
            " "
        } else {
            ""
        }
    });
    let bare = ANY_TAG_RE.replace_all(&spaced, "");
    let bare = DANGLING_TAG_RE.replace(&bare, "");
    collapse_whitespace(&entities::decode(&bare))
}

/// Block-level normalization for rich-text values: styled spans become
/// `<b>`/`<i>`, attributes are dropped (except `href`), block boundaries
/// become `<br>`, everything outside the inline vocabulary is removed.
pub fn normalize_rich_text(input: &str) -> String {
    // Exports emit flat spans, one per style run.
    let text = SPAN_RE.replace_all(input, |caps: &Captures| styled_span(&caps[1], &caps[2]));

    let text = TAG_RE.replace_all(&text, |caps: &Captures| {
        let closing = !caps[1].is_empty();
        let name = caps[2].to_ascii_lowercase();
        match name.as_str() {
            "br" => "<br>".to_string(),
            "a" if closing => "</a>".to_string(),
            "a" => match HREF_RE.captures(&caps[3]) {
                Some(h) => {
                    let raw = h.get(1).or_else(|| h.get(2)).map_or("", |m| m.as_str());
                    format!("<a href=\"{}\">", unwrap_redirect(&entities::decode(raw)))
                }
                None => String::new(),
            },
            n if BLOCK_TAGS.contains(&n) => {
                if closing || n == "hr" {
                    "<br>".to_string()
                } else {
                    String::new()
                }
            }
            n if INLINE_TAGS.contains(&n) => {
                format!("<{}{}>", if closing { "/" } else { "" }, n)
            }
            _ => String::new(),
        }
    });
    let text = DANGLING_TAG_RE.replace(&text, "");

    let mut text = collapse_whitespace(&entities::decode(&text));
    text = BR_WS_RE.replace_all(&text, "<br>").into_owned();
    text = BR_RUN_RE.replace_all(&text, "<br><br>").into_owned();
    text = drop_empty_inline(text);
    trim_breaks(&text).to_string()
}

fn styled_span(attrs: &str, inner: &str) -> String {
    let mut out = inner.to_string();
    if ITALIC_RE.is_match(attrs) && !inner.trim().is_empty() {
        out = format!("<i>{}</i>", out);
    }
    if BOLD_RE.is_match(attrs) && !inner.trim().is_empty() {
        out = format!("<b>{}</b>", out);
    }
    out
}

/// `https://www.google.com/url?q=<target>&sa=...` → `<target>`.
fn unwrap_redirect(href: &str) -> String {
    let Ok(url) = Url::parse(href) else {
        return href.to_string();
    };
    let is_redirect = url
        .host_str()
        .is_some_and(|h| h == "google.com" || h.ends_with(".google.com"))
        && url.path() == "/url";
    if !is_redirect {
        return href.to_string();
    }
    url.query_pairs()
        .find(|(k, _)| k == "q")
        .map(|(_, v)| v.into_owned())
        .unwrap_or_else(|| href.to_string())
}

fn drop_empty_inline(mut text: String) -> String {
    loop {
        let before = text.len();
        for tag in INLINE_TAGS {
            text = text.replace(&format!("<{tag}></{tag}>"), "");
        }
        text = text.replace("<a href=\"\"></a>", "");
        if text.len() == before {
            return text;
        }
    }
}

fn trim_breaks(mut text: &str) -> &str {
    loop {
        let trimmed = text
            .trim()
            .trim_start_matches("<br>")
            .trim_end_matches("<br>")
            .trim();
        if trimmed.len() == text.len() {
            return trimmed;
        }
        text = trimmed;
    }
}

pub fn collapse_whitespace(s: &str) -> String {
    WS_RE.replace_all(s, " ").trim().to_string()
}
