use chrono::{DateTime, Utc};
use tracing::debug;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use super::fields::LABELS;
use super::{html, scanner, Diagnostics};
use crate::error::Warning;
use crate::model::Block;

const MAX_SLUG_LEN: usize = 50;

/// Title fallback chain: header block `title`, then its `text`, then a bare
/// `title:` in loose content ahead of any block.
pub fn resolve(header: Option<&Block>, loose: &[&str], diag: &mut Diagnostics) -> Option<String> {
    let from_header = header.and_then(|h| {
        h.header()
            .and_then(|fields| fields.title.clone())
            .or_else(|| h.text().map(html::strip_tags))
    });
    let title = from_header
        .or_else(|| loose.iter().find_map(|text| legacy_title(text)))
        .filter(|t| !t.is_empty());

    match &title {
        Some(t) => debug!(title = %t, "title resolved"),
        None => diag.warn(Warning::MissingTitle),
    }
    title
}

fn legacy_title(text: &str) -> Option<String> {
    scanner::scan(text, &LABELS)
        .iter()
        .take_while(|l| l.name != "type")
        .find(|l| l.name == "title")
        .map(|l| html::strip_tags(l.value(text)))
        .filter(|t| !t.is_empty())
}

/// `"Eleições 2024: O Que Mudou?"` → `"eleicoes-2024-o-que-mudou"`.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.nfd().flat_map(char::to_lowercase).filter(|c| !is_combining_mark(*c)) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            slug.push(c);
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.truncate(MAX_SLUG_LEN);
    slug.trim_matches('-').to_string()
}

/// Slug for the document; falls back to a timestamp when the title yields none.
pub fn slug_for(title: Option<&str>) -> String {
    match title.map(slugify).filter(|s| !s.is_empty()) {
        Some(slug) => slug,
        None => fallback_slug(Utc::now()),
    }
}

pub fn fallback_slug(now: DateTime<Utc>) -> String {
    format!("story-{}", now.format("%Y%m%d%H%M%S"))
}

/// Title used by callers when the export carries none.
pub fn synthetic_title(now: DateTime<Utc>) -> String {
    format!("Story {}", now.format("%Y-%m-%d %H:%M:%S"))
}
