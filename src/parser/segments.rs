//! Body extraction and `[tag] … [tag]` region splitting.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::Diagnostics;
use crate::error::Warning;

static BODY_OPEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<body\b[^>]*>").unwrap());
static BODY_CLOSE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)</body\s*>").unwrap());
static DELIMITER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\[\s*[+.*#-]?\s*(paragraphs|intro|credits)\s*\]").unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionTag {
    Paragraphs,
    Intro,
    Credits,
}

impl RegionTag {
    fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "paragraphs" => Some(RegionTag::Paragraphs),
            "intro" => Some(RegionTag::Intro),
            "credits" => Some(RegionTag::Credits),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RegionTag::Paragraphs => "paragraphs",
            RegionTag::Intro => "intro",
            RegionTag::Credits => "credits",
        }
    }
}

/// A slice of the body, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Text outside any region: leading metadata and header blocks.
    Loose(&'a str),
    Region { tag: RegionTag, text: &'a str },
}

/// Inner content of `<body>`, or the whole text when there is none.
pub fn body<'a>(text: &'a str, diag: &mut Diagnostics) -> &'a str {
    let Some(open) = BODY_OPEN_RE.find(text) else {
        diag.warn(Warning::MissingBody);
        return text;
    };
    let rest = &text[open.end()..];
    match BODY_CLOSE_RE.find(rest) {
        Some(close) => &rest[..close.start()],
        None => rest,
    }
}

/// Split `body` into loose text and delimited regions. A region closes at the
/// next delimiter with the same tag; without one it runs to the end.
pub fn split<'a>(body: &'a str, diag: &mut Diagnostics) -> Vec<Segment<'a>> {
    let mut segments = Vec::new();
    let mut pos = 0;

    while let Some((open, tag)) = next_delimiter(body, pos, None) {
        push_loose(&mut segments, &body[pos..open.start]);

        let region_start = open.end;
        match next_delimiter(body, region_start, Some(tag)) {
            Some((close, _)) => {
                segments.push(Segment::Region { tag, text: &body[region_start..close.start] });
                pos = close.end;
            }
            None => {
                diag.warn(Warning::UnterminatedRegion { tag: tag.as_str().to_string() });
                segments.push(Segment::Region { tag, text: &body[region_start..] });
                pos = body.len();
            }
        }
        debug!(tag = tag.as_str(), "region matched");
    }
    push_loose(&mut segments, &body[pos..]);

    segments
}

fn next_delimiter(
    body: &str,
    from: usize,
    want: Option<RegionTag>,
) -> Option<(std::ops::Range<usize>, RegionTag)> {
    DELIMITER_RE.captures_iter(&body[from..]).find_map(|caps| {
        let tag = RegionTag::parse(&caps[1])?;
        let whole = caps.get(0)?;
        (want.is_none() || want == Some(tag)).then(|| (from + whole.start()..from + whole.end(), tag))
    })
}

fn push_loose<'a>(segments: &mut Vec<Segment<'a>>, text: &'a str) {
    if !text.trim().is_empty() {
        segments.push(Segment::Loose(text));
    }
}
