//! Final reordering: header and intro blocks are promoted out of the block
//! sequence, credits attach at the top level.

use serde_json::{Map, Value};

use super::fields::LABELS;
use super::segments::{RegionTag, Segment};
use super::{html, records, scanner, title, Diagnostics, ParseOptions};
use crate::model::{Block, Credits, Document, Intro};

/// Keys the document owns; a header field with one of these names is dropped
/// from `meta` rather than shadowing it.
const RESERVED: &[&str] = &["type", "title", "slug", "intro", "credits", "paragraphs"];

pub fn assemble(segments: &[Segment<'_>], options: &ParseOptions, diag: &mut Diagnostics) -> Document {
    let mut blocks = Vec::new();
    let mut loose = Vec::new();
    let mut credits = None;

    for segment in segments {
        match *segment {
            Segment::Loose(text) => {
                loose.push(text);
                blocks.extend(records::blocks(text, options, diag));
            }
            Segment::Region { tag: RegionTag::Paragraphs, text } => {
                blocks.extend(records::blocks(text, options, diag));
            }
            Segment::Region { tag: RegionTag::Intro, text } => {
                let found = records::blocks(text, options, diag);
                if found.is_empty() {
                    blocks.extend(synthetic_intro(text));
                } else {
                    blocks.extend(found);
                }
            }
            Segment::Region { tag: RegionTag::Credits, text } => {
                if credits.is_none() {
                    credits = credits_from(text);
                }
            }
        }
    }

    let header = take_first(&mut blocks, |b| b.header().is_some());
    let title = title::resolve(header.as_ref(), &loose, diag);
    let meta = header.map(header_meta).unwrap_or_default();

    let intro = take_first(&mut blocks, |b| b.kind == "intro")
        .and_then(|b| b.text().map(str::to_string))
        .filter(|t| !t.is_empty())
        .map(|text| Intro { text });

    let slug = title::slug_for(title.as_deref());
    Document {
        title,
        slug,
        meta,
        intro,
        credits,
        paragraphs: blocks,
    }
}

fn take_first(blocks: &mut Vec<Block>, pred: impl Fn(&Block) -> bool) -> Option<Block> {
    let at = blocks.iter().position(pred)?;
    Some(blocks.remove(at))
}

fn header_meta(header: Block) -> Map<String, Value> {
    let mut meta = header.to_map();
    meta.retain(|k, _| !RESERVED.contains(&k.as_str()));
    meta
}

/// An intro region written as plain prose, with no `type:` declaration.
fn synthetic_intro(text: &str) -> Option<Block> {
    let text = html::normalize_rich_text(text);
    if text.is_empty() {
        return None;
    }
    let mut fields = Map::new();
    fields.insert("text".into(), Value::String(text));
    Some(Block {
        kind: "intro".into(),
        shape: Default::default(),
        fields,
    })
}

/// Credits region: its `text:` value when declared, else the whole region.
fn credits_from(region: &str) -> Option<Credits> {
    let raw = scanner::scan(region, &LABELS)
        .iter()
        .find(|l| l.name == "text")
        .map(|l| l.value(region))
        .unwrap_or(region);
    let text = html::normalize_rich_text(raw);
    (!text.is_empty()).then_some(Credits { text })
}
