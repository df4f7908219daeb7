pub mod header;
pub mod json;
pub mod section;
pub mod video;

use std::collections::HashMap;
use std::sync::LazyLock;

use serde_json::{Map, Number, Value};
use tracing::debug;

use super::scanner::{self, Label, LabelSet};
use super::{entities, html, Diagnostics, ParseOptions};
use crate::model::{Block, BlockShape};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Number,
    Bool,
    Json,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

const fn text(name: &'static str) -> FieldSpec {
    FieldSpec { name, kind: FieldKind::Text }
}

const fn number(name: &'static str) -> FieldSpec {
    FieldSpec { name, kind: FieldKind::Number }
}

const fn boolean(name: &'static str) -> FieldSpec {
    FieldSpec { name, kind: FieldKind::Bool }
}

const fn json(name: &'static str) -> FieldSpec {
    FieldSpec { name, kind: FieldKind::Json }
}

/// Fields captured on every block type.
const BASE_FIELDS: &[FieldSpec] = &[
    text("text"),
    text("title"),
    text("subtitle"),
    text("author"),
    text("role"),
    text("date"),
    text("image"),
    text("imageMobile"),
    text("caption"),
    text("credit"),
    text("alt"),
    text("src"),
    text("url"),
    text("link"),
    text("label"),
    text("videoSrc"),
    text("poster"),
    text("align"),
    text("size"),
    text("variant"),
    text("id"),
    text("backgroundColor"),
    text("textColor"),
    boolean("autoplay"),
    boolean("loop"),
    boolean("muted"),
    boolean("fullWidth"),
    json("images"),
    json("items"),
    json("steps"),
    json("children"),
    json("fallbackFrames"),
];

/// Block types whose `text` keeps inline markup.
pub const RICH_TEXT_TYPES: &[&str] = &["texto", "frase", "intro", "citacao"];

/// Type-specific field set and the function that turns captured values into
/// the block's typed shape.
pub struct Extension {
    pub types: &'static [&'static str],
    pub fields: &'static [FieldSpec],
    pub build: fn(&mut Map<String, Value>) -> BlockShape,
}

static EXTENSIONS: &[&Extension] = &[&header::EXTENSION, &video::EXTENSION, &section::EXTENSION];

static REGISTRY: LazyLock<HashMap<&'static str, &'static Extension>> = LazyLock::new(|| {
    EXTENSIONS
        .iter()
        .flat_map(|ext| ext.types.iter().map(move |t| (*t, *ext)))
        .collect()
});

/// Every label the scanner stops at: `type`, base fields, all extended fields.
pub static LABELS: LazyLock<LabelSet> = LazyLock::new(|| {
    let all = BASE_FIELDS
        .iter()
        .chain(EXTENSIONS.iter().flat_map(|ext| ext.fields.iter()));
    let plain = all.clone().filter(|f| f.kind != FieldKind::Json).map(|f| f.name);
    let bracketed = all.filter(|f| f.kind == FieldKind::Json).map(|f| f.name);
    LabelSet::new(std::iter::once("type").chain(plain), bracketed)
});

/// `Video-Scrollytelling` → `videoscrollytelling`.
pub fn normalize_type(kind: &str) -> String {
    kind.chars()
        .filter(|c| !matches!(c, '-' | '_' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

fn extension_for(kind: &str) -> Option<&'static Extension> {
    REGISTRY.get(normalize_type(kind).as_str()).copied()
}

/// Classify `map` by block type, moving typed fields into the shape.
pub fn shape_for(kind: &str, map: &mut Map<String, Value>) -> BlockShape {
    match extension_for(kind) {
        Some(ext) => (ext.build)(map),
        None => BlockShape::default(),
    }
}

/// Turn one record (text starting at its `type:` declaration) into a block.
/// Returns `None` when the record declares no usable type.
pub fn extract_block(record: &str, options: &ParseOptions, diag: &mut Diagnostics) -> Option<Block> {
    let labels = scanner::scan(record, &LABELS);
    let (first, rest) = labels.split_first()?;
    if first.name != "type" {
        return None;
    }
    let kind = block_type(first.value(record));
    if kind.is_empty() {
        debug!("record with empty type discarded");
        return None;
    }

    let extension = extension_for(&kind);
    let mut map = Map::new();
    for label in rest {
        if label.name == "type" {
            break;
        }
        let Some(spec) = find_spec(label.name, extension) else {
            continue;
        };
        if map.contains_key(spec.name) {
            continue;
        }
        if let Some(value) = field_value(spec, label, record, &kind, options, diag) {
            map.insert(spec.name.to_string(), value);
        }
    }

    let shape = match extension {
        Some(ext) => (ext.build)(&mut map),
        None => BlockShape::default(),
    };
    debug!(kind = %kind, fields = map.len(), "block extracted");
    Some(Block { kind, shape, fields: map })
}

/// `type:` value up to the first newline or tag.
fn block_type(raw: &str) -> String {
    let end = raw.find(['\n', '\r', '<']).unwrap_or(raw.len());
    entities::decode(&raw[..end]).trim().to_lowercase()
}

fn find_spec(name: &str, extension: Option<&Extension>) -> Option<FieldSpec> {
    extension
        .and_then(|ext| ext.fields.iter().find(|f| f.name == name))
        .or_else(|| BASE_FIELDS.iter().find(|f| f.name == name))
        .copied()
}

fn field_value(
    spec: FieldSpec,
    label: &Label,
    record: &str,
    kind: &str,
    options: &ParseOptions,
    diag: &mut Diagnostics,
) -> Option<Value> {
    let raw = label.value(record);
    match spec.kind {
        FieldKind::Json if label.bracketed => Some(json::parse_field(spec.name, kind, raw, diag)),
        // opened but never closed: still reported, as `[]`
        FieldKind::Json if html::strip_tags(raw).starts_with(['[', '{']) => {
            Some(json::parse_field(spec.name, kind, raw, diag))
        }
        FieldKind::Json => {
            debug!(field = spec.name, "json field without brackets ignored");
            None
        }
        FieldKind::Text if spec.name == "text" && options.is_rich_text(kind) => {
            non_empty(html::normalize_rich_text(raw)).map(Value::String)
        }
        FieldKind::Text => non_empty(html::strip_tags(raw)).map(Value::String),
        FieldKind::Number => non_empty(html::strip_tags(raw)).map(|s| coerce_number(&s)),
        FieldKind::Bool => non_empty(html::strip_tags(raw)).map(|s| coerce_bool(&s)),
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

fn coerce_number(s: &str) -> Value {
    let compact = s.replace(' ', "");
    if let Ok(n) = compact.parse::<i64>() {
        return Value::Number(n.into());
    }
    compact
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(s.to_string()))
}

fn coerce_bool(s: &str) -> Value {
    match s.to_lowercase().as_str() {
        "true" | "yes" | "sim" | "1" => Value::Bool(true),
        "false" | "no" | "não" | "nao" | "0" => Value::Bool(false),
        _ => Value::String(s.to_string()),
    }
}

// Helpers for shape builders: take a value out of the map only when it has
// the right type, so nothing is lost.

pub(crate) fn take_string(map: &mut Map<String, Value>, key: &str) -> Option<String> {
    let s = match map.get(key)? {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    map.remove(key);
    Some(s)
}

pub(crate) fn take_u32(map: &mut Map<String, Value>, key: &str) -> Option<u32> {
    let n = match map.get(key)? {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok())?,
        Value::String(s) => s.trim().parse::<u32>().ok()?,
        _ => return None,
    };
    map.remove(key);
    Some(n)
}

pub(crate) fn take_f64(map: &mut Map<String, Value>, key: &str) -> Option<f64> {
    let n = match map.get(key)? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().replace(',', ".").parse::<f64>().ok()?,
        _ => return None,
    };
    map.remove(key);
    Some(n)
}

pub(crate) fn take_json(map: &mut Map<String, Value>, key: &str) -> Option<Value> {
    match map.get(key)? {
        Value::Array(_) | Value::Object(_) => map.remove(key),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Warning;
    use serde_json::json;

    fn extract(record: &str) -> (Option<Block>, Vec<Warning>) {
        let mut diag = Diagnostics::default();
        let block = extract_block(record, &ParseOptions::default(), &mut diag);
        (block, diag.into_warnings())
    }

    #[test]
    fn rich_text_keeps_tags() {
        let (b, _) = extract("type: texto\ntext: Hello <b>World</b>");
        let b = b.unwrap();
        assert_eq!(b.kind, "texto");
        assert_eq!(b.to_map(), json!({"type": "texto", "text": "Hello <b>World</b>"}).as_object().unwrap().clone());
    }

    #[test]
    fn plain_text_strips_tags() {
        let (b, _) = extract("type: foto\ntext: Hello <b>World</b>\ncaption: <i>Legenda</i>");
        let b = b.unwrap();
        assert_eq!(b.text(), Some("Hello World"));
        assert_eq!(b.fields.get("caption"), Some(&json!("Legenda")));
    }

    #[test]
    fn type_is_lowercased_and_decoded() {
        let (b, _) = extract("type: &nbsp;TEXTO</span></p><p>text: x");
        assert_eq!(b.unwrap().kind, "texto");
    }

    #[test]
    fn empty_type_discarded() {
        let (b, _) = extract("type: \ntext: orphan");
        assert!(b.is_none());
    }

    #[test]
    fn multi_line_value_until_next_label() {
        let record = "type: texto\ntext: <p>one</p>\n<p>two</p>\ncredit: Ana";
        let (b, _) = extract(record);
        let b = b.unwrap();
        assert_eq!(b.text(), Some("one<br>two"));
        assert_eq!(b.fields.get("credit"), Some(&json!("Ana")));
    }

    #[test]
    fn extraction_is_idempotent() {
        let record = "type: galeria\nimages: [{src: 'a.jpg'}]\ncaption: C";
        assert_eq!(extract(record).0, extract(record).0);
    }

    #[test]
    fn coerces_declared_kinds() {
        let (b, _) = extract("type: video\nvideoSrc: v.mp4\nautoplay: sim\nloop: false");
        let b = b.unwrap();
        assert_eq!(b.fields.get("autoplay"), Some(&json!(true)));
        assert_eq!(b.fields.get("loop"), Some(&json!(false)));
        assert_eq!(b.fields.get("videoSrc"), Some(&json!("v.mp4")));
    }

    #[test]
    fn first_occurrence_wins() {
        let (b, _) = extract("type: foto\ncaption: A\ncaption: B");
        assert_eq!(b.unwrap().fields.get("caption"), Some(&json!("A")));
    }

    #[test]
    fn malformed_json_does_not_disturb_siblings() {
        let (b, warnings) = extract("type: galeria\ncaption: Before\nimages: [{src: 'a.jpg' oops}]\ncredit: After");
        let b = b.unwrap();
        assert_eq!(b.fields.get("images"), Some(&json!([])));
        assert_eq!(b.fields.get("caption"), Some(&json!("Before")));
        assert_eq!(b.fields.get("credit"), Some(&json!("After")));
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn unclosed_json_keeps_later_siblings() {
        let (b, warnings) = extract("type: galeria\nimages: [{src: 'a.jpg'}\ncaption: Legenda\ncredit: Ana");
        let b = b.unwrap();
        assert_eq!(b.fields.get("images"), Some(&json!([])));
        assert_eq!(b.fields.get("caption"), Some(&json!("Legenda")));
        assert_eq!(b.fields.get("credit"), Some(&json!("Ana")));
        assert!(matches!(warnings.as_slice(), [Warning::MalformedJsonField { field, .. }] if field == "images"));
    }

    #[test]
    fn bracket_inside_string_value() {
        let (b, warnings) = extract("type: galeria\nimages: [{src: 'a.jpg', caption: 'Fase 1] fim'}]\ncredit: Ana");
        let b = b.unwrap();
        assert_eq!(
            b.fields.get("images"),
            Some(&json!([{"src": "a.jpg", "caption": "Fase 1] fim"}]))
        );
        assert_eq!(b.fields.get("credit"), Some(&json!("Ana")));
        assert!(warnings.is_empty());
    }

    #[test]
    fn extended_fields_only_for_matching_type() {
        let (b, _) = extract("type: texto\ntext: a\ntotalFrames: 10");
        let b = b.unwrap();
        assert_eq!(b.text(), Some("a"));
        assert!(b.get("totalFrames").is_none());
    }

    #[test]
    fn normalized_type_lookup() {
        assert_eq!(normalize_type("Video-Scrollytelling"), "videoscrollytelling");
        let (b, _) = extract("type: video_scrollytelling\ntotalFrames: 12");
        assert_eq!(b.unwrap().video_scroll().unwrap().total_frames, Some(12));
    }

    #[test]
    fn number_coercion() {
        assert_eq!(coerce_number("12"), json!(12));
        assert_eq!(coerce_number("2,5"), json!(2.5));
        assert_eq!(coerce_number("300vh"), json!("300vh"));
    }
}
