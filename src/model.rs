use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::parser::fields;

/// A parsed story, ready to be written as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub slug: String,
    /// Remaining fields of the promoted header block (subtitle, author, ...).
    #[serde(flatten)]
    pub meta: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intro: Option<Intro>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credits: Option<Credits>,
    pub paragraphs: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intro {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credits {
    pub text: String,
}

/// One renderable unit. Serialized flat: `{"type": .., <shape fields>, <fields>}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Block {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(flatten)]
    pub shape: BlockShape,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BlockShape {
    Header(HeaderFields),
    VideoScroll(VideoScrollFields),
    Section(SectionFields),
    Generic(GenericFields),
}

impl Default for BlockShape {
    fn default() -> Self {
        BlockShape::Generic(GenericFields {})
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GenericFields {}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_mobile: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
}

/// Scroll-driven video: either a video file or a numbered frame sequence
/// (`{imagePrefix}{n}.{frameExtension}`) that media pipelines fill in later.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoScrollFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_src: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_src_mobile: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_prefix_mobile: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_extension: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_frames: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_frames_mobile: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_start: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_end: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fps: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steps: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_frames: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub padding: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub align: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Value>,
}

impl Block {
    /// Build a block from its flat map form; typed fields are claimed by the
    /// shape registered for the block's type, the rest stays in `fields`.
    pub fn from_map(mut map: Map<String, Value>) -> Result<Self, String> {
        let kind = match map.remove("type") {
            Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_lowercase(),
            Some(other) => return Err(format!("block `type` must be a non-empty string, got {other}")),
            None => return Err("block has no `type`".to_string()),
        };
        let shape = fields::shape_for(&kind, &mut map);
        Ok(Block { kind, shape, fields: map })
    }

    /// Flat map form, as serialized.
    pub fn to_map(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }

    /// Any field by its serialized name, typed or not.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.to_map().remove(name)
    }

    /// Write a field by its serialized name. Typed fields are updated in place
    /// when the value fits their type; otherwise the value lands in `fields`.
    /// Writing `type` reclassifies the block; an empty type is ignored.
    pub fn set(&mut self, name: &str, value: Value) {
        let mut map = self.to_map();
        map.insert(name.to_string(), value);
        if let Ok(block) = Block::from_map(map) {
            *self = block;
        }
    }

    pub fn text(&self) -> Option<&str> {
        self.fields.get("text").and_then(Value::as_str)
    }

    pub fn header(&self) -> Option<&HeaderFields> {
        match &self.shape {
            BlockShape::Header(h) => Some(h),
            _ => None,
        }
    }

    pub fn video_scroll(&self) -> Option<&VideoScrollFields> {
        match &self.shape {
            BlockShape::VideoScroll(v) => Some(v),
            _ => None,
        }
    }

    pub fn video_scroll_mut(&mut self) -> Option<&mut VideoScrollFields> {
        match &mut self.shape {
            BlockShape::VideoScroll(v) => Some(v),
            _ => None,
        }
    }

    pub fn section(&self) -> Option<&SectionFields> {
        match &self.shape {
            BlockShape::Section(s) => Some(s),
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for Block {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = Map::<String, Value>::deserialize(deserializer)?;
        Block::from_map(map).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn block(value: Value) -> Block {
        match value {
            Value::Object(map) => Block::from_map(map).unwrap(),
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn serializes_flat() {
        let b = block(json!({"type": "texto", "text": "Oi"}));
        assert_eq!(serde_json::to_value(&b).unwrap(), json!({"type": "texto", "text": "Oi"}));
    }

    #[test]
    fn typed_shape_round_trip() {
        let src = json!({
            "type": "videoscrollytelling",
            "imagePrefix": "frames/a_",
            "totalFrames": 120,
            "steps": [{"time": 1.5, "text": "x"}],
            "extra": true
        });
        let b = block(src.clone());
        let v = b.video_scroll().unwrap();
        assert_eq!(v.total_frames, Some(120));
        assert_eq!(v.image_prefix.as_deref(), Some("frames/a_"));
        assert_eq!(b.fields.get("extra"), Some(&json!(true)));

        let back: Block = serde_json::from_value(serde_json::to_value(&b).unwrap()).unwrap();
        assert_eq!(back, b);
    }

    #[test]
    fn missing_type_rejected() {
        let err = serde_json::from_value::<Block>(json!({"text": "x"})).unwrap_err();
        assert!(err.to_string().contains("type"));
    }

    #[test]
    fn set_updates_typed_field_in_place() {
        let mut b = block(json!({"type": "videoscrollytelling", "totalFrames": 10}));
        b.set("imagePrefix", json!("https://cdn.example.com/f_"));
        b.set("totalFrames", json!(240));
        let v = b.video_scroll().unwrap();
        assert_eq!(v.image_prefix.as_deref(), Some("https://cdn.example.com/f_"));
        assert_eq!(v.total_frames, Some(240));
        assert!(b.fields.is_empty());
    }

    #[test]
    fn set_mistyped_value_kept_in_fields() {
        let mut b = block(json!({"type": "videoscrollytelling"}));
        b.set("totalFrames", json!("many"));
        assert_eq!(b.video_scroll().unwrap().total_frames, None);
        assert_eq!(b.get("totalFrames"), Some(json!("many")));
    }

    #[test]
    fn set_type_reclassifies_shape() {
        let mut b = block(json!({"type": "texto", "title": "Capa", "text": "x"}));
        b.set("type", json!("Header"));
        assert_eq!(b.kind, "header");
        assert_eq!(b.header().unwrap().title.as_deref(), Some("Capa"));
        assert_eq!(b.text(), Some("x"));

        let back: Block = serde_json::from_value(serde_json::to_value(&b).unwrap()).unwrap();
        assert_eq!(back, b);

        b.set("type", json!("  "));
        assert_eq!(b.kind, "header");
    }

    #[test]
    fn document_meta_flattened() {
        let mut meta = Map::new();
        meta.insert("author".into(), json!("Ana"));
        let doc = Document {
            title: Some("T".into()),
            slug: "t".into(),
            meta,
            intro: None,
            credits: None,
            paragraphs: vec![],
        };
        let v = serde_json::to_value(&doc).unwrap();
        assert_eq!(v, json!({"title": "T", "slug": "t", "author": "Ana", "paragraphs": []}));
        let back: Document = serde_json::from_value(v).unwrap();
        assert_eq!(back, doc);
    }
}
