use serde_json::{Map, Value};

use super::{json, take_json, take_string, text, Extension, FieldSpec};
use crate::model::{BlockShape, SectionFields};

const FIELDS: &[FieldSpec] = &[
    text("layout"),
    text("background"),
    text("backgroundColor"),
    text("backgroundImage"),
    text("padding"),
    text("align"),
    text("width"),
    text("theme"),
    json("children"),
];

pub static EXTENSION: Extension = Extension {
    types: &["section", "secao"],
    fields: FIELDS,
    build,
};

fn build(map: &mut Map<String, Value>) -> BlockShape {
    BlockShape::Section(SectionFields {
        layout: take_string(map, "layout"),
        background: take_string(map, "background"),
        background_color: take_string(map, "backgroundColor"),
        background_image: take_string(map, "backgroundImage"),
        padding: take_string(map, "padding"),
        align: take_string(map, "align"),
        width: take_string(map, "width"),
        theme: take_string(map, "theme"),
        children: take_json(map, "children"),
    })
}
