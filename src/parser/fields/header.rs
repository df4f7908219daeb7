use serde_json::{Map, Value};

use super::{take_string, text, Extension, FieldSpec};
use crate::model::{BlockShape, HeaderFields};

const FIELDS: &[FieldSpec] = &[
    text("title"),
    text("subtitle"),
    text("author"),
    text("date"),
    text("image"),
    text("imageMobile"),
    text("credit"),
    text("layout"),
    text("textColor"),
    text("backgroundColor"),
];

pub static EXTENSION: Extension = Extension {
    types: &["header", "cabecalho"],
    fields: FIELDS,
    build,
};

fn build(map: &mut Map<String, Value>) -> BlockShape {
    BlockShape::Header(HeaderFields {
        title: take_string(map, "title"),
        subtitle: take_string(map, "subtitle"),
        author: take_string(map, "author"),
        date: take_string(map, "date"),
        image: take_string(map, "image"),
        image_mobile: take_string(map, "imageMobile"),
        credit: take_string(map, "credit"),
        layout: take_string(map, "layout"),
        text_color: take_string(map, "textColor"),
        background_color: take_string(map, "backgroundColor"),
    })
}
