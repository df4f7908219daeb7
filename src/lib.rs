//! Parser for word-processor HTML exports of multimedia stories.
//!
//! The export is a loosely structured document: `[paragraphs]`, `[intro]` and
//! `[credits]` regions holding `type:`-led block records with `name: value`
//! fields. [`parse_document`] turns it into an ordered [`Document`].

pub mod config;
pub mod error;
pub mod fetch;
pub mod model;
pub mod parser;
pub mod store;

pub use error::{Error, Result, Warning};
pub use model::{Block, BlockShape, Credits, Document, Intro};
pub use parser::{parse_document, parse_document_with, ParseOptions, ParseReport};
