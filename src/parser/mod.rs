pub mod assemble;
pub mod entities;
pub mod fields;
pub mod html;
pub mod preprocess;
pub mod records;
pub mod scanner;
pub mod segments;
pub mod title;

use tracing::{info, warn};

use crate::error::Warning;
use crate::model::Document;

/// Knobs that change extraction output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    /// Block types whose `text` keeps inline markup.
    pub rich_text_types: Vec<String>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            rich_text_types: fields::RICH_TEXT_TYPES.iter().map(|t| t.to_string()).collect(),
        }
    }
}

impl ParseOptions {
    pub fn is_rich_text(&self, kind: &str) -> bool {
        self.rich_text_types.iter().any(|t| t.eq_ignore_ascii_case(kind))
    }
}

/// Warnings raised during one parse call.
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    pub fn warn(&mut self, warning: Warning) {
        warn!("{warning}");
        self.warnings.push(warning);
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn into_warnings(self) -> Vec<Warning> {
        self.warnings
    }
}

#[derive(Debug, Clone)]
pub struct ParseReport {
    pub document: Document,
    pub warnings: Vec<Warning>,
}

/// Parse a raw export with default options. Never fails.
pub fn parse_document(raw: &str) -> Document {
    parse_document_with(raw, &ParseOptions::default()).document
}

/// Pipeline: preprocess → segments → records → blocks → document.
pub fn parse_document_with(raw: &str, options: &ParseOptions) -> ParseReport {
    let mut diag = Diagnostics::default();

    let cleaned = preprocess::strip_non_content(raw);
    let body = segments::body(&cleaned, &mut diag);
    let segments = segments::split(body, &mut diag);
    let document = assemble::assemble(&segments, options, &mut diag);

    info!(
        slug = %document.slug,
        blocks = document.paragraphs.len(),
        warnings = diag.warnings().len(),
        "document parsed"
    );
    ParseReport {
        document,
        warnings: diag.into_warnings(),
    }
}
