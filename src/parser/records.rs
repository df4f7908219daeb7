//! Splits region text into block records, one per `type:` declaration.

use tracing::debug;

use super::fields::{self, LABELS};
use super::{scanner, Diagnostics, ParseOptions};
use crate::model::Block;

/// Record slices, each starting exactly at its `type:` label. Text before
/// the first declaration is dropped.
pub fn split(text: &str) -> Vec<&str> {
    let starts: Vec<usize> = scanner::scan(text, &LABELS)
        .into_iter()
        .filter(|l| l.name == "type")
        .map(|l| l.start)
        .collect();

    starts
        .iter()
        .enumerate()
        .map(|(i, &start)| {
            let end = starts.get(i + 1).copied().unwrap_or(text.len());
            &text[start..end]
        })
        .collect()
}

/// Tokenize and extract; records with no usable type are skipped.
pub fn blocks(text: &str, options: &ParseOptions, diag: &mut Diagnostics) -> Vec<Block> {
    let records = split(text);
    let blocks: Vec<Block> = records
        .iter()
        .filter_map(|record| fields::extract_block(record, options, diag))
        .collect();
    debug!(records = records.len(), blocks = blocks.len(), "region tokenized");
    blocks
}
