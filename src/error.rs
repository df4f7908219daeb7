use std::path::PathBuf;

use thiserror::Error;

/// Failures at the I/O boundary. The parser itself never fails.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("export at {url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("failed to serialize document: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Recoverable anomalies found while parsing. Each one is logged when raised
/// and returned to the caller in the parse report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Warning {
    #[error("no <body> wrapper found; parsing the whole input")]
    MissingBody,
    #[error("[{tag}] region is never closed; it runs to the end of the input")]
    UnterminatedRegion { tag: String },
    #[error("field `{field}` on `{block_type}` block is not valid JSON after sanitization ({reason}); using []")]
    MalformedJsonField {
        field: String,
        block_type: String,
        reason: String,
    },
    #[error("no title found (no header block, no title: declaration)")]
    MissingTitle,
}
