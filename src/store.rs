use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::model::Document;

pub fn read_export(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })
}

pub fn to_json(doc: &Document, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(doc)?
    } else {
        serde_json::to_string(doc)?
    };
    Ok(json)
}

/// Write `doc` as JSON, creating parent directories as needed.
pub fn write_document(doc: &Document, path: &Path, pretty: bool) -> Result<()> {
    let json = to_json(doc, pretty)?;
    let write_err = |source| Error::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    fs::write(path, json + "\n").map_err(write_err)
}

/// `*.html` / `*.htm` files directly under `dir`, sorted by name.
pub fn export_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let read_err = |source| Error::Read {
        path: dir.to_path_buf(),
        source,
    };
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_err)? {
        let path = entry.map_err(read_err)?.path();
        let is_export = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("html") || e.eq_ignore_ascii_case("htm"));
        if is_export && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
