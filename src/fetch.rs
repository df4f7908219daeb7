use tracing::info;
use url::Url;

use crate::error::{Error, Result};

/// GET the raw export. No retries, no auth: the URL must be publicly readable.
pub async fn fetch_export(url: &str) -> Result<String> {
    let url = export_url(url);
    let client = reqwest::Client::new();

    info!("Fetching export: {}", url);
    let response = client.get(&url).send().await.map_err(|source| Error::Http {
        url: url.clone(),
        source,
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::Status {
            url,
            status: status.as_u16(),
        });
    }

    let body = response.text().await.map_err(|source| Error::Http {
        url: url.clone(),
        source,
    })?;
    info!("Fetched {} bytes", body.len());
    Ok(body)
}

/// A Google Docs editor link becomes its HTML export link; anything else is
/// returned as-is.
pub fn export_url(raw: &str) -> String {
    let Ok(url) = Url::parse(raw) else {
        return raw.to_string();
    };
    if url.host_str() != Some("docs.google.com") {
        return raw.to_string();
    }
    let segments: Vec<&str> = url.path_segments().map(|s| s.collect()).unwrap_or_default();
    match segments.as_slice() {
        ["document", "d", id, ..] if !id.is_empty() => {
            format!("https://docs.google.com/document/d/{id}/export?format=html")
        }
        _ => raw.to_string(),
    }
}
