// src/pac/downloader.rs
use crate::error::SourceError;
use log::{error, info};
use reqwest::blocking::Client;
use std::path::Path;
use std::time::Duration;

/// Download PAC file from URL, return its JS string.
pub fn download_pac(pac_url: &str, timeout: Duration) -> Result<String, SourceError> {
    info!("Downloading PAC script from: {}", pac_url);

    let client = Client::builder().timeout(timeout).build()?;

    let response = client.get(pac_url).send()?;

    if !response.status().is_success() {
        error!("PAC download failed: HTTP {}", response.status());
        return Err(SourceError::Status(response.status().as_u16()));
    }

    let text = response.text()?;
    info!("PAC script downloaded successfully ({} bytes)", text.len());
    Ok(text)
}

/// Downloads `http://` and `https://` locations; reads anything else from disk.
pub fn load_pac_source(location: &str, timeout: Duration) -> Result<String, SourceError> {
    let lower = location.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        return download_pac(location, timeout);
    }

    let path = Path::new(location);
    let text = std::fs::read_to_string(path).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!("PAC script read from {} ({} bytes)", path.display(), text.len());
    Ok(text)
}
