use std::fs;
use std::path::Path;

use rust_embed::Embed;

use crate::error::FetchError;

#[derive(Embed)]
#[folder = "assets/decks/"]
struct DeckAssets;

/// Reads the raw text behind a topic or manifest URL.
///
/// `http(s)://` goes over the network, `file://` and existing paths are read
/// from disk, anything else names a bundled deck.
pub fn fetch_text(url: &str) -> Result<String, FetchError> {
    let url = url.trim();
    if url.starts_with("http://") || url.starts_with("https://") {
        return fetch_url(url);
    }
    if let Some(path) = url.strip_prefix("file://") {
        return read_file(Path::new(path));
    }
    let path = Path::new(url);
    if path.is_file() {
        return read_file(path);
    }
    bundled(url)
}

pub fn bundled(name: &str) -> Result<String, FetchError> {
    let name = name.trim_start_matches("./").trim_start_matches('/');
    let file = DeckAssets::get(name).ok_or_else(|| FetchError::NotFound(name.to_string()))?;
    String::from_utf8(file.data.into_owned()).map_err(|e| FetchError::Io {
        path: name.to_string(),
        source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
    })
}

pub fn bundled_names() -> Vec<String> {
    DeckAssets::iter().map(|f| f.to_string()).collect()
}

pub fn read_file(path: &Path) -> Result<String, FetchError> {
    fs::read_to_string(path).map_err(|source| FetchError::Io {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(feature = "network")]
pub fn fetch_url(url: &str) -> Result<String, FetchError> {
    let network = |e: reqwest::Error| FetchError::Network {
        url: url.to_string(),
        message: e.to_string(),
    };
    let client = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(10))
        .build()
        .map_err(network)?;
    let response = client.get(url).send().map_err(network)?;
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    response.text().map_err(network)
}

#[cfg(not(feature = "network"))]
pub fn fetch_url(_url: &str) -> Result<String, FetchError> {
    Err(FetchError::NetworkDisabled)
}
