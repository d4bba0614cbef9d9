// crates/citysearch-core/src/fetch.rs

//! # Dataset Sources
//!
//! Handles the physical layer (file, HTTP, decompression) for the full
//! tier. The store only needs "give me the text or fail", so every source
//! hides behind [`CitySource`].

use crate::error::{CityError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Where the full-tier text comes from.
///
/// Implementations must be cheap to share; the store keeps one behind an
/// `Arc` and may call [`CitySource::fetch_text`] again after a failure.
#[async_trait]
pub trait CitySource: Send + Sync {
    /// Human-readable location, used in logs.
    fn describe(&self) -> String;

    /// Returns the complete dataset text.
    async fn fetch_text(&self) -> Result<String>;
}

/// Reads the dataset from the local filesystem.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CitySource for FileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn fetch_text(&self) -> Result<String> {
        let bytes = tokio::fs::read(&self.path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CityError::NotFound(format!("{}: {}", self.path.display(), e))
            } else {
                CityError::Io(e)
            }
        })?;
        decode_payload(&self.describe(), bytes)
    }
}

/// Downloads the dataset over HTTP(S).
#[cfg(feature = "http")]
#[derive(Debug, Clone)]
pub struct HttpSource {
    url: String,
    client: reqwest::Client,
}

#[cfg(feature = "http")]
impl HttpSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_client(url, reqwest::Client::new())
    }

    pub fn with_client(url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            url: url.into(),
            client,
        }
    }
}

#[cfg(feature = "http")]
#[async_trait]
impl CitySource for HttpSource {
    fn describe(&self) -> String {
        self.url.clone()
    }

    async fn fetch_text(&self) -> Result<String> {
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CityError::HttpStatus {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }
        let bytes = response.bytes().await?;
        decode_payload(&self.url, bytes.to_vec())
    }
}

/// Serves a fixed in-memory dataset.
#[derive(Debug, Clone)]
pub struct StaticSource {
    text: Arc<str>,
}

impl StaticSource {
    pub fn new(text: impl Into<Arc<str>>) -> Self {
        Self { text: text.into() }
    }
}

#[async_trait]
impl CitySource for StaticSource {
    fn describe(&self) -> String {
        format!("<in-memory dataset, {} bytes>", self.text.len())
    }

    async fn fetch_text(&self) -> Result<String> {
        Ok(self.text.to_string())
    }
}

/// Picks a source from a configured location.
///
/// `http://` and `https://` locations download (with the `http` feature);
/// anything else is a file path.
pub fn source_for(location: &str) -> Arc<dyn CitySource> {
    let location = location.trim();
    #[cfg(feature = "http")]
    {
        if is_url(location) {
            return Arc::new(HttpSource::new(location));
        }
    }
    Arc::new(FileSource::new(location))
}

pub fn is_url(location: &str) -> bool {
    let lower = location.trim().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Turns fetched bytes into text, gunzipping when the payload is gzip.
fn decode_payload(origin: &str, bytes: Vec<u8>) -> Result<String> {
    if is_gzip(&bytes) {
        return gunzip(origin, &bytes);
    }
    Ok(String::from_utf8(bytes)?)
}

fn is_gzip(bytes: &[u8]) -> bool {
    bytes.starts_with(&[0x1f, 0x8b])
}

#[cfg(feature = "compact")]
fn gunzip(origin: &str, bytes: &[u8]) -> Result<String> {
    use flate2::read::GzDecoder;
    use std::io::Read;

    let mut text = String::new();
    GzDecoder::new(bytes)
        .read_to_string(&mut text)
        .map_err(|e| CityError::Decompress(format!("{origin}: {e}")))?;
    Ok(text)
}

#[cfg(not(feature = "compact"))]
fn gunzip(origin: &str, _bytes: &[u8]) -> Result<String> {
    Err(CityError::Decompress(format!(
        "{origin}: gzip payload but 'compact' feature disabled"
    )))
}
