// crates/citysearch-core/src/error.rs
use thiserror::Error;

/// Errors produced while fetching, decoding, or configuring the city dataset.
///
/// None of these ever reach a search caller: the store catches them and
/// degrades to the instant tier. They surface only from the lower-level
/// building blocks ([`crate::fetch`], [`crate::config`]).
#[derive(Debug, Error)]
pub enum CityError {
    #[error("dataset not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "http")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} while fetching {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("dataset is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("failed to decompress {0}")]
    Decompress(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to parse configuration: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("dataset contained no usable city records")]
    EmptyDataset,
}

pub type Result<T> = std::result::Result<T, CityError>;
