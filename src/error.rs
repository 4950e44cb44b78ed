//! Crate-level error type and `Result` alias for stable, structured error handling.
//! Converts underlying I/O, codec, and archive errors, and provides semantic
//! variants for request validation and pipeline failures.
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    #[error("Mosaic source unavailable: {reason}")]
    SourceUnavailable { reason: String },

    #[error("Band expression error: {reason}")]
    Expression { reason: String },

    #[error("Unknown colormap: {name}")]
    UnknownColormap { name: String },

    #[error("Image codec error: {0}")]
    Codec(#[from] image::ImageError),

    #[error("Projection error: {reason}")]
    Projection { reason: String },

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Processing error: {0}")]
    Processing(String),

    #[error("External error: {0}")]
    External(String),
}

impl Error {
    pub fn external<E: std::fmt::Display>(e: E) -> Self {
        Error::External(e.to_string())
    }

    pub fn invalid_request<S: Into<String>>(reason: S) -> Self {
        Error::InvalidRequest {
            reason: reason.into(),
        }
    }
}
