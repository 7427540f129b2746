//! Error types for the video telemetry pipeline

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("capture device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("no frames buffered for export")]
    EmptyBuffer,

    #[error("no frame has been displayed yet")]
    EmptyDisplay,

    #[error("I/O error on {} after {written} frames: {source}", path.display())]
    Io {
        path: PathBuf,
        written: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid frame: {0}")]
    InvalidFrame(String),

    #[error("resize failed: {0}")]
    Resize(String),

    #[error("image encoding error: {0}")]
    Image(#[from] image::ImageError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn io(path: impl Into<PathBuf>, written: usize, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            written,
            source,
        }
    }

    /// Frames successfully written before the failure, for export diagnostics.
    pub fn frames_written(&self) -> Option<usize> {
        match self {
            Error::Io { written, .. } => Some(*written),
            _ => None,
        }
    }

    /// Warnings are operator mistakes (nothing to save yet); everything else is an error.
    pub fn is_warning(&self) -> bool {
        matches!(self, Error::EmptyBuffer | Error::EmptyDisplay)
    }
}
