use std::fmt::{Error as FmtError, Formatter};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::score::error::ScoreError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Required tool `{tool}` was not found. {hint}")]
    MissingCollaborator { tool: String, hint: &'static str },

    #[error("Invalid input path {path:?}: expected a PDF file or a directory of page images.")]
    InvalidInput { path: PathBuf },

    #[error("Recognition failed for page {page:?}: {reason}")]
    RecognitionFailure { page: PathBuf, reason: String },

    #[error("Recognition of page {page:?} did not produce {expected:?}.")]
    MissingRecognitionOutput { page: PathBuf, expected: PathBuf },

    #[error("Rasterizing {path:?} failed: {reason}")]
    RasterizationFailure { path: PathBuf, reason: String },

    #[error(transparent)]
    Score(#[from] ScoreError),

    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Truth serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Could not start recognition workers: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Failed to render MIDI for {0}.")]
    Midi(String),
}

impl Error {
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        Error::Io {
            path: path.to_owned(),
            source,
        }
    }
}

pub fn fmt_simple_error(f: &mut Formatter, message: &str, filename: &str) -> Result<(), FmtError> {
    use crate::colors::{BLUE, RED, WHITE};

    writeln!(
        f,
        "{}: {}\n   {}: {}",
        RED.paint("error"),
        WHITE.paint(message),
        BLUE.paint("in"),
        filename,
    )
}
