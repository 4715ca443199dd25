//! Error taxonomy shared by every stage of the pipeline.

use std::path::{Path, PathBuf};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AnalyzerError>;

#[derive(Error, Debug)]
pub enum AnalyzerError {
    /// Rejected before any stage runs: unknown language, zero top-N, missing directory.
    #[error("configuration error: {message}")]
    Config { message: String },

    /// A per-page or global artifact that is not valid JSON for its expected shape.
    #[error("malformed file {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("i/o error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("duplicate page id {page_id} in {} and {}", .first.display(), .second.display())]
    DuplicateKey {
        page_id: u32,
        first: PathBuf,
        second: PathBuf,
    },

    /// The bincode offset index next to the consolidated page map is unreadable or stale.
    #[error("bad page index {}: {message}", .path.display())]
    Index { path: PathBuf, message: String },

    #[error("stage {stage} failed: {source}")]
    Stage {
        stage: &'static str,
        #[source]
        source: Box<AnalyzerError>,
    },
}

impl AnalyzerError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config { message: message.into() }
    }

    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io { path: path.as_ref().to_path_buf(), source }
    }

    pub fn decode(path: impl AsRef<Path>, source: serde_json::Error) -> Self {
        Self::Decode { path: path.as_ref().to_path_buf(), source }
    }

    pub fn index(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self::Index { path: path.as_ref().to_path_buf(), message: message.into() }
    }

    /// Attach the name of the stage that produced this error.
    pub fn in_stage(self, stage: &'static str) -> Self {
        match self {
            already @ Self::Stage { .. } => already,
            other => Self::Stage { stage, source: Box::new(other) },
        }
    }

    pub fn is_config(&self) -> bool {
        match self {
            Self::Config { .. } => true,
            Self::Stage { source, .. } => source.is_config(),
            _ => false,
        }
    }

    pub fn is_decode(&self) -> bool {
        match self {
            Self::Decode { .. } | Self::Index { .. } => true,
            Self::Stage { source, .. } => source.is_decode(),
            _ => false,
        }
    }
}
