use std::path::PathBuf;
use thiserror::Error;

/// Failures that abort a whole run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("failed to decode image {path}: {message}")]
    Decode { path: PathBuf, message: String },

    #[error("a run is already in progress")]
    Busy,

    #[error("pipeline failed: {0}")]
    Pipeline(#[from] anyhow::Error),

    #[error("worker task failed: {0}")]
    Worker(String),
}

/// Failures confined to a single region; the region is dropped and the run continues.
#[derive(Debug, Error)]
pub enum RegionError {
    #[error("could not encode region for recognition: {0}")]
    Encode(String),

    #[error("text recognition failed: {0}")]
    Recognition(String),

    #[error("entity tagging failed: {0}")]
    Tagging(String),
}
