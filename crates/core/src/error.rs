//! Error types for the analysis pipeline

use thiserror::Error;

/// Result type alias using [`AnalysisError`]
pub type AnalysisResult<T> = Result<T, AnalysisError>;

/// Analysis pipeline error types
///
/// Only artifact and frame-extraction failures are fatal to a run;
/// verifier call failures are absorbed at the call site with safe
/// defaults, and a missing video file degrades to an empty frame set.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Could not find 'Proofs Video' in {0}. Please check the HTML structure.")]
    ProofsVideoNotFound(String),

    #[error("Frame extraction failed: {0}")]
    FrameExtraction(String),

    #[error("Verifier call failed: {0}")]
    VerifierCall(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}
