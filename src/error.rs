//! Failure taxonomy for the extraction and condensation pipeline.
//!
//! Every variant is recovered at the stage boundary where it occurs: an
//! article is dropped, an attempt is skipped, a section is ignored. None of
//! them abort a run.

/// A recoverable pipeline failure.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The HTML part could not be decoded (bad base64url or non-UTF-8 bytes).
    #[error("decode error: {0}")]
    Decode(String),

    /// The HTML could not be turned into text.
    #[error("parse error: {0}")]
    Parse(String),

    /// The chat endpoint failed or answered with an unexpected shape.
    #[error("transport error: {0}")]
    Transport(String),

    /// A batch section carried none of the recognised fields.
    #[error("format error: {0}")]
    Format(String),
}

impl From<reqwest::Error> for PipelineError {
    fn from(e: reqwest::Error) -> Self {
        PipelineError::Transport(e.to_string())
    }
}

impl From<base64::DecodeError> for PipelineError {
    fn from(e: base64::DecodeError) -> Self {
        PipelineError::Decode(e.to_string())
    }
}

impl From<std::string::FromUtf8Error> for PipelineError {
    fn from(e: std::string::FromUtf8Error) -> Self {
        PipelineError::Decode(e.to_string())
    }
}
