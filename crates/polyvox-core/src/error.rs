//! Error types shared by every polyvox crate.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Request rejected before reaching the model.
    #[error("{0}")]
    InvalidInput(String),

    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// The model ran but its output could not be used.
    #[error("Inference error: {0}")]
    InferenceError(String),

    /// The model backend answered with a non-success status.
    #[error("Model backend error ({status}): {message}")]
    Backend { status: u16, message: String },

    /// A single model call ran past its time limit.
    #[error("Speech generation timed out after {0}s")]
    Timeout(u64),

    #[error("Model backend unreachable: {0}")]
    Connection(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Validation failures carry a message meant to be shown to the user as-is.
    pub fn is_user_input(&self) -> bool {
        matches!(self, Error::InvalidInput(_) | Error::UnsupportedLanguage(_))
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() || e.is_timeout() {
            Error::Connection(e.to_string())
        } else {
            Error::InferenceError(e.to_string())
        }
    }
}
