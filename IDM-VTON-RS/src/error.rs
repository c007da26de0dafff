use std::time::Duration;
use thiserror::Error;

/// Errors returned by Gradio Space operations.
#[derive(Error, Debug)]
pub enum GradioError {
    /// The Space (or the Hub) returned a non-success HTTP status.
    #[error("Gradio returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The response was missing expected fields or had the wrong shape.
    #[error("{0}")]
    InvalidResponse(String),

    /// The Space reported an error event for the prediction.
    #[error("{0}")]
    App(String),

    /// The prediction did not finish within the configured timeout.
    #[error("Prediction timed out after {0:?}")]
    Timeout(Duration),

    /// Network-level request failure with context.
    #[error("{context}: {source}")]
    Network {
        context: String,
        source: reqwest::Error,
    },

    /// Local file access failed while uploading or saving an output.
    #[error("{context}: {source}")]
    Io {
        context: String,
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, GradioError>;

/// Errors raised while running a try-on request end to end.
#[derive(Error, Debug)]
pub enum TryOnError {
    /// An image URL answered with a non-success status.
    #[error("Failed to download {url}: HTTP {status}")]
    DownloadStatus { url: String, status: u16 },

    /// An image URL could not be fetched at all.
    #[error("Failed to download {url}: {source}")]
    Download {
        url: String,
        source: reqwest::Error,
    },

    #[error("{context}: {source}")]
    Io {
        context: String,
        source: std::io::Error,
    },

    #[error(transparent)]
    Gradio(#[from] GradioError),

    /// The `/tryon` endpoint returned something that is not an image reference.
    #[error("Unexpected try-on output: {0}")]
    InvalidOutput(String),
}

impl TryOnError {
    /// Stable type name reported as `error_type` in failure envelopes.
    pub fn kind(&self) -> &'static str {
        match self {
            TryOnError::DownloadStatus { .. } => "HttpStatusError",
            TryOnError::Download { .. } => "DownloadError",
            TryOnError::Io { .. } => "IoError",
            TryOnError::InvalidOutput(_) => "InvalidOutput",
            TryOnError::Gradio(inner) => match inner {
                GradioError::Http { .. } => "HttpStatusError",
                GradioError::InvalidResponse(_) => "InvalidResponse",
                GradioError::App(_) => "AppError",
                GradioError::Timeout(_) => "TimeoutError",
                GradioError::Network { .. } => "NetworkError",
                GradioError::Io { .. } => "IoError",
                GradioError::Json(_) => "JsonError",
            },
        }
    }
}
