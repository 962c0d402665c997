//! Error types for the video generation adapter.

/// Errors that can occur while talking to the fal.ai backend.
#[derive(Debug, thiserror::Error)]
pub enum VidGenError {
    /// API key missing or rejected by the backend.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Backend returned an error response.
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code reported by the backend.
        status: u16,
        /// Human-readable detail extracted from the response body.
        message: String,
    },

    /// Rate limit exceeded.
    #[error("rate limited by backend")]
    RateLimited,

    /// The backend reported the generation job as failed.
    #[error("video generation failed: {0}")]
    Generation(String),

    /// Backend returned a status we don't recognize.
    #[error("unexpected backend response: {0}")]
    UnexpectedResponse(String),

    /// Network or HTTP error.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// Result type alias for adapter operations.
pub type Result<T> = std::result::Result<T, VidGenError>;

/// Maximum length of a backend error body carried into an error message.
const MAX_ERROR_BODY: usize = 600;

/// Trims a backend error body down to something fit for a log line or
/// an error envelope. Backend bodies can be multi-kilobyte HTML pages.
pub(crate) fn sanitize_error_message(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.len() <= MAX_ERROR_BODY {
        return trimmed.to_string();
    }
    let mut cut = MAX_ERROR_BODY;
    while !trimmed.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…", &trimmed[..cut])
}
