use thiserror::Error;

/// Errors returned by a Genius client.
#[derive(Debug, Clone, Error)]
pub enum GeniusError {
    /// Transport failure (DNS, connection reset, TLS, body decoding)
    #[error("HTTP error: {0}")]
    Http(String),

    /// The requested resource does not exist upstream
    #[error("Not found: {0}")]
    NotFound(String),

    /// The access token was rejected by Genius
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Genius throttled the request
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Any other non-success status
    #[error("Unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    /// The token cannot be carried in an Authorization header
    #[error("Access token is not a valid header value")]
    InvalidToken,

    /// A field the client relies on is absent from the payload
    #[error("Missing field in Genius response: {0}")]
    MissingField(&'static str),
}

impl From<reqwest::Error> for GeniusError {
    fn from(err: reqwest::Error) -> Self {
        GeniusError::Http(err.to_string())
    }
}

/// Errors surfaced by endpoint handlers.
///
/// Every variant maps to a generic 500; the cause only reaches the logs.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The Genius client failed
    #[error("Upstream error: {0}")]
    Upstream(#[from] GeniusError),

    /// The upstream payload lacks the value a handler projects out of it
    #[error("Unexpected upstream response: missing {0}")]
    Projection(String),

    /// The API schema could not be rendered
    #[error("Schema rendering failed: {0}")]
    Schema(String),
}
