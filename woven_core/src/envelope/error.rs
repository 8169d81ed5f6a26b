use reqwest::StatusCode;
use thiserror::Error;

/// Easy alias for error handling
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can happen while talking to the API. These never leave the
/// `EnvelopeClient`; they are logged and collapsed into `Outcome::Failure`.
#[derive(Debug, Error)]
pub enum Error {
    /// We couldn't build a URL, for example if the base URL was invalid.
    #[error("URL error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// We couldn't reach the server or read its response.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered, but not with a success (2xx) status.
    #[error("unsuccessful status: {0}")]
    Status(StatusCode),

    /// We couldn't serialize the request body.
    #[error("could not encode request body: {0}")]
    Encode(#[from] serde_json::Error),
}
