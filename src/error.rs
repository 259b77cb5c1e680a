//! Error types surfaced by the mock layer.

use thiserror::Error;

/// Boxed error returned by a dynamic response function.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors produced while resolving or forwarding a request.
#[derive(Debug, Error)]
pub enum MockError {
    /// A user-supplied dynamic response function failed.
    #[error("Dynamic response function failed for {url}: {source}")]
    DynamicResponse {
        url: String,
        #[source]
        source: BoxError,
    },

    /// No real transport was installed for this request API.
    #[error("{0} transport is not installed")]
    TransportUnavailable(&'static str),

    /// `send` was called on an XHR that was never opened.
    #[error("XHR send() called before open()")]
    NotOpened,

    /// The real transport failed.
    #[error("Transport error: {0}")]
    Transport(String),

    /// A response body could not be decoded as JSON.
    #[error("Invalid JSON body: {0}")]
    Json(#[from] serde_json::Error),

    /// The HTTP client behind the real transport failed.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}
