//! Error types for directory lookups and membership operations.

use thiserror::Error;

use crate::model::ObjectCollection;

/// Result type alias using `DirectoryError`.
pub type DirectoryResult<T> = Result<T, DirectoryError>;

/// Errors that can occur when talking to the directory.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// Configuration validation error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// `OAuth2` authentication error.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Caller supplied an unusable value (blank mail, bad attribute name).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// No object in the collection carries the requested mail address.
    #[error("No {collection} found with mail '{mail}'")]
    NotFound {
        collection: ObjectCollection,
        mail: String,
    },

    /// Microsoft Graph API error.
    #[error("Graph API error ({status}): {code} - {message}")]
    GraphApi {
        status: u16,
        code: String,
        message: String,
    },

    /// HTTP request error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Rate limit still exceeded after the client gave up retrying.
    #[error("Rate limit exceeded, retry after {retry_after_secs} seconds")]
    RateLimited { retry_after_secs: u64 },

    /// Server returned a continuation link outside the configured Graph endpoint.
    #[error("Refusing to follow next link outside the Graph endpoint: {0}")]
    UntrustedNextLink(String),
}

impl DirectoryError {
    /// Returns true if this is a lookup miss rather than a failure.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns true if the error came from a remote round trip.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Auth(_)
                | Self::GraphApi { .. }
                | Self::Http(_)
                | Self::Json(_)
                | Self::RateLimited { .. }
                | Self::UntrustedNextLink(_)
        )
    }
}
