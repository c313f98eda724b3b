use thiserror::Error;

/// Main error type for kgclient
#[derive(Error, Debug)]
pub enum KgError {
    /// HTTP 401 from the graph API
    #[error("You are not authenticated. Perhaps your token has expired?")]
    Auth,

    /// Any other non-200 status from the graph API
    #[error("Error. Status code {0}")]
    Request(u16),

    /// A query succeeded but matched nothing
    #[error("No results for query \"{0}\"")]
    EmptyResult(String),

    /// A node property that was expected to be present is missing
    #[error("Missing property: {0}")]
    MissingProperty(String),

    /// A property value that should be a `{"@id": ...}` reference is not one,
    /// or its URI has no identifier segment
    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    /// Transport-level errors (connect, timeout, TLS)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Body deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Convenient Result type using KgError
pub type Result<T> = std::result::Result<T, KgError>;
