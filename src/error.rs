use thiserror::Error;

/// Reasons a deck or topic manifest is refused. Any of these rejects the
/// whole load.
#[derive(Debug, Error)]
pub enum DeckError {
    #[error("file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected a JSON array of cards")]
    NotAnArray,

    #[error("deck contains no cards")]
    Empty,

    #[error("card #{index} is missing `{field}`")]
    MissingField { index: usize, field: &'static str },

    #[error("card #{index} has an invalid `{field}` value")]
    InvalidField { index: usize, field: &'static str },

    #[error("card #{index} reuses id {id}")]
    DuplicateId { index: usize, id: u32 },
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {message}")]
    Network { url: String, message: String },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("could not read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("no bundled deck named {0}")]
    NotFound(String),

    #[error("network support is disabled in this build")]
    NetworkDisabled,

    #[error(transparent)]
    Deck(#[from] DeckError),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QuizError {
    #[error("no deck loaded")]
    NoDeck,

    #[error("page {page} is out of range (1..={max})")]
    PageOutOfRange { page: usize, max: usize },

    #[error("page size must be at least 1")]
    InvalidPageSize,
}

#[derive(Debug, Error)]
pub enum FeedbackError {
    #[error("{0} must not be empty")]
    MissingField(&'static str),

    #[error("'{0}' is not an email address")]
    InvalidEmail(String),

    #[error("no feedback endpoint configured")]
    NoEndpoint,

    #[error("endpoint does not accept this method")]
    MethodNotAllowed,

    #[error("feedback was rejected: {0}")]
    Rejected(String),

    #[error("request failed: {0}")]
    Network(String),

    #[error("network support is disabled in this build")]
    NetworkDisabled,
}
