use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
    #[error("storage error: {0}")]
    Storage(#[from] libsql::Error),
    #[error("failed to create bookmark")]
    BookmarkNotCreated,
    #[error("failed to get or create tag: {0}")]
    TagNotResolved(String),
}

/// Failures while reading or writing a native-messaging frame.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("stream ended inside a message")]
    Truncated,
    #[error("message of {len} bytes exceeds limit of {max} bytes")]
    TooLarge { len: usize, max: usize },
    #[error("message is not valid utf-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
    #[error("message is not valid json: {0}")]
    Json(#[from] serde_json::Error),
}
