use thiserror::Error;

/// Rejections produced when building an event from raw user input.
/// These are recoverable: the caller re-prompts and tries again.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("title must not be empty")]
    EmptyTitle,

    #[error("invalid date (expected YYYY-MM-DD): {0}")]
    BadDate(String),

    #[error("invalid time (expected HH:MM): {0}")]
    BadTime(String),

    #[error("reminder offset must not be negative: {0}")]
    NegativeReminder(i64),
}

/// Failures while persisting the event map. A failed write commits nothing;
/// read-side corruption is handled by degrading to an empty store instead.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("failed to write event store: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize event store: {0}")]
    Serialize(#[from] serde_json::Error),
}
