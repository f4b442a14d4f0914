use chrono::NaiveDate;

/// Error type for date text that cannot be turned into an [`ApproxDate`].
///
/// [`ApproxDate`]: crate::approx_date::ApproxDate
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DateParseError {
    #[error("unrecognized date format: `{0}`")]
    UnrecognizedFormat(String),

    #[error("earliest date {earliest} is after latest date {latest}")]
    InvertedRange { earliest: NaiveDate, latest: NaiveDate },

    #[error("expected exactly two dates around `to`: `{0}`")]
    MalformedRange(String),
}

/// Transient failures reported by the external table store.
///
/// These propagate to the caller unchanged; the core never retries.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store request failed: {0}")]
    Unavailable(String),

    #[error("store request timed out: {0}")]
    Timeout(String),

    #[error("invalid continuation token: `{0}`")]
    InvalidToken(String),
}

/// Error type for archive operations.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    /// Entity fields failed validation; rejected before any store call.
    #[error("validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    DateParse(#[from] DateParseError),

    /// Attempt to change a key that was already assigned.
    #[error("field `{0}` is immutable once set")]
    ImmutableField(&'static str),

    /// A stored row could not be mapped back to its entity.
    #[error("failed to decode row in table `{table}`: {reason}")]
    Decode { table: &'static str, reason: String },

    /// The store rejected part or all of a batch write.
    #[error("batch write rejected {count} item(s): {keys}", count = .failed.len(), keys = .failed.join(", "))]
    Write { failed: Vec<String> },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for archive operations.
pub type ArchiveResult<T> = Result<T, ArchiveError>;
