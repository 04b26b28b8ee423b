//! crates/priority_stream_core/src/error.rs
//!
//! The error taxonomy surfaced to callers of the stream operations.

use crate::ports::PortError;

/// Errors returned by `get_stream`, `get_stream_item` and `validate_filter`.
///
/// An absent item is not an error; the detail path returns `Ok(None)`.
/// Cache failures never show up here because the orchestrator downgrades
/// them to a miss.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// The filter token is not one of `all`, `high` or `unread`.
    #[error("invalid filter: {0}. Valid values: all, high, unread")]
    InvalidFilter(String),

    /// The pagination token could not be decoded into a cursor.
    #[error("invalid cursor: {0}")]
    InvalidCursor(String),

    /// The item store failed or was unreachable.
    #[error("storage error: {0}")]
    Storage(#[from] PortError),
}

impl StreamError {
    /// Whether the caller can fix the request and retry.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            StreamError::InvalidFilter(_) | StreamError::InvalidCursor(_)
        )
    }
}

/// A convenience type alias for `Result<T, StreamError>`.
pub type StreamResult<T> = Result<T, StreamError>;
