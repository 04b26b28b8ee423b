//! crates/priority_stream_core/src/ports.rs
//!
//! Defines the contracts (traits) for the stores the core reads from.
//! These traits form the boundary of the hexagonal architecture, allowing the
//! core to stay independent of the database and cache implementations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::time::Duration;

use crate::cursor::Cursor;
use crate::domain::{PriorityItem, SenderType, StreamFilter, User};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from the database or cache client.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
    #[error("Serialization failed: {0}")]
    Serialization(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Query and Record Types
//=========================================================================================

/// A fully resolved feed query, ready for the item store to execute.
///
/// Rows must be restricted to `user_id`, narrowed by `filter`, strictly
/// below `after` under `(timestamp DESC, id DESC)` when a cursor is present,
/// returned in that order and capped at `fetch_limit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemQuery {
    pub user_id: String,
    pub filter: StreamFilter,
    pub after: Option<Cursor>,
    pub fetch_limit: usize,
}

/// A message row as stored, before its structured payloads are decoded.
///
/// The blob columns are kept as raw JSON so that one malformed payload can be
/// dropped without failing the rest of the thread.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageRecord {
    pub id: String,
    pub sender_type: SenderType,
    pub content_type: String,
    pub content: String,
    pub full_content_html: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub sender_id: Option<String>,
    pub sender_name: Option<String>,
    pub sender_email: Option<String>,
    pub sender_avatar_url: Option<String>,
    pub event_details: Option<Value>,
    pub social_details: Option<Value>,
    pub attachments: Option<Value>,
    pub ai_insights: Option<Value>,
}

//=========================================================================================
// Store Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Executes a feed query. Returned items have empty participants and messages.
    async fn query_items(&self, query: &ItemQuery) -> PortResult<Vec<PriorityItem>>;

    /// Looks up one item scoped to its owner. `None` when no row matches.
    async fn find_item(&self, user_id: &str, item_id: &str) -> PortResult<Option<PriorityItem>>;

    async fn participants_for_item(&self, item_id: &str) -> PortResult<Vec<User>>;

    /// Returns the raw thread of an item, oldest message first.
    async fn messages_for_item(&self, item_id: &str) -> PortResult<Vec<MessageRecord>>;
}

#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Returns the serialized value stored under `key`, or `None` on a miss.
    async fn get(&self, key: &str) -> PortResult<Option<String>>;

    /// Stores `value` under `key` until `ttl` elapses.
    async fn set(&self, key: &str, value: String, ttl: Duration) -> PortResult<()>;

    async fn delete(&self, keys: &[String]) -> PortResult<()>;

    /// Checks that the cache backend is reachable.
    async fn ping(&self) -> PortResult<()>;
}
