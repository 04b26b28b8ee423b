//! crates/priority_stream_core/src/service.rs
//!
//! The cache-aside orchestrator in front of the query engine and the
//! detail assembler.
//!
//! Every read looks in the cache first and, on a miss, computes the value and
//! writes it back with a fixed TTL. The cache is strictly best effort: a
//! failed read is a miss and a failed write is ignored, so a cache outage only
//! costs latency. Concurrent misses on the same key may both compute and
//! both write; the last write wins until the entry expires.

use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::detail::DetailAssembler;
use crate::domain::{PriorityItem, StreamFilter, StreamPage};
use crate::error::{StreamError, StreamResult};
use crate::ports::{CacheStore, ItemStore};
use crate::query::{clamp_limit, parse_cursor, QueryEngine};

//=========================================================================================
// Requests, Settings and Keys
//=========================================================================================

/// The parameters of a feed read, as received from the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamRequest {
    pub user_id: String,
    pub filter: StreamFilter,
    pub limit: Option<i64>,
    pub cursor: Option<String>,
}

impl StreamRequest {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            filter: StreamFilter::All,
            limit: None,
            cursor: None,
        }
    }

    pub fn with_filter(mut self, filter: StreamFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_cursor(mut self, cursor: impl Into<String>) -> Self {
        self.cursor = Some(cursor.into());
        self
    }
}

/// Lifetimes of cached feed pages and item details.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheSettings {
    pub stream_ttl: Duration,
    pub item_ttl: Duration,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            stream_ttl: Duration::from_secs(120),
            item_ttl: Duration::from_secs(300),
        }
    }
}

/// Cache key of a feed page.
///
/// The user id is length-prefixed so that ids containing `:` cannot
/// produce another user's key. The effective page size is part of the key
/// so that pages of different sizes never answer for each other. Cursor
/// tokens are URL-safe base64 and never contain `:`.
pub fn stream_key(user_id: &str, filter: StreamFilter, limit: usize, cursor: Option<&str>) -> String {
    let cursor = match cursor {
        Some(c) if !c.is_empty() => c,
        _ => "none",
    };
    format!("stream:{}:{}:{}:{}:{}", user_id.len(), user_id, filter, limit, cursor)
}

/// Cache key of an item detail, scoped to the requesting user.
///
/// Both ids are free text, so the user id is length-prefixed to keep the
/// split between the two unambiguous.
pub fn item_key(user_id: &str, item_id: &str) -> String {
    format!("item:{}:{}:{}", user_id.len(), user_id, item_id)
}

/// Parses a raw filter token. Only `all`, `high` and `unread` are accepted.
pub fn validate_filter(raw: &str) -> StreamResult<StreamFilter> {
    raw.parse()
        .map_err(|_| StreamError::InvalidFilter(raw.to_string()))
}

//=========================================================================================
// The Service
//=========================================================================================

#[derive(Clone)]
pub struct StreamService {
    engine: QueryEngine,
    assembler: DetailAssembler,
    cache: Arc<dyn CacheStore>,
    settings: CacheSettings,
}

impl StreamService {
    pub fn new(store: Arc<dyn ItemStore>, cache: Arc<dyn CacheStore>, settings: CacheSettings) -> Self {
        Self {
            engine: QueryEngine::new(store.clone()),
            assembler: DetailAssembler::new(store),
            cache,
            settings,
        }
    }

    pub fn settings(&self) -> &CacheSettings {
        &self.settings
    }

    /// Returns one page of the user's feed, from cache when possible.
    pub async fn get_stream(&self, request: &StreamRequest) -> StreamResult<StreamPage> {
        // Reject a bad token before any I/O, cache included.
        let after = parse_cursor(request.cursor.as_deref())?;
        let limit = clamp_limit(request.limit);
        let key = stream_key(&request.user_id, request.filter, limit, request.cursor.as_deref());

        if let Some(page) = self.read_cached::<StreamPage>(&key).await {
            debug!(key = %key, "Cache hit for stream");
            return Ok(page);
        }
        debug!(key = %key, "Cache miss for stream");

        let page = self
            .engine
            .fetch_page_after(&request.user_id, request.filter, after, limit)
            .await?;

        self.write_cached(&key, &page, self.settings.stream_ttl).await;
        Ok(page)
    }

    /// Returns the full detail of one item, or `None` if the user has no such item.
    ///
    /// Absent results are not cached.
    pub async fn get_stream_item(&self, user_id: &str, item_id: &str) -> StreamResult<Option<PriorityItem>> {
        let key = item_key(user_id, item_id);

        if let Some(item) = self.read_cached::<PriorityItem>(&key).await {
            debug!(key = %key, "Cache hit for item");
            return Ok(Some(item));
        }
        debug!(key = %key, "Cache miss for item");

        let Some(item) = self.assembler.fetch_detail(user_id, item_id).await? else {
            return Ok(None);
        };

        self.write_cached(&key, &item, self.settings.item_ttl).await;
        Ok(Some(item))
    }

    async fn read_cached<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.cache.get(key).await {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(key, error = %e, "Cache get error");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "Discarding undecodable cache entry");
                None
            }
        }
    }

    async fn write_cached<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key, error = %e, "Failed to serialize value for cache");
                return;
            }
        };
        if let Err(e) = self.cache.set(key, raw, ttl).await {
            warn!(key, error = %e, "Failed to write cache entry");
        }
    }
}
