//! crates/priority_stream_core/src/query.rs
//!
//! The ordered query engine: filtered, keyset-paginated reads of a user's feed.

use std::sync::Arc;
use tracing::debug;

use crate::cursor::Cursor;
use crate::domain::{StreamFilter, StreamPage};
use crate::error::StreamResult;
use crate::ports::{ItemQuery, ItemStore};

/// Page size used when the caller gives none, or a non-positive one.
pub const DEFAULT_LIMIT: usize = 20;
/// Largest page a caller may request.
pub const MAX_LIMIT: usize = 100;

/// Clamps a requested page size into `[1, MAX_LIMIT]`.
pub fn clamp_limit(requested: Option<i64>) -> usize {
    match requested {
        Some(n) if n > MAX_LIMIT as i64 => MAX_LIMIT,
        Some(n) if n > 0 => n as usize,
        _ => DEFAULT_LIMIT,
    }
}

/// Decodes an optional pagination token. An empty token means the first page.
pub fn parse_cursor(token: Option<&str>) -> StreamResult<Option<Cursor>> {
    match token {
        Some(token) if !token.is_empty() => Cursor::decode(token).map(Some),
        _ => Ok(None),
    }
}

/// Builds and runs feed queries against an [`ItemStore`].
#[derive(Clone)]
pub struct QueryEngine {
    store: Arc<dyn ItemStore>,
}

impl QueryEngine {
    pub fn new(store: Arc<dyn ItemStore>) -> Self {
        Self { store }
    }

    /// Fetches one page of the feed.
    ///
    /// A malformed `cursor` is rejected before the store is touched.
    pub async fn fetch_page(
        &self,
        user_id: &str,
        filter: StreamFilter,
        cursor: Option<&str>,
        limit: Option<i64>,
    ) -> StreamResult<StreamPage> {
        let after = parse_cursor(cursor)?;
        self.fetch_page_after(user_id, filter, after, clamp_limit(limit))
            .await
    }

    /// Fetches the page that follows `after` (or the first page).
    ///
    /// Asks the store for one row more than `limit`; if it comes back the page
    /// is truncated and the last retained row becomes the next cursor.
    pub async fn fetch_page_after(
        &self,
        user_id: &str,
        filter: StreamFilter,
        after: Option<Cursor>,
        limit: usize,
    ) -> StreamResult<StreamPage> {
        let limit = limit.clamp(1, MAX_LIMIT);
        let query = ItemQuery {
            user_id: user_id.to_string(),
            filter,
            after,
            fetch_limit: limit + 1,
        };
        let mut items = self.store.query_items(&query).await?;

        let next_cursor = if items.len() > limit {
            items.truncate(limit);
            items
                .last()
                .map(|last| Cursor::new(last.timestamp, last.id.clone()).encode())
        } else {
            None
        };

        for item in items.iter_mut() {
            item.participants = self.store.participants_for_item(&item.id).await?;
        }

        debug!(
            user_id,
            filter = %filter,
            returned = items.len(),
            has_more = next_cursor.is_some(),
            "Fetched stream page"
        );

        Ok(StreamPage {
            data: items,
            next_cursor,
        })
    }
}
