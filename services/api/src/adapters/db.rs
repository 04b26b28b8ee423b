//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `ItemStore` port from the core crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use priority_stream_core::ports::{ItemQuery, ItemStore, MessageRecord, PortError, PortResult};
use priority_stream_core::domain::UnknownVariant;
use priority_stream_core::{
    Priority, PriorityItem, SenderType, SourceType, StreamFilter, User,
};
use serde_json::Value;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use tracing::debug;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `ItemStore` port.
#[derive(Clone)]
pub struct PgItemStore {
    pool: PgPool,
}

impl PgItemStore {
    /// Creates a new `PgItemStore`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

/// Connection-level failures are reported as `Unavailable`, everything else
/// as `Unexpected`.
fn map_sqlx_error(e: sqlx::Error) -> PortError {
    match e {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            PortError::Unavailable(e.to_string())
        }
        other => PortError::Unexpected(other.to_string()),
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

const ITEM_COLUMNS: &str =
    "SELECT id, title, source, priority, is_unread, snippet, item_timestamp FROM priority_items";

#[derive(FromRow)]
struct ItemRecord {
    id: String,
    title: String,
    source: String,
    priority: String,
    is_unread: bool,
    snippet: Option<String>,
    item_timestamp: DateTime<Utc>,
}
impl ItemRecord {
    fn to_domain(self) -> PortResult<PriorityItem> {
        let source: SourceType = self.source.parse().map_err(|e| unknown_literal(&self.id, e))?;
        let priority: Priority = self.priority.parse().map_err(|e| unknown_literal(&self.id, e))?;
        Ok(PriorityItem {
            id: self.id,
            title: self.title,
            source,
            priority,
            is_unread: self.is_unread,
            snippet: self.snippet,
            timestamp: self.item_timestamp,
            participants: Vec::new(),
            messages: Vec::new(),
        })
    }
}

fn unknown_literal(row_id: &str, e: UnknownVariant) -> PortError {
    PortError::Unexpected(format!("row {}: {}", row_id, e))
}

#[derive(FromRow)]
struct UserRecord {
    id: String,
    name: String,
    email: Option<String>,
    avatar_url: Option<String>,
}
impl UserRecord {
    fn to_domain(self) -> User {
        User {
            id: self.id,
            name: self.name,
            email: self.email,
            avatar_url: self.avatar_url,
        }
    }
}

#[derive(FromRow)]
struct MessageRow {
    id: String,
    sender_type: String,
    content_type: String,
    content: String,
    full_content_html: Option<String>,
    message_timestamp: DateTime<Utc>,
    event_details: Option<Value>,
    social_details: Option<Value>,
    attachments: Option<Value>,
    ai_insights: Option<Value>,
    sender_user_id: Option<String>,
    sender_name: Option<String>,
    sender_email: Option<String>,
    sender_avatar_url: Option<String>,
}
impl MessageRow {
    fn to_domain(self) -> PortResult<MessageRecord> {
        let sender_type: SenderType = self
            .sender_type
            .parse()
            .map_err(|e| unknown_literal(&self.id, e))?;
        Ok(MessageRecord {
            id: self.id,
            sender_type,
            content_type: self.content_type,
            content: self.content,
            full_content_html: self.full_content_html,
            timestamp: self.message_timestamp,
            sender_id: self.sender_user_id,
            sender_name: self.sender_name,
            sender_email: self.sender_email,
            sender_avatar_url: self.sender_avatar_url,
            event_details: self.event_details,
            social_details: self.social_details,
            attachments: self.attachments,
            ai_insights: self.ai_insights,
        })
    }
}

/// Builds the keyset query for one feed page.
fn build_item_query(query: &ItemQuery) -> QueryBuilder<'_, Postgres> {
    let mut builder = QueryBuilder::new(ITEM_COLUMNS);
    builder.push(" WHERE user_id = ").push_bind(&query.user_id);

    match query.filter {
        StreamFilter::All => {}
        StreamFilter::High => {
            builder.push(" AND priority = ").push_bind(Priority::High.as_str());
        }
        StreamFilter::Unread => {
            builder.push(" AND is_unread = TRUE");
        }
    }

    if let Some(after) = &query.after {
        builder
            .push(" AND (item_timestamp, id) < (")
            .push_bind(after.timestamp)
            .push(", ")
            .push_bind(&after.id)
            .push(")");
    }

    builder
        .push(" ORDER BY item_timestamp DESC, id DESC LIMIT ")
        .push_bind(query.fetch_limit as i64);
    builder
}

//=========================================================================================
// `ItemStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl ItemStore for PgItemStore {
    async fn query_items(&self, query: &ItemQuery) -> PortResult<Vec<PriorityItem>> {
        let mut builder = build_item_query(query);
        debug!(sql = builder.sql(), "Querying priority items");

        let records = builder
            .build_query_as::<ItemRecord>()
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        records.into_iter().map(ItemRecord::to_domain).collect()
    }

    async fn find_item(&self, user_id: &str, item_id: &str) -> PortResult<Option<PriorityItem>> {
        let record = sqlx::query_as::<_, ItemRecord>(&format!(
            "{} WHERE id = $1 AND user_id = $2",
            ITEM_COLUMNS
        ))
        .bind(item_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        record.map(ItemRecord::to_domain).transpose()
    }

    async fn participants_for_item(&self, item_id: &str) -> PortResult<Vec<User>> {
        let records = sqlx::query_as::<_, UserRecord>(
            "SELECT u.id, u.name, u.email, u.avatar_url \
             FROM users u \
             JOIN priority_item_participants pip ON u.id = pip.user_id \
             WHERE pip.item_id = $1 \
             ORDER BY u.name ASC",
        )
        .bind(item_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(records.into_iter().map(UserRecord::to_domain).collect())
    }

    async fn messages_for_item(&self, item_id: &str) -> PortResult<Vec<MessageRecord>> {
        let rows = sqlx::query_as::<_, MessageRow>(
            "SELECT m.id, m.sender_type, m.content_type, m.content, \
                    m.full_content_html, m.message_timestamp, \
                    m.event_details, m.social_details, m.attachments, m.ai_insights, \
                    u.id AS sender_user_id, u.name AS sender_name, \
                    u.email AS sender_email, u.avatar_url AS sender_avatar_url \
             FROM messages m \
             LEFT JOIN users u ON m.sender_id = u.id \
             WHERE m.item_id = $1 \
             ORDER BY m.message_timestamp ASC, m.id ASC",
        )
        .bind(item_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(MessageRow::to_domain).collect()
    }
}
