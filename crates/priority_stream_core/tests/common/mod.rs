//! Shared test doubles: an in-memory item store and a counting cache.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use priority_stream_core::{
    CacheStore, ItemQuery, ItemStore, MessageRecord, PortError, PortResult, Priority,
    PriorityItem, SenderType, SourceType, User,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap()
}

pub fn hours_before_t0(hours: i64) -> DateTime<Utc> {
    t0() - ChronoDuration::hours(hours)
}

pub fn item(id: &str, timestamp: DateTime<Utc>, priority: Priority, is_unread: bool) -> PriorityItem {
    PriorityItem {
        id: id.to_string(),
        title: format!("Title of {id}"),
        source: SourceType::Email,
        priority,
        is_unread,
        snippet: None,
        timestamp,
        participants: vec![],
        messages: vec![],
    }
}

pub fn user(id: &str) -> User {
    User {
        id: id.to_string(),
        name: format!("Name of {id}"),
        email: None,
        avatar_url: None,
    }
}

pub fn message(id: &str, timestamp: DateTime<Utc>, content_type: &str) -> MessageRecord {
    MessageRecord {
        id: id.to_string(),
        sender_type: SenderType::Other,
        content_type: content_type.to_string(),
        content: format!("content of {id}"),
        full_content_html: None,
        timestamp,
        sender_id: None,
        sender_name: None,
        sender_email: None,
        sender_avatar_url: None,
        event_details: None,
        social_details: None,
        attachments: None,
        ai_insights: None,
    }
}

//=========================================================================================
// In-memory item store
//=========================================================================================

#[derive(Default)]
pub struct MemoryItemStore {
    items: Vec<(String, PriorityItem)>,
    participants: HashMap<String, Vec<User>>,
    messages: HashMap<String, Vec<MessageRecord>>,
    delay: Option<Duration>,
    failing: AtomicBool,
    pub query_calls: AtomicUsize,
    pub completed_queries: AtomicUsize,
    pub find_calls: AtomicUsize,
    pub participant_calls: AtomicUsize,
    pub message_calls: AtomicUsize,
}

impl MemoryItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_item(mut self, user_id: &str, item: PriorityItem) -> Self {
        self.items.push((user_id.to_string(), item));
        self
    }

    pub fn with_participants(mut self, item_id: &str, users: Vec<User>) -> Self {
        self.participants.insert(item_id.to_string(), users);
        self
    }

    pub fn with_messages(mut self, item_id: &str, messages: Vec<MessageRecord>) -> Self {
        self.messages.insert(item_id.to_string(), messages);
        self
    }

    /// Every feed query sleeps for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn fail(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    pub fn total_calls(&self) -> usize {
        self.query_calls.load(Ordering::SeqCst)
            + self.find_calls.load(Ordering::SeqCst)
            + self.participant_calls.load(Ordering::SeqCst)
            + self.message_calls.load(Ordering::SeqCst)
    }

    fn check(&self) -> PortResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(PortError::Unavailable("connection refused".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ItemStore for MemoryItemStore {
    async fn query_items(&self, query: &ItemQuery) -> PortResult<Vec<PriorityItem>> {
        self.query_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.check()?;

        let mut rows: Vec<PriorityItem> = self
            .items
            .iter()
            .filter(|(owner, _)| *owner == query.user_id)
            .map(|(_, item)| item)
            .filter(|item| query.filter.matches(item))
            .filter(|item| {
                query
                    .after
                    .as_ref()
                    .map_or(true, |cursor| cursor.is_past(&item.timestamp, &item.id))
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| (b.timestamp, &b.id).cmp(&(a.timestamp, &a.id)));
        rows.truncate(query.fetch_limit);

        self.completed_queries.fetch_add(1, Ordering::SeqCst);
        Ok(rows)
    }

    async fn find_item(&self, user_id: &str, item_id: &str) -> PortResult<Option<PriorityItem>> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self
            .items
            .iter()
            .find(|(owner, item)| owner == user_id && item.id == item_id)
            .map(|(_, item)| item.clone()))
    }

    async fn participants_for_item(&self, item_id: &str) -> PortResult<Vec<User>> {
        self.participant_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.participants.get(item_id).cloned().unwrap_or_default())
    }

    async fn messages_for_item(&self, item_id: &str) -> PortResult<Vec<MessageRecord>> {
        self.message_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.messages.get(item_id).cloned().unwrap_or_default())
    }
}

//=========================================================================================
// Counting cache
//=========================================================================================

#[derive(Default)]
pub struct CountingCache {
    entries: Mutex<HashMap<String, (String, Duration)>>,
    failing: AtomicBool,
    pub gets: AtomicUsize,
    pub sets: AtomicUsize,
}

impl CountingCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    pub fn insert_raw(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), (value.to_string(), Duration::from_secs(60)));
    }

    pub fn entry(&self, key: &str) -> Option<(String, Duration)> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}

#[async_trait]
impl CacheStore for CountingCache {
    async fn get(&self, key: &str) -> PortResult<Option<String>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(PortError::Unavailable("cache down".to_string()));
        }
        Ok(self.entries.lock().unwrap().get(key).map(|(v, _)| v.clone()))
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> PortResult<()> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(PortError::Unavailable("cache down".to_string()));
        }
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), (value, ttl));
        Ok(())
    }

    async fn delete(&self, keys: &[String]) -> PortResult<()> {
        let mut entries = self.entries.lock().unwrap();
        for key in keys {
            entries.remove(key);
        }
        Ok(())
    }

    async fn ping(&self) -> PortResult<()> {
        Ok(())
    }
}
