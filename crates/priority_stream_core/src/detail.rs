//! crates/priority_stream_core/src/detail.rs
//!
//! The detail assembler: hydrates a single item with its participants and
//! its full message thread.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

use crate::domain::{Message, MessageBody, PriorityItem, User};
use crate::error::StreamResult;
use crate::ports::{ItemStore, MessageRecord};

#[derive(Clone)]
pub struct DetailAssembler {
    store: Arc<dyn ItemStore>,
}

impl DetailAssembler {
    pub fn new(store: Arc<dyn ItemStore>) -> Self {
        Self { store }
    }

    /// Loads `item_id` as seen by `user_id`. Returns `Ok(None)` when the user
    /// has no such item.
    pub async fn fetch_detail(
        &self,
        user_id: &str,
        item_id: &str,
    ) -> StreamResult<Option<PriorityItem>> {
        let Some(mut item) = self.store.find_item(user_id, item_id).await? else {
            return Ok(None);
        };

        item.participants = self.store.participants_for_item(item_id).await?;

        let records = self.store.messages_for_item(item_id).await?;
        let mut messages: Vec<Message> = records.into_iter().map(assemble_message).collect();
        messages.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        item.messages = messages;

        Ok(Some(item))
    }
}

/// Turns a stored message row into a domain message.
///
/// Each structured blob is decoded on its own; one that fails to decode is
/// logged and left empty without affecting the rest of the message.
pub fn assemble_message(record: MessageRecord) -> Message {
    let sender_info = match (record.sender_id, record.sender_name) {
        (Some(id), Some(name)) => Some(User {
            id,
            name,
            email: record.sender_email,
            avatar_url: record.sender_avatar_url,
        }),
        _ => None,
    };

    let body = match record.content_type.as_str() {
        "event" => MessageBody::Event {
            event_details: decode_blob(&record.id, "eventDetails", record.event_details),
        },
        "social" => MessageBody::Social {
            social_content: decode_blob(&record.id, "socialContent", record.social_details),
        },
        "text" => MessageBody::Text,
        other => {
            warn!(message_id = %record.id, content_type = other, "Unknown content type, treating as text");
            MessageBody::Text
        }
    };

    Message {
        attachments: decode_blob(&record.id, "attachments", record.attachments)
            .unwrap_or_default(),
        ai_insights: decode_blob(&record.id, "aiInsights", record.ai_insights)
            .unwrap_or_default(),
        id: record.id,
        sender_type: record.sender_type,
        sender_info,
        content: record.content,
        timestamp: record.timestamp,
        body,
        full_content_html: record.full_content_html,
    }
}

fn decode_blob<T: DeserializeOwned>(message_id: &str, field: &str, blob: Option<Value>) -> Option<T> {
    match blob {
        None | Some(Value::Null) => None,
        Some(value) => match serde_json::from_value(value) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                warn!(message_id, field, error = %e, "Dropping malformed message payload");
                None
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SenderType;
    use chrono::Utc;
    use serde_json::json;

    fn record(content_type: &str) -> MessageRecord {
        MessageRecord {
            id: "msg-1".to_string(),
            sender_type: SenderType::Other,
            content_type: content_type.to_string(),
            content: "body".to_string(),
            full_content_html: None,
            timestamp: Utc::now(),
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

    #[test]
    fn sender_requires_id_and_name() {
        let mut only_id = record("text");
        only_id.sender_id = Some("u-1".to_string());
        assert!(assemble_message(only_id).sender_info.is_none());

        let mut full = record("text");
        full.sender_id = Some("u-1".to_string());
        full.sender_name = Some("Ada".to_string());
        full.sender_email = Some("ada@example.com".to_string());
        let sender = assemble_message(full).sender_info.unwrap();
        assert_eq!(sender.name, "Ada");
        assert_eq!(sender.email.as_deref(), Some("ada@example.com"));
    }

    #[test]
    fn event_blob_is_decoded_for_event_messages() {
        let mut rec = record("event");
        rec.event_details = Some(json!({
            "id": "ev-1",
            "title": "Standup",
            "startTime": "2026-01-01T09:00:00Z",
            "endTime": "2026-01-01T09:15:00Z",
            "attendees": [{ "id": "u-1", "name": "Ada" }]
        }));

        match assemble_message(rec).body {
            MessageBody::Event {
                event_details: Some(event),
            } => {
                assert_eq!(event.title, "Standup");
                assert_eq!(event.attendees.len(), 1);
            }
            other => panic!("unexpected body {other:?}"),
        }
    }

    #[test]
    fn malformed_lists_fall_back_to_empty() {
        let mut rec = record("text");
        rec.attachments = Some(json!({ "not": "a list" }));
        rec.ai_insights = Some(json!([
            { "id": "i-1", "type": "draft", "label": "Reply", "content": "Sure", "isDraft": true }
        ]));

        let message = assemble_message(rec);
        assert!(message.attachments.is_empty());
        assert_eq!(message.ai_insights.len(), 1);
        assert!(message.ai_insights[0].is_draft);
    }

    #[test]
    fn unknown_content_type_is_text() {
        assert_eq!(assemble_message(record("video")).body, MessageBody::Text);
    }
}
