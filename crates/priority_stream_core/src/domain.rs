//! crates/priority_stream_core/src/domain.rs
//!
//! Defines the read-only projections served by the priority stream.
//!
//! The serde representation of these types is both the wire format of the
//! HTTP surface and the value format stored in the cache, so field names and
//! enum literals here are part of the public contract.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

//=========================================================================================
// Closed Enumerations
//=========================================================================================

/// Returned when a stored literal does not name a known enum variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} value '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// The platform a priority item originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Email,
    WhatsApp,
    Slack,
    Teams,
    Calendar,
    Task,
    YouTube,
    LinkedIn,
    Twitter,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Email => "email",
            SourceType::WhatsApp => "whatsapp",
            SourceType::Slack => "slack",
            SourceType::Teams => "teams",
            SourceType::Calendar => "calendar",
            SourceType::Task => "task",
            SourceType::YouTube => "youtube",
            SourceType::LinkedIn => "linkedin",
            SourceType::Twitter => "twitter",
        }
    }
}

impl FromStr for SourceType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email" => Ok(SourceType::Email),
            "whatsapp" => Ok(SourceType::WhatsApp),
            "slack" => Ok(SourceType::Slack),
            "teams" => Ok(SourceType::Teams),
            "calendar" => Ok(SourceType::Calendar),
            "task" => Ok(SourceType::Task),
            "youtube" => Ok(SourceType::YouTube),
            "linkedin" => Ok(SourceType::LinkedIn),
            "twitter" => Ok(SourceType::Twitter),
            other => Err(UnknownVariant::new("source", other)),
        }
    }
}

/// The urgency level of a priority item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

impl FromStr for Priority {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            other => Err(UnknownVariant::new("priority", other)),
        }
    }
}

/// Who sent a message within a thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum SenderType {
    User,
    Other,
    System,
}

impl FromStr for SenderType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(SenderType::User),
            "other" => Ok(SenderType::Other),
            "system" => Ok(SenderType::System),
            other => Err(UnknownVariant::new("sender type", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum InsightType {
    Suggestion,
    Analysis,
    Draft,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum SocialPlatform {
    YouTube,
    LinkedIn,
    Twitter,
}

/// The feed filters a caller may request.
///
/// Only the three literal tokens `all`, `high` and `unread` are accepted,
/// case-sensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum StreamFilter {
    #[default]
    All,
    High,
    Unread,
}

impl StreamFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamFilter::All => "all",
            StreamFilter::High => "high",
            StreamFilter::Unread => "unread",
        }
    }

    /// Whether an item passes this filter.
    pub fn matches(&self, item: &PriorityItem) -> bool {
        match self {
            StreamFilter::All => true,
            StreamFilter::High => item.priority == Priority::High,
            StreamFilter::Unread => item.is_unread,
        }
    }
}

impl fmt::Display for StreamFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StreamFilter {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(StreamFilter::All),
            "high" => Ok(StreamFilter::High),
            "unread" => Ok(StreamFilter::Unread),
            other => Err(UnknownVariant::new("filter", other)),
        }
    }
}

//=========================================================================================
// Entities
//=========================================================================================

/// A participant in an item or the sender of a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub id: String,
    pub name: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub id: String,
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub attendees: Vec<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meeting_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SocialStats {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub views: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub likes: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shares: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct SocialContent {
    pub id: String,
    pub platform: SocialPlatform,
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub stats: SocialStats,
    pub url: String,
}

/// An AI-generated suggestion, analysis or draft reply attached to a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct AiInsight {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: InsightType,
    pub label: String,
    pub content: String,
    pub is_draft: bool,
}

/// The content-type specific payload of a message.
///
/// Serialised with a `contentType` tag next to the other message fields, so
/// an event payload can only ever appear on an `event` message and a social
/// payload only on a `social` one. The payload itself stays optional because
/// a blob that fails to decode is dropped rather than failing the thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(tag = "contentType", rename_all = "lowercase")]
pub enum MessageBody {
    Text,
    Event {
        #[serde(
            rename = "eventDetails",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        event_details: Option<CalendarEvent>,
    },
    Social {
        #[serde(
            rename = "socialContent",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        social_content: Option<SocialContent>,
    },
}

impl MessageBody {
    pub fn content_type(&self) -> &'static str {
        match self {
            MessageBody::Text => "text",
            MessageBody::Event { .. } => "event",
            MessageBody::Social { .. } => "social",
        }
    }
}

/// A single message in an item's thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub sender_type: SenderType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_info: Option<User>,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub body: MessageBody,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ai_insights: Vec<AiInsight>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_content_html: Option<String>,
}

/// A single entry of the unified priority stream.
///
/// `messages` is only populated in the detail view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct PriorityItem {
    pub id: String,
    pub title: String,
    pub source: SourceType,
    pub priority: Priority,
    pub is_unread: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub participants: Vec<User>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<Message>,
}

/// One page of the stream. `next_cursor` is `None` on the last page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct StreamPage {
    pub data: Vec<PriorityItem>,
    pub next_cursor: Option<String>,
}
