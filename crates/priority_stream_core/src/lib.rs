pub mod cursor;
pub mod detail;
pub mod domain;
pub mod error;
pub mod ports;
pub mod query;
pub mod service;

pub use cursor::Cursor;
pub use domain::{
    AiInsight, Attachment, CalendarEvent, InsightType, Message, MessageBody, Priority,
    PriorityItem, SenderType, SocialContent, SocialPlatform, SocialStats, SourceType,
    StreamFilter, StreamPage, User,
};
pub use error::{StreamError, StreamResult};
pub use ports::{CacheStore, ItemQuery, ItemStore, MessageRecord, PortError, PortResult};
pub use service::{validate_filter, CacheSettings, StreamRequest, StreamService};
