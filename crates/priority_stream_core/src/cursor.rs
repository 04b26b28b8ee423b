//! crates/priority_stream_core/src/cursor.rs
//!
//! Opaque pagination tokens.
//!
//! A cursor is the `(timestamp, id)` sort key of the last item on a page.
//! On the wire it is URL-safe base64 (no padding) of `{"t": .., "id": ..}`,
//! so it can travel in a query string without escaping. Decoding is purely
//! structural: a token issued for another user or filter is still accepted.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{StreamError, StreamResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    #[serde(rename = "t")]
    pub timestamp: DateTime<Utc>,
    pub id: String,
}

impl Cursor {
    pub fn new(timestamp: DateTime<Utc>, id: impl Into<String>) -> Self {
        Self {
            timestamp,
            id: id.into(),
        }
    }

    /// Encodes the cursor into a transport-safe token.
    pub fn encode(&self) -> String {
        let mut body = Map::new();
        body.insert(
            "t".to_string(),
            Value::String(self.timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        );
        body.insert("id".to_string(), Value::String(self.id.clone()));
        URL_SAFE_NO_PAD.encode(Value::Object(body).to_string())
    }

    /// Decodes a token produced by [`Cursor::encode`].
    pub fn decode(token: &str) -> StreamResult<Self> {
        let bytes = URL_SAFE_NO_PAD
            .decode(token.as_bytes())
            .map_err(|e| StreamError::InvalidCursor(format!("not valid base64: {}", e)))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| StreamError::InvalidCursor(format!("malformed cursor data: {}", e)))
    }

    /// Whether a row with this sort key lies strictly past the cursor in
    /// feed order (`timestamp DESC, id DESC`).
    pub fn is_past(&self, timestamp: &DateTime<Utc>, id: &str) -> bool {
        (timestamp, id) < (&self.timestamp, self.id.as_str())
    }
}
