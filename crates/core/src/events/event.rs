use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::events::{EventPayload, SessionId};

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
}

/// One observed occurrence, stamped with the ambient context at emission.
///
/// Events are never mutated after construction; the pipeline shares them as
/// `Arc<TelemetryEvent>`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawEvent")]
pub struct TelemetryEvent {
    pub page: Option<String>,
    /// Milliseconds since the unix epoch.
    pub timestamp: u64,
    pub user_agent: String,
    pub referrer: String,
    pub session_id: SessionId,
    pub payload: EventPayload,
}

impl TelemetryEvent {
    pub fn name(&self) -> &str {
        self.payload.name()
    }
}

#[derive(Serialize)]
struct WireEvent<'a> {
    event: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    page: Option<&'a str>,
    timestamp: u64,
    user_agent: &'a str,
    referrer: &'a str,
    session_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<Value>,
}

impl Serialize for TelemetryEvent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let metadata = self
            .payload
            .metadata()
            .map_err(serde::ser::Error::custom)?;

        WireEvent {
            event: self.payload.name(),
            page: self.page.as_deref(),
            timestamp: self.timestamp,
            user_agent: &self.user_agent,
            referrer: &self.referrer,
            session_id: self.session_id.as_str(),
            metadata,
        }
        .serialize(serializer)
    }
}

/// Collector request body before validation. Every field is optional so the
/// missing ones can be reported by name.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawEvent {
    pub event: Option<String>,
    pub page: Option<String>,
    pub timestamp: Option<u64>,
    #[serde(default)]
    pub user_agent: String,
    #[serde(default)]
    pub referrer: String,
    pub session_id: Option<String>,
    pub metadata: Option<Value>,
}

impl TryFrom<RawEvent> for TelemetryEvent {
    type Error = DecodeError;

    fn try_from(raw: RawEvent) -> Result<Self, Self::Error> {
        let name = raw
            .event
            .filter(|e| !e.is_empty())
            .ok_or(DecodeError::MissingField("event"))?;
        let timestamp = raw
            .timestamp
            .filter(|ts| *ts > 0)
            .ok_or(DecodeError::MissingField("timestamp"))?;
        let session_id = raw
            .session_id
            .filter(|s| !s.is_empty())
            .ok_or(DecodeError::MissingField("session_id"))?;

        Ok(Self {
            page: raw.page,
            timestamp,
            user_agent: raw.user_agent,
            referrer: raw.referrer,
            session_id: SessionId::from(session_id),
            payload: EventPayload::from_parts(name, raw.metadata),
        })
    }
}
