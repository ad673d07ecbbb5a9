use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::conversation::ConversationSummary;

/// Wire names of the live conversation events. Clients bind on these.
pub const CONVERSATION_NEW: &str = "conversation:new";
pub const CONVERSATION_UPDATE: &str = "conversation:update";
pub const CONVERSATION_REMOVE: &str = "conversation:remove";

#[derive(Debug, Error)]
pub enum EventError {
    #[error("unknown event: {0}")]
    UnknownEvent(String),

    #[error("malformed payload for {event}: {source}")]
    MalformedPayload {
        event: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A live event delivered on a user's channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiveEvent {
    New(ConversationSummary),
    Update(ConversationSummary),
    Remove(ConversationSummary),
}

impl LiveEvent {
    pub const NAMES: [&'static str; 3] = [CONVERSATION_NEW, CONVERSATION_UPDATE, CONVERSATION_REMOVE];

    pub fn name(&self) -> &'static str {
        match self {
            LiveEvent::New(_) => CONVERSATION_NEW,
            LiveEvent::Update(_) => CONVERSATION_UPDATE,
            LiveEvent::Remove(_) => CONVERSATION_REMOVE,
        }
    }

    pub fn conversation(&self) -> &ConversationSummary {
        match self {
            LiveEvent::New(c) | LiveEvent::Update(c) | LiveEvent::Remove(c) => c,
        }
    }

    /// Build an event from its wire name and JSON payload
    pub fn from_parts(event: &str, data: serde_json::Value) -> Result<Self, EventError> {
        let build: fn(ConversationSummary) -> LiveEvent = match event {
            CONVERSATION_NEW => LiveEvent::New,
            CONVERSATION_UPDATE => LiveEvent::Update,
            CONVERSATION_REMOVE => LiveEvent::Remove,
            other => return Err(EventError::UnknownEvent(other.to_string())),
        };

        serde_json::from_value(data)
            .map(build)
            .map_err(|source| EventError::MalformedPayload {
                event: event.to_string(),
                source,
            })
    }
}

/// Message body published on a channel: `{"event": "...", "data": {...}}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub event: String,
    pub data: serde_json::Value,
}

impl EventEnvelope {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn into_event(self) -> Result<LiveEvent, EventError> {
        LiveEvent::from_parts(&self.event, self.data)
    }
}

impl TryFrom<&LiveEvent> for EventEnvelope {
    type Error = serde_json::Error;

    fn try_from(event: &LiveEvent) -> Result<Self, Self::Error> {
        Ok(Self {
            event: event.name().to_string(),
            data: serde_json::to_value(event.conversation())?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn summary() -> ConversationSummary {
        let now = Utc::now();
        ConversationSummary {
            id: Uuid::new_v4(),
            name: Some("team".into()),
            is_group: true,
            created_at: now,
            last_message_at: now,
            user_ids: vec![],
            users: vec![],
            latest_message: None,
        }
    }

    #[test]
    fn test_event_names_are_stable() {
        let conv = summary();
        assert_eq!(LiveEvent::New(conv.clone()).name(), "conversation:new");
        assert_eq!(LiveEvent::Update(conv.clone()).name(), "conversation:update");
        assert_eq!(LiveEvent::Remove(conv).name(), "conversation:remove");
    }

    #[test]
    fn test_envelope_carries_event_name_and_payload() {
        let conv = summary();
        let envelope = EventEnvelope::try_from(&LiveEvent::Remove(conv.clone())).unwrap();
        let raw = envelope.to_json().unwrap();

        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["event"], "conversation:remove");
        assert_eq!(value["data"]["id"], conv.id.to_string());

        let decoded = EventEnvelope::from_json(&raw).unwrap().into_event().unwrap();
        assert_eq!(decoded, LiveEvent::Remove(conv));
    }

    #[test]
    fn test_unknown_event_rejected() {
        let err = LiveEvent::from_parts("message:new", serde_json::json!({})).unwrap_err();
        assert!(matches!(err, EventError::UnknownEvent(name) if name == "message:new"));
    }

    #[test]
    fn test_malformed_payload_rejected() {
        let err = LiveEvent::from_parts(CONVERSATION_NEW, serde_json::json!({"id": 5})).unwrap_err();
        assert!(matches!(err, EventError::MalformedPayload { .. }));
    }
}
