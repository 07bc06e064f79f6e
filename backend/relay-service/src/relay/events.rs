//! Relay event contract
//!
//! Frames are JSON text `{"event": <kind>, "data": <payload>}`. Inbound
//! frames may use the legacy kind names (`new-post`, `new-comment`,
//! `new-like`); outbound frames always carry the canonical name.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("frame is not a JSON event envelope: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("unknown event kind '{0}'")]
    UnknownKind(String),

    #[error("invalid payload for '{kind}': {source}")]
    InvalidPayload {
        kind: EventKind,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode event: {0}")]
    Encode(#[source] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    PostCreated,
    CommentCreated,
    LikeUpdated,
}

impl EventKind {
    pub const ALL: [EventKind; 3] = [
        EventKind::PostCreated,
        EventKind::CommentCreated,
        EventKind::LikeUpdated,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::PostCreated => "post-created",
            EventKind::CommentCreated => "comment-created",
            EventKind::LikeUpdated => "like-updated",
        }
    }

    /// Canonical or legacy name to kind
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "post-created" | "new-post" => Some(EventKind::PostCreated),
            "comment-created" | "new-comment" => Some(EventKind::CommentCreated),
            "like-updated" | "new-like" => Some(EventKind::LikeUpdated),
            _ => None,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentCreated {
    pub post_id: String,
    pub comment: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeUpdated {
    pub post_id: String,
    pub likes: i64,
}

/// Every event the relay forwards
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data")]
pub enum RelayEvent {
    /// The created post, passed through untouched
    #[serde(rename = "post-created")]
    PostCreated(Value),
    #[serde(rename = "comment-created")]
    CommentCreated(CommentCreated),
    #[serde(rename = "like-updated")]
    LikeUpdated(LikeUpdated),
}

#[derive(Deserialize)]
struct Envelope {
    event: String,
    #[serde(default)]
    data: Value,
}

impl RelayEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            RelayEvent::PostCreated(_) => EventKind::PostCreated,
            RelayEvent::CommentCreated(_) => EventKind::CommentCreated,
            RelayEvent::LikeUpdated(_) => EventKind::LikeUpdated,
        }
    }

    /// Id of the post the event is about, when the payload names one
    pub fn post_id(&self) -> Option<&str> {
        match self {
            RelayEvent::PostCreated(post) => post.get("id").and_then(Value::as_str),
            RelayEvent::CommentCreated(c) => Some(c.post_id.as_str()),
            RelayEvent::LikeUpdated(l) => Some(l.post_id.as_str()),
        }
    }

    pub fn decode(text: &str) -> Result<Self, EventError> {
        let envelope: Envelope = serde_json::from_str(text).map_err(EventError::Malformed)?;
        let kind = EventKind::from_name(&envelope.event)
            .ok_or_else(|| EventError::UnknownKind(envelope.event.clone()))?;
        let invalid = |source| EventError::InvalidPayload { kind, source };

        match kind {
            EventKind::PostCreated => Ok(RelayEvent::PostCreated(envelope.data)),
            EventKind::CommentCreated => {
                // Early clients sent the bare comment under the legacy name
                if envelope.event == "new-comment" && envelope.data.get("comment").is_none() {
                    let post_id = envelope
                        .data
                        .get("postId")
                        .cloned()
                        .unwrap_or(Value::Null);
                    let post_id = serde_json::from_value(post_id).map_err(invalid)?;
                    return Ok(RelayEvent::CommentCreated(CommentCreated {
                        post_id,
                        comment: envelope.data,
                    }));
                }
                serde_json::from_value(envelope.data)
                    .map(RelayEvent::CommentCreated)
                    .map_err(invalid)
            }
            EventKind::LikeUpdated => serde_json::from_value(envelope.data)
                .map(RelayEvent::LikeUpdated)
                .map_err(invalid),
        }
    }

    pub fn encode(&self) -> Result<String, EventError> {
        serde_json::to_string(self).map_err(EventError::Encode)
    }
}
