//! Event tags, wire payloads, and handler arguments.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Event tags
// ---------------------------------------------------------------------------

/// Wire code of the liveness probe. Outside the range of every real tag.
pub const PROBE_CODE: i32 = -1;

/// Every kind of domain occurrence pushed to connected clients.
///
/// The discriminant is the wire `event_type` code and must stay stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum EventType {
    MessageSent = 0,
    MessageDeleted = 1,
    MessageEdited = 2,
    ChannelCreated = 3,
    ChannelDeleted = 4,
    GroupNewMember = 5,
    UserNewGroup = 6,
    KeyAddedToKeystore = 7,
    KeyRemovedFromKeystore = 8,
    RefreshKeystore = 9,
    UsernameChanged = 10,
    FriendRequestAdded = 11,
    FriendRequestUpdated = 12,
    FriendRequestRemoved = 13,
}

impl EventType {
    pub const ALL: [EventType; 14] = [
        EventType::MessageSent,
        EventType::MessageDeleted,
        EventType::MessageEdited,
        EventType::ChannelCreated,
        EventType::ChannelDeleted,
        EventType::GroupNewMember,
        EventType::UserNewGroup,
        EventType::KeyAddedToKeystore,
        EventType::KeyRemovedFromKeystore,
        EventType::RefreshKeystore,
        EventType::UsernameChanged,
        EventType::FriendRequestAdded,
        EventType::FriendRequestUpdated,
        EventType::FriendRequestRemoved,
    ];

    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.code() == code)
    }

    /// Number of arguments a `raise` of this tag carries.
    pub fn arity(self) -> usize {
        match self {
            EventType::ChannelCreated
            | EventType::ChannelDeleted
            | EventType::RefreshKeystore
            | EventType::UsernameChanged => 1,
            _ => 2,
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

// ---------------------------------------------------------------------------
// Server → Client payload
// ---------------------------------------------------------------------------

/// A record pushed to a client as one text frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventPayload {
    pub event_type: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_user: Option<String>,
}

impl EventPayload {
    pub fn new(event: EventType) -> Self {
        Self::with_code(event.code())
    }

    /// The liveness probe (`{"event_type": -1}`).
    pub fn probe() -> Self {
        Self::with_code(PROBE_CODE)
    }

    fn with_code(event_type: i32) -> Self {
        Self {
            event_type,
            channel: None,
            message: None,
            user: None,
            key_user: None,
        }
    }

    pub fn channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = Some(channel.into());
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn key_user(mut self, key_user: impl Into<String>) -> Self {
        self.key_user = Some(key_user.into());
        self
    }

    pub fn is_probe(&self) -> bool {
        self.event_type == PROBE_CODE
    }

    pub fn event(&self) -> Option<EventType> {
        EventType::from_code(self.event_type)
    }
}

// ---------------------------------------------------------------------------
// Handler arguments and output
// ---------------------------------------------------------------------------

/// Arguments of a `raise`: a subject id, optionally followed by a related id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventArgs {
    One(String),
    Two(String, String),
}

impl EventArgs {
    pub fn from_parts(subject: impl Into<String>, related: Option<String>) -> Self {
        match related {
            Some(related) => EventArgs::Two(subject.into(), related),
            None => EventArgs::One(subject.into()),
        }
    }

    pub fn arity(&self) -> usize {
        match self {
            EventArgs::One(_) => 1,
            EventArgs::Two(..) => 2,
        }
    }
}

impl From<&str> for EventArgs {
    fn from(subject: &str) -> Self {
        EventArgs::One(subject.to_string())
    }
}

impl From<String> for EventArgs {
    fn from(subject: String) -> Self {
        EventArgs::One(subject)
    }
}

impl From<(&str, &str)> for EventArgs {
    fn from((subject, related): (&str, &str)) -> Self {
        EventArgs::Two(subject.to_string(), related.to_string())
    }
}

impl From<(String, String)> for EventArgs {
    fn from((subject, related): (String, String)) -> Self {
        EventArgs::Two(subject, related)
    }
}

/// One payload and the users who should receive it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub recipients: Vec<String>,
    pub payload: EventPayload,
}

impl Notification {
    pub fn new(recipients: Vec<String>, payload: EventPayload) -> Self {
        Self {
            recipients,
            payload,
        }
    }

    pub fn to_user(user_id: impl Into<String>, payload: EventPayload) -> Self {
        Self::new(vec![user_id.into()], payload)
    }
}
