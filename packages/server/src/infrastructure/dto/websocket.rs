//! WebSocket protocol catalog.
//!
//! Every frame is a JSON envelope `{type, payload, timestamp}` where `timestamp` is
//! Unix epoch milliseconds. Inbound frames are decoded lazily: the envelope first,
//! the payload only once the event type and the sender's permission are known.

use serde::{Deserialize, Serialize, ser::SerializeStruct};

use crate::domain::{Role, VideoKind};

// ========================================
// Inbound (client → server)
// ========================================

/// Envelope as received from a client. The payload stays untyped until dispatch.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundEnvelope {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub payload: serde_json::Value,
    #[serde(default)]
    pub timestamp: i64,
}

/// Events a client may send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InboundEventType {
    VideoPlay,
    VideoPause,
    VideoSeek,
    VideoSync,
    ChatMessage,
    VideoChange,
}

impl InboundEventType {
    pub const ALL: [InboundEventType; 6] = [
        InboundEventType::VideoPlay,
        InboundEventType::VideoPause,
        InboundEventType::VideoSeek,
        InboundEventType::VideoSync,
        InboundEventType::ChatMessage,
        InboundEventType::VideoChange,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|event| event.as_str() == value)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InboundEventType::VideoPlay => "video:play",
            InboundEventType::VideoPause => "video:pause",
            InboundEventType::VideoSeek => "video:seek",
            InboundEventType::VideoSync => "video:sync",
            InboundEventType::ChatMessage => "chat:message",
            InboundEventType::VideoChange => "video:change",
        }
    }

    /// Playback-control events need `isHost OR hasControlPermission`.
    pub fn requires_control_permission(&self) -> bool {
        matches!(
            self,
            InboundEventType::VideoPlay
                | InboundEventType::VideoPause
                | InboundEventType::VideoSeek
                | InboundEventType::VideoChange
        )
    }
}

// Missing fields take their zero value; only a type mismatch fails to decode.

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VideoSeekPayload {
    pub current_time: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VideoSyncPayload {
    pub current_time: f64,
    pub is_playing: bool,
    pub playback_rate: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ChatMessagePayload {
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VideoChangePayload {
    pub video_id: String,
}

// ========================================
// Outbound (server → client)
// ========================================

/// Outbound envelope. Immutable once built; the hub shares it between recipients.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub event: OutboundEvent,
    pub timestamp: i64,
}

impl Envelope {
    pub fn new(event: OutboundEvent, timestamp: i64) -> Self {
        Self { event, timestamp }
    }

    /// `error` envelope with the default message for `code`.
    pub fn error(code: ErrorCode, timestamp: i64) -> Self {
        Self::new(
            OutboundEvent::Error(ErrorPayload {
                code,
                message: code.default_message().to_string(),
            }),
            timestamp,
        )
    }

    pub fn event_type(&self) -> &'static str {
        self.event.event_type()
    }
}

impl Serialize for Envelope {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("Envelope", 3)?;
        state.serialize_field("type", self.event.event_type())?;
        state.serialize_field("payload", &self.event)?;
        state.serialize_field("timestamp", &self.timestamp)?;
        state.end()
    }
}

/// Outbound event vocabulary. Serializes as its bare payload; the envelope adds `type`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OutboundEvent {
    RoomInit(RoomInitPayload),
    UserJoined(UserJoinedPayload),
    UserLeft(UserLeftPayload),
    /// Reserved: no code path emits it.
    UserStatus(UserStatusPayload),
    VideoState(VideoStatePayload),
    ChatMessage(ChatBroadcastPayload),
    VideoChanged(VideoChangedPayload),
    /// Reserved: permissions are fixed for the lifetime of a connection.
    PermissionChanged(PermissionChangedPayload),
    Error(ErrorPayload),
}

impl OutboundEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            OutboundEvent::RoomInit(_) => "room:init",
            OutboundEvent::UserJoined(_) => "user:joined",
            OutboundEvent::UserLeft(_) => "user:left",
            OutboundEvent::UserStatus(_) => "user:status",
            OutboundEvent::VideoState(_) => "video:state",
            OutboundEvent::ChatMessage(_) => "chat:message",
            OutboundEvent::VideoChanged(_) => "video:changed",
            OutboundEvent::PermissionChanged(_) => "permission:changed",
            OutboundEvent::Error(_) => "error",
        }
    }
}

/// A user as shown to other room members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    pub role: Role,
    pub has_control_permission: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantDto {
    pub id: String,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    pub is_online: bool,
    pub role: Role,
    pub has_control_permission: bool,
}

/// Playback state announced in `room:init`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackState {
    pub current_time: f64,
    pub is_playing: bool,
    pub playback_rate: f64,
    pub volume: f64,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            current_time: 0.0,
            is_playing: false,
            playback_rate: 1.0,
            volume: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomInitPayload {
    pub participants: Vec<ParticipantDto>,
    /// Always empty: chat history is not persisted.
    pub recent_messages: Vec<ChatBroadcastPayload>,
    pub video_state: PlaybackState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserJoinedPayload {
    pub user: UserSummary,
    pub user_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserLeftPayload {
    pub user_id: String,
    pub username: String,
    pub user_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStatusPayload {
    pub user_id: String,
    pub is_online: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoStatePayload {
    pub current_time: f64,
    pub is_playing: bool,
    pub playback_rate: f64,
    pub triggered_by: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatBroadcastPayload {
    pub user: UserSummary,
    pub message: String,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSourceDto {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: VideoKind,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoChangedPayload {
    pub video: VideoSourceDto,
    pub changed_by: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionChangedPayload {
    pub user_id: String,
    pub has_control_permission: bool,
}

/// Per-message error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    Unauthorized,
    InvalidPayload,
    UnknownEvent,
}

impl ErrorCode {
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorCode::Unauthorized => "you do not have permission to perform this action",
            ErrorCode::InvalidPayload => "invalid message payload",
            ErrorCode::UnknownEvent => "unknown event type",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorPayload {
    pub code: ErrorCode,
    pub message: String,
}
