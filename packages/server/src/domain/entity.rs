//! Entities handed over by the external collaborators, plus the derived participant view.

use serde::{Deserialize, Serialize};

use super::{
    permission::Role,
    value_object::{RoomCode, RoomId, Timestamp, UserId},
};

/// Public profile of a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub id: UserId,
    pub username: String,
    pub avatar_url: Option<String>,
}

/// Identity asserted by a verified access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
    pub username: String,
}

/// Persisted room, as far as the hub cares about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    pub id: RoomId,
    pub code: RoomCode,
    pub owner_id: UserId,
    pub is_active: bool,
}

/// Persisted membership of a user in a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Membership {
    pub room_id: RoomId,
    pub user: UserProfile,
    /// Control flag granted by the host. The host itself does not need it.
    pub has_control_permission: bool,
    pub last_visited_at: Timestamp,
}

/// Where a video is played from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoKind {
    Bilibili,
    Youtube,
    Url,
    Torrent,
}

/// A playable video known to the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoSource {
    pub id: String,
    pub kind: VideoKind,
    pub url: String,
    pub title: Option<String>,
    pub duration: Option<u32>,
    pub thumbnail: Option<String>,
    pub stream_url: Option<String>,
}

impl VideoSource {
    /// Source announced for a video id the catalogue does not know.
    pub fn placeholder(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: VideoKind::Bilibili,
            url: "https://example.com/video".to_string(),
            title: None,
            duration: None,
            thumbnail: None,
            stream_url: None,
        }
    }
}

/// One row of the bootstrap snapshot: a room member annotated with live state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub user: UserProfile,
    pub is_online: bool,
    pub role: Role,
    pub has_control_permission: bool,
}
