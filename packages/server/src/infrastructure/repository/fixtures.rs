//! JSON フィクスチャ
//!
//! バイナリ起動時にインメモリ Repository へ投入する初期データ。
//!
//! ```json
//! {
//!   "users": [{ "id": "u-host", "username": "alice", "avatarUrl": "https://..." }],
//!   "rooms": [{ "id": "r-1", "code": "MOVIE1", "ownerId": "u-host", "isActive": true }],
//!   "memberships": [{ "roomId": "r-1", "userId": "u-host", "hasControlPermission": false }],
//!   "videos": [{ "id": "v-1", "type": "youtube", "url": "https://..." }]
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::domain::{
    RoomCode, RoomId, Timestamp, UserId, UserProfile, ValueObjectError, VideoKind, VideoSource,
};

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("failed to read fixtures from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse fixtures: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid fixture value: {0}")]
    Invalid(#[from] ValueObjectError),
    #[error("fixture references unknown user '{0}'")]
    UnknownUser(String),
    #[error("fixture references unknown room '{0}'")]
    UnknownRoom(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Fixtures {
    pub users: Vec<UserFixture>,
    pub rooms: Vec<RoomFixture>,
    pub memberships: Vec<MembershipFixture>,
    pub videos: Vec<VideoFixture>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserFixture {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomFixture {
    pub id: RoomId,
    pub code: String,
    pub owner_id: UserId,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipFixture {
    pub room_id: RoomId,
    pub user_id: UserId,
    #[serde(default)]
    pub has_control_permission: bool,
    #[serde(default)]
    pub last_visited_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoFixture {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: VideoKind,
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub duration: Option<u32>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub stream_url: Option<String>,
}

impl Fixtures {
    pub fn from_json(json: &str) -> Result<Self, FixtureError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, FixtureError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| FixtureError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }
}

impl UserFixture {
    pub fn into_profile(self) -> UserProfile {
        UserProfile {
            id: self.id,
            username: self.username,
            avatar_url: self.avatar_url,
        }
    }
}

impl RoomFixture {
    pub fn code(&self) -> Result<RoomCode, FixtureError> {
        Ok(RoomCode::new(&self.code)?)
    }
}

impl From<VideoFixture> for VideoSource {
    fn from(video: VideoFixture) -> Self {
        Self {
            id: video.id,
            kind: video.kind,
            url: video.url,
            title: video.title,
            duration: video.duration,
            thumbnail: video.thumbnail,
            stream_url: video.stream_url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fixtures_with_defaults() {
        // テスト項目: 省略可能な項目は既定値で補われる
        // given (前提条件):
        let json = r#"{
            "users": [{"id": "u1", "username": "alice"}],
            "rooms": [{"id": "r1", "code": "movie1", "ownerId": "u1"}],
            "memberships": [{"roomId": "r1", "userId": "u1"}]
        }"#;

        // when (操作):
        let fixtures = Fixtures::from_json(json).unwrap();

        // then (期待する結果):
        assert_eq!(fixtures.users.len(), 1);
        assert!(fixtures.rooms[0].is_active);
        assert_eq!(fixtures.rooms[0].code().unwrap().as_str(), "MOVIE1");
        assert!(!fixtures.memberships[0].has_control_permission);
        assert_eq!(fixtures.memberships[0].last_visited_at.value(), 0);
        assert!(fixtures.videos.is_empty());
    }

    #[test]
    fn test_parse_rejects_empty_user_id() {
        // テスト項目: 空のユーザー ID を含むフィクスチャは拒否される
        // given (前提条件):
        let json = r#"{"users": [{"id": "", "username": "ghost"}]}"#;

        // when (操作):
        let result = Fixtures::from_json(json);

        // then (期待する結果):
        assert!(matches!(result, Err(FixtureError::Parse(_))));
    }

    #[test]
    fn test_from_path_missing_file() {
        // テスト項目: 存在しないファイルを指定すると Io エラーになる
        // given (前提条件):
        let path = "/nonexistent/cowatch-fixtures.json";

        // when (操作):
        let result = Fixtures::from_path(path);

        // then (期待する結果):
        assert!(matches!(result, Err(FixtureError::Io { .. })));
    }

    #[test]
    fn test_video_fixture_conversion() {
        // テスト項目: 動画フィクスチャの type が種別に変換される
        // given (前提条件):
        let json = r#"{"videos": [{"id": "v1", "type": "youtube", "url": "https://youtu.be/x", "streamUrl": "https://s/x"}]}"#;

        // when (操作):
        let fixtures = Fixtures::from_json(json).unwrap();
        let video = VideoSource::from(fixtures.videos[0].clone());

        // then (期待する結果):
        assert_eq!(video.kind, VideoKind::Youtube);
        assert_eq!(video.stream_url.as_deref(), Some("https://s/x"));
    }
}
