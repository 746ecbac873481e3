//! Conversions from domain values to wire DTOs.

use crate::domain::{ConnectionProfile, Participant, VideoSource};

use super::websocket::{ParticipantDto, UserSummary, VideoSourceDto};

impl From<&ConnectionProfile> for UserSummary {
    fn from(profile: &ConnectionProfile) -> Self {
        Self {
            id: profile.user.id.as_str().to_string(),
            username: profile.user.username.clone(),
            avatar_url: profile.user.avatar_url.clone(),
            role: profile.role(),
            has_control_permission: profile.can_control(),
        }
    }
}

impl From<Participant> for ParticipantDto {
    fn from(participant: Participant) -> Self {
        Self {
            id: participant.user.id.into_string(),
            username: participant.user.username,
            avatar_url: participant.user.avatar_url,
            is_online: participant.is_online,
            role: participant.role,
            has_control_permission: participant.has_control_permission,
        }
    }
}

impl From<VideoSource> for VideoSourceDto {
    fn from(video: VideoSource) -> Self {
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
    use crate::domain::{
        ConnectionId, ControlPermission, Role, Room, RoomCode, RoomId, UserId, UserProfile,
        VideoKind,
    };

    fn profile(user_id: &str, is_host: bool, flag: bool) -> ConnectionProfile {
        ConnectionProfile {
            id: ConnectionId::new(),
            room: Room {
                id: RoomId::new("room-1".to_string()).unwrap(),
                code: RoomCode::new("ABC123").unwrap(),
                owner_id: UserId::new("host".to_string()).unwrap(),
                is_active: true,
            },
            user: UserProfile {
                id: UserId::new(user_id.to_string()).unwrap(),
                username: user_id.to_string(),
                avatar_url: Some(format!("https://cdn.example.com/{user_id}.png")),
            },
            permission: ControlPermission::new(is_host, flag),
        }
    }

    #[test]
    fn test_user_summary_reports_effective_control_flag() {
        // テスト項目: ホストは永続フラグが false でも操作権限ありとして表示される
        // given (前提条件):
        let host = profile("host", true, false);

        // when (操作):
        let summary = UserSummary::from(&host);

        // then (期待する結果):
        assert_eq!(summary.id, "host");
        assert_eq!(summary.role, Role::Host);
        assert!(summary.has_control_permission);
        assert_eq!(
            summary.avatar_url.as_deref(),
            Some("https://cdn.example.com/host.png")
        );
    }

    #[test]
    fn test_user_summary_member_without_flag() {
        // テスト項目: フラグのないメンバーは操作権限なしとして表示される
        // given (前提条件):
        let member = profile("member", false, false);

        // when (操作):
        let summary = UserSummary::from(&member);

        // then (期待する結果):
        assert_eq!(summary.role, Role::Member);
        assert!(!summary.has_control_permission);
    }

    #[test]
    fn test_participant_dto_from_participant() {
        // テスト項目: 参加者スナップショットが DTO にそのまま写される
        // given (前提条件):
        let participant = Participant {
            user: UserProfile {
                id: UserId::new("u1".to_string()).unwrap(),
                username: "alice".to_string(),
                avatar_url: None,
            },
            is_online: true,
            role: Role::Member,
            has_control_permission: true,
        };

        // when (操作):
        let dto = ParticipantDto::from(participant);

        // then (期待する結果):
        assert_eq!(dto.id, "u1");
        assert_eq!(dto.username, "alice");
        assert!(dto.is_online);
        assert!(dto.has_control_permission);
    }

    #[test]
    fn test_video_source_dto_keeps_kind() {
        // テスト項目: 動画ソースの種別とストリーム URL が保持される
        // given (前提条件):
        let video = VideoSource {
            id: "v1".to_string(),
            kind: VideoKind::Torrent,
            url: "magnet:?xt=urn:btih:abc".to_string(),
            title: Some("Movie".to_string()),
            duration: Some(5400),
            thumbnail: None,
            stream_url: Some("https://stream.example.com/v1".to_string()),
        };

        // when (操作):
        let dto = VideoSourceDto::from(video);

        // then (期待する結果):
        assert_eq!(dto.kind, VideoKind::Torrent);
        assert_eq!(dto.duration, Some(5400));
        assert_eq!(dto.stream_url.as_deref(), Some("https://stream.example.com/v1"));
    }
}
