//! UseCase: 受信イベントの処理
//!
//! 受信したテキストフレーム 1 件を解釈し、部屋へのブロードキャストか、送信者への
//! `error` ユニキャストのどちらかに変換する。
//!
//! 判定順序:
//! 1. エンベロープとして読めなければ `INVALID_PAYLOAD`
//! 2. 未知のイベント種別なら `UNKNOWN_EVENT`
//! 3. 操作系イベント（play / pause / seek / change）で操作権限がなければ `UNAUTHORIZED`
//! 4. ペイロードの型が合わなければ `INVALID_PAYLOAD`（欠けた項目はゼロ値で補う）
//! 5. イベントごとの変換をしてブロードキャスト（video:sync のみ送信者を除外）
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - DispatchEventUseCase::resolve() / execute() メソッド
//!
//! ### なぜこのテストが必要か
//! - 権限のない操作が部屋に漏れないこと（送信者にだけエラーが返ること）を保証する
//! - video:sync の送信者除外（ループバック回避）を保証する

use std::sync::Arc;

use cowatch_shared::time::Clock;
use serde::de::DeserializeOwned;

use crate::{
    domain::{ConnectionId, ConnectionProfile, RoomRepository, VideoSource},
    infrastructure::{
        dto::websocket::{
            ChatBroadcastPayload, ChatMessagePayload, Envelope, InboundEnvelope, InboundEventType,
            OutboundEvent, UserSummary, VideoChangePayload, VideoChangedPayload, VideoSeekPayload,
            VideoStatePayload, VideoSyncPayload,
        },
        hub::{HubError, HubHandle},
    },
};

use super::error::DispatchError;

/// ブロードキャスト 1 件分の処理結果
#[derive(Debug, Clone, PartialEq)]
pub struct Outbound {
    pub envelope: Envelope,
    /// 配信から除外する接続（video:sync の送信者）
    pub exclude: Option<ConnectionId>,
}

/// 受信イベント処理のユースケース
pub struct DispatchEventUseCase {
    repository: Arc<dyn RoomRepository>,
    hub: HubHandle,
    clock: Arc<dyn Clock>,
}

impl DispatchEventUseCase {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        hub: HubHandle,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            hub,
            clock,
        }
    }

    /// 受信フレームを処理し、結果を Hub に渡す
    ///
    /// イベント単位のエラーは送信者への `error` になり、`Err` にはならない。
    /// `Err` は Hub が停止している場合のみ。
    pub async fn execute(&self, profile: &ConnectionProfile, raw: &str) -> Result<(), HubError> {
        match self.resolve(profile, raw).await {
            Ok(outbound) => {
                self.hub
                    .broadcast(profile.room_id().clone(), outbound.envelope, outbound.exclude)
                    .await
            }
            Err(e) => {
                tracing::warn!(
                    "Rejected message from '{}' in room '{}': {}",
                    profile.user.username,
                    profile.room_id(),
                    e
                );
                let envelope = Envelope::error(e.code(), self.clock.now_millis());
                self.hub.send_to(profile.id, envelope).await
            }
        }
    }

    /// 受信フレームを送信すべきエンベロープに変換する
    pub async fn resolve(
        &self,
        profile: &ConnectionProfile,
        raw: &str,
    ) -> Result<Outbound, DispatchError> {
        let inbound: InboundEnvelope = serde_json::from_str(raw)
            .map_err(|e| DispatchError::InvalidPayload(e.to_string()))?;

        let event = InboundEventType::parse(&inbound.event_type)
            .ok_or_else(|| DispatchError::UnknownEvent(inbound.event_type.clone()))?;

        if event.requires_control_permission() && !profile.can_control() {
            return Err(DispatchError::Unauthorized(event.as_str()));
        }

        tracing::debug!(
            "Dispatching '{}' from '{}' in room '{}'",
            event.as_str(),
            profile.user.username,
            profile.room_id()
        );

        let triggered_by = profile.user.id.as_str().to_string();
        let now = self.clock.now_millis();

        let outbound = match event {
            // 再生位置は 0 固定で通知する（クライアント側が現在位置を保持している）
            InboundEventType::VideoPlay | InboundEventType::VideoPause => Outbound {
                envelope: video_state(
                    0.0,
                    event == InboundEventType::VideoPlay,
                    1.0,
                    triggered_by,
                    now,
                ),
                exclude: None,
            },
            InboundEventType::VideoSeek => {
                let payload: VideoSeekPayload = decode(inbound.payload)?;
                Outbound {
                    envelope: video_state(payload.current_time, false, 1.0, triggered_by, now),
                    exclude: None,
                }
            }
            InboundEventType::VideoSync => {
                let payload: VideoSyncPayload = decode(inbound.payload)?;
                Outbound {
                    envelope: video_state(
                        payload.current_time,
                        payload.is_playing,
                        payload.playback_rate,
                        triggered_by,
                        now,
                    ),
                    exclude: Some(profile.id),
                }
            }
            InboundEventType::ChatMessage => {
                let payload: ChatMessagePayload = decode(inbound.payload)?;
                Outbound {
                    envelope: Envelope::new(
                        OutboundEvent::ChatMessage(ChatBroadcastPayload {
                            user: UserSummary::from(profile),
                            message: payload.message,
                            timestamp: now,
                        }),
                        now,
                    ),
                    exclude: None,
                }
            }
            InboundEventType::VideoChange => {
                let payload: VideoChangePayload = decode(inbound.payload)?;
                let video = self.lookup_video(&payload.video_id).await;
                Outbound {
                    envelope: Envelope::new(
                        OutboundEvent::VideoChanged(VideoChangedPayload {
                            video: video.into(),
                            changed_by: triggered_by,
                        }),
                        now,
                    ),
                    exclude: None,
                }
            }
        };

        Ok(outbound)
    }

    /// 動画カタログに無い（または参照に失敗した）場合はプレースホルダーを返す
    async fn lookup_video(&self, video_id: &str) -> VideoSource {
        match self.repository.find_video(video_id).await {
            Ok(Some(video)) => video,
            Ok(None) => VideoSource::placeholder(video_id),
            Err(e) => {
                tracing::warn!("Failed to look up video '{}': {}", video_id, e);
                VideoSource::placeholder(video_id)
            }
        }
    }
}

/// An absent or `null` payload decodes like `{}`.
fn decode<T: DeserializeOwned + Default>(payload: serde_json::Value) -> Result<T, DispatchError> {
    if payload.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(payload).map_err(|e| DispatchError::InvalidPayload(e.to_string()))
}

fn video_state(
    current_time: f64,
    is_playing: bool,
    playback_rate: f64,
    triggered_by: String,
    timestamp: i64,
) -> Envelope {
    Envelope::new(
        OutboundEvent::VideoState(VideoStatePayload {
            current_time,
            is_playing,
            playback_rate,
            triggered_by,
        }),
        timestamp,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{
            ControlPermission, MockRoomRepository, RepositoryError, Room, RoomCode, RoomId,
            UserId, UserProfile, VideoKind,
        },
        infrastructure::{
            dto::websocket::ErrorCode,
            hub::{Hub, HubConfig, OutboundReceiver, outbound_queue},
        },
    };
    use cowatch_shared::time::FixedClock;

    const NOW: i64 = 1_700_000_000_000;

    fn profile(user: &str, is_host: bool, flag: bool) -> Arc<ConnectionProfile> {
        Arc::new(ConnectionProfile {
            id: ConnectionId::new(),
            room: Room {
                id: RoomId::new("r-1".to_string()).unwrap(),
                code: RoomCode::new("MOVIE1").unwrap(),
                owner_id: UserId::new("host".to_string()).unwrap(),
                is_active: true,
            },
            user: UserProfile {
                id: UserId::new(user.to_string()).unwrap(),
                username: user.to_string(),
                avatar_url: None,
            },
            permission: ControlPermission::new(is_host, flag),
        })
    }

    fn create_usecase(repository: MockRoomRepository) -> DispatchEventUseCase {
        let (_hub, handle) = Hub::new(HubConfig::default(), Arc::new(FixedClock::new(NOW)));
        DispatchEventUseCase::new(Arc::new(repository), handle, Arc::new(FixedClock::new(NOW)))
    }

    fn state_of(outbound: &Outbound) -> &VideoStatePayload {
        match &outbound.envelope.event {
            OutboundEvent::VideoState(payload) => payload,
            other => panic!("expected video:state, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_play_by_host() {
        // テスト項目: ホストの video:play は再生中の video:state になり、全員に配信される
        // given (前提条件):
        let usecase = create_usecase(MockRoomRepository::new());
        let host = profile("host", true, false);

        // when (操作):
        let outbound = usecase
            .resolve(&host, r#"{"type":"video:play","payload":{},"timestamp":1}"#)
            .await
            .unwrap();

        // then (期待する結果):
        let state = state_of(&outbound);
        assert!(state.is_playing);
        assert_eq!(state.current_time, 0.0);
        assert_eq!(state.playback_rate, 1.0);
        assert_eq!(state.triggered_by, "host");
        assert_eq!(outbound.exclude, None);
        assert_eq!(outbound.envelope.timestamp, NOW);
    }

    #[tokio::test]
    async fn test_pause_without_payload() {
        // テスト項目: payload を省略した video:pause も受け付けられる
        // given (前提条件):
        let usecase = create_usecase(MockRoomRepository::new());
        let host = profile("host", true, false);

        // when (操作):
        let outbound = usecase
            .resolve(&host, r#"{"type":"video:pause"}"#)
            .await
            .unwrap();

        // then (期待する結果):
        assert!(!state_of(&outbound).is_playing);
    }

    #[tokio::test]
    async fn test_seek_by_member_with_flag() {
        // テスト項目: 操作権限フラグを持つメンバーの video:seek は停止状態の video:state になる
        // given (前提条件):
        let usecase = create_usecase(MockRoomRepository::new());
        let dj = profile("dj", false, true);

        // when (操作):
        let outbound = usecase
            .resolve(&dj, r#"{"type":"video:seek","payload":{"currentTime":42.5}}"#)
            .await
            .unwrap();

        // then (期待する結果):
        let state = state_of(&outbound);
        assert_eq!(state.current_time, 42.5);
        assert!(!state.is_playing);
        assert_eq!(state.triggered_by, "dj");
    }

    #[tokio::test]
    async fn test_control_events_rejected_without_permission() {
        // テスト項目: 操作権限のないメンバーの操作系イベントはすべて Unauthorized になる
        // given (前提条件):
        let usecase = create_usecase(MockRoomRepository::new());
        let member = profile("member", false, false);
        let frames = [
            r#"{"type":"video:play","payload":{}}"#,
            r#"{"type":"video:pause","payload":{}}"#,
            r#"{"type":"video:seek","payload":{"currentTime":42}}"#,
            r#"{"type":"video:change","payload":{"videoId":"v-1"}}"#,
        ];

        for frame in frames {
            // when (操作):
            let result = usecase.resolve(&member, frame).await;

            // then (期待する結果):
            assert!(
                matches!(result, Err(DispatchError::Unauthorized(_))),
                "frame {frame} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn test_permission_checked_before_payload() {
        // テスト項目: 権限のない送信者にはペイロードが不正でも Unauthorized が返る
        // given (前提条件):
        let usecase = create_usecase(MockRoomRepository::new());
        let member = profile("member", false, false);

        // when (操作):
        let result = usecase
            .resolve(&member, r#"{"type":"video:seek","payload":{"currentTime":"soon"}}"#)
            .await;

        // then (期待する結果):
        assert_eq!(result, Err(DispatchError::Unauthorized("video:seek")));
    }

    #[tokio::test]
    async fn test_sync_excludes_sender_and_needs_no_permission() {
        // テスト項目: video:sync は権限不要で、送信者を除外して全項目を通知する
        // given (前提条件):
        let usecase = create_usecase(MockRoomRepository::new());
        let member = profile("member", false, false);

        // when (操作):
        let outbound = usecase
            .resolve(
                &member,
                r#"{"type":"video:sync","payload":{"currentTime":10,"isPlaying":true,"playbackRate":1.5}}"#,
            )
            .await
            .unwrap();

        // then (期待する結果):
        let state = state_of(&outbound);
        assert_eq!(state.current_time, 10.0);
        assert!(state.is_playing);
        assert_eq!(state.playback_rate, 1.5);
        assert_eq!(outbound.exclude, Some(member.id));
    }

    #[tokio::test]
    async fn test_chat_message() {
        // テスト項目: chat:message は送信者情報とサーバー時刻付きで全員に配信される
        // given (前提条件):
        let usecase = create_usecase(MockRoomRepository::new());
        let member = profile("member", false, false);

        // when (操作):
        let outbound = usecase
            .resolve(&member, r#"{"type":"chat:message","payload":{"message":"hello"}}"#)
            .await
            .unwrap();

        // then (期待する結果):
        let OutboundEvent::ChatMessage(chat) = &outbound.envelope.event else {
            panic!("expected chat:message");
        };
        assert_eq!(chat.user.id, "member");
        assert_eq!(chat.message, "hello");
        assert_eq!(chat.timestamp, NOW);
        assert_eq!(outbound.exclude, None);
    }

    #[tokio::test]
    async fn test_empty_chat_message_is_broadcast() {
        // テスト項目: 空文字や空白だけのチャットメッセージもそのまま配信される
        // given (前提条件):
        let usecase = create_usecase(MockRoomRepository::new());
        let member = profile("member", false, false);

        for message in ["", "   "] {
            // when (操作):
            let raw = serde_json::json!({"type": "chat:message", "payload": {"message": message}});
            let outbound = usecase.resolve(&member, &raw.to_string()).await.unwrap();

            // then (期待する結果):
            let OutboundEvent::ChatMessage(chat) = &outbound.envelope.event else {
                panic!("expected chat:message");
            };
            assert_eq!(chat.message, message);
        }
    }

    #[tokio::test]
    async fn test_missing_payload_fields_take_zero_values() {
        // テスト項目: ペイロードの欠けた項目やペイロード自体の省略はゼロ値として扱われ、配信される
        // given (前提条件):
        let usecase = create_usecase(MockRoomRepository::new());
        let host = profile("host", true, false);

        // when (操作):
        let seek_empty = usecase
            .resolve(&host, r#"{"type":"video:seek","payload":{}}"#)
            .await
            .unwrap();
        let seek_absent = usecase
            .resolve(&host, r#"{"type":"video:seek"}"#)
            .await
            .unwrap();
        let sync_partial = usecase
            .resolve(&host, r#"{"type":"video:sync","payload":{"currentTime":3}}"#)
            .await
            .unwrap();
        let sync_absent = usecase
            .resolve(&host, r#"{"type":"video:sync","payload":null}"#)
            .await
            .unwrap();
        let chat_empty = usecase
            .resolve(&host, r#"{"type":"chat:message","payload":{}}"#)
            .await
            .unwrap();
        let chat_absent = usecase
            .resolve(&host, r#"{"type":"chat:message"}"#)
            .await
            .unwrap();

        // then (期待する結果):
        for seek in [&seek_empty, &seek_absent] {
            let state = state_of(seek);
            assert_eq!(state.current_time, 0.0);
            assert!(!state.is_playing);
        }

        let state = state_of(&sync_partial);
        assert_eq!(state.current_time, 3.0);
        assert!(!state.is_playing);
        assert_eq!(state.playback_rate, 0.0);
        assert_eq!(state_of(&sync_absent).current_time, 0.0);

        for chat in [&chat_empty, &chat_absent] {
            let OutboundEvent::ChatMessage(payload) = &chat.envelope.event else {
                panic!("expected chat:message");
            };
            assert_eq!(payload.message, "");
        }
    }

    #[tokio::test]
    async fn test_video_change_uses_catalogue() {
        // テスト項目: video:change はカタログの動画ソースで video:changed になる
        // given (前提条件):
        let mut repository = MockRoomRepository::new();
        repository
            .expect_find_video()
            .withf(|id| id == "v-1")
            .returning(|id| {
                Ok(Some(VideoSource {
                    id: id.to_string(),
                    kind: VideoKind::Youtube,
                    url: "https://youtu.be/abc".to_string(),
                    title: Some("Trailer".to_string()),
                    duration: Some(120),
                    thumbnail: None,
                    stream_url: None,
                }))
            });
        let usecase = create_usecase(repository);
        let host = profile("host", true, false);

        // when (操作):
        let outbound = usecase
            .resolve(&host, r#"{"type":"video:change","payload":{"videoId":"v-1"}}"#)
            .await
            .unwrap();

        // then (期待する結果):
        let OutboundEvent::VideoChanged(changed) = &outbound.envelope.event else {
            panic!("expected video:changed");
        };
        assert_eq!(changed.video.kind, VideoKind::Youtube);
        assert_eq!(changed.video.title.as_deref(), Some("Trailer"));
        assert_eq!(changed.changed_by, "host");
    }

    #[tokio::test]
    async fn test_video_change_falls_back_to_placeholder() {
        // テスト項目: 未知の動画や参照失敗時はプレースホルダーの動画ソースになる
        // given (前提条件):
        let mut repository = MockRoomRepository::new();
        repository
            .expect_find_video()
            .times(1)
            .returning(|_| Ok(None));
        repository
            .expect_find_video()
            .times(1)
            .returning(|_| Err(RepositoryError::Unavailable("db down".to_string())));
        let usecase = create_usecase(repository);
        let host = profile("host", true, false);
        let frame = r#"{"type":"video:change","payload":{"videoId":"v-404"}}"#;

        // when (操作):
        let unknown = usecase.resolve(&host, frame).await.unwrap();
        let failed = usecase.resolve(&host, frame).await.unwrap();

        // then (期待する結果):
        for outbound in [unknown, failed] {
            let OutboundEvent::VideoChanged(changed) = outbound.envelope.event else {
                panic!("expected video:changed");
            };
            assert_eq!(changed.video.id, "v-404");
            assert_eq!(changed.video.kind, VideoKind::Bilibili);
            assert_eq!(changed.video.url, "https://example.com/video");
        }
    }

    #[tokio::test]
    async fn test_unknown_event() {
        // テスト項目: 未知のイベント種別は UnknownEvent になる
        // given (前提条件):
        let usecase = create_usecase(MockRoomRepository::new());
        let host = profile("host", true, false);

        // when (操作):
        let result = usecase
            .resolve(&host, r#"{"type":"video:rewind","payload":{}}"#)
            .await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(DispatchError::UnknownEvent("video:rewind".to_string()))
        );
    }

    #[tokio::test]
    async fn test_malformed_frames_are_invalid_payload() {
        // テスト項目: JSON でないフレームやペイロードの型違いは InvalidPayload になる
        // given (前提条件):
        let usecase = create_usecase(MockRoomRepository::new());
        let host = profile("host", true, false);

        // when (操作):
        let not_json = usecase.resolve(&host, "hello").await;
        let no_type = usecase.resolve(&host, r#"{"payload":{}}"#).await;
        let wrong_type = usecase
            .resolve(&host, r#"{"type":"video:seek","payload":{"currentTime":"soon"}}"#)
            .await;

        // then (期待する結果):
        assert!(matches!(not_json, Err(DispatchError::InvalidPayload(_))));
        assert!(matches!(no_type, Err(DispatchError::InvalidPayload(_))));
        assert!(matches!(wrong_type, Err(DispatchError::InvalidPayload(_))));
    }

    fn drain(rx: &mut OutboundReceiver) -> Vec<Arc<Envelope>> {
        let mut received = Vec::new();
        while let Ok(envelope) = rx.try_recv() {
            received.push(envelope);
        }
        received
    }

    #[tokio::test]
    async fn test_execute_unauthorized_reaches_only_sender() {
        // テスト項目: 権限のない操作は送信者にだけ error{UNAUTHORIZED} が届き、他のメンバーには何も届かない
        // given (前提条件):
        let (hub, handle) = Hub::new(HubConfig::default(), Arc::new(FixedClock::new(NOW)));
        hub.spawn();
        let usecase = DispatchEventUseCase::new(
            Arc::new(MockRoomRepository::new()),
            handle.clone(),
            Arc::new(FixedClock::new(NOW)),
        );
        let host = profile("host", true, false);
        let member = profile("member", false, false);
        let (host_tx, mut host_rx) = outbound_queue(16);
        let (member_tx, mut member_rx) = outbound_queue(16);
        handle.register(Arc::clone(&host), host_tx).await.unwrap();
        handle.register(Arc::clone(&member), member_tx).await.unwrap();
        handle.client_count(host.room_id().clone()).await.unwrap();
        drain(&mut host_rx);
        drain(&mut member_rx);

        // when (操作):
        usecase
            .execute(&member, r#"{"type":"video:seek","payload":{"currentTime":42}}"#)
            .await
            .unwrap();
        handle.client_count(host.room_id().clone()).await.unwrap();

        // then (期待する結果):
        assert!(drain(&mut host_rx).is_empty());
        let member_seen = drain(&mut member_rx);
        assert_eq!(member_seen.len(), 1);
        match &member_seen[0].event {
            OutboundEvent::Error(error) => assert_eq!(error.code, ErrorCode::Unauthorized),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_execute_sync_skips_sender() {
        // テスト項目: video:sync は送信者以外の全員に届く
        // given (前提条件):
        let (hub, handle) = Hub::new(HubConfig::default(), Arc::new(FixedClock::new(NOW)));
        hub.spawn();
        let usecase = DispatchEventUseCase::new(
            Arc::new(MockRoomRepository::new()),
            handle.clone(),
            Arc::new(FixedClock::new(NOW)),
        );
        let host = profile("host", true, false);
        let member = profile("member", false, false);
        let (host_tx, mut host_rx) = outbound_queue(16);
        let (member_tx, mut member_rx) = outbound_queue(16);
        handle.register(Arc::clone(&host), host_tx).await.unwrap();
        handle.register(Arc::clone(&member), member_tx).await.unwrap();
        handle.client_count(host.room_id().clone()).await.unwrap();
        drain(&mut host_rx);
        drain(&mut member_rx);

        // when (操作):
        usecase
            .execute(
                &host,
                r#"{"type":"video:sync","payload":{"currentTime":10,"isPlaying":true,"playbackRate":1.0}}"#,
            )
            .await
            .unwrap();
        handle.client_count(host.room_id().clone()).await.unwrap();

        // then (期待する結果):
        assert!(drain(&mut host_rx).is_empty());
        let member_seen = drain(&mut member_rx);
        assert_eq!(member_seen.len(), 1);
        assert_eq!(member_seen[0].event_type(), "video:state");
    }
}
