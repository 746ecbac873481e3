//! UseCase: セッション初期同期（room:init）
//!
//! Hub への登録直後、ポンプを起動する前に、新しい接続へ部屋の状態を 1 通だけ送る。
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - BootstrapSessionUseCase::build() / execute() メソッド
//!
//! ### なぜこのテストが必要か
//! - 参加者一覧のオンライン状態は Hub の登録状況と永続化されたメンバーシップの突き合わせで決まる
//! - 再生状態の既定値とメッセージ履歴（常に空）を保証する

use std::sync::Arc;

use cowatch_shared::time::Clock;

use crate::{
    domain::{ConnectionProfile, RoomRepository, build_participant_snapshot},
    infrastructure::{
        dto::websocket::{
            Envelope, OutboundEvent, ParticipantDto, PlaybackState, RoomInitPayload,
        },
        hub::HubHandle,
    },
};

use super::error::BootstrapError;

/// セッション初期同期のユースケース
pub struct BootstrapSessionUseCase {
    repository: Arc<dyn RoomRepository>,
    hub: HubHandle,
    clock: Arc<dyn Clock>,
}

impl BootstrapSessionUseCase {
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

    /// room:init エンベロープを構築する
    pub async fn build(&self, profile: &ConnectionProfile) -> Result<Envelope, BootstrapError> {
        let room_id = profile.room_id();
        let memberships = self.repository.list_memberships(room_id).await?;
        let online_user_ids = self.hub.online_user_ids(room_id.clone()).await?;

        let participants: Vec<ParticipantDto> =
            build_participant_snapshot(memberships, &profile.room.owner_id, &online_user_ids)
                .into_iter()
                .map(ParticipantDto::from)
                .collect();

        Ok(Envelope::new(
            OutboundEvent::RoomInit(RoomInitPayload {
                participants,
                recent_messages: Vec::new(),
                video_state: PlaybackState::default(),
            }),
            self.clock.now_millis(),
        ))
    }

    /// room:init を構築し、Hub 経由で本人にだけ送る
    pub async fn execute(&self, profile: &ConnectionProfile) -> Result<(), BootstrapError> {
        let envelope = self.build(profile).await?;
        if let OutboundEvent::RoomInit(payload) = &envelope.event {
            tracing::debug!(
                "Sending room:init to '{}' with {} participants",
                profile.user.username,
                payload.participants.len()
            );
        }
        self.hub.send_to(profile.id, envelope).await?;
        Ok(())
    }
}
