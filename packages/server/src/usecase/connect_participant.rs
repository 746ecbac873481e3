//! UseCase: 参加者接続処理
//!
//! 接続アップグレードの前に `authorize` でトークン・ルーム・メンバーシップを検証し、
//! アップグレード後に `execute` で Hub に登録する。
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ConnectParticipantUseCase::authorize() / execute() メソッド
//!
//! ### なぜこのテストが必要か
//! - UNAUTHORIZED / ROOM_NOT_FOUND / FORBIDDEN の判定はこの UseCase だけが行う
//! - ホスト判定と操作権限は接続時に一度だけ決まり、以降は変わらない
//!
//! ### どのような状況を想定しているか
//! - 正常系：ホスト / 操作権限付きメンバーの接続
//! - 異常系：トークンなし・不正トークン・存在しないルーム・非メンバー

use std::sync::Arc;

use cowatch_shared::time::Clock;

use crate::{
    domain::{
        AuthError, ConnectionId, ConnectionProfile, ControlPermission, RoomCode, RoomRepository,
        Timestamp, TokenVerifier,
    },
    infrastructure::hub::{HubHandle, OutboundSender},
};

use super::error::ConnectError;

/// 参加者接続のユースケース
pub struct ConnectParticipantUseCase {
    /// Repository（永続化協調者の抽象化）
    repository: Arc<dyn RoomRepository>,
    /// TokenVerifier（認証協調者の抽象化）
    verifier: Arc<dyn TokenVerifier>,
    hub: HubHandle,
    clock: Arc<dyn Clock>,
}

impl ConnectParticipantUseCase {
    /// 新しい ConnectParticipantUseCase を作成
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        verifier: Arc<dyn TokenVerifier>,
        hub: HubHandle,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            verifier,
            hub,
            clock,
        }
    }

    /// 接続を認可する
    ///
    /// # Arguments
    ///
    /// * `room_code` - 接続先のルームコード
    /// * `token` - アクセストークン（なければ `None`）
    ///
    /// # Returns
    ///
    /// * `Ok(ConnectionProfile)` - 役割と操作権限が確定した接続属性
    /// * `Err(ConnectError)` - `Unauthorized` / `RoomNotFound` / `Forbidden` など
    pub async fn authorize(
        &self,
        room_code: &str,
        token: Option<&str>,
    ) -> Result<ConnectionProfile, ConnectError> {
        // 1. トークン検証
        let token = token
            .filter(|t| !t.trim().is_empty())
            .ok_or(AuthError::MissingToken)?;
        let user = self.verifier.verify(token)?;

        // 2. ルーム検索（形式不正なコードも「見つからない」扱い）
        let code = RoomCode::new(room_code)
            .map_err(|_| ConnectError::RoomNotFound(room_code.to_string()))?;
        let room = self
            .repository
            .find_active_room_by_code(&code)
            .await?
            .ok_or_else(|| ConnectError::RoomNotFound(code.to_string()))?;

        // 3. メンバーシップ確認
        let membership = self
            .repository
            .find_membership(&room.id, &user.user_id)
            .await?
            .ok_or_else(|| ConnectError::Forbidden {
                room_id: room.id.to_string(),
                user_id: user.user_id.to_string(),
            })?;

        // 4. 最終訪問時刻の更新（失敗しても接続は続行）
        let visited_at = Timestamp::new(self.clock.now_millis());
        if let Err(e) = self
            .repository
            .touch_membership(&room.id, &user.user_id, visited_at)
            .await
        {
            tracing::warn!(
                "Failed to update last visit of '{}' in room '{}': {}",
                user.user_id,
                room.id,
                e
            );
        }

        let permission = ControlPermission::derive(&room, &membership);
        tracing::debug!(
            "Authorized '{}' for room '{}' as {} (control: {})",
            membership.user.username,
            room.code,
            permission.role().as_str(),
            permission.effective()
        );

        Ok(ConnectionProfile {
            id: ConnectionId::new(),
            room,
            user: membership.user,
            permission,
        })
    }

    /// 認可済みの接続を Hub に登録する（部屋全体に user:joined が配信される）
    ///
    /// 送信キューの sender は Hub に引き渡され、以後 Hub だけが保持する。
    pub async fn execute(
        &self,
        profile: Arc<ConnectionProfile>,
        sender: OutboundSender,
    ) -> Result<(), ConnectError> {
        let registered = self.hub.register(Arc::clone(&profile), sender).await?;
        if !registered {
            tracing::warn!("Connection {} was already registered", profile.id);
        }
        Ok(())
    }
}
