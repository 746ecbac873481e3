//! UseCase: 参加者切断処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - DisconnectParticipantUseCase::execute() メソッド
//!
//! ### なぜこのテストが必要か
//! - 切断時に残りのメンバーへ user:left が 1 回だけ通知されることを保証する
//! - 最後のメンバーが抜けたら部屋が Hub から消えることを保証する
//!
//! ### どのような状況を想定しているか
//! - 正常系：参加者の切断と通知
//! - エッジケース：最後の参加者の切断、同じ接続の二重切断

use crate::{
    domain::ConnectionProfile,
    infrastructure::hub::{HubError, HubHandle},
};

/// 参加者切断のユースケース
pub struct DisconnectParticipantUseCase {
    hub: HubHandle,
}

impl DisconnectParticipantUseCase {
    /// 新しい DisconnectParticipantUseCase を作成
    pub fn new(hub: HubHandle) -> Self {
        Self { hub }
    }

    /// 参加者切断を実行
    ///
    /// Hub から登録を外し、送信キューを閉じる。すでに外れていれば何もしない。
    pub async fn execute(&self, profile: &ConnectionProfile) -> Result<(), HubError> {
        tracing::debug!(
            "Disconnecting '{}' (connection {}) from room '{}'",
            profile.user.username,
            profile.id,
            profile.room_id()
        );
        self.hub.unregister(profile.id).await
    }
}
