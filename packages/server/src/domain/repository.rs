//! Repository trait 定義
//!
//! ドメイン層が必要とする永続化協調者へのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use async_trait::async_trait;

use super::{
    entity::{Membership, Room, VideoSource},
    error::RepositoryError,
    value_object::{RoomCode, RoomId, Timestamp, UserId},
};

/// Room Repository trait
///
/// ルーム、メンバーシップ、動画カタログへの読み取りと、最終訪問時刻の更新を提供する。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoomRepository: Send + Sync {
    /// コードでアクティブなルームを取得（非アクティブなルームは `None`）
    async fn find_active_room_by_code(&self, code: &RoomCode)
    -> Result<Option<Room>, RepositoryError>;

    /// (ルーム, ユーザー) のメンバーシップを取得（メンバーでなければ `None`）
    async fn find_membership(
        &self,
        room_id: &RoomId,
        user_id: &UserId,
    ) -> Result<Option<Membership>, RepositoryError>;

    /// ルームの全メンバーシップを取得
    async fn list_memberships(&self, room_id: &RoomId) -> Result<Vec<Membership>, RepositoryError>;

    /// メンバーシップの最終訪問時刻を更新
    async fn touch_membership(
        &self,
        room_id: &RoomId,
        user_id: &UserId,
        visited_at: Timestamp,
    ) -> Result<(), RepositoryError>;

    /// 動画 ID から動画ソースを取得
    async fn find_video(&self, video_id: &str) -> Result<Option<VideoSource>, RepositoryError>;
}
