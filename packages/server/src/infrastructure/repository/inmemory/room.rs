//! InMemory Room Repository 実装
//!
//! ドメイン層が定義する RoomRepository trait の具体的な実装。
//! HashMap / BTreeMap をインメモリ DB として使用します。
//!
//! メンバーシップは (ルーム ID, ユーザー ID) をキーにした BTreeMap に保持し、
//! 一覧取得の順序を安定させています。

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
    domain::{
        Membership, RepositoryError, Room, RoomCode, RoomId, RoomRepository, Timestamp, UserId,
        UserProfile, VideoSource,
    },
    infrastructure::repository::fixtures::{FixtureError, Fixtures},
};

#[derive(Debug, Default)]
struct Store {
    rooms: HashMap<RoomId, Room>,
    memberships: BTreeMap<(RoomId, UserId), Membership>,
    videos: HashMap<String, VideoSource>,
}

/// インメモリ Room Repository 実装
///
/// ルーム・メンバーシップ・動画カタログを保持し、ドメイン層の RoomRepository trait を実装します（依存性の逆転）。
#[derive(Debug, Default)]
pub struct InMemoryRoomRepository {
    store: Mutex<Store>,
}

impl InMemoryRoomRepository {
    /// 空の InMemoryRoomRepository を作成
    pub fn new() -> Self {
        Self::default()
    }

    /// フィクスチャから InMemoryRoomRepository を作成
    ///
    /// メンバーシップやルームが未知のユーザー / ルームを参照している場合はエラー。
    pub fn from_fixtures(fixtures: Fixtures) -> Result<Self, FixtureError> {
        let users: HashMap<UserId, UserProfile> = fixtures
            .users
            .into_iter()
            .map(|user| (user.id.clone(), user.into_profile()))
            .collect();

        let mut store = Store::default();

        for fixture in fixtures.rooms {
            if !users.contains_key(&fixture.owner_id) {
                return Err(FixtureError::UnknownUser(fixture.owner_id.into_string()));
            }
            let room = Room {
                code: fixture.code()?,
                id: fixture.id,
                owner_id: fixture.owner_id,
                is_active: fixture.is_active,
            };
            store.rooms.insert(room.id.clone(), room);
        }

        for fixture in fixtures.memberships {
            if !store.rooms.contains_key(&fixture.room_id) {
                return Err(FixtureError::UnknownRoom(fixture.room_id.into_string()));
            }
            let user = users
                .get(&fixture.user_id)
                .cloned()
                .ok_or_else(|| FixtureError::UnknownUser(fixture.user_id.as_str().to_string()))?;
            let membership = Membership {
                room_id: fixture.room_id,
                user,
                has_control_permission: fixture.has_control_permission,
                last_visited_at: fixture.last_visited_at,
            };
            store.memberships.insert(
                (membership.room_id.clone(), membership.user.id.clone()),
                membership,
            );
        }

        for fixture in fixtures.videos {
            let video = VideoSource::from(fixture);
            store.videos.insert(video.id.clone(), video);
        }

        tracing::info!(
            "Loaded fixtures: {} rooms, {} memberships, {} videos",
            store.rooms.len(),
            store.memberships.len(),
            store.videos.len()
        );

        Ok(Self {
            store: Mutex::new(store),
        })
    }

    /// ルームを追加（同じ ID があれば上書き）
    pub async fn insert_room(&self, room: Room) {
        let mut store = self.store.lock().await;
        store.rooms.insert(room.id.clone(), room);
    }

    /// メンバーシップを追加（同じキーがあれば上書き）
    pub async fn insert_membership(&self, membership: Membership) {
        let mut store = self.store.lock().await;
        store.memberships.insert(
            (membership.room_id.clone(), membership.user.id.clone()),
            membership,
        );
    }

    /// 動画ソースを追加（同じ ID があれば上書き）
    pub async fn insert_video(&self, video: VideoSource) {
        let mut store = self.store.lock().await;
        store.videos.insert(video.id.clone(), video);
    }
}

#[async_trait]
impl RoomRepository for InMemoryRoomRepository {
    async fn find_active_room_by_code(
        &self,
        code: &RoomCode,
    ) -> Result<Option<Room>, RepositoryError> {
        let store = self.store.lock().await;
        Ok(store
            .rooms
            .values()
            .find(|room| room.is_active && &room.code == code)
            .cloned())
    }

    async fn find_membership(
        &self,
        room_id: &RoomId,
        user_id: &UserId,
    ) -> Result<Option<Membership>, RepositoryError> {
        let store = self.store.lock().await;
        Ok(store
            .memberships
            .get(&(room_id.clone(), user_id.clone()))
            .cloned())
    }

    async fn list_memberships(&self, room_id: &RoomId) -> Result<Vec<Membership>, RepositoryError> {
        let store = self.store.lock().await;
        Ok(store
            .memberships
            .values()
            .filter(|membership| &membership.room_id == room_id)
            .cloned()
            .collect())
    }

    async fn touch_membership(
        &self,
        room_id: &RoomId,
        user_id: &UserId,
        visited_at: Timestamp,
    ) -> Result<(), RepositoryError> {
        let mut store = self.store.lock().await;
        let membership = store
            .memberships
            .get_mut(&(room_id.clone(), user_id.clone()))
            .ok_or_else(|| RepositoryError::MembershipNotFound {
                room_id: room_id.as_str().to_string(),
                user_id: user_id.as_str().to_string(),
            })?;
        membership.last_visited_at = visited_at;
        Ok(())
    }

    async fn find_video(&self, video_id: &str) -> Result<Option<VideoSource>, RepositoryError> {
        let store = self.store.lock().await;
        Ok(store.videos.get(video_id).cloned())
    }
}
