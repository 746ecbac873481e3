//! UseCase: 在室状況の取得

use crate::{
    domain::{RoomId, UserId},
    infrastructure::hub::{HubError, HubHandle},
};

/// ある時点での部屋の在室状況（取得した瞬間に古くなりうる）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomPresence {
    pub room_id: RoomId,
    pub user_count: usize,
    pub online_user_ids: Vec<UserId>,
}

pub struct GetPresenceUseCase {
    hub: HubHandle,
}

impl GetPresenceUseCase {
    pub fn new(hub: HubHandle) -> Self {
        Self { hub }
    }

    pub async fn execute(&self, room_id: RoomId) -> Result<RoomPresence, HubError> {
        let user_count = self.hub.client_count(room_id.clone()).await?;
        let online_user_ids = self.hub.online_user_ids(room_id.clone()).await?;
        Ok(RoomPresence {
            room_id,
            user_count,
            online_user_ids,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        domain::{ConnectionId, ConnectionProfile, ControlPermission, Room, RoomCode, UserProfile},
        infrastructure::hub::{Hub, HubConfig, outbound_queue},
    };
    use cowatch_shared::time::FixedClock;

    #[tokio::test]
    async fn test_presence_of_live_and_empty_rooms() {
        // テスト項目: 接続中の部屋は人数とユーザー ID を、空の部屋は 0 件を返す
        // given (前提条件):
        let (hub, handle) = Hub::new(HubConfig::default(), Arc::new(FixedClock::new(0)));
        hub.spawn();
        let usecase = GetPresenceUseCase::new(handle.clone());
        let room_id = RoomId::new("r-1".to_string()).unwrap();
        let profile = Arc::new(ConnectionProfile {
            id: ConnectionId::new(),
            room: Room {
                id: room_id.clone(),
                code: RoomCode::new("MOVIE1").unwrap(),
                owner_id: UserId::new("host".to_string()).unwrap(),
                is_active: true,
            },
            user: UserProfile {
                id: UserId::new("host".to_string()).unwrap(),
                username: "alice".to_string(),
                avatar_url: None,
            },
            permission: ControlPermission::new(true, false),
        });
        let (tx, _rx) = outbound_queue(16);
        handle.register(profile, tx).await.unwrap();

        // when (操作):
        let live = usecase.execute(room_id.clone()).await.unwrap();
        let empty = usecase
            .execute(RoomId::new("r-2".to_string()).unwrap())
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(live.room_id, room_id);
        assert_eq!(live.user_count, 1);
        assert_eq!(live.online_user_ids[0].as_str(), "host");
        assert_eq!(empty.user_count, 0);
        assert!(empty.online_user_ids.is_empty());
    }
}
