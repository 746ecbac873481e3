//! ドメイン層
//!
//! 値オブジェクト、エンティティ、権限モデル、接続状態、そして外部協調者
//! (永続化・認証) へのインターフェースを定義します。

pub mod auth;
pub mod connection;
pub mod entity;
pub mod error;
pub mod permission;
pub mod repository;
pub mod snapshot;
pub mod value_object;

pub use auth::TokenVerifier;
#[cfg(test)]
pub use auth::MockTokenVerifier;
pub use connection::{ConnectionProfile, ConnectionState};
pub use entity::{
    AuthenticatedUser, Membership, Participant, Room, UserProfile, VideoKind, VideoSource,
};
pub use error::{AuthError, ConnectionStateError, RepositoryError, ValueObjectError};
pub use permission::{ControlPermission, Role};
pub use repository::RoomRepository;
#[cfg(test)]
pub use repository::MockRoomRepository;
pub use snapshot::build_participant_snapshot;
pub use value_object::{ConnectionId, RoomCode, RoomId, Timestamp, UserId};
