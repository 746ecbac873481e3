//! Connection attributes and lifecycle.

use super::{
    entity::{Room, UserProfile},
    error::ConnectionStateError,
    permission::{ControlPermission, Role},
    value_object::{ConnectionId, RoomId},
};

/// Immutable attributes of one accepted connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionProfile {
    pub id: ConnectionId,
    pub room: Room,
    pub user: UserProfile,
    pub permission: ControlPermission,
}

impl ConnectionProfile {
    pub fn room_id(&self) -> &RoomId {
        &self.room.id
    }

    pub fn role(&self) -> Role {
        self.permission.role()
    }

    /// `isHost OR hasControlPermission`.
    pub fn can_control(&self) -> bool {
        self.permission.effective()
    }
}

/// Connection lifecycle.
///
/// `Connecting -> Active -> Closing -> Closed`. A connection that never makes it
/// into the hub goes straight from `Connecting` to `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Active,
    Closing,
    Closed,
}

impl ConnectionState {
    pub fn transition(self, next: ConnectionState) -> Result<ConnectionState, ConnectionStateError> {
        use ConnectionState::*;

        match (self, next) {
            (Connecting, Active) | (Connecting, Closed) | (Active, Closing) | (Closing, Closed) => {
                Ok(next)
            }
            (from, to) => Err(ConnectionStateError { from, to }),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ConnectionState::Closed)
    }
}
