//! Permission model.
//!
//! Role and control flag are derived once, when the connection is accepted, from
//! room ownership and the persisted membership flag. They are not re-derived while
//! the connection lives.

use serde::{Deserialize, Serialize};

use super::{
    entity::{Membership, Room},
    value_object::UserId,
};

/// Role of a user inside a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Host,
    Member,
}

impl Role {
    /// The owner of the room is its host; everybody else is a member.
    pub fn of(owner_id: &UserId, user_id: &UserId) -> Self {
        if owner_id == user_id {
            Role::Host
        } else {
            Role::Member
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Host => "host",
            Role::Member => "member",
        }
    }
}

/// Control attributes fixed at connection time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlPermission {
    is_host: bool,
    has_control_permission: bool,
}

impl ControlPermission {
    pub fn new(is_host: bool, has_control_permission: bool) -> Self {
        Self {
            is_host,
            has_control_permission,
        }
    }

    /// Derive the permission of `membership`'s user inside `room`.
    pub fn derive(room: &Room, membership: &Membership) -> Self {
        Self::new(
            room.owner_id == membership.user.id,
            membership.has_control_permission,
        )
    }

    pub fn is_host(&self) -> bool {
        self.is_host
    }

    pub fn role(&self) -> Role {
        if self.is_host { Role::Host } else { Role::Member }
    }

    /// Persisted flag, as granted.
    pub fn has_control_flag(&self) -> bool {
        self.has_control_permission
    }

    /// Whether playback-control events are allowed: the host always may.
    pub fn effective(&self) -> bool {
        self.is_host || self.has_control_permission
    }
}
