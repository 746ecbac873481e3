//! Requests accepted by the hub loop.

use std::sync::Arc;

use tokio::sync::oneshot;

use crate::{
    domain::{ConnectionId, ConnectionProfile, RoomId, UserId},
    infrastructure::dto::websocket::Envelope,
};

use super::registry::OutboundSender;

/// Envelope addressed to every member of a room, optionally minus one connection.
#[derive(Debug, Clone)]
pub struct RoomBroadcast {
    pub room_id: RoomId,
    pub envelope: Arc<Envelope>,
    pub exclude: Option<ConnectionId>,
}

impl RoomBroadcast {
    pub fn new(room_id: RoomId, envelope: Envelope, exclude: Option<ConnectionId>) -> Self {
        Self {
            room_id,
            envelope: Arc::new(envelope),
            exclude,
        }
    }
}

#[derive(Debug)]
pub enum Command {
    Register {
        profile: Arc<ConnectionProfile>,
        sender: OutboundSender,
        /// `false` when the connection id was already registered.
        reply: oneshot::Sender<bool>,
    },
    Unregister {
        connection_id: ConnectionId,
    },
    Broadcast(RoomBroadcast),
    SendTo {
        connection_id: ConnectionId,
        envelope: Arc<Envelope>,
    },
    OnlineUserIds {
        room_id: RoomId,
        reply: oneshot::Sender<Vec<UserId>>,
    },
    ClientCount {
        room_id: RoomId,
        reply: oneshot::Sender<usize>,
    },
    ContainsRoom {
        room_id: RoomId,
        reply: oneshot::Sender<bool>,
    },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Register { .. } => "register",
            Command::Unregister { .. } => "unregister",
            Command::Broadcast(_) => "broadcast",
            Command::SendTo { .. } => "send_to",
            Command::OnlineUserIds { .. } => "online_user_ids",
            Command::ClientCount { .. } => "client_count",
            Command::ContainsRoom { .. } => "contains_room",
        }
    }
}
