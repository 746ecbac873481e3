//! Cloneable front door to a running hub.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use crate::{
    domain::{ConnectionId, ConnectionProfile, RoomId, UserId},
    infrastructure::dto::websocket::Envelope,
};

use super::{
    command::{Command, RoomBroadcast},
    registry::OutboundSender,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HubError {
    #[error("hub is not running")]
    Stopped,
}

impl<T> From<mpsc::error::SendError<T>> for HubError {
    fn from(_: mpsc::error::SendError<T>) -> Self {
        HubError::Stopped
    }
}

impl From<oneshot::error::RecvError> for HubError {
    fn from(_: oneshot::error::RecvError) -> Self {
        HubError::Stopped
    }
}

#[derive(Debug, Clone)]
pub struct HubHandle {
    commands: mpsc::Sender<Command>,
    token: CancellationToken,
}

impl HubHandle {
    pub(super) fn new(commands: mpsc::Sender<Command>, token: CancellationToken) -> Self {
        Self { commands, token }
    }

    /// Hand a connection's queue sender to the hub. The hub becomes its only owner.
    ///
    /// Returns `false` when the connection id is already registered.
    pub async fn register(
        &self,
        profile: Arc<ConnectionProfile>,
        sender: OutboundSender,
    ) -> Result<bool, HubError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command::Register {
                profile,
                sender,
                reply,
            })
            .await?;
        Ok(rx.await?)
    }

    /// Idempotent.
    pub async fn unregister(&self, connection_id: ConnectionId) -> Result<(), HubError> {
        self.commands
            .send(Command::Unregister { connection_id })
            .await?;
        Ok(())
    }

    pub async fn broadcast(
        &self,
        room_id: RoomId,
        envelope: Envelope,
        exclude: Option<ConnectionId>,
    ) -> Result<(), HubError> {
        self.commands
            .send(Command::Broadcast(RoomBroadcast::new(
                room_id, envelope, exclude,
            )))
            .await?;
        Ok(())
    }

    pub async fn send_to(
        &self,
        connection_id: ConnectionId,
        envelope: Envelope,
    ) -> Result<(), HubError> {
        self.commands
            .send(Command::SendTo {
                connection_id,
                envelope: Arc::new(envelope),
            })
            .await?;
        Ok(())
    }

    pub async fn online_user_ids(&self, room_id: RoomId) -> Result<Vec<UserId>, HubError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command::OnlineUserIds { room_id, reply })
            .await?;
        Ok(rx.await?)
    }

    pub async fn client_count(&self, room_id: RoomId) -> Result<usize, HubError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command::ClientCount { room_id, reply })
            .await?;
        Ok(rx.await?)
    }

    pub async fn contains_room(&self, room_id: RoomId) -> Result<bool, HubError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command::ContainsRoom { room_id, reply })
            .await?;
        Ok(rx.await?)
    }

    /// Stop the hub loop. Pending commands are discarded and every queue is closed.
    pub fn shutdown(&self) {
        self.token.cancel();
    }

    pub fn is_shutdown(&self) -> bool {
        self.token.is_cancelled()
    }
}
