//! The hub loop.
//!
//! One task owns the [`RoomRegistry`] and processes [`Command`]s strictly one at a
//! time, so every join, leave and broadcast of a room is applied in a single total
//! order. Broadcasts the loop raises about its own mutations go onto a bounded
//! [`DispatchQueue`] and are delivered before the next command is taken.

use std::sync::Arc;

use cowatch_shared::time::Clock;
use tokio::{sync::mpsc, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::{
    domain::ConnectionProfile,
    infrastructure::dto::websocket::{
        Envelope, OutboundEvent, UserJoinedPayload, UserLeftPayload, UserSummary,
    },
};

use super::{
    command::{Command, RoomBroadcast},
    config::HubConfig,
    dispatch_queue::DispatchQueue,
    handle::HubHandle,
    registry::{Eviction, LiveConnection, OutboundSender, RoomRegistry},
};

pub struct Hub {
    config: HubConfig,
    clock: Arc<dyn Clock>,
    registry: RoomRegistry,
    dispatch: DispatchQueue<RoomBroadcast>,
    commands: mpsc::Receiver<Command>,
    token: CancellationToken,
}

impl Hub {
    /// Build an isolated hub and the handle used to talk to it. Nothing runs until
    /// [`Hub::spawn`] (or [`Hub::run`]) is called.
    pub fn new(config: HubConfig, clock: Arc<dyn Clock>) -> (Self, HubHandle) {
        let (command_tx, command_rx) = mpsc::channel(config.command_capacity.max(1));
        let token = CancellationToken::new();
        let dispatch = DispatchQueue::new(config.dispatch_capacity, config.overflow_policy);

        let hub = Self {
            config,
            clock,
            registry: RoomRegistry::new(),
            dispatch,
            commands: command_rx,
            token: token.clone(),
        };
        (hub, HubHandle::new(command_tx, token))
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Process commands until the handle cancels the hub or every handle is dropped.
    /// On exit every outbound queue is closed.
    pub async fn run(mut self) {
        tracing::info!(
            outbound_capacity = self.config.outbound_capacity,
            overflow_policy = %self.config.overflow_policy,
            silent_eviction = self.config.silent_eviction,
            "Hub started"
        );

        loop {
            let command = tokio::select! {
                biased;
                () = self.token.cancelled() => {
                    tracing::debug!("Hub was cancelled");
                    break;
                }
                command = self.commands.recv() => command,
            };

            let Some(command) = command else {
                tracing::debug!("All hub handles dropped");
                break;
            };

            tracing::trace!("Hub processing {}", command.name());
            self.process(command);
            self.drain_dispatch_queue();
        }

        let pending = self.dispatch.len();
        self.dispatch.clear();
        let rooms = self.registry.room_count();
        let closed = self.registry.clear();
        tracing::info!(
            closed_connections = closed,
            closed_rooms = rooms,
            discarded_dispatches = pending,
            dropped_dispatches = self.dispatch.dropped(),
            "Hub stopped"
        );
    }

    fn process(&mut self, command: Command) {
        match command {
            Command::Register {
                profile,
                sender,
                reply,
            } => {
                let registered = self.register(profile, sender);
                let _ = reply.send(registered);
            }
            Command::Unregister { connection_id } => {
                match self.registry.remove(&connection_id) {
                    Some(removal) => {
                        tracing::info!(
                            "User '{}' left room '{}' ({} remaining)",
                            removal.profile.user.username,
                            removal.profile.room_id(),
                            removal.remaining
                        );
                        self.announce_left(&removal.profile, removal.remaining);
                    }
                    None => {
                        tracing::debug!("Connection {} already unregistered", connection_id);
                    }
                }
            }
            Command::Broadcast(broadcast) => {
                tracing::debug!(
                    "Broadcasting '{}' to room '{}'",
                    broadcast.envelope.event_type(),
                    broadcast.room_id
                );
                self.deliver(broadcast);
            }
            Command::SendTo {
                connection_id,
                envelope,
            } => match self.registry.deliver_to(&connection_id, &envelope) {
                Ok(true) => {}
                Ok(false) => {
                    tracing::debug!(
                        "Dropping '{}' for unregistered connection {}",
                        envelope.event_type(),
                        connection_id
                    );
                }
                Err(eviction) => self.handle_evictions(vec![eviction]),
            },
            Command::OnlineUserIds { room_id, reply } => {
                let _ = reply.send(self.registry.online_user_ids(&room_id));
            }
            Command::ClientCount { room_id, reply } => {
                let _ = reply.send(self.registry.client_count(&room_id));
            }
            Command::ContainsRoom { room_id, reply } => {
                let _ = reply.send(self.registry.contains_room(&room_id));
            }
        }
    }

    fn register(&mut self, profile: Arc<ConnectionProfile>, sender: OutboundSender) -> bool {
        let Some(user_count) = self
            .registry
            .insert(LiveConnection::new(Arc::clone(&profile), sender))
        else {
            tracing::warn!(
                "Connection {} is already registered; ignoring duplicate register",
                profile.id
            );
            return false;
        };

        tracing::info!(
            "User '{}' joined room '{}' ({} connected)",
            profile.user.username,
            profile.room_id(),
            user_count
        );

        let envelope = Envelope::new(
            OutboundEvent::UserJoined(UserJoinedPayload {
                user: UserSummary::from(profile.as_ref()),
                user_count,
            }),
            self.clock.now_millis(),
        );
        self.enqueue(RoomBroadcast::new(profile.room_id().clone(), envelope, None));
        true
    }

    fn announce_left(&mut self, profile: &ConnectionProfile, remaining: usize) {
        let envelope = Envelope::new(
            OutboundEvent::UserLeft(UserLeftPayload {
                user_id: profile.user.id.as_str().to_string(),
                username: profile.user.username.clone(),
                user_count: remaining,
            }),
            self.clock.now_millis(),
        );
        self.enqueue(RoomBroadcast::new(profile.room_id().clone(), envelope, None));
    }

    fn enqueue(&mut self, broadcast: RoomBroadcast) {
        if let Some(dropped) = self.dispatch.push(broadcast) {
            tracing::warn!(
                policy = %self.config.overflow_policy,
                total_dropped = self.dispatch.dropped(),
                "Internal dispatch queue full; dropped '{}' for room '{}'",
                dropped.envelope.event_type(),
                dropped.room_id
            );
        }
    }

    fn deliver(&mut self, broadcast: RoomBroadcast) {
        let evictions =
            self.registry
                .deliver(&broadcast.room_id, &broadcast.envelope, broadcast.exclude);
        self.handle_evictions(evictions);
    }

    fn handle_evictions(&mut self, evictions: Vec<Eviction>) {
        for eviction in evictions {
            let profile = &eviction.removal.profile;
            tracing::warn!(
                reason = ?eviction.reason,
                "Evicted user '{}' (connection {}) from room '{}'",
                profile.user.username,
                profile.id,
                profile.room_id()
            );
            if !self.config.silent_eviction {
                self.announce_left(profile, eviction.removal.remaining);
            }
        }
    }

    fn drain_dispatch_queue(&mut self) {
        if self.dispatch.is_empty() {
            return;
        }
        tracing::trace!("Delivering {} queued broadcasts", self.dispatch.len());
        while let Some(broadcast) = self.dispatch.pop() {
            self.deliver(broadcast);
        }
    }
}
