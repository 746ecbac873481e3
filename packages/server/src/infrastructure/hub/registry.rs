//! Room registry owned by the hub loop.
//!
//! Invariants:
//! - a room id is present iff it has at least one live connection;
//! - a connection id appears in at most one room;
//! - the registry holds the only sender of every outbound queue, so removing an
//!   entry closes that queue.

use std::{collections::HashMap, sync::Arc};

use tokio::sync::mpsc;

use crate::{
    domain::{ConnectionId, ConnectionProfile, RoomId, UserId},
    infrastructure::dto::websocket::Envelope,
};

pub type OutboundSender = mpsc::Sender<Arc<Envelope>>;
pub type OutboundReceiver = mpsc::Receiver<Arc<Envelope>>;

/// Create a connection's bounded outbound queue.
pub fn outbound_queue(capacity: usize) -> (OutboundSender, OutboundReceiver) {
    mpsc::channel(capacity.max(1))
}

/// One registered connection: its fixed attributes plus the write end of its queue.
#[derive(Debug)]
pub struct LiveConnection {
    pub profile: Arc<ConnectionProfile>,
    sender: OutboundSender,
}

impl LiveConnection {
    pub fn new(profile: Arc<ConnectionProfile>, sender: OutboundSender) -> Self {
        Self { profile, sender }
    }

    fn try_deliver(&self, envelope: &Arc<Envelope>) -> Result<(), DeliveryFailure> {
        self.sender
            .try_send(Arc::clone(envelope))
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => DeliveryFailure::QueueFull,
                mpsc::error::TrySendError::Closed(_) => DeliveryFailure::ReceiverGone,
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryFailure {
    /// The consumer is too slow.
    QueueFull,
    /// The outbound pump has already exited.
    ReceiverGone,
}

/// A connection removed from its room, either by unregistration or eviction.
#[derive(Debug)]
pub struct Removal {
    pub profile: Arc<ConnectionProfile>,
    /// Members left in the room afterwards.
    pub remaining: usize,
}

/// A recipient removed because delivery to it failed.
#[derive(Debug)]
pub struct Eviction {
    pub removal: Removal,
    pub reason: DeliveryFailure,
}

#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: HashMap<RoomId, HashMap<ConnectionId, LiveConnection>>,
    index: HashMap<ConnectionId, RoomId>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection to its room. Returns the new member count, or `None` when the
    /// connection id is already registered.
    pub fn insert(&mut self, connection: LiveConnection) -> Option<usize> {
        let connection_id = connection.profile.id;
        if self.index.contains_key(&connection_id) {
            return None;
        }

        let room_id = connection.profile.room_id().clone();
        self.index.insert(connection_id, room_id.clone());
        let members = self.rooms.entry(room_id).or_default();
        members.insert(connection_id, connection);
        Some(members.len())
    }

    /// Remove a connection, dropping its queue sender. `None` if it was not registered.
    pub fn remove(&mut self, connection_id: &ConnectionId) -> Option<Removal> {
        let room_id = self.index.remove(connection_id)?;
        let members = self.rooms.get_mut(&room_id)?;
        let connection = members.remove(connection_id)?;
        let remaining = members.len();
        if remaining == 0 {
            self.rooms.remove(&room_id);
        }

        Some(Removal {
            profile: connection.profile,
            remaining,
        })
    }

    /// Non-blocking fan-out to a room. Recipients that cannot accept the envelope are
    /// removed and returned.
    pub fn deliver(
        &mut self,
        room_id: &RoomId,
        envelope: &Arc<Envelope>,
        exclude: Option<ConnectionId>,
    ) -> Vec<Eviction> {
        let Some(members) = self.rooms.get(room_id) else {
            return Vec::new();
        };

        let failed: Vec<(ConnectionId, DeliveryFailure)> = members
            .iter()
            .filter(|(id, _)| Some(**id) != exclude)
            .filter_map(|(id, connection)| {
                connection
                    .try_deliver(envelope)
                    .err()
                    .map(|reason| (*id, reason))
            })
            .collect();

        self.evict_all(failed)
    }

    /// Non-blocking unicast. `Ok(false)` when the connection is not registered.
    pub fn deliver_to(
        &mut self,
        connection_id: &ConnectionId,
        envelope: &Arc<Envelope>,
    ) -> Result<bool, Eviction> {
        let Some(room_id) = self.index.get(connection_id) else {
            return Ok(false);
        };
        let Some(connection) = self
            .rooms
            .get(room_id)
            .and_then(|members| members.get(connection_id))
        else {
            return Ok(false);
        };

        match connection.try_deliver(envelope) {
            Ok(()) => Ok(true),
            Err(reason) => match self.remove(connection_id) {
                Some(removal) => Err(Eviction { removal, reason }),
                None => Ok(false),
            },
        }
    }

    fn evict_all(&mut self, failed: Vec<(ConnectionId, DeliveryFailure)>) -> Vec<Eviction> {
        failed
            .into_iter()
            .filter_map(|(id, reason)| {
                self.remove(&id)
                    .map(|removal| Eviction { removal, reason })
            })
            .collect()
    }

    /// Distinct user ids currently connected to the room, sorted.
    pub fn online_user_ids(&self, room_id: &RoomId) -> Vec<UserId> {
        let mut ids: Vec<UserId> = self
            .rooms
            .get(room_id)
            .map(|members| {
                members
                    .values()
                    .map(|connection| connection.profile.user.id.clone())
                    .collect()
            })
            .unwrap_or_default();
        ids.sort();
        ids.dedup();
        ids
    }

    pub fn client_count(&self, room_id: &RoomId) -> usize {
        self.rooms.get(room_id).map_or(0, HashMap::len)
    }

    pub fn contains_room(&self, room_id: &RoomId) -> bool {
        self.rooms.contains_key(room_id)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Drop every connection, closing all outbound queues.
    pub fn clear(&mut self) -> usize {
        let closed = self.index.len();
        self.rooms.clear();
        self.index.clear();
        closed
    }
}
