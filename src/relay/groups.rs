use std::collections::{HashMap, HashSet};

use tokio::sync::mpsc;
use tracing::{debug, error};

use super::messages::ServerEvent;
use super::types::{ClientId, OutboundMessage, RoomId};

#[derive(Debug)]
struct ClientEntry {
    /// Channel for outbound messages to this client.
    /// Uses OutboundMessage (shared bytes) for O(1) broadcast cloning.
    tx: mpsc::UnboundedSender<OutboundMessage>,
    groups: HashSet<RoomId>,
}

/// Live connections and their room groups.
///
/// This is the delivery side of the relay: it knows who is connected and which
/// groups they are subscribed to, nothing about names.
#[derive(Debug, Default)]
pub struct Groups {
    clients: HashMap<ClientId, ClientEntry>,
    groups: HashMap<RoomId, HashSet<ClientId>>,
}

impl Groups {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, client: ClientId, tx: mpsc::UnboundedSender<OutboundMessage>) {
        self.clients.insert(
            client,
            ClientEntry {
                tx,
                groups: HashSet::new(),
            },
        );
    }

    /// Drop the client and every group subscription it holds.
    pub fn unregister(&mut self, client: &ClientId) {
        let Some(entry) = self.clients.remove(client) else {
            return;
        };
        for room in entry.groups {
            self.detach(&room, client);
        }
    }

    pub fn join(&mut self, client: ClientId, room: &RoomId) {
        let Some(entry) = self.clients.get_mut(&client) else {
            debug!("join for unregistered client {}", client);
            return;
        };
        entry.groups.insert(room.clone());
        self.groups.entry(room.clone()).or_default().insert(client);
    }

    pub fn leave(&mut self, client: &ClientId, room: &RoomId) {
        if let Some(entry) = self.clients.get_mut(client) {
            entry.groups.remove(room);
        }
        self.detach(room, client);
    }

    fn detach(&mut self, room: &RoomId, client: &ClientId) {
        if let Some(members) = self.groups.get_mut(room) {
            members.remove(client);
            if members.is_empty() {
                self.groups.remove(room);
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn is_member(&self, client: &ClientId, room: &RoomId) -> bool {
        self.groups
            .get(room)
            .is_some_and(|members| members.contains(client))
    }

    #[cfg(test)]
    pub(crate) fn group_len(&self, room: &RoomId) -> usize {
        self.groups.get(room).map_or(0, HashSet::len)
    }

    #[cfg(test)]
    pub(crate) fn client_count(&self) -> usize {
        self.clients.len()
    }

    /// Deliver to every client in the room's group.
    pub fn emit_to_room(&self, room: &RoomId, event: &ServerEvent) -> usize {
        self.emit(room, None, event)
    }

    /// Deliver to every client in the room's group except `sender`.
    pub fn emit_to_others(&self, room: &RoomId, sender: &ClientId, event: &ServerEvent) -> usize {
        self.emit(room, Some(sender), event)
    }

    fn emit(&self, room: &RoomId, skip: Option<&ClientId>, event: &ServerEvent) -> usize {
        let Some(members) = self.groups.get(room) else {
            return 0;
        };

        let msg = match serde_json::to_string(event) {
            Ok(json) => OutboundMessage::from(json),
            Err(e) => {
                error!("Failed to encode {:?}: {}", event, e);
                return 0;
            }
        };

        let mut delivered = 0;
        for id in members {
            if skip == Some(id) {
                continue;
            }
            let sent = self
                .clients
                .get(id)
                .is_some_and(|entry| entry.tx.send(msg.clone()).is_ok());
            if sent {
                delivered += 1;
            }
        }
        delivered
    }
}
