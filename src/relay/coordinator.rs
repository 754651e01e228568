use tokio::sync::mpsc;
use tracing::{debug, info};

use super::groups::Groups;
use super::messages::ServerEvent;
use super::rooms::RoomRegistry;
use super::types::{ClientId, Joined, OutboundMessage, RoomId};

/// Room coordinator: sole owner and mutator of room membership.
///
/// Every method runs to completion without yielding. Callers pass the
/// session's current room explicitly; the coordinator keeps no reverse index
/// from client to room.
#[derive(Debug)]
pub struct Coordinator {
    rooms: RoomRegistry,
    groups: Groups,
}

impl Default for Coordinator {
    fn default() -> Self {
        Self::new(RoomRegistry::new())
    }
}

impl Coordinator {
    pub fn new(rooms: RoomRegistry) -> Self {
        Self {
            rooms,
            groups: Groups::new(),
        }
    }

    #[cfg(test)]
    pub(crate) fn rooms(&self) -> &RoomRegistry {
        &self.rooms
    }

    #[cfg(test)]
    pub(crate) fn groups(&self) -> &Groups {
        &self.groups
    }

    pub fn connect(&mut self, client: ClientId, tx: mpsc::UnboundedSender<OutboundMessage>) {
        self.groups.register(client, tx);
        debug!("Client {} registered", client);
    }

    /// Move the client into `room` as `user_name`, leaving `prior` first.
    pub fn join(&mut self, client: ClientId, prior: Option<Joined>, room: RoomId, user_name: String) {
        if let Some(prior) = prior {
            self.groups.leave(&client, &prior.room);
            self.remove_member(&client, &prior);
        }

        self.groups.join(client, &room);
        let names = self.rooms.add(&room, client, user_name.clone());
        self.groups
            .emit_to_room(&room, &ServerEvent::UserJoined(names));

        info!("User {} joined room {}", user_name, room);
    }

    pub fn code_change(&self, client: &ClientId, room: &RoomId, code: String) {
        if room.is_empty() {
            return;
        }
        self.groups
            .emit_to_others(room, client, &ServerEvent::CodeUpdate(code));
    }

    pub fn typing(&self, client: &ClientId, room: &RoomId, user_name: String) {
        if room.is_empty() {
            return;
        }
        self.groups
            .emit_to_others(room, client, &ServerEvent::UserTyping(user_name));
    }

    pub fn language_change(&self, room: &RoomId, language: String) {
        if room.is_empty() {
            return;
        }
        self.groups
            .emit_to_room(room, &ServerEvent::LanguageUpdate(language));
    }

    /// Leave the room the session held. The leaver still sees the update.
    pub fn leave(&mut self, client: &ClientId, joined: &Joined) {
        self.remove_member(client, joined);
        self.groups.leave(client, &joined.room);
        info!("User {} left room {}", joined.user_name, joined.room);
    }

    /// Connection closed: drop the client from its groups, then update the
    /// room it held, if any.
    pub fn disconnect(&mut self, client: &ClientId, joined: Option<&Joined>) {
        self.groups.unregister(client);
        if let Some(joined) = joined {
            self.remove_member(client, joined);
        }
        debug!("Client {} unregistered", client);
    }

    fn remove_member(&mut self, client: &ClientId, joined: &Joined) {
        let Some(names) = self.rooms.remove(&joined.room, client, &joined.user_name) else {
            return;
        };
        self.groups
            .emit_to_room(&joined.room, &ServerEvent::UserJoined(names));
        if !self.rooms.contains(&joined.room) {
            debug!("Room {} removed (empty)", joined.room);
        }
    }
}
