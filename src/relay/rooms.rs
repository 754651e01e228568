use std::collections::HashMap;

use super::types::{ClientId, RoomId};

/// Membership of one room, in join order.
///
/// Entries are keyed by connection so that two clients sharing a display name
/// hold separate slots; the name list sent to clients collapses duplicates.
#[derive(Debug, Default)]
pub(crate) struct Membership {
    entries: Vec<(ClientId, String)>,
}

impl Membership {
    fn insert(&mut self, client: ClientId, user_name: String) {
        match self.entries.iter_mut().find(|(id, _)| *id == client) {
            Some(entry) => entry.1 = user_name,
            None => self.entries.push((client, user_name)),
        }
    }

    fn remove(&mut self, client: &ClientId, user_name: &str) {
        self.entries
            .retain(|(id, name)| !(id == client && name == user_name));
    }

    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Distinct names, ordered by first join.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::with_capacity(self.entries.len());
        for (_, name) in &self.entries {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
        names
    }
}

/// Room → membership registry.
///
/// Rooms appear on first join and are dropped as soon as their last member
/// leaves.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: HashMap<RoomId, Membership>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `user_name` to `room`, creating the room if needed. Returns the
    /// room's member names afterwards.
    pub fn add(&mut self, room: &RoomId, client: ClientId, user_name: String) -> Vec<String> {
        let membership = self.rooms.entry(room.clone()).or_default();
        membership.insert(client, user_name);
        membership.names()
    }

    /// Remove the client's slot from `room`. Returns the remaining member names,
    /// or `None` when the room is unknown.
    pub fn remove(&mut self, room: &RoomId, client: &ClientId, user_name: &str) -> Option<Vec<String>> {
        let membership = self.rooms.get_mut(room)?;
        membership.remove(client, user_name);
        let names = membership.names();
        if membership.is_empty() {
            self.rooms.remove(room);
        }
        Some(names)
    }

    #[cfg(test)]
    pub(crate) fn members(&self, room: &RoomId) -> Option<Vec<String>> {
        self.rooms.get(room).map(Membership::names)
    }

    pub fn contains(&self, room: &RoomId) -> bool {
        self.rooms.contains_key(room)
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.rooms.len()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room(s: &str) -> RoomId {
        RoomId::from(s)
    }

    #[test]
    fn first_join_creates_room() {
        let mut registry = RoomRegistry::new();
        assert!(!registry.contains(&room("r1")));

        let names = registry.add(&room("r1"), ClientId::from("conn_a"), "alice".to_string());
        assert_eq!(names, vec!["alice"]);
        assert!(registry.contains(&room("r1")));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn names_keep_join_order() {
        let mut registry = RoomRegistry::new();
        registry.add(&room("r1"), ClientId::from("conn_c"), "carol".to_string());
        registry.add(&room("r1"), ClientId::from("conn_a"), "alice".to_string());
        let names = registry.add(&room("r1"), ClientId::from("conn_b"), "bob".to_string());
        assert_eq!(names, vec!["carol", "alice", "bob"]);
    }

    #[test]
    fn shared_name_is_listed_once() {
        let mut registry = RoomRegistry::new();
        registry.add(&room("r1"), ClientId::from("conn_a"), "sam".to_string());
        let names = registry.add(&room("r1"), ClientId::from("conn_b"), "sam".to_string());
        assert_eq!(names, vec!["sam"]);
    }

    #[test]
    fn shared_name_survives_one_leave() {
        let mut registry = RoomRegistry::new();
        registry.add(&room("r1"), ClientId::from("conn_a"), "sam".to_string());
        registry.add(&room("r1"), ClientId::from("conn_b"), "sam".to_string());

        let names = registry.remove(&room("r1"), &ClientId::from("conn_a"), "sam");
        assert_eq!(names, Some(vec!["sam".to_string()]));

        let names = registry.remove(&room("r1"), &ClientId::from("conn_b"), "sam");
        assert_eq!(names, Some(vec![]));
    }

    #[test]
    fn last_leave_drops_room() {
        let mut registry = RoomRegistry::new();
        registry.add(&room("r1"), ClientId::from("conn_a"), "alice".to_string());
        registry.remove(&room("r1"), &ClientId::from("conn_a"), "alice");
        assert!(!registry.contains(&room("r1")));
        assert!(registry.is_empty());
    }

    #[test]
    fn remove_from_unknown_room() {
        let mut registry = RoomRegistry::new();
        assert_eq!(registry.remove(&room("nope"), &ClientId::from("conn_a"), "alice"), None);
    }

    #[test]
    fn remove_unknown_name_leaves_room_intact() {
        let mut registry = RoomRegistry::new();
        registry.add(&room("r1"), ClientId::from("conn_a"), "alice".to_string());
        let names = registry.remove(&room("r1"), &ClientId::from("conn_b"), "bob");
        assert_eq!(names, Some(vec!["alice".to_string()]));
        assert_eq!(registry.members(&room("r1")), Some(vec!["alice".to_string()]));
    }

    #[test]
    fn rejoin_same_client_replaces_name() {
        let mut registry = RoomRegistry::new();
        registry.add(&room("r1"), ClientId::from("conn_a"), "alice".to_string());
        let names = registry.add(&room("r1"), ClientId::from("conn_a"), "alicia".to_string());
        assert_eq!(names, vec!["alicia"]);
    }
}
