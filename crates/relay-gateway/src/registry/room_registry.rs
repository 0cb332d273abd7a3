//! Room registry
//!
//! Maps each room to the handles currently joined to it. All membership lives
//! behind one task-fair reader/writer lock: broadcasts take shared snapshots,
//! joins and leaves take the lock exclusively, and a queued writer is never
//! starved by a stream of readers. The lock is never held across an `.await`.

use crate::connection::{ConnectionHandle, ConnectionId};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

type Members = HashMap<ConnectionId, Arc<ConnectionHandle>>;

/// Concurrent room → members mapping
///
/// A room is present only while it has at least one member.
pub struct RoomRegistry {
    rooms: RwLock<HashMap<String, Members>>,
}

/// Point-in-time registry counts
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistryStats {
    /// Number of non-empty rooms
    pub rooms: usize,
    /// Number of registered connections
    pub connections: usize,
    /// Member count per room
    pub members: BTreeMap<String, usize>,
}

impl RoomRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
        }
    }

    /// Create an empty registry wrapped in Arc
    #[must_use]
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Add a handle to a room, creating the room if needed
    ///
    /// Joining twice with the same handle leaves the room unchanged. Returns
    /// the room's member count afterwards.
    pub fn join(&self, room: &str, handle: Arc<ConnectionHandle>) -> usize {
        let mut rooms = self.rooms.write();
        let members = rooms.entry(room.to_string()).or_default();
        members.entry(handle.id()).or_insert(handle);
        let count = members.len();
        drop(rooms);

        tracing::debug!(room = %room, members = count, "Connection joined room");

        count
    }

    /// Remove a handle from a room and close its transport
    ///
    /// The room is deleted when its last member leaves. Leaving a room the
    /// handle is not in is a no-op. Returns whether the handle was removed.
    pub async fn leave(&self, room: &str, handle: &ConnectionHandle) -> bool {
        let removed = {
            let mut rooms = self.rooms.write();
            let Some(members) = rooms.get_mut(room) else {
                return false;
            };
            let removed = members.remove(&handle.id());
            let remaining = members.len();
            if remaining == 0 {
                rooms.remove(room);
            }

            if removed.is_some() {
                tracing::debug!(
                    room = %room,
                    connection_id = %handle.id(),
                    members = remaining,
                    "Connection left room"
                );
                if remaining == 0 {
                    tracing::debug!(room = %room, "Removed empty room");
                }
            }
            removed
        };

        match removed {
            Some(member) => {
                member.close().await;
                true
            }
            None => false,
        }
    }

    /// Current members of a room, for read-only iteration
    ///
    /// The returned set is a copy; later joins and leaves do not affect it.
    pub fn snapshot(&self, room: &str) -> Vec<Arc<ConnectionHandle>> {
        self.rooms
            .read()
            .get(room)
            .map(|members| members.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of members in a room
    pub fn member_count(&self, room: &str) -> usize {
        self.rooms.read().get(room).map_or(0, HashMap::len)
    }

    /// Check whether a connection is a member of a room
    pub fn contains(&self, room: &str, id: ConnectionId) -> bool {
        self.rooms
            .read()
            .get(room)
            .is_some_and(|members| members.contains_key(&id))
    }

    /// Check whether a room is present
    pub fn has_room(&self, room: &str) -> bool {
        self.rooms.read().contains_key(room)
    }

    /// Number of non-empty rooms
    pub fn room_count(&self) -> usize {
        self.rooms.read().len()
    }

    /// Number of registered connections across all rooms
    pub fn connection_count(&self) -> usize {
        self.rooms.read().values().map(HashMap::len).sum()
    }

    /// Per-room member counts
    pub fn stats(&self) -> RegistryStats {
        let rooms = self.rooms.read();
        let members: BTreeMap<String, usize> = rooms
            .iter()
            .map(|(room, members)| (room.clone(), members.len()))
            .collect();

        RegistryStats {
            rooms: members.len(),
            connections: members.values().sum(),
            members,
        }
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RoomRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomRegistry")
            .field("rooms", &self.room_count())
            .field("connections", &self.connection_count())
            .finish()
    }
}
